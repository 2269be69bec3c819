// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Agenda authorization server binary.

use std::path::PathBuf;

use agenda_server::{create_app_state, create_router, version, ApiDoc, ControllerRegistry};
use agenda_server_authz::SnapshotHandle;
use agenda_server_config::{LogFormat, LoggingConfig, ServerConfig};
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePool;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

/// Agenda server - request authorization for the scheduling backend.
#[derive(Parser, Debug)]
#[command(name = "agenda-server", about = "Agenda request authorization server", version)]
struct Args {
	/// Configuration file (defaults to /etc/agenda/server.toml)
	#[arg(long, env = "AGENDA_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// Insert the standard resource catalog and built-in endpoints
	Seed,
	/// Print the OpenAPI document as JSON
	Openapi,
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);
	match logging.format {
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	match args.command {
		Some(Command::Version) => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		Some(Command::Openapi) => {
			println!("{}", ApiDoc::openapi().to_pretty_json()?);
			return Ok(());
		}
		_ => {}
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => agenda_server_config::load_config_with_file(path)?,
		None => agenda_server_config::load_config()?,
	};
	init_tracing(&config.logging);

	let pool = agenda_server_db::create_pool(&config.database.url, config.database.max_connections).await?;
	agenda_server_db::run_migrations(&pool).await?;

	if let Some(Command::Seed) = args.command {
		let report = agenda_server_db::seed_catalog(&pool).await?;
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	serve(pool, config).await
}

async fn serve(pool: SqlitePool, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting agenda-server"
	);

	let snapshot = agenda_server_db::load_snapshot_with_retry(
		&pool,
		config.authz.load_retries,
		config.authz.load_retry_delay,
	)
	.await?;

	if config.authz.warn_unreachable {
		for endpoint in snapshot.unreachable_endpoints() {
			tracing::warn!(
				endpoint_id = %endpoint.id,
				method = %endpoint.method,
				path = %endpoint.path,
				"gated endpoint has no policy rules and is unreachable"
			);
		}
	}

	let handle = SnapshotHandle::new(snapshot);
	let addr = config.socket_addr();
	let state = create_app_state(pool.clone(), handle.clone(), config)?;

	let app = create_router(state, &ControllerRegistry::standard())?
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	#[cfg(unix)]
	tokio::spawn(reload_on_hangup(pool, handle));

	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	tracing::info!("Server shutdown complete");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "cannot listen for Ctrl-C");
		std::future::pending::<()>().await;
	}
	tracing::info!("Received shutdown signal, draining connections");
}

/// Rebuild the authorization snapshot on every SIGHUP.
#[cfg(unix)]
async fn reload_on_hangup(pool: SqlitePool, handle: SnapshotHandle) {
	use tokio::signal::unix::{signal, SignalKind};

	let mut hangups = match signal(SignalKind::hangup()) {
		Ok(stream) => stream,
		Err(e) => {
			tracing::warn!(error = %e, "cannot listen for SIGHUP, snapshot reload disabled");
			return;
		}
	};
	while hangups.recv().await.is_some() {
		if let Err(e) = agenda_server_db::reload(&pool, &handle).await {
			tracing::error!(error = %e, "snapshot reload failed, keeping current rules");
		}
	}
}
