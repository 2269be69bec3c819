// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Agenda server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`AGENDA_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use agenda_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub tenancy: TenancyConfig,
	pub authz: AuthzConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`AGENDA_SERVER_*`)
/// 2. Config file (`/etc/agenda/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		tenancy: layer.tenancy.unwrap_or_default().finalize(),
		authz: layer.authz.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		tenant_header = %config.tenancy.header,
		hydration_timeout_ms = config.authz.hydration_timeout.as_millis() as u64,
		static_tokens = config.auth.static_tokens.len(),
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.http.port == 0 {
		return Err(ConfigError::Validation(
			"http.port must be non-zero".to_string(),
		));
	}

	if !config.database.is_sqlite() {
		return Err(ConfigError::Validation(format!(
			"database.url '{}' is not a sqlite: URL",
			config.database.url
		)));
	}

	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be at least 1".to_string(),
		));
	}

	if config.tenancy.header.is_empty()
		|| !config
			.tenancy
			.header
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
	{
		return Err(ConfigError::Validation(format!(
			"tenancy.header '{}' is not a valid header name",
			config.tenancy.header
		)));
	}

	if config.authz.hydration_timeout.is_zero() {
		return Err(ConfigError::Validation(
			"authz.hydration_timeout_ms must be greater than zero".to_string(),
		));
	}

	if config.authz.load_retries == 0 {
		return Err(ConfigError::Validation(
			"authz.load_retries must be at least 1".to_string(),
		));
	}

	let mut seen = std::collections::HashSet::new();
	for entry in &config.auth.static_tokens {
		if entry.token.is_empty() || !seen.insert(entry.token.as_str()) {
			return Err(ConfigError::Validation(format!(
				"auth.static_tokens contains an empty or duplicate token (subject {})",
				entry.subject.id
			)));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}

	#[test]
	fn test_defaults_validate() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config.tenancy.header, "X-Company-ID");
	}

	#[test]
	fn test_zero_port_rejected() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 0,
			},
			..Default::default()
		};
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_database_section_is_validated() {
		let layer = ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("mysql://localhost/agenda".to_string()),
				max_connections: None,
			}),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("database.url"));

		let layer = ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: None,
				max_connections: Some(0),
			}),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("database.max_connections"));
	}

	#[test]
	fn test_empty_tenant_header_rejected() {
		let layer = ServerConfigLayer {
			tenancy: Some(TenancyConfigLayer {
				header: Some("   ".to_string()),
			}),
			..Default::default()
		};
		let err = finalize(layer).unwrap_err();
		assert!(err.to_string().contains("tenancy.header"));
	}

	#[test]
	fn test_zero_hydration_timeout_rejected() {
		let config = ServerConfig {
			authz: AuthzConfig {
				hydration_timeout: Duration::ZERO,
				..Default::default()
			},
			..Default::default()
		};
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_duplicate_static_tokens_rejected() {
		let entry = StaticTokenConfig {
			token: "same".to_string(),
			subject: StaticSubjectConfig::default(),
		};
		let config = ServerConfig {
			auth: AuthConfig {
				static_tokens: vec![entry.clone(), entry],
			},
			..Default::default()
		};
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_load_config_with_file_applies_toml() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.toml");
		std::fs::write(&path, "[authz]\nload_retries = 2\n").unwrap();

		let config = load_config_with_file(&path).unwrap();
		assert_eq!(config.authz.load_retries, 2);
	}
}
