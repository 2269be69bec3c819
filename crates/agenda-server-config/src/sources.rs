// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, AuthzConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LogFormat,
	LoggingConfigLayer, StaticTokenConfig, TenancyConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/agenda/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: AGENDA_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()?),
			tenancy: Some(load_tenancy_from_env()),
			authz: Some(load_authz_from_env()?),
			auth: Some(load_auth_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("AGENDA_SERVER_HTTP_HOST"),
		port: env_parse("AGENDA_SERVER_HTTP_PORT", "u16")?,
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("AGENDA_SERVER_DATABASE_URL"),
		max_connections: env_parse("AGENDA_SERVER_DATABASE_MAX_CONNECTIONS", "u32")?,
	})
}

fn load_tenancy_from_env() -> TenancyConfigLayer {
	TenancyConfigLayer {
		header: env_var("AGENDA_SERVER_TENANCY_HEADER"),
	}
}

fn load_authz_from_env() -> Result<AuthzConfigLayer, ConfigError> {
	Ok(AuthzConfigLayer {
		hydration_timeout_ms: env_parse("AGENDA_SERVER_AUTHZ_HYDRATION_TIMEOUT_MS", "u64")?,
		load_retries: env_parse("AGENDA_SERVER_AUTHZ_LOAD_RETRIES", "u32")?,
		load_retry_delay_ms: env_parse("AGENDA_SERVER_AUTHZ_LOAD_RETRY_DELAY_MS", "u64")?,
		warn_unreachable: env_bool("AGENDA_SERVER_AUTHZ_WARN_UNREACHABLE"),
		max_body_bytes: env_parse("AGENDA_SERVER_AUTHZ_MAX_BODY_BYTES", "usize")?,
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	const KEY: &str = "AGENDA_SERVER_AUTH_STATIC_TOKENS";

	let static_tokens = match env_var(KEY) {
		Some(json) => Some(
			serde_json::from_str::<Vec<StaticTokenConfig>>(&json).map_err(|e| {
				ConfigError::InvalidValue {
					key: KEY.to_string(),
					message: format!("expected a JSON array of {{token, subject}}: {e}"),
				}
			})?,
		),
		None => None,
	};

	Ok(AuthConfigLayer { static_tokens })
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("AGENDA_SERVER_LOGGING_FORMAT") {
		Some(v) => match v.to_lowercase().as_str() {
			"json" => Some(LogFormat::Json),
			"pretty" => Some(LogFormat::Pretty),
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "AGENDA_SERVER_LOGGING_FORMAT".to_string(),
					message: format!("expected 'pretty' or 'json', got '{v}'"),
				})
			}
		},
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("AGENDA_SERVER_LOGGING_LEVEL"),
		format,
		locale: env_var("AGENDA_SERVER_LOGGING_LOCALE"),
	})
}
