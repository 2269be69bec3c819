// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer merged across sources.

use serde::Deserialize;

use crate::sections::{
	AuthConfigLayer, AuthzConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer,
	TenancyConfigLayer,
};

/// One source's view of the configuration. Absent sections leave lower layers untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub tenancy: Option<TenancyConfigLayer>,
	#[serde(default)]
	pub authz: Option<AuthzConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(current), Some(next)) => merge(current, next),
		(None, Some(next)) => *base = Some(next),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`; set fields in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.tenancy, other.tenancy, TenancyConfigLayer::merge);
		merge_section(&mut self.authz, other.authz, AuthzConfigLayer::merge);
		merge_section(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.http.unwrap().port, Some(9000));
	}

	#[test]
	fn test_merge_keeps_lower_fields_not_overridden() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("127.0.0.1".to_string()),
				port: Some(8080),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(9090),
			}),
			..Default::default()
		});
		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(9090));
	}

	#[test]
	fn test_parse_from_toml() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[tenancy]
			header = "X-Tenant"

			[authz]
			hydration_timeout_ms = 750
			"#,
		)
		.unwrap();
		assert_eq!(layer.tenancy.unwrap().header.as_deref(), Some("X-Tenant"));
		assert_eq!(layer.authz.unwrap().hydration_timeout_ms, Some(750));
	}
}
