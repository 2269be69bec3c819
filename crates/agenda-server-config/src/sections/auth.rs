// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication configuration for the bundled static subject resolver.

use std::fmt;

use serde::Deserialize;

/// Subject attributes bound to a static token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StaticSubjectConfig {
	pub id: String,
	#[serde(default)]
	pub company_id: Option<String>,
	#[serde(default)]
	pub roles: Vec<String>,
	#[serde(default)]
	pub branches: Vec<String>,
}

/// A bearer token accepted by the static resolver.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct StaticTokenConfig {
	pub token: String,
	pub subject: StaticSubjectConfig,
}

impl fmt::Debug for StaticTokenConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StaticTokenConfig")
			.field("token", &"[REDACTED]")
			.field("subject", &self.subject)
			.finish()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
	pub static_tokens: Vec<StaticTokenConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub static_tokens: Option<Vec<StaticTokenConfig>>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.static_tokens.is_some() {
			self.static_tokens = other.static_tokens;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			static_tokens: self.static_tokens.unwrap_or_default(),
		}
	}
}
