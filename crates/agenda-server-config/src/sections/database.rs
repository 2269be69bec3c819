// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catalog and tenant storage.
//!
//! One SQLite file holds the public namespace (resources, endpoints, policy
//! rules, companies) and every company's tenant namespace. Tenant-scoped
//! requests each hold a pooled connection while their session is open, so
//! `max_connections` bounds how many of them run concurrently.

use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./agenda.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	pub url: String,
	pub max_connections: u32,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_DATABASE_URL.to_string(),
			max_connections: DEFAULT_MAX_CONNECTIONS,
		}
	}
}

impl DatabaseConfig {
	/// Only SQLite URLs are understood by the storage layer.
	pub fn is_sqlite(&self) -> bool {
		self.url.starts_with("sqlite:")
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub max_connections: Option<u32>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.max_connections.is_some() {
			self.max_connections = other.max_connections;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self
				.url
				.map(|u| u.trim().to_string())
				.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
			max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
		}
	}
}
