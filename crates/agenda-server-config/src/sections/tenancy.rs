// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant selection configuration.

use serde::Deserialize;

pub const DEFAULT_TENANT_HEADER: &str = "X-Company-ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenancyConfig {
	/// Request header carrying the company id for tenant-scoped endpoints.
	pub header: String,
}

impl Default for TenancyConfig {
	fn default() -> Self {
		Self {
			header: DEFAULT_TENANT_HEADER.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenancyConfigLayer {
	#[serde(default)]
	pub header: Option<String>,
}

impl TenancyConfigLayer {
	pub fn merge(&mut self, other: TenancyConfigLayer) {
		if other.header.is_some() {
			self.header = other.header;
		}
	}

	pub fn finalize(self) -> TenancyConfig {
		TenancyConfig {
			header: self
				.header
				.map(|h| h.trim().to_string())
				.unwrap_or_else(|| DEFAULT_TENANT_HEADER.to_string()),
		}
	}
}
