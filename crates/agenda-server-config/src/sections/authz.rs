// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization gate configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_HYDRATION_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_LOAD_RETRIES: u32 = 5;
const DEFAULT_LOAD_RETRY_DELAY_MS: u64 = 500;
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
	/// Upper bound on resource hydration inside the gate. Expiry denies.
	pub hydration_timeout: Duration,
	/// Attempts made to read endpoints and policies at startup.
	pub load_retries: u32,
	pub load_retry_delay: Duration,
	/// Log a warning for gated endpoints without any policy rule.
	pub warn_unreachable: bool,
	/// Largest request body buffered for `body.*` attributes.
	pub max_body_bytes: usize,
}

impl Default for AuthzConfig {
	fn default() -> Self {
		AuthzConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub hydration_timeout_ms: Option<u64>,
	#[serde(default)]
	pub load_retries: Option<u32>,
	#[serde(default)]
	pub load_retry_delay_ms: Option<u64>,
	#[serde(default)]
	pub warn_unreachable: Option<bool>,
	#[serde(default)]
	pub max_body_bytes: Option<usize>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		if other.hydration_timeout_ms.is_some() {
			self.hydration_timeout_ms = other.hydration_timeout_ms;
		}
		if other.load_retries.is_some() {
			self.load_retries = other.load_retries;
		}
		if other.load_retry_delay_ms.is_some() {
			self.load_retry_delay_ms = other.load_retry_delay_ms;
		}
		if other.warn_unreachable.is_some() {
			self.warn_unreachable = other.warn_unreachable;
		}
		if other.max_body_bytes.is_some() {
			self.max_body_bytes = other.max_body_bytes;
		}
	}

	pub fn finalize(self) -> AuthzConfig {
		AuthzConfig {
			hydration_timeout: Duration::from_millis(
				self
					.hydration_timeout_ms
					.unwrap_or(DEFAULT_HYDRATION_TIMEOUT_MS),
			),
			load_retries: self.load_retries.unwrap_or(DEFAULT_LOAD_RETRIES),
			load_retry_delay: Duration::from_millis(
				self
					.load_retry_delay_ms
					.unwrap_or(DEFAULT_LOAD_RETRY_DELAY_MS),
			),
			warn_unreachable: self.warn_unreachable.unwrap_or(true),
			max_body_bytes: self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
		}
	}
}
