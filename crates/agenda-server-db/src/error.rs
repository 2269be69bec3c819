// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use agenda_server_authz::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Invalid identifier: {0}")]
	InvalidIdentifier(String),

	#[error("Invalid catalog data: {0}")]
	Configuration(#[from] ConfigurationError),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	/// Whether a startup load may succeed if attempted again.
	pub fn is_retryable(&self) -> bool {
		matches!(self, DbError::Sqlx(_))
	}
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_only_storage_errors_retry() {
		assert!(DbError::Sqlx(sqlx::Error::PoolTimedOut).is_retryable());
		assert!(!DbError::InvalidIdentifier("x".into()).is_retryable());
		assert!(!DbError::Configuration(ConfigurationError::Duplicate {
			kind: "resource",
			name: "x".into(),
		})
		.is_retryable());
	}
}
