// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

const PUBLIC_MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_authz_catalog",
		include_str!("../migrations/001_authz_catalog.sql"),
	),
	(
		"002_public_entities",
		include_str!("../migrations/002_public_entities.sql"),
	),
];

/// Create a SqlitePool with WAL mode and foreign keys enforced.
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections)
		.connect_with(options)
		.await?;

	tracing::debug!(max_connections, "database pool created");
	Ok(pool)
}

/// Create the public namespace tables.
///
/// Migrations only use `IF NOT EXISTS`, so running them again is a no-op.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in PUBLIC_MIGRATIONS {
		execute_script(pool, sql).await?;
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}

/// Execute a `;`-separated script one statement at a time.
pub(crate) async fn execute_script(pool: &SqlitePool, sql: &str) -> Result<(), DbError> {
	for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
		sqlx::query(statement).execute(pool).await?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_file_pool_and_idempotent_migrations() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("agenda.db").display());
		let pool = create_pool(&url, 2).await.unwrap();

		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<(String,)> =
			sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
				.fetch_all(&pool)
				.await
				.unwrap();
		let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
		for expected in ["clients", "companies", "endpoints", "policy_rules", "resources"] {
			assert!(names.iter().any(|n| n == expected), "missing {expected}");
		}
	}
}
