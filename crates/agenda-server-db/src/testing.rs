// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixtures for tests: in-memory pools and tenant data.

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::company::{Company, CompanyRepository};
use crate::pool::run_migrations;
use crate::tenant::Namespace;

/// An in-memory database with no tables.
///
/// Pinned to one connection that never expires, since every new connection
/// to `:memory:` would see a fresh empty database.
pub async fn create_empty_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.foreign_keys(true);
	SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await
		.unwrap()
}

/// An in-memory database with the public tables created.
pub async fn create_test_pool() -> SqlitePool {
	let pool = create_empty_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

/// Register a company and provision its namespace.
pub async fn create_tenant(pool: &SqlitePool, name: &str) -> Company {
	let company = Company::new(name);
	CompanyRepository::new(pool.clone())
		.create_company(&company)
		.await
		.unwrap();
	company
}

/// Insert one row into `table` of `namespace`.
pub async fn insert_row(pool: &SqlitePool, namespace: &Namespace, table: &str, columns: &[(&str, Value)]) {
	let table = namespace.qualify(table).unwrap();
	let names: Vec<String> = columns.iter().map(|(name, _)| format!(r#""{name}""#)).collect();
	let placeholders = vec!["?"; columns.len()].join(", ");
	let sql = format!(
		r#"INSERT INTO "{table}" ({}) VALUES ({placeholders})"#,
		names.join(", ")
	);

	let mut query = sqlx::query(&sql);
	for (_, value) in columns {
		query = match value {
			Value::Null => query.bind(None::<String>),
			Value::String(s) => query.bind(s.clone()),
			Value::Bool(b) => query.bind(*b),
			Value::Number(n) => match n.as_i64() {
				Some(i) => query.bind(i),
				None => query.bind(n.as_f64()),
			},
			other => query.bind(other.to_string()),
		};
	}
	query.execute(pool).await.unwrap();
}
