// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted resource catalog.

use agenda_server_authz::{Resource, ResourceReference};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

#[derive(Clone)]
pub struct ResourceRepository {
	pool: SqlitePool,
}

impl ResourceRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert or replace a resource definition by name.
	#[tracing::instrument(skip(self, resource), fields(resource = %resource.name))]
	pub async fn upsert_resource(&self, resource: &Resource) -> Result<(), DbError> {
		resource.validate()?;
		let refs = serde_json::to_string(&resource.references)?;
		sqlx::query(
			r#"
			INSERT INTO resources (name, storage_table, refs)
			VALUES (?, ?, ?)
			ON CONFLICT(name) DO UPDATE SET
				storage_table = excluded.storage_table,
				refs = excluded.refs
			"#,
		)
		.bind(&resource.name)
		.bind(&resource.storage_table)
		.bind(refs)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_resources(&self) -> Result<Vec<Resource>, DbError> {
		let rows = sqlx::query("SELECT name, storage_table, refs FROM resources ORDER BY name")
			.fetch_all(&self.pool)
			.await?;

		rows.iter()
			.map(|row| {
				let refs: String = row.try_get("refs")?;
				let references: Vec<ResourceReference> = serde_json::from_str(&refs)?;
				Ok(Resource {
					name: row.try_get("name")?,
					storage_table: row.try_get("storage_table")?,
					references,
				})
			})
			.collect()
	}
}
