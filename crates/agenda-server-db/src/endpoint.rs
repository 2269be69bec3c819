// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted endpoint records.

use agenda_server_authz::{normalize_path, Endpoint};
use chrono::Utc;
use http::Method;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

#[derive(Clone)]
pub struct EndpointRepository {
	pool: SqlitePool,
}

impl EndpointRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert an endpoint unless its `(method, path)` already exists.
	///
	/// Returns `true` when a row was inserted.
	#[tracing::instrument(skip(self, endpoint), fields(endpoint_id = %endpoint.id, method = %endpoint.method, path = %endpoint.path))]
	pub async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			INSERT INTO endpoints (id, method, path, controller_name, resource, needs_tenant, deny_if_unauthorized, description, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(method, path) DO NOTHING
			"#,
		)
		.bind(endpoint.id.to_string())
		.bind(endpoint.method.as_str())
		.bind(normalize_path(&endpoint.path))
		.bind(&endpoint.controller_name)
		.bind(&endpoint.resource)
		.bind(endpoint.needs_tenant)
		.bind(endpoint.deny_if_unauthorized)
		.bind(&endpoint.description)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;
		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_endpoints(&self) -> Result<Vec<Endpoint>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, method, path, controller_name, resource, needs_tenant, deny_if_unauthorized, description
			FROM endpoints
			ORDER BY path, method
			"#,
		)
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(endpoint_from_row).collect()
	}
}

fn endpoint_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Endpoint, DbError> {
	let id: String = row.try_get("id")?;
	let method: String = row.try_get("method")?;
	Ok(Endpoint {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid endpoint id '{id}': {e}")))?,
		method: Method::from_bytes(method.to_ascii_uppercase().as_bytes())
			.map_err(|e| DbError::Internal(format!("Invalid method '{method}': {e}")))?,
		path: row.try_get("path")?,
		controller_name: row.try_get("controller_name")?,
		resource: row.try_get("resource")?,
		needs_tenant: row.try_get("needs_tenant")?,
		deny_if_unauthorized: row.try_get("deny_if_unauthorized")?,
		description: row.try_get("description")?,
	})
}
