// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Company (tenant) records in the public namespace.

use agenda_server_authz::{is_valid_identifier, CompanyId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::tenant::{provision_namespace, Namespace};

/// A tenant and the namespace its data lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
	pub id: CompanyId,
	pub name: String,
	pub schema_name: String,
}

impl Company {
	pub fn new(name: impl Into<String>) -> Self {
		let id = CompanyId::generate();
		Self {
			id,
			name: name.into(),
			schema_name: schema_name_for(id),
		}
	}

	pub fn namespace(&self) -> Result<Namespace, DbError> {
		Namespace::tenant(self.id, &self.schema_name)
	}
}

/// Schema name derived from a company id: `company_` plus the bare uuid.
pub fn schema_name_for(id: CompanyId) -> String {
	format!("company_{}", id.as_uuid().simple())
}

#[derive(Clone)]
pub struct CompanyRepository {
	pool: SqlitePool,
}

impl CompanyRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert the company and create its tenant tables.
	///
	/// # Errors
	/// Returns `DbError::InvalidIdentifier` for an unsafe schema name and
	/// `DbError::Conflict` when the id or schema is already taken.
	#[tracing::instrument(skip(self, company), fields(company_id = %company.id, schema = %company.schema_name))]
	pub async fn create_company(&self, company: &Company) -> Result<(), DbError> {
		let namespace = company.namespace()?;

		let result = sqlx::query(
			r#"
			INSERT INTO companies (id, name, schema_name, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(company.id.to_string())
		.bind(&company.name)
		.bind(&company.schema_name)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => {}
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
				return Err(DbError::Conflict(format!("company {}", company.id)));
			}
			Err(e) => return Err(e.into()),
		}

		provision_namespace(&self.pool, &namespace).await?;
		tracing::info!("company created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(company_id = %id))]
	pub async fn get_company_by_id(&self, id: &CompanyId) -> Result<Option<Company>, DbError> {
		let row = sqlx::query("SELECT id, name, schema_name FROM companies WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;
		row.map(|r| company_from_row(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_companies(&self) -> Result<Vec<Company>, DbError> {
		let rows = sqlx::query("SELECT id, name, schema_name FROM companies ORDER BY name")
			.fetch_all(&self.pool)
			.await?;
		rows.iter().map(company_from_row).collect()
	}
}

fn company_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Company, DbError> {
	let id: String = row.try_get("id")?;
	let schema_name: String = row.try_get("schema_name")?;
	if !is_valid_identifier(&schema_name) {
		return Err(DbError::InvalidIdentifier(schema_name));
	}
	Ok(Company {
		id: id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid company id '{id}': {e}")))?,
		name: row.try_get("name")?,
		schema_name,
	})
}
