// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant namespaces and per-request storage sessions.
//!
//! SQLite has no schemas, so a company's isolated namespace is a table
//! prefix: table `T` of schema `S` is stored as `S__T`. The only way to turn a
//! logical table name into a physical one is [`Namespace::qualify`], and the
//! only way to read tenant data is through a [`TenantSession`], which carries
//! exactly one namespace for exactly one request. Nothing about the selected
//! namespace is ever stored outside the session.

use agenda_server_authz::{is_valid_identifier, AttributeMap, AuthzError, CompanyId};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;

use crate::company::{Company, CompanyRepository};
use crate::error::DbError;
use crate::hydrate::row_to_attributes;
use crate::pool::execute_script;

const NAMESPACE_SEPARATOR: &str = "__";
const TENANT_TABLES: &str = include_str!("../migrations/tenant/001_tenant_tables.sql");

/// Storage namespace a request operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
	Public,
	Tenant { company_id: CompanyId, schema: String },
}

impl Namespace {
	pub fn tenant(company_id: CompanyId, schema: impl Into<String>) -> Result<Self, DbError> {
		let schema = schema.into();
		if !is_valid_identifier(&schema) {
			return Err(DbError::InvalidIdentifier(schema));
		}
		Ok(Namespace::Tenant { company_id, schema })
	}

	pub fn company_id(&self) -> Option<CompanyId> {
		match self {
			Namespace::Public => None,
			Namespace::Tenant { company_id, .. } => Some(*company_id),
		}
	}

	pub fn schema(&self) -> &str {
		match self {
			Namespace::Public => "public",
			Namespace::Tenant { schema, .. } => schema,
		}
	}

	/// Physical table name for `table` in this namespace.
	pub fn qualify(&self, table: &str) -> Result<String, DbError> {
		if !is_valid_identifier(table) {
			return Err(DbError::InvalidIdentifier(table.to_string()));
		}
		Ok(match self {
			Namespace::Public => table.to_string(),
			Namespace::Tenant { schema, .. } => format!("{schema}{NAMESPACE_SEPARATOR}{table}"),
		})
	}

	fn table_prefix(&self) -> String {
		match self {
			Namespace::Public => String::new(),
			Namespace::Tenant { schema, .. } => format!("{schema}{NAMESPACE_SEPARATOR}"),
		}
	}
}

/// Create the per-company tables of a tenant namespace.
#[tracing::instrument(skip(pool), fields(schema = namespace.schema()))]
pub async fn provision_namespace(pool: &SqlitePool, namespace: &Namespace) -> Result<(), DbError> {
	if matches!(namespace, Namespace::Public) {
		return Ok(());
	}
	let script = TENANT_TABLES.replace("{ns}", &namespace.table_prefix());
	execute_script(pool, &script).await
}

/// Why a tenant session could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
	#[error("tenant header missing")]
	HeaderMissing,

	#[error("tenant header is not a company id")]
	HeaderInvalid,

	#[error("company {0} does not exist")]
	NotFound(CompanyId),

	#[error("tenant lookup failed: {0}")]
	Storage(#[from] DbError),
}

impl From<TenantError> for AuthzError {
	fn from(err: TenantError) -> Self {
		match err {
			TenantError::HeaderMissing => AuthzError::TenantHeaderMissing,
			TenantError::HeaderInvalid => AuthzError::TenantHeaderInvalid,
			TenantError::NotFound(_) => AuthzError::TenantNotFound,
			TenantError::Storage(_) => AuthzError::HydrationAborted,
		}
	}
}

/// Storage access bound to one request's namespace.
#[derive(Debug, Clone)]
pub struct TenantSession {
	pool: SqlitePool,
	namespace: Namespace,
	company: Option<Company>,
}

impl TenantSession {
	pub fn public(pool: SqlitePool) -> Self {
		Self {
			pool,
			namespace: Namespace::Public,
			company: None,
		}
	}

	pub fn for_company(pool: SqlitePool, company: Company) -> Result<Self, DbError> {
		Ok(Self {
			pool,
			namespace: company.namespace()?,
			company: Some(company),
		})
	}

	pub fn namespace(&self) -> &Namespace {
		&self.namespace
	}

	pub fn company(&self) -> Option<&Company> {
		self.company.as_ref()
	}

	pub fn qualify(&self, table: &str) -> Result<String, DbError> {
		self.namespace.qualify(table)
	}

	/// Fetch the first row of `table` whose `column` equals `value`.
	#[tracing::instrument(skip(self, value), fields(schema = self.namespace.schema()))]
	pub async fn fetch_row(&self, table: &str, column: &str, value: &Value) -> Result<Option<AttributeMap>, DbError> {
		let table = self.qualify(table)?;
		if !is_valid_identifier(column) {
			return Err(DbError::InvalidIdentifier(column.to_string()));
		}

		let sql = format!(r#"SELECT * FROM "{table}" WHERE "{column}" = ? LIMIT 1"#);
		let query = sqlx::query(&sql);
		let query = match value {
			Value::String(s) => query.bind(s.clone()),
			Value::Bool(b) => query.bind(*b),
			Value::Number(n) => match n.as_i64() {
				Some(i) => query.bind(i),
				None => query.bind(n.as_f64()),
			},
			other => query.bind(other.to_string()),
		};

		let row = query.fetch_optional(&self.pool).await?;
		row.as_ref().map(row_to_attributes).transpose()
	}
}

/// Resolves the namespace a request must run in and opens its session.
#[derive(Clone)]
pub struct TenantSchemaGate {
	pool: SqlitePool,
	companies: CompanyRepository,
}

impl TenantSchemaGate {
	pub fn new(pool: SqlitePool) -> Self {
		let companies = CompanyRepository::new(pool.clone());
		Self { pool, companies }
	}

	/// Open the session for one request.
	///
	/// With `needs_tenant`, `header` must carry a known company id; otherwise
	/// the session is public and the header is ignored.
	#[tracing::instrument(skip(self, header))]
	pub async fn open(&self, needs_tenant: bool, header: Option<&str>) -> Result<TenantSession, TenantError> {
		if !needs_tenant {
			return Ok(TenantSession::public(self.pool.clone()));
		}

		let raw = header.map(str::trim).filter(|h| !h.is_empty());
		let Some(raw) = raw else {
			return Err(TenantError::HeaderMissing);
		};
		let company_id: CompanyId = raw.parse().map_err(|_| TenantError::HeaderInvalid)?;

		let company = self
			.companies
			.get_company_by_id(&company_id)
			.await?
			.ok_or(TenantError::NotFound(company_id))?;

		tracing::debug!(schema = %company.schema_name, "tenant session opened");
		Ok(TenantSession::for_company(self.pool.clone(), company)?)
	}
}
