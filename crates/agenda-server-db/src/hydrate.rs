// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource hydration: request data to one stored row as `resource.*`.

use agenda_server_authz::{AttributeMap, RequestAttributes, Resource};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::error::DbError;
use crate::tenant::TenantSession;

/// Convert a row into an attribute map keyed by column name.
///
/// Integers and reals become JSON numbers, text becomes strings, SQL `NULL`
/// becomes `null`. Blobs are not exposed to policies and map to `null`.
pub fn row_to_attributes(row: &SqliteRow) -> Result<AttributeMap, DbError> {
	let mut attributes = AttributeMap::new();
	for column in row.columns() {
		let index = column.ordinal();
		let raw = row.try_get_raw(index)?;
		let value = if raw.is_null() {
			Value::Null
		} else {
			match raw.type_info().name() {
				"INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
				"REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(index)?)
					.map_or(Value::Null, Value::Number),
				"BLOB" => Value::Null,
				_ => Value::String(row.try_get::<String, _>(index)?),
			}
		};
		attributes.insert(column.name().to_string(), value);
	}
	Ok(attributes)
}

/// Hydrate `resource` for a request inside `session`'s namespace.
///
/// The first reference (in declaration order) whose key is present selects
/// the row. No present key yields an empty map; a present key without a
/// matching row is `DbError::NotFound`.
#[tracing::instrument(
	skip(session, resource, request),
	fields(resource = %resource.name, schema = session.namespace().schema())
)]
pub async fn hydrate(
	session: &TenantSession,
	resource: &Resource,
	request: &RequestAttributes,
) -> Result<AttributeMap, DbError> {
	let Some(lookup) = resource.locate(request) else {
		tracing::debug!("no resource reference present in request");
		return Ok(AttributeMap::new());
	};

	let reference = lookup.reference;
	tracing::debug!(
		storage_key = %reference.storage_key,
		location = %reference.request_location,
		"hydrating resource"
	);

	session
		.fetch_row(&resource.storage_table, &reference.storage_key, lookup.value)
		.await?
		.ok_or_else(|| {
			DbError::NotFound(format!(
				"{} where {} = {}",
				resource.name, reference.storage_key, lookup.value
			))
		})
}
