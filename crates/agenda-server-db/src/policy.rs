// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted policy rules.

use agenda_server_authz::{ConditionNode, ConfigurationError, Effect, PolicyId, PolicyRule};
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

#[derive(Clone)]
pub struct PolicyRepository {
	pool: SqlitePool,
}

impl PolicyRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Persist a rule after validating its condition tree.
	#[tracing::instrument(skip(self, rule), fields(policy_id = %rule.id, endpoint_id = %rule.endpoint_id))]
	pub async fn create_policy_rule(&self, rule: &PolicyRule) -> Result<(), DbError> {
		rule.conditions.validate()?;
		let conditions = serde_json::to_string(&rule.conditions)?;
		sqlx::query(
			r#"
			INSERT INTO policy_rules (id, endpoint_id, name, description, effect, conditions, created_at)
			VALUES (?, ?, ?, ?, 'Allow', ?, ?)
			"#,
		)
		.bind(rule.id.to_string())
		.bind(rule.endpoint_id.to_string())
		.bind(&rule.name)
		.bind(&rule.description)
		.bind(conditions)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// All rules in insertion order.
	#[tracing::instrument(skip(self))]
	pub async fn list_policy_rules(&self) -> Result<Vec<PolicyRule>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, endpoint_id, name, description, effect, conditions
			FROM policy_rules
			ORDER BY rowid
			"#,
		)
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(rule_from_row).collect()
	}
}

fn rule_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<PolicyRule, DbError> {
	let id: String = row.try_get("id")?;
	let id: PolicyId = id
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid policy id '{id}': {e}")))?;
	let endpoint_id: String = row.try_get("endpoint_id")?;
	let effect: String = row.try_get("effect")?;
	if effect != "Allow" {
		return Err(ConfigurationError::InvalidValue {
			kind: "policy effect",
			value: effect,
		}
		.into());
	}

	let conditions: String = row.try_get("conditions")?;
	let conditions: ConditionNode =
		serde_json::from_str(&conditions).map_err(|e| ConfigurationError::InvalidCondition {
			location: format!("policy {id}"),
			message: e.to_string(),
		})?;

	Ok(PolicyRule {
		id,
		endpoint_id: endpoint_id
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid endpoint id '{endpoint_id}': {e}")))?,
		name: row.try_get("name")?,
		description: row.try_get("description")?,
		effect: Effect::Allow,
		conditions,
	})
}
