// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy rules and their per-endpoint index.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::condition::ConditionNode;
use crate::context::AttributeContext;
use crate::endpoint::EndpointRegistry;
use crate::engine::{self, Explanation};
use crate::error::{ConfigurationError, Result};
use crate::types::{EndpointId, PolicyId};

/// Rule effect. Allow is the only effect; denial is the absence of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
	#[default]
	Allow,
}

/// One named Allow condition tree bound to an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
	pub id: PolicyId,
	pub endpoint_id: EndpointId,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub effect: Effect,
	pub conditions: ConditionNode,
}

impl PolicyRule {
	pub fn new(endpoint_id: EndpointId, name: impl Into<String>, conditions: ConditionNode) -> Self {
		Self {
			id: PolicyId::generate(),
			endpoint_id,
			name: name.into(),
			description: None,
			effect: Effect::Allow,
			conditions,
		}
	}

	pub fn with_id(mut self, id: PolicyId) -> Self {
		self.id = id;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn evaluate(&self, ctx: &AttributeContext) -> bool {
		engine::evaluate(&self.conditions, ctx)
	}

	pub fn explain(&self, ctx: &AttributeContext) -> Explanation {
		engine::explain(&self.conditions, ctx)
	}
}

/// Rules grouped by endpoint, in load order.
#[derive(Debug, Clone, Default)]
pub struct PolicyIndex {
	by_endpoint: HashMap<EndpointId, Vec<Arc<PolicyRule>>>,
	by_id: HashMap<PolicyId, Arc<PolicyRule>>,
}

impl PolicyIndex {
	/// Validate every rule and bind it to a known endpoint.
	pub fn new(rules: impl IntoIterator<Item = PolicyRule>, endpoints: &EndpointRegistry) -> Result<Self> {
		let mut index = Self::default();
		for rule in rules {
			if endpoints.get(rule.endpoint_id).is_none() {
				return Err(ConfigurationError::UnknownEndpoint {
					policy: rule.id,
					endpoint: rule.endpoint_id,
				});
			}
			rule.conditions
				.validate()
				.map_err(|e| match e {
					ConfigurationError::InvalidCondition { location, message } => {
						ConfigurationError::InvalidCondition {
							location: format!("policy {} {location}", rule.id),
							message,
						}
					}
					other => other,
				})?;
			if index.by_id.contains_key(&rule.id) {
				return Err(ConfigurationError::Duplicate {
					kind: "policy id",
					name: rule.id.to_string(),
				});
			}

			let rule = Arc::new(rule);
			index.by_id.insert(rule.id, Arc::clone(&rule));
			index.by_endpoint.entry(rule.endpoint_id).or_default().push(rule);
		}
		Ok(index)
	}

	/// Rules bound to `endpoint`; empty when none exist.
	pub fn rules_for(&self, endpoint: EndpointId) -> &[Arc<PolicyRule>] {
		self.by_endpoint.get(&endpoint).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn get(&self, id: PolicyId) -> Option<&Arc<PolicyRule>> {
		self.by_id.get(&id)
	}

	pub fn len(&self) -> usize {
		self.by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}
}
