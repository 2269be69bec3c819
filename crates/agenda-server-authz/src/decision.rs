// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The single decision function over a set of rules.

use std::sync::Arc;

use crate::context::AttributeContext;
use crate::error::AuthzError;
use crate::policy::PolicyRule;
use crate::types::PolicyId;

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
	/// The endpoint does not enforce authorization.
	Ungated,
	/// The first rule whose conditions held.
	Rule(PolicyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Allow(AllowReason),
	Deny(AuthzError),
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allow(_))
	}

	pub fn into_result(self) -> Result<AllowReason, AuthzError> {
		match self {
			Decision::Allow(reason) => Ok(reason),
			Decision::Deny(kind) => Err(kind),
		}
	}
}

/// Allow iff any rule holds. No rules at all is a denial.
pub fn decide(rules: &[Arc<PolicyRule>], ctx: &AttributeContext) -> Decision {
	rules
		.iter()
		.find(|rule| rule.evaluate(ctx))
		.map_or(Decision::Deny(AuthzError::Unauthorized), |rule| {
			Decision::Allow(AllowReason::Rule(rule.id))
		})
}

/// [`decide`] plus the merged denial trace of every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
	pub decision: Decision,
	pub trace: Vec<String>,
}

pub fn assess(rules: &[Arc<PolicyRule>], ctx: &AttributeContext) -> Assessment {
	if rules.is_empty() {
		return Assessment {
			decision: Decision::Deny(AuthzError::Unauthorized),
			trace: vec!["no policy rules are bound to this endpoint".to_string()],
		};
	}

	let mut trace = Vec::new();
	for rule in rules {
		let explanation = rule.explain(ctx);
		if explanation.allowed {
			return Assessment {
				decision: Decision::Allow(AllowReason::Rule(rule.id)),
				trace: Vec::new(),
			};
		}
		trace.push(format!("rule '{}' did not match", rule.name));
		trace.extend(explanation.trace.into_iter().map(|line| format!("  {line}")));
	}
	Assessment {
		decision: Decision::Deny(AuthzError::Unauthorized),
		trace,
	}
}
