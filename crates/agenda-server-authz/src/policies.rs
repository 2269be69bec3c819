// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reusable condition trees for the standard catalog.

use serde_json::Value;

use crate::attribute::AttributePath;
use crate::condition::{Comparison, ConditionLeaf, ConditionNode, Operand};

/// Parse a built-in attribute path.
pub fn attribute(raw: &'static str) -> AttributePath {
	match raw.parse() {
		Ok(path) => path,
		Err(e) => unreachable!("built-in attribute path '{raw}' is invalid: {e}"),
	}
}

fn leaf(attribute: &'static str, comparison: Comparison, description: &str) -> ConditionNode {
	ConditionNode::leaf(ConditionLeaf::new(self::attribute(attribute), comparison).with_description(description))
}

fn equals_attribute(attribute: &'static str, other: &'static str, description: &str) -> ConditionNode {
	leaf(attribute, Comparison::Equals(Operand::Attribute(self::attribute(other))), description)
}

/// `subject.company_id` equals `resource.company_id`.
pub fn company_membership_check() -> ConditionNode {
	equals_attribute(
		"subject.company_id",
		"resource.company_id",
		"subject company must match the resource's company",
	)
}

/// Employee acting on their own record.
pub fn employee_self_check() -> ConditionNode {
	ConditionNode::and(vec![
		leaf(
			"subject.company_id",
			Comparison::IsNotNull,
			"subject must belong to a company",
		),
		equals_attribute(
			"subject.id",
			"resource.id",
			"subject id must match the resource id",
		),
	])
	.with_description("employee self access")
}

/// Any company member acting on a resource of the same company.
pub fn company_internal_user_check() -> ConditionNode {
	ConditionNode::and(vec![
		leaf(
			"subject.company_id",
			Comparison::IsNotNull,
			"subject must belong to a company",
		),
		company_membership_check(),
	])
	.with_description("company internal user")
}

/// Client (no company affiliation) acting on their own record.
pub fn client_self_check() -> ConditionNode {
	ConditionNode::and(vec![
		leaf("subject.company_id", Comparison::IsNull, "subject must be a client"),
		equals_attribute(
			"subject.id",
			"resource.id",
			"subject id must match the resource id",
		),
	])
	.with_description("client self access")
}

/// Subject is assigned to the branch being accessed.
pub fn branch_assignment_check() -> ConditionNode {
	leaf(
		"subject.branches",
		Comparison::Contains(Operand::Attribute(self::attribute("resource.id"))),
		"subject's branches must include the resource",
	)
}

/// The subject is the company being accessed.
pub fn own_company_check() -> ConditionNode {
	equals_attribute(
		"subject.company_id",
		"resource.id",
		"subject must belong to this company",
	)
}

/// Subject holds `role`.
pub fn has_role(role: &str) -> ConditionNode {
	leaf(
		"subject.roles",
		Comparison::Contains(Operand::Literal(Value::String(role.to_string()))),
		"subject must hold the role",
	)
}
