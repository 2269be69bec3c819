// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Condition trees attached to policy rules.
//!
//! The persisted form is a JSON object that is either an internal node
//! (`logic_type` plus `children`) or a leaf (`leaf`). It is parsed into the
//! tagged [`ConditionNode`] type and fully validated on load, so a malformed
//! tree is a startup error rather than a surprise during a request.
//!
//! Trees built in code through the constructors skip that validation; call
//! [`ConditionNode::validate`] before trusting them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::attribute::AttributePath;
use crate::error::{ConfigurationError, Result};

/// Combinator of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicType {
	#[serde(rename = "AND", alias = "and")]
	And,
	#[serde(rename = "OR", alias = "or")]
	Or,
}

/// Persisted operator name of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
	Equals,
	Contains,
	IsNull,
	IsNotNull,
}

impl Operator {
	pub fn as_str(&self) -> &'static str {
		match self {
			Operator::Equals => "Equals",
			Operator::Contains => "Contains",
			Operator::IsNull => "IsNull",
			Operator::IsNotNull => "IsNotNull",
		}
	}

	fn is_binary(&self) -> bool {
		matches!(self, Operator::Equals | Operator::Contains)
	}
}

/// Right-hand side of a binary comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
	Literal(Value),
	Attribute(AttributePath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
	Equals(Operand),
	Contains(Operand),
	IsNull,
	IsNotNull,
}

impl Comparison {
	pub fn operator(&self) -> Operator {
		match self {
			Comparison::Equals(_) => Operator::Equals,
			Comparison::Contains(_) => Operator::Contains,
			Comparison::IsNull => Operator::IsNull,
			Comparison::IsNotNull => Operator::IsNotNull,
		}
	}

	pub fn operand(&self) -> Option<&Operand> {
		match self {
			Comparison::Equals(operand) | Comparison::Contains(operand) => Some(operand),
			Comparison::IsNull | Comparison::IsNotNull => None,
		}
	}
}

/// One atomic comparison against the attribute context.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionLeaf {
	pub attribute: AttributePath,
	pub comparison: Comparison,
	pub description: Option<String>,
}

impl ConditionLeaf {
	pub fn new(attribute: AttributePath, comparison: Comparison) -> Self {
		Self {
			attribute,
			comparison,
			description: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	fn validate(&self, location: &str) -> Result<()> {
		if self.attribute.projection().is_some() && !matches!(self.comparison, Comparison::Contains(_)) {
			return Err(invalid(location, "'[*]' projection is only allowed with Contains"));
		}
		if let Some(Operand::Attribute(rhs)) = self.comparison.operand() {
			if rhs.projection().is_some() {
				return Err(invalid(location, "resource_attribute cannot project"));
			}
		}
		Ok(())
	}
}

/// A boolean condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum ConditionNode {
	Leaf {
		description: Option<String>,
		leaf: ConditionLeaf,
	},
	And {
		description: Option<String>,
		children: Vec<ConditionNode>,
	},
	Or {
		description: Option<String>,
		children: Vec<ConditionNode>,
	},
}

impl ConditionNode {
	pub fn leaf(leaf: ConditionLeaf) -> Self {
		ConditionNode::Leaf {
			description: None,
			leaf,
		}
	}

	pub fn and(children: Vec<ConditionNode>) -> Self {
		ConditionNode::And {
			description: None,
			children,
		}
	}

	pub fn or(children: Vec<ConditionNode>) -> Self {
		ConditionNode::Or {
			description: None,
			children,
		}
	}

	pub fn with_description(mut self, text: impl Into<String>) -> Self {
		match &mut self {
			ConditionNode::Leaf { description, .. }
			| ConditionNode::And { description, .. }
			| ConditionNode::Or { description, .. } => *description = Some(text.into()),
		}
		self
	}

	pub fn description(&self) -> Option<&str> {
		match self {
			ConditionNode::Leaf { description, .. }
			| ConditionNode::And { description, .. }
			| ConditionNode::Or { description, .. } => description.as_deref(),
		}
	}

	/// Reject empty combinators and misplaced projections anywhere in the tree.
	pub fn validate(&self) -> Result<()> {
		self.validate_at("conditions")
	}

	fn validate_at(&self, location: &str) -> Result<()> {
		match self {
			ConditionNode::Leaf { leaf, .. } => leaf.validate(location),
			ConditionNode::And { children, .. } | ConditionNode::Or { children, .. } => {
				if children.is_empty() {
					return Err(invalid(location, "AND/OR node has no children"));
				}
				children
					.iter()
					.enumerate()
					.try_for_each(|(i, child)| child.validate_at(&format!("{location}.children[{i}]")))
			}
		}
	}
}

fn invalid(location: &str, message: &str) -> ConfigurationError {
	ConfigurationError::InvalidCondition {
		location: location.to_string(),
		message: message.to_string(),
	}
}

// =============================================================================
// Persisted shape
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNode {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	logic_type: Option<LogicType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	children: Option<Vec<RawNode>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	leaf: Option<RawLeaf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLeaf {
	attribute: String,
	operator: Operator,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	description: Option<String>,
	/// A present `null` is a literal, distinct from a missing key.
	#[serde(
		default,
		deserialize_with = "present_value",
		skip_serializing_if = "Option::is_none"
	)]
	value: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	resource_attribute: Option<String>,
}

fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(Some)
}

impl RawLeaf {
	fn into_leaf(self, location: &str) -> Result<ConditionLeaf> {
		let attribute = parse_path(&self.attribute, location)?;
		let operand = match (self.value, self.resource_attribute) {
			(Some(_), Some(_)) => {
				return Err(invalid(location, "leaf has both value and resource_attribute"));
			}
			(Some(value), None) => Some(Operand::Literal(value)),
			(None, Some(path)) => Some(Operand::Attribute(parse_path(&path, location)?)),
			(None, None) => None,
		};

		let comparison = match (self.operator, operand) {
			(op, None) if op.is_binary() => {
				return Err(invalid(
					location,
					&format!("{} needs a value or resource_attribute", op.as_str()),
				));
			}
			(op, Some(_)) if !op.is_binary() => {
				return Err(invalid(
					location,
					&format!("{} takes no value or resource_attribute", op.as_str()),
				));
			}
			(Operator::Equals, Some(operand)) => Comparison::Equals(operand),
			(Operator::Contains, Some(operand)) => Comparison::Contains(operand),
			(Operator::IsNull, _) => Comparison::IsNull,
			(_, _) => Comparison::IsNotNull,
		};

		let leaf = ConditionLeaf {
			attribute,
			comparison,
			description: self.description,
		};
		leaf.validate(location)?;
		Ok(leaf)
	}
}

fn parse_path(raw: &str, location: &str) -> Result<AttributePath> {
	raw.parse().map_err(|e: ConfigurationError| ConfigurationError::InvalidCondition {
		location: location.to_string(),
		message: e.to_string(),
	})
}

impl RawNode {
	fn into_node(self, location: &str) -> Result<ConditionNode> {
		match (self.leaf, self.logic_type, self.children) {
			(Some(leaf), None, None) => Ok(ConditionNode::Leaf {
				description: self.description,
				leaf: leaf.into_leaf(&format!("{location}.leaf"))?,
			}),
			(Some(_), _, _) => Err(invalid(location, "node has both a leaf and children")),
			(None, Some(logic), children) => {
				let children = children.unwrap_or_default();
				if children.is_empty() {
					return Err(invalid(location, "AND/OR node has no children"));
				}
				let children = children
					.into_iter()
					.enumerate()
					.map(|(i, child)| child.into_node(&format!("{location}.children[{i}]")))
					.collect::<Result<Vec<_>>>()?;
				Ok(match logic {
					LogicType::And => ConditionNode::And {
						description: self.description,
						children,
					},
					LogicType::Or => ConditionNode::Or {
						description: self.description,
						children,
					},
				})
			}
			(None, None, Some(_)) => Err(invalid(location, "children without logic_type")),
			(None, None, None) => Err(invalid(location, "node has neither a leaf nor children")),
		}
	}
}

impl TryFrom<RawNode> for ConditionNode {
	type Error = ConfigurationError;

	fn try_from(raw: RawNode) -> Result<Self> {
		raw.into_node("conditions")
	}
}

impl From<ConditionNode> for RawNode {
	fn from(node: ConditionNode) -> Self {
		let combinator = |description, logic, children: Vec<ConditionNode>| RawNode {
			description,
			logic_type: Some(logic),
			children: Some(children.into_iter().map(RawNode::from).collect()),
			leaf: None,
		};
		match node {
			ConditionNode::Leaf { description, leaf } => {
				let operator = leaf.comparison.operator();
				let (value, resource_attribute) = match leaf.comparison {
					Comparison::Equals(operand) | Comparison::Contains(operand) => match operand {
						Operand::Literal(value) => (Some(value), None),
						Operand::Attribute(path) => (None, Some(path.into())),
					},
					Comparison::IsNull | Comparison::IsNotNull => (None, None),
				};
				RawNode {
					description,
					logic_type: None,
					children: None,
					leaf: Some(RawLeaf {
						attribute: leaf.attribute.into(),
						operator,
						description: leaf.description,
						value,
						resource_attribute,
					}),
				}
			}
			ConditionNode::And { description, children } => {
				combinator(description, LogicType::And, children)
			}
			ConditionNode::Or { description, children } => combinator(description, LogicType::Or, children),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn parse(value: Value) -> Result<ConditionNode> {
		serde_json::from_value(value).map_err(|e| ConfigurationError::InvalidCondition {
			location: "test".to_string(),
			message: e.to_string(),
		})
	}

	#[test]
	fn test_parses_nested_tree() {
		let node = parse(json!({
			"description": "self or same company",
			"logic_type": "OR",
			"children": [
				{"leaf": {"attribute": "subject.id", "operator": "Equals", "resource_attribute": "resource.id"}},
				{"logic_type": "AND", "children": [
					{"leaf": {"attribute": "subject.company_id", "operator": "IsNotNull"}},
					{"leaf": {"attribute": "subject.roles", "operator": "Contains", "value": "owner"}}
				]}
			]
		}))
		.unwrap();

		let ConditionNode::Or { description, children } = node else {
			panic!("expected OR");
		};
		assert_eq!(description.as_deref(), Some("self or same company"));
		assert_eq!(children.len(), 2);
		assert!(matches!(children[1], ConditionNode::And { .. }));
	}

	#[test]
	fn test_null_literal_is_kept() {
		let node = parse(json!({
			"leaf": {"attribute": "body.x", "operator": "Equals", "value": null}
		}))
		.unwrap();
		let ConditionNode::Leaf { leaf, .. } = node else {
			panic!("expected leaf");
		};
		assert_eq!(leaf.comparison, Comparison::Equals(Operand::Literal(Value::Null)));
	}

	#[test]
	fn test_rejects_malformed_trees() {
		let cases = [
			json!({"logic_type": "AND", "children": []}),
			json!({"logic_type": "OR"}),
			json!({}),
			json!({"children": [{"leaf": {"attribute": "subject.id", "operator": "IsNull"}}]}),
			json!({"logic_type": "AND", "leaf": {"attribute": "subject.id", "operator": "IsNull"}}),
			json!({"leaf": {"attribute": "", "operator": "IsNull"}}),
			json!({"leaf": {"attribute": "tenant.id", "operator": "IsNull"}}),
			json!({"leaf": {"attribute": "subject.id", "operator": "Equals"}}),
			json!({"leaf": {"attribute": "subject.id", "operator": "Equals", "value": 1, "resource_attribute": "resource.id"}}),
			json!({"leaf": {"attribute": "subject.id", "operator": "IsNull", "value": 1}}),
			json!({"leaf": {"attribute": "subject.id", "operator": "Equals", "resource_attribute": "id"}}),
			json!({"leaf": {"attribute": "subject.roles[*].id", "operator": "Equals", "value": "x"}}),
			json!({"leaf": {"attribute": "subject.id", "operator": "Matches", "value": "x"}}),
			json!({"logic_type": "AND", "children": [{"logic_type": "OR", "children": []}]}),
		];
		for case in cases {
			assert!(parse(case.clone()).is_err(), "{case} should be rejected");
		}
	}

	#[test]
	fn test_error_names_location() {
		let err = parse(json!({
			"logic_type": "AND",
			"children": [
				{"leaf": {"attribute": "subject.id", "operator": "IsNull"}},
				{"logic_type": "OR", "children": []}
			]
		}))
		.unwrap_err();
		assert!(err.to_string().contains("children[1]"), "{err}");
	}

	#[test]
	fn test_validate_catches_code_built_trees() {
		assert!(ConditionNode::and(vec![]).validate().is_err());
		let leaf = ConditionLeaf::new("subject.id".parse().unwrap(), Comparison::IsNull);
		assert!(ConditionNode::or(vec![ConditionNode::leaf(leaf)]).validate().is_ok());
	}

	#[test]
	fn test_compact_and_pretty_parse_identically() {
		let tree = json!({
			"logic_type": "AND",
			"children": [
				{"leaf": {"attribute": "subject.branches", "operator": "Contains", "resource_attribute": "resource.id", "description": "assigned"}},
				{"leaf": {"attribute": "query.page", "operator": "Equals", "value": 2}}
			]
		});
		let compact: ConditionNode = serde_json::from_str(&tree.to_string()).unwrap();
		let pretty: ConditionNode =
			serde_json::from_str(&serde_json::to_string_pretty(&tree).unwrap()).unwrap();
		assert_eq!(compact, pretty);

		let reencoded: ConditionNode =
			serde_json::from_value(serde_json::to_value(&compact).unwrap()).unwrap();
		assert_eq!(reencoded, compact);
	}
}
