// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Condition tree evaluation.
//!
//! Every input has a defined boolean result: missing attributes, type
//! mismatches and empty combinators all evaluate to `false` (or `true` for
//! `IsNull`), never to an error.

use serde_json::Value;

use crate::condition::{Comparison, ConditionLeaf, ConditionNode, Operand};
use crate::context::AttributeContext;

const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Evaluate `node` against `ctx`, short-circuiting combinators.
pub fn evaluate(node: &ConditionNode, ctx: &AttributeContext) -> bool {
	match node {
		ConditionNode::Leaf { leaf, .. } => evaluate_leaf(leaf, ctx),
		ConditionNode::And { children, .. } => {
			!children.is_empty() && children.iter().all(|c| evaluate(c, ctx))
		}
		ConditionNode::Or { children, .. } => children.iter().any(|c| evaluate(c, ctx)),
	}
}

/// Result of [`explain`]: the decision plus why it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
	pub allowed: bool,
	/// One line per failed node, indented two spaces per depth.
	pub trace: Vec<String>,
}

/// Evaluate like [`evaluate`] while recording a line for every failed node.
pub fn explain(node: &ConditionNode, ctx: &AttributeContext) -> Explanation {
	let mut trace = Vec::new();
	let allowed = explain_node(node, ctx, 0, &mut trace);
	Explanation { allowed, trace }
}

fn explain_node(node: &ConditionNode, ctx: &AttributeContext, depth: usize, trace: &mut Vec<String>) -> bool {
	let mark = trace.len();
	let indent = "  ".repeat(depth);

	let (result, header) = match node {
		ConditionNode::Leaf { description, leaf } => {
			let result = evaluate_leaf(leaf, ctx);
			let label = leaf.description.as_deref().or(description.as_deref());
			(result, describe_leaf(leaf, ctx, label))
		}
		ConditionNode::And { description, children } => {
			let result = !children.is_empty()
				&& children
					.iter()
					.all(|c| explain_node(c, ctx, depth + 1, trace));
			(result, describe_node("AND", description.as_deref(), children.is_empty()))
		}
		ConditionNode::Or { description, children } => {
			let result = children
				.iter()
				.any(|c| explain_node(c, ctx, depth + 1, trace));
			(result, describe_node("OR", description.as_deref(), children.is_empty()))
		}
	};

	if result {
		trace.truncate(mark);
	} else {
		trace.insert(mark, format!("{indent}{header}"));
	}
	result
}

fn describe_node(logic: &str, description: Option<&str>, empty: bool) -> String {
	let mut line = match description {
		Some(text) => format!("{logic} failed: {text}"),
		None => format!("{logic} failed"),
	};
	if empty {
		line.push_str(" (no children)");
	}
	line
}

fn describe_leaf(leaf: &ConditionLeaf, ctx: &AttributeContext, label: Option<&str>) -> String {
	let observed = if leaf.attribute.projection().is_some() {
		ctx.project(&leaf.attribute)
			.map(|values| Value::Array(values.into_iter().cloned().collect()))
	} else {
		ctx.resolve(&leaf.attribute).cloned()
	};

	let expected = match leaf.comparison.operand() {
		Some(Operand::Literal(value)) => format!(" {value}"),
		Some(Operand::Attribute(path)) => format!(" {path} ({})", render(ctx.resolve(path))),
		None => String::new(),
	};

	let mut line = format!(
		"{} {}{}, observed {}",
		leaf.attribute,
		leaf.comparison.operator().as_str(),
		expected,
		render(observed.as_ref())
	);
	if let Some(label) = label {
		line = format!("{label}: {line}");
	}
	line
}

fn render(value: Option<&Value>) -> String {
	value.map_or_else(|| "<absent>".to_string(), Value::to_string)
}

fn evaluate_leaf(leaf: &ConditionLeaf, ctx: &AttributeContext) -> bool {
	match &leaf.comparison {
		Comparison::IsNull => ctx.resolve(&leaf.attribute).map_or(true, is_empty),
		Comparison::IsNotNull => !ctx.resolve(&leaf.attribute).map_or(true, is_empty),
		Comparison::Equals(operand) => match (ctx.resolve(&leaf.attribute), operand_value(operand, ctx)) {
			(Some(left), Some(right)) => values_equal(left, right),
			_ => false,
		},
		Comparison::Contains(operand) => {
			let Some(needle) = operand_value(operand, ctx) else {
				return false;
			};
			if leaf.attribute.projection().is_some() {
				return ctx
					.project(&leaf.attribute)
					.is_some_and(|values| values.into_iter().any(|v| values_equal(v, needle)));
			}
			match ctx.resolve(&leaf.attribute) {
				Some(Value::Array(items)) => items.iter().any(|v| values_equal(v, needle)),
				_ => false,
			}
		}
	}
}

fn operand_value<'a>(operand: &'a Operand, ctx: &'a AttributeContext) -> Option<&'a Value> {
	match operand {
		Operand::Literal(value) => Some(value),
		Operand::Attribute(path) => ctx.resolve(path),
	}
}

/// Loose equality between attribute values.
///
/// Numbers compare numerically and match strings that parse to the same
/// number; everything else compares by type and structure.
pub fn values_equal(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Null, Value::Null) => true,
		(Value::String(a), Value::String(b)) => a == b,
		(Value::Bool(a), Value::Bool(b)) => a == b,
		(Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
		(Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
			number_matches_str(n, s.trim())
		}
		(Value::Array(a), Value::Array(b)) => {
			a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
		}
		(Value::Object(a), Value::Object(b)) => {
			a.len() == b.len()
				&& a
					.iter()
					.all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
		}
		_ => false,
	}
}

fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
	if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
		return x == y;
	}
	if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
		return x == y;
	}
	match (a.as_f64(), b.as_f64()) {
		(Some(x), Some(y)) => x == y,
		_ => false,
	}
}

fn number_matches_str(n: &serde_json::Number, s: &str) -> bool {
	if let Ok(parsed) = s.parse::<i64>() {
		return n.as_i64() == Some(parsed) || n.as_f64() == Some(parsed as f64);
	}
	match (s.parse::<f64>(), n.as_f64()) {
		(Ok(parsed), Some(x)) => parsed.is_finite() && parsed == x,
		_ => false,
	}
}

/// Whether a present value counts as empty for `IsNull`.
pub fn is_empty(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Bool(b) => !b,
		Value::Number(n) => n.as_f64() == Some(0.0),
		Value::String(s) => s.is_empty() || s == NIL_UUID,
		Value::Array(items) => items.is_empty(),
		Value::Object(map) => map.is_empty(),
	}
}
