// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request attribute namespaces.
//!
//! [`RequestAttributes`] holds the raw path, query and body values of one
//! request. [`AttributeContext`] merges them with the subject and the hydrated
//! resource into the read-only namespace that conditions are evaluated
//! against. Both are built fresh for every request and never shared.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::attribute::{AttributePath, AttributeRoot};
use crate::resource::RequestLocation;
use crate::subject::Subject;

pub type AttributeMap = Map<String, Value>;

/// Raw values read from the current request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestAttributes {
	pub path: AttributeMap,
	pub query: AttributeMap,
	pub body: AttributeMap,
}

impl RequestAttributes {
	pub fn new(path: AttributeMap, query: AttributeMap, body: AttributeMap) -> Self {
		Self { path, query, body }
	}

	pub fn with_path(mut self, key: impl Into<String>, value: Value) -> Self {
		self.path.insert(key.into(), value);
		self
	}

	pub fn with_query(mut self, key: impl Into<String>, value: Value) -> Self {
		self.query.insert(key.into(), value);
		self
	}

	pub fn with_body(mut self, key: impl Into<String>, value: Value) -> Self {
		self.body.insert(key.into(), value);
		self
	}

	pub fn location(&self, location: RequestLocation) -> &AttributeMap {
		match location {
			RequestLocation::Path => &self.path,
			RequestLocation::Query => &self.query,
			RequestLocation::Body => &self.body,
		}
	}

	/// Value for `key` in one location. Null and empty strings count as absent.
	pub fn lookup(&self, location: RequestLocation, key: &str) -> Option<&Value> {
		self.location(location).get(key).filter(|v| match v {
			Value::Null => false,
			Value::String(s) => !s.is_empty(),
			_ => true,
		})
	}
}

/// The evaluation namespace: `subject`, `resource`, `path`, `query`, `body`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeContext {
	subject: AttributeMap,
	resource: AttributeMap,
	path: AttributeMap,
	query: AttributeMap,
	body: AttributeMap,
}

impl AttributeContext {
	/// Assemble the context. An anonymous subject yields an empty `subject` map.
	pub fn build(
		subject: Option<&Subject>,
		resource: AttributeMap,
		request: &RequestAttributes,
	) -> Self {
		Self {
			subject: subject.map(Subject::to_attributes).unwrap_or_default(),
			resource,
			path: request.path.clone(),
			query: request.query.clone(),
			body: request.body.clone(),
		}
	}

	/// Assemble a context from already-flattened namespaces.
	pub fn from_parts(subject: AttributeMap, resource: AttributeMap, request: RequestAttributes) -> Self {
		Self {
			subject,
			resource,
			path: request.path,
			query: request.query,
			body: request.body,
		}
	}

	pub fn namespace(&self, root: AttributeRoot) -> &AttributeMap {
		match root {
			AttributeRoot::Subject => &self.subject,
			AttributeRoot::Resource => &self.resource,
			AttributeRoot::Path => &self.path,
			AttributeRoot::Query => &self.query,
			AttributeRoot::Body => &self.body,
		}
	}

	/// Value at a non-projecting path, or `None` when any step is missing.
	pub fn resolve(&self, path: &AttributePath) -> Option<&Value> {
		if path.projection().is_some() {
			return None;
		}
		let (first, rest) = path.segments().split_first()?;
		let start = self.namespace(path.root()).get(first)?;
		walk(start, rest)
	}

	/// Values reached by a `[*]` path, one per element that has the field.
	///
	/// `None` when the collection itself is missing or not an array.
	pub fn project(&self, path: &AttributePath) -> Option<Vec<&Value>> {
		let fields = path.projection()?;
		let (first, rest) = path.segments().split_first()?;
		let start = self.namespace(path.root()).get(first)?;
		let Value::Array(items) = walk(start, rest)? else {
			return None;
		};
		Some(
			items
				.iter()
				.filter(|item| item.is_object())
				.filter_map(|item| walk(item, fields))
				.collect(),
		)
	}
}

fn walk<'a>(start: &'a Value, keys: &[String]) -> Option<&'a Value> {
	keys.iter().try_fold(start, |current, key| match current {
		Value::Object(map) => map.get(key),
		Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	})
}
