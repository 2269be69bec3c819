// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dotted attribute paths into an [`AttributeContext`](crate::AttributeContext).
//!
//! A path starts with one of the five namespaces and continues with object
//! keys, e.g. `subject.company_id` or `body.service.id`. Numeric segments
//! index into arrays. A path may contain one projection, `roles[*].id`, which
//! maps the remainder of the path over every element of a collection; it is
//! only meaningful on the left-hand side of `Contains`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

const PROJECTION: &str = "[*]";

/// Top-level namespace of the attribute context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeRoot {
	Subject,
	Resource,
	Path,
	Query,
	Body,
}

impl AttributeRoot {
	pub const ALL: [AttributeRoot; 5] = [
		AttributeRoot::Subject,
		AttributeRoot::Resource,
		AttributeRoot::Path,
		AttributeRoot::Query,
		AttributeRoot::Body,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			AttributeRoot::Subject => "subject",
			AttributeRoot::Resource => "resource",
			AttributeRoot::Path => "path",
			AttributeRoot::Query => "query",
			AttributeRoot::Body => "body",
		}
	}

	fn parse(s: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|r| r.as_str() == s)
	}
}

/// A validated attribute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributePath {
	raw: String,
	root: AttributeRoot,
	segments: Vec<String>,
	projection: Option<Vec<String>>,
}

impl AttributePath {
	pub fn root(&self) -> AttributeRoot {
		self.root
	}

	/// Keys below the root, up to any projection.
	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Keys applied to each element after `[*]`, if this path projects.
	pub fn projection(&self) -> Option<&[String]> {
		self.projection.as_deref()
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	fn invalid(path: &str, message: impl Into<String>) -> ConfigurationError {
		ConfigurationError::InvalidAttributePath {
			path: path.to_string(),
			message: message.into(),
		}
	}

	fn split_keys<'a>(path: &str, part: &'a str) -> Result<Vec<&'a str>, ConfigurationError> {
		let keys: Vec<&str> = part.split('.').collect();
		if keys.iter().any(|k| k.trim().is_empty() || k.trim() != *k) {
			return Err(Self::invalid(path, "empty or padded segment"));
		}
		if keys.iter().any(|k| k.contains('[') || k.contains(']')) {
			return Err(Self::invalid(path, "only '[*]' projections are supported"));
		}
		Ok(keys)
	}
}

impl FromStr for AttributePath {
	type Err = ConfigurationError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		if raw.is_empty() {
			return Err(Self::invalid(raw, "path is empty"));
		}

		let (head, tail) = match raw.split_once(PROJECTION) {
			Some((head, tail)) => {
				let tail = tail
					.strip_prefix('.')
					.ok_or_else(|| Self::invalid(raw, "'[*]' must be followed by '.field'"))?;
				if tail.contains(PROJECTION) {
					return Err(Self::invalid(raw, "at most one '[*]' projection is allowed"));
				}
				(head, Some(tail))
			}
			None => (raw, None),
		};

		let mut keys = Self::split_keys(raw, head)?.into_iter();
		let root = keys
			.next()
			.and_then(AttributeRoot::parse)
			.ok_or_else(|| {
				Self::invalid(
					raw,
					"must start with subject., resource., path., query. or body.",
				)
			})?;
		let segments: Vec<String> = keys.map(str::to_string).collect();
		if segments.is_empty() {
			return Err(Self::invalid(raw, "path names only a namespace"));
		}

		let projection = match tail {
			Some(tail) => Some(
				Self::split_keys(raw, tail)?
					.into_iter()
					.map(str::to_string)
					.collect(),
			),
			None => None,
		};

		Ok(Self {
			raw: raw.to_string(),
			root,
			segments,
			projection,
		})
	}
}

impl TryFrom<String> for AttributePath {
	type Error = ConfigurationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<AttributePath> for String {
	fn from(path: AttributePath) -> Self {
		path.raw
	}
}

impl fmt::Display for AttributePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}
