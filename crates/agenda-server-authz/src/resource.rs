// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource catalog: how to find a stored entity from request data.
//!
//! A [`Resource`] names a storage table and an ordered list of
//! [`ResourceReference`]s. Hydration walks the references in declaration
//! order and uses the first one whose request key is present; see
//! [`Resource::locate`]. The storage read itself happens in the db layer,
//! inside the request's tenant session.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestAttributes;
use crate::error::{ConfigurationError, Result};
use crate::types::is_valid_identifier;

/// Where in the request a reference reads its key from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestLocation {
	Path,
	Query,
	Body,
}

impl fmt::Display for RequestLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			RequestLocation::Path => "path",
			RequestLocation::Query => "query",
			RequestLocation::Body => "body",
		})
	}
}

/// Maps one request value onto one storage column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
	pub storage_key: String,
	pub request_key: String,
	pub request_location: RequestLocation,
}

/// A storage-backed entity type that policies can reason about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
	pub name: String,
	pub storage_table: String,
	#[serde(default)]
	pub references: Vec<ResourceReference>,
}

/// The reference chosen for a request and the value it extracted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLookup<'a> {
	pub reference: &'a ResourceReference,
	pub value: &'a Value,
}

impl Resource {
	pub fn new(name: impl Into<String>, storage_table: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			storage_table: storage_table.into(),
			references: Vec::new(),
		}
	}

	/// Append a reference; declaration order is lookup order.
	pub fn reference(
		mut self,
		storage_key: impl Into<String>,
		request_key: impl Into<String>,
		request_location: RequestLocation,
	) -> Self {
		self.references.push(ResourceReference {
			storage_key: storage_key.into(),
			request_key: request_key.into(),
			request_location,
		});
		self
	}

	/// Check identifiers before they are ever interpolated into SQL.
	pub fn validate(&self) -> Result<()> {
		if self.name.trim().is_empty() {
			return Err(ConfigurationError::InvalidValue {
				kind: "resource name",
				value: self.name.clone(),
			});
		}
		if !is_valid_identifier(&self.storage_table) {
			return Err(ConfigurationError::InvalidValue {
				kind: "storage table",
				value: self.storage_table.clone(),
			});
		}
		for reference in &self.references {
			if !is_valid_identifier(&reference.storage_key) {
				return Err(ConfigurationError::InvalidValue {
					kind: "storage key",
					value: format!("{}.{}", self.name, reference.storage_key),
				});
			}
			if reference.request_key.trim().is_empty() {
				return Err(ConfigurationError::InvalidValue {
					kind: "request key",
					value: format!("{}.<empty>", self.name),
				});
			}
		}
		Ok(())
	}

	/// First reference, in declaration order, whose key is present in its location.
	pub fn locate<'a>(&'a self, request: &'a RequestAttributes) -> Option<ResourceLookup<'a>> {
		self.references.iter().find_map(|reference| {
			request
				.lookup(reference.request_location, &reference.request_key)
				.map(|value| ResourceLookup { reference, value })
		})
	}
}

/// Read-only catalog of resources keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
	resources: HashMap<String, Arc<Resource>>,
}

impl ResourceRegistry {
	/// Validate and index resources. Duplicate names are a configuration error.
	pub fn new(resources: impl IntoIterator<Item = Resource>) -> Result<Self> {
		let mut indexed = HashMap::new();
		for resource in resources {
			resource.validate()?;
			let name = resource.name.clone();
			if indexed.insert(name.clone(), Arc::new(resource)).is_some() {
				return Err(ConfigurationError::Duplicate {
					kind: "resource",
					name,
				});
			}
		}
		Ok(Self { resources: indexed })
	}

	pub fn get(&self, name: &str) -> Option<&Arc<Resource>> {
		self.resources.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.resources.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.resources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.resources.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
		self.resources.values()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn employee() -> Resource {
		Resource::new("employee", "employees")
			.reference("id", "id", RequestLocation::Query)
			.reference("id", "id", RequestLocation::Path)
			.reference("id", "employee_id", RequestLocation::Path)
			.reference("email", "email", RequestLocation::Body)
	}

	#[test]
	fn test_locate_uses_declaration_order() {
		let resource = employee();
		let request = RequestAttributes::default()
			.with_path("id", json!("from-path"))
			.with_query("id", json!("from-query"));

		let found = resource.locate(&request).unwrap();
		assert_eq!(found.reference.request_location, RequestLocation::Query);
		assert_eq!(found.value, &json!("from-query"));
	}

	#[test]
	fn test_locate_respects_location() {
		let resource = employee();
		// `employee_id` is only declared for the path, not the body.
		let request = RequestAttributes::default().with_body("employee_id", json!("x"));
		assert!(resource.locate(&request).is_none());
	}

	#[test]
	fn test_locate_skips_empty_values() {
		let resource = employee();
		let request = RequestAttributes::default()
			.with_query("id", json!(""))
			.with_path("employee_id", json!("abc"));

		let found = resource.locate(&request).unwrap();
		assert_eq!(found.reference.request_key, "employee_id");
	}

	#[test]
	fn test_locate_none_when_nothing_present() {
		assert!(employee().locate(&RequestAttributes::default()).is_none());
	}

	#[test]
	fn test_registry_rejects_duplicates() {
		let err = ResourceRegistry::new([employee(), employee()]).unwrap_err();
		assert!(matches!(err, ConfigurationError::Duplicate { .. }));
	}

	#[test]
	fn test_registry_rejects_unsafe_identifiers() {
		let bad_table = Resource::new("x", "employees; drop");
		assert!(ResourceRegistry::new([bad_table]).is_err());

		let bad_key = Resource::new("x", "xs").reference("id\"", "id", RequestLocation::Path);
		assert!(ResourceRegistry::new([bad_key]).is_err());
	}

	#[test]
	fn test_persisted_shape() {
		let resource: Resource = serde_json::from_value(json!({
			"name": "branch",
			"storage_table": "branches",
			"references": [
				{"storage_key": "id", "request_key": "branch_id", "request_location": "body"}
			]
		}))
		.unwrap();
		assert_eq!(resource.references[0].request_location, RequestLocation::Body);
	}
}
