// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted endpoint descriptors and the read-only route table built from them.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::context::AttributeMap;
use crate::error::{AuthzError, ConfigurationError, Result};
use crate::resource::ResourceRegistry;
use crate::types::EndpointId;

/// One registered route plus its tenant and authorization flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
	pub id: EndpointId,
	#[serde(with = "method_serde")]
	pub method: Method,
	pub path: String,
	pub controller_name: String,
	#[serde(default)]
	pub resource: Option<String>,
	#[serde(default)]
	pub needs_tenant: bool,
	#[serde(default)]
	pub deny_if_unauthorized: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl Endpoint {
	/// A public, tenant-less endpoint. Use the builders to tighten it.
	pub fn new(method: Method, path: &str, controller_name: impl Into<String>) -> Self {
		Self {
			id: EndpointId::generate(),
			method,
			path: normalize_path(path),
			controller_name: controller_name.into(),
			resource: None,
			needs_tenant: false,
			deny_if_unauthorized: false,
			description: None,
		}
	}

	pub fn with_id(mut self, id: EndpointId) -> Self {
		self.id = id;
		self
	}

	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());
		self
	}

	pub fn tenant_scoped(mut self) -> Self {
		self.needs_tenant = true;
		self
	}

	pub fn gated(mut self) -> Self {
		self.deny_if_unauthorized = true;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Match a concrete request path against this endpoint's template.
	///
	/// Returns the percent-decoded `{param}` values when the path matches,
	/// `Ok(None)` when it does not, and `InvalidBody` when a captured segment
	/// does not decode to UTF-8.
	pub fn match_path(&self, request_path: &str) -> std::result::Result<Option<AttributeMap>, AuthzError> {
		let Some(captures) = self.capture(request_path) else {
			return Ok(None);
		};
		captures
			.into_iter()
			.map(|(name, raw)| {
				let value = urlencoding::decode(raw).map_err(|_| AuthzError::InvalidBody)?;
				Ok((name.to_string(), serde_json::Value::String(value.into_owned())))
			})
			.collect::<std::result::Result<AttributeMap, AuthzError>>()
			.map(Some)
	}

	/// Raw `(name, segment)` pairs when `request_path` fits the template.
	fn capture<'a>(&'a self, request_path: &'a str) -> Option<Vec<(&'a str, &'a str)>> {
		let template: Vec<&str> = segments(&self.path).collect();
		let actual: Vec<&str> = segments(request_path).collect();
		if template.len() != actual.len() {
			return None;
		}

		let mut captures = Vec::new();
		for (expected, value) in template.into_iter().zip(actual) {
			match param_name(expected) {
				Some(name) => captures.push((name, value)),
				None if expected == value => {}
				None => return None,
			}
		}
		Some(captures)
	}

	fn literal_segments(&self) -> usize {
		segments(&self.path).filter(|s| !s.starts_with('{')).count()
	}
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
	path.split('/').filter(|s| !s.is_empty())
}

fn param_name(segment: &str) -> Option<&str> {
	segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

/// Whether two templates cannot share one router.
///
/// Walking both from the root, they stay on the same branch while their
/// segments are equal. Reaching a position where both hold a parameter under
/// different names is a conflict; any literal difference splits them safely.
fn conflicts(a: &str, b: &str) -> bool {
	for (x, y) in segments(a).zip(segments(b)) {
		match (param_name(x), param_name(y)) {
			(Some(p), Some(q)) if p != q => return true,
			(Some(_), Some(_)) => {}
			(None, None) if x == y => {}
			_ => return false,
		}
	}
	false
}

/// Canonical route path: leading slash, no trailing slash, `:param` as `{param}`.
pub fn normalize_path(path: &str) -> String {
	let parts: Vec<String> = segments(path.trim())
		.map(|segment| match segment.strip_prefix(':') {
			Some(name) => format!("{{{name}}}"),
			None => segment.to_string(),
		})
		.collect();
	format!("/{}", parts.join("/"))
}

mod method_serde {
	use http::Method;
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(method.as_str())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).map_err(D::Error::custom)
	}
}

/// Read-only route table keyed by `(method, path)` and by id.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
	by_route: HashMap<(Method, String), Arc<Endpoint>>,
	by_id: HashMap<EndpointId, Arc<Endpoint>>,
}

impl EndpointRegistry {
	/// Index endpoints, resolving every declared resource against `resources`.
	///
	/// Fails on an unknown resource, a duplicate route or a duplicate id.
	#[tracing::instrument(level = "debug", skip_all, fields(count = tracing::field::Empty))]
	pub fn load(endpoints: impl IntoIterator<Item = Endpoint>, resources: &ResourceRegistry) -> Result<Self> {
		let mut registry = Self::default();
		for mut endpoint in endpoints {
			endpoint.path = normalize_path(&endpoint.path);

			if let Some(resource) = &endpoint.resource {
				if !resources.contains(resource) {
					return Err(ConfigurationError::UnknownResource {
						endpoint: endpoint.id,
						resource: resource.clone(),
					});
				}
			}

			if let Some(existing) = registry
				.by_route
				.keys()
				.map(|(_, path)| path)
				.find(|path| conflicts(path, &endpoint.path))
			{
				return Err(ConfigurationError::RouteConflict {
					path: endpoint.path.clone(),
					existing: existing.clone(),
				});
			}

			let key = (endpoint.method.clone(), endpoint.path.clone());
			if registry.by_route.contains_key(&key) {
				return Err(ConfigurationError::DuplicateRoute {
					method: key.0.to_string(),
					path: key.1,
				});
			}
			if registry.by_id.contains_key(&endpoint.id) {
				return Err(ConfigurationError::Duplicate {
					kind: "endpoint id",
					name: endpoint.id.to_string(),
				});
			}

			let endpoint = Arc::new(endpoint);
			registry.by_id.insert(endpoint.id, Arc::clone(&endpoint));
			registry.by_route.insert(key, endpoint);
		}
		tracing::Span::current().record("count", registry.len());
		Ok(registry)
	}

	pub fn get(&self, id: EndpointId) -> Option<&Arc<Endpoint>> {
		self.by_id.get(&id)
	}

	/// Exact lookup by method and route template.
	pub fn find(&self, method: &Method, path: &str) -> Option<&Arc<Endpoint>> {
		self.by_route.get(&(method.clone(), normalize_path(path)))
	}

	/// Find the endpoint serving a concrete request path, with its decoded
	/// path parameters.
	///
	/// An exact template match wins; otherwise the matching template with the
	/// most literal segments is chosen.
	pub fn match_route(
		&self,
		method: &Method,
		path: &str,
	) -> std::result::Result<Option<(&Arc<Endpoint>, AttributeMap)>, AuthzError> {
		let exact = self
			.find(method, path)
			.filter(|endpoint| endpoint.capture(path).is_some());
		let endpoint = exact.or_else(|| {
			self.by_route
				.values()
				.filter(|e| &e.method == method && e.capture(path).is_some())
				.max_by(|a, b| {
					a.literal_segments()
						.cmp(&b.literal_segments())
						.then_with(|| b.path.cmp(&a.path))
				})
		});

		let Some(endpoint) = endpoint else {
			return Ok(None);
		};
		let params = endpoint.match_path(path)?.unwrap_or_default();
		Ok(Some((endpoint, params)))
	}

	/// Endpoints sorted by path then method, for deterministic route building.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
		let mut endpoints: Vec<&Arc<Endpoint>> = self.by_id.values().collect();
		endpoints.sort_by(|a, b| {
			a.path
				.cmp(&b.path)
				.then_with(|| a.method.as_str().cmp(b.method.as_str()))
		});
		endpoints.into_iter()
	}

	pub fn len(&self) -> usize {
		self.by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}
}
