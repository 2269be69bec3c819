// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access-check and policy-evaluation API types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A hypothetical subject. `company_id` absent means a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SubjectPayload {
	pub id: String,
	#[serde(default)]
	pub company_id: Option<String>,
	#[serde(default)]
	pub roles: Vec<String>,
	#[serde(default)]
	pub branches: Vec<String>,
}

/// Would `subject` be allowed to call `method path`?
///
/// Path parameters are taken from `path` by matching it against the
/// endpoint's template; `path_params` overrides individual values. The
/// resource attributes are taken as given, nothing is read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CheckAccessRequest {
	pub method: String,
	pub path: String,
	#[serde(default)]
	pub subject: Option<SubjectPayload>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub resource: Option<Map<String, Value>>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub path_params: Option<Map<String, Value>>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub query: Option<Map<String, Value>>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub body: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CheckAccessResponse {
	pub allowed: bool,
	pub endpoint_id: String,
	/// First rule that allowed, if any.
	pub policy_id: Option<String>,
	pub policy_name: Option<String>,
	/// Deny code when not allowed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub denial: Option<String>,
	/// Merged denial trace, empty when allowed.
	#[serde(default)]
	pub reason: Vec<String>,
}

/// Context to evaluate a single policy rule against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EvaluatePolicyRequest {
	#[serde(default)]
	pub subject: Option<SubjectPayload>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub resource: Option<Map<String, Value>>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub path: Option<Map<String, Value>>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub query: Option<Map<String, Value>>,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
	pub body: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EvaluatePolicyResponse {
	pub policy_id: String,
	pub policy_name: String,
	pub endpoint_id: String,
	pub allowed: bool,
	#[serde(default)]
	pub reason: Vec<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_check_request_optional_fields() {
		let req: CheckAccessRequest = serde_json::from_value(json!({
			"method": "GET",
			"path": "/employee/1",
			"subject": {"id": "s-1"}
		}))
		.unwrap();
		let subject = req.subject.unwrap();
		assert_eq!(subject.company_id, None);
		assert!(subject.roles.is_empty());
		assert!(req.resource.is_none());
		assert!(req.path_params.is_none());
	}

	#[test]
	fn test_allowed_response_omits_denial() {
		let resp = CheckAccessResponse {
			allowed: true,
			endpoint_id: "e".to_string(),
			policy_id: Some("p".to_string()),
			policy_name: Some("self".to_string()),
			denial: None,
			reason: Vec::new(),
		};
		let value = serde_json::to_value(&resp).unwrap();
		assert!(value.get("denial").is_none());
		assert_eq!(value["reason"], json!([]));
	}
}
