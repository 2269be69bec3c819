// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access-check and policy-evaluation handlers.
//!
//! Both evaluate against the snapshot the request was admitted under and read
//! nothing from tenant storage: the caller supplies the resource attributes.

use agenda_server_api::{
	CheckAccessRequest, CheckAccessResponse, ErrorResponse, EvaluatePolicyRequest, EvaluatePolicyResponse,
	SubjectPayload,
};
use agenda_server_authz::{
	assess, AllowReason, AttributeContext, AuthzError, AuthzSnapshot, BranchId, CompanyId, Decision, Endpoint,
	PolicyId, RequestAttributes, Subject, SubjectId,
};
use axum::{
	extract::{rejection::JsonRejection, Path},
	http::Method,
	Extension, Json,
};

use crate::error::{ApiError, ServerError};
use crate::middleware::RequestScope;
use crate::state::RequestLocale;

fn invalid_body(locale: &'static str) -> ApiError {
	ServerError::from(AuthzError::InvalidBody).localized(locale)
}

/// Build a hypothetical subject. Any malformed id rejects the payload.
pub fn subject_from_payload(payload: SubjectPayload) -> Result<Subject, AuthzError> {
	let id: SubjectId = payload.id.parse().map_err(|_| AuthzError::InvalidBody)?;
	let mut subject = Subject::new(id);
	if let Some(company_id) = payload.company_id {
		let company_id: CompanyId = company_id.parse().map_err(|_| AuthzError::InvalidBody)?;
		subject = subject.with_company(company_id);
	}
	for role in payload.roles {
		subject = subject.with_role(role);
	}
	for branch in payload.branches {
		let branch: BranchId = branch.parse().map_err(|_| AuthzError::InvalidBody)?;
		subject = subject.with_branch(branch);
	}
	Ok(subject)
}

fn allowed(snapshot: &AuthzSnapshot, endpoint: &Endpoint, reason: AllowReason) -> CheckAccessResponse {
	let rule = match reason {
		AllowReason::Rule(id) => snapshot.policies().get(id),
		AllowReason::Ungated => None,
	};
	CheckAccessResponse {
		allowed: true,
		endpoint_id: endpoint.id.to_string(),
		policy_id: rule.map(|r| r.id.to_string()),
		policy_name: rule.map(|r| r.name.clone()),
		denial: None,
		reason: Vec::new(),
	}
}

fn denied(endpoint: &Endpoint, kind: AuthzError, reason: Vec<String>) -> CheckAccessResponse {
	CheckAccessResponse {
		allowed: false,
		endpoint_id: endpoint.id.to_string(),
		policy_id: None,
		policy_name: None,
		denial: Some(kind.code().to_string()),
		reason,
	}
}

#[utoipa::path(
    post,
    path = "/authz/check",
    request_body = CheckAccessRequest,
    responses(
        (status = 200, description = "Decision for the hypothetical request", body = CheckAccessResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Caller may not check access", body = ErrorResponse),
        (status = 404, description = "No endpoint matches method and path", body = ErrorResponse)
    ),
    tag = "authz"
)]
/// POST /authz/check - Would this subject be allowed to call this route?
pub async fn check_access(
	Extension(scope): Extension<RequestScope>,
	RequestLocale(locale): RequestLocale,
	payload: Result<Json<CheckAccessRequest>, JsonRejection>,
) -> Result<Json<CheckAccessResponse>, ApiError> {
	let Json(req) = payload.map_err(|_| invalid_body(locale))?;
	let method: Method = req
		.method
		.to_ascii_uppercase()
		.parse()
		.map_err(|_| invalid_body(locale))?;

	let snapshot = &scope.snapshot;
	let matched = snapshot
		.endpoints()
		.match_route(&method, &req.path)
		.map_err(|_| invalid_body(locale))?;
	let Some((endpoint, mut path)) = matched else {
		return Err(ServerError::EndpointNotFound {
			method: method.to_string(),
			path: req.path,
		}
		.localized(locale));
	};

	if !endpoint.deny_if_unauthorized {
		return Ok(Json(allowed(snapshot, endpoint, AllowReason::Ungated)));
	}

	let subject = req
		.subject
		.map(subject_from_payload)
		.transpose()
		.map_err(|kind| ServerError::from(kind).localized(locale))?;
	let Some(subject) = subject else {
		return Ok(Json(denied(
			endpoint,
			AuthzError::NoToken,
			vec!["no subject supplied".to_string()],
		)));
	};

	path.extend(req.path_params.unwrap_or_default());
	let request = RequestAttributes::new(path, req.query.unwrap_or_default(), req.body.unwrap_or_default());
	let ctx = AttributeContext::build(Some(&subject), req.resource.unwrap_or_default(), &request);

	let assessment = assess(snapshot.policies().rules_for(endpoint.id), &ctx);
	let response = match assessment.decision {
		Decision::Allow(reason) => allowed(snapshot, endpoint, reason),
		Decision::Deny(kind) => denied(endpoint, kind, assessment.trace),
	};
	tracing::debug!(
		endpoint_id = %endpoint.id,
		subject_id = %subject.id,
		allowed = response.allowed,
		"access checked"
	);
	Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/authz/policies/{id}/evaluate",
    params(
        ("id" = String, Path, description = "Policy rule ID")
    ),
    request_body = EvaluatePolicyRequest,
    responses(
        (status = 200, description = "Result and trace of the rule", body = EvaluatePolicyResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Caller may not evaluate policies", body = ErrorResponse),
        (status = 404, description = "Policy not found", body = ErrorResponse)
    ),
    tag = "authz"
)]
/// POST /authz/policies/{id}/evaluate - Evaluate one rule against a supplied context.
pub async fn evaluate_policy(
	Extension(scope): Extension<RequestScope>,
	RequestLocale(locale): RequestLocale,
	Path(id): Path<String>,
	payload: Result<Json<EvaluatePolicyRequest>, JsonRejection>,
) -> Result<Json<EvaluatePolicyResponse>, ApiError> {
	let not_found = || ServerError::PolicyNotFound(id.clone()).localized(locale);
	let policy_id: PolicyId = id.parse().map_err(|_| not_found())?;
	let rule = scope.snapshot.policies().get(policy_id).ok_or_else(not_found)?;

	let Json(req) = payload.map_err(|_| invalid_body(locale))?;
	let subject = req
		.subject
		.map(subject_from_payload)
		.transpose()
		.map_err(|kind| ServerError::from(kind).localized(locale))?;

	let request = RequestAttributes::new(
		req.path.unwrap_or_default(),
		req.query.unwrap_or_default(),
		req.body.unwrap_or_default(),
	);
	let ctx = AttributeContext::build(subject.as_ref(), req.resource.unwrap_or_default(), &request);
	let explanation = rule.explain(&ctx);

	Ok(Json(EvaluatePolicyResponse {
		policy_id: rule.id.to_string(),
		policy_name: rule.name.clone(),
		endpoint_id: rule.endpoint_id.to_string(),
		allowed: explanation.allowed,
		reason: explanation.trace,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(company_id: Option<&str>) -> SubjectPayload {
		SubjectPayload {
			id: SubjectId::generate().to_string(),
			company_id: company_id.map(str::to_string),
			roles: vec!["manager".to_string()],
			branches: vec![BranchId::generate().to_string()],
		}
	}

	#[test]
	fn test_subject_from_payload() {
		let company = CompanyId::generate();
		let subject = subject_from_payload(payload(Some(&company.to_string()))).unwrap();
		assert_eq!(subject.company_id, Some(company));
		assert!(subject.roles.contains("manager"));
		assert_eq!(subject.branches.len(), 1);
	}

	#[test]
	fn test_client_payload_has_no_company() {
		let subject = subject_from_payload(payload(None)).unwrap();
		assert_eq!(subject.company_id, None);
	}

	#[test]
	fn test_malformed_ids_are_rejected() {
		assert_eq!(
			subject_from_payload(payload(Some("acme"))).unwrap_err(),
			AuthzError::InvalidBody
		);

		let mut bad = payload(None);
		bad.id = "someone".to_string();
		assert_eq!(subject_from_payload(bad).unwrap_err(), AuthzError::InvalidBody);
	}
}
