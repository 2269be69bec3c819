// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use super::support::{body_json, run_authz_cases, AuthzCase, TestApp};

fn employee_rule_id(app: &TestApp) -> String {
	let snapshot = app.state.snapshot.load();
	let endpoint = snapshot.endpoints().find(&Method::GET, "/employee/{id}").unwrap();
	snapshot.policies().rules_for(endpoint.id)[0].id.to_string()
}

#[tokio::test]
async fn test_only_superadmin_may_check_access() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let body = json!({"method": "GET", "path": "/health"});
	let evaluate = format!("/authz/policies/{}/evaluate", employee_rule_id(&app));

	let cases = vec![
		AuthzCase {
			name: "superadmin_can_check",
			method: Method::POST,
			path: "/authz/check".to_string(),
			subject: Some(f.superadmin.clone()),
			tenant: None,
			body: Some(body.clone()),
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "employee_cannot_check",
			method: Method::POST,
			path: "/authz/check".to_string(),
			subject: Some(f.employee_x.clone()),
			tenant: None,
			body: Some(body.clone()),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "anonymous_cannot_check",
			method: Method::POST,
			path: "/authz/check".to_string(),
			subject: None,
			tenant: None,
			body: Some(body.clone()),
			expected_status: StatusCode::UNAUTHORIZED,
		},
		AuthzCase {
			name: "employee_cannot_evaluate",
			method: Method::POST,
			path: evaluate.clone(),
			subject: Some(f.employee_y.clone()),
			tenant: None,
			body: Some(json!({})),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "superadmin_can_evaluate",
			method: Method::POST,
			path: evaluate,
			subject: Some(f.superadmin.clone()),
			tenant: None,
			body: Some(json!({})),
			expected_status: StatusCode::OK,
		},
	];

	run_authz_cases(&app, &cases).await;
}

async fn check(app: &TestApp, body: Value) -> (StatusCode, Value) {
	let response = app.post("/authz/check", Some(&app.fixtures.superadmin), &body).await;
	let status = response.status();
	(status, body_json(response).await)
}

#[tokio::test]
async fn test_check_access_mirrors_the_gate() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let c1 = f.c1.id.to_string();
	let x = f.employee_x.id.to_string();
	let resource = json!({"id": x, "company_id": c1});

	// Colleague: allowed by the company branch of the OR.
	let (status, body) = check(
		&app,
		json!({
			"method": "get",
			"path": format!("/employee/{x}"),
			"subject": {"id": f.employee_y.id.to_string(), "company_id": c1},
			"resource": resource,
		}),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["allowed"], true);
	assert_eq!(body["policy_name"], "employee self or company member");
	assert_eq!(body["reason"], json!([]));
	assert!(body.get("denial").is_none());

	// Outsider: denied, with a trace of both failed branches.
	let (_, body) = check(
		&app,
		json!({
			"method": "GET",
			"path": format!("/employee/{x}"),
			"subject": {"id": f.employee_z.id.to_string(), "company_id": f.c2.id.to_string()},
			"resource": resource,
		}),
	)
	.await;
	assert_eq!(body["allowed"], false);
	assert_eq!(body["denial"], "unauthorized");
	assert_eq!(body["policy_id"], Value::Null);
	assert!(!body["reason"].as_array().unwrap().is_empty());

	// No resource supplied: fails closed rather than matching.
	let (_, body) = check(
		&app,
		json!({
			"method": "GET",
			"path": format!("/employee/{x}"),
			"subject": {"id": f.employee_y.id.to_string(), "company_id": c1},
		}),
	)
	.await;
	assert_eq!(body["allowed"], false);

	// No subject on a gated route.
	let (_, body) = check(&app, json!({"method": "GET", "path": format!("/employee/{x}")})).await;
	assert_eq!(body["allowed"], false);
	assert_eq!(body["denial"], "no_token");
}

#[tokio::test]
async fn test_check_access_route_resolution() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	let (status, body) = check(&app, json!({"method": "GET", "path": "/health"})).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["allowed"], true);
	assert_eq!(body["policy_id"], Value::Null);

	// Path params come from the template and can be overridden.
	let (_, body) = check(
		&app,
		json!({
			"method": "GET",
			"path": format!("/branch/{}", f.branch_other),
			"subject": {
				"id": f.employee_x.id.to_string(),
				"branches": [f.branch_assigned.to_string()],
			},
			"resource": {"id": f.branch_assigned.to_string()},
			"path_params": {"id": f.branch_assigned.to_string()},
		}),
	)
	.await;
	assert_eq!(body["allowed"], true);
	assert_eq!(body["policy_name"], "assigned to branch");

	let (status, body) = check(&app, json!({"method": "GET", "path": "/client/%FF"})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_body");

	let (status, body) = check(&app, json!({"method": "GET", "path": "/invoices/1"})).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "endpoint_not_found");

	let (status, body) = check(&app, json!({"method": "NOT A METHOD", "path": "/health"})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_body");

	let (status, _) = check(
		&app,
		json!({"method": "GET", "path": "/health", "subject": {"id": "not-a-uuid"}}),
	)
	.await;
	assert_eq!(status, StatusCode::OK);

	let (status, body) = check(
		&app,
		json!({"method": "GET", "path": "/client/1", "subject": {"id": "not-a-uuid"}}),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn test_evaluate_policy() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let rule_id = employee_rule_id(&app);
	let path = format!("/authz/policies/{rule_id}/evaluate");
	let x = f.employee_x.id.to_string();

	let response = app
		.post(
			&path,
			Some(&f.superadmin),
			&json!({
				"subject": {"id": x, "company_id": f.c1.id.to_string()},
				"resource": {"id": x, "company_id": f.c1.id.to_string()},
			}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	let body = body_json(response).await;
	assert_eq!(body["policy_id"], json!(rule_id));
	assert_eq!(body["allowed"], true);

	let response = app.post(&path, Some(&f.superadmin), &json!({})).await;
	let body = body_json(response).await;
	assert_eq!(body["allowed"], false);
	assert!(!body["reason"].as_array().unwrap().is_empty());

	for missing in [
		format!("/authz/policies/{}/evaluate", agenda_server_authz::PolicyId::generate()),
		"/authz/policies/nope/evaluate".to_string(),
	] {
		let response = app.post(&missing, Some(&f.superadmin), &json!({})).await;
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(body_json(response).await["error"], "policy_not_found");
	}
}
