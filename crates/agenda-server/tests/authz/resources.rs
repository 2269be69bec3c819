// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::support::{body_json, run_authz_cases, AuthzCase, TestApp};

#[tokio::test]
async fn test_employee_authorization() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let x_path = format!("/employee/{}", f.employee_x.id);

	let cases = vec![
		AuthzCase {
			name: "employee_can_read_self",
			method: Method::GET,
			path: x_path.clone(),
			subject: Some(f.employee_x.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "colleague_can_read_via_company_branch",
			method: Method::GET,
			path: x_path.clone(),
			subject: Some(f.employee_y.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "other_company_employee_is_denied",
			method: Method::GET,
			path: x_path.clone(),
			subject: Some(f.employee_z.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "other_tenant_does_not_hold_the_row",
			method: Method::GET,
			path: x_path.clone(),
			subject: Some(f.employee_z.clone()),
			tenant: Some(f.c2.id),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
		AuthzCase {
			name: "client_cannot_read_employee",
			method: Method::GET,
			path: x_path.clone(),
			subject: Some(f.client.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "anonymous_is_unauthenticated",
			method: Method::GET,
			path: x_path.clone(),
			subject: None,
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::UNAUTHORIZED,
		},
		AuthzCase {
			name: "unknown_employee_is_not_found",
			method: Method::GET,
			path: format!("/employee/{}", f.superadmin.id),
			subject: Some(f.employee_x.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn test_public_resource_authorization() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let client_path = format!("/client/{}", f.client.id);
	let company_path = format!("/company/{}", f.c1.id);

	let cases = vec![
		AuthzCase {
			name: "client_can_read_self_without_tenant",
			method: Method::GET,
			path: client_path.clone(),
			subject: Some(f.client.clone()),
			tenant: None,
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "employee_cannot_read_client",
			method: Method::GET,
			path: client_path.clone(),
			subject: Some(f.employee_x.clone()),
			tenant: None,
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "employee_can_read_own_company",
			method: Method::GET,
			path: company_path.clone(),
			subject: Some(f.employee_y.clone()),
			tenant: None,
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "employee_cannot_read_other_company",
			method: Method::GET,
			path: company_path.clone(),
			subject: Some(f.employee_z.clone()),
			tenant: None,
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn test_branch_rules_are_ored() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	let cases = vec![
		AuthzCase {
			name: "member_reads_unassigned_branch",
			method: Method::GET,
			path: format!("/branch/{}", f.branch_other),
			subject: Some(f.employee_y.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "assigned_employee_reads_branch",
			method: Method::GET,
			path: format!("/branch/{}", f.branch_assigned),
			subject: Some(f.employee_x.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "outsider_reads_nothing",
			method: Method::GET,
			path: format!("/branch/{}", f.branch_assigned),
			subject: Some(f.employee_z.clone()),
			tenant: Some(f.c1.id),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn test_credentials_are_checked_before_rules() {
	let app = TestApp::new().await;
	let path = format!("/employee/{}", app.fixtures.employee_x.id);

	let response = app.get(&path, None, Some(&app.fixtures.c1.id)).await;
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(body_json(response).await["error"], "no_token");

	let request = axum::http::Request::get(path.as_str())
		.header("authorization", "Bearer not-a-known-token")
		.header("x-company-id", app.fixtures.c1.id.to_string())
		.body(axum::body::Body::empty())
		.unwrap();
	let response = app.send(request).await;
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(body_json(response).await["error"], "invalid_token");

	let request = axum::http::Request::get(path.as_str())
		.header("authorization", "Basic dXNlcjpwYXNz")
		.header("x-company-id", app.fixtures.c1.id.to_string())
		.body(axum::body::Body::empty())
		.unwrap();
	let response = app.send(request).await;
	assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_endpoint_without_rules_denies_everyone() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let path = format!("/sector/{}/locked", f.sector);

	for user in [&f.employee_x, &f.employee_y, &f.superadmin] {
		let response = app.get(&path, Some(user), Some(&f.c1.id)).await;
		assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} was let through", user.token);
		assert_eq!(body_json(response).await["error"], "unauthorized");
	}

	// The same row through the ruled endpoint is readable.
	let response = app
		.get(&format!("/sector/{}", f.sector), Some(&f.employee_x), Some(&f.c1.id))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_first_declared_reference_selects_the_row() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	// `id` from the query is declared before `id` from the path.
	let response = app
		.get(
			&format!("/sector/does-not-exist?id={}", f.sector),
			Some(&f.employee_x),
			Some(&f.c1.id),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	let body = body_json(response).await;
	assert_eq!(body["resource"], "sector");
	assert_eq!(body["attributes"]["id"], json!(f.sector));

	let response = app
		.get(
			&format!("/sector/{}?id=does-not-exist", f.sector),
			Some(&f.employee_x),
			Some(&f.c1.id),
		)
		.await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(body_json(response).await["error"], "resource_not_found");
}

#[tokio::test]
async fn test_show_resource_returns_hydrated_row() {
	let app = TestApp::new().await;
	let f = &app.fixtures;

	let response = app
		.get(&format!("/employee/{}", f.employee_x.id), Some(&f.employee_y), Some(&f.c1.id))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	let body = body_json(response).await;
	assert_eq!(body["resource"], "employee");
	assert_eq!(body["attributes"]["name"], "Xavier");
	assert_eq!(body["attributes"]["company_id"], json!(f.c1.id.to_string()));
}

#[tokio::test]
async fn test_health_is_public_and_reports_snapshot() {
	let app = TestApp::new().await;

	let response = app.get("/health", None, None).await;
	assert_eq!(response.status(), StatusCode::OK);
	let body = body_json(response).await;
	assert_eq!(body["status"], "ok");
	assert_eq!(body["endpoints"], 13);
	assert_eq!(body["unreachable_endpoints"], 1);
}

#[tokio::test]
async fn test_reload_updates_rules_of_existing_routes() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let path = format!("/sector/{}/locked", f.sector);

	let snapshot = app.state.snapshot.load();
	let locked = snapshot
		.endpoints()
		.find(&Method::GET, "/sector/{id}/locked")
		.unwrap()
		.clone();
	drop(snapshot);

	let rule = agenda_server_authz::PolicyRule::new(
		locked.id,
		"superadmin only",
		agenda_server_authz::policies::has_role("superadmin"),
	);
	agenda_server_db::PolicyRepository::new(app.state.pool.clone())
		.create_policy_rule(&rule)
		.await
		.unwrap();

	// Nothing changes until the snapshot is rebuilt.
	let response = app.get(&path, Some(&f.superadmin), Some(&f.c1.id)).await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	agenda_server_db::reload(&app.state.pool, &app.state.snapshot)
		.await
		.unwrap();

	let response = app.get(&path, Some(&f.superadmin), Some(&f.c1.id)).await;
	assert_eq!(response.status(), StatusCode::OK);
	let response = app.get(&path, Some(&f.employee_x), Some(&f.c1.id)).await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
