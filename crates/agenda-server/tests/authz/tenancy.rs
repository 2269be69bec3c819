// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use agenda_server_authz::CompanyId;
use axum::{
	body::Body,
	http::{header::ACCEPT_LANGUAGE, Method, Request, StatusCode},
};
use futures::future::join_all;

use super::support::{body_json, run_authz_cases, AuthzCase, TestApp, SHARED_BRANCH, TENANT_HEADER};

#[tokio::test]
async fn test_tenant_header_errors() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let path = format!("/employee/{}", f.employee_x.id);

	let cases = vec![
		AuthzCase {
			name: "missing_tenant_header",
			method: Method::GET,
			path: path.clone(),
			subject: Some(f.employee_x.clone()),
			tenant: None,
			body: None,
			expected_status: StatusCode::BAD_REQUEST,
		},
		AuthzCase {
			name: "unknown_tenant",
			method: Method::GET,
			path: path.clone(),
			subject: Some(f.employee_x.clone()),
			tenant: Some(CompanyId::generate()),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
		AuthzCase {
			name: "public_endpoint_ignores_missing_header",
			method: Method::GET,
			path: format!("/client/{}", f.client.id),
			subject: Some(f.client.clone()),
			tenant: None,
			body: None,
			expected_status: StatusCode::OK,
		},
	];
	run_authz_cases(&app, &cases).await;

	let request = Request::get(path.as_str())
		.header("authorization", f.employee_x.bearer())
		.header(TENANT_HEADER, "company-one")
		.body(Body::empty())
		.unwrap();
	let response = app.send(request).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "tenant_header_invalid");

	let response = app.get(&path, Some(&f.employee_x), Some(&CompanyId::generate())).await;
	assert_eq!(body_json(response).await["error"], "tenant_not_found");
}

#[tokio::test]
async fn test_missing_tenant_header_never_touches_storage() {
	let app = TestApp::new().await;
	let path = format!("/employee/{}", app.fixtures.employee_x.id);

	// Any storage read from here on would surface as 503.
	app.state.pool.close().await;

	let response = app.get(&path, Some(&app.fixtures.employee_x), None).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "tenant_header_missing");
}

#[tokio::test]
async fn test_storage_failure_fails_closed() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	app.state.pool.close().await;

	let response = app
		.get(&format!("/employee/{}", f.employee_x.id), Some(&f.employee_x), Some(&f.c1.id))
		.await;
	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(body_json(response).await["error"], "authorization_unavailable");

	let response = app
		.get(&format!("/client/{}", f.client.id), Some(&f.client), None)
		.await;
	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_same_local_id_resolves_per_tenant() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let path = format!("/branch/{SHARED_BRANCH}");

	let response = app.get(&path, Some(&f.employee_x), Some(&f.c1.id)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["attributes"]["name"], "C1 main");

	let response = app.get(&path, Some(&f.employee_z), Some(&f.c2.id)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["attributes"]["name"], "C2 main");

	// Pointing the header at another tenant reads that tenant's row, which
	// then fails the membership rule.
	let response = app.get(&path, Some(&f.employee_x), Some(&f.c2.id)).await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_tenant() {
	let app = TestApp::new().await;
	let f = &app.fixtures;
	let path = format!("/branch/{SHARED_BRANCH}");

	let requests = (0..32).map(|i| {
		let (user, tenant, expected) = if i % 2 == 0 {
			(&f.employee_x, &f.c1.id, "C1 main")
		} else {
			(&f.employee_z, &f.c2.id, "C2 main")
		};
		let app = &app;
		let path = path.as_str();
		async move {
			let response = app.get(path, Some(user), Some(tenant)).await;
			assert_eq!(response.status(), StatusCode::OK);
			let body = body_json(response).await;
			(expected, body["attributes"]["name"].as_str().unwrap_or_default().to_string())
		}
	});

	for (expected, observed) in join_all(requests).await {
		assert_eq!(observed, expected);
	}
}

#[tokio::test]
async fn test_errors_are_localized() {
	let app = TestApp::new().await;
	let path = format!("/employee/{}", app.fixtures.employee_x.id);

	let request = Request::get(path.as_str())
		.header("authorization", app.fixtures.employee_x.bearer())
		.header(ACCEPT_LANGUAGE, "pt-BR")
		.body(Body::empty())
		.unwrap();
	let response = app.send(request).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = body_json(response).await;
	assert_eq!(body["error"], "tenant_header_missing");
	assert_eq!(body["http_status"], 400);
	assert_eq!(body["message"], body["description_br"]);
	assert_ne!(body["description_en"], body["description_br"]);

	let response = app.get(&path, Some(&app.fixtures.employee_x), None).await;
	let body = body_json(response).await;
	assert_eq!(body["message"], body["description_en"]);
}
