// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use agenda_server_api::HealthResponse;
use axum::{Extension, Json};

use crate::middleware::RequestScope;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Liveness plus the size of the loaded snapshot.
pub async fn health_check(Extension(scope): Extension<RequestScope>) -> Json<HealthResponse> {
	let snapshot = &scope.snapshot;
	Json(HealthResponse {
		status: "ok".to_string(),
		version: env!("CARGO_PKG_VERSION").to_string(),
		endpoints: snapshot.endpoints().len(),
		policies: snapshot.policies().len(),
		unreachable_endpoints: snapshot.unreachable_endpoints().len(),
	})
}
