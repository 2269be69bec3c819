// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for the built-in controllers, generated with utoipa.
//!
//! Only controllers are documented here. Which of them are actually routed,
//! and where, is decided by the persisted endpoint records.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agenda Server API",
        version = "1.0.0",
        description = "Request authorization for the Agenda scheduling backend: data-driven endpoints, attribute-based policies and per-company storage isolation.",
        license(name = "Proprietary")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Liveness and snapshot summary"),
        (name = "authz", description = "Access checks and policy evaluation"),
        (name = "resources", description = "Reads of policy-guarded resources")
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::authz::check_access,
        crate::routes::authz::evaluate_policy,
        crate::routes::resources::show_resource,
    ),
    components(
        schemas(
            agenda_server_api::ErrorResponse,
            agenda_server_api::HealthResponse,
            agenda_server_api::SubjectPayload,
            agenda_server_api::CheckAccessRequest,
            agenda_server_api::CheckAccessResponse,
            agenda_server_api::EvaluatePolicyRequest,
            agenda_server_api::EvaluatePolicyResponse,
            agenda_server_api::ShowResourceResponse,
        )
    )
)]
pub struct ApiDoc;
