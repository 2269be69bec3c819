// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read access to the resource an endpoint is bound to.

use agenda_server_api::{ErrorResponse, ShowResourceResponse};
use agenda_server_authz::AuthzError;
use agenda_server_db::{hydrate, DbError, TenantSession};
use axum::{http::Uri, Extension, Json};

use crate::error::{ApiError, ServerError};
use crate::gate::Grant;
use crate::middleware::{request_attributes, RequestScope};
use crate::state::RequestLocale;

#[utoipa::path(
    get,
    path = "/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "Resource name, e.g. employee"),
        ("id" = String, Path, description = "Resource id")
    ),
    responses(
        (status = 200, description = "Hydrated resource attributes", body = ShowResourceResponse),
        (status = 400, description = "Tenant header missing or malformed", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "No policy rule allows the request", body = ErrorResponse),
        (status = 404, description = "Tenant or resource not found", body = ErrorResponse),
        (status = 503, description = "Authorization could not complete", body = ErrorResponse)
    ),
    tag = "resources"
)]
/// GET /{resource}/{id} - The `resource.*` map the request resolved to.
///
/// Reuses the gate's hydration when there was one; ungated endpoints hydrate
/// here, through the same tenant session.
pub async fn show_resource(
	Extension(scope): Extension<RequestScope>,
	Extension(session): Extension<TenantSession>,
	Extension(grant): Extension<Grant>,
	RequestLocale(locale): RequestLocale,
	uri: Uri,
) -> Result<Json<ShowResourceResponse>, ApiError> {
	let endpoint = &scope.endpoint;
	let Some(resource) = scope.snapshot.resource_for(endpoint) else {
		return Err(ServerError::ResourceNotConfigured.localized(locale));
	};

	let attributes = match grant.resource {
		Some(attributes) => attributes,
		None => {
			let request =
				request_attributes(endpoint, &uri, &[]).map_err(|kind| ServerError::from(kind).localized(locale))?;
			hydrate(&session, resource, &request).await.map_err(|err| {
				let kind = match err {
					DbError::NotFound(_) => AuthzError::ResourceNotFound,
					other => {
						tracing::warn!(resource = %resource.name, error = %other, "resource read failed");
						AuthzError::HydrationAborted
					}
				};
				ServerError::from(kind).localized(locale)
			})?
		}
	};

	Ok(Json(ShowResourceResponse {
		resource: resource.name.clone(),
		attributes,
	}))
}
