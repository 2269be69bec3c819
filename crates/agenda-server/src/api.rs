// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route table construction from persisted endpoints.

use agenda_server_authz::ConfigurationError;
use axum::{
	http::{Method, Uri},
	middleware::from_fn_with_state,
	Router,
};

use crate::controllers::ControllerRegistry;
use crate::error::{ApiError, ServerError};
use crate::middleware::{authorize, schema_switch, tenant_session, RouteGuard};
use crate::state::{AppState, RequestLocale};

/// Build the router for every endpoint in the current snapshot.
///
/// Each route runs `tenant_session`, then `authorize`, then `schema_switch`
/// before its controller. An endpoint naming an unregistered controller
/// fails construction, so the server never starts with a partial table.
pub fn create_router(state: AppState, controllers: &ControllerRegistry) -> Result<Router, ConfigurationError> {
	let snapshot = state.snapshot.load();
	let mut router = Router::new();

	for endpoint in snapshot.endpoints().iter() {
		let guard = RouteGuard::new(state.clone(), endpoint.id);
		// Layers wrap outward: the last one added runs first.
		let method_router = controllers
			.resolve(endpoint)?
			.layer(from_fn_with_state(guard.clone(), schema_switch))
			.layer(from_fn_with_state(guard.clone(), authorize))
			.layer(from_fn_with_state(guard, tenant_session));

		tracing::debug!(
			method = %endpoint.method,
			path = %endpoint.path,
			controller = %endpoint.controller_name,
			gated = endpoint.deny_if_unauthorized,
			tenant = endpoint.needs_tenant,
			"route registered"
		);
		router = router.route(&endpoint.path, method_router);
	}

	tracing::info!(routes = snapshot.endpoints().len(), "route table built");
	Ok(router.fallback(endpoint_not_found).with_state(state))
}

async fn endpoint_not_found(RequestLocale(locale): RequestLocale, method: Method, uri: Uri) -> ApiError {
	ServerError::EndpointNotFound {
		method: method.to_string(),
		path: uri.path().to_string(),
	}
	.localized(locale)
}
