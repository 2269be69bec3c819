// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The per-endpoint middleware chain.
//!
//! Every route built from the endpoint registry is wrapped, outermost first, in
//!
//! ```text
//! tenant_session -> authorize -> schema_switch -> controller
//! ```
//!
//! [`tenant_session`] pins the request to one snapshot and one storage
//! namespace, [`authorize`] runs the [`AuthorizationGate`] and
//! [`schema_switch`] confirms the namespace the controller is about to use.
//! Any failure short-circuits with a localized error before the controller
//! runs.

use std::collections::HashMap;
use std::sync::Arc;

use agenda_server_authz::{
	AttributeMap, AuthzError, AuthzSnapshot, Endpoint, EndpointId, RequestAttributes,
};
use agenda_server_db::{Namespace, TenantSession};
use axum::{
	body::{to_bytes, Body},
	extract::{Query, Request, State},
	http::{HeaderMap, Uri},
	middleware::Next,
	response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::ServerError;
use crate::gate::AuthorizationGate;
use crate::state::AppState;

/// State of one route's middleware: the app plus the endpoint it serves.
#[derive(Clone)]
pub struct RouteGuard {
	pub state: AppState,
	pub endpoint_id: EndpointId,
}

impl RouteGuard {
	pub fn new(state: AppState, endpoint_id: EndpointId) -> Self {
		Self { state, endpoint_id }
	}
}

/// The snapshot and endpoint a request was admitted under.
///
/// Loaded once by [`tenant_session`]; later stages and the controller read
/// this instead of the live handle so a concurrent reload cannot change the
/// rules halfway through a request.
#[derive(Debug, Clone)]
pub struct RequestScope {
	pub snapshot: Arc<AuthzSnapshot>,
	pub endpoint: Arc<Endpoint>,
}

fn reject(locale: &'static str, error: impl Into<ServerError>) -> Response {
	error.into().localized(locale).into_response()
}

fn tenant_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AuthzError> {
	headers
		.get(name)
		.map(|value| value.to_str().map_err(|_| AuthzError::TenantHeaderInvalid))
		.transpose()
}

/// Open the request's tenant or public session.
pub async fn tenant_session(State(guard): State<RouteGuard>, mut request: Request, next: Next) -> Response {
	let state = &guard.state;
	let locale = state.locale_for(request.headers());
	let snapshot = state.snapshot.load();

	let Some(endpoint) = snapshot.endpoints().get(guard.endpoint_id).cloned() else {
		tracing::warn!(endpoint_id = %guard.endpoint_id, "route outlived its endpoint record");
		return reject(
			locale,
			ServerError::EndpointNotFound {
				method: request.method().to_string(),
				path: request.uri().path().to_string(),
			},
		);
	};

	let header = if endpoint.needs_tenant {
		match tenant_header(request.headers(), &state.config.tenancy.header) {
			Ok(header) => header,
			Err(kind) => return reject(locale, kind),
		}
	} else {
		None
	};

	let session = match state.tenants.open(endpoint.needs_tenant, header).await {
		Ok(session) => session,
		Err(err) => {
			tracing::info!(endpoint_id = %endpoint.id, error = %err, "tenant session rejected");
			return reject(locale, AuthzError::from(err));
		}
	};

	request.extensions_mut().insert(RequestScope { snapshot, endpoint });
	request.extensions_mut().insert(session);
	next.run(request).await
}

/// Run the authorization gate for the request's endpoint.
pub async fn authorize(State(guard): State<RouteGuard>, request: Request, next: Next) -> Response {
	let state = &guard.state;
	let locale = state.locale_for(request.headers());

	let scope = request.extensions().get::<RequestScope>().cloned();
	let session = request.extensions().get::<TenantSession>().cloned();
	let (Some(scope), Some(session)) = (scope, session) else {
		return reject(locale, ServerError::Internal("authorization ran without a tenant session".to_string()));
	};
	let endpoint = &scope.endpoint;

	// Ungated routes never look at parameters, so their bodies stay streamed.
	let (mut request, attributes) = if endpoint.deny_if_unauthorized {
		match buffer_request(request, endpoint, state.config.authz.max_body_bytes).await {
			Ok(buffered) => buffered,
			Err(kind) => return reject(locale, kind),
		}
	} else {
		(request, RequestAttributes::default())
	};

	let gate = AuthorizationGate::new(
		&scope.snapshot,
		state.subjects.as_ref(),
		state.config.authz.hydration_timeout,
	);
	match gate.authorize(endpoint, &session, request.headers(), &attributes).await {
		Ok(grant) => {
			request.extensions_mut().insert(grant);
			next.run(request).await
		}
		Err(kind) => reject(locale, kind),
	}
}

/// Confirm the session namespace matches what the endpoint declares.
pub async fn schema_switch(State(guard): State<RouteGuard>, request: Request, next: Next) -> Response {
	let locale = guard.state.locale_for(request.headers());

	let confirmed = {
		let scope = request.extensions().get::<RequestScope>();
		let session = request.extensions().get::<TenantSession>();
		match (scope, session) {
			(Some(scope), Some(session)) => {
				let matches = match session.namespace() {
					Namespace::Public => !scope.endpoint.needs_tenant,
					Namespace::Tenant { .. } => scope.endpoint.needs_tenant,
				};
				matches.then(|| session.namespace().schema().to_string())
			}
			_ => None,
		}
	};

	let Some(schema) = confirmed else {
		return reject(
			locale,
			ServerError::Internal(format!("namespace mismatch for endpoint {}", guard.endpoint_id)),
		);
	};

	tracing::debug!(endpoint_id = %guard.endpoint_id, schema = %schema, "schema confirmed");
	next.run(request).await
}

async fn buffer_request(
	request: Request,
	endpoint: &Endpoint,
	limit: usize,
) -> Result<(Request, RequestAttributes), AuthzError> {
	let (parts, body) = request.into_parts();
	let bytes = to_bytes(body, limit).await.map_err(|_| AuthzError::InvalidBody)?;
	let attributes = request_attributes(endpoint, &parts.uri, &bytes)?;
	Ok((Request::from_parts(parts, Body::from(bytes)), attributes))
}

/// The `path.*`, `query.*` and `body.*` namespaces of a request.
///
/// Query values are always strings. A body that is empty or not a JSON
/// object contributes nothing; a body that is not JSON at all is rejected.
pub fn request_attributes(endpoint: &Endpoint, uri: &Uri, body: &[u8]) -> Result<RequestAttributes, AuthzError> {
	let path = endpoint.match_path(uri.path())?.unwrap_or_default();

	let Query(query) =
		Query::<HashMap<String, String>>::try_from_uri(uri).map_err(|_| AuthzError::InvalidBody)?;
	let query: AttributeMap = query.into_iter().map(|(k, v)| (k, Value::String(v))).collect();

	Ok(RequestAttributes::new(path, query, parse_body(body)?))
}

fn parse_body(bytes: &[u8]) -> Result<AttributeMap, AuthzError> {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(AttributeMap::new());
	}
	match serde_json::from_slice::<Value>(bytes) {
		Ok(Value::Object(map)) => Ok(map),
		Ok(_) => Ok(AttributeMap::new()),
		Err(_) => Err(AuthzError::InvalidBody),
	}
}
