// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization gate: the one place a request is allowed or denied.
//!
//! ```text
//! ungated endpoint ----------------------------------------------> Allow(Ungated)
//! gated endpoint -> resolve subject -> hydrate resource -> rules -> Allow(Rule) | Deny(kind)
//!                        |                  |                 |
//!                NoToken/InvalidToken   ResourceNotFound   Unauthorized
//!                                       HydrationAborted
//! ```
//!
//! The tenant session must already be open: hydration reads through it and
//! nothing else.

use std::time::Duration;

use agenda_server_authz::{
	assess, decide, AllowReason, AttributeContext, AttributeMap, AuthzError, AuthzSnapshot, Decision,
	Endpoint, RequestAttributes, Resource, Subject, SubjectResolver,
};
use agenda_server_db::{hydrate, DbError, TenantSession};
use axum::http::HeaderMap;
use tracing::Level;

/// What the controller gets from an allowed request.
#[derive(Debug, Clone)]
pub struct Grant {
	pub reason: AllowReason,
	/// `None` on ungated endpoints, which never resolve credentials.
	pub subject: Option<Subject>,
	/// The hydrated `resource.*` map, when the gate read one.
	pub resource: Option<AttributeMap>,
}

pub struct AuthorizationGate<'a> {
	snapshot: &'a AuthzSnapshot,
	subjects: &'a dyn SubjectResolver,
	hydration_timeout: Duration,
}

impl<'a> AuthorizationGate<'a> {
	pub fn new(snapshot: &'a AuthzSnapshot, subjects: &'a dyn SubjectResolver, hydration_timeout: Duration) -> Self {
		Self {
			snapshot,
			subjects,
			hydration_timeout,
		}
	}

	#[tracing::instrument(
		skip(self, session, headers, request),
		fields(endpoint_id = %endpoint.id, schema = session.namespace().schema())
	)]
	pub async fn authorize(
		&self,
		endpoint: &Endpoint,
		session: &TenantSession,
		headers: &HeaderMap,
		request: &RequestAttributes,
	) -> Result<Grant, AuthzError> {
		if !endpoint.deny_if_unauthorized {
			return Ok(Grant {
				reason: AllowReason::Ungated,
				subject: None,
				resource: None,
			});
		}

		let subject = match self.subjects.resolve(headers).await {
			Ok(Some(subject)) => subject,
			Ok(None) => return Err(self.denied(endpoint, None, AuthzError::NoToken)),
			Err(kind) => return Err(self.denied(endpoint, None, kind)),
		};

		let resource = match &endpoint.resource {
			Some(name) => {
				let Some(resource) = self.snapshot.resource_for(endpoint) else {
					tracing::error!(resource = %name, "endpoint resource missing from snapshot");
					return Err(AuthzError::Internal);
				};
				self
					.hydrate(session, resource, request)
					.await
					.map_err(|kind| self.denied(endpoint, Some(&subject), kind))?
			}
			None => AttributeMap::new(),
		};

		let ctx = AttributeContext::build(Some(&subject), resource.clone(), request);
		let rules = self.snapshot.policies().rules_for(endpoint.id);

		match decide(rules, &ctx) {
			Decision::Allow(reason) => {
				tracing::debug!(subject_id = %subject.id, ?reason, "request allowed");
				Ok(Grant {
					reason,
					subject: Some(subject),
					resource: endpoint.resource.as_ref().map(|_| resource),
				})
			}
			Decision::Deny(kind) => {
				if tracing::enabled!(Level::DEBUG) {
					for line in assess(rules, &ctx).trace {
						tracing::debug!(subject_id = %subject.id, "{line}");
					}
				}
				Err(self.denied(endpoint, Some(&subject), kind))
			}
		}
	}

	async fn hydrate(
		&self,
		session: &TenantSession,
		resource: &Resource,
		request: &RequestAttributes,
	) -> Result<AttributeMap, AuthzError> {
		match tokio::time::timeout(self.hydration_timeout, hydrate(session, resource, request)).await {
			Ok(Ok(attrs)) => Ok(attrs),
			Ok(Err(DbError::NotFound(what))) => {
				tracing::debug!(resource = %resource.name, %what, "resource not found");
				Err(AuthzError::ResourceNotFound)
			}
			Ok(Err(e)) => {
				tracing::warn!(resource = %resource.name, error = %e, "resource hydration failed");
				Err(AuthzError::HydrationAborted)
			}
			Err(_) => {
				tracing::warn!(
					resource = %resource.name,
					timeout_ms = self.hydration_timeout.as_millis() as u64,
					"resource hydration timed out"
				);
				Err(AuthzError::HydrationAborted)
			}
		}
	}

	fn denied(&self, endpoint: &Endpoint, subject: Option<&Subject>, kind: AuthzError) -> AuthzError {
		tracing::info!(
			endpoint_id = %endpoint.id,
			method = %endpoint.method,
			path = %endpoint.path,
			subject_id = %subject.map(|s| s.id.to_string()).unwrap_or_default(),
			deny = kind.code(),
			"request denied"
		);
		kind
	}
}
