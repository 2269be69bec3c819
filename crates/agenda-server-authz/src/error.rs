// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for request authorization.
//!
//! [`AuthzError`] covers everything that can reject a single request; each
//! kind has a fixed HTTP status and a catalog key for its localized message.
//! [`ConfigurationError`] covers malformed persisted data and missing wiring
//! that must stop the process before it serves traffic.

use crate::types::{EndpointId, PolicyId};

/// Per-request rejection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AuthzError {
	#[error("tenant header missing")]
	TenantHeaderMissing,

	#[error("tenant header malformed")]
	TenantHeaderInvalid,

	#[error("tenant does not exist")]
	TenantNotFound,

	#[error("no bearer token")]
	NoToken,

	#[error("invalid bearer token")]
	InvalidToken,

	#[error("no policy rule allows this request")]
	Unauthorized,

	#[error("target resource not found")]
	ResourceNotFound,

	#[error("authorization could not complete")]
	HydrationAborted,

	#[error("request parameters or body unreadable")]
	InvalidBody,

	#[error("internal error")]
	Internal,
}

impl AuthzError {
	/// Stable machine-readable code.
	pub fn code(&self) -> &'static str {
		match self {
			AuthzError::TenantHeaderMissing => "tenant_header_missing",
			AuthzError::TenantHeaderInvalid => "tenant_header_invalid",
			AuthzError::TenantNotFound => "tenant_not_found",
			AuthzError::NoToken => "no_token",
			AuthzError::InvalidToken => "invalid_token",
			AuthzError::Unauthorized => "unauthorized",
			AuthzError::ResourceNotFound => "resource_not_found",
			AuthzError::HydrationAborted => "authorization_unavailable",
			AuthzError::InvalidBody => "invalid_body",
			AuthzError::Internal => "internal_error",
		}
	}

	/// HTTP status returned for this kind.
	pub fn http_status(&self) -> http::StatusCode {
		use http::StatusCode;

		match self {
			AuthzError::TenantHeaderMissing
			| AuthzError::TenantHeaderInvalid
			| AuthzError::InvalidBody => StatusCode::BAD_REQUEST,
			AuthzError::NoToken | AuthzError::InvalidToken => StatusCode::UNAUTHORIZED,
			AuthzError::Unauthorized => StatusCode::FORBIDDEN,
			AuthzError::TenantNotFound | AuthzError::ResourceNotFound => StatusCode::NOT_FOUND,
			AuthzError::HydrationAborted => StatusCode::SERVICE_UNAVAILABLE,
			AuthzError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Key into the i18n message catalog.
	pub fn message_key(&self) -> &'static str {
		match self {
			AuthzError::Internal => "server.api.internal_error",
			AuthzError::TenantHeaderMissing => "server.authz.tenant_header_missing",
			AuthzError::TenantHeaderInvalid => "server.authz.tenant_header_invalid",
			AuthzError::TenantNotFound => "server.authz.tenant_not_found",
			AuthzError::NoToken => "server.authz.no_token",
			AuthzError::InvalidToken => "server.authz.invalid_token",
			AuthzError::Unauthorized => "server.authz.unauthorized",
			AuthzError::ResourceNotFound => "server.authz.resource_not_found",
			AuthzError::HydrationAborted => "server.authz.authorization_unavailable",
			AuthzError::InvalidBody => "server.authz.invalid_body",
		}
	}
}

/// Startup-fatal problems in persisted configuration or controller wiring.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
	#[error("endpoint {endpoint} ({method} {path}) references unknown controller '{controller}'")]
	ControllerNotFound {
		endpoint: EndpointId,
		method: String,
		path: String,
		controller: String,
	},

	#[error("endpoint {endpoint} references unknown resource '{resource}'")]
	UnknownResource {
		endpoint: EndpointId,
		resource: String,
	},

	#[error("policy {policy} is bound to unknown endpoint {endpoint}")]
	UnknownEndpoint { policy: PolicyId, endpoint: EndpointId },

	#[error("duplicate route {method} {path}")]
	DuplicateRoute { method: String, path: String },

	#[error("route {path} conflicts with {existing}: parameter names differ at the same position")]
	RouteConflict { path: String, existing: String },

	#[error("duplicate {kind} '{name}'")]
	Duplicate { kind: &'static str, name: String },

	#[error("invalid condition at {location}: {message}")]
	InvalidCondition { location: String, message: String },

	#[error("invalid attribute path '{path}': {message}")]
	InvalidAttributePath { path: String, message: String },

	#[error("invalid {kind} '{value}'")]
	InvalidValue { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
