// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server errors and their localized HTTP payloads.

use agenda_common_i18n::{t, t_fmt};
use agenda_server_api::ErrorResponse;
use agenda_server_authz::AuthzError;
use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};

/// Everything a request can fail with after routing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Authz(#[from] AuthzError),

	#[error("no endpoint for {method} {path}")]
	EndpointNotFound { method: String, path: String },

	#[error("policy {0} not found")]
	PolicyNotFound(String),

	#[error("endpoint has no resource")]
	ResourceNotConfigured,

	#[error("internal error: {0}")]
	Internal(String),
}

impl ServerError {
	pub fn code(&self) -> &'static str {
		match self {
			ServerError::Authz(kind) => kind.code(),
			ServerError::EndpointNotFound { .. } => "endpoint_not_found",
			ServerError::PolicyNotFound(_) => "policy_not_found",
			ServerError::ResourceNotConfigured => "resource_not_configured",
			ServerError::Internal(_) => "internal_error",
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			ServerError::Authz(kind) => kind.http_status(),
			ServerError::EndpointNotFound { .. }
			| ServerError::PolicyNotFound(_)
			| ServerError::ResourceNotConfigured => StatusCode::NOT_FOUND,
			ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn message(&self, locale: &str) -> String {
		match self {
			ServerError::Authz(kind) => t(locale, kind.message_key()),
			ServerError::EndpointNotFound { method, path } => t_fmt(
				locale,
				"server.api.endpoint_not_found",
				&[("method", method.as_str()), ("path", path.as_str())],
			),
			ServerError::PolicyNotFound(id) => {
				t_fmt(locale, "server.api.policy_not_found", &[("id", id.as_str())])
			}
			ServerError::ResourceNotConfigured => t(locale, "server.api.resource_not_configured"),
			// Never echo the internal detail to the caller.
			ServerError::Internal(_) => t(locale, "server.api.internal_error"),
		}
	}

	/// The error body in `locale`, with both fixed-language descriptions.
	pub fn to_payload(&self, locale: &str) -> ErrorResponse {
		ErrorResponse {
			error: self.code().to_string(),
			message: self.message(locale),
			description_en: self.message("en"),
			description_br: self.message("pt-BR"),
			http_status: self.status().as_u16(),
		}
	}

	pub fn localized(self, locale: &'static str) -> ApiError {
		ApiError {
			error: self,
			locale,
		}
	}
}

/// A [`ServerError`] bound to the locale of the request that caused it.
#[derive(Debug)]
pub struct ApiError {
	pub error: ServerError,
	pub locale: &'static str,
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if let ServerError::Internal(detail) = &self.error {
			tracing::error!(error = %detail, "request failed with internal error");
		}
		(self.error.status(), Json(self.error.to_payload(self.locale))).into_response()
	}
}
