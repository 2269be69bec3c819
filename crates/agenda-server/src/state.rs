// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared application state.

use std::sync::Arc;

use agenda_common_i18n::{locale_from_accept_language, resolve_locale};
use agenda_server_authz::{
	BranchId, CompanyId, ConfigurationError, SnapshotHandle, StaticTokenResolver, Subject,
	SubjectId, SubjectResolver,
};
use agenda_server_config::{AuthConfig, ServerConfig, StaticSubjectConfig};
use agenda_server_db::TenantSchemaGate;
use axum::{
	extract::FromRequestParts,
	http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap},
};
use sqlx::sqlite::SqlitePool;

/// Everything handlers and middleware share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub snapshot: SnapshotHandle,
	pub tenants: TenantSchemaGate,
	pub subjects: Arc<dyn SubjectResolver>,
	pub config: Arc<ServerConfig>,
}

impl AppState {
	/// Locale for a response, from `Accept-Language` or the configured default.
	pub fn locale_for(&self, headers: &HeaderMap) -> &'static str {
		let requested = headers
			.get(ACCEPT_LANGUAGE)
			.and_then(|v| v.to_str().ok())
			.and_then(locale_from_accept_language);
		resolve_locale(requested, &self.config.logging.locale)
	}
}

/// State wired with the bundled static token resolver.
pub fn create_app_state(
	pool: SqlitePool,
	snapshot: SnapshotHandle,
	config: ServerConfig,
) -> Result<AppState, ConfigurationError> {
	let subjects = static_resolver(&config.auth)?;
	Ok(AppState {
		tenants: TenantSchemaGate::new(pool.clone()),
		pool,
		snapshot,
		subjects: Arc::new(subjects),
		config: Arc::new(config),
	})
}

/// Build the token table from `[[auth.static_tokens]]`.
pub fn static_resolver(config: &AuthConfig) -> Result<StaticTokenResolver, ConfigurationError> {
	let tokens = config
		.static_tokens
		.iter()
		.map(|entry| Ok((entry.token.clone(), subject_from_config(&entry.subject)?)))
		.collect::<Result<Vec<_>, ConfigurationError>>()?;
	Ok(StaticTokenResolver::new(tokens))
}

fn subject_from_config(config: &StaticSubjectConfig) -> Result<Subject, ConfigurationError> {
	let id: SubjectId = parse_id("subject id", &config.id)?;
	let mut subject = Subject::new(id);
	if let Some(company_id) = &config.company_id {
		subject = subject.with_company(parse_id::<CompanyId>("company id", company_id)?);
	}
	for role in &config.roles {
		subject = subject.with_role(role.clone());
	}
	for branch in &config.branches {
		subject = subject.with_branch(parse_id::<BranchId>("branch id", branch)?);
	}
	Ok(subject)
}

fn parse_id<T: std::str::FromStr>(kind: &'static str, raw: &str) -> Result<T, ConfigurationError> {
	raw.parse().map_err(|_| ConfigurationError::InvalidValue {
		kind,
		value: raw.to_string(),
	})
}

/// Response locale of the current request.
#[derive(Debug, Clone, Copy)]
pub struct RequestLocale(pub &'static str);

impl FromRequestParts<AppState> for RequestLocale {
	type Rejection = std::convert::Infallible;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		Ok(RequestLocale(state.locale_for(&parts.headers)))
	}
}
