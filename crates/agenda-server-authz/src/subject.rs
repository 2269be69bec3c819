// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authenticated subjects and the resolver seam that produces them.
//!
//! Credential verification lives outside this crate. The gate only sees a
//! [`SubjectResolver`], which turns request headers into either a
//! [`Subject`], "anonymous" (`Ok(None)`), or [`AuthzError::InvalidToken`].
//! [`StaticTokenResolver`] is the bundled implementation backed by a fixed
//! token table.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use async_trait::async_trait;
use http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use crate::context::AttributeMap;
use crate::error::AuthzError;
use crate::types::{BranchId, CompanyId, SubjectId};

/// Identity resolved from credentials, immutable for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
	pub id: SubjectId,
	/// `None` for subjects outside any tenant, e.g. clients.
	#[serde(default)]
	pub company_id: Option<CompanyId>,
	#[serde(default)]
	pub roles: BTreeSet<String>,
	#[serde(default)]
	pub branches: BTreeSet<BranchId>,
}

impl Subject {
	pub fn new(id: SubjectId) -> Self {
		Self {
			id,
			company_id: None,
			roles: BTreeSet::new(),
			branches: BTreeSet::new(),
		}
	}

	pub fn with_company(mut self, company_id: CompanyId) -> Self {
		self.company_id = Some(company_id);
		self
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.insert(role.into());
		self
	}

	pub fn with_branch(mut self, branch_id: BranchId) -> Self {
		self.branches.insert(branch_id);
		self
	}

	/// The `subject.*` attribute namespace.
	pub fn to_attributes(&self) -> AttributeMap {
		let mut attrs = AttributeMap::new();
		attrs.insert("id".to_string(), json!(self.id.to_string()));
		attrs.insert(
			"company_id".to_string(),
			self
				.company_id
				.map(|c| json!(c.to_string()))
				.unwrap_or(Value::Null),
		);
		attrs.insert(
			"roles".to_string(),
			Value::Array(self.roles.iter().map(|r| json!(r)).collect()),
		);
		attrs.insert(
			"branches".to_string(),
			Value::Array(self.branches.iter().map(|b| json!(b.to_string())).collect()),
		);
		attrs
	}
}

/// Produces the subject for a request.
#[async_trait]
pub trait SubjectResolver: Send + Sync {
	/// `Ok(None)` means no credentials were presented.
	async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Subject>, AuthzError>;
}

/// What the `Authorization` header carries.
#[derive(PartialEq, Eq)]
pub enum BearerToken<'a> {
	Missing,
	Present(&'a str),
	Malformed,
}

impl fmt::Debug for BearerToken<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BearerToken::Missing => f.write_str("Missing"),
			BearerToken::Present(_) => f.write_str("Present([REDACTED])"),
			BearerToken::Malformed => f.write_str("Malformed"),
		}
	}
}

/// Extract a bearer token from the `Authorization` header.
///
/// The scheme is matched case-insensitively. A header with another scheme,
/// non-ASCII bytes or an empty token is [`BearerToken::Malformed`].
#[instrument(level = "trace", skip_all)]
pub fn extract_bearer_token(headers: &HeaderMap) -> BearerToken<'_> {
	let Some(header) = headers.get(AUTHORIZATION) else {
		return BearerToken::Missing;
	};
	let Ok(value) = header.to_str() else {
		return BearerToken::Malformed;
	};

	match value.split_once(' ') {
		Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
			let token = token.trim();
			if token.is_empty() {
				BearerToken::Malformed
			} else {
				BearerToken::Present(token)
			}
		}
		_ => BearerToken::Malformed,
	}
}

/// Resolver backed by a fixed token table.
#[derive(Clone, Default)]
pub struct StaticTokenResolver {
	tokens: HashMap<String, Subject>,
}

impl StaticTokenResolver {
	pub fn new(tokens: impl IntoIterator<Item = (String, Subject)>) -> Self {
		Self {
			tokens: tokens.into_iter().collect(),
		}
	}

	pub fn insert(&mut self, token: impl Into<String>, subject: Subject) {
		self.tokens.insert(token.into(), subject);
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

impl fmt::Debug for StaticTokenResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StaticTokenResolver")
			.field("tokens", &self.tokens.len())
			.finish()
	}
}

#[async_trait]
impl SubjectResolver for StaticTokenResolver {
	async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Subject>, AuthzError> {
		match extract_bearer_token(headers) {
			BearerToken::Missing => Ok(None),
			BearerToken::Malformed => Err(AuthzError::InvalidToken),
			BearerToken::Present(token) => self
				.tokens
				.get(token)
				.cloned()
				.map(Some)
				.ok_or(AuthzError::InvalidToken),
		}
	}
}
