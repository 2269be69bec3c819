// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The name to handler table that persisted endpoints refer to.
//!
//! Controllers are registered once while the server is assembled and the
//! table is read-only afterwards. An endpoint whose `controller_name` is not
//! in the table stops route construction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use agenda_server_authz::{ConfigurationError, Endpoint};
use axum::{
	handler::Handler,
	routing::{on, MethodFilter, MethodRouter},
};

use crate::routes;
use crate::state::AppState;

type RouteFactory = Arc<dyn Fn(MethodFilter) -> MethodRouter<AppState> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ControllerRegistry {
	controllers: BTreeMap<String, RouteFactory>,
}

impl ControllerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The built-in controllers.
	pub fn standard() -> Self {
		let mut registry = Self::new();
		registry
			.register("Health", routes::health::health_check)
			.register("CheckAccess", routes::authz::check_access)
			.register("EvaluatePolicy", routes::authz::evaluate_policy)
			.register("ShowResource", routes::resources::show_resource);
		registry
	}

	/// Register `handler` under `name`, replacing any previous entry.
	pub fn register<H, T>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
	where
		H: Handler<T, AppState>,
		T: 'static,
	{
		let factory: RouteFactory = Arc::new(move |filter| on(filter, handler.clone()));
		self.controllers.insert(name.into(), factory);
		self
	}

	pub fn contains(&self, name: &str) -> bool {
		self.controllers.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.controllers.keys().map(String::as_str)
	}

	/// The method router serving `endpoint`.
	pub fn resolve(&self, endpoint: &Endpoint) -> Result<MethodRouter<AppState>, ConfigurationError> {
		let factory = self
			.controllers
			.get(&endpoint.controller_name)
			.ok_or_else(|| ConfigurationError::ControllerNotFound {
				endpoint: endpoint.id,
				method: endpoint.method.to_string(),
				path: endpoint.path.clone(),
				controller: endpoint.controller_name.clone(),
			})?;
		let filter =
			MethodFilter::try_from(endpoint.method.clone()).map_err(|_| ConfigurationError::InvalidValue {
				kind: "endpoint method",
				value: endpoint.method.to_string(),
			})?;
		Ok(factory(filter))
	}
}

impl fmt::Debug for ControllerRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}
