// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The standard resource catalog, built-in endpoints and their rules.
//!
//! Seeding is idempotent: resources are upserted, endpoints are only inserted
//! when their route is free, and rules are only attached to endpoints this
//! run inserted.

use agenda_server_authz::{ConditionNode, Endpoint, PolicyRule, RequestLocation, Resource};
use http::Method;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

pub use agenda_server_authz::policies;

use crate::endpoint::EndpointRepository;
use crate::error::DbError;
use crate::policy::PolicyRepository;
use crate::resource::ResourceRepository;

/// `(name, table, tenant-scoped)` for every standard resource.
const CATALOG: &[(&str, &str, bool)] = &[
	("appointment", "appointments", true),
	("branch", "branches", true),
	("client", "clients", false),
	("company", "companies", false),
	("employee", "employees", true),
	("holiday", "holidays", true),
	("role", "roles", true),
	("sector", "sectors", true),
	("service", "services", true),
];

/// Role allowed to use the access-check endpoints.
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// The standard resources with their references in lookup order.
pub fn standard_resources() -> Vec<Resource> {
	CATALOG
		.iter()
		.map(|(name, table, _)| {
			let key = format!("{name}_id");
			let mut resource = Resource::new(*name, *table)
				.reference("id", "id", RequestLocation::Query)
				.reference("id", "id", RequestLocation::Path)
				.reference("id", key.clone(), RequestLocation::Path)
				.reference("id", key.clone(), RequestLocation::Query)
				.reference("id", key, RequestLocation::Body);
			if matches!(*name, "client" | "employee") {
				resource = resource.reference("email", "email", RequestLocation::Path);
			}
			resource
		})
		.collect()
}

/// Built-in endpoints paired with the rules that guard them.
pub fn standard_endpoints() -> Vec<(Endpoint, Vec<(&'static str, ConditionNode)>)> {
	let superadmin = policies::has_role(SUPERADMIN_ROLE);

	let mut endpoints = vec![
		(
			Endpoint::new(Method::GET, "/health", "Health").with_description("liveness probe"),
			Vec::new(),
		),
		(
			Endpoint::new(Method::POST, "/authz/check", "CheckAccess")
				.gated()
				.with_description("evaluate a hypothetical request"),
			vec![("superadmin", superadmin.clone())],
		),
		(
			Endpoint::new(Method::POST, "/authz/policies/{id}/evaluate", "EvaluatePolicy")
				.gated()
				.with_description("evaluate one policy rule"),
			vec![("superadmin", superadmin)],
		),
	];

	for (name, _, tenant) in CATALOG {
		let mut endpoint = Endpoint::new(Method::GET, &format!("/{name}/{{id}}"), "ShowResource")
			.with_resource(*name)
			.gated()
			.with_description(format!("show one {name}"));
		if *tenant {
			endpoint = endpoint.tenant_scoped();
		}
		endpoints.push((endpoint, resource_rules(name)));
	}
	endpoints
}

fn resource_rules(name: &str) -> Vec<(&'static str, ConditionNode)> {
	match name {
		"client" => vec![("client self access", policies::client_self_check())],
		"company" => vec![("own company", policies::own_company_check())],
		"employee" => vec![(
			"employee self or company member",
			ConditionNode::or(vec![
				policies::employee_self_check(),
				policies::company_internal_user_check(),
			]),
		)],
		"branch" => vec![
			("company member", policies::company_internal_user_check()),
			("assigned to branch", policies::branch_assignment_check()),
		],
		_ => vec![("company member", policies::company_internal_user_check())],
	}
}

/// Counts of what a seeding run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
	pub resources: usize,
	pub endpoints: usize,
	pub policies: usize,
}

/// Write the standard catalog.
#[tracing::instrument(skip(pool))]
pub async fn seed_catalog(pool: &SqlitePool) -> Result<SeedReport, DbError> {
	let resources = ResourceRepository::new(pool.clone());
	let endpoints = EndpointRepository::new(pool.clone());
	let policies = PolicyRepository::new(pool.clone());
	let mut report = SeedReport::default();

	for resource in standard_resources() {
		resources.upsert_resource(&resource).await?;
		report.resources += 1;
	}

	for (endpoint, rules) in standard_endpoints() {
		if !endpoints.create_endpoint(&endpoint).await? {
			tracing::debug!(method = %endpoint.method, path = %endpoint.path, "endpoint already present");
			continue;
		}
		report.endpoints += 1;
		for (name, conditions) in rules {
			policies
				.create_policy_rule(&PolicyRule::new(endpoint.id, name, conditions))
				.await?;
			report.policies += 1;
		}
	}

	tracing::info!(
		resources = report.resources,
		endpoints = report.endpoints,
		policies = report.policies,
		"catalog seeded"
	);
	Ok(report)
}
