// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Immutable authorization snapshot and its swappable handle.
//!
//! A request loads the current [`AuthzSnapshot`] once and keeps that `Arc`
//! for its whole lifetime, so a concurrent reload never changes the rules a
//! request is half-way through evaluating.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::endpoint::{Endpoint, EndpointRegistry};
use crate::error::Result;
use crate::policy::{PolicyIndex, PolicyRule};
use crate::resource::{Resource, ResourceRegistry};

/// Resources, endpoints and policy rules validated as one unit.
#[derive(Debug, Clone, Default)]
pub struct AuthzSnapshot {
	resources: ResourceRegistry,
	endpoints: EndpointRegistry,
	policies: PolicyIndex,
}

impl AuthzSnapshot {
	/// Build and cross-validate a snapshot from persisted records.
	pub fn build(
		resources: impl IntoIterator<Item = Resource>,
		endpoints: impl IntoIterator<Item = Endpoint>,
		rules: impl IntoIterator<Item = PolicyRule>,
	) -> Result<Self> {
		let resources = ResourceRegistry::new(resources)?;
		let endpoints = EndpointRegistry::load(endpoints, &resources)?;
		let policies = PolicyIndex::new(rules, &endpoints)?;
		Ok(Self {
			resources,
			endpoints,
			policies,
		})
	}

	pub fn resources(&self) -> &ResourceRegistry {
		&self.resources
	}

	pub fn endpoints(&self) -> &EndpointRegistry {
		&self.endpoints
	}

	pub fn policies(&self) -> &PolicyIndex {
		&self.policies
	}

	/// The resource an endpoint hydrates, if it declares one.
	pub fn resource_for(&self, endpoint: &Endpoint) -> Option<&Arc<Resource>> {
		endpoint
			.resource
			.as_deref()
			.and_then(|name| self.resources.get(name))
	}

	/// Gated endpoints that no rule can ever allow.
	pub fn unreachable_endpoints(&self) -> Vec<&Arc<Endpoint>> {
		self.endpoints
			.iter()
			.filter(|e| e.deny_if_unauthorized && self.policies.rules_for(e.id).is_empty())
			.collect()
	}
}

/// Shared, atomically replaceable pointer to the current snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
	current: Arc<ArcSwap<AuthzSnapshot>>,
}

impl SnapshotHandle {
	pub fn new(snapshot: AuthzSnapshot) -> Self {
		Self {
			current: Arc::new(ArcSwap::from_pointee(snapshot)),
		}
	}

	/// The snapshot to use for one request.
	pub fn load(&self) -> Arc<AuthzSnapshot> {
		self.current.load_full()
	}

	/// Replace the snapshot; in-flight requests keep the one they loaded.
	pub fn swap(&self, snapshot: AuthzSnapshot) -> Arc<AuthzSnapshot> {
		self.current.swap(Arc::new(snapshot))
	}
}
