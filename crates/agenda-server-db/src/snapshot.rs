// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Building authorization snapshots from the persisted catalog.

use std::time::Duration;

use agenda_server_authz::{AuthzSnapshot, SnapshotHandle};
use sqlx::sqlite::SqlitePool;

use crate::endpoint::EndpointRepository;
use crate::error::DbError;
use crate::policy::PolicyRepository;
use crate::resource::ResourceRepository;

/// Read resources, endpoints and rules and validate them as one snapshot.
#[tracing::instrument(skip(pool))]
pub async fn load_snapshot(pool: &SqlitePool) -> Result<AuthzSnapshot, DbError> {
	let resources = ResourceRepository::new(pool.clone()).list_resources().await?;
	let endpoints = EndpointRepository::new(pool.clone()).list_endpoints().await?;
	let rules = PolicyRepository::new(pool.clone()).list_policy_rules().await?;

	let snapshot = AuthzSnapshot::build(resources, endpoints, rules)?;
	tracing::debug!(
		resources = snapshot.resources().len(),
		endpoints = snapshot.endpoints().len(),
		policies = snapshot.policies().len(),
		"authorization snapshot loaded"
	);
	Ok(snapshot)
}

/// [`load_snapshot`], retried while storage is unavailable.
///
/// Makes at most `attempts` tries spaced by `delay`. Catalog validation
/// errors are returned immediately.
#[tracing::instrument(skip(pool))]
pub async fn load_snapshot_with_retry(
	pool: &SqlitePool,
	attempts: u32,
	delay: Duration,
) -> Result<AuthzSnapshot, DbError> {
	let attempts = attempts.max(1);
	let mut attempt = 1;
	loop {
		match load_snapshot(pool).await {
			Ok(snapshot) => return Ok(snapshot),
			Err(e) if e.is_retryable() && attempt < attempts => {
				tracing::warn!(attempt, attempts, error = %e, "authorization catalog not readable, retrying");
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
			Err(e) => return Err(e),
		}
	}
}

/// Rebuild the snapshot and swap it in. On failure the current one stays.
#[tracing::instrument(skip(pool, handle))]
pub async fn reload(pool: &SqlitePool, handle: &SnapshotHandle) -> Result<(), DbError> {
	let snapshot = load_snapshot(pool).await?;
	handle.swap(snapshot);
	tracing::info!("authorization snapshot reloaded");
	Ok(())
}
