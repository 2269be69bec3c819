// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite storage for the Agenda server.
//!
//! Holds the authorization catalog (resources, endpoints, policy rules), the
//! company registry, per-request tenant sessions and resource hydration.

pub mod company;
pub mod endpoint;
pub mod error;
pub mod hydrate;
pub mod policy;
pub mod pool;
pub mod resource;
pub mod seed;
pub mod snapshot;
pub mod tenant;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use company::{schema_name_for, Company, CompanyRepository};
pub use endpoint::EndpointRepository;
pub use error::{DbError, Result};
pub use hydrate::{hydrate, row_to_attributes};
pub use policy::PolicyRepository;
pub use pool::{create_pool, run_migrations};
pub use resource::ResourceRepository;
pub use seed::{seed_catalog, SeedReport};
pub use snapshot::{load_snapshot, load_snapshot_with_retry, reload};
pub use tenant::{provision_namespace, Namespace, TenantError, TenantSchemaGate, TenantSession};
