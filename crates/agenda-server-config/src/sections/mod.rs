// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod auth;
mod authz;
mod database;
mod http;
mod logging;
mod tenancy;

pub use auth::{AuthConfig, AuthConfigLayer, StaticSubjectConfig, StaticTokenConfig};
pub use authz::{AuthzConfig, AuthzConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use tenancy::{TenancyConfig, TenancyConfigLayer};
