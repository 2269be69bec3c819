// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and response types for the Agenda server HTTP API.

pub mod authz;
pub mod error;
pub mod health;
pub mod resources;

pub use authz::{
	CheckAccessRequest, CheckAccessResponse, EvaluatePolicyRequest, EvaluatePolicyResponse,
	SubjectPayload,
};
pub use error::ErrorResponse;
pub use health::HealthResponse;
pub use resources::ShowResourceResponse;
