// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request authorization core for the Agenda server.
//!
//! This crate is pure: it holds the data model (subjects, resources,
//! endpoints, condition trees, policy rules), the attribute context, the
//! evaluator and the decision function. Storage access, tenant sessions and
//! HTTP wiring live in `agenda-server-db` and `agenda-server`.
//!
//! # Evaluation
//!
//! ```text
//! Subject + hydrated resource + path/query/body
//!        -> AttributeContext
//!        -> every PolicyRule bound to the endpoint (OR'd)
//!        -> Decision::Allow | Decision::Deny(kind)
//! ```
//!
//! Everything fails closed: a missing attribute, an empty combinator or an
//! endpoint without rules all lead to a denial.

pub mod attribute;
pub mod condition;
pub mod context;
pub mod decision;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod policies;
pub mod policy;
pub mod resource;
pub mod snapshot;
pub mod subject;
pub mod types;

pub use attribute::{AttributePath, AttributeRoot};
pub use condition::{Comparison, ConditionLeaf, ConditionNode, LogicType, Operand, Operator};
pub use context::{AttributeContext, AttributeMap, RequestAttributes};
pub use decision::{assess, decide, AllowReason, Assessment, Decision};
pub use endpoint::{normalize_path, Endpoint, EndpointRegistry};
pub use engine::{evaluate, explain, Explanation};
pub use error::{AuthzError, ConfigurationError, Result};
pub use policy::{Effect, PolicyIndex, PolicyRule};
pub use resource::{RequestLocation, Resource, ResourceLookup, ResourceReference, ResourceRegistry};
pub use snapshot::{AuthzSnapshot, SnapshotHandle};
pub use subject::{extract_bearer_token, BearerToken, StaticTokenResolver, Subject, SubjectResolver};
pub use types::{is_valid_identifier, BranchId, CompanyId, EndpointId, PolicyId, SubjectId};
