// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Agenda request authorization server.
//!
//! Routes are built at startup from the persisted endpoint registry. Every
//! route runs the same chain before its controller:
//!
//! ```text
//! tenant session -> authorization gate -> schema switch -> controller
//! ```
//!
//! Controllers are looked up by name in a [`ControllerRegistry`]; rules and
//! endpoint flags come from the [`SnapshotHandle`](agenda_server_authz::SnapshotHandle)
//! held in [`AppState`], which can be swapped without a restart.

pub mod api;
pub mod api_docs;
pub mod controllers;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod version;

pub use api::create_router;
pub use api_docs::ApiDoc;
pub use controllers::ControllerRegistry;
pub use error::{ApiError, ServerError};
pub use gate::{AuthorizationGate, Grant};
pub use middleware::{RequestScope, RouteGuard};
pub use state::{create_app_state, AppState, RequestLocale};
