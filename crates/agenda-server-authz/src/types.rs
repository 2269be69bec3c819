// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identifier types.
//!
//! All ID types are UUID newtypes with transparent serde serialization
//! (as UUID strings) so an endpoint id can never be passed where a policy id
//! is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s.trim()).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(SubjectId, "Unique identifier for an authenticated subject.");
define_id_type!(CompanyId, "Unique identifier for a company (tenant).");
define_id_type!(BranchId, "Unique identifier for a company branch.");
define_id_type!(EndpointId, "Unique identifier for a persisted endpoint.");
define_id_type!(PolicyId, "Unique identifier for a persisted policy rule.");

// =============================================================================
// Storage identifiers
// =============================================================================

/// Whether `name` is safe to interpolate as a table, column or schema name.
///
/// Accepted names are lowercase ASCII, start with a letter and contain only
/// letters, digits and underscores. The double underscore is reserved as the
/// tenant namespace separator.
pub fn is_valid_identifier(name: &str) -> bool {
	let mut bytes = name.bytes();
	matches!(bytes.next(), Some(b'a'..=b'z'))
		&& name
			.bytes()
			.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
		&& !name.contains("__")
		&& name.len() <= 63
}
