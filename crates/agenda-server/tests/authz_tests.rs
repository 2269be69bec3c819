// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization tests entry point.
//!
//! This module re-exports all authz tests as a single integration test file.

mod authz;
