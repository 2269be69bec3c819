// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Internationalization (i18n) support for Agenda.
//!
//! Server-side strings are looked up by a hierarchical dot-notation key and
//! rendered in one of the supported locales (`en`, `pt-BR`). Translations
//! live in gettext catalogs under `locales/<code>/messages.po`, compiled to
//! `.mo` by the build script.
//!
//! # String Naming Convention
//!
//! - `server.authz.` prefix for authorization and tenancy failures
//! - `server.api.` prefix for handler-level API failures
//!
//! Example: `server.authz.tenant_header_missing`
//!
//! # Example
//!
//! ```
//! use agenda_common_i18n::{t, t_fmt, resolve_locale};
//!
//! let message = t("pt-BR", "server.authz.no_token");
//! assert_eq!(message, "Nenhum token fornecido");
//!
//! let body = t_fmt("en", "server.api.policy_not_found", &[("id", "42")]);
//! assert!(body.contains("42"));
//!
//! let locale = resolve_locale(Some("pt-br"), "en");
//! assert_eq!(locale, "pt-BR");
//! ```

mod catalog;
mod locale;
mod resolve;

pub use catalog::{t, t_fmt};
pub use locale::{available_locales, is_supported, locale_info, LocaleInfo};
pub use resolve::{locale_from_accept_language, resolve_locale};

pub use locale::{DEFAULT_LOCALE, LOCALES};
