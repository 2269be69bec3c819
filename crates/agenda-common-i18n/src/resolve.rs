// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Locale resolution logic.

use crate::locale::{canonicalize, DEFAULT_LOCALE};

/// Resolve the effective locale from a request preference and server default.
///
/// Resolution order (highest to lowest priority):
/// 1. Requested locale (if supported)
/// 2. Server default locale (if supported)
/// 3. Fallback to English ("en")
///
/// # Example
///
/// ```
/// use agenda_common_i18n::resolve_locale;
///
/// assert_eq!(resolve_locale(Some("pt-BR"), "en"), "pt-BR");
/// assert_eq!(resolve_locale(None, "pt-BR"), "pt-BR");
/// assert_eq!(resolve_locale(Some("invalid"), "also_invalid"), "en");
/// ```
pub fn resolve_locale(requested: Option<&str>, server_default: &str) -> &'static str {
	if let Some(locale) = requested.and_then(canonicalize) {
		return locale;
	}

	canonicalize(server_default).unwrap_or(DEFAULT_LOCALE)
}

/// Pick the preferred supported locale from an `Accept-Language` header value.
///
/// Entries are considered in descending quality order; entries with `q=0`
/// are ignored. Returns `None` when no entry maps to a supported locale.
pub fn locale_from_accept_language(header: &str) -> Option<&'static str> {
	let mut entries: Vec<(&str, f32)> = header
		.split(',')
		.filter_map(|entry| {
			let mut parts = entry.split(';');
			let tag = parts.next()?.trim();
			let quality = parts
				.find_map(|p| p.trim().strip_prefix("q="))
				.and_then(|q| q.parse::<f32>().ok())
				.unwrap_or(1.0);
			(!tag.is_empty() && quality > 0.0).then_some((tag, quality))
		})
		.collect();

	// Stable sort keeps header order for equal weights.
	entries.sort_by(|a, b| b.1.total_cmp(&a.1));

	entries.into_iter().find_map(|(tag, _)| canonicalize(tag))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_requested_takes_priority() {
		assert_eq!(resolve_locale(Some("pt-BR"), "en"), "pt-BR");
		assert_eq!(resolve_locale(Some("en"), "pt-BR"), "en");
	}

	#[test]
	fn test_server_default_when_no_request() {
		assert_eq!(resolve_locale(None, "pt-BR"), "pt-BR");
	}

	#[test]
	fn test_fallback_to_english_when_both_invalid() {
		assert_eq!(resolve_locale(Some("invalid"), "also_invalid"), "en");
		assert_eq!(resolve_locale(None, ""), "en");
	}

	#[test]
	fn test_accept_language_quality_order() {
		assert_eq!(
			locale_from_accept_language("fr;q=1.0, pt-BR;q=0.9, en;q=0.8"),
			Some("pt-BR")
		);
		assert_eq!(
			locale_from_accept_language("en;q=0.5, pt;q=0.7"),
			Some("pt-BR")
		);
		assert_eq!(locale_from_accept_language("pt-BR;q=0, en"), Some("en"));
	}

	#[test]
	fn test_accept_language_unsupported() {
		assert_eq!(locale_from_accept_language("fr, de"), None);
		assert_eq!(locale_from_accept_language(""), None);
	}
}
