// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Supported locales.

/// Locale used when nothing else resolves.
pub const DEFAULT_LOCALE: &str = "en";

/// Metadata for one supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleInfo {
	pub code: &'static str,
	pub name: &'static str,
	pub native_name: &'static str,
}

/// All locales with a message catalog.
pub const LOCALES: &[LocaleInfo] = &[
	LocaleInfo {
		code: "en",
		name: "English",
		native_name: "English",
	},
	LocaleInfo {
		code: "pt-BR",
		name: "Portuguese (Brazil)",
		native_name: "Português (Brasil)",
	},
];

/// Map a user-supplied tag onto a supported locale code.
///
/// Matching is case-insensitive and accepts `_` as a separator. A bare
/// language (`pt`) or an unknown region (`en-GB`) falls back to the
/// supported locale for that language.
pub(crate) fn canonicalize(tag: &str) -> Option<&'static str> {
	let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
	if normalized.is_empty() {
		return None;
	}

	if let Some(info) = LOCALES
		.iter()
		.find(|l| l.code.eq_ignore_ascii_case(&normalized))
	{
		return Some(info.code);
	}

	let language = normalized.split('-').next().unwrap_or_default();
	LOCALES
		.iter()
		.find(|l| {
			l.code
				.split('-')
				.next()
				.is_some_and(|lang| lang.eq_ignore_ascii_case(language))
		})
		.map(|l| l.code)
}

/// Whether `locale` resolves to a supported catalog.
pub fn is_supported(locale: &str) -> bool {
	canonicalize(locale).is_some()
}

/// Codes of all supported locales.
pub fn available_locales() -> Vec<&'static str> {
	LOCALES.iter().map(|l| l.code).collect()
}

/// Metadata for a supported locale.
pub fn locale_info(locale: &str) -> Option<&'static LocaleInfo> {
	let code = canonicalize(locale)?;
	LOCALES.iter().find(|l| l.code == code)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_exact_codes_are_supported() {
		assert!(is_supported("en"));
		assert!(is_supported("pt-BR"));
	}

	#[test]
	fn test_canonicalize_variants() {
		assert_eq!(canonicalize("pt-br"), Some("pt-BR"));
		assert_eq!(canonicalize("pt_BR"), Some("pt-BR"));
		assert_eq!(canonicalize("pt"), Some("pt-BR"));
		assert_eq!(canonicalize("EN-us"), Some("en"));
		assert_eq!(canonicalize("fr"), None);
		assert_eq!(canonicalize(""), None);
	}

	#[test]
	fn test_locale_info() {
		let info = locale_info("pt").unwrap();
		assert_eq!(info.native_name, "Português (Brasil)");
		assert!(locale_info("de").is_none());
	}

	#[test]
	fn test_available_locales() {
		assert_eq!(available_locales(), vec!["en", "pt-BR"]);
	}
}
