// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message catalogs and lookup.

use std::collections::HashMap;

use gettext::Catalog;
use once_cell::sync::Lazy;

use crate::locale::{canonicalize, DEFAULT_LOCALE};

const EN_MO: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/en.mo"));
const PT_BR_MO: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/pt-BR.mo"));

static CATALOGS: Lazy<HashMap<&'static str, Catalog>> = Lazy::new(|| {
	let mut map = HashMap::new();

	match Catalog::parse(EN_MO) {
		Ok(catalog) => {
			map.insert("en", catalog);
		}
		Err(e) => tracing::error!(error = ?e, "Failed to parse English translation catalog"),
	}

	match Catalog::parse(PT_BR_MO) {
		Ok(catalog) => {
			map.insert("pt-BR", catalog);
		}
		Err(e) => tracing::warn!(error = ?e, "Failed to parse Brazilian Portuguese translation catalog"),
	}

	map
});

/// Translate `key` into `locale`.
///
/// Unknown locales use the default catalog. A key missing from the chosen
/// catalog falls back to English, and a key missing everywhere is returned
/// unchanged.
pub fn t(locale: &str, key: &str) -> String {
	lookup(locale, key).to_string()
}

/// Translate `key` and substitute `{name}` placeholders.
pub fn t_fmt(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
	args.iter().fold(lookup(locale, key).to_string(), |acc, (name, value)| {
		acc.replace(&format!("{{{name}}}"), value)
	})
}

fn lookup<'a>(locale: &str, key: &'a str) -> &'a str {
	let code = canonicalize(locale).unwrap_or(DEFAULT_LOCALE);

	if let Some(message) = translate(code, key) {
		return message;
	}

	match translate(DEFAULT_LOCALE, key) {
		Some(message) => {
			tracing::trace!(locale = code, key, "missing translation, using default locale");
			message
		}
		None => {
			tracing::warn!(key, "missing translation key");
			key
		}
	}
}

/// `None` when the catalog is missing or has no entry for `key`.
fn translate<'a>(locale: &str, key: &'a str) -> Option<&'a str> {
	// The empty msgid is the catalog header.
	if key.is_empty() {
		return None;
	}
	let catalog = CATALOGS.get(locale)?;
	let message = catalog.gettext(key);
	(message != key).then_some(message)
}
