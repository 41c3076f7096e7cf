//! Header name normalization.
//!
//! Names are collapsed case-insensitively so that a header bound from a
//! parameter overwrites a declaration default spelled differently.

use std::collections::BTreeMap;

/// Canonical form of a header name.
///
/// `content-type` in any case becomes `Content-Type`; other names are
/// title-cased per hyphen segment (`x-api-version` → `X-Api-Version`).
pub fn normalize_header_name(name: &str) -> String {
    if name.eq_ignore_ascii_case("content-type") {
        return "Content-Type".to_string();
    }
    name.split('-')
        .map(title_case)
        .collect::<Vec<_>>()
        .join("-")
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Normalize every name of a header map. Later entries win when two names
/// collapse to the same key.
pub fn normalize_headers<K, V, I>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    headers
        .into_iter()
        .map(|(k, v)| (normalize_header_name(k.as_ref()), v.into()))
        .collect()
}
