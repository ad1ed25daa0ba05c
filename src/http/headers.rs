//! Header name normalization and `KEY=VALUE` header parsing.
//!
//! # Responsibilities
//! - Canonicalize header names for display (`content-type` → `Content-Type`)
//! - Turn `KEY=VALUE` option strings into a multi-value header set
//!
//! # Design Decisions
//! - The HTTP stack lowercases names on the wire, so the recorded form is the
//!   canonical MIME form rather than whatever the client sent
//! - Parsing is permissive: malformed entries are skipped, never rejected

use std::collections::BTreeMap;

/// Multi-value header set keyed by canonical header name.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// Canonical MIME form of a header name.
///
/// The first character and every character following a `-` are upper-cased,
/// the rest lower-cased. Names containing characters that are not valid in a
/// header token are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Parse `KEY=VALUE` strings into a header set.
///
/// Entries are split on the first `=`. Entries with no `=`, an empty key or
/// an empty value are ignored. Repeated keys accumulate values in order.
pub fn parse_headers<I, S>(entries: I) -> HeaderValues
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers = HeaderValues::new();

    for entry in entries {
        let Some((key, value)) = entry.as_ref().split_once('=') else {
            continue;
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        headers
            .entry(canonical_header_name(key))
            .or_default()
            .push(value.to_string());
    }

    headers
}
