// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Frame label parsing.
//!
//! Labels follow the `Type.method` / `Type#method` convention, with an
//! optional `::`-namespaced type and optional wrapper markers
//! (`block in`, `rescue in`, `ensure in`) in front of the method.

use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)*)[.#](.*)$")
        .expect("label pattern is valid")
});

static WRAPPER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:block|rescue|ensure)(?: \(\d+ levels\))? in )+")
        .expect("wrapper marker pattern is valid")
});

/// Class and method recovered from a structured label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAttribution {
    pub class_name: String,
    pub method_name: Option<String>,
}

/// Parse `Type.method`, `Type#method` or `Ns::Type#method`.
///
/// Leading wrapper markers are dropped before matching, and the method is cut
/// at the first whitespace. Returns `None` when the label does not follow the
/// convention.
pub fn parse_label(label: &str) -> Option<LabelAttribution> {
    let label = strip_wrapper_marker(label.trim());
    let captures = LABEL_PATTERN.captures(label)?;

    let class_name = captures.get(1)?.as_str().to_string();
    let method_name = captures
        .get(2)
        .map(|m| strip_wrapper_marker(m.as_str()))
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string);

    Some(LabelAttribution {
        class_name,
        method_name,
    })
}

/// Remove leading `block in ` / `rescue in ` / `ensure in ` markers.
pub fn strip_wrapper_marker(label: &str) -> &str {
    match WRAPPER_MARKER.find(label) {
        Some(m) => &label[m.end()..],
        None => label,
    }
}

/// Turn a demangled Rust symbol into a frame label.
///
/// `app::models::user::User::find` becomes `User#find`, trait impls
/// `<app::User as Trait>::method` become `User#method`, free functions keep
/// only their name, and closures add a `block in ` marker.
pub fn label_from_symbol(symbol: &str) -> String {
    let mut closure = false;
    let segments: Vec<&str> = split_path(symbol.trim())
        .into_iter()
        .filter(|segment| {
            if segment.starts_with("{{") {
                closure |= segment.starts_with("{{closure");
                return false;
            }
            !is_symbol_hash(segment)
        })
        .collect();

    let label = match segments.as_slice() {
        [] => String::new(),
        [only] => owner_name(only).to_string(),
        [.., owner, method] => {
            let owner = owner_name(owner);
            let method = strip_generics(method);
            if owner.starts_with(|c: char| c.is_ascii_uppercase()) {
                format!("{}#{}", owner, method)
            } else {
                method.to_string()
            }
        }
    };

    if closure && !label.is_empty() {
        format!("block in {}", label)
    } else {
        label
    }
}

/// Split a symbol path on `::`, ignoring separators inside `<...>`.
fn split_path(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&path[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[start..]);
    segments.retain(|s| !s.is_empty());
    segments
}

/// Type name for a path segment, unwrapping `<Type as Trait>`.
fn owner_name(segment: &str) -> &str {
    if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        let type_path = inner.split(" as ").next().unwrap_or(inner);
        let last = split_path(type_path).last().copied().unwrap_or(type_path);
        return strip_generics(last.trim_start_matches('&'));
    }
    strip_generics(segment)
}

fn strip_generics(segment: &str) -> &str {
    segment.split('<').next().unwrap_or(segment)
}

/// Legacy mangling appends `h` + 16 hex digits.
fn is_symbol_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}
