// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Class-name inference from file paths.

use std::path::Path;

/// Infer a type name from a file's basename: `order_service.rs` → `OrderService`.
///
/// Pure string transform. The result is well-formed but unverified, so callers
/// that need a confirmed model must correlate it with a registry first.
pub fn infer_class_from_path(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    stem.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect()
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_basenames() {
        assert_eq!(infer_class_from_path("/app/services/order_service.rb"), "OrderService");
        assert_eq!(infer_class_from_path("/app/jobs/invoice_job.rb"), "InvoiceJob");
        assert_eq!(infer_class_from_path("/app/src/models/line_item.rs"), "LineItem");
    }

    #[test]
    fn test_single_word_and_relative_paths() {
        assert_eq!(infer_class_from_path("user.rs"), "User");
        assert_eq!(infer_class_from_path("models/checkout.rs"), "Checkout");
    }

    #[test]
    fn test_kebab_case_and_repeated_separators() {
        assert_eq!(infer_class_from_path("/app/bin/sync-worker.rs"), "SyncWorker");
        assert_eq!(infer_class_from_path("/app/a__b.rs"), "AB");
    }

    #[test]
    fn test_capitalize_lowercases_tail() {
        assert_eq!(infer_class_from_path("/app/HTTP_client.rs"), "HttpClient");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(infer_class_from_path(""), "");
        assert_eq!(infer_class_from_path("/app/___.rs"), "");
    }
}
