// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span attribute keys.

pub const CODE_NAMESPACE: &str = "code.namespace";
pub const CODE_FUNCTION: &str = "code.function";
pub const CODE_FILEPATH: &str = "code.filepath";
pub const CODE_LINENO: &str = "code.lineno";
pub const CODE_MODEL: &str = "code.activerecord.model";
pub const CODE_MODEL_METHOD: &str = "code.activerecord.method";

pub const DB_SYSTEM: &str = "db.system";
pub const DB_OPERATION: &str = "db.operation";
pub const DB_STATEMENT: &str = "db.statement";
pub const DB_QUERY_DURATION_MS: &str = "db.query.duration_ms";
pub const DB_QUERY_SLOW_THRESHOLD_MS: &str = "db.query.slow_threshold_ms";

/// Every key this crate may set on a span.
pub const ALL: &[&str] = &[
    CODE_NAMESPACE,
    CODE_FUNCTION,
    CODE_FILEPATH,
    CODE_LINENO,
    CODE_MODEL,
    CODE_MODEL_METHOD,
    DB_SYSTEM,
    DB_OPERATION,
    DB_STATEMENT,
    DB_QUERY_DURATION_MS,
    DB_QUERY_SLOW_THRESHOLD_MS,
];
