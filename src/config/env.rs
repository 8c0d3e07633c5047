// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Environment variable overrides.
//!
//! Blank or unparsable values never fail; they keep whatever the lower layers
//! configured.

use super::types::{ClientFamily, EnrichmentConfig};

/// Prefix for every spanwright environment variable.
pub const ENV_PREFIX: &str = "SPANWRIGHT_";

/// Legacy threshold variable, honoured for postgres when the specific one is unset.
pub const LEGACY_SLOW_QUERY_ENV: &str = "OTEL_SLOW_QUERY_MS";

/// Application root override.
pub const APP_ROOT_ENV: &str = "SPANWRIGHT_APP_ROOT";

/// Call-context toggle.
pub const CALL_CONTEXT_ENV: &str = "SPANWRIGHT_CALL_CONTEXT_ENABLED";

/// Environment keys for one family: `(enabled, threshold)`.
pub fn family_env_keys(family: ClientFamily) -> (&'static str, Option<&'static str>) {
    match family {
        ClientFamily::Postgres => (
            "SPANWRIGHT_PG_SLOW_QUERY_ENABLED",
            Some("SPANWRIGHT_PG_SLOW_QUERY_MS"),
        ),
        ClientFamily::Mysql => (
            "SPANWRIGHT_MYSQL_SLOW_QUERY_ENABLED",
            Some("SPANWRIGHT_MYSQL_SLOW_QUERY_MS"),
        ),
        ClientFamily::Redis => ("SPANWRIGHT_REDIS_SOURCE_ENABLED", None),
        ClientFamily::Clickhouse => (
            "SPANWRIGHT_CLICKHOUSE_ENABLED",
            Some("SPANWRIGHT_CLICKHOUSE_SLOW_QUERY_MS"),
        ),
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: EnrichmentConfig) -> EnrichmentConfig {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary key lookup.
pub fn apply_overrides_from<F>(mut config: EnrichmentConfig, lookup: F) -> EnrichmentConfig
where
    F: Fn(&str) -> Option<String>,
{
    for family in ClientFamily::ALL {
        let (enabled_key, threshold_key) = family_env_keys(family);
        let mut settings = config.client(family);

        settings.enabled = parse_bool(lookup(enabled_key).as_deref(), settings.enabled);

        if let Some(key) = threshold_key {
            let mut threshold = settings.slow_query_ms;
            if family == ClientFamily::Postgres {
                threshold = parse_float(lookup(LEGACY_SLOW_QUERY_ENV).as_deref(), threshold);
            }
            settings.slow_query_ms = parse_float(lookup(key).as_deref(), threshold);
        }

        config.clients.insert(family, settings);
    }

    config.call_context_enabled =
        parse_bool(lookup(CALL_CONTEXT_ENV).as_deref(), config.call_context_enabled);

    if let Some(root) = lookup(APP_ROOT_ENV) {
        let root = root.trim();
        if !root.is_empty() {
            config.resolver.app_root = root.to_string();
        }
    }

    config
}

/// Parse a boolean flag, falling back to `default` on blank or unknown input.
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_lowercase(),
        _ => return default,
    };

    match value.as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::debug!(value = %value, "Ignoring unrecognised boolean override");
            default
        }
    }
}

/// Parse a millisecond threshold, falling back to `default` on blank,
/// unparsable, negative or non-finite input.
pub fn parse_float(value: Option<&str>, default: f64) -> f64 {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => match v.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => parsed,
            _ => {
                tracing::debug!(value = %v, "Ignoring unparsable threshold override");
                default
            }
        },
        _ => default,
    }
}
