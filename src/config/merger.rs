// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Precedence (highest to lowest): environment, workspace file, global file,
//! built-in defaults. Environment overrides are applied by [`super::env`].

use super::types::{ConfigFile, EnrichmentConfig};

/// Default configuration values.
pub fn default_config() -> EnrichmentConfig {
    EnrichmentConfig::default()
}

/// Merge file configurations over the defaults.
pub fn merge_config(global: Option<ConfigFile>, workspace: Option<ConfigFile>) -> EnrichmentConfig {
    let mut result = default_config();

    if let Some(config) = global {
        apply_config_file(&mut result, &config);
    }

    if let Some(config) = workspace {
        apply_config_file(&mut result, &config);
    }

    result
}

/// Apply every field that is set in `config`.
pub fn apply_config_file(result: &mut EnrichmentConfig, config: &ConfigFile) {
    if let Some(ref app_root) = config.app_root {
        result.resolver.app_root = app_root.clone();
    }

    if let Some(enabled) = config.call_context_enabled {
        result.call_context_enabled = enabled;
    }

    if let Some(ref markers) = config.vendor_markers {
        for marker in markers {
            if !result.resolver.vendor_markers.contains(marker) {
                result.resolver.vendor_markers.push(marker.clone());
            }
        }
    }

    if let Some(ref segment) = config.model_path_segment {
        result.resolver.model_path_segment = segment.clone();
    }

    if let Some(ref clients) = config.clients {
        for (family, partial) in clients {
            let mut settings = result.client(*family);
            if let Some(enabled) = partial.enabled {
                settings.enabled = enabled;
            }
            if let Some(ms) = partial.slow_query_ms {
                settings.slow_query_ms = ms;
            }
            result.clients.insert(*family, settings);
        }
    }
}
