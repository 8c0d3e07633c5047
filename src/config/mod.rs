// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for spanwright.
//!
//! Handles loading, merging, and validation of configuration from multiple sources:
//! - Global config: ~/.spanwright/config.json
//! - Workspace config: .spanwright.json, .spanwright.yaml, .spanwright/config.json,
//!   or spanwright.config.json
//! - Environment: `SPANWRIGHT_*` variables
//!
//! Configuration is merged with precedence (env > workspace > global > defaults).
//! The span-name formatter is code-only and is attached with
//! [`EnrichmentConfig::with_span_name_formatter`].

mod env;
mod loader;
mod merger;
mod shared;
mod types;

pub use env::{
    apply_env_overrides, apply_overrides_from, family_env_keys, parse_bool, parse_float,
    APP_ROOT_ENV, CALL_CONTEXT_ENV, ENV_PREFIX, LEGACY_SLOW_QUERY_ENV,
};

pub use loader::{
    find_workspace_root, get_global_config_dir, get_global_config_path, load_config_file,
    load_global_config, load_workspace_config, CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE,
};

pub use merger::{apply_config_file, default_config, merge_config};

pub use shared::SharedConfig;

pub use types::{
    ClientFamily, ClientSettings, ClientSettingsPartial, ConfigFile, EnrichmentConfig,
    ResolverSettings, SpanNameFormatter, DEFAULT_MODEL_PATH_SEGMENT, DEFAULT_SLOW_QUERY_MS,
    DEFAULT_VENDOR_MARKERS,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a workspace.
///
/// When no layer sets an application root, the workspace root is used.
pub fn load_config(workspace_root: &Path) -> Result<EnrichmentConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;

    let mut config = apply_env_overrides(merge_config(global, workspace));
    if config.resolver.app_root.is_empty() {
        config.resolver.app_root = workspace_root.to_string_lossy().into_owned();
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_no_files_uses_workspace_as_root() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();
        // The global file or environment may set a root; otherwise the workspace is used
        assert!(!config.resolver.app_root.is_empty());
    }

    #[test]
    fn test_load_config_with_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".spanwright.json"),
            r#"{"clients": {"clickhouse": {"slowQueryMs": 42}}}"#,
        )
        .unwrap();

        let config = load_config(temp.path()).unwrap();
        if std::env::var("SPANWRIGHT_CLICKHOUSE_SLOW_QUERY_MS").is_err() {
            assert_eq!(config.threshold_ms(ClientFamily::Clickhouse), 42.0);
        }
    }
}
