// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`ConfigFile`] is the partial, on-disk shape (JSON or YAML, every field
//! optional). [`EnrichmentConfig`] is the resolved value the engine reads.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::types::CallContext;

/// Default slow-call threshold for database families, in milliseconds.
pub const DEFAULT_SLOW_QUERY_MS: f64 = 200.0;

/// Path markers that identify dependency or toolchain code.
pub const DEFAULT_VENDOR_MARKERS: &[&str] = &["/.cargo/registry/", "/.cargo/git/", "/rustc/", "/vendor/"];

/// Path segment under which model source files live.
pub const DEFAULT_MODEL_PATH_SEGMENT: &str = "/models/";

/// A family of instrumentable database clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientFamily {
    Postgres,
    Mysql,
    Redis,
    Clickhouse,
}

impl ClientFamily {
    /// Every family, in a stable order.
    pub const ALL: [ClientFamily; 4] = [
        ClientFamily::Postgres,
        ClientFamily::Mysql,
        ClientFamily::Redis,
        ClientFamily::Clickhouse,
    ];

    /// Config key for this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientFamily::Postgres => "postgres",
            ClientFamily::Mysql => "mysql",
            ClientFamily::Redis => "redis",
            ClientFamily::Clickhouse => "clickhouse",
        }
    }

    /// Value of the `db.system` attribute.
    pub fn db_system(&self) -> &'static str {
        match self {
            ClientFamily::Postgres => "postgresql",
            ClientFamily::Mysql => "mysql",
            ClientFamily::Redis => "redis",
            ClientFamily::Clickhouse => "clickhouse",
        }
    }

    /// Built-in settings for this family.
    pub fn default_settings(&self) -> ClientSettings {
        match self {
            // Source tracking for every redis call is noisy; opt-in only.
            ClientFamily::Redis => ClientSettings {
                enabled: false,
                slow_query_ms: 0.0,
            },
            _ => ClientSettings {
                enabled: true,
                slow_query_ms: DEFAULT_SLOW_QUERY_MS,
            },
        }
    }
}

impl fmt::Display for ClientFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClientFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(ClientFamily::Postgres),
            "mysql" | "mysql2" => Ok(ClientFamily::Mysql),
            "redis" => Ok(ClientFamily::Redis),
            "clickhouse" => Ok(ClientFamily::Clickhouse),
            other => Err(ConfigError::invalid("client family", format!("unknown family '{}'", other))),
        }
    }
}

/// Resolved per-family settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub enabled: bool,
    pub slow_query_ms: f64,
}

/// Settings for the call-context resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverSettings {
    /// Absolute application root. Empty means nothing is application code.
    pub app_root: String,

    /// Path substrings that mark dependency code.
    pub vendor_markers: Vec<String>,

    /// Path substring that marks model source files.
    pub model_path_segment: String,
}

impl ResolverSettings {
    /// Settings rooted at `app_root` with default markers.
    pub fn new(app_root: impl Into<String>) -> Self {
        Self {
            app_root: app_root.into(),
            ..Default::default()
        }
    }

    /// Replace the vendor markers.
    pub fn with_vendor_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vendor_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the model path segment.
    pub fn with_model_path_segment(mut self, segment: impl Into<String>) -> Self {
        self.model_path_segment = segment.into();
        self
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            app_root: String::new(),
            vendor_markers: DEFAULT_VENDOR_MARKERS.iter().map(|m| m.to_string()).collect(),
            model_path_segment: DEFAULT_MODEL_PATH_SEGMENT.to_string(),
        }
    }
}

/// User-supplied span renaming hook: `(current name, model context) -> new name`.
pub type SpanNameFormatter = Arc<dyn Fn(&str, &CallContext) -> anyhow::Result<String> + Send + Sync>;

/// Resolved, immutable enrichment configuration.
///
/// Built once at startup; share it through [`super::SharedConfig`] and replace
/// it wholesale rather than mutating a live value.
#[derive(Clone)]
pub struct EnrichmentConfig {
    /// Per-family enable flag and slow-call threshold.
    pub clients: BTreeMap<ClientFamily, ClientSettings>,

    /// Whether per-span-start namespace enrichment runs.
    pub call_context_enabled: bool,

    /// Optional span renaming hook for per-call spans.
    pub span_name_formatter: Option<SpanNameFormatter>,

    /// Frame classification settings.
    pub resolver: ResolverSettings,
}

impl EnrichmentConfig {
    /// Settings for a family, falling back to the built-in defaults.
    pub fn client(&self, family: ClientFamily) -> ClientSettings {
        self.clients
            .get(&family)
            .copied()
            .unwrap_or_else(|| family.default_settings())
    }

    /// Whether instrumentation for `family` is enabled.
    pub fn is_enabled(&self, family: ClientFamily) -> bool {
        self.client(family).enabled
    }

    /// Slow-call threshold for `family` in milliseconds.
    pub fn threshold_ms(&self, family: ClientFamily) -> f64 {
        self.client(family).slow_query_ms
    }

    /// Set the threshold for a family.
    pub fn with_threshold(mut self, family: ClientFamily, threshold_ms: f64) -> Self {
        let mut settings = self.client(family);
        settings.slow_query_ms = threshold_ms;
        self.clients.insert(family, settings);
        self
    }

    /// Enable or disable a family.
    pub fn with_enabled(mut self, family: ClientFamily, enabled: bool) -> Self {
        let mut settings = self.client(family);
        settings.enabled = enabled;
        self.clients.insert(family, settings);
        self
    }

    /// Enable or disable per-span-start call context.
    pub fn with_call_context(mut self, enabled: bool) -> Self {
        self.call_context_enabled = enabled;
        self
    }

    /// Install a span-name formatter.
    pub fn with_span_name_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &CallContext) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.span_name_formatter = Some(Arc::new(formatter));
        self
    }

    /// Replace the resolver settings.
    pub fn with_resolver(mut self, resolver: ResolverSettings) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the application root.
    pub fn with_app_root(mut self, app_root: impl Into<String>) -> Self {
        self.resolver.app_root = app_root.into();
        self
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            clients: ClientFamily::ALL
                .iter()
                .map(|family| (*family, family.default_settings()))
                .collect(),
            call_context_enabled: true,
            span_name_formatter: None,
            resolver: ResolverSettings::default(),
        }
    }
}

impl fmt::Debug for EnrichmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentConfig")
            .field("clients", &self.clients)
            .field("call_context_enabled", &self.call_context_enabled)
            .field("span_name_formatter", &self.span_name_formatter.is_some())
            .field("resolver", &self.resolver)
            .finish()
    }
}

/// On-disk configuration. Can be defined in `.spanwright.json` or
/// `.spanwright/config.json` in the project root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Absolute application root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_root: Option<String>,

    /// Enable per-span-start call context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_context_enabled: Option<bool>,

    /// Path substrings marking dependency code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_markers: Option<Vec<String>>,

    /// Path substring marking model files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path_segment: Option<String>,

    /// Per-family settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<HashMap<ClientFamily, ClientSettingsPartial>>,
}

impl ConfigFile {
    /// Reject values the engine cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref clients) = self.clients {
            for (family, settings) in clients {
                if let Some(ms) = settings.slow_query_ms {
                    if !ms.is_finite() || ms < 0.0 {
                        return Err(ConfigError::invalid(
                            format!("clients.{}.slowQueryMs", family),
                            format!("expected a non-negative number, got {}", ms),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Partial per-family settings as written in a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettingsPartial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_query_ms: Option<f64>,
}
