// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Process-wide configuration handle with whole-value replacement.

use std::sync::{Arc, RwLock};

use super::types::EnrichmentConfig;

/// Shared, swappable [`EnrichmentConfig`].
///
/// Readers take an `Arc` snapshot and never observe a half-updated value;
/// writers replace the whole configuration.
#[derive(Debug)]
pub struct SharedConfig {
    current: RwLock<Arc<EnrichmentConfig>>,
}

impl SharedConfig {
    /// Wrap an initial configuration.
    pub fn new(config: EnrichmentConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Snapshot of the current configuration.
    pub fn load(&self) -> Arc<EnrichmentConfig> {
        // A poisoned lock still holds a complete value; the swap is a single store.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the configuration, returning the previous one.
    pub fn store(&self, config: EnrichmentConfig) -> Arc<EnrichmentConfig> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(config))
    }

    /// Build a new configuration from the current one and swap it in.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(EnrichmentConfig) -> EnrichmentConfig,
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = f(EnrichmentConfig::clone(&guard));
        *guard = Arc::new(next);
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(EnrichmentConfig::default())
    }
}

impl From<EnrichmentConfig> for SharedConfig {
    fn from(config: EnrichmentConfig) -> Self {
        Self::new(config)
    }
}
