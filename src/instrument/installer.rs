// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Idempotent installation of instrumentation on client types.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::ClientFamily;
use crate::enrich::SpanEnricher;
use crate::error::InstallError;
use crate::telemetry::{CallContextProcessor, Tracer, TracingTracer};

use super::adapters::AdapterSpec;
use super::client::{InstrumentableClient, Instrumented};

/// A client type with its wrapped operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationTarget {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub family: ClientFamily,
    pub operations: Vec<&'static str>,
}

impl InstrumentationTarget {
    pub fn covers(&self, operation: &str) -> bool {
        self.operations.iter().any(|op| *op == operation)
    }
}

/// Result of [`Installer::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(Arc<InstrumentationTarget>),
    /// The type was installed earlier; carries the original target.
    AlreadyInstalled(Arc<InstrumentationTarget>),
    /// The family is disabled in the current configuration.
    Disabled,
}

/// Tracks which client types are instrumented and hands out wrappers.
pub struct Installer {
    enricher: SpanEnricher,
    tracer: Arc<dyn Tracer>,
    installed: Mutex<HashMap<TypeId, Arc<InstrumentationTarget>>>,
}

impl Installer {
    /// Installer emitting `tracing` spans.
    ///
    /// Client spans carry the caller's namespace context, taken from a
    /// [`CallContextLayer`](crate::telemetry::CallContextLayer) when one is
    /// installed and resolved with the enricher's resolver otherwise.
    pub fn new(enricher: SpanEnricher) -> Self {
        let processor = CallContextProcessor::new(enricher.resolver().clone(), Arc::clone(enricher.config()));
        Self::with_tracer(enricher, Arc::new(TracingTracer::with_call_context(processor)))
    }

    pub fn with_tracer(enricher: SpanEnricher, tracer: Arc<dyn Tracer>) -> Self {
        Self {
            enricher,
            tracer,
            installed: Mutex::new(HashMap::new()),
        }
    }

    fn installed(&self) -> MutexGuard<'_, HashMap<TypeId, Arc<InstrumentationTarget>>> {
        self.installed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Install instrumentation for client type `C`.
    ///
    /// Installing the same type again is a no-op that returns the original
    /// target.
    pub fn install<C: InstrumentableClient>(&self) -> Result<InstallOutcome, InstallError> {
        let type_id = TypeId::of::<C>();
        let type_name = std::any::type_name::<C>();

        let mut installed = self.installed();
        if let Some(target) = installed.get(&type_id) {
            debug!(client = type_name, "Instrumentation already installed");
            return Ok(InstallOutcome::AlreadyInstalled(Arc::clone(target)));
        }

        let family = C::FAMILY;
        if !self.enricher.config().load().is_enabled(family) {
            debug!(client = type_name, family = %family, "Family disabled, not installing");
            return Ok(InstallOutcome::Disabled);
        }

        let operations = AdapterSpec::for_family(family).intersect(C::operations());
        if operations.is_empty() {
            return Err(InstallError::NoOperations {
                client: type_name.to_string(),
                family: family.to_string(),
            });
        }

        let target = Arc::new(InstrumentationTarget {
            type_id,
            type_name,
            family,
            operations,
        });
        installed.insert(type_id, Arc::clone(&target));
        info!(
            client = type_name,
            family = %family,
            operations = ?target.operations,
            "Installed instrumentation"
        );
        Ok(InstallOutcome::Installed(target))
    }

    pub fn is_installed<C: InstrumentableClient>(&self) -> bool {
        self.installed().contains_key(&TypeId::of::<C>())
    }

    pub fn target<C: InstrumentableClient>(&self) -> Option<Arc<InstrumentationTarget>> {
        self.installed().get(&TypeId::of::<C>()).cloned()
    }

    /// Every installed target, sorted by type name.
    pub fn targets(&self) -> Vec<Arc<InstrumentationTarget>> {
        let mut targets: Vec<_> = self.installed().values().cloned().collect();
        targets.sort_by_key(|target| target.type_name);
        targets
    }

    /// Wrap a client. Types that were never installed pass every call through.
    pub fn wrap<C: InstrumentableClient>(&self, client: C) -> Instrumented<C> {
        Instrumented::new(
            client,
            self.target::<C>(),
            self.enricher.clone(),
            Arc::clone(&self.tracer),
        )
    }

    pub fn enricher(&self) -> &SpanEnricher {
        &self.enricher
    }
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("installed", &self.installed().len())
            .finish_non_exhaustive()
    }
}
