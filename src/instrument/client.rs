// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The instrumentation decorator.

use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use crate::config::ClientFamily;
use crate::enrich::{ReentrancyGuard, SpanEnricher};
use crate::telemetry::{attributes, Tracer};

#[cfg(feature = "telemetry")]
use crate::telemetry::GLOBAL_METRICS;

use super::installer::InstrumentationTarget;

/// A database client type that can be wrapped.
///
/// Implementors name their family and the operations they expose; the
/// installer wraps the ones that are also candidates of the family's adapter.
pub trait InstrumentableClient: 'static {
    const FAMILY: ClientFamily;

    fn operations() -> &'static [&'static str];
}

/// Shared per-call behavior of an [`Instrumented`] client.
#[derive(Clone)]
struct Hooks {
    target: Option<Arc<InstrumentationTarget>>,
    enricher: SpanEnricher,
    tracer: Arc<dyn Tracer>,
}

impl Hooks {
    fn run<T>(&self, operation: &str, statement: Option<&str>, op: impl FnOnce() -> T) -> T {
        let Some(target) = self.target.as_ref().filter(|t| t.covers(operation)) else {
            return op();
        };
        let family = target.family;
        if !self.enricher.config().load().is_enabled(family) {
            return op();
        }

        // Held until return; dropping it clears the flag on unwind too.
        let Some(_guard) = ReentrancyGuard::enter(family) else {
            trace!(family = %family, operation, "Nested call, passing through");
            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_reentrant();
            return op();
        };

        let captured = self.enricher.capture();

        let db_operation = operation.to_uppercase();
        let mut span = self
            .tracer
            .start_client_span(&format!("{} {}", db_operation, family.db_system()));
        span.set_attribute(attributes::DB_SYSTEM, family.db_system().into());
        span.set_attribute(attributes::DB_OPERATION, db_operation.as_str().into());
        if let Some(statement) = statement {
            span.set_attribute(attributes::DB_STATEMENT, statement.into());
        }

        let started = Instant::now();
        let result = op();
        let elapsed = started.elapsed();

        self.enricher.rename_span(family, span.as_mut(), captured.model.as_ref());
        self.enricher.enrich(family, span.as_mut(), &captured, elapsed);

        result
    }
}

/// A client whose installed operations are traced and enriched.
///
/// Arguments and return values pass through unchanged, including any
/// callback the caller hands to the client inside `f`.
pub struct Instrumented<C> {
    client: C,
    hooks: Hooks,
}

impl<C: InstrumentableClient> Instrumented<C> {
    pub(crate) fn new(
        client: C,
        target: Option<Arc<InstrumentationTarget>>,
        enricher: SpanEnricher,
        tracer: Arc<dyn Tracer>,
    ) -> Self {
        Self {
            client,
            hooks: Hooks {
                target,
                enricher,
                tracer,
            },
        }
    }

    /// Run `operation` through `f`, with a shared borrow of the client.
    ///
    /// `statement` is recorded as `db.statement` when the operation's input
    /// is literal query text.
    pub fn call<T>(&self, operation: &str, statement: Option<&str>, f: impl FnOnce(&C) -> T) -> T {
        let client = &self.client;
        self.hooks.run(operation, statement, || f(client))
    }

    /// Like [`Instrumented::call`] for operations that need `&mut C`.
    pub fn call_mut<T>(
        &mut self,
        operation: &str,
        statement: Option<&str>,
        f: impl FnOnce(&mut C) -> T,
    ) -> T {
        let client = &mut self.client;
        self.hooks.run(operation, statement, || f(client))
    }

    /// Whether `operation` is wrapped for this client.
    pub fn is_instrumented(&self, operation: &str) -> bool {
        self.hooks
            .target
            .as_ref()
            .is_some_and(|target| target.covers(operation))
    }

    pub fn target(&self) -> Option<&Arc<InstrumentationTarget>> {
        self.hooks.target.as_ref()
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for Instrumented<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumented")
            .field("client", &self.client)
            .field("target", &self.hooks.target)
            .finish_non_exhaustive()
    }
}
