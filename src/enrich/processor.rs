// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-call span enrichment.
//!
//! Context is captured before the wrapped operation runs, since afterwards
//! the stack no longer shows who issued the call. Timing attributes are
//! attached after it returns, and only for slow calls.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{ClientFamily, SharedConfig, SpanNameFormatter};
use crate::error::FormatterError;
use crate::resolve::CallContextResolver;
use crate::telemetry::attributes;
use crate::telemetry::{CallOutcome, SpanHandle};
use crate::types::{AttributeValue, CallContext, SourceLocation};

#[cfg(feature = "telemetry")]
use crate::telemetry::GLOBAL_METRICS;

use super::gate::{duration_ms, passes, round_tenth};

/// Context captured before a wrapped call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedContext {
    /// First application frame.
    pub source: Option<SourceLocation>,
    /// Confirmed domain model, if any.
    pub model: Option<CallContext>,
}

/// Applies slow-call and model attributes to client spans.
#[derive(Debug, Clone)]
pub struct SpanEnricher {
    resolver: CallContextResolver,
    config: Arc<SharedConfig>,
}

impl SpanEnricher {
    pub fn new(resolver: CallContextResolver, config: Arc<SharedConfig>) -> Self {
        Self { resolver, config }
    }

    pub fn resolver(&self) -> &CallContextResolver {
        &self.resolver
    }

    pub fn config(&self) -> &Arc<SharedConfig> {
        &self.config
    }

    /// Resolve the source location and model context of the current stack.
    ///
    /// The stack is walked once for both.
    pub fn capture(&self) -> CapturedContext {
        let config = self.config.load();
        let (source, model) = self.resolver.resolve_call_site(&config.resolver);
        CapturedContext { source, model }
    }

    /// Rename `span` with the configured formatter.
    ///
    /// Runs only when a model context was found. Formatter errors and panics
    /// are logged and the original name is kept. Returns whether the span
    /// was renamed.
    pub fn rename_span(
        &self,
        family: ClientFamily,
        span: &mut dyn SpanHandle,
        model: Option<&CallContext>,
    ) -> bool {
        let Some(model) = model else {
            return false;
        };
        let config = self.config.load();
        let Some(formatter) = config.span_name_formatter.as_ref() else {
            return false;
        };

        let current = span.name();
        match call_formatter(formatter, &current, model) {
            Ok(name) if !name.is_empty() && name != current => {
                span.update_name(&name);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("[spanwright] Span name formatter error: {}", e);
                #[cfg(feature = "telemetry")]
                GLOBAL_METRICS.record_formatter_failure(family);
                #[cfg(not(feature = "telemetry"))]
                let _ = family;
                false
            }
        }
    }

    /// Attach timing, source and model attributes after a call finished.
    ///
    /// Nothing is attached unless a source location was captured and the
    /// call took at least the family's threshold. The threshold is read from
    /// the live configuration on every call.
    pub fn enrich(
        &self,
        family: ClientFamily,
        span: &mut dyn SpanHandle,
        captured: &CapturedContext,
        elapsed: Duration,
    ) -> CallOutcome {
        let threshold_ms = self.config.load().threshold_ms(family);
        let elapsed_ms = duration_ms(elapsed);

        let outcome = match &captured.source {
            None => CallOutcome::Unresolved,
            Some(_) if !passes(elapsed_ms, threshold_ms) => CallOutcome::BelowThreshold,
            Some(source) => {
                span.set_attribute(attributes::CODE_FILEPATH, source.filepath.as_str().into());
                if let Some(line) = source.line {
                    span.set_attribute(attributes::CODE_LINENO, AttributeValue::from(line));
                }
                span.set_attribute(
                    attributes::DB_QUERY_DURATION_MS,
                    AttributeValue::Float(round_tenth(elapsed_ms)),
                );
                span.set_attribute(
                    attributes::DB_QUERY_SLOW_THRESHOLD_MS,
                    AttributeValue::Float(threshold_ms),
                );

                if let Some(model) = &captured.model {
                    span.set_attribute(attributes::CODE_MODEL, model.model_name().into());
                    if let Some(method) = model.method_name() {
                        span.set_attribute(attributes::CODE_MODEL_METHOD, method.into());
                    }
                }
                CallOutcome::Enriched
            }
        };

        debug!(
            family = %family,
            duration_ms = elapsed_ms,
            threshold_ms,
            outcome = ?outcome,
            "Enrichment decision"
        );

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_call(family, elapsed, outcome);

        outcome
    }
}

fn call_formatter(
    formatter: &SpanNameFormatter,
    current: &str,
    model: &CallContext,
) -> Result<String, FormatterError> {
    match catch_unwind(AssertUnwindSafe(|| formatter(current, model))) {
        Ok(result) => result.map_err(FormatterError::from),
        Err(payload) => Err(FormatterError::from_panic(payload)),
    }
}
