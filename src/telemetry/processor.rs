// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-span-start enrichment.
//!
//! Every new span gets the namespace context of the application code that
//! opened it. There is no timing or threshold here, only metadata.

use std::sync::Arc;

use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

use crate::config::SharedConfig;
use crate::resolve::CallContextResolver;
use crate::types::{AttributeValue, CallContext};

use super::attributes;
use super::span::{record_attribute, SpanHandle};

/// Span lifecycle observer.
pub trait SpanProcessor: Send + Sync {
    fn on_start(&self, span: &mut dyn SpanHandle);

    fn on_finish(&self, _span: &dyn SpanHandle) {}

    fn force_flush(&self) {}

    fn shutdown(&self) {}
}

/// Writes `code.*` attributes on span start.
#[derive(Debug, Clone)]
pub struct CallContextProcessor {
    resolver: CallContextResolver,
    config: Arc<SharedConfig>,
}

impl CallContextProcessor {
    pub fn new(resolver: CallContextResolver, config: Arc<SharedConfig>) -> Self {
        Self { resolver, config }
    }

    /// Namespace context for the current stack, if call context is enabled.
    pub fn resolve(&self) -> Option<CallContext> {
        let config = self.config.load();
        if !config.call_context_enabled {
            return None;
        }
        self.resolver.resolve_namespace_context(&config.resolver)
    }
}

impl SpanProcessor for CallContextProcessor {
    fn on_start(&self, span: &mut dyn SpanHandle) {
        if let Some(context) = self.resolve() {
            apply_call_context(span, &context);
        }
    }
}

/// Copy a namespace context onto a span.
///
/// File and line are only written together, and only when a line is known.
pub fn apply_call_context(span: &mut dyn SpanHandle, context: &CallContext) {
    for (key, value) in call_context_attributes(context) {
        span.set_attribute(key, value);
    }
}

/// The call context a [`CallContextLayer`] stored for `span`, if any.
pub fn stored_call_context(span: &tracing::Span) -> Option<CallContext> {
    span.with_subscriber(|(id, dispatch)| {
        let registry = dispatch.downcast_ref::<Registry>()?;
        let span = registry.span(id)?;
        let context = span.extensions().get::<CallContext>().cloned();
        context
    })
    .flatten()
}

/// Record the layer-stored call context into `span`'s `code.*` fields.
///
/// Fields the span does not declare are skipped. Returns whether a stored
/// context was found.
pub fn record_call_context(span: &tracing::Span) -> bool {
    let Some(context) = stored_call_context(span) else {
        return false;
    };
    for (key, value) in call_context_attributes(&context) {
        record_attribute(span, key, value);
    }
    true
}

fn call_context_attributes(context: &CallContext) -> Vec<(&'static str, AttributeValue)> {
    let mut fields = vec![(attributes::CODE_NAMESPACE, context.class_name.as_str().into())];
    if let Some(method) = &context.method_name {
        fields.push((attributes::CODE_FUNCTION, method.as_str().into()));
    }
    if let (Some(line), Some(filepath)) = (context.line, &context.filepath) {
        fields.push((attributes::CODE_FILEPATH, filepath.as_str().into()));
        fields.push((attributes::CODE_LINENO, AttributeValue::from(line)));
    }
    fields
}

/// `tracing_subscriber` layer that stores the namespace [`CallContext`] in
/// each new span's extensions.
///
/// The stack is walked while the span is being created. Spans that declare
/// `code.*` fields get the values through [`record_call_context`];
/// [`TracingSpan`](super::TracingSpan) does this on start.
#[derive(Debug, Clone)]
pub struct CallContextLayer {
    processor: CallContextProcessor,
}

impl CallContextLayer {
    pub fn new(resolver: CallContextResolver, config: Arc<SharedConfig>) -> Self {
        Self {
            processor: CallContextProcessor::new(resolver, config),
        }
    }
}

impl From<CallContextProcessor> for CallContextLayer {
    fn from(processor: CallContextProcessor) -> Self {
        Self { processor }
    }
}

impl<S> Layer<S> for CallContextLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(context) = self.processor.resolve() else {
            return;
        };
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }
}
