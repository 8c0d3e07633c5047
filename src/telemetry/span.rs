// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span handles the enrichment code writes to.
//!
//! [`TracingTracer`] opens real `tracing` spans; [`RecordingTracer`] keeps
//! spans in memory so attributes can be inspected afterwards.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field;
use tracing::span::EnteredSpan;

use crate::types::AttributeValue;

use super::attributes;
use super::processor::{record_call_context, CallContextProcessor, SpanProcessor};

/// A live span that can be renamed and annotated.
pub trait SpanHandle {
    /// Current display name.
    fn name(&self) -> String;

    /// Replace the display name.
    fn update_name(&mut self, name: &str);

    /// Set one attribute. Later values for the same key win.
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue);
}

/// Opens client spans around wrapped operations.
pub trait Tracer: Send + Sync {
    fn start_client_span(&self, name: &str) -> Box<dyn SpanHandle>;
}

/// Tracer backed by the `tracing` crate.
///
/// Spans pick up the call context a [`CallContextLayer`] stored for them.
/// Without that layer, a processor given to [`TracingTracer::with_call_context`]
/// resolves it instead.
///
/// [`CallContextLayer`]: super::CallContextLayer
#[derive(Debug, Clone, Default)]
pub struct TracingTracer {
    processor: Option<CallContextProcessor>,
}

impl TracingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_context(processor: CallContextProcessor) -> Self {
        Self {
            processor: Some(processor),
        }
    }
}

impl Tracer for TracingTracer {
    fn start_client_span(&self, name: &str) -> Box<dyn SpanHandle> {
        let mut span = TracingSpan::start(name);
        if !span.has_call_context() {
            if let Some(processor) = &self.processor {
                processor.on_start(&mut span);
            }
        }
        Box::new(span)
    }
}

/// An entered `tracing` span with every enrichment field pre-declared.
///
/// The span stays entered until the handle is dropped, so anything the
/// wrapped operation logs is nested under it.
pub struct TracingSpan {
    name: String,
    span: EnteredSpan,
    call_context: bool,
}

impl TracingSpan {
    pub fn start(name: &str) -> Self {
        let span = tracing::info_span!(
            "db.client",
            otel.name = %name,
            otel.kind = "client",
            code.namespace = field::Empty,
            code.function = field::Empty,
            code.filepath = field::Empty,
            code.lineno = field::Empty,
            code.activerecord.model = field::Empty,
            code.activerecord.method = field::Empty,
            db.system = field::Empty,
            db.operation = field::Empty,
            db.statement = field::Empty,
            db.query.duration_ms = field::Empty,
            db.query.slow_threshold_ms = field::Empty,
        );
        let call_context = record_call_context(&span);

        Self {
            name: name.to_string(),
            span: span.entered(),
            call_context,
        }
    }

    /// The underlying span.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Whether a layer-stored call context was recorded at start.
    pub fn has_call_context(&self) -> bool {
        self.call_context
    }
}

impl SpanHandle for TracingSpan {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn update_name(&mut self, name: &str) {
        self.span.record("otel.name", name);
        self.name = name.to_string();
    }

    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        debug_assert!(attributes::ALL.contains(&key), "undeclared span field {key}");
        record_attribute(&self.span, key, value);
    }
}

/// Record one attribute on a `tracing` span. Undeclared fields are ignored.
pub(crate) fn record_attribute(span: &tracing::Span, key: &'static str, value: AttributeValue) {
    match value {
        AttributeValue::Str(s) => span.record(key, s.as_str()),
        AttributeValue::Int(i) => span.record(key, i),
        AttributeValue::Float(f) => span.record(key, f),
        AttributeValue::Bool(b) => span.record(key, b),
    };
}

#[derive(Debug, Clone, Default)]
struct SpanData {
    name: String,
    attributes: BTreeMap<&'static str, AttributeValue>,
}

/// In-memory span. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordedSpan {
    data: Arc<Mutex<SpanData>>,
}

impl RecordedSpan {
    pub fn new(name: &str) -> Self {
        Self {
            data: Arc::new(Mutex::new(SpanData {
                name: name.to_string(),
                attributes: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpanData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn attribute(&self, key: &str) -> Option<AttributeValue> {
        self.lock().attributes.get(key).cloned()
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.lock().attributes.contains_key(key)
    }

    pub fn attributes(&self) -> BTreeMap<&'static str, AttributeValue> {
        self.lock().attributes.clone()
    }
}

impl SpanHandle for RecordedSpan {
    fn name(&self) -> String {
        self.lock().name.clone()
    }

    fn update_name(&mut self, name: &str) {
        self.lock().name = name.to_string();
    }

    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        self.lock().attributes.insert(key, value);
    }
}

/// Tracer that records every span it starts.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans started so far, oldest first.
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The most recently started span.
    pub fn last(&self) -> Option<RecordedSpan> {
        self.spans().pop()
    }

    pub fn len(&self) -> usize {
        self.spans().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tracer for RecordingTracer {
    fn start_client_span(&self, name: &str) -> Box<dyn SpanHandle> {
        let span = RecordedSpan::new(name);
        self.spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(span.clone());
        Box::new(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_span_shares_state_with_tracer() {
        let tracer = RecordingTracer::new();
        let mut handle = tracer.start_client_span("QUERY mysql");
        handle.set_attribute(attributes::DB_SYSTEM, "mysql".into());
        handle.update_name("User.find");

        let span = tracer.last().unwrap();
        assert_eq!(span.name(), "User.find");
        assert_eq!(span.attribute(attributes::DB_SYSTEM), Some("mysql".into()));
        assert!(!span.has_attribute(attributes::DB_STATEMENT));
        assert_eq!(tracer.len(), 1);
    }

    #[test]
    fn test_later_attribute_wins() {
        let mut span = RecordedSpan::new("x");
        span.set_attribute(attributes::CODE_LINENO, 1u32.into());
        span.set_attribute(attributes::CODE_LINENO, 2u32.into());
        assert_eq!(span.attribute(attributes::CODE_LINENO), Some(AttributeValue::Int(2)));
        assert_eq!(span.attributes().len(), 1);
    }

    #[test]
    fn test_tracing_span_without_subscriber() {
        let mut span = TracingSpan::start("EXEC postgresql");
        span.set_attribute(attributes::DB_OPERATION, "EXEC".into());
        span.update_name("Order#create");
        assert_eq!(span.name(), "Order#create");
    }
}
