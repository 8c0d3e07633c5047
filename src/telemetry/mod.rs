// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Spans, span-start enrichment, metrics and logging setup.
//!
//! - **Spans**: [`SpanHandle`] and [`Tracer`] are the seam the enrichment
//!   code writes through; [`TracingTracer`] targets the `tracing` crate and
//!   [`RecordingTracer`] keeps spans in memory.
//! - **Span start**: [`CallContextProcessor`] and its `tracing_subscriber`
//!   form [`CallContextLayer`] attach the caller's namespace context.
//! - **Metrics**: per-family call counters in [`GLOBAL_METRICS`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spanwright::telemetry::{init_telemetry, CallContextLayer, TelemetryConfig};
//!
//! let layer = CallContextLayer::new(resolver, Arc::clone(&shared_config));
//! let _guard = init_telemetry(&TelemetryConfig::default(), Some(layer))?;
//! ```

pub mod attributes;
mod init;
pub mod metrics;
mod processor;
mod span;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{CallOutcome, FamilyMetrics, Histogram, Metrics, MetricsSnapshot, GLOBAL_METRICS};
pub use processor::{
    apply_call_context, record_call_context, stored_call_context, CallContextLayer, CallContextProcessor,
    SpanProcessor,
};
pub use span::{RecordedSpan, RecordingTracer, SpanHandle, Tracer, TracingSpan, TracingTracer};
