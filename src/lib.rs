// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Spanwright - caller-context resolution and span enrichment for database
//! client tracing.
//!
//! Given the call stack at the moment a database client is invoked, spanwright
//! works out which application code issued the call and, when the host
//! confirms it, which domain model. Slow calls get their source location and
//! timing attached to the client span; every span can carry the enclosing
//! class and method of the code that opened it.
//!
//! # Architecture
//!
//! - [`types`] - Frames, call contexts, attribute values
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading, merging and live replacement
//! - [`resolve`] - Frame filtering, label and path attribution, registry
//!   correlation, the call-context resolver
//! - [`enrich`] - Threshold gate, re-entrancy guard, per-call enrichment
//! - [`instrument`] - Client decorator and idempotent installer
//! - [`telemetry`] - Span abstraction, span-start processor and layer,
//!   metrics, logging setup
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spanwright::config::{load_config, SharedConfig};
//! use spanwright::enrich::SpanEnricher;
//! use spanwright::instrument::Installer;
//! use spanwright::resolve::{CallContextResolver, StaticRegistry};
//!
//! let config = Arc::new(SharedConfig::new(load_config(&workspace_root)?));
//! let resolver = CallContextResolver::live(Arc::new(StaticRegistry::new(["User", "Order"])));
//! let installer = Installer::new(SpanEnricher::new(resolver, config));
//!
//! installer.install::<PgClient>()?;
//! let client = installer.wrap(pg_client);
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod instrument;
pub mod resolve;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{ClientFamily, EnrichmentConfig, SharedConfig};
pub use enrich::SpanEnricher;
pub use error::{ConfigError, FormatterError, InstallError, Result};
pub use instrument::{InstallOutcome, InstrumentableClient, Instrumented, Installer};
pub use resolve::{CallContextResolver, DomainRegistry, FrameSource};
pub use telemetry::{CallContextLayer, CallContextProcessor, SpanHandle, Tracer};
pub use types::{AttributeValue, AttributionKind, CallContext, SourceLocation, StackFrame};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
