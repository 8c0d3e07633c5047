// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Caller-context resolution.
//!
//! Turns a sequence of caller frames into "which application code issued this
//! call" and, when a [`DomainRegistry`] confirms it, "which domain model".
//!
//! ```text
//! FrameSource ──► FrameFilter ──► label / path attribution ──► DomainRegistry
//!                                                │
//!                                    CallContextResolver
//! ```

pub mod frames;
pub mod label;
pub mod path;
pub mod registry;
pub mod resolver;

pub use frames::{BacktraceFrames, FrameFilter, FrameSource, StaticFrames};
pub use label::{label_from_symbol, parse_label, strip_wrapper_marker, LabelAttribution};
pub use path::infer_class_from_path;
pub use registry::{Correlation, DomainRegistry, EmptyRegistry, StaticRegistry};
pub use resolver::CallContextResolver;
