// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Slow-call enrichment of client spans.

pub mod gate;
mod guard;
mod processor;

pub use gate::passes;
pub use guard::ReentrancyGuard;
pub use processor::{CapturedContext, SpanEnricher};
