// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Client instrumentation.
//!
//! A client type opts in by implementing [`InstrumentableClient`]. The
//! [`Installer`] records which of its operations are wrapped, once per type,
//! and [`Installer::wrap`] returns an [`Instrumented`] decorator:
//!
//! ```rust,ignore
//! installer.install::<PgClient>()?;
//! let client = installer.wrap(pg_client);
//! let rows = client.call("exec", Some(sql), |c| c.exec(sql))?;
//! ```
//!
//! Each wrapped call opens a client span, runs the operation with the
//! re-entrancy guard held, and enriches the span afterwards.

pub mod adapters;
mod client;
mod installer;

pub use adapters::AdapterSpec;
pub use client::{InstrumentableClient, Instrumented};
pub use installer::{InstallOutcome, Installer, InstrumentationTarget};
