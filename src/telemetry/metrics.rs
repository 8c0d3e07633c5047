// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metrics collection for the instrumentation wrapper.
//!
//! Lightweight in-process counters per client family, without an external
//! metrics backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use crate::config::ClientFamily;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// What the enrichment processor did with one wrapped call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Source attributes attached.
    Enriched,
    /// Faster than the threshold, nothing attached.
    BelowThreshold,
    /// No application frame found.
    Unresolved,
}

/// Central metrics collection.
///
/// Recording is lock-free: each family owns a fixed set of atomic counters.
#[derive(Debug)]
pub struct Metrics {
    families: [FamilyCounters; ClientFamily::ALL.len()],

    /// Nested calls passed straight through by the re-entrancy guard.
    reentrant: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            families: std::array::from_fn(|_| FamilyCounters::new()),
            reentrant: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    fn counters(&self, family: ClientFamily) -> &FamilyCounters {
        &self.families[family as usize]
    }

    /// Record one wrapped call.
    pub fn record_call(&self, family: ClientFamily, duration: Duration, outcome: CallOutcome) {
        self.counters(family).record(duration, outcome);
    }

    /// Record a span-name formatter failure.
    pub fn record_formatter_failure(&self, family: ClientFamily) {
        self.counters(family).formatter_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a nested call that skipped enrichment.
    pub fn record_reentrant(&self) {
        self.reentrant.fetch_add(1, Ordering::Relaxed);
    }

    /// Metrics for one family, or `None` if nothing was recorded for it.
    pub fn family_metrics(&self, family: ClientFamily) -> Option<FamilyMetrics> {
        self.counters(family).snapshot()
    }

    pub fn reentrant_calls(&self) -> u64 {
        self.reentrant.load(Ordering::Relaxed)
    }

    /// Get uptime since metrics were initialized.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let families = ClientFamily::ALL
            .iter()
            .filter_map(|&family| self.family_metrics(family).map(|m| (family, m)))
            .collect();
        MetricsSnapshot {
            families,
            reentrant_calls: self.reentrant_calls(),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        for counters in &self.families {
            counters.reset();
        }
        self.reentrant.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Histogram bucket boundaries in microseconds: 1ms, 10ms, 50ms, 200ms, 1s, 5s.
const DEFAULT_BUCKETS: [u64; 6] = [1_000, 10_000, 50_000, 200_000, 1_000_000, 5_000_000];

/// Live counters for one family. Durations are kept in nanoseconds.
#[derive(Debug)]
struct FamilyCounters {
    calls: AtomicU64,
    enriched: AtomicU64,
    below_threshold: AtomicU64,
    unresolved: AtomicU64,
    formatter_failures: AtomicU64,
    total_nanos: AtomicU64,
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
    buckets: [AtomicU64; DEFAULT_BUCKETS.len() + 1],
}

impl FamilyCounters {
    fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            enriched: AtomicU64::new(0),
            below_threshold: AtomicU64::new(0),
            unresolved: AtomicU64::new(0),
            formatter_failures: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    fn record(&self, duration: Duration, outcome: CallOutcome) {
        let outcome_counter = match outcome {
            CallOutcome::Enriched => &self.enriched,
            CallOutcome::BelowThreshold => &self.below_threshold,
            CallOutcome::Unresolved => &self.unresolved,
        };
        outcome_counter.fetch_add(1, Ordering::Relaxed);

        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.min_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
        self.buckets[bucket_index(&DEFAULT_BUCKETS, duration)].fetch_add(1, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> Option<FamilyMetrics> {
        let calls = self.calls.load(Ordering::Relaxed);
        let formatter_failures = self.formatter_failures.load(Ordering::Relaxed);
        if calls == 0 && formatter_failures == 0 {
            return None;
        }

        let min_duration = match self.min_nanos.load(Ordering::Relaxed) {
            u64::MAX => Duration::MAX,
            nanos => Duration::from_nanos(nanos),
        };
        let counts = self.buckets.iter().map(|c| c.load(Ordering::Relaxed)).collect();

        Some(FamilyMetrics {
            calls,
            enriched: self.enriched.load(Ordering::Relaxed),
            below_threshold: self.below_threshold.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            formatter_failures,
            total_duration: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
            min_duration,
            max_duration: Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed)),
            histogram: Histogram {
                buckets: DEFAULT_BUCKETS.to_vec(),
                counts,
            },
        })
    }

    fn reset(&self) {
        for counter in [
            &self.calls,
            &self.enriched,
            &self.below_threshold,
            &self.unresolved,
            &self.formatter_failures,
            &self.total_nanos,
            &self.max_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.min_nanos.store(u64::MAX, Ordering::Relaxed);
        for bucket in &self.buckets {
            bucket.store(0, Ordering::Relaxed);
        }
    }
}

fn bucket_index(buckets: &[u64], duration: Duration) -> usize {
    let micros = duration.as_micros();
    buckets
        .iter()
        .position(|&b| micros <= u128::from(b))
        .unwrap_or(buckets.len())
}

/// Counters and latency for one client family.
#[derive(Debug, Clone)]
pub struct FamilyMetrics {
    pub calls: u64,
    pub enriched: u64,
    pub below_threshold: u64,
    pub unresolved: u64,
    pub formatter_failures: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub histogram: Histogram,
}

impl FamilyMetrics {
    pub fn new() -> Self {
        Self {
            calls: 0,
            enriched: 0,
            below_threshold: 0,
            unresolved: 0,
            formatter_failures: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    pub fn record(&mut self, duration: Duration, outcome: CallOutcome) {
        self.calls += 1;
        match outcome {
            CallOutcome::Enriched => self.enriched += 1,
            CallOutcome::BelowThreshold => self.below_threshold += 1,
            CallOutcome::Unresolved => self.unresolved += 1,
        }
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    /// Calculate average call duration.
    pub fn avg_duration(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.calls as u32
        }
    }

    /// Share of calls that crossed the threshold (0.0 to 1.0).
    pub fn slow_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.enriched as f64 / self.calls as f64
        }
    }
}

impl Default for FamilyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple histogram with fixed buckets for latency tracking.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bucket boundaries in microseconds.
    buckets: Vec<u64>,

    /// Count per bucket, plus one overflow bucket.
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket boundaries (in microseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    /// Record a duration value.
    pub fn record(&mut self, duration: Duration) {
        self.counts[bucket_index(&self.buckets, duration)] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Approximate percentile as the upper bound of the bucket it falls in.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let micros = if i < self.buckets.len() {
                    self.buckets[i]
                } else {
                    self.buckets.last().copied().unwrap_or(0) * 10
                };
                return Duration::from_micros(micros);
            }
        }

        Duration::ZERO
    }

    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS.to_vec())
    }
}

/// A snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub families: BTreeMap<ClientFamily, FamilyMetrics>,
    pub reentrant_calls: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Enrichment Metrics ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!("Re-entrant pass-through: {}\n\n", self.reentrant_calls));

        if !self.families.is_empty() {
            report.push_str("Client Families:\n");
            for (family, metrics) in &self.families {
                report.push_str(&format!(
                    "  {}: {} calls, {} enriched ({:.1}%), {} below threshold, {} unresolved, avg {:.2?}, p99 {:.2?}\n",
                    family,
                    metrics.calls,
                    metrics.enriched,
                    metrics.slow_rate() * 100.0,
                    metrics.below_threshold,
                    metrics.unresolved,
                    metrics.avg_duration(),
                    metrics.histogram.p99()
                ));
                if metrics.formatter_failures > 0 {
                    report.push_str(&format!(
                        "    formatter failures: {}\n",
                        metrics.formatter_failures
                    ));
                }
            }
        }

        report
    }
}
