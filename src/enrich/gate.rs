// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Slow-call threshold gate.

use std::time::Duration;

/// Whether a call of `duration_ms` counts as slow. A call exactly at the
/// threshold passes.
pub fn passes(duration_ms: f64, threshold_ms: f64) -> bool {
    duration_ms >= threshold_ms
}

/// Wall-clock milliseconds of `elapsed`.
pub fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

/// Round to one decimal place for the `db.query.duration_ms` attribute.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_inclusive() {
        assert!(passes(200.0, 200.0));
        assert!(!passes(199.0, 200.0));
        assert!(passes(250.0, 200.0));
    }

    #[test]
    fn test_zero_threshold_passes_everything() {
        assert!(passes(0.0, 0.0));
        assert!(passes(0.01, 0.0));
    }

    #[test]
    fn test_duration_conversion_and_rounding() {
        assert_eq!(duration_ms(Duration::from_millis(250)), 250.0);
        assert_eq!(round_tenth(250.04), 250.0);
        assert_eq!(round_tenth(12.345), 12.3);
        assert_eq!(round_tenth(0.06), 0.1);
    }
}
