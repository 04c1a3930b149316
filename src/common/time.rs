//! Timing helpers for the `dur_ms` field on log events.

use std::time::Instant;

/// Milliseconds elapsed since `start`, as a float so sub-millisecond queries stay visible.
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}
