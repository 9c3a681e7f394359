// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fitsync_core::{ClockSource, SystemClock};
use tokio::time::Instant;

/// Wall clock that advances with tokio's clock.
///
/// Anchored to the system time at construction, then driven by
/// [`tokio::time::Instant`], so paused-time tests see backoff delays elapse
/// without sleeping.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_ms: u64,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(SystemClock.now_ms())
    }

    /// A clock reading `origin_ms` now.
    pub fn starting_at(origin_ms: u64) -> Self {
        TokioClock { origin_ms, origin: Instant::now() }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for TokioClock {
    fn now_ms(&self) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.origin).as_millis();
        self.origin_ms.saturating_add(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
