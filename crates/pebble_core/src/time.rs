//! Variable-rate frame clock
//!
//! The simulation advances by the wall time that actually passed since the
//! previous frame, capped so a stalled frame cannot inject one huge step.

use std::time::{Duration, Instant};

/// Fixed step used by headless runs and tests (60 Hz).
pub const HEADLESS_DT: f32 = 1.0 / 60.0;

pub struct FrameClock {
    last: Instant,
    max_dt: f32,
    frame_count: u64,
    elapsed: Duration,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last: Instant::now(),
            max_dt,
            frame_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Seconds since the previous call (or construction), in `[0, max_dt]`.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last);
        self.last = now;
        self.advance(raw)
    }

    /// Account for `raw` wall time and return the capped dt.
    pub fn advance(&mut self, raw: Duration) -> f32 {
        self.frame_count += 1;
        let dt = raw.as_secs_f32().clamp(0.0, self.max_dt);
        self.elapsed += Duration::from_secs_f32(dt);
        dt
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Simulated time so far (sum of capped dts).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
