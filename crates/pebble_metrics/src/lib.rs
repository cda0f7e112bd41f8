//! Pebble Metrics - frame and collision instrumentation
//!
//! Everything here is gated behind the `metrics` feature. Without it the
//! same types exist as empty stubs so call sites never need `cfg` blocks.
//!
//! ```ignore
//! use pebble_metrics::{FrameTimer, Phase, PhaseProfiler};
//!
//! let mut timer = FrameTimer::new(120);
//! let mut profiler = PhaseProfiler::new();
//! timer.begin();
//! profiler.time(Phase::Collide, || resolve_contacts());
//! timer.end();
//! println!("FPS: {:.1}, collide {:.2} ms", timer.fps(), profiler.average_ms(Phase::Collide));
//! ```

mod phase;

#[cfg(feature = "metrics")]
mod collision_counters;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod phase_profiler;
#[cfg(feature = "metrics")]
mod ring_buffer;

pub use phase::Phase;

#[cfg(feature = "metrics")]
pub use collision_counters::CollisionCounters;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use phase_profiler::PhaseProfiler;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

/// Point-in-time view of accumulated collision tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionSnapshot {
    pub frames: u64,
    pub pairs_tested: u64,
    pub contacts: u64,
}

impl CollisionSnapshot {
    pub fn contacts_per_frame(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.contacts as f64 / self.frames as f64
        }
    }

    pub fn pairs_per_frame(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.pairs_tested as f64 / self.frames as f64
        }
    }
}

/// Charge the wall time of `$body` to `$phase` on `$profiler`.
#[macro_export]
macro_rules! time_phase {
    ($profiler:expr, $phase:expr, $body:expr) => {
        $profiler.time($phase, || $body)
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct PhaseProfiler;

#[cfg(not(feature = "metrics"))]
impl PhaseProfiler {
    pub fn new() -> Self { Self }
    pub fn time<F, R>(&mut self, _phase: Phase, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn record(&mut self, _phase: Phase, _elapsed: std::time::Duration) {}
    pub fn total(&self, _phase: Phase) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn average_ms(&self, _phase: Phase) -> f64 { 0.0 }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct CollisionCounters;

#[cfg(not(feature = "metrics"))]
impl CollisionCounters {
    pub fn new() -> Self { Self }
    pub fn add(&self, _pairs_tested: u64, _contacts: u64) {}
    pub fn end_frame(&self) {}
    pub fn snapshot(&self) -> CollisionSnapshot { CollisionSnapshot::default() }
    pub fn reset(&self) {}
}
