//! Accumulated wall time per frame phase

use crate::Phase;
use std::time::{Duration, Instant};

pub struct PhaseProfiler {
    totals: [Duration; Phase::COUNT],
    samples: [u32; Phase::COUNT],
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self {
            totals: [Duration::ZERO; Phase::COUNT],
            samples: [0; Phase::COUNT],
        }
    }

    /// Run `f`, charging its wall time to `phase`.
    pub fn time<F, R>(&mut self, phase: Phase, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(phase, start.elapsed());
        result
    }

    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        self.totals[phase.index()] += elapsed;
        self.samples[phase.index()] += 1;
    }

    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase.index()]
    }

    pub fn average_ms(&self, phase: Phase) -> f64 {
        let n = self.samples[phase.index()];
        if n == 0 {
            return 0.0;
        }
        self.totals[phase.index()].as_secs_f64() * 1000.0 / n as f64
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, Duration)> + '_ {
        Phase::ALL.iter().map(move |&p| (p, self.totals[p.index()]))
    }
}

impl Default for PhaseProfiler {
    fn default() -> Self {
        Self::new()
    }
}
