//! Windowless run at a fixed step.

use std::time::Instant;

use anyhow::Result;
use pebble_core::time::HEADLESS_DT;
use pebble_core::{FrameInput, SimConfig, Simulation};
use pebble_metrics::Phase;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessSummary {
    pub frames: u64,
    pub contacts: u64,
    pub max_contacts: u64,
    pub wall_seconds: f64,
}

pub fn run(config: SimConfig, frames: u64) -> Result<HeadlessSummary> {
    let mut sim = Simulation::new(config)?;
    let bounds = sim.initial_bounds();
    let started = Instant::now();

    let mut contacts = 0;
    let mut max_contacts = 0;
    for _ in 0..frames {
        let report = sim.step(FrameInput {
            dt: HEADLESS_DT,
            bounds,
            pointer: None,
        })?;
        contacts += report.collisions.contacts;
        max_contacts = max_contacts.max(report.collisions.contacts);
    }

    let summary = HeadlessSummary {
        frames: sim.frame_index(),
        contacts,
        max_contacts,
        wall_seconds: started.elapsed().as_secs_f64(),
    };

    tracing::info!(
        frames = summary.frames,
        contacts = summary.contacts,
        max_contacts = summary.max_contacts,
        seconds = format!("{:.3}", summary.wall_seconds),
        "headless run finished"
    );
    for phase in Phase::ALL {
        if phase == Phase::Render {
            continue;
        }
        tracing::info!(
            phase = phase.name(),
            avg_ms = format!("{:.3}", sim.profiler().average_ms(phase)),
            "phase timing"
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_requested_frames() {
        let config = SimConfig {
            particle_count: 300,
            arena_width: 200.0,
            arena_height: 150.0,
            threads: 2,
            ..SimConfig::default()
        };
        let summary = run(config, 90).unwrap();
        assert_eq!(summary.frames, 90);
        assert!(summary.max_contacts <= summary.contacts);
    }

    #[test]
    fn test_invalid_config_fails_before_stepping() {
        let config = SimConfig {
            entropy: 1.0,
            ..SimConfig::default()
        };
        assert!(run(config, 10).is_err());
    }
}
