//! Startup configuration
//!
//! Fixed for the lifetime of a [`Simulation`](crate::Simulation); nothing
//! here is hot-reloaded.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Simulation parameters. Missing JSON fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub particle_count: usize,
    pub radius: f32,
    /// Width of one grid cell. Must be at least `2 * radius` or contacts
    /// between particles two cells apart go unseen.
    pub cell_size: f32,
    /// Downward (+y) acceleration applied to every particle.
    pub gravity: f32,
    /// Fraction of each impulse lost to damping, in `[0, 1)`.
    pub entropy: f32,
    pub arena_width: f32,
    pub arena_height: f32,
    /// Worker threads shared by every parallel pass; `0` means hardware
    /// concurrency.
    pub threads: usize,
    pub seed: u64,
    pub pointer_radius: f32,
    pub pointer_force: f32,
    /// Upper bound on a single frame's dt, in seconds.
    pub max_frame_dt: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            radius: 5.0,
            cell_size: 10.0,
            gravity: 1000.0,
            entropy: 0.01,
            arena_width: 1200.0,
            arena_height: 800.0,
            threads: 0,
            seed: 0x5eed,
            pointer_radius: 100.0,
            pointer_force: 100_000.0,
            max_frame_dt: 0.05,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            return Err(SimError::InvalidParticleCount);
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(SimError::InvalidCellSize(self.cell_size));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SimError::InvalidRadius(self.radius));
        }
        if !(0.0..1.0).contains(&self.entropy) {
            return Err(SimError::InvalidEntropy(self.entropy));
        }
        if !(self.arena_width.is_finite()
            && self.arena_height.is_finite()
            && self.arena_width > 0.0
            && self.arena_height > 0.0)
        {
            return Err(SimError::InvalidBounds {
                width: self.arena_width,
                height: self.arena_height,
            });
        }
        if !self.gravity.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.pointer_radius.is_finite() && self.pointer_radius >= 0.0)
            || !self.pointer_force.is_finite()
        {
            return Err(SimError::InvalidParameter(
                "pointer radius and force must be finite, radius non-negative".into(),
            ));
        }
        if !(self.max_frame_dt.is_finite() && self.max_frame_dt > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "max_frame_dt must be finite and positive, got {}",
                self.max_frame_dt
            )));
        }

        if self.cell_size < 2.0 * self.radius {
            tracing::warn!(
                cell_size = self.cell_size,
                radius = self.radius,
                "cell size is smaller than a particle diameter; some contacts will be missed"
            );
        }
        Ok(())
    }
}
