//! Cursor-driven attract/repel force.

use crate::store::ParticleStore;
use glam::Vec2;
use parking_lot::Mutex;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMode {
    Attract,
    Repel,
}

/// Cursor position in arena coordinates plus what the held button does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub position: Vec2,
    pub mode: PointerMode,
}

/// Radial force field around the pointer, falling off as `1 / distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerField {
    pub radius: f32,
    pub strength: f32,
}

impl PointerField {
    /// Acceleration felt at `at` while `pointer` is active.
    #[inline]
    pub fn acceleration(&self, pointer: Pointer, at: Vec2) -> Vec2 {
        let offset = pointer.position - at;
        let distance = offset.length();
        if distance == 0.0 || distance > self.radius {
            return Vec2::ZERO;
        }
        let toward = offset / distance;
        let magnitude = self.strength / distance.max(1.0);
        match pointer.mode {
            PointerMode::Attract => toward * magnitude,
            PointerMode::Repel => -toward * magnitude,
        }
    }

    /// Fold one frame of pointer acceleration into every velocity.
    pub fn apply(&self, store: &mut ParticleStore, pointer: Pointer, dt: f32) {
        if self.radius <= 0.0 || self.strength == 0.0 {
            return;
        }
        let cols = store.columns_mut();
        cols.velocities
            .par_iter_mut()
            .map(Mutex::get_mut)
            .zip(cols.positions.par_iter())
            .for_each(|(velocity, &position)| {
                *velocity += self.acceleration(pointer, position) * dt;
            });
    }
}
