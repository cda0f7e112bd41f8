//! Arena walls.

use crate::error::{Result, SimError};
use crate::store::ParticleStore;
use glam::Vec2;
use rayon::prelude::*;

/// Size of the rectangular arena `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
}

impl ArenaBounds {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        let bounds = Self { width, height };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
        {
            Ok(())
        } else {
            Err(SimError::InvalidBounds {
                width: self.width,
                height: self.height,
            })
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Keep one axis inside `[radius, extent - radius]`, turning the velocity
/// component inward when the particle reached a wall.
#[inline]
fn reflect_axis(pos: &mut f32, vel: &mut f32, radius: f32, extent: f32) {
    if extent < 2.0 * radius {
        *pos = extent * 0.5;
        *vel = 0.0;
    } else if *pos - radius < 0.0 {
        *pos = radius;
        *vel = vel.abs();
    } else if *pos + radius > extent {
        *pos = extent - radius;
        *vel = -vel.abs();
    }
}

/// Clamp one particle back inside the arena and reflect its velocity off
/// whichever walls it crossed.
pub fn reflect(position: &mut Vec2, velocity: &mut Vec2, radius: f32, bounds: ArenaBounds) {
    reflect_axis(&mut position.x, &mut velocity.x, radius, bounds.width);
    reflect_axis(&mut position.y, &mut velocity.y, radius, bounds.height);
}

/// Apply [`reflect`] to every particle.
pub fn apply_bounds(store: &mut ParticleStore, bounds: ArenaBounds) {
    let cols = store.columns_mut();
    cols.positions
        .par_iter_mut()
        .zip(cols.velocities.par_iter_mut())
        .zip(cols.radii.par_iter())
        .for_each(|((position, velocity), &radius)| {
            reflect(position, velocity.get_mut(), radius, bounds);
        });
}
