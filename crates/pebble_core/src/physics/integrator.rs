//! Semi-implicit Euler integration over the whole store.

use crate::error::{Result, SimError};
use crate::store::{axpy, ParticleStore};
use parking_lot::Mutex;
use rayon::prelude::*;

/// Reject a frame dt that is negative, NaN or infinite.
pub fn check_dt(dt: f32) -> Result<f32> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(dt)
    } else {
        Err(SimError::InvalidTimeStep(dt))
    }
}

/// Advance every particle by `dt` seconds.
///
/// Positions move with the velocities from the start of the frame, then
/// velocities pick up the constant acceleration. The order is fixed.
pub fn integrate(store: &mut ParticleStore, dt: f32) -> Result<()> {
    let dt = check_dt(dt)?;
    let cols = store.columns_mut();

    // position += dt * velocity
    axpy(
        dt,
        cols.velocities.par_iter_mut().map(|v| *v.get_mut()),
        cols.positions.par_iter_mut(),
    );
    // velocity += dt * acceleration
    axpy(
        dt,
        cols.accelerations.par_iter().copied(),
        cols.velocities.par_iter_mut().map(Mutex::get_mut),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WHITE;
    use glam::Vec2;

    #[test]
    fn test_position_uses_previous_velocity() {
        let mut store = ParticleStore::new();
        store.push(Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(0.0, 10.0), 1.0, WHITE);

        integrate(&mut store, 0.5).unwrap();
        // y stays 0: gravity only reaches position on the following frame
        assert_eq!(store.position(0), Vec2::new(1.0, 0.0));
        assert_eq!(store.velocity(0), Vec2::new(2.0, 5.0));

        integrate(&mut store, 0.5).unwrap();
        assert_eq!(store.position(0), Vec2::new(2.0, 2.5));
        assert_eq!(store.velocity(0), Vec2::new(2.0, 10.0));
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let mut store = ParticleStore::new();
        store.push(Vec2::new(3.0, 4.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1000.0), 1.0, WHITE);
        integrate(&mut store, 0.0).unwrap();
        assert_eq!(store.position(0), Vec2::new(3.0, 4.0));
        assert_eq!(store.velocity(0), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_invalid_dt_leaves_state_untouched() {
        let mut store = ParticleStore::new();
        store.push(Vec2::ZERO, Vec2::ONE, Vec2::Y, 1.0, WHITE);

        for dt in [-0.01, f32::NAN, f32::INFINITY] {
            assert!(matches!(integrate(&mut store, dt), Err(SimError::InvalidTimeStep(_))));
        }
        assert_eq!(store.position(0), Vec2::ZERO);
        assert_eq!(store.velocity(0), Vec2::ONE);
    }
}
