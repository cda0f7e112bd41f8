//! Initial particle placement.

use crate::config::SimConfig;
use crate::store::{ParticleStore, WHITE};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scatter `config.particle_count` particles over the arena.
///
/// Positions are uniform over `[0, width) x [0, height)`, velocity components
/// are each `-1` or `0`, and every particle falls with `(0, gravity)`. The
/// same seed always produces the same store.
pub fn spawn_particles(config: &SimConfig) -> ParticleStore {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut store = ParticleStore::with_capacity(config.particle_count);
    let gravity = Vec2::new(0.0, config.gravity);

    for _ in 0..config.particle_count {
        let position = Vec2::new(
            rng.gen_range(0.0..config.arena_width),
            rng.gen_range(0.0..config.arena_height),
        );
        let velocity = Vec2::new(
            rng.gen_range(-1i32..=0) as f32,
            rng.gen_range(-1i32..=0) as f32,
        );
        store.push(position, velocity, gravity, config.radius, WHITE);
    }

    tracing::debug!(
        count = store.len(),
        seed = config.seed,
        "spawned particles"
    );
    store
}
