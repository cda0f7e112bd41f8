//! Structure-of-arrays particle storage
//!
//! One contiguous buffer per attribute, indexed by the particle's stable
//! integer handle in `[0, len)`. Rows are appended once at startup and never
//! removed. Velocity rows carry their own lock so the collision pass can
//! mutate them from several workers while positions stay shared read-only.

use glam::Vec2;
use parking_lot::Mutex;
use rayon::prelude::*;

/// Straight RGBA8 color.
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];

#[derive(Default)]
pub struct ParticleStore {
    positions: Vec<Vec2>,
    velocities: Vec<Mutex<Vec2>>,
    accelerations: Vec<Vec2>,
    radii: Vec<f32>,
    colors: Vec<Rgba>,
}

/// Disjoint borrow of every buffer for bulk passes.
pub struct ColumnsMut<'a> {
    pub positions: &'a mut [Vec2],
    pub velocities: &'a mut [Mutex<Vec2>],
    pub accelerations: &'a [Vec2],
    pub radii: &'a [f32],
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            accelerations: Vec::with_capacity(capacity),
            radii: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Append a particle row, returning its index.
    pub fn push(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        acceleration: Vec2,
        radius: f32,
        color: Rgba,
    ) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        self.velocities.push(Mutex::new(velocity));
        self.accelerations.push(acceleration);
        self.radii.push(radius);
        self.colors.push(color);
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec2 {
        self.positions[i]
    }

    /// Locks row `i` briefly; do not call while holding that row's lock.
    #[inline]
    pub fn velocity(&self, i: usize) -> Vec2 {
        *self.velocities[i].lock()
    }

    #[inline]
    pub fn acceleration(&self, i: usize) -> Vec2 {
        self.accelerations[i]
    }

    #[inline]
    pub fn radius(&self, i: usize) -> f32 {
        self.radii[i]
    }

    #[inline]
    pub fn color(&self, i: usize) -> Rgba {
        self.colors[i]
    }

    #[inline]
    pub fn set_position(&mut self, i: usize, position: Vec2) {
        self.positions[i] = position;
    }

    #[inline]
    pub fn set_velocity(&mut self, i: usize, velocity: Vec2) {
        *self.velocities[i].get_mut() = velocity;
    }

    #[inline]
    pub fn set_acceleration(&mut self, i: usize, acceleration: Vec2) {
        self.accelerations[i] = acceleration;
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Lock-guarded velocity rows, shared with collision workers.
    pub fn velocity_cells(&self) -> &[Mutex<Vec2>] {
        &self.velocities
    }

    pub fn accelerations(&self) -> &[Vec2] {
        &self.accelerations
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Copy of every velocity, in index order.
    pub fn velocities(&self) -> Vec<Vec2> {
        self.velocities.iter().map(|v| *v.lock()).collect()
    }

    /// Largest radius in the store, or zero when empty.
    pub fn max_radius(&self) -> f32 {
        self.radii.iter().copied().fold(0.0, f32::max)
    }

    pub fn columns_mut(&mut self) -> ColumnsMut<'_> {
        ColumnsMut {
            positions: &mut self.positions,
            velocities: &mut self.velocities,
            accelerations: &self.accelerations,
            radii: &self.radii,
        }
    }
}

/// `y += alpha * x`, elementwise over two equally long buffers.
pub fn axpy<'a, X, Y>(alpha: f32, x: X, y: Y)
where
    X: IndexedParallelIterator<Item = Vec2>,
    Y: IndexedParallelIterator<Item = &'a mut Vec2>,
{
    debug_assert_eq!(x.len(), y.len(), "axpy buffers differ in length");
    y.zip(x).for_each(|(y, x)| *y += alpha * x);
}
