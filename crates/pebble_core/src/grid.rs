//! Spatial hash grid for per-frame contact candidate lookup.
//!
//! Positions are bucketed into uniform square cells keyed by floor-divided
//! coordinates. The grid is a derived index: it is cleared and refilled from
//! the store every frame and never patched incrementally. Only occupied
//! cells take memory.

use crate::error::{Result, SimError};
use glam::Vec2;
use std::collections::HashMap;

/// Grid cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing `position` for cells of width `cell_size`.
    #[inline]
    pub fn of(position: Vec2, cell_size: f32) -> Self {
        Self::new(
            (position.x / cell_size).floor() as i32,
            (position.y / cell_size).floor() as i32,
        )
    }

    /// The cell `(dx, dy)` away, or `None` past the edge of the key space.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> Option<CellKey> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// The 3x3 block centred on this cell, self included. Cells at the edge
    /// of the `i32` key space have fewer neighbors; no key is repeated.
    pub fn neighbors(&self) -> impl Iterator<Item = CellKey> {
        let center = *self;
        (-1..=1).flat_map(move |dy| (-1..=1).filter_map(move |dx| center.offset(dx, dy)))
    }

    /// The surrounding cells, self excluded.
    pub fn adjacent(&self) -> impl Iterator<Item = CellKey> {
        let center = *self;
        self.neighbors().filter(move |k| *k != center)
    }

    /// True when `other` lies in this cell's 3x3 block.
    #[inline]
    pub fn is_neighbor(&self, other: CellKey) -> bool {
        (i64::from(self.x) - i64::from(other.x)).abs() <= 1
            && (i64::from(self.y) - i64::from(other.y)).abs() <= 1
    }
}

/// Free-function form of [`CellKey::neighbors`].
pub fn neighbors_of(key: CellKey) -> impl Iterator<Item = CellKey> {
    key.neighbors()
}

/// One occupied cell in a frame snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'a> {
    pub key: CellKey,
    pub indices: &'a [usize],
}

/// Occupancy summary for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    pub occupied_cells: usize,
    pub particles: usize,
    pub largest_bucket: usize,
}

/// Uniform spatial hash over particle indices.
pub struct SpatialHashGrid {
    cell_size: f32,
    /// Map from cell coordinates to particle indices in insertion order.
    cells: HashMap<CellKey, Vec<usize>>,
    /// Emptied buckets kept for reuse on the next rebuild.
    spare: Vec<Vec<usize>>,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SimError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            spare: Vec::new(),
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn key_of(&self, position: Vec2) -> CellKey {
        CellKey::of(position, self.cell_size)
    }

    /// Drop every bucket's contents, keeping the allocations around.
    pub fn clear(&mut self) {
        for (_, mut bucket) in self.cells.drain() {
            bucket.clear();
            self.spare.push(bucket);
        }
    }

    /// Append `index` to the bucket covering `position`.
    pub fn insert(&mut self, index: usize, position: Vec2) {
        let key = self.key_of(position);
        let spare = &mut self.spare;
        self.cells
            .entry(key)
            .or_insert_with(|| spare.pop().unwrap_or_default())
            .push(index);
    }

    /// Clear and re-insert every position, in index order.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        self.clear();
        for (index, &position) in positions.iter().enumerate() {
            self.insert(index, position);
        }
    }

    pub fn bucket(&self, key: CellKey) -> Option<&[usize]> {
        self.cells.get(&key).map(Vec::as_slice)
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of inserted indices across all buckets.
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every occupied cell, sorted by key.
    ///
    /// The order is stable for a given set of positions, so a partition of
    /// this list is reproducible frame to frame and across thread counts.
    pub fn buckets_snapshot(&self) -> Vec<Bucket<'_>> {
        let mut buckets: Vec<Bucket<'_>> = self
            .cells
            .iter()
            .map(|(&key, indices)| Bucket {
                key,
                indices: indices.as_slice(),
            })
            .collect();
        buckets.sort_unstable_by_key(|b| b.key);
        buckets
    }

    pub fn stats(&self) -> GridStats {
        GridStats {
            occupied_cells: self.cells.len(),
            particles: self.len(),
            largest_bucket: self.cells.values().map(Vec::len).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_uses_floor_division() {
        assert_eq!(CellKey::of(Vec2::new(0.0, 0.0), 10.0), CellKey::new(0, 0));
        assert_eq!(CellKey::of(Vec2::new(9.99, 10.0), 10.0), CellKey::new(0, 1));
        assert_eq!(CellKey::of(Vec2::new(-0.1, -10.0), 10.0), CellKey::new(-1, -1));
        assert_eq!(CellKey::of(Vec2::new(-10.1, 25.0), 10.0), CellKey::new(-2, 2));
    }

    #[test]
    fn test_neighborhood_is_3x3_with_self() {
        let key = CellKey::new(4, -2);
        let block: Vec<_> = neighbors_of(key).collect();
        assert_eq!(block.len(), 9);
        assert!(block.contains(&key));
        for &other in &block {
            assert!(key.is_neighbor(other));
        }
        let adjacent: Vec<_> = key.adjacent().collect();
        assert_eq!(adjacent.len(), 8);
        assert!(!adjacent.contains(&key));
        assert!(!key.is_neighbor(CellKey::new(6, -2)));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(matches!(SpatialHashGrid::new(0.0), Err(SimError::InvalidCellSize(_))));
        assert!(matches!(SpatialHashGrid::new(-1.0), Err(SimError::InvalidCellSize(_))));
        assert!(SpatialHashGrid::new(f32::NAN).is_err());
    }

    #[test]
    fn test_insert_groups_by_cell() {
        let mut grid = SpatialHashGrid::new(10.0).unwrap();
        grid.insert(0, Vec2::new(1.0, 1.0));
        grid.insert(1, Vec2::new(15.0, 1.0));
        grid.insert(2, Vec2::new(2.0, 8.0));

        assert_eq!(grid.occupied_cells(), 2);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.bucket(CellKey::new(0, 0)), Some(&[0, 2][..]));
        assert_eq!(grid.bucket(CellKey::new(1, 0)), Some(&[1][..]));
        assert_eq!(grid.bucket(CellKey::new(5, 5)), None);
    }

    #[test]
    fn test_rebuild_replaces_previous_frame() {
        let mut grid = SpatialHashGrid::new(10.0).unwrap();
        grid.rebuild(&[Vec2::new(1.0, 1.0), Vec2::new(55.0, 55.0)]);
        assert_eq!(grid.occupied_cells(), 2);

        grid.rebuild(&[Vec2::new(31.0, 2.0)]);
        assert_eq!(grid.occupied_cells(), 1);
        assert_eq!(grid.bucket(CellKey::new(3, 0)), Some(&[0][..]));
        assert_eq!(grid.bucket(CellKey::new(5, 5)), None);

        grid.clear();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_snapshot_is_sorted_and_complete() {
        let mut grid = SpatialHashGrid::new(1.0).unwrap();
        let positions: Vec<Vec2> = (0..50)
            .map(|i| Vec2::new(((i * 7) % 13) as f32, ((i * 3) % 5) as f32))
            .collect();
        grid.rebuild(&positions);

        let snapshot = grid.buckets_snapshot();
        assert_eq!(snapshot.len(), grid.occupied_cells());
        assert!(snapshot.windows(2).all(|w| w[0].key < w[1].key));
        let total: usize = snapshot.iter().map(|b| b.indices.len()).sum();
        assert_eq!(total, positions.len());

        let stats = grid.stats();
        assert_eq!(stats.particles, 50);
        assert_eq!(stats.occupied_cells, snapshot.len());
        assert!(stats.largest_bucket >= 1);
    }

    #[test]
    fn test_touching_pairs_share_a_neighborhood_when_cell_fits_radius_sum() {
        // Radius sum 10, cell 10: any pair within reach sits in adjacent cells.
        let radius = 5.0;
        let cell = 2.0 * radius;
        let grid = SpatialHashGrid::new(cell).unwrap();
        for step in 0..200 {
            let a = Vec2::new(step as f32 * 0.37, step as f32 * 0.11);
            for angle in 0..16 {
                let theta = angle as f32 * std::f32::consts::TAU / 16.0;
                let b = a + Vec2::new(theta.cos(), theta.sin()) * (2.0 * radius * 0.9999);
                assert!(
                    grid.key_of(a).is_neighbor(grid.key_of(b)),
                    "{a:?} and {b:?} fell outside each other's neighborhood"
                );
            }
        }
    }

    #[test]
    fn test_cell_smaller_than_radius_sum_misses_pairs() {
        // Cell one unit below the radius sum: a touching pair can land two cells apart.
        let radius_sum = 10.0;
        let grid = SpatialHashGrid::new(radius_sum - 1.0).unwrap();
        let a = Vec2::new(8.5, 0.0);
        let b = Vec2::new(18.5, 0.0);
        assert!((b - a).length() <= radius_sum);
        assert!(!grid.key_of(a).is_neighbor(grid.key_of(b)));
    }

    #[test]
    fn test_edge_of_key_space_has_no_duplicate_neighbors() {
        let corner = CellKey::new(i32::MAX, i32::MIN);
        let mut block: Vec<_> = corner.neighbors().collect();
        assert_eq!(block.len(), 4);
        block.sort_unstable();
        block.dedup();
        assert_eq!(block.len(), 4);
        assert_eq!(corner.adjacent().count(), 3);

        let far_side = CellKey::new(i32::MIN, i32::MAX);
        assert!(!corner.is_neighbor(far_side));
        assert!(corner.is_neighbor(CellKey::new(i32::MAX - 1, i32::MIN + 1)));
    }

    #[test]
    fn test_far_out_positions_clamp_to_edge_cell() {
        let mut grid = SpatialHashGrid::new(1e-3).unwrap();
        grid.rebuild(&[Vec2::new(1e12, 1e12), Vec2::new(-1e12, 1e12)]);
        assert_eq!(grid.bucket(CellKey::new(i32::MAX, i32::MAX)), Some(&[0][..]));
        assert_eq!(grid.bucket(CellKey::new(i32::MIN, i32::MAX)), Some(&[1][..]));
    }
}
