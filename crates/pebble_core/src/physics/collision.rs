//! Parallel pairwise collision resolution over the spatial hash.
//!
//! Each frame the occupied cells are snapshotted in key order and split into
//! one contiguous chunk per worker before any velocity is touched. A worker
//! walks its cells, testing every pair inside a cell and every pair between
//! the cell and its 8 neighbors. Cross-cell pairs are only tested from the
//! cell holding the lower particle index, so every unordered pair is visited
//! exactly once per frame even though both cells scan each other.
//!
//! Positions are shared read-only. Velocity rows are updated in place under
//! their per-particle locks; a pair is always locked lowest index first.

use crate::error::{Result, SimError};
use crate::grid::{Bucket, SpatialHashGrid};
use crate::store::ParticleStore;
use glam::Vec2;
use parking_lot::{Mutex, MutexGuard};
use pebble_metrics::CollisionCounters;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// Worker count used when the platform cannot report its parallelism.
pub const FALLBACK_WORKERS: usize = 4;

/// An overlapping pair and the unit normal pointing from `i` toward `j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub i: usize,
    pub j: usize,
    pub normal: Vec2,
}

impl Contact {
    /// The pair with the lower index first.
    #[inline]
    pub fn ordered_pair(&self) -> (usize, usize) {
        (self.i.min(self.j), self.i.max(self.j))
    }
}

/// Tallies from one resolver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub cells: usize,
    pub pairs_tested: u64,
    pub contacts: u64,
}

/// `requested` workers, or hardware concurrency when `requested` is zero.
pub fn worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    match std::thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(err) => {
            tracing::debug!(%err, fallback = FALLBACK_WORKERS, "hardware concurrency unavailable");
            FALLBACK_WORKERS
        }
    }
}

/// Split `len` items into `parts` contiguous ranges whose sizes differ by at
/// most one; the first `len % parts` ranges get the extra item.
pub fn partition(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = len / parts;
    let extra = len % parts;
    let mut start = 0;
    (0..parts)
        .map(|t| {
            let count = base + usize::from(t < extra);
            let range = start..start + count;
            start += count;
            range
        })
        .collect()
}

/// Unit normal from `pi` to `pj` when the two discs overlap.
///
/// Overlap is strict: discs exactly `reach` apart do not collide. Coincident
/// centres are treated as a fixed 0.1 separation along +x, so the normal is +x.
#[inline]
pub fn contact_normal(pi: Vec2, pj: Vec2, reach: f32) -> Option<Vec2> {
    let delta = pj - pi;
    let dist2 = delta.length_squared();
    if dist2 >= reach * reach {
        return None;
    }
    let distance = dist2.sqrt();
    if distance == 0.0 {
        return Some(Vec2::X);
    }
    Some(delta / distance)
}

/// Lock two distinct velocity rows, always taking the lower index first.
/// Guards come back in `(i, j)` order regardless.
pub fn lock_pair(
    cells: &[Mutex<Vec2>],
    i: usize,
    j: usize,
) -> (MutexGuard<'_, Vec2>, MutexGuard<'_, Vec2>) {
    assert_ne!(i, j, "particle {i} paired with itself");
    if i < j {
        let gi = cells[i].lock();
        let gj = cells[j].lock();
        (gi, gj)
    } else {
        let gj = cells[j].lock();
        let gi = cells[i].lock();
        (gi, gj)
    }
}

/// Exchange the normal component of the relative velocity, scaled by `keep`
/// (`1 - entropy`). Reads and writes both rows inside one critical section.
pub fn apply_impulse(velocities: &[Mutex<Vec2>], contact: Contact, keep: f32) {
    let (mut vi, mut vj) = lock_pair(velocities, contact.i, contact.j);
    let rel = (*vi - *vj).dot(contact.normal);
    let impulse = contact.normal * (rel * keep);
    *vi -= impulse;
    *vj += impulse;
}

#[inline]
fn test_pair(i: usize, j: usize, positions: &[Vec2], radii: &[f32]) -> Option<Contact> {
    contact_normal(positions[i], positions[j], radii[i] + radii[j])
        .map(|normal| Contact { i, j, normal })
}

/// Visit every candidate pair owned by `cells`, reporting overlaps to
/// `on_contact`. Returns the number of pairs tested.
fn scan_cells<F>(
    grid: &SpatialHashGrid,
    cells: &[Bucket<'_>],
    positions: &[Vec2],
    radii: &[f32],
    mut on_contact: F,
) -> u64
where
    F: FnMut(Contact),
{
    let mut tested = 0u64;
    for bucket in cells {
        let members = bucket.indices;

        for (a, &i) in members.iter().enumerate() {
            for &j in &members[a + 1..] {
                tested += 1;
                if let Some(contact) = test_pair(i, j, positions, radii) {
                    on_contact(contact);
                }
            }
        }

        for key in bucket.key.adjacent() {
            let Some(others) = grid.bucket(key) else {
                continue;
            };
            for &i in members {
                for &j in others {
                    // The neighbor scanning back toward us sees j < i and skips.
                    if i < j {
                        tested += 1;
                        if let Some(contact) = test_pair(i, j, positions, radii) {
                            on_contact(contact);
                        }
                    }
                }
            }
        }
    }
    tested
}

/// Owns the collision worker pool and damping factor.
pub struct CollisionResolver {
    pool: ThreadPool,
    threads: usize,
    entropy: f32,
    counters: CollisionCounters,
}

impl CollisionResolver {
    /// Build a resolver with `threads` workers (`0` = hardware concurrency).
    pub fn new(threads: usize, entropy: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&entropy) {
            return Err(SimError::InvalidEntropy(entropy));
        }
        let threads = worker_count(threads);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pebble-collide-{i}"))
            .build()?;
        tracing::debug!(threads, entropy, "collision worker pool ready");
        Ok(Self {
            pool,
            threads,
            entropy,
            counters: CollisionCounters::new(),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn entropy(&self) -> f32 {
        self.entropy
    }

    /// Run `op` on the resolver's workers, so rayon calls inside it use this
    /// pool rather than the global one.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Running totals across every `resolve` call.
    pub fn counters(&self) -> &CollisionCounters {
        &self.counters
    }

    /// Resolve all overlaps for this frame, mutating velocities in place.
    /// Returns once every worker has finished its chunk.
    pub fn resolve(&self, grid: &SpatialHashGrid, store: &ParticleStore) -> ResolveStats {
        let buckets = grid.buckets_snapshot();
        let chunks = partition(buckets.len(), self.threads);
        let positions = store.positions();
        let radii = store.radii();
        let velocities = store.velocity_cells();
        let keep = 1.0 - self.entropy;

        let tested = AtomicU64::new(0);
        let contacts = AtomicU64::new(0);

        self.pool.scope(|scope| {
            for range in chunks.into_iter().filter(|r| !r.is_empty()) {
                let cells = &buckets[range];
                let (tested, contacts, counters) = (&tested, &contacts, &self.counters);
                scope.spawn(move |_| {
                    let mut resolved = 0u64;
                    let scanned = scan_cells(grid, cells, positions, radii, |contact| {
                        apply_impulse(velocities, contact, keep);
                        resolved += 1;
                    });
                    tested.fetch_add(scanned, Ordering::Relaxed);
                    contacts.fetch_add(resolved, Ordering::Relaxed);
                    counters.add(scanned, resolved);
                });
            }
        });
        self.counters.end_frame();

        let stats = ResolveStats {
            cells: buckets.len(),
            pairs_tested: tested.into_inner(),
            contacts: contacts.into_inner(),
        };
        tracing::trace!(
            cells = stats.cells,
            pairs = stats.pairs_tested,
            contacts = stats.contacts,
            "collision pass"
        );
        stats
    }

    /// Run the same partitioned traversal as [`resolve`](Self::resolve)
    /// without touching velocities, returning every contact found.
    pub fn detect(&self, grid: &SpatialHashGrid, store: &ParticleStore) -> Vec<Contact> {
        let buckets = grid.buckets_snapshot();
        let chunks = partition(buckets.len(), self.threads);
        let positions = store.positions();
        let radii = store.radii();

        let per_chunk: Vec<Vec<Contact>> = self.pool.install(|| {
            chunks
                .into_par_iter()
                .map(|range| {
                    let mut found = Vec::new();
                    scan_cells(grid, &buckets[range], positions, radii, |c| found.push(c));
                    found
                })
                .collect()
        });
        per_chunk.into_iter().flatten().collect()
    }
}

/// Every overlapping pair by exhaustive comparison, lower index first.
/// Quadratic; meant for checking the grid path.
pub fn brute_force_pairs(positions: &[Vec2], radii: &[f32]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if contact_normal(positions[i], positions[j], radii[i] + radii[j]).is_some() {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WHITE;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn store_from(particles: &[(Vec2, Vec2, f32)]) -> ParticleStore {
        let mut store = ParticleStore::with_capacity(particles.len());
        for &(p, v, r) in particles {
            store.push(p, v, Vec2::ZERO, r, WHITE);
        }
        store
    }

    fn random_store(n: usize, extent: f32, radius: f32, seed: u64) -> ParticleStore {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut store = ParticleStore::with_capacity(n);
        for _ in 0..n {
            let p = Vec2::new(rng.gen_range(0.0..extent), rng.gen_range(0.0..extent));
            let v = Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            store.push(p, v, Vec2::ZERO, radius, WHITE);
        }
        store
    }

    fn sorted_pairs(contacts: &[Contact]) -> Vec<(usize, usize)> {
        let mut pairs: Vec<_> = contacts.iter().map(Contact::ordered_pair).collect();
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn test_partition_spreads_remainder_to_front() {
        assert_eq!(partition(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(partition(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
        assert_eq!(partition(0, 2), vec![0..0, 0..0]);
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_worker_count_honours_request() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }

    #[test]
    fn test_rejects_entropy_outside_unit_interval() {
        assert!(matches!(CollisionResolver::new(1, 1.0), Err(SimError::InvalidEntropy(_))));
        assert!(matches!(CollisionResolver::new(1, -0.1), Err(SimError::InvalidEntropy(_))));
        assert!(CollisionResolver::new(1, f32::NAN).is_err());
    }

    #[test]
    fn test_contact_normal() {
        assert_eq!(
            contact_normal(Vec2::ZERO, Vec2::new(0.0, 1.0), 2.0),
            Some(Vec2::new(0.0, 1.0))
        );
        // exactly touching is not a contact
        assert_eq!(contact_normal(Vec2::ZERO, Vec2::new(2.0, 0.0), 2.0), None);
        assert_eq!(contact_normal(Vec2::ZERO, Vec2::new(3.0, 3.0), 2.0), None);
        assert_eq!(contact_normal(Vec2::ONE, Vec2::ONE, 2.0), Some(Vec2::X));
    }

    #[test]
    fn test_lock_pair_returns_guards_in_argument_order() {
        let cells = vec![Mutex::new(Vec2::X), Mutex::new(Vec2::Y)];
        let (a, b) = lock_pair(&cells, 1, 0);
        assert_eq!((*a, *b), (Vec2::Y, Vec2::X));
    }

    #[test]
    fn test_opposing_lock_orders_do_not_deadlock() {
        let cells = Arc::new(vec![Mutex::new(Vec2::ZERO), Mutex::new(Vec2::ZERO)]);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cells = Arc::clone(&cells);
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        let (i, j) = if t % 2 == 0 { (0, 1) } else { (1, 0) };
                        let (mut a, mut b) = lock_pair(&cells, i, j);
                        a.x += 1.0;
                        b.x += 1.0;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cells[0].lock().x, 40_000.0);
        assert_eq!(cells[1].lock().x, 40_000.0);
    }

    #[test]
    fn test_head_on_pair_swaps_velocities() {
        let store = store_from(&[
            (Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 1.0),
            (Vec2::new(1.5, 0.0), Vec2::new(-1.0, 0.0), 1.0),
        ]);
        let mut grid = SpatialHashGrid::new(2.0).unwrap();
        grid.rebuild(store.positions());
        let resolver = CollisionResolver::new(1, 0.0).unwrap();

        let stats = resolver.resolve(&grid, &store);
        assert_eq!(stats.contacts, 1);
        assert_eq!(store.velocity(0), Vec2::new(-1.0, 0.0));
        assert_eq!(store.velocity(1), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_elastic_exchange_negates_normal_velocity() {
        let normal = Vec2::new(1.0, 1.0).normalize();
        let cells = vec![Mutex::new(Vec2::new(3.0, -1.0)), Mutex::new(Vec2::new(-2.0, 0.5))];
        let before = (*cells[0].lock() - *cells[1].lock()).dot(normal);

        apply_impulse(&cells, Contact { i: 0, j: 1, normal }, 1.0);
        let after = (*cells[0].lock() - *cells[1].lock()).dot(normal);
        assert!((after + before).abs() < 1e-5, "before {before}, after {after}");
    }

    #[test]
    fn test_entropy_shrinks_normal_velocity() {
        let normal = Vec2::new(0.6, 0.8);
        let cells = vec![Mutex::new(Vec2::new(4.0, 1.0)), Mutex::new(Vec2::new(-1.0, -2.0))];
        let before = (*cells[0].lock() - *cells[1].lock()).dot(normal);

        apply_impulse(&cells, Contact { i: 0, j: 1, normal }, 1.0 - 0.3);
        let after = (*cells[0].lock() - *cells[1].lock()).dot(normal);
        assert!(after.abs() < before.abs());
    }

    #[test]
    fn test_coincident_particles_stay_finite() {
        let store = store_from(&[
            (Vec2::new(5.0, 5.0), Vec2::new(2.0, -1.0), 1.0),
            (Vec2::new(5.0, 5.0), Vec2::new(-3.0, 4.0), 1.0),
        ]);
        let mut grid = SpatialHashGrid::new(2.0).unwrap();
        grid.rebuild(store.positions());
        let resolver = CollisionResolver::new(2, 0.01).unwrap();

        let stats = resolver.resolve(&grid, &store);
        assert_eq!(stats.contacts, 1);
        assert!(store.velocity(0).is_finite());
        assert!(store.velocity(1).is_finite());
        // only the x components were exchanged along the fallback normal
        assert_eq!(store.velocity(0).y, -1.0);
        assert_eq!(store.velocity(1).y, 4.0);
    }

    #[test]
    fn test_every_pair_visited_once_and_matches_brute_force() {
        let store = random_store(1000, 200.0, 2.0, 7);
        let mut grid = SpatialHashGrid::new(4.0).unwrap();
        grid.rebuild(store.positions());
        let resolver = CollisionResolver::new(4, 0.0).unwrap();

        let found = sorted_pairs(&resolver.detect(&grid, &store));
        let mut deduped = found.clone();
        deduped.dedup();
        assert_eq!(found, deduped, "a pair was reported twice");
        assert_eq!(found, brute_force_pairs(store.positions(), store.radii()));
        assert!(!found.is_empty());
    }

    #[test]
    fn test_detected_pairs_do_not_depend_on_thread_count() {
        let store = random_store(1000, 150.0, 2.0, 99);
        let mut grid = SpatialHashGrid::new(4.0).unwrap();
        grid.rebuild(store.positions());

        let single = CollisionResolver::new(1, 0.0).unwrap();
        let many = CollisionResolver::new(8, 0.0).unwrap();
        assert_eq!(
            sorted_pairs(&single.detect(&grid, &store)),
            sorted_pairs(&many.detect(&grid, &store))
        );
    }

    #[test]
    fn test_resolve_reports_and_accumulates_counts() {
        let store = random_store(300, 60.0, 2.0, 3);
        let mut grid = SpatialHashGrid::new(4.0).unwrap();
        grid.rebuild(store.positions());
        let resolver = CollisionResolver::new(3, 0.0).unwrap();

        let expected = brute_force_pairs(store.positions(), store.radii()).len() as u64;
        let stats = resolver.resolve(&grid, &store);
        assert_eq!(stats.contacts, expected);
        assert_eq!(stats.cells, grid.occupied_cells());
        assert!(stats.pairs_tested >= stats.contacts);
        for v in store.velocities() {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_install_runs_on_owned_pool() {
        let resolver = CollisionResolver::new(3, 0.0).unwrap();
        assert_eq!(resolver.install(rayon::current_num_threads), 3);
        assert!(resolver.install(|| rayon::current_thread_index().is_some()));
    }

    #[test]
    fn test_far_out_particles_resolve_without_overflow() {
        let store = store_from(&[
            (Vec2::new(1e12, 1e12), Vec2::new(1.0, 0.0), 1.0),
            (Vec2::new(1e12, 1e12), Vec2::new(-1.0, 0.0), 1.0),
            (Vec2::new(-1e12, -1e12), Vec2::ZERO, 1.0),
        ]);
        let mut grid = SpatialHashGrid::new(1e-3).unwrap();
        grid.rebuild(store.positions());
        let resolver = CollisionResolver::new(2, 0.0).unwrap();

        let stats = resolver.resolve(&grid, &store);
        assert_eq!(stats.contacts, 1);
        assert_eq!(store.velocity(0), Vec2::new(-1.0, 0.0));
        assert_eq!(store.velocity(1), Vec2::new(1.0, 0.0));
        assert_eq!(
            sorted_pairs(&resolver.detect(&grid, &store)),
            brute_force_pairs(store.positions(), store.radii())
        );
    }
}
