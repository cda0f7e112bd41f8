//! Per-frame physics passes, in pipeline order: pointer force, integration,
//! arena walls, then collisions.

pub mod boundary;
pub mod collision;
pub mod integrator;
pub mod pointer;

pub use boundary::{apply_bounds, reflect, ArenaBounds};
pub use collision::{
    brute_force_pairs, contact_normal, lock_pair, partition, worker_count, CollisionResolver,
    Contact, ResolveStats,
};
pub use integrator::{check_dt, integrate};
pub use pointer::{Pointer, PointerField, PointerMode};
