//! Pebble Core
//!
//! Real-time 2D particle simulation:
//! - Structure-of-arrays particle store
//! - Spatial hash grid rebuilt every frame
//! - Semi-implicit Euler integration and arena walls
//! - Parallel pairwise collision resolution under per-particle locks

pub mod config;
pub mod error;
pub mod grid;
pub mod physics;
pub mod sim;
pub mod spawn;
pub mod store;
pub mod time;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use grid::{CellKey, SpatialHashGrid};
pub use physics::{ArenaBounds, CollisionResolver, Pointer, PointerMode};
pub use sim::{FrameInput, FrameReport, RenderView, Simulation};
pub use store::ParticleStore;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
