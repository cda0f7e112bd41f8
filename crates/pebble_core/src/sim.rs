//! Frame driver
//!
//! Owns every piece of simulation state and runs the per-frame pipeline:
//! pointer force, integration, arena walls, grid rebuild, collisions.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::grid::{GridStats, SpatialHashGrid};
use crate::physics::{
    apply_bounds, check_dt, integrate, ArenaBounds, CollisionResolver, Pointer, PointerField,
    ResolveStats,
};
use crate::spawn::spawn_particles;
use crate::store::{ParticleStore, Rgba};
use glam::Vec2;
use pebble_metrics::{time_phase, CollisionSnapshot, Phase, PhaseProfiler};

/// Everything the outside world hands the simulation for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Current arena size (usually the window's inner size).
    pub bounds: ArenaBounds,
    pub pointer: Option<Pointer>,
}

/// Summary of one completed frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub grid: GridStats,
    pub collisions: ResolveStats,
}

/// Read-only per-particle data for drawing.
#[derive(Clone, Copy)]
pub struct RenderView<'a> {
    pub positions: &'a [Vec2],
    pub radii: &'a [f32],
    pub colors: &'a [Rgba],
}

impl<'a> RenderView<'a> {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vec2, f32, Rgba)> + 'a {
        let (positions, radii, colors) = (self.positions, self.radii, self.colors);
        positions
            .iter()
            .zip(radii)
            .zip(colors)
            .map(|((&p, &r), &c)| (p, r, c))
    }
}

pub struct Simulation {
    config: SimConfig,
    store: ParticleStore,
    grid: SpatialHashGrid,
    resolver: CollisionResolver,
    pointer_field: PointerField,
    profiler: PhaseProfiler,
    frame_index: u64,
}

impl Simulation {
    /// Validate `config` and scatter its particles over the arena.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let store = spawn_particles(&config);
        Self::build(config, store)
    }

    /// Run `config`'s pipeline over a prepared store. The config's particle
    /// count, radius and seed are ignored in favour of the store's rows.
    pub fn from_store(config: SimConfig, store: ParticleStore) -> Result<Self> {
        config.validate()?;
        if store.is_empty() {
            return Err(SimError::InvalidParticleCount);
        }
        Self::build(config, store)
    }

    fn build(config: SimConfig, store: ParticleStore) -> Result<Self> {
        let grid = SpatialHashGrid::new(config.cell_size)?;
        let resolver = CollisionResolver::new(config.threads, config.entropy)?;

        let widest = 2.0 * store.max_radius();
        if config.cell_size < widest {
            tracing::warn!(
                cell_size = config.cell_size,
                widest_pair = widest,
                "largest radius sum exceeds cell size"
            );
        }

        tracing::info!(
            particles = store.len(),
            threads = resolver.threads(),
            cell_size = config.cell_size,
            entropy = config.entropy,
            "simulation ready"
        );

        Ok(Self {
            pointer_field: PointerField {
                radius: config.pointer_radius,
                strength: config.pointer_force,
            },
            config,
            store,
            grid,
            resolver,
            profiler: PhaseProfiler::new(),
            frame_index: 0,
        })
    }

    /// Advance one frame.
    ///
    /// A bad `dt` or bounds value fails the frame before any state changes.
    pub fn step(&mut self, input: FrameInput) -> Result<FrameReport> {
        let dt = check_dt(input.dt)?;
        input.bounds.validate()?;

        // Every parallel pass runs on the resolver's pool, sized by `threads`.
        let pool = &self.resolver;
        if let Some(pointer) = input.pointer {
            time_phase!(
                self.profiler,
                Phase::Pointer,
                pool.install(|| self.pointer_field.apply(&mut self.store, pointer, dt))
            );
        }
        time_phase!(
            self.profiler,
            Phase::Integrate,
            pool.install(|| integrate(&mut self.store, dt))
        )?;
        time_phase!(
            self.profiler,
            Phase::Boundary,
            pool.install(|| apply_bounds(&mut self.store, input.bounds))
        );
        time_phase!(
            self.profiler,
            Phase::GridRebuild,
            self.grid.rebuild(self.store.positions())
        );
        let collisions = time_phase!(
            self.profiler,
            Phase::Collide,
            self.resolver.resolve(&self.grid, &self.store)
        );

        self.frame_index += 1;
        let report = FrameReport {
            frame: self.frame_index,
            dt,
            grid: self.grid.stats(),
            collisions,
        };
        tracing::trace!(
            frame = report.frame,
            dt,
            cells = report.grid.occupied_cells,
            contacts = collisions.contacts,
            "frame done"
        );
        Ok(report)
    }

    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            positions: self.store.positions(),
            radii: self.store.radii(),
            colors: self.store.colors(),
        }
    }

    /// Arena size from the config, for callers without a window.
    pub fn initial_bounds(&self) -> ArenaBounds {
        ArenaBounds {
            width: self.config.arena_width,
            height: self.config.arena_height,
        }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    pub fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    pub fn profiler(&self) -> &PhaseProfiler {
        &self.profiler
    }

    pub fn profiler_mut(&mut self) -> &mut PhaseProfiler {
        &mut self.profiler
    }

    pub fn collision_totals(&self) -> CollisionSnapshot {
        self.resolver.counters().snapshot()
    }
}
