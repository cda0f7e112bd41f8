//! Windowed front end: winit event loop driving the simulation and the
//! circle renderer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pebble_core::glam::Vec2;
use pebble_core::time::FrameClock;
use pebble_core::{ArenaBounds, FrameInput, Pointer, PointerMode, Simulation};
use pebble_metrics::{FrameTimer, Phase};
use pebble_render::window::window_attributes;
use pebble_render::wgpu::SurfaceError;
use pebble_render::{CircleRenderer, WindowConfig};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

const REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Mouse state folded into an optional pointer force.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerInput {
    cursor: Option<Vec2>,
    left: bool,
    right: bool,
}

impl PointerInput {
    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = Some(Vec2::new(x as f32, y as f32));
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    pub fn button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Right => self.right = pressed,
            _ => {}
        }
    }

    /// Left attracts, right repels; left wins when both are held.
    pub fn pointer(&self) -> Option<Pointer> {
        let position = self.cursor?;
        let mode = if self.left {
            PointerMode::Attract
        } else if self.right {
            PointerMode::Repel
        } else {
            return None;
        };
        Some(Pointer { position, mode })
    }
}

pub struct App {
    sim: Simulation,
    window_config: WindowConfig,
    window: Option<Arc<Window>>,
    renderer: Option<CircleRenderer>,
    clock: FrameClock,
    input: PointerInput,
    frame_timer: FrameTimer,
    last_report: Instant,
    contacts_since_report: u64,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(sim: Simulation) -> Self {
        let config = sim.config();
        let window_config = WindowConfig::for_arena(config.arena_width, config.arena_height);
        let clock = FrameClock::new(config.max_frame_dt);
        Self {
            sim,
            window_config,
            window: None,
            renderer: None,
            clock,
            input: PointerInput::default(),
            frame_timer: FrameTimer::new(120),
            last_report: Instant::now(),
            contacts_since_report: 0,
            error: None,
        }
    }

    /// Error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop
            .create_window(window_attributes(&self.window_config))
            .context("failed to create window")?;
        let window = Arc::new(window);
        let renderer = pollster::block_on(CircleRenderer::new(window.clone()))
            .context("failed to initialise renderer")?;

        let size = window.inner_size();
        tracing::info!(width = size.width, height = size.height, "window opened");

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.clock = FrameClock::new(self.sim.config().max_frame_dt);
        Ok(())
    }

    fn arena_bounds(&self) -> Option<ArenaBounds> {
        let (width, height) = self.renderer.as_ref()?.size();
        ArenaBounds::new(width as f32, height as f32).ok()
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.frame_timer.begin();
        let dt = self.clock.tick();

        if let Some(bounds) = self.arena_bounds() {
            let input = FrameInput {
                dt,
                bounds,
                pointer: self.input.pointer(),
            };
            match self.sim.step(input) {
                Ok(report) => self.contacts_since_report += report.collisions.contacts,
                Err(err) => tracing::warn!(error = %err, "frame skipped"),
            }
        }

        if let Some(renderer) = &mut self.renderer {
            let started = Instant::now();
            let result = renderer.render(&self.sim.render_view());
            self.sim.profiler_mut().record(Phase::Render, started.elapsed());

            match result {
                Ok(_) => {}
                Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                    renderer.reconfigure();
                }
                Err(SurfaceError::OutOfMemory) => {
                    self.error = Some(anyhow::anyhow!("GPU out of memory"));
                    event_loop.exit();
                }
                Err(err) => tracing::warn!(error = %err, "render failed"),
            }
        }

        self.frame_timer.end();
        self.maybe_report();
    }

    fn maybe_report(&mut self) {
        if self.last_report.elapsed() < REPORT_INTERVAL {
            return;
        }
        self.last_report = Instant::now();

        let (min_ms, max_ms) = self.frame_timer.frame_time_range_ms();
        tracing::info!(
            fps = format!("{:.1}", self.frame_timer.fps()),
            frame_ms = format!("{:.2}", self.frame_timer.frame_time_ms()),
            min_ms = format!("{:.2}", min_ms),
            max_ms = format!("{:.2}", max_ms),
            particles = self.sim.store().len(),
            contacts = self.contacts_since_report,
            "performance"
        );

        let profiler = self.sim.profiler();
        let phases: Vec<String> = Phase::ALL
            .iter()
            .map(|phase| format!("{}={:.2}ms", phase.name(), profiler.average_ms(*phase)))
            .collect();
        tracing::info!(phases = %phases.join(" "), "phase timing");

        self.sim.profiler_mut().reset();
        self.contacts_since_report = 0;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.open_window(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(frames = self.sim.frame_index(), "window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.input.button(button, state),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pointer_without_button() {
        let mut input = PointerInput::default();
        input.cursor_moved(10.0, 20.0);
        assert_eq!(input.pointer(), None);
    }

    #[test]
    fn test_buttons_select_mode() {
        let mut input = PointerInput::default();
        input.cursor_moved(10.0, 20.0);

        input.button(MouseButton::Right, ElementState::Pressed);
        let pointer = input.pointer().unwrap();
        assert_eq!(pointer.mode, PointerMode::Repel);
        assert_eq!(pointer.position, Vec2::new(10.0, 20.0));

        input.button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.pointer().unwrap().mode, PointerMode::Attract);

        input.button(MouseButton::Left, ElementState::Released);
        input.button(MouseButton::Right, ElementState::Released);
        assert_eq!(input.pointer(), None);
    }

    #[test]
    fn test_cursor_leaving_window_drops_pointer() {
        let mut input = PointerInput::default();
        input.cursor_moved(1.0, 1.0);
        input.button(MouseButton::Left, ElementState::Pressed);
        input.cursor_left();
        assert_eq!(input.pointer(), None);
    }
}
