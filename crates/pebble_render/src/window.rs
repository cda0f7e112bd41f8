//! Window management
//!
//! Cross-platform window creation via winit

use winit::{
    error::EventLoopError,
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Pebble".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

impl WindowConfig {
    /// Size the window to the simulation arena. Fractional extents round up.
    pub fn for_arena(width: f32, height: f32) -> Self {
        Self {
            width: width.ceil().max(1.0) as u32,
            height: height.ceil().max(1.0) as u32,
            ..Self::default()
        }
    }
}

/// Create window attributes from config
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height))
}

/// Event loop that polls continuously; the simulation redraws every pass.
pub fn create_event_loop() -> Result<EventLoop<()>, EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    Ok(event_loop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_arena_defaults() {
        let config = WindowConfig::default();
        assert_eq!((config.width, config.height), (1200, 800));
        assert_eq!(config.title, "Pebble");
    }

    #[test]
    fn test_for_arena_rounds_up() {
        let config = WindowConfig::for_arena(640.2, 479.9);
        assert_eq!((config.width, config.height), (641, 480));
    }

    #[test]
    fn test_for_arena_never_zero() {
        let config = WindowConfig::for_arena(0.0, -3.0);
        assert_eq!((config.width, config.height), (1, 1));
    }
}
