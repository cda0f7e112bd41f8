//! Pebble Render
//!
//! Window setup and an instanced circle renderer for the particle arena.

pub mod circle;
pub mod error;
pub mod window;

pub use circle::{build_instances, CircleInstance, CircleRenderer};
pub use error::RenderError;
pub use window::WindowConfig;

pub use wgpu;
pub use winit;
