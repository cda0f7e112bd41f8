use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create render surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no graphics adapter compatible with the window surface")]
    NoAdapter,

    #[error("failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
