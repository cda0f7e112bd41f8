use thiserror::Error;

/// Result alias used across the simulation core.
pub type Result<T> = std::result::Result<T, SimError>;

/// Configuration and per-frame input errors.
///
/// All of these are fatal for whatever they guard: a bad config aborts
/// simulation start, a bad frame input aborts that frame before any buffer
/// is touched.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("particle count must be positive")]
    InvalidParticleCount,

    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),

    #[error("particle radius must be finite and positive, got {0}")]
    InvalidRadius(f32),

    #[error("entropy must lie in [0, 1), got {0}")]
    InvalidEntropy(f32),

    #[error("frame dt must be finite and non-negative, got {0}")]
    InvalidTimeStep(f32),

    #[error("arena bounds must be finite and positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("failed to build collision worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to parse config")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_offending_value() {
        let msg = SimError::InvalidTimeStep(-0.5).to_string();
        assert!(msg.contains("-0.5"));

        let msg = SimError::InvalidBounds {
            width: 0.0,
            height: 600.0,
        }
        .to_string();
        assert!(msg.contains("0x600"));
    }
}
