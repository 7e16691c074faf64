//! Engine-wide error type
//!
//! Every fallible operation in the crate returns `EngineResult`. None of these errors
//! ever reach the host through the two call-in entry points: they are logged and the
//! engine degrades instead.

use std::path::PathBuf;

/// Errors produced by the weather effect engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("3D drawing context unavailable: {reason}")]
    GraphicsUnavailable { reason: String },

    #[error("invalid surface size {width}x{height}")]
    InvalidSurfaceSize { width: u32, height: u32 },

    #[error("GPU operation '{operation}' failed: {error}")]
    GpuOperationFailed { operation: String, error: String },

    #[error("render surface lost")]
    SurfaceLost,

    #[error("host operation '{operation}' failed: {error}")]
    HostFailed { operation: String, error: String },

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config value '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Result alias used across the crate
pub type EngineResult<T> = Result<T, EngineError>;

/// Helper trait for mapping foreign GPU/host errors into `EngineError`
pub trait GpuErrorContext<T> {
    fn gpu_context(self, operation: &str) -> EngineResult<T>;
}

impl<T, E> GpuErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn gpu_context(self, operation: &str) -> EngineResult<T> {
        self.map_err(|e| gpu_operation_error(operation, e))
    }
}

/// Create a GPU operation error
pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> EngineError {
    EngineError::GpuOperationFailed {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

/// Create a host (window, event loop, DOM) error
pub fn host_error(operation: &str, error: impl std::fmt::Display) -> EngineError {
    EngineError::HostFailed {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

/// Create a graphics-unavailable error
pub fn graphics_unavailable(reason: impl Into<String>) -> EngineError {
    EngineError::GraphicsUnavailable {
        reason: reason.into(),
    }
}
