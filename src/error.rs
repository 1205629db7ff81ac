//! Error types shared by the audio and rendering halves of the engine.

use thiserror::Error;

/// Failures raised while building or tearing down an analysis graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The audio subsystem could not be created or the source could not be wrapped.
    #[error("failed to construct analysis graph: {0}")]
    Construction(String),
    /// A newer bind or release happened while this graph was being built.
    #[error("analysis graph was superseded before it could be committed")]
    Superseded,
    /// Disconnecting a node or closing the output stream failed.
    #[error("failed to disconnect analysis graph: {0}")]
    Disconnect(String),
}

/// Failures raised when a frame needs a drawing surface.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("no drawing surface is mounted")]
    Unavailable,
}
