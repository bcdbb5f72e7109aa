/// Error types for mesh loading and geometry
use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the rendering core
#[derive(Debug, Error)]
pub enum Error {
    /// The mesh source could not be turned into a mesh
    #[error("Failed to load mesh: {0}")]
    Load(#[from] LoadError),

    /// Geometry or projection parameters were degenerate
    #[error("Degenerate geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// I/O failure outside of mesh loading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a mesh description
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A face referenced a vertex that is not (yet) in the vertex table
    #[error("line {line}: face index {index} out of range (vertex table holds {vertices})")]
    FaceIndexOutOfRange {
        line: usize,
        index: i64,
        vertices: usize,
    },

    /// A `v` line without three coordinates or an `f` line without exactly three indices
    #[error("line {line}: malformed '{directive}' directive")]
    Malformed { line: usize, directive: String },
}

/// Degenerate input that would otherwise put NaN or infinity into the frame
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,

    /// Clip edge is zero-length or parallel to the clip plane
    #[error("clip edge does not cross the plane")]
    ZeroLengthEdge,

    #[error("depth range requires 0 < near < far (near = {near}, far = {far})")]
    InvalidDepthRange { near: f32, far: f32 },

    #[error("field of view must lie in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("aspect ratio must be finite and positive, got {0}")]
    InvalidAspect(f32),

    #[error("viewport must be at least 1x1 cells")]
    EmptyViewport,
}
