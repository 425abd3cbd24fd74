//! Central error type for terrain mesh generation.

use crate::tile::TileId;

/// Errors surfaced by the terrain pipeline and strategies.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("sample count must be at least 2, got {0}")]
    InvalidSampleCount(usize),

    #[error("wall height must be finite and non-negative, got {0}")]
    InvalidWallHeight(f32),

    #[error("height unavailable at uv ({u}, {v})")]
    HeightUnavailable { u: f32, v: f32 },

    #[error("height source returned {height} at uv ({u}, {v})")]
    NonFiniteHeight { u: f32, v: f32, height: f32 },

    #[error("mesh buffer holds {actual} vertices, expected at least {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("tile {0} is not registered")]
    TileNotRegistered(TileId),
}

/// Result type alias for terrain operations
pub type TerrainResult<T> = Result<T, TerrainError>;
