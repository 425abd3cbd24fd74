//! Terrain tile meshes for a tiled map renderer.
//!
//! Each tile becomes a displaced grid surface, optionally skirted with side
//! walls, and its edges and corners are stitched to up to eight already
//! loaded neighbors so no cracks show between tiles.

pub mod config;
pub mod debug_log;
pub mod displacement;
pub mod error;
pub mod grid_builder;
pub mod mesh_buffer;
pub mod mesh_worker;
pub mod noise_field;
pub mod normals;
pub mod registry;
pub mod side_walls;
pub mod stitcher;
pub mod terrain_strategy;
pub mod tile;

pub use config::TerrainConfig;
pub use displacement::{ConstantHeight, HeightSource};
pub use error::{TerrainError, TerrainResult};
pub use mesh_buffer::MeshBuffer;
pub use mesh_worker::{build_surface, SurfaceRequest, SurfaceResult, SurfaceWorkerPool};
pub use noise_field::{NoiseField, TileNoiseHeights};
pub use registry::TileMeshRegistry;
pub use stitcher::StitchReport;
pub use terrain_strategy::{
    create_strategy, ElevatedTerrainStrategy, FlatTerrainStrategy, MaterialSlot,
    RenderDescriptor, TerrainStrategy, TerrainStrategyKind,
};
pub use tile::{Direction, TileId, TileRect};
