//! Per-strategy terrain configuration.

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// Read-only settings shared by every tile of one terrain strategy.
/// Collider, layer and renderer settings are only forwarded to the render host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Grid resolution per tile side; at least 2
    pub sample_count: usize,
    /// Skirt depth below the surface perimeter
    pub wall_height: f32,
    pub side_walls_enabled: bool,
    pub collider_enabled: bool,
    pub add_to_layer: bool,
    pub layer_id: i32,
    pub renderer_enabled: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            sample_count: 10,
            wall_height: 10.0,
            side_walls_enabled: false,
            collider_enabled: false,
            add_to_layer: false,
            layer_id: 0,
            renderer_enabled: true,
        }
    }
}

impl TerrainConfig {
    pub fn new(sample_count: usize) -> Self {
        Self {
            sample_count,
            ..Self::default()
        }
    }

    pub fn with_side_walls(mut self, wall_height: f32) -> Self {
        self.side_walls_enabled = true;
        self.wall_height = wall_height;
        self
    }

    pub fn with_collider(mut self, enabled: bool) -> Self {
        self.collider_enabled = enabled;
        self
    }

    pub fn with_layer(mut self, layer_id: i32) -> Self {
        self.add_to_layer = true;
        self.layer_id = layer_id;
        self
    }

    pub fn validate(&self) -> TerrainResult<()> {
        if self.sample_count < 2 {
            return Err(TerrainError::InvalidSampleCount(self.sample_count));
        }
        if !self.wall_height.is_finite() || self.wall_height < 0.0 {
            return Err(TerrainError::InvalidWallHeight(self.wall_height));
        }
        Ok(())
    }

    pub fn surface_vertex_count(&self) -> usize {
        self.sample_count * self.sample_count
    }
}
