//! Flat base grid for a tile: positions, up normals, UVs and CCW triangles.

use crate::error::{TerrainError, TerrainResult};
use crate::mesh_buffer::{MeshBuffer, UP};
use crate::tile::TileRect;

pub fn build_grid(rect: &TileRect, sample_count: usize) -> TerrainResult<MeshBuffer> {
    let mut buffer = MeshBuffer::with_capacity(sample_count);
    build_grid_into(&mut buffer, rect, sample_count)?;
    Ok(buffer)
}

/// Build the grid into an existing (possibly reused) buffer.
/// The buffer is cleared first; nothing is written when `sample_count < 2`.
pub fn build_grid_into(
    buffer: &mut MeshBuffer,
    rect: &TileRect,
    sample_count: usize,
) -> TerrainResult<()> {
    if sample_count < 2 {
        return Err(TerrainError::InvalidSampleCount(sample_count));
    }

    buffer.clear();
    buffer.sample_count = sample_count;

    let center = rect.center();
    let scale = rect.tile_scale;
    let step = (sample_count - 1) as f32;

    for y in 0..sample_count {
        let yrat = y as f32 / step;
        for x in 0..sample_count {
            let xrat = x as f32 / step;
            let [gx, gy] = rect.lerp(xrat as f64, yrat as f64);

            buffer.vertices.push([
                ((gx - center[0]) as f32) * scale,
                0.0,
                ((gy - center[1]) as f32) * scale,
            ]);
            buffer.normals.push(UP);
            buffer.uvs.push([xrat, 1.0 - yrat]);
        }
    }

    let n = sample_count as u32;
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let a = y * n + x;
            buffer.surface_indices.extend_from_slice(&[a, a + n + 1, a + n]);
            buffer.surface_indices.extend_from_slice(&[a, a + 1, a + n + 1]);
        }
    }

    Ok(())
}
