//! Height displacement: sample elevation per grid vertex and zero the normals
//! ready for accumulation.

use log::warn;

use crate::error::{TerrainError, TerrainResult};
use crate::mesh_buffer::{MeshBuffer, UP, ZERO};

/// Elevation lookup for one tile in normalized tile coordinates.
///
/// `u` runs west to east and `v` south to north, both in `[0, 1]`, matching
/// the grid UVs. Must be synchronous and free of side effects. Return `None`
/// when the elevation is unavailable; the tile then fails to register instead
/// of being built with made-up heights.
pub trait HeightSource {
    fn query_height(&self, u: f32, v: f32) -> Option<f32>;
}

impl<F> HeightSource for F
where
    F: Fn(f32, f32) -> Option<f32>,
{
    fn query_height(&self, u: f32, v: f32) -> Option<f32> {
        self(u, v)
    }
}

/// Same elevation everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantHeight(pub f32);

impl HeightSource for ConstantHeight {
    fn query_height(&self, _u: f32, _v: f32) -> Option<f32> {
        Some(self.0)
    }
}

pub fn displace(buffer: &mut MeshBuffer, heights: &dyn HeightSource) -> TerrainResult<()> {
    let n = buffer.sample_count;
    let expected = n * n;
    if n < 2 {
        return Err(TerrainError::InvalidSampleCount(n));
    }
    if buffer.vertices.len() < expected || buffer.normals.len() < expected {
        return Err(TerrainError::BufferSizeMismatch {
            expected,
            actual: buffer.vertices.len().min(buffer.normals.len()),
        });
    }

    let step = (n - 1) as f32;
    for y in 0..n {
        let v = 1.0 - y as f32 / step;
        for x in 0..n {
            let u = x as f32 / step;
            let height = sample(heights, u, v)?;

            let i = y * n + x;
            buffer.vertices[i][1] = height;
            buffer.normals[i] = ZERO;
        }
    }

    Ok(())
}

fn sample(heights: &dyn HeightSource, u: f32, v: f32) -> TerrainResult<f32> {
    match heights.query_height(u, v) {
        Some(height) if height.is_finite() => Ok(height),
        Some(height) => {
            warn!("[displace] non-finite height {} at uv ({}, {})", height, u, v);
            Err(TerrainError::NonFiniteHeight { u, v, height })
        }
        None => {
            warn!("[displace] height unavailable at uv ({}, {})", u, v);
            Err(TerrainError::HeightUnavailable { u, v })
        }
    }
}

/// Flatten the surface grid back to `y = 0` with up normals.
/// Wall geometry is left alone; callers rebuild it afterwards.
pub fn reset_to_flat(buffer: &mut MeshBuffer) {
    let surface = buffer.surface_vertex_count().min(buffer.vertices.len());
    for vertex in &mut buffer.vertices[..surface] {
        vertex[1] = 0.0;
    }
    for normal in buffer.normals.iter_mut().take(surface) {
        *normal = UP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_builder::build_grid;
    use crate::tile::TileRect;

    fn grid(n: usize) -> MeshBuffer {
        build_grid(&TileRect::new([0.0, 1.0], [1.0, 0.0], 1.0), n).unwrap()
    }

    #[test]
    fn test_constant_height_sets_every_vertex() {
        let mut buffer = grid(5);
        displace(&mut buffer, &ConstantHeight(12.5)).unwrap();

        assert!(buffer.vertices.iter().all(|v| v[1] == 12.5));
        assert!(buffer.normals.iter().all(|n| *n == ZERO));
    }

    #[test]
    fn test_samples_with_grid_uv_convention() {
        let mut buffer = grid(3);
        // Encode (u, v) into the height so each vertex shows what it was asked for
        let heights = |u: f32, v: f32| Some(u * 10.0 + v);
        displace(&mut buffer, &heights).unwrap();

        for i in 0..buffer.vertex_count() {
            let uv = buffer.uvs[i];
            assert_eq!(
                buffer.vertices[i][1],
                uv[0] * 10.0 + uv[1],
                "vertex {} should be sampled at its own UV",
                i
            );
        }
        assert_eq!(buffer.vertices[0][1], 1.0);
        assert_eq!(buffer.vertices[8][1], 10.0);
    }

    #[test]
    fn test_keeps_xz() {
        let mut buffer = grid(4);
        let before = buffer.vertices.clone();
        displace(&mut buffer, &ConstantHeight(-3.0)).unwrap();

        for (a, b) in before.iter().zip(&buffer.vertices) {
            assert_eq!(a[0], b[0]);
            assert_eq!(a[2], b[2]);
        }
    }

    #[test]
    fn test_unavailable_height_fails() {
        let mut buffer = grid(3);
        let heights = |u: f32, _v: f32| if u > 0.9 { None } else { Some(1.0) };

        let err = displace(&mut buffer, &heights).unwrap_err();
        assert!(matches!(err, TerrainError::HeightUnavailable { u, .. } if u == 1.0));
    }

    #[test]
    fn test_nan_height_fails() {
        let mut buffer = grid(3);
        let err = displace(&mut buffer, &ConstantHeight(f32::NAN)).unwrap_err();
        assert!(matches!(err, TerrainError::NonFiniteHeight { .. }));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let mut buffer = grid(3);
        buffer.vertices.truncate(4);
        let err = displace(&mut buffer, &ConstantHeight(0.0)).unwrap_err();
        assert_eq!(
            err,
            TerrainError::BufferSizeMismatch {
                expected: 9,
                actual: 4
            }
        );
    }

    #[test]
    fn test_reset_to_flat() {
        let mut buffer = grid(3);
        displace(&mut buffer, &ConstantHeight(7.0)).unwrap();
        reset_to_flat(&mut buffer);

        assert!(buffer.vertices.iter().all(|v| v[1] == 0.0));
        assert!(buffer.normals.iter().all(|n| *n == UP));
    }
}
