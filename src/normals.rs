//! Per-vertex normal accumulation over the surface triangles.
//!
//! Face normals are raw cross products, so larger faces weigh more. The sums
//! are left unnormalized; stitching may still overwrite boundary normals, and
//! consumers normalize at the point of use.

use crate::error::{TerrainError, TerrainResult};
use crate::mesh_buffer::{add_assign, cross, sub, MeshBuffer};

pub fn accumulate_normals(buffer: &mut MeshBuffer) -> TerrainResult<()> {
    let vertex_count = buffer.vertices.len().min(buffer.normals.len());
    if let Some(&highest) = buffer.surface_indices.iter().max() {
        if highest as usize >= vertex_count {
            return Err(TerrainError::BufferSizeMismatch {
                expected: highest as usize + 1,
                actual: vertex_count,
            });
        }
    }

    for tri in buffer.surface_indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);

        let va = buffer.vertices[a];
        let face = cross(sub(buffer.vertices[b], va), sub(buffer.vertices[c], va));

        add_assign(&mut buffer.normals[a], face);
        add_assign(&mut buffer.normals[b], face);
        add_assign(&mut buffer.normals[c], face);
    }
    Ok(())
}
