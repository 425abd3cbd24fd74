//! Skirt walls hanging from the tile perimeter, emitted as submesh 1.
//!
//! Perimeter vertices are duplicated into top/bottom pairs so the walls get
//! their own flat normals and a UV strip stretched along each side. Wall
//! normals are fixed world axes and only hold for unrotated, axis-aligned tiles.
//!
//! Vertex layout after the `N²` surface vertices:
//!
//! ```text
//! north   2N   (top, bottom) pairs, west to east
//! west/e  4N   (west top, west bottom, east top, east bottom) per row
//! south   2N   (top, bottom) pairs, west to east
//! ```

use crate::error::{TerrainError, TerrainResult};
use crate::mesh_buffer::{MeshBuffer, Vec3};

pub const NORTH_WALL_NORMAL: Vec3 = [0.0, 0.0, 1.0];
pub const WEST_WALL_NORMAL: Vec3 = [-1.0, 0.0, 0.0];
pub const EAST_WALL_NORMAL: Vec3 = [1.0, 0.0, 0.0];
pub const SOUTH_WALL_NORMAL: Vec3 = [0.0, 0.0, -1.0];

/// Number of vertices the walls add for a given sample count.
pub fn wall_vertex_count(sample_count: usize) -> usize {
    8 * sample_count
}

/// Replace any existing wall geometry with walls hanging `wall_height` below
/// the current surface perimeter. Submesh 0 is not touched.
pub fn extrude_walls(buffer: &mut MeshBuffer, wall_height: f32) -> TerrainResult<()> {
    let n = buffer.sample_count;
    if n < 2 {
        return Err(TerrainError::InvalidSampleCount(n));
    }
    if !wall_height.is_finite() || wall_height < 0.0 {
        return Err(TerrainError::InvalidWallHeight(wall_height));
    }
    let surface = n * n;
    let available = buffer
        .vertices
        .len()
        .min(buffer.normals.len())
        .min(buffer.uvs.len());
    if available < surface {
        return Err(TerrainError::BufferSizeMismatch {
            expected: surface,
            actual: available,
        });
    }

    buffer.truncate_to_surface();

    let columns = (n - 1) as f32;
    let mut index = surface as u32;

    // North wall
    for i in 0..n - 1 {
        if i == 0 {
            push_pair(buffer, i, NORTH_WALL_NORMAL, 0.0, wall_height);
        }
        push_pair(buffer, i + 1, NORTH_WALL_NORMAL, (i + 1) as f32 / columns, wall_height);

        // 02
        // 13
        buffer.wall_indices.extend_from_slice(&[
            index,
            index + 1,
            index + 2,
            index + 2,
            index + 1,
            index + 3,
        ]);
        index += 2;
    }
    index += 2;

    // West and east walls, one row at a time
    for i in 0..n - 1 {
        if i == 0 {
            push_pair(buffer, 0, WEST_WALL_NORMAL, 0.0, wall_height);
            push_pair(buffer, n - 1, EAST_WALL_NORMAL, 0.0, wall_height);
        }
        let u = (i + 1) as f32 / columns;
        push_pair(buffer, (i + 1) * n, WEST_WALL_NORMAL, u, wall_height);
        push_pair(buffer, (i + 1) * n + n - 1, EAST_WALL_NORMAL, u, wall_height);

        // 10-----23
        // 54-----67
        buffer.wall_indices.extend_from_slice(&[
            index,
            index + 4,
            index + 1,
            index + 4,
            index + 5,
            index + 1,
            index + 2,
            index + 3,
            index + 6,
            index + 6,
            index + 3,
            index + 7,
        ]);
        index += 4;
    }
    index += 4;

    // South wall
    let cc = surface;
    for i in cc - n..cc - 1 {
        if i == cc - n {
            push_pair(buffer, i, SOUTH_WALL_NORMAL, 0.0, wall_height);
        }
        // cc - i counts down along the row, so this is the progress from the west end
        let u = (n - (cc - i) + 1) as f32 / columns;
        push_pair(buffer, i + 1, SOUTH_WALL_NORMAL, u, wall_height);

        buffer.wall_indices.extend_from_slice(&[
            index,
            index + 2,
            index + 1,
            index + 2,
            index + 3,
            index + 1,
        ]);
        index += 2;
    }

    Ok(())
}

/// Clone surface vertex `source` as a wall top and add the bottom below it.
fn push_pair(buffer: &mut MeshBuffer, source: usize, normal: Vec3, u: f32, wall_height: f32) {
    let top = buffer.vertices[source];
    buffer.vertices.push(top);
    buffer.vertices.push([top[0], top[1] - wall_height, top[2]]);
    buffer.normals.push(normal);
    buffer.normals.push(normal);
    buffer.uvs.push([u, 1.0]);
    buffer.uvs.push([u, 0.0]);
}
