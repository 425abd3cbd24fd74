//! Per-tile mesh arrays shared by every pipeline stage.
//!
//! Vertex `y * sample_count + x` is always grid position `(x, y)`; wall
//! vertices, when present, follow the `sample_count²` surface vertices.
//! A buffer reused as scratch must be copied out (`clone`/`clone_from`)
//! before the next `clear()`.

pub type Vec3 = [f32; 3];
pub type Vec2 = [f32; 2];

pub const UP: Vec3 = [0.0, 1.0, 0.0];
pub const ZERO: Vec3 = [0.0, 0.0, 0.0];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    pub sample_count: usize,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Submesh 0: the terrain surface
    pub surface_indices: Vec<u32>,
    /// Submesh 1: side walls, empty when walls are disabled
    pub wall_indices: Vec<u32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sized for a tile with walls, so the scratch buffer never regrows.
    pub fn with_capacity(sample_count: usize) -> Self {
        let vertex_count = sample_count * sample_count + 8 * sample_count;
        let cells = sample_count.saturating_sub(1);
        Self {
            sample_count,
            vertices: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            surface_indices: Vec::with_capacity(cells * cells * 6),
            wall_indices: Vec::with_capacity(cells * 24),
        }
    }

    /// Empty every array, keeping allocations.
    pub fn clear(&mut self) {
        self.sample_count = 0;
        self.vertices.clear();
        self.normals.clear();
        self.uvs.clear();
        self.surface_indices.clear();
        self.wall_indices.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn surface_vertex_count(&self) -> usize {
        self.sample_count * self.sample_count
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.sample_count + x
    }

    pub fn has_walls(&self) -> bool {
        !self.wall_indices.is_empty()
    }

    pub fn submesh_count(&self) -> usize {
        if self.has_walls() {
            2
        } else {
            1
        }
    }

    pub fn submesh(&self, submesh: usize) -> Option<&[u32]> {
        match submesh {
            0 => Some(&self.surface_indices),
            1 if self.has_walls() => Some(&self.wall_indices),
            _ => None,
        }
    }

    pub fn triangle_count(&self, submesh: usize) -> usize {
        self.submesh(submesh).map_or(0, |indices| indices.len() / 3)
    }

    /// Drop wall vertices and indices, leaving only the surface grid.
    pub fn truncate_to_surface(&mut self) {
        let surface = self.surface_vertex_count();
        self.vertices.truncate(surface);
        self.normals.truncate(surface);
        self.uvs.truncate(surface);
        self.wall_indices.clear();
    }
}

// Vector math helpers
#[inline]
pub(crate) fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn add_assign(a: &mut Vec3, b: Vec3) {
    a[0] += b[0];
    a[1] += b[1];
    a[2] += b[2];
}

#[inline]
pub(crate) fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn length(v: Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Epsilon for near-zero length checks (appropriate for f32 precision)
const NORMAL_EPSILON: f32 = 1e-6;

/// Unit vector, or world up for degenerate input.
pub fn normalize(v: Vec3) -> Vec3 {
    let len = length(v);
    if len > NORMAL_EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        UP
    }
}
