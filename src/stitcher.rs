//! Edge and corner stitching against already-registered neighbor meshes.
//!
//! For every neighbor present in the registry, the facing boundary of this
//! tile takes the neighbor's height (local X/Z are kept) and its normal
//! wholesale. Corners run after edges and win where both touch a vertex.
//! Missing neighbors are skipped; their seam closes when they register and
//! this tile is re-stitched.

use log::trace;

use crate::error::{TerrainError, TerrainResult};
use crate::mesh_buffer::{MeshBuffer, Vec3};
use crate::registry::TileMeshRegistry;
use crate::tile::{Direction, TileId};

/// Number of shared vertices along the boundary facing `direction`.
pub fn boundary_len(direction: Direction, sample_count: usize) -> usize {
    if direction.is_corner() {
        1
    } else {
        sample_count
    }
}

/// `(local, neighbor)` vertex indices of the `i`-th shared boundary vertex.
pub fn boundary_pair(direction: Direction, sample_count: usize, i: usize) -> (usize, usize) {
    let n = sample_count;
    let last_row = n * n - n;
    match direction {
        Direction::North => (i, last_row + i),
        Direction::South => (last_row + i, i),
        Direction::West => (i * n, i * n + n - 1),
        Direction::East => (i * n + n - 1, i * n),
        Direction::NorthWest => (0, n * n - 1),
        Direction::NorthEast => (n - 1, last_row),
        Direction::SouthWest => (last_row, n - 1),
        Direction::SouthEast => (n * n - 1, 0),
    }
}

/// Which neighbors contributed to a stitch, one bit per direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StitchReport(u8);

impl StitchReport {
    fn bit(direction: Direction) -> u8 {
        let slot = Direction::ALL
            .iter()
            .position(|d| *d == direction)
            .unwrap_or_default();
        1 << slot
    }

    fn insert(&mut self, direction: Direction) {
        self.0 |= Self::bit(direction);
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

#[derive(Clone, Copy, Debug)]
struct StitchWrite {
    index: usize,
    height: f32,
    normal: Vec3,
}

/// Boundary values read from the registry, ready to be written into a buffer.
/// Gathering borrows the registry only for the duration of the read, so the
/// plan can be applied to a mesh that lives in the same registry.
#[derive(Clone, Debug, Default)]
pub struct StitchPlan {
    sample_count: usize,
    writes: Vec<StitchWrite>,
    pub report: StitchReport,
}

impl StitchPlan {
    pub fn gather(
        tile_id: TileId,
        sample_count: usize,
        registry: &TileMeshRegistry,
    ) -> TerrainResult<Self> {
        if sample_count < 2 {
            return Err(TerrainError::InvalidSampleCount(sample_count));
        }
        let expected = sample_count * sample_count;
        let mut plan = StitchPlan {
            sample_count,
            writes: Vec::new(),
            report: StitchReport::default(),
        };

        for (direction, neighbor_id) in tile_id.neighbors() {
            let Some(neighbor) = registry.lookup(neighbor_id) else {
                continue;
            };
            let available = neighbor.vertices.len().min(neighbor.normals.len());
            if neighbor.sample_count != sample_count || available < expected {
                return Err(TerrainError::BufferSizeMismatch {
                    expected,
                    actual: available,
                });
            }

            for i in 0..boundary_len(direction, sample_count) {
                let (local, remote) = boundary_pair(direction, sample_count, i);
                plan.writes.push(StitchWrite {
                    index: local,
                    height: neighbor.vertices[remote][1],
                    normal: neighbor.normals[remote],
                });
            }
            plan.report.insert(direction);
            trace!("[stitch] {} <- {:?} neighbor {}", tile_id, direction, neighbor_id);
        }

        Ok(plan)
    }

    pub fn apply(&self, buffer: &mut MeshBuffer) -> TerrainResult<()> {
        let expected = self.sample_count * self.sample_count;
        let available = buffer.vertices.len().min(buffer.normals.len());
        if buffer.sample_count != self.sample_count || available < expected {
            return Err(TerrainError::BufferSizeMismatch {
                expected,
                actual: available,
            });
        }

        for write in &self.writes {
            buffer.vertices[write.index][1] = write.height;
            buffer.normals[write.index] = write.normal;
        }
        Ok(())
    }
}

/// Overwrite this tile's boundary with values from every registered neighbor.
pub fn stitch(
    buffer: &mut MeshBuffer,
    tile_id: TileId,
    registry: &TileMeshRegistry,
) -> TerrainResult<StitchReport> {
    let plan = StitchPlan::gather(tile_id, buffer.sample_count, registry)?;
    plan.apply(buffer)?;
    Ok(plan.report)
}
