//! Tile registration strategies.
//!
//! A strategy owns the registry and one scratch buffer. Every registration
//! runs the whole pipeline into the scratch buffer and only then copies the
//! result into the registry, so a failed registration commits nothing.
//! Calls must be serialized by the host; none of this is `Sync`.

use log::{debug, warn};

use crate::config::TerrainConfig;
use crate::displacement::{displace, reset_to_flat, HeightSource};
use crate::error::{TerrainError, TerrainResult};
use crate::grid_builder::build_grid_into;
use crate::mesh_buffer::MeshBuffer;
use crate::mesh_worker::SurfaceResult;
use crate::normals::accumulate_normals;
use crate::registry::TileMeshRegistry;
use crate::side_walls::extrude_walls;
use crate::stitcher::{stitch, StitchPlan, StitchReport};
use crate::tile::{TileId, TileRect};

/// Material slot per submesh, in submesh order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialSlot {
    Base,
    Wall,
}

/// What the render host needs to present a tile mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderDescriptor {
    pub materials: Vec<MaterialSlot>,
    /// Submesh used as collider geometry
    pub collider_submesh: Option<usize>,
    pub layer: Option<i32>,
    pub renderer_enabled: bool,
}

impl RenderDescriptor {
    pub fn from_config(config: &TerrainConfig) -> Self {
        let mut materials = vec![MaterialSlot::Base];
        if config.side_walls_enabled {
            materials.push(MaterialSlot::Wall);
        }
        Self {
            materials,
            collider_submesh: config.collider_enabled.then_some(0),
            layer: config.add_to_layer.then_some(config.layer_id),
            renderer_enabled: config.renderer_enabled,
        }
    }
}

pub trait TerrainStrategy {
    fn config(&self) -> &TerrainConfig;

    /// Build, stitch and commit a tile. Re-registering a loaded tile
    /// regenerates its live mesh.
    fn register_tile(
        &mut self,
        tile_id: TileId,
        rect: &TileRect,
        heights: &dyn HeightSource,
    ) -> TerrainResult<&MeshBuffer>;

    fn unregister_tile(&mut self, tile_id: TileId) -> bool;

    fn tile_mesh(&self, tile_id: TileId) -> Option<&MeshBuffer>;

    fn render_descriptor(&self) -> RenderDescriptor {
        RenderDescriptor::from_config(self.config())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainStrategyKind {
    Flat,
    Elevated,
}

pub fn create_strategy(
    kind: TerrainStrategyKind,
    config: TerrainConfig,
) -> TerrainResult<Box<dyn TerrainStrategy>> {
    Ok(match kind {
        TerrainStrategyKind::Flat => Box::new(FlatTerrainStrategy::new(config)?),
        TerrainStrategyKind::Elevated => Box::new(ElevatedTerrainStrategy::new(config)?),
    })
}

/// Copy the finished scratch buffer into the registry, overwriting the live
/// entry when the tile is already loaded.
fn commit(
    registry: &mut TileMeshRegistry,
    tile_id: TileId,
    scratch: &MeshBuffer,
) -> TerrainResult<()> {
    match registry.lookup_mut(tile_id) {
        Some(live) => live.clone_from(scratch),
        None => {
            registry.register(tile_id, scratch.clone());
        }
    }
    Ok(())
}

fn committed(registry: &TileMeshRegistry, tile_id: TileId) -> TerrainResult<&MeshBuffer> {
    registry
        .lookup(tile_id)
        .ok_or(TerrainError::TileNotRegistered(tile_id))
}

/// Height-mapped tiles stitched against their registered neighbors.
pub struct ElevatedTerrainStrategy {
    config: TerrainConfig,
    registry: TileMeshRegistry,
    scratch: MeshBuffer,
}

impl ElevatedTerrainStrategy {
    pub fn new(config: TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        Ok(Self {
            scratch: MeshBuffer::with_capacity(config.sample_count),
            registry: TileMeshRegistry::new(),
            config,
        })
    }

    pub fn registry(&self) -> &TileMeshRegistry {
        &self.registry
    }

    /// Stitch the scratch surface against the registry, extrude walls and commit.
    fn finish_scratch(&mut self, tile_id: TileId) -> TerrainResult<&MeshBuffer> {
        let report = stitch(&mut self.scratch, tile_id, &self.registry)?;
        if self.config.side_walls_enabled {
            extrude_walls(&mut self.scratch, self.config.wall_height)?;
        }
        commit(&mut self.registry, tile_id, &self.scratch)?;
        debug!(
            "[elevated] committed {} ({} vertices, stitched {} directions)",
            tile_id,
            self.scratch.vertex_count(),
            report.count()
        );
        committed(&self.registry, tile_id)
    }

    /// Re-stitch a loaded tile in place against the current registry.
    pub fn restitch_tile(&mut self, tile_id: TileId) -> TerrainResult<StitchReport> {
        let sample_count = self.config.sample_count;
        let plan = StitchPlan::gather(tile_id, sample_count, &self.registry)?;
        let live = self
            .registry
            .lookup_mut(tile_id)
            .ok_or(TerrainError::TileNotRegistered(tile_id))?;

        plan.apply(live)?;
        if self.config.side_walls_enabled {
            extrude_walls(live, self.config.wall_height)?;
        }
        Ok(plan.report)
    }

    /// Re-stitch every loaded neighbor of `tile_id`, typically right after it
    /// arrives. Returns how many neighbors were updated.
    pub fn restitch_neighbors(&mut self, tile_id: TileId) -> usize {
        let mut updated = 0;
        for (_, neighbor_id) in tile_id.neighbors() {
            if !self.registry.contains(neighbor_id) {
                continue;
            }
            match self.restitch_tile(neighbor_id) {
                Ok(_) => updated += 1,
                Err(e) => warn!("[elevated] restitch of {} failed: {}", neighbor_id, e),
            }
        }
        updated
    }

    /// Stitch, extrude and commit a surface built off-thread.
    pub fn commit_surface(&mut self, result: SurfaceResult) -> TerrainResult<&MeshBuffer> {
        let tile_id = result.tile_id;
        let surface = result.surface.map_err(|e| {
            warn!("[elevated] surface for {} failed: {}", tile_id, e);
            e
        })?;

        let n = self.config.sample_count;
        if surface.sample_count != n || surface.vertex_count() != n * n {
            return Err(TerrainError::BufferSizeMismatch {
                expected: n * n,
                actual: surface.vertex_count(),
            });
        }

        self.scratch = surface;
        self.finish_scratch(tile_id)
    }

    /// Drop a loaded tile back to zero elevation.
    pub fn flatten_tile(&mut self, tile_id: TileId) -> TerrainResult<()> {
        let live = self
            .registry
            .lookup_mut(tile_id)
            .ok_or(TerrainError::TileNotRegistered(tile_id))?;

        reset_to_flat(live);
        if self.config.side_walls_enabled {
            extrude_walls(live, self.config.wall_height)?;
        }
        debug!("[elevated] flattened {}", tile_id);
        Ok(())
    }
}

impl TerrainStrategy for ElevatedTerrainStrategy {
    fn config(&self) -> &TerrainConfig {
        &self.config
    }

    fn register_tile(
        &mut self,
        tile_id: TileId,
        rect: &TileRect,
        heights: &dyn HeightSource,
    ) -> TerrainResult<&MeshBuffer> {
        build_grid_into(&mut self.scratch, rect, self.config.sample_count)?;
        if let Err(e) = displace(&mut self.scratch, heights) {
            warn!("[elevated] registration of {} failed: {}", tile_id, e);
            return Err(e);
        }
        accumulate_normals(&mut self.scratch)?;
        self.finish_scratch(tile_id)
    }

    fn unregister_tile(&mut self, tile_id: TileId) -> bool {
        self.registry.unregister(tile_id).is_some()
    }

    fn tile_mesh(&self, tile_id: TileId) -> Option<&MeshBuffer> {
        self.registry.lookup(tile_id)
    }
}

/// Flat grids at zero elevation. Heights are ignored and nothing is stitched.
pub struct FlatTerrainStrategy {
    config: TerrainConfig,
    registry: TileMeshRegistry,
    scratch: MeshBuffer,
}

impl FlatTerrainStrategy {
    pub fn new(config: TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        Ok(Self {
            scratch: MeshBuffer::with_capacity(config.sample_count),
            registry: TileMeshRegistry::new(),
            config,
        })
    }
}

impl TerrainStrategy for FlatTerrainStrategy {
    fn config(&self) -> &TerrainConfig {
        &self.config
    }

    fn register_tile(
        &mut self,
        tile_id: TileId,
        rect: &TileRect,
        _heights: &dyn HeightSource,
    ) -> TerrainResult<&MeshBuffer> {
        build_grid_into(&mut self.scratch, rect, self.config.sample_count)?;
        if self.config.side_walls_enabled {
            extrude_walls(&mut self.scratch, self.config.wall_height)?;
        }
        commit(&mut self.registry, tile_id, &self.scratch)?;
        debug!("[flat] committed {}", tile_id);
        committed(&self.registry, tile_id)
    }

    fn unregister_tile(&mut self, tile_id: TileId) -> bool {
        self.registry.unregister(tile_id).is_some()
    }

    fn tile_mesh(&self, tile_id: TileId) -> Option<&MeshBuffer> {
        self.registry.lookup(tile_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::displacement::ConstantHeight;
    use crate::mesh_buffer::{normalize, UP};
    use crate::mesh_worker::build_surface;
    use crate::tile::Direction;

    const N: usize = 4;
    const TILE_SIZE: f64 = 16.0;

    fn rect(id: TileId) -> TileRect {
        TileRect::from_grid(id, TILE_SIZE, 1.0)
    }

    fn elevated(walls: bool) -> ElevatedTerrainStrategy {
        let mut config = TerrainConfig::new(N);
        if walls {
            config = config.with_side_walls(2.0);
        }
        ElevatedTerrainStrategy::new(config).unwrap()
    }

    fn east_column() -> Vec<usize> {
        (0..N).map(|i| i * N + N - 1).collect()
    }

    fn west_column() -> Vec<usize> {
        (0..N).map(|i| i * N).collect()
    }

    #[test]
    fn test_register_builds_full_pipeline() {
        let mut strategy = elevated(false);
        let id = TileId::new(5, 3, 3);
        let mesh = strategy.register_tile(id, &rect(id), &ConstantHeight(7.0)).unwrap();

        assert_eq!(mesh.vertex_count(), N * N);
        assert_eq!(mesh.triangle_count(0), 2 * (N - 1) * (N - 1));
        assert!(mesh.vertices.iter().all(|v| v[1] == 7.0));
        for n in &mesh.normals {
            assert!(
                n[0] == 0.0 && n[2] == 0.0 && n[1] > 0.0,
                "flat tile normals should point straight up, got {:?}",
                n
            );
        }
        assert_eq!(normalize(mesh.normals[0]), UP);
        assert!(strategy.registry().contains(id));
    }

    #[test]
    fn test_shared_edge_is_bit_identical() {
        let mut strategy = elevated(false);
        let a = TileId::new(5, 3, 3);
        let b = a.neighbor(Direction::East);

        let slope_a = |u: f32, v: f32| Some(u * 4.0 + v);
        let slope_b = |u: f32, v: f32| Some(10.0 - u * 2.0 + v * v);
        strategy.register_tile(a, &rect(a), &slope_a).unwrap();
        strategy.register_tile(b, &rect(b), &slope_b).unwrap();

        let mesh_a = strategy.tile_mesh(a).unwrap();
        let mesh_b = strategy.tile_mesh(b).unwrap();
        for (ia, ib) in east_column().into_iter().zip(west_column()) {
            assert_eq!(mesh_a.vertices[ia][1].to_bits(), mesh_b.vertices[ib][1].to_bits());
            assert_eq!(mesh_a.normals[ia], mesh_b.normals[ib]);
        }
    }

    #[test]
    fn test_failed_registration_commits_nothing() {
        let mut strategy = elevated(true);
        let id = TileId::new(5, 0, 0);
        strategy.register_tile(id, &rect(id), &ConstantHeight(1.0)).unwrap();
        let before = strategy.tile_mesh(id).unwrap().clone();

        let missing = |_u: f32, v: f32| if v > 0.5 { None } else { Some(3.0) };
        let err = strategy.register_tile(id, &rect(id), &missing).unwrap_err();
        assert!(matches!(err, TerrainError::HeightUnavailable { .. }));
        assert_eq!(strategy.tile_mesh(id), Some(&before), "live mesh should be untouched");

        let other = TileId::new(5, 1, 0);
        assert!(strategy.register_tile(other, &rect(other), &missing).is_err());
        assert!(strategy.tile_mesh(other).is_none());
    }

    #[test]
    fn test_reregistration_regenerates_live_mesh() {
        let mut strategy = elevated(false);
        let id = TileId::new(5, 0, 0);
        strategy.register_tile(id, &rect(id), &ConstantHeight(1.0)).unwrap();
        strategy.register_tile(id, &rect(id), &ConstantHeight(4.0)).unwrap();

        assert_eq!(strategy.registry().len(), 1);
        assert!(strategy.tile_mesh(id).unwrap().vertices.iter().all(|v| v[1] == 4.0));
    }

    #[test]
    fn test_committed_mesh_does_not_alias_scratch() {
        let mut strategy = elevated(false);
        let a = TileId::new(5, 0, 0);
        let far = TileId::new(5, 9, 9);
        strategy.register_tile(a, &rect(a), &ConstantHeight(1.0)).unwrap();
        strategy.register_tile(far, &rect(far), &ConstantHeight(6.0)).unwrap();

        assert!(strategy.tile_mesh(a).unwrap().vertices.iter().all(|v| v[1] == 1.0));
    }

    #[test]
    fn test_restitch_neighbors_after_flatten() {
        let mut strategy = elevated(false);
        let a = TileId::new(5, 3, 3);
        let b = a.neighbor(Direction::East);
        strategy.register_tile(a, &rect(a), &ConstantHeight(1.0)).unwrap();
        strategy.register_tile(b, &rect(b), &ConstantHeight(5.0)).unwrap();

        strategy.flatten_tile(a).unwrap();
        assert!(strategy.tile_mesh(a).unwrap().vertices.iter().all(|v| v[1] == 0.0));
        assert_eq!(strategy.tile_mesh(b).unwrap().vertices[0][1], 1.0);

        assert_eq!(strategy.restitch_neighbors(a), 1);
        let mesh_b = strategy.tile_mesh(b).unwrap();
        for i in west_column() {
            assert_eq!(mesh_b.vertices[i][1], 0.0, "west column should follow the flattened tile");
        }
        assert_eq!(mesh_b.vertices[1][1], 5.0, "interior keeps its own height");
    }

    #[test]
    fn test_restitch_tile_is_idempotent() {
        let mut strategy = elevated(true);
        let a = TileId::new(5, 3, 3);
        let south = a.neighbor(Direction::South);
        strategy.register_tile(a, &rect(a), &ConstantHeight(2.0)).unwrap();
        strategy.register_tile(south, &rect(south), &ConstantHeight(8.0)).unwrap();

        let report = strategy.restitch_tile(a).unwrap();
        assert!(report.contains(Direction::South));
        let once = strategy.tile_mesh(a).unwrap().clone();
        strategy.restitch_tile(a).unwrap();
        assert_eq!(strategy.tile_mesh(a), Some(&once));
    }

    #[test]
    fn test_flatten_and_restitch_rebuild_walls() {
        let mut strategy = elevated(true);
        let a = TileId::new(5, 3, 3);
        let north = a.neighbor(Direction::North);
        strategy.register_tile(a, &rect(a), &ConstantHeight(2.0)).unwrap();
        strategy.register_tile(north, &rect(north), &ConstantHeight(9.0)).unwrap();
        let s = N * N;

        strategy.flatten_tile(a).unwrap();
        let mesh = strategy.tile_mesh(a).unwrap();
        assert!(mesh.has_walls());
        assert_eq!(mesh.vertices[s][1], 0.0);
        assert_eq!(mesh.vertices[s + 1][1], -2.0);

        // the north tile took its south row from this tile while it stood at 2.0
        strategy.restitch_tile(a).unwrap();
        let mesh = strategy.tile_mesh(a).unwrap();
        assert_eq!(mesh.vertices[0][1], 2.0);
        assert_eq!(mesh.vertices[s][1], 2.0, "north wall should hang from the stitched row");
        assert_eq!(mesh.vertices[s + 1][1], 0.0);
    }

    #[test]
    fn test_restitch_unknown_tile() {
        let mut strategy = elevated(false);
        let id = TileId::new(5, 0, 0);
        assert_eq!(
            strategy.restitch_tile(id),
            Err(TerrainError::TileNotRegistered(id))
        );
        assert_eq!(strategy.flatten_tile(id), Err(TerrainError::TileNotRegistered(id)));
        assert_eq!(strategy.restitch_neighbors(id), 0);
    }

    #[test]
    fn test_unregister_tile() {
        let mut strategy = elevated(false);
        let id = TileId::new(5, 0, 0);
        strategy.register_tile(id, &rect(id), &ConstantHeight(1.0)).unwrap();
        assert!(strategy.unregister_tile(id));
        assert!(!strategy.unregister_tile(id));
        assert!(strategy.tile_mesh(id).is_none());
    }

    #[test]
    fn test_commit_surface_stitches() {
        let mut strategy = elevated(true);
        let a = TileId::new(5, 3, 3);
        let b = a.neighbor(Direction::West);
        strategy.register_tile(a, &rect(a), &ConstantHeight(3.0)).unwrap();

        let surface = build_surface(&rect(b), N, &ConstantHeight(1.0));
        let mesh = strategy
            .commit_surface(SurfaceResult { tile_id: b, surface })
            .unwrap();

        assert_eq!(mesh.submesh_count(), 2);
        assert_eq!(mesh.vertices[N - 1][1], 3.0, "east column comes from the neighbor");
        assert_eq!(mesh.vertices[0][1], 1.0);
    }

    #[test]
    fn test_commit_surface_rejects_wrong_size() {
        let mut strategy = elevated(false);
        let id = TileId::new(5, 0, 0);
        let surface = build_surface(&rect(id), N + 1, &ConstantHeight(1.0));
        let err = strategy
            .commit_surface(SurfaceResult { tile_id: id, surface })
            .unwrap_err();
        assert!(matches!(err, TerrainError::BufferSizeMismatch { .. }));
        assert!(strategy.tile_mesh(id).is_none());
    }

    #[test]
    fn test_flat_strategy_ignores_heights() {
        let config = TerrainConfig::new(N).with_side_walls(1.0);
        let mut strategy = FlatTerrainStrategy::new(config).unwrap();
        let a = TileId::new(5, 0, 0);
        let mesh = strategy.register_tile(a, &rect(a), &ConstantHeight(12.0)).unwrap();

        assert!(mesh.vertices[..N * N].iter().all(|v| v[1] == 0.0));
        assert!(mesh.has_walls());
        assert!(strategy.unregister_tile(a));
    }

    #[test]
    fn test_create_strategy() {
        let flat = create_strategy(TerrainStrategyKind::Flat, TerrainConfig::new(3)).unwrap();
        assert_eq!(flat.config().sample_count, 3);

        let invalid = create_strategy(TerrainStrategyKind::Elevated, TerrainConfig::new(1));
        assert!(matches!(invalid, Err(TerrainError::InvalidSampleCount(1))));
    }

    #[test]
    fn test_render_descriptor() {
        let plain = RenderDescriptor::from_config(&TerrainConfig::default());
        assert_eq!(plain.materials, vec![MaterialSlot::Base]);
        assert_eq!(plain.collider_submesh, None);
        assert_eq!(plain.layer, None);
        assert!(plain.renderer_enabled);

        let config = TerrainConfig::new(4)
            .with_side_walls(1.0)
            .with_collider(true)
            .with_layer(9);
        let strategy = ElevatedTerrainStrategy::new(config).unwrap();
        let descriptor = strategy.render_descriptor();
        assert_eq!(descriptor.materials, vec![MaterialSlot::Base, MaterialSlot::Wall]);
        assert_eq!(descriptor.collider_submesh, Some(0));
        assert_eq!(descriptor.layer, Some(9));
    }
}
