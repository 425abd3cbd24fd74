//! Finalized tile meshes keyed by tile identity.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::mesh_buffer::MeshBuffer;
use crate::tile::TileId;

/// One entry per loaded tile. Entries are owned copies, never views of a
/// scratch buffer, and are only inserted once complete.
#[derive(Debug, Default)]
pub struct TileMeshRegistry {
    meshes: HashMap<TileId, MeshBuffer>,
}

impl TileMeshRegistry {
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
        }
    }

    /// Insert a finalized mesh. An existing entry is never replaced;
    /// returns whether the mesh was stored.
    pub fn register(&mut self, tile_id: TileId, mesh: MeshBuffer) -> bool {
        match self.meshes.entry(tile_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(mesh);
                true
            }
        }
    }

    pub fn lookup(&self, tile_id: TileId) -> Option<&MeshBuffer> {
        self.meshes.get(&tile_id)
    }

    /// Live entry for in-place re-stitching or re-generation.
    pub fn lookup_mut(&mut self, tile_id: TileId) -> Option<&mut MeshBuffer> {
        self.meshes.get_mut(&tile_id)
    }

    pub fn unregister(&mut self, tile_id: TileId) -> Option<MeshBuffer> {
        self.meshes.remove(&tile_id)
    }

    pub fn contains(&self, tile_id: TileId) -> bool {
        self.meshes.contains_key(&tile_id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.meshes.keys().copied()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}
