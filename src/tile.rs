//! Tile identity, neighbor directions, and geographic tile rectangles.

use std::fmt;

/// One of the eight tiles surrounding a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Direction {
    /// All directions in stitch order: edges first, then corners.
    /// Corners run last so they win over the edges that also touch them.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Tile-grid offset `(dx, dy)`; north is `-y`.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::NorthEast => (1, -1),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (1, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::NorthWest => Direction::SouthEast,
            Direction::NorthEast => Direction::SouthWest,
            Direction::SouthWest => Direction::NorthEast,
            Direction::SouthEast => Direction::NorthWest,
        }
    }

    pub fn is_corner(self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }
}

/// Unwrapped slippy-map tile key. X is not wrapped around the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub zoom: u8,
    pub x: i32,
    pub y: i32,
}

impl TileId {
    pub fn new(zoom: u8, x: i32, y: i32) -> Self {
        Self { zoom, x, y }
    }

    /// Identity of the adjacent tile at the same zoom. Pure; no lookup.
    pub fn neighbor(&self, direction: Direction) -> TileId {
        let (dx, dy) = direction.offset();
        TileId::new(self.zoom, self.x + dx, self.y + dy)
    }

    pub fn neighbors(&self) -> [(Direction, TileId); 8] {
        Direction::ALL.map(|direction| (direction, self.neighbor(direction)))
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Axis-aligned tile bounds in geographic units.
///
/// `min` is the corner at grid origin (north-west) and `max` the opposite
/// corner (south-east). Northing decreases from `min` to `max`, so `min[1] > max[1]`
/// for a north-up tile; with that layout the grid's CCW triangles face +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileRect {
    pub min: [f64; 2],
    pub max: [f64; 2],
    /// Geographic units to local render units
    pub tile_scale: f32,
}

impl TileRect {
    pub fn new(min: [f64; 2], max: [f64; 2], tile_scale: f32) -> Self {
        Self {
            min,
            max,
            tile_scale,
        }
    }

    /// Square grid layout with tile rows counting southward: tile `(x, y)` spans
    /// easting `[x, x+1] * tile_size` and northing `[-y, -(y+1)] * tile_size`.
    /// A tile's `min.y` is its northern neighbor's `max.y`.
    pub fn from_grid(tile_id: TileId, tile_size: f64, tile_scale: f32) -> Self {
        let (x, y) = (tile_id.x as f64, tile_id.y as f64);
        // Both corners from grid lines so neighbors compute bit-identical edges
        let min = [x * tile_size, -y * tile_size];
        let max = [(x + 1.0) * tile_size, -(y + 1.0) * tile_size];
        Self::new(min, max, tile_scale)
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    /// Geographic point at normalized `(tx, ty)`; exact at 0 and 1.
    pub fn lerp(&self, tx: f64, ty: f64) -> [f64; 2] {
        [
            lerp_exact(self.min[0], self.max[0], tx),
            lerp_exact(self.min[1], self.max[1], ty),
        ]
    }
}

/// Shared tile edges must land on identical coordinates from both sides.
fn lerp_exact(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}
