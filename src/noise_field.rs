use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use std::sync::Arc;

use crate::displacement::HeightSource;
use crate::tile::TileRect;

/// Fractal elevation over geographic coordinates.
/// Sampling by geographic position (not per tile) means two tiles that share
/// an edge read identical heights along it.
pub struct NoiseField {
    fbm: Fbm<Perlin>,
    amplitude: f32,
    height_offset: f32,
}

impl NoiseField {
    pub fn new(
        seed: u32,
        octaves: usize,
        frequency: f32,
        amplitude: f32,
        height_offset: f32,
    ) -> Self {
        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(octaves)
            .set_frequency(frequency as f64)
            .set_lacunarity(2.0)
            .set_persistence(0.5);

        Self {
            fbm,
            amplitude,
            height_offset,
        }
    }

    /// Elevation at geographic `(x, y)`
    pub fn sample_height(&self, x: f64, y: f64) -> f32 {
        let noise_value = self.fbm.get([x, y]) as f32;
        self.height_offset + noise_value * self.amplitude
    }

    pub fn for_tile(field: &SharedNoiseField, rect: &TileRect) -> TileNoiseHeights {
        TileNoiseHeights {
            field: Arc::clone(field),
            rect: *rect,
        }
    }
}

/// Thread-safe shared noise field for parallel surface generation
pub type SharedNoiseField = Arc<NoiseField>;

/// A noise field viewed through one tile's `(u, v)` coordinates.
#[derive(Clone)]
pub struct TileNoiseHeights {
    field: SharedNoiseField,
    rect: TileRect,
}

impl HeightSource for TileNoiseHeights {
    fn query_height(&self, u: f32, v: f32) -> Option<f32> {
        // v runs south to north while grid rows run north to south
        let [x, y] = self.rect.lerp(u as f64, 1.0 - v as f64);
        Some(self.field.sample_height(x, y))
    }
}
