use bevy::prelude::*;
use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::config::DEFAULT_NOISE_SEED;

/// Smooth, deterministic 2-D noise returning values in roughly [0, 1].
pub trait NoiseSource: Send + Sync {
    fn sample(&self, x: f32, y: f32) -> f32;
}

/// Classic gradient noise at unit frequency, remapped from [-1, 1] to [0, 1].
pub struct PerlinNoise {
    noise: FastNoiseLite,
}

impl PerlinNoise {
    pub fn new(seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));
        Self { noise }
    }
}

impl NoiseSource for PerlinNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let raw = self.noise.get_noise_2d(x, y);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Same value everywhere. Handy for checking weighting and layout without
/// noise getting in the way.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f32);

impl NoiseSource for ConstantNoise {
    fn sample(&self, _x: f32, _y: f32) -> f32 {
        self.0
    }
}

/// The noise source every heightfield build samples from.
#[derive(Resource)]
pub struct TerrainNoise {
    source: Box<dyn NoiseSource>,
}

impl Default for TerrainNoise {
    fn default() -> Self {
        Self::perlin(DEFAULT_NOISE_SEED)
    }
}

impl TerrainNoise {
    pub fn new(source: impl NoiseSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn perlin(seed: i32) -> Self {
        Self::new(PerlinNoise::new(seed))
    }

    pub fn source(&self) -> &dyn NoiseSource {
        self.source.as_ref()
    }
}
