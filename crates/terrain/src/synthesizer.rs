//! Height of a single heightfield cell from the layered noise stack.
//!
//! Noise coordinates cross the world axes: the first noise axis (heightfield
//! rows) advances with world z and the second (columns) with world x. Tiles
//! sharing an edge therefore sample identical coordinates along that edge.

use bevy::prelude::*;

use crate::config::WorldConfig;
use crate::iteration::NoiseIteration;
use crate::noise_source::NoiseSource;

pub struct HeightSynthesizer<'a> {
    config: &'a WorldConfig,
    noise: &'a dyn NoiseSource,
}

impl<'a> HeightSynthesizer<'a> {
    pub fn new(config: &'a WorldConfig, noise: &'a dyn NoiseSource) -> Self {
        Self { config, noise }
    }

    /// Noise-space coordinates of cell (`x`, `y`) for one layer.
    pub fn noise_coords(
        &self,
        x: usize,
        y: usize,
        resolution: usize,
        tile_origin: Vec3,
        iteration: &NoiseIteration,
    ) -> Vec2 {
        let scale = self.config.world_scale;
        let span = (resolution.max(2) - 1) as f32;
        let to_noise = |cell: usize| cell as f32 / span * self.config.map_size / scale;

        let u = to_noise(x) + iteration.offset.x + self.config.world_offset.x + tile_origin.z / scale;
        let v = to_noise(y) + iteration.offset.y + self.config.world_offset.y + tile_origin.x / scale;

        let stretch = iteration.distortion / iteration.scale / iteration.rarity;
        Vec2::new(u, v) * stretch
    }

    /// Contribution of one layer to cell (`x`, `y`), already weighted by
    /// `depth / total_depth`. Returns 0 when `total_depth` is 0.
    pub fn octave_height(
        &self,
        x: usize,
        y: usize,
        resolution: usize,
        tile_origin: Vec3,
        iteration: &NoiseIteration,
        total_depth: u32,
    ) -> f32 {
        if total_depth == 0 {
            return 0.0;
        }
        let coords = self.noise_coords(x, y, resolution, tile_origin, iteration);
        let raw = self.noise.sample(coords.x, coords.y);

        let rarity = iteration.rarity;
        let shaped = iteration
            .depth_curve
            .evaluate(raw * rarity - (1.0 - 1.0 / rarity) * rarity);

        shaped * iteration.depth as f32 / total_depth as f32
    }

    /// Normalized height of cell (`x`, `y`): the enabled layers summed in order.
    pub fn cell_height(
        &self,
        x: usize,
        y: usize,
        resolution: usize,
        tile_origin: Vec3,
        iterations: &[NoiseIteration],
    ) -> f32 {
        let total_depth: u32 = iterations
            .iter()
            .filter(|it| it.enabled)
            .map(|it| it.depth)
            .sum();
        iterations
            .iter()
            .filter(|it| it.enabled)
            .map(|it| self.octave_height(x, y, resolution, tile_origin, it, total_depth))
            .sum()
    }
}
