use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::budget::{BudgetSettings, BudgetState};
use crate::error::TerrainError;
use crate::iteration::{NoiseIteration, NoiseIterations};
use crate::noise_source::TerrainNoise;

pub const DEFAULT_WORLD_SCALE: f32 = 6000.0;
pub const DEFAULT_DEPTH_DIVIDER: f32 = 1000.0;
/// World size of one square tile along x and z.
pub const DEFAULT_MAP_SIZE: f32 = 10000.0;
pub const DEFAULT_RESOLUTION: usize = 257;
pub const DEFAULT_DISTANT_RESOLUTION: usize = 33;
/// Rings of tiles around the observer's tile kept at full detail.
pub const DEFAULT_HIGH_RES_RINGS: u32 = 2;
pub const DEFAULT_NOISE_SEED: i32 = 1337;

pub const MIN_RESOLUTION: usize = 2;

/// Slack added to the paging threshold, as a fraction of the tile size, so a
/// tile sitting exactly on the boundary does not flip back and forth.
pub const PAGING_EPSILON_FRACTION: f32 = 0.01;

pub const DEFAULT_CELL_BUDGET: u32 = 10000;
pub const DEFAULT_TARGET_FPS: f32 = 60.0;
pub const DEFAULT_BUDGET_STEP: u32 = 1000;
pub const MIN_CELL_BUDGET: u32 = 3000;

/// World-space layout and sampling parameters shared by every tile.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Horizontal stretch of the noise: world units per noise unit.
    pub world_scale: f32,
    /// Divides `world_scale` to get the vertical extent per unit of depth weight.
    pub depth_divider: f32,
    pub map_size: f32,
    pub resolution: usize,
    pub distant_resolution: usize,
    pub high_res_rings: u32,
    /// Global shift of the noise domain, added to every iteration's offset.
    pub world_offset: Vec2,
    pub noise_seed: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_scale: DEFAULT_WORLD_SCALE,
            depth_divider: DEFAULT_DEPTH_DIVIDER,
            map_size: DEFAULT_MAP_SIZE,
            resolution: DEFAULT_RESOLUTION,
            distant_resolution: DEFAULT_DISTANT_RESOLUTION,
            high_res_rings: DEFAULT_HIGH_RES_RINGS,
            world_offset: Vec2::ZERO,
            noise_seed: DEFAULT_NOISE_SEED,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), TerrainError> {
        for resolution in [self.resolution, self.distant_resolution] {
            if resolution < MIN_RESOLUTION {
                return Err(TerrainError::ResolutionTooSmall {
                    resolution,
                    minimum: MIN_RESOLUTION,
                });
            }
        }
        if self.resolution == self.distant_resolution {
            return Err(TerrainError::AmbiguousResolution(self.resolution));
        }
        for (field, value) in [
            ("world_scale", self.world_scale),
            ("depth_divider", self.depth_divider),
            ("map_size", self.map_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TerrainError::InvalidScale { field, value });
            }
        }
        Ok(())
    }

    /// Vertical extent of a tile whose enabled iterations weigh `total_depth`.
    /// Normalized heights in [0, 1] map onto [0, map_depth].
    pub fn map_depth(&self, total_depth: u32) -> f32 {
        total_depth as f32 * self.world_scale / self.depth_divider
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// A complete terrain setup that can be stored as JSON and applied to an app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainPreset {
    pub world: WorldConfig,
    pub budget: BudgetSettings,
    pub iterations: Vec<NoiseIteration>,
}

impl TerrainPreset {
    pub fn from_json_str(json: &str) -> Result<Self, TerrainError> {
        let preset: TerrainPreset = serde_json::from_str(json)?;
        preset.world.validate()?;
        Ok(preset)
    }

    pub fn to_json_string(&self) -> Result<String, TerrainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TerrainError> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Replace the world, budget and iteration resources, restart the budget
    /// controller and reseed the noise.
    pub fn apply(self, world: &mut World) {
        world.insert_resource(TerrainNoise::perlin(self.world.noise_seed));
        world.insert_resource(self.world);
        world.insert_resource(BudgetState::from_settings(&self.budget));
        world.insert_resource(self.budget);
        world.insert_resource(NoiseIterations::new(self.iterations));
    }
}
