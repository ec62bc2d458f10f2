use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

/// Detail level of a tile's heightfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileResolution {
    #[default]
    High,
    Low,
}

impl TileResolution {
    /// Samples per axis for this detail level.
    pub fn samples(self, config: &WorldConfig) -> usize {
        match self {
            TileResolution::High => config.resolution,
            TileResolution::Low => config.distant_resolution,
        }
    }
}

/// Half-width of the full-detail square around the observer: the observer's
/// own tile plus `rings` tiles on every side.
pub fn high_res_radius(tile_size: f32, rings: u32) -> f32 {
    tile_size * (rings as f32 * 2.0 + 1.0) / 2.0
}

/// Detail level for a tile at `tile_position` (its min corner, already
/// paged) given the observer's position.
pub fn decide(tile_position: Vec3, observer: Vec3, tile_size: f32, rings: u32) -> TileResolution {
    let half = tile_size * 0.5;
    let dx = observer.x - (tile_position.x + half);
    let dz = observer.z - (tile_position.z + half);
    let radius = high_res_radius(tile_size, rings);
    if dx.abs() > radius || dz.abs() > radius {
        TileResolution::Low
    } else {
        TileResolution::High
    }
}
