//! Keeps the fixed grid of tiles centred on the observer.
//!
//! A tile that has fallen more than half a grid width behind the observer on
//! an axis jumps by one full grid width to the opposite side. Each decision
//! moves a tile at most one jump per axis.

use bevy::prelude::*;

use crate::config::PAGING_EPSILON_FRACTION;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDecision {
    pub position: Vec3,
    pub moved: bool,
}

/// Distance past which a tile is paged.
pub fn paging_threshold(tile_size: f32, tiles_per_side: usize) -> f32 {
    tile_size * tiles_per_side as f32 / 2.0 + tile_size * PAGING_EPSILON_FRACTION
}

/// Decide where the tile whose min corner sits at `tile_position` belongs.
pub fn decide(
    tile_position: Vec3,
    observer: Vec3,
    tile_size: f32,
    tiles_per_side: usize,
) -> PageDecision {
    let threshold = paging_threshold(tile_size, tiles_per_side);
    let jump = tile_size * tiles_per_side as f32;
    let half = tile_size * 0.5;

    let mut position = tile_position;
    let mut moved = false;

    let dx = observer.x - (position.x + half);
    if dx.abs() > threshold {
        position.x += dx.signum() * jump;
        moved = true;
    }

    let dz = observer.z - (position.z + half);
    if dz.abs() > threshold {
        position.z += dz.signum() * jump;
        moved = true;
    }

    PageDecision { position, moved }
}
