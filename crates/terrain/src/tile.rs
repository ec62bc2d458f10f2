use bevy::prelude::*;

use crate::builder::CompletedBuild;
use crate::heightfield::Heightfield;
use crate::lod::TileResolution;

/// A streamed terrain tile. The tile's min corner is its `Transform`
/// translation; it covers `map_size` world units along +x and +z.
///
/// Hosts spawn tiles with `TerrainTile::default()` and a `Transform`. The
/// streaming systems lay them out, move them and replace their heightfield.
#[derive(Component, Debug, Clone, Default)]
pub struct TerrainTile {
    /// Grid slot, or `None` when the tile did not fit the largest square grid.
    pub slot: Option<usize>,
    detail: TileResolution,
    heightfield: Heightfield,
    generation: u32,
}

impl TerrainTile {
    pub fn detail(&self) -> TileResolution {
        self.detail
    }

    pub fn heightfield(&self) -> &Heightfield {
        &self.heightfield
    }

    /// Incremented every time a new heightfield is committed.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_built(&self) -> bool {
        !self.heightfield.is_empty()
    }

    /// Swap in a finished build. Detail level and heights change together.
    pub fn commit(&mut self, build: CompletedBuild) {
        self.detail = build.detail;
        self.heightfield = build.heightfield;
        self.generation = self.generation.wrapping_add(1);
    }
}
