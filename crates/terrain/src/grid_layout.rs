use bevy::prelude::*;

/// Square arrangement of the managed tiles.
///
/// Slot `s` sits at logical grid coordinates `(s / n, s % n)` where `n` is
/// `tiles_per_side`. Tiles beyond the largest square that fits are kept as
/// unmanaged and never streamed.
#[derive(Resource, Debug, Clone, Default)]
pub struct TileGrid {
    tiles_per_side: usize,
    slots: Vec<Entity>,
    unmanaged: Vec<Entity>,
}

/// Largest `n` with `n * n <= count`.
pub fn tiles_per_side(count: usize) -> usize {
    let mut n = (count as f64).sqrt() as usize;
    while n * n > count {
        n -= 1;
    }
    while (n + 1) * (n + 1) <= count {
        n += 1;
    }
    n
}

impl TileGrid {
    /// Assign slots in the given order; the caller fixes the ordering.
    pub fn from_tiles(tiles: &[Entity]) -> Self {
        let n = tiles_per_side(tiles.len());
        let managed = n * n;
        Self {
            tiles_per_side: n,
            slots: tiles[..managed].to_vec(),
            unmanaged: tiles[managed..].to_vec(),
        }
    }

    pub fn tiles_per_side(&self) -> usize {
        self.tiles_per_side
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, slot: usize) -> Option<Entity> {
        self.slots.get(slot).copied()
    }

    pub fn slots(&self) -> &[Entity] {
        &self.slots
    }

    pub fn unmanaged(&self) -> &[Entity] {
        &self.unmanaged
    }

    /// Initial min-corner position of `slot`, centred on the world origin.
    pub fn slot_position(&self, slot: usize, map_size: f32) -> Vec3 {
        let n = self.tiles_per_side.max(1);
        let half = (n / 2) as f32;
        let x = (slot / n) as f32;
        let y = (slot % n) as f32;
        Vec3::new((x - half) * map_size, 0.0, (y - half) * map_size)
    }
}
