use xxhash_rust::xxh32::xxh32;

/// Square grid of normalized heights belonging to one tile.
///
/// Rows follow the first noise axis (world z), columns the second (world x).
/// Heights are normalized: a value of 1.0 corresponds to `vertical_size`
/// world units above the tile origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heightfield {
    resolution: usize,
    heights: Vec<f32>,
    vertical_size: f32,
}

impl Heightfield {
    pub fn new(resolution: usize, vertical_size: f32) -> Self {
        Self {
            resolution,
            heights: vec![0.0; resolution * resolution],
            vertical_size,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn vertical_size(&self) -> f32 {
        self.vertical_size
    }

    /// `true` for the placeholder a tile carries before its first build.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.resolution + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.heights[self.index(row, col)]
    }

    #[inline]
    pub fn add(&mut self, row: usize, col: usize, amount: f32) {
        let idx = self.index(row, col);
        self.heights[idx] += amount;
    }

    /// Height above the tile origin in world units.
    pub fn world_height(&self, row: usize, col: usize) -> f32 {
        self.get(row, col) * self.vertical_size
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn min_max(&self) -> Option<(f32, f32)> {
        let first = *self.heights.first()?;
        Some(
            self.heights
                .iter()
                .fold((first, first), |(lo, hi), &h| (lo.min(h), hi.max(h))),
        )
    }

    /// Fingerprint of the resolution and every height bit pattern. Two
    /// heightfields with the same checksum were built from the same inputs.
    pub fn checksum(&self) -> u32 {
        let mut bytes = Vec::with_capacity(8 + self.heights.len() * 4);
        bytes.extend_from_slice(&(self.resolution as u64).to_le_bytes());
        for h in &self.heights {
            bytes.extend_from_slice(&h.to_bits().to_le_bytes());
        }
        xxh32(&bytes, 0)
    }
}
