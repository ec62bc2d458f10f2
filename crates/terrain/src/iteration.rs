use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::depth_curve::DepthCurve;

/// One noise layer ("octave") contributing to the final height.
///
/// Each layer samples the shared noise source with its own stretch and offset,
/// remaps the sample through `depth_curve`, and is weighted by `depth` relative
/// to the other enabled layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseIteration {
    pub name: String,
    pub enabled: bool,
    /// Relative weight of this layer; also sets its share of the map depth.
    pub depth: u32,
    /// Horizontal stretch; larger values give broader features.
    pub scale: f32,
    /// Values above 1 make the layer sparser: the remap input is shifted down
    /// so only the highest samples stay above zero.
    pub rarity: f32,
    /// Per-axis multiplier on the noise coordinates.
    pub distortion: Vec2,
    pub offset: Vec2,
    pub depth_curve: DepthCurve,
}

impl Default for NoiseIteration {
    fn default() -> Self {
        Self {
            name: "Iteration".to_string(),
            enabled: true,
            depth: 20,
            scale: 20.0,
            rarity: 1.0,
            distortion: Vec2::ONE,
            offset: Vec2::splat(100.0),
            depth_curve: DepthCurve::identity(),
        }
    }
}

/// Ordered list of noise layers, evaluated front to back.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseIterations {
    iterations: Vec<NoiseIteration>,
}

impl Default for NoiseIterations {
    fn default() -> Self {
        Self::new(vec![NoiseIteration::default()])
    }
}

impl NoiseIterations {
    pub fn new(iterations: Vec<NoiseIteration>) -> Self {
        Self { iterations }
    }

    pub fn as_slice(&self) -> &[NoiseIteration] {
        &self.iterations
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoiseIteration> {
        self.iterations.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &NoiseIteration> {
        self.iterations.iter().filter(|it| it.enabled)
    }

    /// Normalization denominator: sum of the enabled layers' depth weights.
    /// Zero when nothing is enabled.
    pub fn total_depth(&self) -> u32 {
        self.enabled().map(|it| it.depth).sum()
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn push(&mut self, iteration: NoiseIteration) {
        self.iterations.push(iteration);
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NoiseIteration> {
        self.iterations.get_mut(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<NoiseIteration> {
        (index < self.iterations.len()).then(|| self.iterations.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(depth: u32, enabled: bool) -> NoiseIteration {
        NoiseIteration {
            depth,
            enabled,
            ..Default::default()
        }
    }

    #[test]
    fn test_total_depth_counts_enabled_only() {
        let its = NoiseIterations::new(vec![layer(20, true), layer(5, false), layer(7, true)]);
        assert_eq!(its.total_depth(), 27);
    }

    #[test]
    fn test_total_depth_follows_edits() {
        let mut its = NoiseIterations::new(vec![layer(20, true)]);
        its.push(layer(10, true));
        assert_eq!(its.total_depth(), 30);
        if let Some(first) = its.get_mut(0) {
            first.enabled = false;
        }
        assert_eq!(its.total_depth(), 10);
        its.remove(1);
        assert_eq!(its.total_depth(), 0);
    }

    #[test]
    fn test_empty_list_has_zero_total() {
        let its = NoiseIterations::new(Vec::new());
        assert!(its.is_empty());
        assert_eq!(its.total_depth(), 0);
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut its = NoiseIterations::default();
        assert!(its.remove(5).is_none());
        assert_eq!(its.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let it = NoiseIteration::default();
        assert!(it.enabled);
        assert_eq!(it.depth, 20);
        assert_eq!(it.scale, 20.0);
        assert_eq!(it.rarity, 1.0);
        assert_eq!(it.offset, Vec2::new(100.0, 100.0));
        assert_eq!(it.distortion, Vec2::ONE);
    }
}
