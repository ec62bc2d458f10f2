//! Keyframed remapping curve applied to raw noise before it is weighted.
//!
//! Keys carry explicit in/out tangents and segments are cubic Hermite splines,
//! so a curve authored in an editor (slopes dragged by hand) evaluates the
//! same way here. Outside the first/last key the curve holds the end value.

use serde::{Deserialize, Serialize};

/// A single control point of a [`DepthCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key from the left.
    pub in_tangent: f32,
    /// Slope leaving this key to the right.
    pub out_tangent: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthCurve {
    keys: Vec<CurveKey>,
}

impl Default for DepthCurve {
    fn default() -> Self {
        Self::identity()
    }
}

impl DepthCurve {
    /// Straight line through (0, 0) and (1, 1).
    pub fn identity() -> Self {
        Self::linear(&[(0.0, 0.0), (1.0, 1.0)])
    }

    /// Piecewise-linear curve through `points`. Tangents on both sides of each
    /// segment equal the segment slope, which makes the Hermite segments
    /// straight lines.
    pub fn linear(points: &[(f32, f32)]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let slope = |a: (f32, f32), b: (f32, f32)| {
            let dt = b.0 - a.0;
            if dt.abs() > f32::EPSILON {
                (b.1 - a.1) / dt
            } else {
                0.0
            }
        };

        let keys = sorted
            .iter()
            .enumerate()
            .map(|(i, &(time, value))| {
                let in_tangent = if i > 0 {
                    slope(sorted[i - 1], sorted[i])
                } else {
                    0.0
                };
                let out_tangent = if i + 1 < sorted.len() {
                    slope(sorted[i], sorted[i + 1])
                } else {
                    0.0
                };
                CurveKey::new(time, value, in_tangent, out_tangent)
            })
            .collect();
        Self { keys }
    }

    /// Curve from explicit keys; keys are reordered by time.
    pub fn from_keys(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluate the curve at `t`. An empty curve evaluates to 0.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t > first.time guarantees idx >= 1.
        let idx = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[idx - 1];
        let k1 = &self.keys[idx];
        hermite(k0, k1, t)
    }
}

fn hermite(k0: &CurveKey, k1: &CurveKey, t: f32) -> f32 {
    let dt = k1.time - k0.time;
    if dt <= f32::EPSILON {
        return k0.value;
    }
    let s = (t - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
}
