//! Vertex tint by relative height within a tile.

/// sRGB stops from valley floor to summit, evenly spaced over [0, 1].
const HEIGHT_STOPS: [[f32; 3]; 5] = [
    [0.20, 0.32, 0.16], // lowland grass
    [0.33, 0.42, 0.20],
    [0.48, 0.43, 0.30], // dry slopes
    [0.55, 0.53, 0.50], // rock
    [0.92, 0.93, 0.95], // snow
];

/// RGBA for a height `t` in [0, 1] (clamped), linearly interpolated between stops.
pub fn height_color(t: f32) -> [f32; 4] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let max_idx = (HEIGHT_STOPS.len() - 1) as f32;
    let scaled = t * max_idx;
    let lo = (scaled as usize).min(HEIGHT_STOPS.len() - 2);
    let frac = scaled - lo as f32;
    let a = HEIGHT_STOPS[lo];
    let b = HEIGHT_STOPS[lo + 1];
    [
        a[0] + (b[0] - a[0]) * frac,
        a[1] + (b[1] - a[1]) * frac,
        a[2] + (b[2] - a[2]) * frac,
        1.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ends_hit_first_and_last_stop() {
        let low = height_color(0.0);
        let high = height_color(1.0);
        assert_eq!(&low[..3], &HEIGHT_STOPS[0]);
        for (got, want) in high[..3].iter().zip(HEIGHT_STOPS[4]) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(height_color(-3.0), height_color(0.0));
        assert_eq!(height_color(7.0), height_color(1.0));
        assert_eq!(height_color(f32::NAN), height_color(0.0));
    }

    #[test]
    fn test_alpha_is_opaque() {
        for i in 0..=10 {
            assert_eq!(height_color(i as f32 / 10.0)[3], 1.0);
        }
    }
}
