use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use terrain::heightfield::Heightfield;

use super::coloring::height_color;

/// Distance between neighbouring samples of a tile `tile_size` wide.
pub fn sample_spacing(resolution: usize, tile_size: f32) -> f32 {
    tile_size / (resolution.max(2) - 1) as f32
}

/// Smooth normal at (`row`, `col`) from central differences, falling back to
/// one-sided differences on the tile border.
fn vertex_normal(hf: &Heightfield, row: usize, col: usize, spacing: f32) -> [f32; 3] {
    let last = hf.resolution() - 1;
    let (c0, c1) = (col.saturating_sub(1), (col + 1).min(last));
    let (r0, r1) = (row.saturating_sub(1), (row + 1).min(last));

    let dx = (hf.world_height(row, c1) - hf.world_height(row, c0)) / ((c1 - c0).max(1) as f32 * spacing);
    let dz = (hf.world_height(r1, col) - hf.world_height(r0, col)) / ((r1 - r0).max(1) as f32 * spacing);

    let n = Vec3::new(-dx, 1.0, -dz);
    let len = n.length();
    if len < 1e-8 {
        [0.0, 1.0, 0.0]
    } else {
        (n / len).to_array()
    }
}

/// Triangle mesh for one tile in its local space: column `c` sits at
/// x = c * spacing, row `r` at z = r * spacing.
pub fn build_tile_mesh(hf: &Heightfield, tile_size: f32) -> Mesh {
    let n = hf.resolution();
    let spacing = sample_spacing(n, tile_size);
    let (min, max) = hf.min_max().unwrap_or((0.0, 0.0));
    let range = (max - min).max(1e-6);

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(n * n);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(n * n);
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(n * n);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(n * n);
    let quads = n.saturating_sub(1);
    let mut indices: Vec<u32> = Vec::with_capacity(quads * quads * 6);

    for row in 0..n {
        for col in 0..n {
            positions.push([
                col as f32 * spacing,
                hf.world_height(row, col),
                row as f32 * spacing,
            ]);
            normals.push(vertex_normal(hf, row, col, spacing));
            colors.push(height_color((hf.get(row, col) - min) / range));
            let span = quads.max(1) as f32;
            uvs.push([col as f32 / span, row as f32 / span]);
        }
    }

    for row in 0..quads {
        for col in 0..quads {
            let tl = (row * n + col) as u32;
            let tr = tl + 1;
            let bl = tl + n as u32;
            let br = bl + 1;
            // TL-BR-TR and TL-BL-BR, counter-clockwise seen from above.
            indices.extend_from_slice(&[tl, br, tr, tl, bl, br]);
        }
    }

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    fn ramp(resolution: usize, vertical: f32) -> Heightfield {
        let mut hf = Heightfield::new(resolution, vertical);
        for row in 0..resolution {
            for col in 0..resolution {
                hf.add(row, col, col as f32 / (resolution - 1) as f32);
            }
        }
        hf
    }

    fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    fn normals(mesh: &Mesh) -> Vec<[f32; 3]> {
        match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
            Some(VertexAttributeValues::Float32x3(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_vertex_and_index_counts() {
        let mesh = build_tile_mesh(&Heightfield::new(5, 10.0), 100.0);
        assert_eq!(mesh.count_vertices(), 25);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(4 * 4 * 6));
    }

    #[test]
    fn test_positions_span_tile_and_scale_height() {
        let mesh = build_tile_mesh(&ramp(5, 40.0), 1000.0);
        let pos = positions(&mesh);
        assert_eq!(pos[0], [0.0, 0.0, 0.0]);
        // Last column of the first row: x = tile size, full height.
        assert_eq!(pos[4], [1000.0, 40.0, 0.0]);
        // First column of the last row.
        assert_eq!(pos[20], [0.0, 0.0, 1000.0]);
    }

    #[test]
    fn test_flat_tile_normals_point_up() {
        let mesh = build_tile_mesh(&Heightfield::new(4, 0.0), 30.0);
        for n in normals(&mesh) {
            assert_eq!(n, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_slope_rising_along_x_tilts_normals_back() {
        let mesh = build_tile_mesh(&ramp(5, 100.0), 400.0);
        for n in normals(&mesh) {
            assert!(n[0] < 0.0, "normal {n:?} should lean towards -x");
            assert!(n[1] > 0.0);
            assert!(n[2].abs() < 1e-6);
        }
    }

    #[test]
    fn test_triangles_face_up() {
        let mesh = build_tile_mesh(&Heightfield::new(3, 0.0), 2.0);
        let pos = positions(&mesh);
        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(pos[i as usize]));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0, "triangle {tri:?} faces down");
        }
    }

    #[test]
    fn test_spacing() {
        assert_eq!(sample_spacing(257, 10000.0), 10000.0 / 256.0);
        assert_eq!(sample_spacing(2, 50.0), 50.0);
    }
}
