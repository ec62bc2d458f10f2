use bevy::prelude::*;

use terrain::sets::TerrainSet;

pub mod camera;
pub mod tile_mesh;

use tile_mesh::TileMaterial;

/// Meshes committed terrain tiles and drives the fly camera.
///
/// Expects `DefaultPlugins` (for the PBR material assets) and
/// `TerrainStreamingPlugin` to be added first.
pub struct TileMeshPlugin;

impl Plugin for TileMeshPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                camera::fly_camera_keyboard.before(TerrainSet::Observe),
                tile_mesh::sync_tile_meshes.after(TerrainSet::Report),
            ),
        );
    }

    fn finish(&self, app: &mut App) {
        app.init_resource::<TileMaterial>();
    }
}
