use bevy::prelude::*;

use terrain::config::WorldConfig;
use terrain::TerrainTile;

use super::mesh::build_tile_mesh;

/// Heightfield generation the tile's current mesh was built from.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshedGeneration(pub u32);

/// Material shared by every tile mesh.
#[derive(Resource, Clone)]
pub struct TileMaterial(pub Handle<StandardMaterial>);

impl FromWorld for TileMaterial {
    fn from_world(world: &mut World) -> Self {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        Self(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 0.9,
            ..default()
        }))
    }
}

/// Give newly built tiles a mesh and rebuild the mesh of any tile whose
/// heightfield was committed since it was last meshed.
pub fn sync_tile_meshes(
    mut commands: Commands,
    config: Res<WorldConfig>,
    material: Res<TileMaterial>,
    mut meshes: ResMut<Assets<Mesh>>,
    tiles: Query<(
        Entity,
        &TerrainTile,
        Option<&Mesh3d>,
        Option<&MeshedGeneration>,
    )>,
) {
    for (entity, tile, mesh_handle, meshed) in &tiles {
        if !tile.is_built() {
            continue;
        }
        let generation = tile.generation();
        if meshed.is_some_and(|m| m.0 == generation) {
            continue;
        }

        let mesh = build_tile_mesh(tile.heightfield(), config.map_size);
        match mesh_handle {
            Some(handle) => {
                meshes.insert(&handle.0, mesh);
                commands.entity(entity).insert(MeshedGeneration(generation));
            }
            None => {
                commands.entity(entity).insert((
                    Mesh3d(meshes.add(mesh)),
                    MeshMaterial3d(material.0.clone()),
                    MeshedGeneration(generation),
                ));
            }
        }
    }
}
