use bevy::prelude::*;
use bevy::window::PresentMode;

use rendering::camera::FlyCamera;
use terrain::config::{TerrainPreset, WorldConfig};
use terrain::observer::TrackedObserver;
use terrain::{RegenerateTerrain, TerrainStreamingPlugin, TerrainTile};

/// Tiles per side of the streamed grid.
const GRID_SIDE: usize = 5;
const CAMERA_ALTITUDE: f32 = 1200.0;
const CRUISE_SPEED: f32 = 800.0;

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Terrain Streamer".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.62, 0.74, 0.86)))
    .add_plugins((TerrainStreamingPlugin, rendering::TileMeshPlugin))
    .add_systems(Startup, setup_scene)
    .add_systems(Update, (regenerate_on_key, dump_preset_on_key));

    // TERRAIN_PRESET=path/to/preset.json replaces the default world.
    if let Ok(path) = std::env::var("TERRAIN_PRESET") {
        match TerrainPreset::load(&path) {
            Ok(preset) => {
                info!("Loaded terrain preset from {path}");
                preset.apply(app.world_mut());
            }
            Err(e) => error!("Ignoring terrain preset {path}: {e}"),
        }
    }

    app.run();
}

fn setup_scene(
    mut commands: Commands,
    config: Res<WorldConfig>,
    mut observer: ResMut<TrackedObserver>,
) {
    for _ in 0..GRID_SIDE * GRID_SIDE {
        commands.spawn((TerrainTile::default(), Transform::default()));
    }

    let start = Vec3::new(config.map_size * 0.5, CAMERA_ALTITUDE, config.map_size * 0.5);
    let camera = commands
        .spawn((
            Camera3d::default(),
            Transform::from_translation(start),
            FlyCamera {
                yaw: 0.0,
                cruise_speed: CRUISE_SPEED,
            },
        ))
        .id();
    observer.entity = Some(camera);

    commands.spawn((
        DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(1.0, 2.0, 0.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });
}

/// R: lay out and rebuild every tile around the camera.
fn regenerate_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    mut regenerate: EventWriter<RegenerateTerrain>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        regenerate.send(RegenerateTerrain);
    }
}

/// P: write the current settings to terrain_preset.json.
fn dump_preset_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    config: Res<WorldConfig>,
    budget: Res<terrain::budget::BudgetSettings>,
    iterations: Res<terrain::iteration::NoiseIterations>,
) {
    if !keys.just_pressed(KeyCode::KeyP) {
        return;
    }
    let preset = TerrainPreset {
        world: config.clone(),
        budget: budget.clone(),
        iterations: iterations.as_slice().to_vec(),
    };
    match preset.save("terrain_preset.json") {
        Ok(()) => info!("Saved terrain preset to terrain_preset.json"),
        Err(e) => error!("Failed to save terrain preset: {e}"),
    }
}
