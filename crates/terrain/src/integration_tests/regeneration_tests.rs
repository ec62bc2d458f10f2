use bevy::prelude::*;

use crate::config::{TerrainPreset, WorldConfig};
use crate::iteration::{NoiseIteration, NoiseIterations};
use crate::noise_source::TerrainNoise;
use crate::observer::TrackedObserver;
use crate::stats::StreamingStats;
use crate::streaming::StreamingPass;
use crate::test_harness::TestTerrain;

fn small_world() -> WorldConfig {
    WorldConfig {
        resolution: 9,
        distant_resolution: 5,
        ..Default::default()
    }
}

fn checksums(terrain: &mut TestTerrain) -> Vec<u32> {
    terrain
        .tiles()
        .iter()
        .map(|(_, _, tile)| tile.heightfield().checksum())
        .collect()
}

// ====================================================================
// RegenerateTerrain
// ====================================================================

#[test]
fn test_regenerate_restores_layout_and_rebuilds_everything() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .unbudgeted()
        .with_tiles(9)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);
    let layout = terrain.tile_positions();

    let stray = terrain.tiles()[2].0;
    if let Some(mut transform) = terrain.world_mut().get_mut::<Transform>(stray) {
        transform.translation = Vec3::new(777.0, 3.0, -777.0);
    }
    terrain.regenerate();
    terrain.tick(1);

    assert_eq!(terrain.tile_positions(), layout);
    assert_eq!(terrain.generations(), vec![2; 9]);
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 2);
}

#[test]
fn test_regenerate_ignores_the_budget() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .with_fixed_budget(1)
        .with_tiles(9)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);
    terrain.assert_all_built();

    terrain.regenerate();
    terrain.tick(1);
    assert_eq!(terrain.generations(), vec![2; 9]);
}

#[test]
fn test_regenerate_is_deterministic() {
    let build = || {
        let mut terrain = TestTerrain::new()
            .with_world(small_world())
            .with_tiles(4)
            .with_observer_at(Vec3::new(1234.0, 0.0, -987.0));
        terrain.tick(1);
        checksums(&mut terrain)
    };
    assert_eq!(build(), build());
}

#[test]
fn test_new_observer_triggers_regeneration() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .with_tiles(4)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(3);
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 1);

    let other = terrain
        .world_mut()
        .spawn(Transform::from_xyz(300.0, 0.0, 300.0))
        .id();
    terrain.resource_mut::<TrackedObserver>().entity = Some(other);
    terrain.tick(1);
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 2);
    assert_eq!(terrain.generations(), vec![2; 4]);

    terrain.tick(3);
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 2);
}

#[test]
fn test_stale_streaming_build_is_discarded() {
    let mut terrain = TestTerrain::new()
        .with_world(WorldConfig::default())
        .with_fixed_budget(10000)
        .with_tiles(1)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);

    // Start a budgeted build for the paged position...
    terrain.move_observer(Vec3::new(10200.0, 0.0, 0.0));
    terrain.tick(1);
    assert_eq!(terrain.tile(0).0, Vec3::new(10000.0, 0.0, 0.0));

    // ...then pull the tile back to its slot before that build finishes.
    terrain.move_observer(Vec3::ZERO);
    terrain.regenerate();
    terrain.tick(1);
    assert_eq!(terrain.tile(0).0, Vec3::ZERO);
    assert_eq!(terrain.tile(0).1.generation(), 2);

    terrain.tick(10);
    let (position, tile) = terrain.tile(0);
    assert_eq!(position, Vec3::ZERO);
    assert_eq!(tile.generation(), 2, "stale heights must not be committed");
    assert_eq!(terrain.resource::<StreamingStats>().stale_discards, 1);
}

// ====================================================================
// Settings edits
// ====================================================================

#[test]
fn test_world_config_edit_relays_out_grid() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .unbudgeted()
        .with_tiles(9)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);

    terrain.resource_mut::<WorldConfig>().map_size = 500.0;
    terrain.tick(1);

    assert_eq!(terrain.tile(0).0, Vec3::new(-500.0, 0.0, -500.0));
    assert_eq!(terrain.tile(8).0, Vec3::new(500.0, 0.0, 500.0));
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 2);
}

#[test]
fn test_world_config_edit_supersedes_unfinished_build() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .with_fixed_budget(10)
        .with_tiles(9)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);

    // A second layer starts a budgeted rebuild of every tile.
    terrain
        .resource_mut::<NoiseIterations>()
        .push(NoiseIteration {
            name: "Hills".into(),
            depth: 8,
            scale: 4.0,
            ..Default::default()
        });
    terrain.tick(2);
    assert!(terrain.resource::<StreamingPass>().in_flight().is_some());

    terrain.resource_mut::<WorldConfig>().world_offset = Vec2::new(37.0, -11.0);
    terrain.tick_until_idle(5000);
    terrain.tick(3);
    assert_eq!(terrain.resource::<StreamingStats>().stale_discards, 1);
    let streamed = checksums(&mut terrain);

    terrain.regenerate();
    terrain.tick(1);
    assert_eq!(
        streamed,
        checksums(&mut terrain),
        "every tile must carry heights from the edited world"
    );
}

#[test]
fn test_noise_seed_edit_reseeds_terrain() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .unbudgeted()
        .with_tiles(4)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);
    let before = checksums(&mut terrain);

    terrain.resource_mut::<WorldConfig>().noise_seed = 4242;
    terrain.tick(1);
    let after = checksums(&mut terrain);
    assert_ne!(after, before);
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 2);

    let mut fresh = TestTerrain::new()
        .with_world(WorldConfig {
            noise_seed: 4242,
            ..small_world()
        })
        .unbudgeted()
        .with_tiles(4)
        .with_observer_at(Vec3::ZERO);
    fresh.tick(1);
    assert_eq!(after, checksums(&mut fresh));

    // The swap alone must not queue a second, progressive rebuild.
    terrain.tick(3);
    assert_eq!(terrain.generations(), vec![2; 4]);
}

#[test]
fn test_reseeding_noise_rebuilds_every_tile() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .unbudgeted()
        .with_tiles(4)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);
    let before = checksums(&mut terrain);

    terrain.world_mut().insert_resource(TerrainNoise::perlin(99));
    terrain.tick(1);

    assert_eq!(terrain.generations(), vec![2; 4]);
    assert_ne!(checksums(&mut terrain), before);
    // Progressive rebuild, not a re-layout.
    assert_eq!(terrain.resource::<StreamingStats>().full_regenerations, 1);
}

#[test]
fn test_applying_a_preset_regenerates_with_new_world() {
    let mut terrain = TestTerrain::new()
        .with_world(small_world())
        .with_tiles(9)
        .with_observer_at(Vec3::ZERO);
    terrain.tick(1);

    let preset = TerrainPreset::from_json_str(
        r#"{
            "world": { "resolution": 17, "distant_resolution": 5, "map_size": 2000.0 },
            "budget": { "enabled": false },
            "iterations": [ { "name": "Base", "depth": 12 } ]
        }"#,
    )
    .expect("preset parses");
    preset.apply(terrain.world_mut());
    terrain.tick(1);

    let (position, tile) = terrain.tile(0);
    assert_eq!(position, Vec3::new(-2000.0, 0.0, -2000.0));
    assert_eq!(tile.heightfield().resolution(), 17);
    assert!((tile.heightfield().vertical_size() - 72.0).abs() < 1e-3);
}
