//! # TestTerrain: headless harness for the streaming systems
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + `TerrainStreamingPlugin`
//! and a fixed frame duration, so tests can spawn tiles and an observer, tick
//! frames, and inspect tile positions, heightfields and resources.
//!
//! Nothing runs until the first `tick`; that first frame performs the initial
//! full regeneration.

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::budget::{BudgetSettings, BudgetState};
use crate::config::WorldConfig;
use crate::iteration::{NoiseIteration, NoiseIterations};
use crate::noise_source::{NoiseSource, TerrainNoise};
use crate::observer::TrackedObserver;
use crate::streaming::RegenerateTerrain;
use crate::tile::TerrainTile;
use crate::TerrainStreamingPlugin;

/// Frame rate the harness simulates unless told otherwise.
pub const DEFAULT_TEST_FPS: f32 = 120.0;

pub struct TestTerrain {
    app: App,
    observer: Option<Entity>,
}

impl Default for TestTerrain {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTerrain {
    // -----------------------------------------------------------------------
    // Construction (builder pattern, consumes and returns Self)
    // -----------------------------------------------------------------------

    /// An app with default settings, no tiles and no observer.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(
            Duration::from_secs_f32(1.0 / DEFAULT_TEST_FPS),
        ));
        app.add_plugins(TerrainStreamingPlugin);
        Self {
            app,
            observer: None,
        }
    }

    /// Replace the world config and reseed the Perlin source from it. Call
    /// `with_noise` afterwards to use a different source.
    pub fn with_world(mut self, config: WorldConfig) -> Self {
        let world = self.app.world_mut();
        world.insert_resource(TerrainNoise::perlin(config.noise_seed));
        world.insert_resource(config);
        self
    }

    pub fn with_budget(mut self, settings: BudgetSettings) -> Self {
        let world = self.app.world_mut();
        world.insert_resource(BudgetState::from_settings(&settings));
        world.insert_resource(settings);
        self
    }

    /// Budget switched off: every build completes in the frame it starts.
    pub fn unbudgeted(self) -> Self {
        self.with_budget(BudgetSettings {
            enabled: false,
            ..Default::default()
        })
    }

    /// Fixed per-frame budget with adaptation switched off.
    pub fn with_fixed_budget(self, cells_per_turn: u32) -> Self {
        self.with_budget(BudgetSettings {
            cells_per_turn,
            adaptive: false,
            ..Default::default()
        })
    }

    pub fn with_iterations(mut self, iterations: Vec<NoiseIteration>) -> Self {
        self.app
            .world_mut()
            .insert_resource(NoiseIterations::new(iterations));
        self
    }

    pub fn with_noise(mut self, source: impl NoiseSource + 'static) -> Self {
        self.app.world_mut().insert_resource(TerrainNoise::new(source));
        self
    }

    pub fn with_frame_rate(mut self, fps: f32) -> Self {
        self.set_frame_rate(fps);
        self
    }

    /// Spawn `count` unbuilt tiles at the origin.
    pub fn with_tiles(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.app
                .world_mut()
                .spawn((TerrainTile::default(), Transform::default()));
        }
        self
    }

    /// Spawn an observer entity at `position` and track it.
    pub fn with_observer_at(mut self, position: Vec3) -> Self {
        let entity = self
            .app
            .world_mut()
            .spawn(Transform::from_translation(position))
            .id();
        self.app
            .world_mut()
            .insert_resource(TrackedObserver::new(entity));
        self.observer = Some(entity);
        self
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Run `n` frames.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Tick until no streaming pass is running (or `max_frames` is reached).
    /// Returns the number of frames run.
    pub fn tick_until_idle(&mut self, max_frames: u32) -> u32 {
        for frame in 1..=max_frames {
            self.app.update();
            if !self
                .resource::<crate::streaming::StreamingPass>()
                .is_active()
            {
                return frame;
            }
        }
        max_frames
    }

    pub fn set_frame_rate(&mut self, fps: f32) {
        self.app
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
                1.0 / fps,
            )));
    }

    pub fn move_observer(&mut self, position: Vec3) {
        let Some(entity) = self.observer else {
            panic!("move_observer called without with_observer_at");
        };
        if let Some(mut transform) = self.app.world_mut().get_mut::<Transform>(entity) {
            transform.translation = position;
        }
    }

    pub fn despawn_observer(&mut self) {
        if let Some(entity) = self.observer.take() {
            self.app.world_mut().despawn(entity);
        }
    }

    pub fn regenerate(&mut self) {
        self.app.world_mut().send_event(RegenerateTerrain);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn resource_mut<T: Resource>(&mut self) -> Mut<'_, T> {
        self.app.world_mut().resource_mut::<T>()
    }

    pub fn observer(&self) -> Option<Entity> {
        self.observer
    }

    /// Managed tiles ordered by slot: (entity, position, tile).
    pub fn tiles(&mut self) -> Vec<(Entity, Vec3, TerrainTile)> {
        let world = self.app.world_mut();
        let mut query = world.query::<(Entity, &Transform, &TerrainTile)>();
        let mut tiles: Vec<(Entity, Vec3, TerrainTile)> = query
            .iter(world)
            .filter(|(_, _, tile)| tile.slot.is_some())
            .map(|(entity, transform, tile)| (entity, transform.translation, tile.clone()))
            .collect();
        tiles.sort_by_key(|(_, _, tile)| tile.slot);
        tiles
    }

    /// Tiles left out of the grid.
    pub fn unmanaged_tiles(&mut self) -> Vec<TerrainTile> {
        let world = self.app.world_mut();
        let mut query = world.query::<&TerrainTile>();
        query
            .iter(world)
            .filter(|tile| tile.slot.is_none())
            .cloned()
            .collect()
    }

    pub fn tile(&mut self, slot: usize) -> (Vec3, TerrainTile) {
        let tiles = self.tiles();
        let Some((_, position, tile)) = tiles.into_iter().find(|(_, _, t)| t.slot == Some(slot))
        else {
            panic!("Expected a tile in slot {slot}");
        };
        (position, tile)
    }

    pub fn tile_positions(&mut self) -> Vec<Vec3> {
        self.tiles().into_iter().map(|(_, pos, _)| pos).collect()
    }

    pub fn generations(&mut self) -> Vec<u32> {
        self.tiles()
            .into_iter()
            .map(|(_, _, tile)| tile.generation())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_resource_exists<T: Resource>(&self) {
        assert!(
            self.app.world().get_resource::<T>().is_some(),
            "Expected resource {} to exist",
            std::any::type_name::<T>()
        );
    }

    pub fn assert_all_built(&mut self) {
        for (entity, _, tile) in self.tiles() {
            assert!(tile.is_built(), "Expected tile {entity:?} to be built");
        }
    }
}
