use std::time::Duration;

use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;

pub mod budget;
pub mod builder;
pub mod config;
pub mod depth_curve;
pub mod error;
pub mod grid_layout;
pub mod heightfield;
pub mod iteration;
pub mod lod;
pub mod noise_source;
pub mod observer;
pub mod pager;
pub mod sets;
pub mod stats;
pub mod streaming;
pub mod synthesizer;
pub mod tile;

#[cfg(test)]
mod integration_tests;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

use budget::{BudgetSettings, BudgetState};
use config::WorldConfig;
use grid_layout::TileGrid;
use iteration::NoiseIterations;
use noise_source::TerrainNoise;
use observer::TrackedObserver;
use sets::TerrainSet;
use stats::{StreamingStats, STATS_LOG_INTERVAL_SECS};
use streaming::StreamingPass;

pub use error::TerrainError;
pub use streaming::RegenerateTerrain;
pub use tile::TerrainTile;

/// Streams terrain tiles around `TrackedObserver`.
///
/// Resources inserted before the plugin (world config, budget settings,
/// iterations, noise) are kept; missing ones get their defaults.
pub struct TerrainStreamingPlugin;

impl Plugin for TerrainStreamingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldConfig>()
            .init_resource::<BudgetSettings>()
            .init_resource::<NoiseIterations>()
            .init_resource::<TrackedObserver>()
            .init_resource::<TileGrid>()
            .init_resource::<StreamingPass>()
            .init_resource::<StreamingStats>()
            .add_event::<RegenerateTerrain>();

        if !app.world().contains_resource::<TerrainNoise>() {
            let seed = app.world().resource::<WorldConfig>().noise_seed;
            app.insert_resource(TerrainNoise::perlin(seed));
        }
        if !app.world().contains_resource::<BudgetState>() {
            let state = BudgetState::from_settings(app.world().resource::<BudgetSettings>());
            app.insert_resource(state);
        }

        app.configure_sets(
            Update,
            (
                TerrainSet::Observe,
                TerrainSet::Regenerate,
                TerrainSet::Budget,
                TerrainSet::Stream,
                TerrainSet::Report,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                observer::detect_observer_change,
                streaming::react_to_settings_change,
            )
                .chain()
                .in_set(TerrainSet::Observe),
        )
        .add_systems(
            Update,
            streaming::regenerate_all_terrain.in_set(TerrainSet::Regenerate),
        )
        .add_systems(
            Update,
            (
                budget::apply_budget_settings,
                budget::adapt_budget.run_if(streaming::pass_in_progress),
            )
                .chain()
                .in_set(TerrainSet::Budget),
        )
        .add_systems(Update, streaming::stream_terrain.in_set(TerrainSet::Stream))
        .add_systems(
            Update,
            stats::log_streaming_stats
                .run_if(on_timer(Duration::from_secs(STATS_LOG_INTERVAL_SECS)))
                .in_set(TerrainSet::Report),
        );
    }
}
