//! Streaming passes and full regeneration.
//!
//! A streaming pass walks the grid slots in order. For each tile it asks the
//! pager where the tile belongs and the LOD resolver which detail it needs,
//! moves the tile, and starts a heightfield build when anything changed. Only
//! one build is in flight at a time; when it suspends, the pass resumes from
//! the same cell next frame. A new pass starts on the frame after the previous
//! one finished.
//!
//! `RegenerateTerrain` bypasses all of that: the grid is laid out from
//! scratch and every managed tile is rebuilt without a budget, inside a single
//! system run. A streaming build that was under way keeps running, but its
//! result is dropped because the tile's generation moved on.

use bevy::prelude::*;

use crate::budget::{BudgetSettings, BudgetState};
use crate::builder::{BudgetLimit, BuildStep, CompletedBuild, HeightfieldBuild};
use crate::config::WorldConfig;
use crate::grid_layout::TileGrid;
use crate::iteration::NoiseIterations;
use crate::lod::{self, TileResolution};
use crate::noise_source::TerrainNoise;
use crate::observer::TrackedObserver;
use crate::pager;
use crate::stats::StreamingStats;
use crate::tile::TerrainTile;

/// Lay out every tile again and rebuild all of them immediately.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct RegenerateTerrain;

pub type TileQuery<'w, 's> =
    Query<'w, 's, (Entity, &'static mut Transform, &'static mut TerrainTile)>;

/// The build under way and the tile generation it started from.
#[derive(Debug)]
struct InFlight {
    build: HeightfieldBuild,
    base_generation: u32,
}

#[derive(Debug, Default)]
enum PassState {
    #[default]
    Idle,
    Streaming {
        next_slot: usize,
        rebuild_all: bool,
        in_flight: Option<InFlight>,
    },
}

#[derive(Resource, Debug, Default)]
pub struct StreamingPass {
    state: PassState,
    rebuild_requested: bool,
}

impl StreamingPass {
    pub fn is_active(&self) -> bool {
        matches!(self.state, PassState::Streaming { .. })
    }

    /// Slot the pass will visit after the in-flight build, if streaming.
    pub fn next_slot(&self) -> Option<usize> {
        match &self.state {
            PassState::Streaming { next_slot, .. } => Some(*next_slot),
            PassState::Idle => None,
        }
    }

    pub fn in_flight(&self) -> Option<&HeightfieldBuild> {
        match &self.state {
            PassState::Streaming { in_flight, .. } => in_flight.as_ref().map(|f| &f.build),
            PassState::Idle => None,
        }
    }

    /// Rebuild every tile during the next pass, under the budget.
    pub fn request_full_rebuild(&mut self) {
        self.rebuild_requested = true;
    }

    pub fn rebuild_requested(&self) -> bool {
        self.rebuild_requested
    }

    fn begin(&mut self) {
        self.state = PassState::Streaming {
            next_slot: 0,
            rebuild_all: std::mem::take(&mut self.rebuild_requested),
            in_flight: None,
        };
    }

    fn finish(&mut self) {
        self.state = PassState::Idle;
    }
}

/// Run condition: a streaming pass is under way.
pub fn pass_in_progress(pass: Res<StreamingPass>) -> bool {
    pass.is_active()
}

/// What a visit to one tile decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlan {
    pub position: Vec3,
    pub moved: bool,
    pub detail: TileResolution,
    pub needs_build: bool,
}

pub fn plan_tile(
    position: Vec3,
    tile: &TerrainTile,
    observer: Vec3,
    config: &WorldConfig,
    tiles_per_side: usize,
    rebuild_all: bool,
) -> TilePlan {
    let page = pager::decide(position, observer, config.map_size, tiles_per_side);
    let detail = lod::decide(page.position, observer, config.map_size, config.high_res_rings);
    let needs_build = rebuild_all || page.moved || detail != tile.detail() || !tile.is_built();
    TilePlan {
        position: page.position,
        moved: page.moved,
        detail,
        needs_build,
    }
}

/// Commit a finished streaming build unless its tile moved, lost its slot, or
/// was rebuilt by someone else since `base_generation`.
fn commit_build(
    done: CompletedBuild,
    base_generation: u32,
    tiles: &mut TileQuery,
    stats: &mut StreamingStats,
) {
    let Ok((entity, transform, mut tile)) = tiles.get_mut(done.tile) else {
        return;
    };
    if transform.translation != done.origin || tile.slot.is_none() {
        warn!(
            "Discarding heightfield for {:?}: built at {} but tile is now at {}",
            entity, done.origin, transform.translation
        );
        stats.stale_discards += 1;
        return;
    }
    if tile.generation() != base_generation {
        warn!(
            "Discarding heightfield for {:?}: tile was regenerated while it was being built",
            entity
        );
        stats.stale_discards += 1;
        return;
    }
    debug!(
        "Committed {:?} heightfield for {:?} at {} (checksum {:08x})",
        done.detail,
        entity,
        done.origin,
        done.heightfield.checksum()
    );
    tile.commit(done);
    stats.tiles_rebuilt += 1;
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn stream_terrain(
    config: Res<WorldConfig>,
    iterations: Res<NoiseIterations>,
    noise: Res<TerrainNoise>,
    settings: Res<BudgetSettings>,
    grid: Res<TileGrid>,
    observer: Res<TrackedObserver>,
    transforms: Query<&Transform, Without<TerrainTile>>,
    mut tiles: TileQuery,
    mut budget: ResMut<BudgetState>,
    mut pass: ResMut<StreamingPass>,
    mut stats: ResMut<StreamingStats>,
    mut config_error_reported: Local<bool>,
) {
    if let Err(err) = config.validate() {
        if !*config_error_reported {
            error!("Terrain streaming paused: {err}");
            *config_error_reported = true;
        }
        return;
    }
    *config_error_reported = false;

    if !pass.is_active() {
        pass.begin();
    }

    let observer_at = observer.position(&transforms);
    let limit = if settings.enabled {
        BudgetLimit::PerTurn
    } else {
        BudgetLimit::Unlimited
    };

    let finished = {
        let PassState::Streaming {
            next_slot,
            rebuild_all,
            in_flight,
        } = &mut pass.state
        else {
            return;
        };

        loop {
            if let Some(flight) = in_flight.as_mut() {
                let before = flight.build.cells_evaluated();
                let step = flight.build.step(noise.source(), &mut budget, limit);
                stats.cells_evaluated += (flight.build.cells_evaluated() - before) as u64;
                if step == BuildStep::Suspended {
                    stats.suspensions += 1;
                    break false;
                }
                if let Some(done) = in_flight.take() {
                    commit_build(
                        done.build.into_result(),
                        done.base_generation,
                        &mut tiles,
                        &mut stats,
                    );
                }
            }

            let Some(entity) = grid.slot(*next_slot) else {
                break true;
            };
            *next_slot += 1;

            let Ok((_, mut transform, tile)) = tiles.get_mut(entity) else {
                continue;
            };
            let plan = plan_tile(
                transform.translation,
                &tile,
                observer_at,
                &config,
                grid.tiles_per_side(),
                *rebuild_all,
            );
            if plan.moved {
                debug!(
                    "Paging {:?} from {} to {}",
                    entity, transform.translation, plan.position
                );
                transform.translation = plan.position;
                stats.tiles_paged += 1;
            }
            if !plan.needs_build {
                continue;
            }
            if tile.is_built() && plan.detail != tile.detail() {
                stats.detail_swaps += 1;
            }

            match HeightfieldBuild::new(entity, plan.position, plan.detail, &config, &iterations) {
                Ok(build) => {
                    *in_flight = Some(InFlight {
                        build,
                        base_generation: tile.generation(),
                    })
                }
                Err(err) => warn!("Skipping terrain tile {:?}: {err}", entity),
            }
        }
    };

    if finished {
        pass.finish();
        stats.passes_completed += 1;
    }
}

#[allow(clippy::too_many_arguments)]
pub fn regenerate_all_terrain(
    mut requests: EventReader<RegenerateTerrain>,
    config: Res<WorldConfig>,
    iterations: Res<NoiseIterations>,
    noise: Res<TerrainNoise>,
    observer: Res<TrackedObserver>,
    transforms: Query<&Transform, Without<TerrainTile>>,
    mut tiles: TileQuery,
    mut grid: ResMut<TileGrid>,
    mut budget: ResMut<BudgetState>,
    mut stats: ResMut<StreamingStats>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();

    if let Err(err) = config.validate() {
        error!("Cannot regenerate terrain: {err}");
        return;
    }

    let mut entities: Vec<Entity> = tiles.iter().map(|(entity, _, _)| entity).collect();
    entities.sort();
    *grid = TileGrid::from_tiles(&entities);

    if !grid.unmanaged().is_empty() {
        warn!(
            "{} terrain tile(s) do not fit a {}x{} grid and will not be streamed",
            grid.unmanaged().len(),
            grid.tiles_per_side(),
            grid.tiles_per_side()
        );
    }
    for &entity in grid.unmanaged() {
        if let Ok((_, _, mut tile)) = tiles.get_mut(entity) {
            tile.slot = None;
        }
    }

    let observer_at = observer.position(&transforms);
    for (slot, &entity) in grid.slots().iter().enumerate() {
        let Ok((_, mut transform, mut tile)) = tiles.get_mut(entity) else {
            continue;
        };
        tile.slot = Some(slot);
        let start = grid.slot_position(slot, config.map_size);
        let plan = plan_tile(
            start,
            &tile,
            observer_at,
            &config,
            grid.tiles_per_side(),
            true,
        );
        transform.translation = plan.position;

        match HeightfieldBuild::new(entity, plan.position, plan.detail, &config, &iterations) {
            Ok(mut build) => {
                build.step(noise.source(), &mut budget, BudgetLimit::Unlimited);
                stats.cells_evaluated += build.cells_evaluated() as u64;
                tile.commit(build.into_result());
                stats.tiles_rebuilt += 1;
            }
            Err(err) => error!("Cannot build terrain tile {:?}: {err}", entity),
        }
    }

    stats.full_regenerations += 1;
    info!(
        "Generated {} terrain tile(s) in a {}x{} grid, map depth {:.1}",
        grid.len(),
        grid.tiles_per_side(),
        grid.tiles_per_side(),
        config.map_depth(iterations.total_depth())
    );
}

/// World layout changes need a fresh layout; noise changes only need every
/// tile rebuilt, which the next pass does under the budget. A new
/// `noise_seed` swaps in a Perlin source with that seed before regenerating.
/// The first run only records the startup values.
pub fn react_to_settings_change(
    config: Res<WorldConfig>,
    iterations: Res<NoiseIterations>,
    mut noise: ResMut<TerrainNoise>,
    mut pass: ResMut<StreamingPass>,
    mut regenerate: EventWriter<RegenerateTerrain>,
    mut seen_seed: Local<Option<i32>>,
) {
    let Some(seed) = *seen_seed else {
        *seen_seed = Some(config.noise_seed);
        return;
    };
    if config.is_changed() {
        if config.noise_seed != seed {
            info!("Noise seed changed from {seed} to {}", config.noise_seed);
            // The regeneration below already rebuilds every tile.
            *noise.bypass_change_detection() = TerrainNoise::perlin(config.noise_seed);
            *seen_seed = Some(config.noise_seed);
        }
        regenerate.send(RegenerateTerrain);
        return;
    }
    if iterations.is_changed() || noise.is_changed() {
        debug!("Noise settings changed; next streaming pass rebuilds every tile");
        pass.bypass_change_detection().request_full_rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::Heightfield;
    use bevy::ecs::system::SystemState;

    fn built_tile(detail: TileResolution) -> TerrainTile {
        let mut tile = TerrainTile::default();
        tile.commit(CompletedBuild {
            tile: Entity::PLACEHOLDER,
            origin: Vec3::ZERO,
            detail,
            heightfield: Heightfield::new(3, 1.0),
        });
        tile
    }

    #[test]
    fn test_settled_tile_needs_nothing() {
        let config = WorldConfig::default();
        let plan = plan_tile(
            Vec3::ZERO,
            &built_tile(TileResolution::High),
            Vec3::new(5000.0, 0.0, 5000.0),
            &config,
            3,
            false,
        );
        assert!(!plan.moved);
        assert!(!plan.needs_build);
        assert_eq!(plan.position, Vec3::ZERO);
    }

    #[test]
    fn test_unbuilt_tile_needs_build() {
        let config = WorldConfig::default();
        let plan = plan_tile(
            Vec3::ZERO,
            &TerrainTile::default(),
            Vec3::new(5000.0, 0.0, 5000.0),
            &config,
            3,
            false,
        );
        assert!(plan.needs_build);
    }

    #[test]
    fn test_detail_mismatch_needs_build_without_move() {
        let config = WorldConfig {
            high_res_rings: 0,
            ..Default::default()
        };
        // Neighbouring tile, within paging range but outside ring 0.
        let plan = plan_tile(
            Vec3::new(10000.0, 0.0, 0.0),
            &built_tile(TileResolution::High),
            Vec3::new(5000.0, 0.0, 5000.0),
            &config,
            3,
            false,
        );
        assert!(!plan.moved);
        assert_eq!(plan.detail, TileResolution::Low);
        assert!(plan.needs_build);
    }

    #[test]
    fn test_detail_uses_position_after_paging() {
        let config = WorldConfig {
            high_res_rings: 1,
            ..Default::default()
        };
        // Tile at x = -10000 is 15101 behind the observer and pages to x = 20000,
        // which is one ring ahead of the observer's tile.
        let observer = Vec3::new(10101.0, 0.0, 5000.0);
        let plan = plan_tile(
            Vec3::new(-10000.0, 0.0, 0.0),
            &built_tile(TileResolution::High),
            observer,
            &config,
            3,
            false,
        );
        assert!(plan.moved);
        assert_eq!(plan.position.x, 20000.0);
        assert_eq!(plan.detail, TileResolution::High);
    }

    #[test]
    fn test_rebuild_all_forces_build() {
        let config = WorldConfig::default();
        let plan = plan_tile(
            Vec3::ZERO,
            &built_tile(TileResolution::High),
            Vec3::new(5000.0, 0.0, 5000.0),
            &config,
            3,
            true,
        );
        assert!(plan.needs_build);
    }

    #[test]
    fn test_pass_lifecycle() {
        let mut pass = StreamingPass::default();
        assert!(!pass.is_active());
        pass.request_full_rebuild();
        pass.begin();
        assert!(pass.is_active());
        assert_eq!(pass.next_slot(), Some(0));
        assert!(!pass.rebuild_requested());
        assert!(matches!(
            pass.state,
            PassState::Streaming {
                rebuild_all: true,
                ..
            }
        ));
        pass.finish();
        assert!(!pass.is_active());
        assert!(pass.in_flight().is_none());
    }

    #[test]
    fn test_commit_skips_tile_rebuilt_meanwhile() {
        let mut world = World::new();
        let mut tile = built_tile(TileResolution::High);
        tile.slot = Some(0);
        let entity = world.spawn((Transform::default(), tile)).id();
        let low = || CompletedBuild {
            tile: entity,
            origin: Vec3::ZERO,
            detail: TileResolution::Low,
            heightfield: Heightfield::new(3, 1.0),
        };
        let mut stats = StreamingStats::default();
        let mut state: SystemState<TileQuery> = SystemState::new(&mut world);

        // Started before the tile's first commit.
        let mut tiles = state.get_mut(&mut world);
        commit_build(low(), 0, &mut tiles, &mut stats);
        assert_eq!(stats.stale_discards, 1);
        assert_eq!(stats.tiles_rebuilt, 0);

        let mut tiles = state.get_mut(&mut world);
        commit_build(low(), 1, &mut tiles, &mut stats);
        assert_eq!(stats.tiles_rebuilt, 1);

        let Some(tile) = world.get::<TerrainTile>(entity) else {
            panic!("tile despawned");
        };
        assert_eq!(tile.generation(), 2);
        assert_eq!(tile.detail(), TileResolution::Low);
    }
}
