use bevy::prelude::*;

use crate::budget::BudgetState;

/// Seconds between streaming summaries in the log.
pub const STATS_LOG_INTERVAL_SECS: u64 = 10;

/// Running totals since startup.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub passes_completed: u64,
    pub full_regenerations: u64,
    pub tiles_paged: u64,
    pub detail_swaps: u64,
    pub tiles_rebuilt: u64,
    pub suspensions: u64,
    pub cells_evaluated: u64,
    /// Builds thrown away because their tile moved meanwhile or a
    /// regeneration replaced them.
    pub stale_discards: u64,
}

pub fn log_streaming_stats(stats: Res<StreamingStats>, budget: Res<BudgetState>) {
    let fps = budget
        .smoothed_fps()
        .map(|fps| format!("{fps:.0}"))
        .unwrap_or_else(|| "-".to_string());
    info!(
        "Terrain streaming: {} passes, {} tiles rebuilt, {} paged, {} detail swaps, {} cells, budget {} cells/frame at {} fps",
        stats.passes_completed,
        stats.tiles_rebuilt,
        stats.tiles_paged,
        stats.detail_swaps,
        stats.cells_evaluated,
        budget.cells_per_turn,
        fps
    );
}
