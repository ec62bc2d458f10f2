//! Per-frame limit on height evaluations and its adaptive controller.
//!
//! `BudgetState` counts cells evaluated since the last suspension. While a
//! streaming pass is running, `adapt_budget` nudges the budget up by a fixed
//! step whenever the smoothed frame rate is above target and down (never
//! below the floor) otherwise.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_BUDGET_STEP, DEFAULT_CELL_BUDGET, DEFAULT_TARGET_FPS, MIN_CELL_BUDGET};

/// Weight of the newest frame time in the moving average.
const FRAME_TIME_SMOOTHING: f32 = 0.1;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// When off, every build runs to completion in the turn it starts.
    pub enabled: bool,
    /// Cells evaluated per turn before a build yields.
    pub cells_per_turn: u32,
    pub adaptive: bool,
    pub target_fps: f32,
    pub step: u32,
    pub min_cells_per_turn: u32,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cells_per_turn: DEFAULT_CELL_BUDGET,
            adaptive: true,
            target_fps: DEFAULT_TARGET_FPS,
            step: DEFAULT_BUDGET_STEP,
            min_cells_per_turn: MIN_CELL_BUDGET,
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct BudgetState {
    /// Current per-turn cell budget.
    pub cells_per_turn: u32,
    /// Cells evaluated since the last suspension.
    pub evaluated: u32,
    smoothed_frame_time: Option<f32>,
}

impl Default for BudgetState {
    fn default() -> Self {
        Self::from_settings(&BudgetSettings::default())
    }
}

impl BudgetState {
    pub fn from_settings(settings: &BudgetSettings) -> Self {
        Self {
            cells_per_turn: settings.cells_per_turn,
            evaluated: 0,
            smoothed_frame_time: None,
        }
    }

    /// Count one evaluated cell.
    #[inline]
    pub fn record(&mut self) {
        self.evaluated = self.evaluated.saturating_add(1);
    }

    pub fn exhausted(&self) -> bool {
        self.evaluated >= self.cells_per_turn
    }

    /// Called when a build yields; the next turn starts from zero.
    pub fn reset_turn(&mut self) {
        self.evaluated = 0;
    }

    pub fn smoothed_fps(&self) -> Option<f32> {
        self.smoothed_frame_time
            .filter(|t| *t > 0.0)
            .map(|t| 1.0 / t)
    }

    /// Fold one frame time into the average and move the budget one step.
    pub fn adapt(&mut self, settings: &BudgetSettings, frame_time_secs: f32) {
        let smoothed = match self.smoothed_frame_time {
            Some(prev) => {
                prev * (1.0 - FRAME_TIME_SMOOTHING) + frame_time_secs * FRAME_TIME_SMOOTHING
            }
            None => frame_time_secs,
        };
        self.smoothed_frame_time = Some(smoothed);

        let fps = 1.0 / smoothed;
        self.cells_per_turn = if fps > settings.target_fps {
            self.cells_per_turn.saturating_add(settings.step)
        } else {
            self.cells_per_turn
                .saturating_sub(settings.step)
                .max(settings.min_cells_per_turn)
        };
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Runs once per turn, only while a streaming pass is in progress.
pub fn adapt_budget(
    time: Res<Time>,
    settings: Res<BudgetSettings>,
    mut budget: ResMut<BudgetState>,
) {
    if !settings.enabled || !settings.adaptive {
        return;
    }
    let dt = time.delta_secs();
    if dt > 0.0 {
        budget.adapt(&settings, dt);
    }
}

/// Restart from the configured base budget when the settings are edited after
/// startup.
pub fn apply_budget_settings(
    settings: Res<BudgetSettings>,
    mut budget: ResMut<BudgetState>,
    mut primed: Local<bool>,
) {
    if !*primed {
        *primed = true;
        return;
    }
    if settings.is_changed() {
        *budget = BudgetState::from_settings(&settings);
    }
}
