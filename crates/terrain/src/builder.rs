//! Resumable, budget-limited heightfield construction.
//!
//! A `HeightfieldBuild` owns everything it needs (tile identity, origin,
//! detail level, world settings and the enabled noise layers), captured when
//! it is created. `step` evaluates cells in layer → row → column order and
//! returns `Suspended` as soon as the turn's budget is spent, leaving the
//! cursor on the next unevaluated cell.

use bevy::prelude::*;

use crate::budget::BudgetState;
use crate::config::{WorldConfig, MIN_RESOLUTION};
use crate::error::TerrainError;
use crate::heightfield::Heightfield;
use crate::iteration::{NoiseIteration, NoiseIterations};
use crate::lod::TileResolution;
use crate::noise_source::NoiseSource;
use crate::synthesizer::HeightSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLimit {
    /// Yield whenever the shared per-turn budget is exhausted.
    PerTurn,
    /// Run to completion and leave the shared counter alone.
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Suspended,
    Complete,
}

/// Position of the next cell to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildCursor {
    pub iteration: usize,
    pub x: usize,
    pub y: usize,
}

#[derive(Debug)]
pub struct HeightfieldBuild {
    tile: Entity,
    origin: Vec3,
    detail: TileResolution,
    config: WorldConfig,
    layers: Vec<NoiseIteration>,
    total_depth: u32,
    cursor: BuildCursor,
    heights: Heightfield,
    evaluated: usize,
}

/// A finished build, ready to be committed to its tile.
#[derive(Debug)]
pub struct CompletedBuild {
    pub tile: Entity,
    pub origin: Vec3,
    pub detail: TileResolution,
    pub heightfield: Heightfield,
}

impl HeightfieldBuild {
    pub fn new(
        tile: Entity,
        origin: Vec3,
        detail: TileResolution,
        config: &WorldConfig,
        iterations: &NoiseIterations,
    ) -> Result<Self, TerrainError> {
        let resolution = detail.samples(config);
        if resolution < MIN_RESOLUTION {
            return Err(TerrainError::ResolutionTooSmall {
                resolution,
                minimum: MIN_RESOLUTION,
            });
        }

        let layers: Vec<NoiseIteration> = iterations.enabled().cloned().collect();
        let total_depth = iterations.total_depth();
        Ok(Self {
            tile,
            origin,
            detail,
            config: config.clone(),
            layers,
            total_depth,
            cursor: BuildCursor::default(),
            heights: Heightfield::new(resolution, config.map_depth(total_depth)),
            evaluated: 0,
        })
    }

    pub fn tile(&self) -> Entity {
        self.tile
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn detail(&self) -> TileResolution {
        self.detail
    }

    pub fn cursor(&self) -> BuildCursor {
        self.cursor
    }

    pub fn cells_evaluated(&self) -> usize {
        self.evaluated
    }

    /// Cells this build evaluates in total.
    pub fn total_cells(&self) -> usize {
        self.layers.len() * self.heights.cell_count()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor.iteration >= self.layers.len()
    }

    pub fn step(
        &mut self,
        noise: &dyn NoiseSource,
        budget: &mut BudgetState,
        limit: BudgetLimit,
    ) -> BuildStep {
        let synth = HeightSynthesizer::new(&self.config, noise);
        let resolution = self.heights.resolution();

        while self.cursor.iteration < self.layers.len() {
            let BuildCursor { iteration, x, y } = self.cursor;
            let h = synth.octave_height(
                x,
                y,
                resolution,
                self.origin,
                &self.layers[iteration],
                self.total_depth,
            );
            self.heights.add(x, y, h);
            self.evaluated += 1;
            self.cursor = advance(self.cursor, resolution);

            if limit == BudgetLimit::PerTurn {
                budget.record();
                if budget.exhausted() && self.cursor.iteration < self.layers.len() {
                    budget.reset_turn();
                    return BuildStep::Suspended;
                }
            }
        }
        BuildStep::Complete
    }

    pub fn into_result(self) -> CompletedBuild {
        CompletedBuild {
            tile: self.tile,
            origin: self.origin,
            detail: self.detail,
            heightfield: self.heights,
        }
    }
}

fn advance(cursor: BuildCursor, resolution: usize) -> BuildCursor {
    let BuildCursor {
        mut iteration,
        mut x,
        mut y,
    } = cursor;
    y += 1;
    if y == resolution {
        y = 0;
        x += 1;
        if x == resolution {
            x = 0;
            iteration += 1;
        }
    }
    BuildCursor { iteration, x, y }
}
