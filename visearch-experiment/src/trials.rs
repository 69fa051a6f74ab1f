use crate::config::ExperimentConfig;
use rand::Rng;
use rand::seq::SliceRandom;
use std::ops::Range;
use visearch_core::{AppCategory, Side, Target, TrialSpec};

/// Number of cells in the target × app category × side design
pub const DESIGN_CELLS: usize = 8;

/// Every cell of the 2 × 2 × 2 design, in a fixed order.
pub fn design_cells() -> impl Iterator<Item = TrialSpec> {
    Target::ALL.into_iter().flat_map(|target| {
        AppCategory::ALL.into_iter().flat_map(move |app_category| {
            Side::ALL.into_iter().map(move |app_side| TrialSpec {
                target,
                app_category,
                app_side,
            })
        })
    })
}

/// Counterbalanced, shuffled list of `total / 8` copies of each cell.
///
/// A remainder that does not fill another full replication is dropped.
pub fn build_trials<R: Rng + ?Sized>(total: usize, rng: &mut R) -> Vec<TrialSpec> {
    let per_cell = total / DESIGN_CELLS;
    let mut trials: Vec<TrialSpec> = design_cells()
        .flat_map(|cell| std::iter::repeat_n(cell, per_cell))
        .collect();
    trials.shuffle(rng);
    trials
}

/// Training list: a full experimental-size list cut down to the training
/// count. Short lists are not guaranteed to cover every cell.
pub fn training_trials<R: Rng + ?Sized>(config: &ExperimentConfig, rng: &mut R) -> Vec<TrialSpec> {
    let mut trials = build_trials(config.trials.experimental, rng);
    trials.truncate(config.trials.training);
    trials
}

pub fn experimental_trials<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    rng: &mut R,
) -> Vec<TrialSpec> {
    build_trials(config.trials.experimental, rng)
}

/// Index ranges of each block within a list of `len` trials.
///
/// Always yields `n_blocks` ranges; ranges past the end of the list are
/// empty.
pub fn block_ranges(config: &ExperimentConfig, len: usize) -> Vec<Range<usize>> {
    let per_block = config.trials_per_block();
    (0..config.trials.blocks)
        .map(|b| {
            let start = (b * per_block).min(len);
            let end = ((b + 1) * per_block).min(len);
            start..end
        })
        .collect()
}
