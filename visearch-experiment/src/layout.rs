use crate::config::ExperimentConfig;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::path::Path;
use tracing::warn;
use visearch_core::{
    AppCategory, DISTRACTOR_SHAPES, IconPlacement, PALETTE, RingSlot, Shape, ShapeColor, Side,
    StimulusLayout, TrialSpec,
};

/// Horizontal offset of a side-placed icon, in height units
const SIDE_ICON_X: f32 = 0.45;

/// How the five distractor slots are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistractorPolicy {
    /// Every distractor shape once, plus one forced duplicate
    Unique,
    /// Five independent draws with replacement
    Independent,
}

impl DistractorPolicy {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        if config.shapes.unique_shapes {
            DistractorPolicy::Unique
        } else {
            DistractorPolicy::Independent
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> [Shape; 5] {
        match self {
            DistractorPolicy::Unique => {
                let mut pool = DISTRACTOR_SHAPES;
                pool.shuffle(rng);
                let extra = pool[rng.random_range(0..pool.len())];
                let mut drawn = [pool[0], pool[1], pool[2], pool[3], extra];
                drawn.shuffle(rng);
                drawn
            }
            DistractorPolicy::Independent => {
                std::array::from_fn(|_| DISTRACTOR_SHAPES[rng.random_range(0..DISTRACTOR_SHAPES.len())])
            }
        }
    }
}

/// Icon images that were found on disk, per category
#[derive(Debug, Clone, Default)]
pub struct IconPool {
    pub social: Vec<String>,
    pub neutral: Vec<String>,
}

impl IconPool {
    /// Keeps only the configured icons that exist under `base_dir`.
    pub fn scan(base_dir: &Path, config: &ExperimentConfig) -> Self {
        let existing = |files: &[String]| -> Vec<String> {
            files
                .iter()
                .filter(|f| base_dir.join(f).is_file())
                .cloned()
                .collect()
        };
        let pool = Self {
            social: existing(&config.social_apps),
            neutral: existing(&config.neutral_apps),
        };
        if pool.social.is_empty() {
            warn!(dir = %base_dir.display(), "no social app icons found");
        }
        if pool.neutral.is_empty() {
            warn!(dir = %base_dir.display(), "no neutral app icons found");
        }
        pool
    }

    pub fn category(&self, category: AppCategory) -> &[String] {
        match category {
            AppCategory::Social => &self.social,
            AppCategory::Neutral => &self.neutral,
        }
    }
}

/// Builds the search display for one trial.
pub fn generate_layout<R: Rng + ?Sized>(
    spec: &TrialSpec,
    config: &ExperimentConfig,
    icons: &IconPool,
    rng: &mut R,
) -> StimulusLayout {
    let icon = icons
        .category(spec.app_category)
        .choose(rng)
        .map(|file| IconPlacement {
            file: file.clone(),
            position: icon_position(config, spec.app_side),
            size: config.icon.size,
            notification: spec.app_category.shows_notification(),
        });

    let angle_offset_deg = rng.random::<f32>() * 360.0;
    let target_index = rng.random_range(0..6);

    let colors: [ShapeColor; 6] = if config.shapes.use_colors {
        let mut palette = PALETTE;
        palette.shuffle(rng);
        palette
    } else {
        [ShapeColor::White; 6]
    };

    let distractors = DistractorPolicy::from_config(config).draw(rng);
    let mut next_distractor = distractors.into_iter();
    let radius = config.shapes.radius;

    let slots = std::array::from_fn(|i| {
        let angle = (angle_offset_deg + i as f32 * 60.0).to_radians();
        let position = (radius * angle.cos(), radius * angle.sin());
        let (shape, size) = if i == target_index {
            (spec.target.shape(), config.shapes.target_size)
        } else {
            (
                next_distractor.next().unwrap_or(Shape::Circle),
                config.shapes.distractor_size,
            )
        };
        RingSlot {
            shape,
            color: colors[i],
            position,
            size,
        }
    });

    StimulusLayout {
        slots,
        target_index,
        angle_offset_deg,
        icon,
        fixation_size: config.shapes.fixation_size,
    }
}

fn icon_position(config: &ExperimentConfig, side: Side) -> (f32, f32) {
    if config.icon.in_center {
        (0.0, 0.0)
    } else {
        match side {
            Side::Left => (-SIDE_ICON_X, 0.0),
            Side::Right => (SIDE_ICON_X, 0.0),
        }
    }
}
