use crate::color::ShapeColor;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};

/// One of the six positions on the search ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSlot {
    pub shape: Shape,
    pub color: ShapeColor,
    /// Centre in height units, origin at screen centre, y up
    pub position: (f32, f32),
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconPlacement {
    pub file: String,
    pub position: (f32, f32),
    pub size: f32,
    pub notification: bool,
}

/// Everything a renderer needs to draw the search display of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusLayout {
    pub slots: [RingSlot; 6],
    pub target_index: usize,
    pub angle_offset_deg: f32,
    pub icon: Option<IconPlacement>,
    pub fixation_size: f32,
}

impl StimulusLayout {
    pub fn shapes(&self) -> [Shape; 6] {
        std::array::from_fn(|i| self.slots[i].shape)
    }

    pub fn colors(&self) -> [ShapeColor; 6] {
        std::array::from_fn(|i| self.slots[i].color)
    }

    pub fn target_count(&self) -> usize {
        self.slots.iter().filter(|s| s.shape.is_target()).count()
    }
}
