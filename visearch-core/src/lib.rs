pub mod color;
pub mod layout;
pub mod response;
pub mod screen;
pub mod shape;
pub mod trial;

pub use color::{ShapeColor, PALETTE};
pub use layout::{IconPlacement, RingSlot, StimulusLayout};
pub use response::{Feedback, KeyInput, ResponseKey, Version};
pub use screen::Screen;
pub use shape::{Shape, ShapeGeometry, DISTRACTOR_SHAPES, TARGET_SHAPES};
pub use trial::{AppCategory, Side, Target, TrialResult, TrialSpec, TrialState, TABLE_COLUMNS};
