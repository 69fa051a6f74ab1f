use crate::layout::StimulusLayout;
use crate::response::Feedback;

/// What should be on screen right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'a> {
    Blank,
    /// Multi-line instruction text, centred
    Instruction(&'a str),
    Fixation { size: f32 },
    /// Search display with the fixation cross overlaid
    Stimulus(&'a StimulusLayout),
    Feedback(Feedback),
}

impl Screen<'_> {
    pub fn is_stimulus(&self) -> bool {
        matches!(self, Screen::Stimulus(_))
    }
}
