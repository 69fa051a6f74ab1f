use crate::color::ShapeColor;
use crate::response::{Feedback, ResponseKey};
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape the participant has to detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Triangle,
    Diamond,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Triangle, Target::Diamond];

    pub fn shape(&self) -> Shape {
        match self {
            Target::Triangle => Shape::Triangle,
            Target::Diamond => Shape::Diamond,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape().name())
    }
}

/// Category of the app icon shown alongside the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppCategory {
    Social,
    Neutral,
}

impl AppCategory {
    pub const ALL: [AppCategory; 2] = [AppCategory::Social, AppCategory::Neutral];

    /// Social icons carry a notification badge.
    pub fn shows_notification(&self) -> bool {
        matches!(self, AppCategory::Social)
    }
}

impl fmt::Display for AppCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppCategory::Social => f.write_str("social"),
            AppCategory::Neutral => f.write_str("neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// One cell of the target × app category × side design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialSpec {
    pub target: Target,
    pub app_category: AppCategory,
    pub app_side: Side,
}

/// Trial state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Fixation,
    Stimulus,
    AwaitingResponse,
    Feedback,
    Complete,
}

/// Column names of the trial table, in order.
pub const TABLE_COLUMNS: [&str; 27] = [
    "participant_id",
    "trial",
    "block",
    "practice",
    "app_type",
    "app_side",
    "target",
    "icon",
    "notification",
    "target_position",
    "shape_0",
    "color_0",
    "shape_1",
    "color_1",
    "shape_2",
    "color_2",
    "shape_3",
    "color_3",
    "shape_4",
    "color_4",
    "shape_5",
    "color_5",
    "response",
    "correct_response",
    "correct",
    "rt_ms",
    "feedback",
];

/// Recorded outcome of one completed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub participant_id: String,
    pub trial_number: usize,
    /// 0 for practice trials, 1-based for experimental blocks
    pub block_number: usize,
    pub practice: bool,
    pub app_category: AppCategory,
    pub app_side: Side,
    pub target: Target,
    pub icon: Option<String>,
    pub notification: bool,
    pub target_position: usize,
    pub shapes: [Shape; 6],
    pub colors: [ShapeColor; 6],
    pub response: Option<ResponseKey>,
    pub expected_key: ResponseKey,
    pub correct: bool,
    pub reaction_time_ms: Option<f64>,
    pub feedback: Feedback,
}

impl TrialResult {
    /// Cells of this result in `TABLE_COLUMNS` order.
    pub fn table_row(&self) -> Vec<String> {
        let flag = |b: bool| if b { "1" } else { "0" }.to_string();
        let mut row = Vec::with_capacity(TABLE_COLUMNS.len());
        row.push(self.participant_id.clone());
        row.push(self.trial_number.to_string());
        row.push(self.block_number.to_string());
        row.push(flag(self.practice));
        row.push(self.app_category.to_string());
        row.push(self.app_side.to_string());
        row.push(self.target.to_string());
        row.push(self.icon.clone().unwrap_or_default());
        row.push(flag(self.notification));
        row.push(self.target_position.to_string());
        for (shape, color) in self.shapes.iter().zip(self.colors.iter()) {
            row.push(shape.to_string());
            row.push(color.to_string());
        }
        row.push(self.response.map(|k| k.to_string()).unwrap_or_default());
        row.push(self.expected_key.to_string());
        row.push(flag(self.correct));
        row.push(
            self.reaction_time_ms
                .map(|rt| format!("{rt:.2}"))
                .unwrap_or_default(),
        );
        row.push(self.feedback.message().to_string());
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TrialResult {
        TrialResult {
            participant_id: "p01".into(),
            trial_number: 3,
            block_number: 1,
            practice: false,
            app_category: AppCategory::Social,
            app_side: Side::Left,
            target: Target::Diamond,
            icon: Some("tiktok.png".into()),
            notification: true,
            target_position: 2,
            shapes: [
                Shape::Circle,
                Shape::Square,
                Shape::Diamond,
                Shape::Hexagon,
                Shape::Trapezoid,
                Shape::Circle,
            ],
            colors: [ShapeColor::White; 6],
            response: None,
            expected_key: ResponseKey::RightShift,
            correct: false,
            reaction_time_ms: None,
            feedback: Feedback::TooSlow,
        }
    }

    #[test]
    fn row_matches_column_count() {
        let row = sample().table_row();
        assert_eq!(row.len(), TABLE_COLUMNS.len());
        assert_eq!(row[9], "2");
        assert_eq!(row[14], "diamond");
        assert_eq!(row[22], "");
        assert_eq!(row[23], "rshift");
        assert_eq!(row[24], "0");
        assert_eq!(row[25], "");
        assert_eq!(row[26], "too slow");
    }

    #[test]
    fn reaction_time_is_rounded() {
        let mut r = sample();
        r.reaction_time_ms = Some(512.3456);
        r.response = Some(ResponseKey::LeftShift);
        let row = r.table_row();
        assert_eq!(row[25], "512.35");
        assert_eq!(row[22], "lshift");
    }
}
