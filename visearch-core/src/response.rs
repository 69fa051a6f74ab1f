use crate::trial::Target;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys accepted as a target report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKey {
    #[serde(rename = "lshift")]
    LeftShift,
    #[serde(rename = "rshift")]
    RightShift,
}

impl ResponseKey {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseKey::LeftShift => "lshift",
            ResponseKey::RightShift => "rshift",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResponseKey::LeftShift => "Left Shift",
            ResponseKey::RightShift => "Right Shift",
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key input relevant to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Response(ResponseKey),
    Space,
    Escape,
}

/// Counterbalancing version: which Shift key reports which target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Version {
    /// Left Shift = triangle, Right Shift = diamond
    #[default]
    A,
    /// Left Shift = diamond, Right Shift = triangle
    B,
}

impl Version {
    pub fn expected_key(&self, target: Target) -> ResponseKey {
        match (self, target) {
            (Version::A, Target::Triangle) | (Version::B, Target::Diamond) => {
                ResponseKey::LeftShift
            }
            (Version::A, Target::Diamond) | (Version::B, Target::Triangle) => {
                ResponseKey::RightShift
            }
        }
    }

    /// Button colour stickers attached to each Shift key in this version.
    pub fn button_color(&self, key: ResponseKey) -> &'static str {
        match (self, key) {
            (Version::A, ResponseKey::LeftShift) | (Version::B, ResponseKey::RightShift) => "Blue",
            (Version::A, ResponseKey::RightShift) | (Version::B, ResponseKey::LeftShift) => "Red",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::A => f.write_str("A"),
            Version::B => f.write_str("B"),
        }
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Version::A),
            "B" => Ok(Version::B),
            other => Err(format!("unknown version '{other}', expected A or B")),
        }
    }
}

/// Outcome shown to the participant after a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Wrong,
    TooFast,
    TooSlow,
}

impl Feedback {
    pub fn message(&self) -> &'static str {
        match self {
            Feedback::Correct => "correct",
            Feedback::Wrong => "wrong",
            Feedback::TooFast => "too fast",
            Feedback::TooSlow => "too slow",
        }
    }

    /// Text drawn on the feedback screen
    pub fn display_text(&self) -> &'static str {
        match self {
            Feedback::Correct => "Correct!",
            Feedback::Wrong => "Wrong!",
            Feedback::TooFast => "Too fast!",
            Feedback::TooSlow => "Too slow!",
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            Feedback::Correct => [0, 128, 0, 255],
            Feedback::Wrong => [255, 0, 0, 255],
            Feedback::TooFast | Feedback::TooSlow => [255, 255, 0, 255],
        }
    }
}
