use serde::{Deserialize, Serialize};
use std::fmt;

/// Outline colour of a ring shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeColor {
    Green,
    Yellow,
    Blue,
    Red,
    White,
    Black,
}

/// Palette shuffled across the six slots when colour mode is on
pub const PALETTE: [ShapeColor; 6] = [
    ShapeColor::Green,
    ShapeColor::Yellow,
    ShapeColor::Blue,
    ShapeColor::Red,
    ShapeColor::White,
    ShapeColor::Black,
];

impl ShapeColor {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeColor::Green => "green",
            ShapeColor::Yellow => "yellow",
            ShapeColor::Blue => "blue",
            ShapeColor::Red => "red",
            ShapeColor::White => "white",
            ShapeColor::Black => "black",
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            ShapeColor::Green => [0, 128, 0, 255],
            ShapeColor::Yellow => [255, 255, 0, 255],
            ShapeColor::Blue => [0, 0, 255, 255],
            ShapeColor::Red => [255, 0, 0, 255],
            ShapeColor::White => [255, 255, 255, 255],
            ShapeColor::Black => [0, 0, 0, 255],
        }
    }
}

impl fmt::Display for ShapeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
