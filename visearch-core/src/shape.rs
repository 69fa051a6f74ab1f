use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shapes that can occupy a ring slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Triangle,
    Diamond,
    Circle,
    Square,
    Hexagon,
    Trapezoid,
}

/// Shapes a participant searches for
pub const TARGET_SHAPES: [Shape; 2] = [Shape::Triangle, Shape::Diamond];

/// Shapes that are never a target
pub const DISTRACTOR_SHAPES: [Shape; 4] =
    [Shape::Circle, Shape::Square, Shape::Hexagon, Shape::Trapezoid];

/// Renderer-facing geometry of a shape, centred on the origin.
///
/// Coordinates use height units with the y axis pointing up, so a
/// renderer only has to scale by the screen height and flip y.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// Closed outline through the given vertices
    Polygon(Vec<(f32, f32)>),
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Triangle => "triangle",
            Shape::Diamond => "diamond",
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Hexagon => "hexagon",
            Shape::Trapezoid => "trapezoid",
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Shape::Triangle | Shape::Diamond)
    }

    /// Outline of this shape for a bounding size of `size`.
    pub fn geometry(&self, size: f32) -> ShapeGeometry {
        let half = size / 2.0;
        match self {
            Shape::Diamond => ShapeGeometry::Polygon(vec![
                (0.0, half),
                (half * 0.866, 0.0),
                (0.0, -half),
                (-half * 0.866, 0.0),
            ]),
            Shape::Triangle => ShapeGeometry::Polygon(vec![
                (0.0, half),
                (half * 0.866, -half),
                (-half * 0.866, -half),
            ]),
            Shape::Hexagon => ShapeGeometry::Polygon(
                (0..6)
                    .map(|k| {
                        let a = (k as f32 * 60.0).to_radians();
                        (a.cos() * half, a.sin() * half)
                    })
                    .collect(),
            ),
            Shape::Trapezoid => ShapeGeometry::Polygon(vec![
                (half * 0.7, half),
                (half, -half),
                (-half, -half),
                (-half * 0.7, half),
            ]),
            Shape::Circle => ShapeGeometry::Circle { radius: half },
            Shape::Square => ShapeGeometry::Rect {
                width: size * 0.866,
                height: size * 0.866,
            },
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangle" => Ok(Shape::Triangle),
            "diamond" => Ok(Shape::Diamond),
            "circle" => Ok(Shape::Circle),
            "square" => Ok(Shape::Square),
            "hexagon" => Ok(Shape::Hexagon),
            "trapezoid" => Ok(Shape::Trapezoid),
            other => Err(format!("unknown shape '{other}'")),
        }
    }
}
