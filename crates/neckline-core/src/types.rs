use serde::{Deserialize, Serialize};

/// Integer pixel coordinate, y increasing downward.
///
/// Deserializes from a two-element numeric array (`[x, y]`). Fractional
/// coordinates are truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[i32; 2]")]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Same point moved `dy` pixels down, saturating at the `i32` range.
    pub const fn below(self, dy: i32) -> Self {
        Self {
            x: self.x,
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(v: [f64; 2]) -> Self {
        Self {
            x: v[0] as i32,
            y: v[1] as i32,
        }
    }
}

impl From<Point2D> for [i32; 2] {
    fn from(p: Point2D) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point2D {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// The three facial landmarks the placement is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmarks {
    pub left_ear: Point2D,
    pub right_ear: Point2D,
    pub chin: Point2D,
}

impl Landmarks {
    pub fn new(
        left_ear: impl Into<Point2D>,
        right_ear: impl Into<Point2D>,
        chin: impl Into<Point2D>,
    ) -> Self {
        Self {
            left_ear: left_ear.into(),
            right_ear: right_ear.into(),
            chin: chin.into(),
        }
    }

    /// Parse the `{"left_ear": [x, y], "right_ear": [x, y], "chin": [x, y]}`
    /// record produced by the landmark detector.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasShape {
    pub width: u32,
    pub height: u32,
}

impl CanvasShape {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Distance between two anchors, truncated to whole pixels.
pub fn collar_width(left: Point2D, right: Point2D) -> u32 {
    left.distance(&right) as u32
}
