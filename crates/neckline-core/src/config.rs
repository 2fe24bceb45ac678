//! Placement tuning parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How neck anchors are searched for in the segmentation mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    /// Cast one downward ray per ear.
    #[default]
    Vertical,
    /// Downward rays, then refine each hit along its row toward the far
    /// neck contour.
    VerticalThenHorizontal,
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" => Ok(Self::Vertical),
            "vertical-then-horizontal" | "horizontal" | "refine" => {
                Ok(Self::VerticalThenHorizontal)
            }
            other => Err(format!(
                "unknown search strategy {other:?} (expected \"vertical\" or \"vertical-then-horizontal\")"
            )),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => f.write_str("vertical"),
            Self::VerticalThenHorizontal => f.write_str("vertical-then-horizontal"),
        }
    }
}

/// Tunables for locating, validating and blending a garment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub strategy: SearchStrategy,
    /// A mask hit above the chin is moved to `chin.y + chin_margin`.
    pub chin_margin: i32,
    /// Default anchor depth below the chin when no usable hit exists.
    pub fallback_offset: i32,
    /// Minimum vertical gap between chin and the higher anchor.
    pub min_bust_height: i32,
    /// Segmentation values strictly above this are foreground.
    pub mask_threshold: u8,
    /// Feathering kernel size in pixels (odd).
    pub feather_kernel: u32,
    pub feather_sigma: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Vertical,
            chin_margin: 10,
            fallback_offset: 15,
            min_bust_height: 8,
            mask_threshold: 127,
            feather_kernel: 15,
            feather_sigma: 5.0,
        }
    }
}
