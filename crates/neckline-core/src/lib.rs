//! neckline-core — Garment placement engine.
//!
//! Finds where a necklace rests on a neck from three facial landmarks and a
//! neck segmentation mask, checks that it fits, then warps and feathers the
//! garment texture onto the photo.

pub mod annotate;
pub mod asset;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod feather;
pub mod homography;
pub mod locator;
pub mod mask;
pub mod types;
pub mod validator;

pub use asset::{AssetError, Canvas, GarmentAsset};
pub use config::{PlacementConfig, SearchStrategy};
pub use engine::{EngineError, PlacementEngine};
pub use locator::{AnchorCandidates, AnchorLocator, AnchorPair, AnchorResolution};
pub use mask::{NeckSegmenter, PrecomputedMask, SegmentationMask, SegmenterError};
pub use types::{collar_width, CanvasShape, Landmarks, Point2D};
pub use validator::{Placement, PlacementError};
