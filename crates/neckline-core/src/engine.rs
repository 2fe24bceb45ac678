//! Placement pipeline: locate → validate → composite.

use crate::asset::{AssetError, Canvas, GarmentAsset};
use crate::compositor::{CompositeError, Compositor};
use crate::config::PlacementConfig;
use crate::locator::{AnchorLocator, AnchorPair};
use crate::mask::{NeckSegmenter, SegmentationMask, SegmenterError};
use crate::types::{CanvasShape, Landmarks};
use crate::validator::{validate, Placement, PlacementError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementError),
    #[error("compositing failed: {0}")]
    Composite(#[from] CompositeError),
    #[error("segmentation failed: {0}")]
    Segmenter(#[from] SegmenterError),
}

/// Stateless garment placement engine.
///
/// Holds only configuration, so one instance can serve any number of
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    config: PlacementConfig,
    locator: AnchorLocator,
    compositor: Compositor,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        let locator = AnchorLocator::new(&config);
        let compositor = Compositor::new(&config);
        Self {
            config,
            locator,
            compositor,
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Resolve the two garment anchors.
    pub fn locate(
        &self,
        landmarks: &Landmarks,
        mask: Option<&SegmentationMask>,
        canvas_height: u32,
    ) -> AnchorPair {
        self.locator.locate(landmarks, mask, canvas_height)
    }

    /// Locate and validate without touching any pixels.
    pub fn plan(
        &self,
        landmarks: &Landmarks,
        mask: Option<&SegmentationMask>,
        asset: &GarmentAsset,
        canvas: CanvasShape,
    ) -> Result<Placement, PlacementError> {
        let anchors = self.locate(landmarks, mask, canvas.height);
        validate(
            &anchors,
            landmarks.chin,
            asset,
            canvas,
            self.config.min_bust_height,
        )
    }

    /// Place `asset` on a copy of `canvas`.
    ///
    /// On any error the caller's canvas is untouched and nothing is returned.
    pub fn apply(
        &self,
        canvas: &Canvas,
        asset: &GarmentAsset,
        landmarks: &Landmarks,
        mask: Option<&SegmentationMask>,
    ) -> Result<Canvas, EngineError> {
        let placement = match self.plan(landmarks, mask, asset, canvas.shape()) {
            Ok(p) => p,
            Err(e) => {
                tracing::info!(asset = asset.name(), error = %e, "placement rejected");
                return Err(e.into());
            }
        };

        let out = self.compositor.composite(canvas, asset, &placement)?;
        tracing::info!(
            asset = asset.name(),
            left = ?placement.anchors.left,
            right = ?placement.anchors.right,
            resolution = ?placement.anchors.resolution,
            width = placement.width,
            height = placement.height,
            "garment placed"
        );
        Ok(out)
    }

    /// Segment the canvas with `segmenter`, then [`apply`](Self::apply).
    ///
    /// A segmenter that finds no neck is not an error; placement falls back
    /// to the anchors under the chin.
    pub fn try_on(
        &self,
        canvas: &Canvas,
        asset: &GarmentAsset,
        landmarks: &Landmarks,
        segmenter: &dyn NeckSegmenter,
    ) -> Result<Canvas, EngineError> {
        let mask = segmenter.segment(canvas)?;
        self.apply(canvas, asset, landmarks, mask.as_ref())
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new(PlacementConfig::default())
    }
}
