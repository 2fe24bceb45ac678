//! Binary neck segmentation raster.
//!
//! Wraps the output of an external neck segmentation model (a grayscale
//! probability raster, possibly at model resolution) into a binary mask
//! aligned to the canvas, and exposes the row/column queries the anchor
//! locator casts its rays through.

use crate::asset::Canvas;
use crate::types::CanvasShape;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use std::path::Path;
use thiserror::Error;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

#[derive(Error, Debug)]
pub enum SegmenterError {
    #[error("failed to load neck mask {path}: {source}")]
    MaskLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("segmentation failed: {0}")]
    Failed(String),
}

/// Binary raster: 255 on the neck, 0 elsewhere. Same size as the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    mask: GrayImage,
}

impl SegmentationMask {
    /// Binarise a raw segmentation raster and align it to `shape`.
    ///
    /// The raster is bilinearly resized when its size differs from the
    /// canvas; values strictly above `threshold` become foreground.
    pub fn from_raw(raw: &GrayImage, shape: CanvasShape, threshold: u8) -> Self {
        let resized;
        let aligned = if raw.dimensions() == (shape.width, shape.height) {
            raw
        } else {
            resized = imageops::resize(raw, shape.width, shape.height, FilterType::Triangle);
            &resized
        };

        let mask = GrayImage::from_fn(shape.width, shape.height, |x, y| {
            if aligned.get_pixel(x, y)[0] > threshold {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        Self { mask }
    }

    /// Build a mask from a foreground predicate. Used for synthetic fixtures.
    pub fn from_fn(width: u32, height: u32, foreground: impl Fn(u32, u32) -> bool) -> Self {
        let mask = GrayImage::from_fn(width, height, |x, y| {
            Luma([if foreground(x, y) { FOREGROUND } else { BACKGROUND }])
        });
        Self { mask }
    }

    /// A mask with no foreground at all.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn shape(&self) -> CanvasShape {
        CanvasShape::new(self.mask.width(), self.mask.height())
    }

    /// Whether `(x, y)` lies on the neck. Out-of-bounds is background.
    pub fn is_foreground(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.mask.width() || y as u32 >= self.mask.height() {
            return false;
        }
        self.mask.get_pixel(x as u32, y as u32)[0] == FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.mask
    }
}

/// Handle to a neck segmentation model.
///
/// The model itself is loaded once by the caller and passed into the engine;
/// `Ok(None)` means no neck was found, which the engine treats as a missing
/// mask rather than an error.
pub trait NeckSegmenter: Send + Sync {
    fn segment(&self, canvas: &Canvas) -> Result<Option<SegmentationMask>, SegmenterError>;
}

/// Segmentation output computed ahead of time (e.g. exported by the model
/// service as a grayscale PNG).
pub struct PrecomputedMask {
    raw: Option<GrayImage>,
    threshold: u8,
}

impl PrecomputedMask {
    /// Load a grayscale mask image from disk.
    pub fn open(path: impl AsRef<Path>, threshold: u8) -> Result<Self, SegmenterError> {
        let path = path.as_ref();
        let raw = image::open(path)
            .map_err(|source| SegmenterError::MaskLoad {
                path: path.display().to_string(),
                source,
            })?
            .to_luma8();
        tracing::info!(
            path = %path.display(),
            width = raw.width(),
            height = raw.height(),
            "loaded neck mask"
        );
        Ok(Self {
            raw: Some(raw),
            threshold,
        })
    }

    pub fn from_image(raw: GrayImage, threshold: u8) -> Self {
        Self {
            raw: Some(raw),
            threshold,
        }
    }

    /// A segmenter that never finds a neck.
    pub fn unavailable() -> Self {
        Self {
            raw: None,
            threshold: 0,
        }
    }
}

impl NeckSegmenter for PrecomputedMask {
    fn segment(&self, canvas: &Canvas) -> Result<Option<SegmentationMask>, SegmenterError> {
        Ok(self
            .raw
            .as_ref()
            .map(|raw| SegmentationMask::from_raw(raw, canvas.shape(), self.threshold)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_threshold_is_strict() {
        let raw = GrayImage::from_fn(3, 1, |x, _| Luma([[127u8, 128, 255][x as usize]]));
        let mask = SegmentationMask::from_raw(&raw, CanvasShape::new(3, 1), 127);
        assert!(!mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(mask.is_foreground(2, 0));
        assert_eq!(mask.foreground_count(), 2);
    }

    #[test]
    fn test_values_are_binary() {
        let raw = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 30 + y) as u8]));
        let mask = SegmentationMask::from_raw(&raw, CanvasShape::new(8, 8), 127);
        assert!(mask
            .as_image()
            .pixels()
            .all(|p| p[0] == FOREGROUND || p[0] == BACKGROUND));
    }

    #[test]
    fn test_resized_to_canvas() {
        // Model output at quarter resolution, lower half foreground.
        let raw = GrayImage::from_fn(20, 20, |_, y| Luma([if y >= 10 { 255 } else { 0 }]));
        let mask = SegmentationMask::from_raw(&raw, CanvasShape::new(80, 80), 127);
        assert_eq!(mask.shape(), CanvasShape::new(80, 80));
        assert!(!mask.is_foreground(40, 5));
        assert!(mask.is_foreground(40, 75));
    }

    #[test]
    fn test_out_of_bounds_is_background() {
        let mask = SegmentationMask::from_fn(4, 4, |_, _| true);
        assert!(mask.is_foreground(0, 0));
        assert!(!mask.is_foreground(-1, 0));
        assert!(!mask.is_foreground(0, 4));
        assert!(!mask.is_foreground(4, 0));
    }

    #[test]
    fn test_precomputed_unavailable() {
        let canvas = Canvas::Rgb(RgbImage::new(10, 10));
        let seg = PrecomputedMask::unavailable();
        assert!(seg.segment(&canvas).unwrap().is_none());
    }

    #[test]
    fn test_precomputed_aligns_to_canvas() {
        let canvas = Canvas::Rgb(RgbImage::new(30, 20));
        let seg = PrecomputedMask::from_image(GrayImage::from_pixel(15, 10, Luma([200])), 127);
        let mask = seg.segment(&canvas).unwrap().unwrap();
        assert_eq!(mask.shape(), CanvasShape::new(30, 20));
        assert_eq!(mask.foreground_count(), 600);
    }

    #[test]
    fn test_precomputed_open_missing_file() {
        let err = PrecomputedMask::open("/nonexistent/mask.png", 127).err().unwrap();
        assert!(matches!(err, SegmenterError::MaskLoad { .. }));
    }
}
