//! Canvas and garment rasters.

use crate::types::CanvasShape;
use image::{DynamicImage, RgbImage, RgbaImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to load canvas {path}: {source}")]
    CanvasLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load garment asset {path}: {source}")]
    AssetLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("garment asset {0} has no alpha channel; an RGBA image is required")]
    MissingAlpha(String),
    #[error("garment asset {0} has a uniform alpha channel, nothing to cut out")]
    UniformAlpha(String),
    #[error("failed to write canvas {path}: {source}")]
    CanvasWrite {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// The photograph being edited.
///
/// Opaque sources are held as RGB; sources with an alpha channel stay RGBA so
/// the output keeps the input's pixel layout. Only colour channels are ever
/// blended.
#[derive(Debug, Clone, PartialEq)]
pub enum Canvas {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl Canvas {
    /// Decode the source photograph.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| AssetError::CanvasLoad {
            path: path.display().to_string(),
            source,
        })?;
        let canvas = Self::from_dynamic(img);
        tracing::info!(
            path = %path.display(),
            width = canvas.width(),
            height = canvas.height(),
            alpha = matches!(canvas, Canvas::Rgba(_)),
            "loaded canvas"
        );
        Ok(canvas)
    }

    pub fn from_dynamic(img: DynamicImage) -> Self {
        if img.color().has_alpha() {
            Canvas::Rgba(img.into_rgba8())
        } else {
            Canvas::Rgb(img.into_rgb8())
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Canvas::Rgb(img) => img.width(),
            Canvas::Rgba(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Canvas::Rgb(img) => img.height(),
            Canvas::Rgba(img) => img.height(),
        }
    }

    pub fn shape(&self) -> CanvasShape {
        CanvasShape::new(self.width(), self.height())
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Canvas::Rgb(img) => DynamicImage::ImageRgb8(img),
            Canvas::Rgba(img) => DynamicImage::ImageRgba8(img),
        }
    }

    /// Encode to `path`; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let result = match self {
            Canvas::Rgb(img) => img.save(path),
            Canvas::Rgba(img) => img.save(path),
        };
        result.map_err(|source| AssetError::CanvasWrite {
            path: path.display().to_string(),
            source,
        })
    }
}

/// An RGBA garment texture (necklace) with a meaningful alpha cut-out.
///
/// Loaded once and shared read-only between placements.
#[derive(Debug, Clone)]
pub struct GarmentAsset {
    image: RgbaImage,
    name: String,
}

impl GarmentAsset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let img = image::open(path).map_err(|source| AssetError::AssetLoad {
            path: shown.clone(),
            source,
        })?;
        let asset = Self::from_dynamic(img, &shown)?;
        tracing::info!(
            path = %shown,
            width = asset.width(),
            height = asset.height(),
            "loaded garment asset"
        );
        Ok(asset)
    }

    /// Accept a decoded image, rejecting ones without a usable alpha channel.
    pub fn from_dynamic(img: DynamicImage, name: &str) -> Result<Self, AssetError> {
        if !img.color().has_alpha() {
            return Err(AssetError::MissingAlpha(name.to_string()));
        }
        Self::from_rgba(img.into_rgba8(), name)
    }

    pub fn from_rgba(image: RgbaImage, name: &str) -> Result<Self, AssetError> {
        let mut alphas = image.pixels().map(|p| p[3]);
        let uniform = match alphas.next() {
            Some(first) => alphas.all(|a| a == first),
            None => true,
        };
        if uniform {
            return Err(AssetError::UniformAlpha(name.to_string()));
        }
        Ok(Self {
            image,
            name: name.to_string(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    fn bead_asset() -> RgbaImage {
        RgbaImage::from_fn(40, 10, |x, _| {
            if x % 4 == 0 {
                Rgba([220, 180, 40, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn test_asset_requires_alpha() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])));
        let err = GarmentAsset::from_dynamic(rgb, "flat.jpg").unwrap_err();
        assert!(matches!(err, AssetError::MissingAlpha(_)));
    }

    #[test]
    fn test_asset_rejects_uniform_alpha() {
        let opaque = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        let err = GarmentAsset::from_rgba(opaque, "opaque.png").unwrap_err();
        assert!(matches!(err, AssetError::UniformAlpha(_)));
    }

    #[test]
    fn test_asset_accepts_cutout() {
        let asset = GarmentAsset::from_rgba(bead_asset(), "beads.png").unwrap();
        assert_eq!((asset.width(), asset.height()), (40, 10));
        assert_eq!(asset.name(), "beads.png");
    }

    #[test]
    fn test_asset_open_missing_file() {
        let err = GarmentAsset::open("/nonexistent/necklace.png").unwrap_err();
        assert!(matches!(err, AssetError::AssetLoad { .. }));
    }

    #[test]
    fn test_canvas_open_missing_file() {
        let err = Canvas::open("/nonexistent/portrait.jpg").unwrap_err();
        assert!(matches!(err, AssetError::CanvasLoad { .. }));
    }

    #[test]
    fn test_asset_roundtrip_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beads.png");
        bead_asset().save(&path).unwrap();

        let asset = GarmentAsset::open(&path).unwrap();
        assert_eq!(asset.image(), &bead_asset());
    }

    #[test]
    fn test_canvas_keeps_pixel_layout() {
        let rgb = Canvas::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(4, 3)));
        assert!(matches!(rgb, Canvas::Rgb(_)));
        let rgba = Canvas::from_dynamic(DynamicImage::ImageRgba8(RgbaImage::new(4, 3)));
        assert!(matches!(rgba, Canvas::Rgba(_)));
        assert_eq!(rgba.shape(), CanvasShape::new(4, 3));
    }

    #[test]
    fn test_canvas_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.png");
        let canvas = Canvas::Rgb(RgbImage::from_fn(6, 5, |x, y| Rgb([x as u8, y as u8, 7])));
        canvas.save(&path).unwrap();
        assert_eq!(Canvas::open(&path).unwrap(), canvas);
    }
}
