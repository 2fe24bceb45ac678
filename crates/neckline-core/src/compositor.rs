//! Garment texture compositing.
//!
//! The scaled garment rectangle is mapped onto the neck with a homography:
//!
//! ```text
//!   (0,0) ─────── (w,0)            left ───────── right
//!     │             │       →        │               │
//!   (0,h) ─────── (w,h)        left+(0,h+dy) ─ right+(0,h+dy)
//! ```
//!
//! where `dy = |right.y - left.y|` keeps the bottom edge parallel to the
//! head's tilt. The warped alpha is feathered with a Gaussian blur and the
//! colour channels are blended over the canvas.

use crate::asset::{Canvas, GarmentAsset};
use crate::config::PlacementConfig;
use crate::feather::{blur_plane, gaussian_kernel};
use crate::homography::{warp_perspective, Homography};
use crate::validator::Placement;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, RgbaImage};
use thiserror::Error;

/// Feathered alpha this close to 1 is treated as fully opaque.
const OPAQUE_EPS: f32 = 1e-4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    #[error("no perspective transform onto anchors {:?} / {:?}", .0.anchors.left, .0.anchors.right)]
    DegenerateTransform(Placement),
}

/// Warps and blends a garment onto a canvas.
#[derive(Debug, Clone)]
pub struct Compositor {
    kernel: Vec<f32>,
}

impl Compositor {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            kernel: gaussian_kernel(config.feather_kernel, config.feather_sigma),
        }
    }

    /// Corners of the scaled garment, in `(0,0), (w,0), (0,h), (w,h)` order.
    pub fn source_quad(placement: &Placement) -> [(f64, f64); 4] {
        let w = f64::from(placement.width);
        let h = f64::from(placement.height);
        [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
    }

    /// Where each source corner lands on the canvas.
    pub fn destination_quad(placement: &Placement) -> [(f64, f64); 4] {
        let left = placement.anchors.left;
        let right = placement.anchors.right;
        let drop = i32::try_from(placement.height)
            .unwrap_or(i32::MAX)
            .saturating_add(placement.slant());
        [left, right, left.below(drop), right.below(drop)]
            .map(|p| (f64::from(p.x), f64::from(p.y)))
    }

    /// Composite `asset` onto a copy of `canvas`.
    ///
    /// Pure: the input canvas is untouched and identical inputs give
    /// bit-identical output.
    pub fn composite(
        &self,
        canvas: &Canvas,
        asset: &GarmentAsset,
        placement: &Placement,
    ) -> Result<Canvas, CompositeError> {
        let scaled = imageops::resize(
            asset.image(),
            placement.width,
            placement.height,
            FilterType::Triangle,
        );

        let homography = Homography::from_quad(
            &Self::source_quad(placement),
            &Self::destination_quad(placement),
        )
        .ok_or(CompositeError::DegenerateTransform(*placement))?;

        let (width, height) = (canvas.width(), canvas.height());
        let warped = warp_perspective(&scaled, &homography, width, height);

        let alpha: Vec<f32> = warped.pixels().map(|p| f32::from(p[3]) / 255.0).collect();
        let alpha = blur_plane(&alpha, width, height, &self.kernel);

        let mut out = canvas.clone();
        match &mut out {
            Canvas::Rgb(img) => blend(img, &warped, &alpha),
            Canvas::Rgba(img) => blend(img, &warped, &alpha),
        }

        tracing::debug!(
            width = placement.width,
            height = placement.height,
            slant = placement.slant(),
            "garment composited"
        );
        Ok(out)
    }
}

/// `canvas = trunc(warped·α + canvas·(1−α))` on the first three channels.
fn blend<P>(canvas: &mut ImageBuffer<P, Vec<u8>>, warped: &RgbaImage, alpha: &[f32])
where
    P: Pixel<Subpixel = u8>,
{
    let width = canvas.width() as usize;
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        let a = alpha[y as usize * width + x as usize];
        if a <= 0.0 {
            continue;
        }
        let a = if a >= 1.0 - OPAQUE_EPS { 1.0 } else { a };
        let src = warped.get_pixel(x, y);
        for (c, dst) in px.channels_mut().iter_mut().take(3).enumerate() {
            let v = f32::from(src[c]) * a + f32::from(*dst) * (1.0 - a);
            *dst = v.clamp(0.0, 255.0) as u8;
        }
    }
}
