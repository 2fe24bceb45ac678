//! Geometric feasibility checks run before any pixel is written.

use crate::asset::GarmentAsset;
use crate::locator::AnchorPair;
use crate::types::{CanvasShape, Point2D};
use serde::Serialize;
use thiserror::Error;

/// Minimum chin-to-anchor clearance, in pixels.
pub const MIN_BUST_HEIGHT: i32 = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("invalid collar width {width}px between anchors {:?} and {:?}", .anchors.left, .anchors.right)]
    InvalidWidth { anchors: AnchorPair, width: u32 },
    #[error("bust too short: {bust_height}px below the chin, need at least {minimum}px")]
    InsufficientClearance {
        anchors: AnchorPair,
        chin: Point2D,
        bust_height: i32,
        minimum: i32,
    },
    #[error("garment would overflow the image: bottom at y={bottom}, canvas height {canvas_height}")]
    Overflow {
        anchors: AnchorPair,
        width: u32,
        height: u32,
        bottom: i64,
        canvas_height: u32,
    },
    #[error("garment scales to {width}x0px at this collar width")]
    EmptyGarment { anchors: AnchorPair, width: u32 },
}

impl PlacementError {
    /// Anchors that were rejected.
    pub fn anchors(&self) -> &AnchorPair {
        match self {
            Self::InvalidWidth { anchors, .. }
            | Self::InsufficientClearance { anchors, .. }
            | Self::Overflow { anchors, .. }
            | Self::EmptyGarment { anchors, .. } => anchors,
        }
    }
}

/// A validated placement: anchors plus the garment's scaled size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub anchors: AnchorPair,
    pub chin: Point2D,
    /// Scaled garment width, equal to the collar width.
    pub width: u32,
    /// Scaled garment height, aspect ratio preserved.
    pub height: u32,
    /// Bottom edge of the unslanted garment, `anchors.top() + height`.
    pub bottom: i64,
}

impl Placement {
    /// Vertical offset between the two anchors.
    pub fn slant(&self) -> i32 {
        let dy = self.anchors.right.y.abs_diff(self.anchors.left.y);
        i32::try_from(dy).unwrap_or(i32::MAX)
    }
}

/// Scaled garment height for a target width, truncated to whole pixels.
pub fn scaled_height(asset_width: u32, asset_height: u32, width: u32) -> u32 {
    if asset_width == 0 {
        return 0;
    }
    let scale = f64::from(width) / f64::from(asset_width);
    (f64::from(asset_height) * scale) as u32
}

/// Check that the garment can be placed on `anchors` inside `canvas`.
///
/// Checks width, then clearance under the chin, then overflow past the
/// bottom edge, and returns the first failure.
pub fn validate(
    anchors: &AnchorPair,
    chin: Point2D,
    asset: &GarmentAsset,
    canvas: CanvasShape,
    min_bust_height: i32,
) -> Result<Placement, PlacementError> {
    let width = anchors.collar_width();
    if width == 0 {
        return Err(PlacementError::InvalidWidth {
            anchors: *anchors,
            width,
        });
    }

    let top = anchors.top();
    let bust_height = top.saturating_sub(chin.y);
    if bust_height < min_bust_height {
        return Err(PlacementError::InsufficientClearance {
            anchors: *anchors,
            chin,
            bust_height,
            minimum: min_bust_height,
        });
    }

    let height = scaled_height(asset.width(), asset.height(), width);
    let bottom = i64::from(top) + i64::from(height);
    if bottom > i64::from(canvas.height) {
        return Err(PlacementError::Overflow {
            anchors: *anchors,
            width,
            height,
            bottom,
            canvas_height: canvas.height,
        });
    }

    if height == 0 {
        return Err(PlacementError::EmptyGarment {
            anchors: *anchors,
            width,
        });
    }

    Ok(Placement {
        anchors: *anchors,
        chin,
        width,
        height,
        bottom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::AnchorResolution;
    use image::{Rgba, RgbaImage};

    /// 100x40 asset: scales to 200x80 at a 200px collar.
    fn asset(w: u32, h: u32) -> GarmentAsset {
        let img = RgbaImage::from_fn(w, h, |x, _| Rgba([200, 170, 30, if x % 2 == 0 { 255 } else { 0 }]));
        GarmentAsset::from_rgba(img, "test").unwrap()
    }

    fn pair(left: (i32, i32), right: (i32, i32)) -> AnchorPair {
        AnchorPair::both(left.into(), right.into())
    }

    #[test]
    fn test_scenario_fits() {
        let anchors = pair((100, 275), (300, 275));
        let p = validate(&anchors, Point2D::new(200, 260), &asset(100, 40), CanvasShape::new(400, 355), 8)
            .unwrap();
        assert_eq!(p.width, 200);
        assert_eq!(p.height, 80);
        assert_eq!(p.bottom, 355);
        assert_eq!(p.slant(), 0);
    }

    #[test]
    fn test_scenario_overflows() {
        let anchors = pair((100, 275), (300, 275));
        let err = validate(&anchors, Point2D::new(200, 260), &asset(100, 40), CanvasShape::new(400, 354), 8)
            .unwrap_err();
        match err {
            PlacementError::Overflow {
                bottom,
                canvas_height,
                height,
                ..
            } => {
                assert_eq!(bottom, 355);
                assert_eq!(canvas_height, 354);
                assert_eq!(height, 80);
            }
            other => panic!("expected Overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_width_rejected_first() {
        // Also lacks clearance; width is checked first.
        let anchors = pair((150, 262), (150, 262));
        let err = validate(&anchors, Point2D::new(150, 260), &asset(100, 40), CanvasShape::new(400, 400), 8)
            .unwrap_err();
        assert!(matches!(err, PlacementError::InvalidWidth { width: 0, .. }));
    }

    #[test]
    fn test_clearance_boundary() {
        let chin = Point2D::new(200, 260);
        let canvas = CanvasShape::new(1000, 1000);
        let a = asset(100, 40);

        for clearance in [-20, 0, 1, 7] {
            let anchors = pair((100, 260 + clearance), (300, 300));
            let err = validate(&anchors, chin, &a, canvas, MIN_BUST_HEIGHT).unwrap_err();
            assert!(
                matches!(err, PlacementError::InsufficientClearance { bust_height, .. } if bust_height == clearance),
                "clearance {clearance}: {err:?}"
            );
        }
        for clearance in [8, 9, 40] {
            let anchors = pair((100, 300), (300, 260 + clearance));
            assert!(validate(&anchors, chin, &a, canvas, MIN_BUST_HEIGHT).is_ok());
        }
    }

    #[test]
    fn test_empty_garment_rejected() {
        // 1000x1 asset at a 10px collar scales to 0px tall.
        let img = RgbaImage::from_fn(1000, 1, |x, _| Rgba([0, 0, 0, (x % 2 * 255) as u8]));
        let a = GarmentAsset::from_rgba(img, "thread").unwrap();
        let anchors = pair((100, 300), (110, 300));
        let err = validate(&anchors, Point2D::new(105, 260), &a, CanvasShape::new(400, 400), 8).unwrap_err();
        assert!(matches!(err, PlacementError::EmptyGarment { width: 10, .. }));
    }

    #[test]
    fn test_errors_carry_anchors() {
        let anchors = AnchorPair {
            left: Point2D::new(100, 262),
            right: Point2D::new(300, 262),
            resolution: AnchorResolution::LeftOnly,
        };
        let err = validate(&anchors, Point2D::new(200, 260), &asset(100, 40), CanvasShape::new(400, 400), 8)
            .unwrap_err();
        match err {
            PlacementError::InsufficientClearance { anchors: a, .. } => assert_eq!(a, anchors),
            ref other => panic!("unexpected {other:?}"),
        }
        assert_eq!(*err.anchors(), anchors);
    }

    #[test]
    fn test_scaled_height_truncates() {
        assert_eq!(scaled_height(100, 40, 200), 80);
        assert_eq!(scaled_height(300, 100, 200), 66);
        assert_eq!(scaled_height(0, 100, 200), 0);
    }
}
