//! Debug overlay: landmarks and resolved anchors drawn as filled dots.

use crate::asset::Canvas;
use crate::locator::AnchorPair;
use crate::types::Landmarks;
use image::{Rgb, Rgba};
use imageproc::drawing::draw_filled_circle_mut;

pub const MARKER_RADIUS: i32 = 6;

pub const LEFT_EAR: [u8; 3] = [0, 0, 255];
pub const RIGHT_EAR: [u8; 3] = [0, 255, 0];
pub const CHIN: [u8; 3] = [255, 0, 0];
pub const LEFT_ANCHOR: [u8; 3] = [0, 255, 255];
pub const RIGHT_ANCHOR: [u8; 3] = [255, 255, 0];

/// Copy of `canvas` with the landmarks and, if given, the anchors marked.
pub fn annotate(canvas: &Canvas, landmarks: &Landmarks, anchors: Option<&AnchorPair>) -> Canvas {
    let mut markers = vec![
        (landmarks.left_ear, LEFT_EAR),
        (landmarks.right_ear, RIGHT_EAR),
        (landmarks.chin, CHIN),
    ];
    if let Some(a) = anchors {
        markers.push((a.left, LEFT_ANCHOR));
        markers.push((a.right, RIGHT_ANCHOR));
    }

    let mut out = canvas.clone();
    for (p, [r, g, b]) in markers {
        let center = (p.x, p.y);
        match &mut out {
            Canvas::Rgb(img) => draw_filled_circle_mut(img, center, MARKER_RADIUS, Rgb([r, g, b])),
            Canvas::Rgba(img) => {
                draw_filled_circle_mut(img, center, MARKER_RADIUS, Rgba([r, g, b, 255]))
            }
        }
    }
    out
}
