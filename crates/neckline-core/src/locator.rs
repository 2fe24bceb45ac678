//! Neck anchor location.
//!
//! Casts a ray straight down from each ear landmark through the neck mask.
//! The first neck pixel under each ear is a candidate resting point for the
//! garment's top edge. Hits above the chin are pushed just below it, and a
//! fixed decision table fills in whichever side is missing:
//!
//! ```text
//! left valid  right valid   resolution
//! ----------  -----------   -----------------------------------------
//!    yes          yes       Both       use both hits
//!    yes          no        LeftOnly   right = (right_ear.x, left.y)
//!    no           yes       RightOnly  left  = (left_ear.x, right.y)
//!    no           no        Neither    both  = (ear.x, chin.y + offset)
//! ```
//!
//! A side is valid when it has a hit strictly below the chin.

use crate::config::{PlacementConfig, SearchStrategy};
use crate::mask::SegmentationMask;
use crate::types::{collar_width, Landmarks, Point2D};
use serde::Serialize;

/// Which row of the decision table produced an [`AnchorPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorResolution {
    Both,
    LeftOnly,
    RightOnly,
    Neither,
}

/// Raw ray-search output; either side may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnchorCandidates {
    pub left: Option<Point2D>,
    pub right: Option<Point2D>,
}

/// Resolved garment anchors. Both points are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorPair {
    pub left: Point2D,
    pub right: Point2D,
    pub resolution: AnchorResolution,
}

impl AnchorPair {
    pub fn both(left: Point2D, right: Point2D) -> Self {
        Self {
            left,
            right,
            resolution: AnchorResolution::Both,
        }
    }

    /// Right anchor mirrored from the left hit at the right ear's column.
    pub fn mirror_left(left: Point2D, right_ear: Point2D) -> Self {
        Self {
            left,
            right: Point2D::new(right_ear.x, left.y),
            resolution: AnchorResolution::LeftOnly,
        }
    }

    /// Left anchor mirrored from the right hit at the left ear's column.
    pub fn mirror_right(right: Point2D, left_ear: Point2D) -> Self {
        Self {
            left: Point2D::new(left_ear.x, right.y),
            right,
            resolution: AnchorResolution::RightOnly,
        }
    }

    /// Both anchors a fixed distance under the chin, at the ears' columns.
    pub fn below_chin(landmarks: &Landmarks, offset: i32) -> Self {
        let y = landmarks.chin.y.saturating_add(offset);
        Self {
            left: Point2D::new(landmarks.left_ear.x, y),
            right: Point2D::new(landmarks.right_ear.x, y),
            resolution: AnchorResolution::Neither,
        }
    }

    /// y of the higher anchor.
    pub fn top(&self) -> i32 {
        self.left.y.min(self.right.y)
    }

    pub fn collar_width(&self) -> u32 {
        collar_width(self.left, self.right)
    }
}

/// Horizontal scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Leftward,
    Rightward,
}

impl Direction {
    fn step(self) -> i32 {
        match self {
            Direction::Leftward => -1,
            Direction::Rightward => 1,
        }
    }
}

/// First neck pixel at or below `from` in its column.
///
/// Scans rows `max(from.y, 0)..bottom`. A column outside the mask yields
/// `None`.
pub fn vertical_hit(mask: &SegmentationMask, from: Point2D, bottom: u32) -> Option<Point2D> {
    if from.x < 0 || from.x as u32 >= mask.width() {
        return None;
    }
    let bottom = bottom.min(mask.height()) as i32;
    (from.y.max(0)..bottom)
        .find(|&y| mask.is_foreground(from.x, y))
        .map(|y| Point2D::new(from.x, y))
}

/// Far contour of the neck run containing `from`, walking along its row.
///
/// Returns the last neck pixel before background. Fails when `from` is not
/// on the neck, when the run is a single pixel wide, or when the run
/// reaches the image border before any background.
pub fn horizontal_contact(
    mask: &SegmentationMask,
    from: Point2D,
    direction: Direction,
) -> Option<Point2D> {
    if !mask.is_foreground(from.x, from.y) {
        return None;
    }
    let step = direction.step();
    let width = mask.width() as i32;
    let mut x = from.x;
    loop {
        let next = x + step;
        if next < 0 || next >= width {
            return None;
        }
        if !mask.is_foreground(next, from.y) {
            break;
        }
        x = next;
    }
    (x != from.x).then_some(Point2D::new(x, from.y))
}

/// Extremal neck pixel on `from`'s row: the rightmost one when `from` is in
/// the left half of the image, the leftmost one otherwise.
pub fn infer_contact(mask: &SegmentationMask, from: Point2D) -> Option<Point2D> {
    if from.y < 0 || from.y as u32 >= mask.height() {
        return None;
    }
    let width = mask.width() as i32;
    let mut row = (0..width).filter(|&x| mask.is_foreground(x, from.y));
    let x = if from.x < width / 2 {
        row.last()
    } else {
        row.next()
    }?;
    Some(Point2D::new(x, from.y))
}

/// Finds the two garment anchors from landmarks and an optional neck mask.
#[derive(Debug, Clone)]
pub struct AnchorLocator {
    strategy: SearchStrategy,
    chin_margin: i32,
    fallback_offset: i32,
}

impl AnchorLocator {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            strategy: config.strategy,
            chin_margin: config.chin_margin,
            fallback_offset: config.fallback_offset,
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    /// Locate both anchors. Never fails: missing or useless mask data falls
    /// through to the default placement under the chin.
    pub fn locate(
        &self,
        landmarks: &Landmarks,
        mask: Option<&SegmentationMask>,
        canvas_height: u32,
    ) -> AnchorPair {
        let Some(mask) = mask else {
            tracing::warn!("neck mask unavailable; placing anchors under the chin");
            return AnchorPair::below_chin(landmarks, self.fallback_offset);
        };
        let candidates = self.candidates(landmarks, mask, canvas_height);
        let pair = self.resolve(landmarks, &candidates);
        tracing::debug!(
            left_hit = ?candidates.left,
            right_hit = ?candidates.right,
            left = ?pair.left,
            right = ?pair.right,
            resolution = ?pair.resolution,
            "anchors located"
        );
        pair
    }

    /// Ray-search the mask and apply the chin correction, without filling in
    /// missing sides.
    pub fn candidates(
        &self,
        landmarks: &Landmarks,
        mask: &SegmentationMask,
        canvas_height: u32,
    ) -> AnchorCandidates {
        let mut hits = AnchorCandidates {
            left: vertical_hit(mask, landmarks.left_ear, canvas_height),
            right: vertical_hit(mask, landmarks.right_ear, canvas_height),
        };

        if self.strategy == SearchStrategy::VerticalThenHorizontal {
            hits = refine(mask, hits);
        }

        let chin = landmarks.chin;
        let lift = |p: Point2D| {
            if p.y < chin.y {
                Point2D::new(p.x, chin.y.saturating_add(self.chin_margin))
            } else {
                p
            }
        };
        AnchorCandidates {
            left: hits.left.map(lift),
            right: hits.right.map(lift),
        }
    }

    /// Apply the decision table to ray-search candidates.
    pub fn resolve(&self, landmarks: &Landmarks, candidates: &AnchorCandidates) -> AnchorPair {
        let chin_y = landmarks.chin.y;
        let valid = |p: Option<Point2D>| p.filter(|p| p.y > chin_y);

        match (valid(candidates.left), valid(candidates.right)) {
            (Some(left), Some(right)) => AnchorPair::both(left, right),
            (Some(left), None) => AnchorPair::mirror_left(left, landmarks.right_ear),
            (None, Some(right)) => AnchorPair::mirror_right(right, landmarks.left_ear),
            (None, None) => AnchorPair::below_chin(landmarks, self.fallback_offset),
        }
    }
}

/// Swap each vertical hit for the opposite neck contour on its row: the
/// contact found walking right from the left hit becomes the right anchor,
/// and vice versa. Sides with no contact keep their vertical hit.
fn refine(mask: &SegmentationMask, hits: AnchorCandidates) -> AnchorCandidates {
    let contact = |p: Point2D, direction| {
        horizontal_contact(mask, p, direction).or_else(|| infer_contact(mask, p))
    };
    let right = hits.left.and_then(|p| contact(p, Direction::Rightward));
    let left = hits.right.and_then(|p| contact(p, Direction::Leftward));
    AnchorCandidates {
        left: left.or(hits.left),
        right: right.or(hits.right),
    }
}
