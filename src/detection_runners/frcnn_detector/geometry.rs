//! Coordinate transforms between feature-map, resized-image and original-image space.

use serde::{Deserialize, Serialize};
use crate::common::FrcnnBox;

/// Per-axis `resized / original` scale recorded when an image is preprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeRatio {
    pub x: f32,
    pub y: f32,
}

impl Default for ResizeRatio {
    fn default() -> Self {
        Self::uniform(1.)
    }
}

impl ResizeRatio {
    pub fn uniform(ratio: f32) -> Self {
        Self { x: ratio, y: ratio }
    }

    /// Ratio between an image of `src_w x src_h` and its resized `dst_w x dst_h` copy.
    pub fn from_dims(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Self {
        Self {
            x: dst_w as f32 / src_w as f32,
            y: dst_h as f32 / src_h as f32,
        }
    }
}

/// Corner form to `(x, y, w, h)`, `(x, y)` being the top-left corner.
///
/// `None` for a box with negative extent.
pub fn to_xywh(bbox: &FrcnnBox) -> Option<(f32, f32, f32, f32)> {
    let w = bbox.x2 - bbox.x1;
    let h = bbox.y2 - bbox.y1;
    if w < 0. || h < 0. {
        return None;
    }
    Some((bbox.x1, bbox.y1, w, h))
}

/// Inverse of [`to_xywh`].
pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> FrcnnBox {
    FrcnnBox::default().with_x1y1_wh(x, y, w, h)
}

/// Refines an `(x, y, w, h)` region with the classifier's regression deltas.
///
/// Each delta is divided by its entry in `std` first. Returns `None` when the
/// result is not finite, e.g. when `tw` or `th` overflow the exponential.
pub fn apply_regression(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    delta: [f32; 4],
    std: [f32; 4],
) -> Option<(f32, f32, f32, f32)> {
    let [tx, ty, tw, th] = [
        delta[0] / std[0],
        delta[1] / std[1],
        delta[2] / std[2],
        delta[3] / std[3],
    ];

    let cx = x + w / 2.;
    let cy = y + h / 2.;
    let cx1 = tx * w + cx;
    let cy1 = ty * h + cy;
    let w1 = tw.exp() * w;
    let h1 = th.exp() * h;
    let x1 = cx1 - w1 / 2.;
    let y1 = cy1 - h1 / 2.;

    [x1, y1, w1, h1]
        .iter()
        .all(|v| v.is_finite())
        .then_some((x1, y1, w1, h1))
}

/// Maps feature-map units to resized-image pixels.
pub fn to_feature_stride(coord: f32, stride: f32) -> f32 {
    coord * stride
}

/// Maps a resized-image box back onto the original image's pixel grid.
pub fn rescale_to_original(ratio: ResizeRatio, x1: f32, y1: f32, x2: f32, y2: f32) -> FrcnnBox {
    FrcnnBox::new(
        (x1 / ratio.x).round(),
        (y1 / ratio.y).round(),
        (x2 / ratio.x).round(),
        (y2 / ratio.y).round(),
    )
}
