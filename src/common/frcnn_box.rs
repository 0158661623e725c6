use serde::{Deserialize, Serialize};

/// How box extents map onto pixels when computing areas.
///
/// `Inclusive` treats `x2`/`y2` as the last covered pixel, so a box spanning
/// `0..=10` is 11 pixels wide. `Exclusive` uses plain `x2 - x1`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelConvention {
    #[default]
    Inclusive,
    Exclusive,
}

impl PixelConvention {
    fn offset(&self) -> f32 {
        match self {
            PixelConvention::Inclusive => 1.,
            PixelConvention::Exclusive => 0.,
        }
    }
}

/// Axis-aligned box stored in corner form, with the extent cached.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct FrcnnBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub w: f32,
    pub h: f32,
}

impl FrcnnBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            w: x2 - x1,
            h: y2 - y1,
        }
    }

    /// A box is valid when its extent is non-negative and every coordinate is finite.
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
            && self.x2 >= self.x1
            && self.y2 >= self.y1
    }

    /// Computes the area of the bounding box under the given pixel convention.
    pub fn area(&self, convention: PixelConvention) -> f32 {
        let o = convention.offset();
        (self.x2 - self.x1 + o) * (self.y2 - self.y1 + o)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &FrcnnBox, convention: PixelConvention) -> f32 {
        let o = convention.offset();
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left + o).max(0.) * (bottom - top + o).max(0.)
    }

    /// Intersection over union, with a small epsilon on the denominator.
    pub fn iou(&self, other: &FrcnnBox, convention: PixelConvention) -> f32 {
        let inter = self.intersect(other, convention);
        inter / (self.area(convention) + other.area(convention) - inter + 1e-6)
    }

    pub fn as_x1y1_x2y2_i32(&self) -> (i32, i32, i32, i32) {
        (self.x1.round() as i32,
         self.y1.round() as i32,
         self.x2.round() as i32,
         self.y2.round() as i32)
    }

    /// Sets the corners from a top-left point and an extent.
    pub fn with_x1y1_wh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.w = w;
        self.h = h;

        self.x2 = x + w;
        self.y2 = y + h;
        self
    }
}
