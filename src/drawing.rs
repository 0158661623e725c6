use std::collections::HashMap;
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::common::FrcnnDetection;

const BOX_THICKNESS: i32 = 4;
const CAPTION_HEIGHT: f32 = 16.;
const CAPTION_PADDING: i32 = 3;

/// Random colour per class label, drawn lazily from a seeded generator.
pub struct ClassPalette {
    rng: StdRng,
    colours: HashMap<String, Rgb<u8>>,
}

impl ClassPalette {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), colours: HashMap::new() }
    }

    /// Pre-assigns colours in the given order, so runs over different images agree.
    pub fn with_labels<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        for label in labels {
            self.colour(label.as_ref());
        }
        self
    }

    pub fn colour(&mut self, label: &str) -> Rgb<u8> {
        if let Some(c) = self.colours.get(label) {
            return *c;
        }
        let c = Rgb([self.rng.gen_range(0..=255), self.rng.gen_range(0..=255), self.rng.gen_range(0..=255)]);
        self.colours.insert(label.to_string(), c);
        c
    }
}

impl Default for ClassPalette {
    fn default() -> Self {
        Self::new(0)
    }
}

fn thick_rect(img: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgb<u8>) {
    for t in 0..BOX_THICKNESS {
        let (w, h) = (x2 - x1 - 2 * t, y2 - y1 - 2 * t);
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(img, Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32), colour);
    }
}

/// Draws every detection's box, and its `label: score` caption when a font is given.
pub fn draw_detections(
    img: &mut RgbImage,
    detections: &[FrcnnDetection],
    palette: &mut ClassPalette,
    font: Option<&FontRef>,
) {
    let scale = PxScale { x: CAPTION_HEIGHT, y: CAPTION_HEIGHT };
    for det in detections {
        let (x1, y1, x2, y2) = det.bbox.as_x1y1_x2y2_i32();
        let colour = palette.colour(&det.get_label());
        thick_rect(img, x1, y1, x2, y2, colour);

        let Some(font) = font else { continue };
        let caption = det.caption();
        let (tw, th) = text_size(scale, font, &caption);
        let (bw, bh) = (tw as i32 + 2 * CAPTION_PADDING, th as i32 + 2 * CAPTION_PADDING);
        let (tx, ty) = (x1, (y1 - bh).max(0));

        let background = Rect::at(tx, ty).of_size(bw.max(1) as u32, bh.max(1) as u32);
        draw_filled_rect_mut(img, background, Rgb([255, 255, 255]));
        draw_hollow_rect_mut(img, background, Rgb([0, 0, 0]));
        draw_text_mut(img, Rgb([0, 0, 0]), tx + CAPTION_PADDING, ty + CAPTION_PADDING, scale, font, &caption);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_stable_per_label() {
        let mut palette = ClassPalette::new(7);
        let a = palette.colour("abeille");
        palette.colour("bourdon");
        assert_eq!(palette.colour("abeille"), a);

        let mut other = ClassPalette::new(7);
        assert_eq!(other.colour("abeille"), a);
    }
}
