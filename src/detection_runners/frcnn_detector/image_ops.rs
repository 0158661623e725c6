//! Functions to preprocess images before they reach the network.

use anyhow::Result;
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{imageops, DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::{box_filter, gaussian_blur_f32};
use ndarray::Array4;
use crate::common::{NoiseReduction, PreprocessConfig};
use crate::data::ResizeRatio;

/// Sigma of a 7x7 Gaussian kernel when none is given: `0.3 * ((7 - 1) / 2 - 1) + 0.8`.
const GAUSSIAN_7X7_SIGMA: f32 = 1.4;

/// Network input for one image.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// `(1, h, w, 3)` BGR tensor with the channel means removed.
    pub tensor: Array4<f32>,
    pub ratio: ResizeRatio,
    pub resized_width: u32,
    pub resized_height: u32,
}

/// Enhancement, resize and tensor conversion in one go.
pub fn preprocess(image: &RgbImage, config: &PreprocessConfig) -> Result<PreparedInput> {
    let enhanced = enhance(image, config);
    let (resized, ratio) = resize_to_min_side(&enhanced, config.im_size)?;
    let tensor = to_input_tensor(&resized, config);
    Ok(PreparedInput {
        tensor,
        ratio,
        resized_width: resized.width(),
        resized_height: resized.height(),
    })
}

/// Applies the configured noise reduction, histogram equalization and gamma correction, in that order.
pub fn enhance(image: &RgbImage, config: &PreprocessConfig) -> RgbImage {
    let mut out = match config.noise_reduction {
        None => image.clone(),
        Some(NoiseReduction::BoxFilter { radius }) => box_filter_rgb(image, radius),
        Some(NoiseReduction::Gaussian) => gaussian_blur_f32(image, GAUSSIAN_7X7_SIGMA),
    };
    if config.histogram_equalization {
        out = equalize_luma(&out);
    }
    if let Some(gamma) = config.gamma_correction {
        out = adjust_gamma(&out, gamma);
    }
    out
}

/// Mean filter applied to each channel separately.
pub fn box_filter_rgb(image: &RgbImage, radius: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let channels: Vec<GrayImage> = (0..3)
        .map(|c| {
            let plane = GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y)[c]]));
            box_filter(&plane, radius, radius)
        })
        .collect();
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y)[0],
            channels[1].get_pixel(x, y)[0],
            channels[2].get_pixel(x, y)[0],
        ])
    })
}

/// Equalizes the luma histogram and keeps the chroma.
pub fn equalize_luma(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let ycbcr: Vec<[f32; 3]> = image.pixels().map(|p| rgb_to_ycbcr(p.0)).collect();
    let luma = GrayImage::from_fn(w, h, |x, y| {
        let y_val = ycbcr[(y * w + x) as usize][0];
        image::Luma([y_val.round().clamp(0., 255.) as u8])
    });
    let luma = equalize_histogram(&luma);
    RgbImage::from_fn(w, h, |x, y| {
        let [_, cb, cr] = ycbcr[(y * w + x) as usize];
        Rgb(ycbcr_to_rgb([luma.get_pixel(x, y)[0] as f32, cb, cr]))
    })
}

fn rgb_to_ycbcr([r, g, b]: [u8; 3]) -> [f32; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128. + (b - y) * 0.564;
    let cr = 128. + (r - y) * 0.713;
    [y, cb, cr]
}

fn ycbcr_to_rgb([y, cb, cr]: [f32; 3]) -> [u8; 3] {
    let r = y + 1.403 * (cr - 128.);
    let g = y - 0.714 * (cr - 128.) - 0.344 * (cb - 128.);
    let b = y + 1.773 * (cb - 128.);
    [r, g, b].map(|v| v.round().clamp(0., 255.) as u8)
}

/// Lookup table mapping `i` to `(i / 255) ^ (1 / gamma) * 255`.
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv_gamma = 1. / gamma;
    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
        *v = ((i as f32 / 255.).powf(inv_gamma) * 255.).round().clamp(0., 255.) as u8;
    }
    table
}

pub fn adjust_gamma(image: &RgbImage, gamma: f32) -> RgbImage {
    let table = gamma_lut(gamma);
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0 = p.0.map(|v| table[v as usize]);
    }
    out
}

/// Target size when the shorter side becomes `im_size`; the longer side is truncated.
pub fn min_side_dims(width: u32, height: u32, im_size: u32) -> (u32, u32) {
    let im_size_f = im_size as f32;
    if width <= height {
        let ratio = im_size_f / width as f32;
        (im_size, (ratio * height as f32) as u32)
    } else {
        let ratio = im_size_f / height as f32;
        ((ratio * width as f32) as u32, im_size)
    }
}

/// Resizes so the shorter side equals `im_size`, returning the recorded ratio.
pub fn resize_to_min_side(image: &RgbImage, im_size: u32) -> Result<(RgbImage, ResizeRatio)> {
    let (w0, h0) = image.dimensions();
    if w0 == 0 || h0 == 0 {
        anyhow::bail!("Cannot resize an empty {}x{} image.", w0, h0);
    }
    let (w, h) = min_side_dims(w0, h0, im_size);

    let src = DynamicImage::ImageRgb8(image.clone());
    let mut dst = DynamicImage::new(w, h, src.color());
    let mut resizer = Resizer::new();
    let options = ResizeOptions {
        algorithm: ResizeAlg::Convolution(FilterType::CatmullRom),
        ..Default::default()
    };
    let resized = match resizer.resize(&src, &mut dst, &options) {
        Ok(()) => dst.to_rgb8(),
        Err(err) => {
            log::warn!("Failed to use `fast_image_resize` ({err}). Falling back.");
            imageops::resize(image, w, h, imageops::FilterType::CatmullRom)
        }
    };

    Ok((resized, ResizeRatio::from_dims(w0, h0, w, h)))
}

/// NHWC tensor in BGR channel order, means subtracted and scaled.
pub fn to_input_tensor(image: &RgbImage, config: &PreprocessConfig) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let mut input = Array4::<f32>::zeros((1, h as usize, w as usize, 3));
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        for (c, v) in [b, g, r].into_iter().enumerate() {
            input[[0, y as usize, x as usize, c]] =
                (v as f32 - config.img_channel_mean[c]) / config.img_scaling_factor;
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_side_becomes_im_size() {
        assert_eq!(min_side_dims(400, 600, 300), (300, 450));
        assert_eq!(min_side_dims(1000, 500, 300), (600, 300));
    }

    #[test]
    fn gamma_lut_keeps_endpoints() {
        let table = gamma_lut(2.2);
        assert_eq!(table[0], 0);
        assert_eq!(table[255], 255);
        assert!(table[128] > 128);
    }

    #[test]
    fn enhancement_keeps_dimensions() {
        let image = RgbImage::from_fn(20, 12, |x, y| Rgb([(x * 12) as u8, (y * 20) as u8, 90]));
        for noise_reduction in [None, Some(NoiseReduction::BoxFilter { radius: 2 }), Some(NoiseReduction::Gaussian)] {
            let config = PreprocessConfig {
                noise_reduction,
                histogram_equalization: true,
                gamma_correction: Some(1.5),
                ..Default::default()
            };
            assert_eq!(enhance(&image, &config).dimensions(), (20, 12));
        }
        // Uniform images survive a box filter unchanged.
        let flat = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        assert_eq!(box_filter_rgb(&flat, 1), flat);
    }

    #[test]
    fn resize_records_the_ratio() {
        let image = RgbImage::from_pixel(600, 400, Rgb([1, 2, 3]));
        let (resized, ratio) = resize_to_min_side(&image, 300).unwrap();
        assert_eq!(resized.dimensions(), (450, 300));
        assert_eq!(ratio, ResizeRatio::uniform(0.75));
    }

    #[test]
    fn tensor_is_bgr_minus_means() {
        let image = RgbImage::from_pixel(2, 1, Rgb([124, 117, 104]));
        let t = to_input_tensor(&image, &PreprocessConfig::default());
        assert_eq!(t.shape(), &[1, 1, 2, 3]);
        assert!((t[[0, 0, 1, 0]] - 0.061).abs() < 1e-3);
        assert!((t[[0, 0, 1, 2]] - 0.32).abs() < 1e-3);
    }
}
