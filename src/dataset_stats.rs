//! Box size statistics of an annotated dataset.

use std::collections::BTreeMap;
use std::path::Path;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::data::AnnotatedImage;

/// Per-class box measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxRatios {
    /// Box area over image area.
    pub area_ratios: Vec<f64>,
    /// Box width over box height; boxes without height are left out.
    pub aspect_ratios: Vec<f64>,
}

/// Bin counts and the `counts.len() + 1` edges delimiting them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
}

/// Collects box/image area ratios and box aspect ratios per class.
///
/// Image sizes are read from the file headers only. Relative paths are
/// resolved against `data_dir` when one is given.
pub fn box_image_ratios(
    annotations: &[AnnotatedImage],
    data_dir: Option<&Path>,
) -> Result<BTreeMap<String, BoxRatios>> {
    let dims: Vec<(u32, u32)> = annotations
        .par_iter()
        .map(|img| {
            let path = match data_dir {
                Some(dir) if img.filepath.is_relative() => dir.join(&img.filepath),
                _ => img.filepath.clone(),
            };
            image::image_dimensions(&path).with_context(|| format!("Failed to read image size of {}", path.display()))
        })
        .collect::<Result<_>>()?;

    let mut ratios: BTreeMap<String, BoxRatios> = BTreeMap::new();
    for (img, (width, height)) in annotations.iter().zip(dims) {
        let img_area = width as f64 * height as f64;
        for gt in &img.bboxes {
            let dx = (gt.bbox.x2 - gt.bbox.x1).abs() as f64;
            let dy = (gt.bbox.y2 - gt.bbox.y1).abs() as f64;
            let entry = ratios.entry(gt.class_name.clone()).or_default();
            if img_area > 0. {
                entry.area_ratios.push(dx * dy / img_area);
            }
            if dy > 0. {
                entry.aspect_ratios.push(dx / dy);
            }
        }
    }
    Ok(ratios)
}

/// Equal-width histogram over `[min, max]`; the last bin includes `max`.
///
/// When every value is equal the range is widened to `value ± 0.5`.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if bins == 0 {
        return Histogram::default();
    }
    let (mut lo, mut hi) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if finite.is_empty() {
        (lo, hi) = (0., 1.);
    } else if lo == hi {
        (lo, hi) = (lo - 0.5, hi + 0.5);
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { counts, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_bin_is_closed() {
        let h = histogram(&[0., 1., 2., 3., 4., 10.], 10);
        assert_eq!(h.edges.len(), 11);
        assert_eq!(h.counts.iter().sum::<usize>(), 6);
        assert_eq!(h.counts[9], 1);
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[4], 1);
    }

    #[test]
    fn constant_values_get_a_unit_range() {
        let h = histogram(&[2., 2., 2.], 10);
        assert!((h.edges[0] - 1.5).abs() < 1e-9);
        assert!((h.edges[10] - 2.5).abs() < 1e-9);
        assert_eq!(h.counts.iter().filter(|&&c| c == 3).count(), 1);
    }
}
