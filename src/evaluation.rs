//! Dataset-level loops: annotated image export and accuracy evaluation.

use std::path::{Path, PathBuf};
use std::time::Instant;
use ab_glyph::FontRef;
use anyhow::{Context, Result};
use crate::common::{EvalMode, FrcnnImage};
use crate::data::{create_directory, AnnotatedImage, TimeCalc};
use crate::detection_runners::{FrcnnDetector, InferenceProcess};
use crate::drawing::{draw_detections, ClassPalette};
use crate::metrics::{EvaluationSummary, MetricsAggregator};

pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["bmp", "jpeg", "jpg", "png", "tif", "tiff"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported images directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Detects, draws and saves every supported image to `out_dir/<stem>.jpg`.
///
/// Runs in visualisation mode. Returns the paths written.
pub fn save_images<P: InferenceProcess>(
    detector: &mut FrcnnDetector<P>,
    image_paths: &[PathBuf],
    palette: &mut ClassPalette,
    font: Option<&FontRef>,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    detector.set_mode(EvalMode::Visualize)?;
    create_directory(out_dir)?;

    let mut times = TimeCalc::default();
    let mut written = Vec::new();
    for path in image_paths {
        if !is_supported_image(path) {
            log::debug!("Skipping {}", path.display());
            continue;
        }
        let now = Instant::now();
        let mut image = FrcnnImage::open(path)?;
        let detections = detector.run(&image)?;
        times.push(now.elapsed());

        draw_detections(&mut image.image, &detections, palette, font);
        let stem = image.stem().unwrap_or_else(|| format!("image_{}", written.len()));
        let out_path = out_dir.join(format!("{stem}.jpg"));
        image.image.save(&out_path)
            .with_context(|| format!("Failed to save {}", out_path.display()))?;
        log::info!("{}: {} detections, elapsed {:?}", path.display(), detections.len(), now.elapsed());
        written.push(out_path);
    }
    log::info!("Saved {} images, average detection time {:?}", written.len(), times.avg());
    Ok(written)
}

/// Evaluates the detector against ground truth in metrics mode.
pub fn compute_accuracy<P: InferenceProcess>(
    detector: &mut FrcnnDetector<P>,
    annotated_images: &[AnnotatedImage],
) -> Result<EvaluationSummary> {
    detector.set_mode(EvalMode::Metrics)?;
    let mut aggregator = MetricsAggregator::new(detector.classes().clone());
    let mut times = TimeCalc::default();

    for (idx, annotated) in annotated_images.iter().enumerate() {
        let now = Instant::now();
        let image = FrcnnImage::open(&annotated.filepath)?;
        let detections = detector.run(&image)?;
        times.push(now.elapsed());

        let map = aggregator.record_image(&detections, &annotated.bboxes);
        log::info!(
            "{}/{} {}: elapsed {:?}, mAP so far {}",
            idx + 1,
            annotated_images.len(),
            annotated.filepath.display(),
            now.elapsed(),
            map.map_or("n/a".to_string(), |m| format!("{m:.4}"))
        );
    }

    let summary = aggregator.summary();
    log::info!("Evaluated {} images in {:?} (avg {:?})\n{}", times.n(), times.total(), times.avg(), summary);
    Ok(summary)
}

/// Writes an evaluation summary as pretty JSON.
pub fn write_report(summary: &EvaluationSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_directory(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}
