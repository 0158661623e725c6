mod utils;
pub mod common;
pub mod data;
pub mod dataset_stats;
pub mod detection_runners;
pub mod drawing;
pub mod evaluation;
pub mod metrics;

use std::path::Path;
use std::time::Instant;
use ab_glyph::FontRef;
use crate::common::{ClassMapping, EvalMode, FrcnnConfig, FrcnnDetection, FrcnnImage};
use crate::data::{load_annotations, FsAccess};
use crate::detection_runners::{FrcnnDetector, InferenceProcess};
use crate::drawing::ClassPalette;
use crate::metrics::EvaluationSummary;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

pub fn init_detector<P: InferenceProcess>(
    config: FrcnnConfig,
    classes: ClassMapping,
    process: P,
) -> Result<FrcnnDetector<P>> {
    log::info!(
        "Initializing detector `{}` with {} foreground classes",
        config.model_name,
        classes.num_foreground()
    );
    FrcnnDetector::new(config, classes, process)
}

pub fn run_detection<P: InferenceProcess>(
    detector: &mut FrcnnDetector<P>,
    image: &FrcnnImage,
) -> Result<Vec<FrcnnDetection>> {
    let now = Instant::now();
    let detections = detector.run(image)?;
    log::debug!("Processing time: {:?}", now.elapsed());
    Ok(detections)
}

/// Annotates every supported image in `input_dir` into `./other/box_figure/<run_name>`.
pub fn run_save_images<P: InferenceProcess>(
    detector: &mut FrcnnDetector<P>,
    input_dir: &Path,
    run_name: &str,
    font: Option<&FontRef>,
) -> Result<usize> {
    let out_dir = FsAccess::box_figure_dir(run_name)?;
    let paths = evaluation::list_images(input_dir)?;
    let mut palette = ClassPalette::default().with_labels(detector.classes().foreground_names());
    let written = evaluation::save_images(detector, &paths, &mut palette, font, &out_dir)?;
    Ok(written.len())
}

/// Evaluates against an annotation file and writes `./graphs/<model_name>_metrics.json`.
pub fn run_evaluation<P: InferenceProcess>(
    detector: &mut FrcnnDetector<P>,
    annotation_path: &str,
    data_dir: Option<&Path>,
) -> Result<EvaluationSummary> {
    let annotated = load_annotations(annotation_path, data_dir)?;
    let summary = evaluation::compute_accuracy(detector, &annotated)?;

    let name = match detector.config().model_name.as_str() {
        "" => "frcnn",
        x => x,
    };
    let report = FsAccess::report_dir()?.join(format!("{name}_{}.json", EvalMode::Metrics.str_lowercase()));
    evaluation::write_report(&summary, &report)?;
    Ok(summary)
}
