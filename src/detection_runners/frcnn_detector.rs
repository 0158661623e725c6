pub mod assembler;
pub mod class_bucket;
pub mod geometry;
pub mod image_ops;
pub mod nms;

use std::time::Instant;
use anyhow::Result;
use ndarray::{Array2, Axis};
use crate::common::{ClassMapping, EvalMode, FrcnnBox, FrcnnConfig, FrcnnDetection, FrcnnImage};
use crate::detection_runners::inference_process::InferenceProcess;
use crate::utils;
use assembler::DetectionAssembler;
use geometry::to_xywh;

/// Per-image Faster R-CNN pipeline around a black-box network.
pub struct FrcnnDetector<P: InferenceProcess> {
    config: FrcnnConfig,
    assembler: DetectionAssembler,
    process: P,
}

impl<P: InferenceProcess> FrcnnDetector<P> {
    pub fn new(config: FrcnnConfig, classes: ClassMapping, process: P) -> Result<Self> {
        let assembler = DetectionAssembler::new(config.assembler.clone(), classes)?;
        log::info!("Detector configuration:\n{}", config.to_string());
        Ok(Self { config, assembler, process })
    }

    pub fn config(&self) -> &FrcnnConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassMapping {
        self.assembler.classes()
    }

    pub fn process_mut(&mut self) -> &mut P {
        &mut self.process
    }

    /// Switches between visualisation and metrics settings without rebuilding the process.
    pub fn set_mode(&mut self, mode: EvalMode) -> Result<()> {
        self.config = self.config.clone().with_mode(mode);
        self.assembler = DetectionAssembler::new(self.config.assembler.clone(), self.assembler.classes().clone())?;
        log::info!("Detector switched to {} mode", mode.str());
        Ok(())
    }

    /// Detects objects in one image. Boxes are in the image's own pixel coordinates.
    pub fn run(&mut self, image: &FrcnnImage) -> Result<Vec<FrcnnDetection>> {
        let detect_time = Instant::now();
        let mut _detect_elapsed = detect_time.elapsed();
        let profile = self.config.profile;

        let input = image_ops::preprocess(&image.image, &self.config.preprocess)?;
        _detect_elapsed = utils::trace(profile, "TIME", "Preprocessing input", detect_time, _detect_elapsed);

        let proposals = self.process.propose(&input.tensor)?;
        _detect_elapsed = utils::trace(profile, "TIME", "Region proposals", detect_time, _detect_elapsed);

        let rois = proposals_to_xywh(&proposals);
        let detections = self.assembler.assemble(&mut self.process, rois.view(), input.ratio)?;
        _detect_elapsed = utils::trace(profile, "TIME", "Classifier and NMS", detect_time, _detect_elapsed);

        log::debug!(
            "{} proposals, {} detections in {:?}",
            rois.nrows(),
            detections.len(),
            detect_time.elapsed()
        );
        Ok(detections)
    }
}

/// Converts `[x1, y1, x2, y2]` proposal rows to `[x, y, w, h]`, dropping inverted or non-finite ones.
pub fn proposals_to_xywh(proposals: &Array2<f32>) -> Array2<f32> {
    let mut rows: Vec<f32> = Vec::with_capacity(proposals.len());
    let mut dropped = 0;
    for row in proposals.axis_iter(Axis(0)) {
        if row.len() < 4 {
            dropped += 1;
            continue;
        }
        let bbox = FrcnnBox::new(row[0], row[1], row[2], row[3]);
        match to_xywh(&bbox) {
            Some((x, y, w, h)) if bbox.is_valid() => rows.extend_from_slice(&[x, y, w, h]),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("Dropped {} malformed region proposals", dropped);
    }
    let n = rows.len() / 4;
    Array2::from_shape_vec((n, 4), rows).unwrap_or_else(|_| Array2::zeros((0, 4)))
}
