use anyhow::{bail, Result};
use ndarray::{ArrayView1, ArrayView2};
use crate::common::{AssemblerConfig, ClassMapping, FrcnnBox, FrcnnDetection};
use crate::data::{ClassifierOutput, ResizeRatio, RoiChunk, RoiChunks};
use crate::detection_runners::frcnn_detector::class_bucket::{Candidate, ClassBuckets};
use crate::detection_runners::frcnn_detector::geometry::{apply_regression, rescale_to_original, to_feature_stride};
use crate::detection_runners::inference_process::InferenceProcess;

/// Index and value of the first maximum, `None` for an empty or all-NaN row.
pub fn argmax(scores: ArrayView1<f32>) -> Option<(usize, f32)> {
    scores.iter().enumerate().filter(|(_, v)| !v.is_nan()).fold(None, |best, (i, &v)| match best {
        Some((_, b)) if v <= b => best,
        _ => Some((i, v)),
    })
}

/// Turns the classifier's raw per-region output into final detections.
#[derive(Debug, Clone)]
pub struct DetectionAssembler {
    config: AssemblerConfig,
    classes: ClassMapping,
}

impl DetectionAssembler {
    pub fn new(config: AssemblerConfig, classes: ClassMapping) -> Result<Self> {
        if config.num_rois == 0 {
            bail!("`num_rois` must be at least 1.");
        }
        if !(0.0..=1.0).contains(&config.nms_overlap) {
            bail!("NMS overlap threshold {} is outside [0, 1].", config.nms_overlap);
        }
        Ok(Self { config, classes })
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassMapping {
        &self.classes
    }

    /// Runs the classifier over all of an image's `(x, y, w, h)` proposals in
    /// fixed-size chunks and assembles the detections in original-image pixels.
    pub fn assemble<P: InferenceProcess + ?Sized>(
        &self,
        process: &mut P,
        rois: ArrayView2<f32>,
        ratio: ResizeRatio,
    ) -> Result<Vec<FrcnnDetection>> {
        if rois.ncols() != 4 {
            bail!("Expected `[x, y, w, h]` proposal rows, got {} columns.", rois.ncols());
        }
        let mut buckets = ClassBuckets::new(self.classes.num_foreground());
        let chunks = RoiChunks::new(rois, self.config.num_rois);
        let num_chunks = chunks.num_chunks();

        for chunk in chunks {
            let output = process.classify(chunk.rois.view())?;
            self.scan_chunk(&chunk, &output, &mut buckets)?;
        }
        log::debug!(
            "{} proposals in {} chunks gave {} candidates",
            rois.nrows(),
            num_chunks,
            buckets.len()
        );

        Ok(self.finalize(buckets, ratio))
    }

    /// Sorts the real regions of one chunk into class buckets.
    ///
    /// Padding rows are never read, so they cannot add a detection.
    pub fn scan_chunk(
        &self,
        chunk: &RoiChunk,
        output: &ClassifierOutput,
        buckets: &mut ClassBuckets,
    ) -> Result<()> {
        if output.num_rois() < chunk.num_real {
            bail!(
                "Classifier returned {} rows for a chunk of {} regions.",
                output.num_rois(),
                chunk.num_real
            );
        }
        if output.num_classes() != self.classes.num_classes() {
            bail!(
                "Classifier returned {} class scores, the class mapping has {}.",
                output.num_classes(),
                self.classes.num_classes()
            );
        }

        for ii in 0..chunk.num_real {
            let scores = output.class_scores(ii);
            let Some((class_id, max_prob)) = argmax(scores) else {
                continue;
            };
            if !max_prob.is_finite() || self.classes.is_background(class_id) {
                continue;
            }
            if let Some(threshold) = self.config.bbox_threshold {
                if max_prob < threshold {
                    continue;
                }
            }

            let roi = chunk.rois.row(ii);
            let (x, y, w, h) = (roi[0], roi[1], roi[2], roi[3]);
            let regressed = output
                .regression_delta(ii, class_id)
                .and_then(|delta| apply_regression(x, y, w, h, delta, self.config.classifier_regr_std));
            let (x, y, w, h) = match regressed {
                Some(r) => r,
                None => {
                    log::debug!(
                        "No usable regression for region {} (class {}), keeping the proposal box",
                        chunk.offset + ii,
                        class_id
                    );
                    (x, y, w, h)
                }
            };
            if ![x, y, w, h].iter().all(|v| v.is_finite()) {
                log::debug!("Skipping region {} with a non-finite box", chunk.offset + ii);
                continue;
            }

            let stride = self.config.rpn_stride;
            let bbox = FrcnnBox::new(
                to_feature_stride(x, stride),
                to_feature_stride(y, stride),
                to_feature_stride(x + w, stride),
                to_feature_stride(y + h, stride),
            );
            let all_probs = self.config.keep_all_probs.then(|| scores.to_vec());
            buckets.push(class_id, Candidate { bbox, prob: max_prob, all_probs });
        }
        Ok(())
    }

    /// Per-class NMS, then rescaling to original-image pixels.
    pub fn finalize(&self, buckets: ClassBuckets, ratio: ResizeRatio) -> Vec<FrcnnDetection> {
        let survivors = buckets.suppress(
            self.config.nms_overlap,
            self.config.max_boxes,
            self.config.pixel_convention,
        );

        let mut detections = Vec::new();
        for (class_id, candidates) in survivors {
            let label = self.classes.name(class_id).map(|x| x.to_string());
            for c in candidates {
                let bbox = rescale_to_original(ratio, c.bbox.x1, c.bbox.y1, c.bbox.x2, c.bbox.y2);
                let mut det = FrcnnDetection::new(class_id, bbox, label.clone(), c.prob);
                det.all_probs = c.all_probs;
                detections.push(det);
            }
        }
        detections
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use super::*;

    #[test]
    fn argmax_takes_first_of_ties() {
        assert_eq!(argmax(array![0.2, 0.4, 0.4].view()), Some((1, 0.4)));
        assert_eq!(argmax(ndarray::Array1::<f32>::zeros(0).view()), None);
    }
}
