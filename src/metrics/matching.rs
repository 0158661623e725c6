//! Matching detections against ground truth to produce label/score samples.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::common::{ClassMapping, FrcnnBox, FrcnnDetection, PixelConvention};
use crate::data::GroundTruthBox;

/// Minimum IoU for a detection to count as finding a ground-truth box.
pub const MATCH_IOU_THRESHOLD: f32 = 0.5;

/// Binary labels and scores of one class, in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSamples {
    pub labels: Vec<u8>,
    pub scores: Vec<f64>,
}

impl ClassSamples {
    pub fn push(&mut self, label: bool, score: f64) {
        self.labels.push(label as u8);
        self.scores.push(score);
    }

    pub fn extend(&mut self, other: ClassSamples) {
        self.labels.extend(other.labels);
        self.scores.extend(other.scores);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l > 0).count()
    }
}

/// One sample row per detection or missed ground-truth box, one column per foreground class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiClassSamples {
    pub labels: Vec<Vec<u8>>,
    pub scores: Vec<Vec<f64>>,
}

/// IoU of two corner boxes with exclusive extents; zero when either is degenerate.
pub fn match_iou(a: &FrcnnBox, b: &FrcnnBox) -> f32 {
    if a.x1 >= a.x2 || a.y1 >= a.y2 || b.x1 >= b.x2 || b.y1 >= b.y2 {
        return 0.;
    }
    a.iou(b, PixelConvention::Exclusive)
}

fn class_name(det: &FrcnnDetection, classes: &ClassMapping) -> String {
    det.label
        .clone()
        .or_else(|| classes.name(det.class_id).map(|x| x.to_string()))
        .unwrap_or_else(|| det.get_label())
}

fn by_confidence(detections: &[FrcnnDetection]) -> Vec<&FrcnnDetection> {
    let mut sorted: Vec<&FrcnnDetection> = detections.iter().collect();
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    sorted
}

/// Per-class samples for one image.
///
/// Detections are visited from the most confident down; each one matches the
/// first not yet matched ground-truth box of its class with IoU at least
/// [`MATCH_IOU_THRESHOLD`] and yields `(matched, confidence)`. Every ground-truth
/// box left unmatched (and not marked difficult) yields `(true, 0.0)`.
pub fn match_detections(
    detections: &[FrcnnDetection],
    ground_truth: &[GroundTruthBox],
    classes: &ClassMapping,
) -> BTreeMap<String, ClassSamples> {
    let mut samples: BTreeMap<String, ClassSamples> = BTreeMap::new();
    let mut matched = vec![false; ground_truth.len()];

    for det in by_confidence(detections) {
        let name = class_name(det, classes);
        let found = ground_truth.iter().enumerate().position(|(g, gt)| {
            !matched[g] && gt.class_name == name && match_iou(&det.bbox, &gt.bbox) >= MATCH_IOU_THRESHOLD
        });
        if let Some(g) = found {
            matched[g] = true;
        }
        samples
            .entry(name)
            .or_default()
            .push(found.is_some(), det.confidence as f64);
    }

    for (gt, _) in ground_truth.iter().zip(&matched).filter(|(gt, &m)| !m && !gt.difficult) {
        samples.entry(gt.class_name.clone()).or_default().push(true, 0.);
    }
    samples
}

/// Multi-class samples for one image, used for micro-averaged curves.
///
/// A detection's label row is the one-hot class of the best unmatched
/// ground-truth box it overlaps by at least [`MATCH_IOU_THRESHOLD`], whatever
/// its class (the earliest one on ties), or all zeros. Its score row is its
/// foreground class-probability vector, or its confidence in its own column
/// when the vector was not kept. Each unmatched ground-truth box adds a
/// one-hot label row with zero scores.
pub fn match_detections_all_classes(
    detections: &[FrcnnDetection],
    ground_truth: &[GroundTruthBox],
    classes: &ClassMapping,
) -> MultiClassSamples {
    let n = classes.num_foreground();
    let mut samples = MultiClassSamples::default();
    let mut matched = vec![false; ground_truth.len()];

    for det in by_confidence(detections) {
        let best = ground_truth
            .iter()
            .enumerate()
            .filter(|(g, _)| !matched[*g])
            .map(|(g, gt)| (g, match_iou(&det.bbox, &gt.bbox)))
            .filter(|(_, iou)| *iou >= MATCH_IOU_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));

        let mut label_row = vec![0u8; n];
        if let Some((g, _)) = best {
            matched[g] = true;
            match classes.id_of(&ground_truth[g].class_name) {
                Some(id) => label_row[id] = 1,
                None => log::warn!("Ground-truth class `{}` is not in the class mapping", ground_truth[g].class_name),
            }
        }

        let score_row = match &det.all_probs {
            Some(probs) if probs.len() >= n => probs[..n].iter().map(|&p| p as f64).collect(),
            _ => {
                let mut row = vec![0.; n];
                if let Some(v) = row.get_mut(det.class_id) {
                    *v = det.confidence as f64;
                }
                row
            }
        };
        samples.labels.push(label_row);
        samples.scores.push(score_row);
    }

    for (g, gt) in ground_truth.iter().enumerate() {
        if matched[g] || gt.difficult {
            continue;
        }
        let Some(id) = classes.id_of(&gt.class_name) else {
            log::warn!("Ground-truth class `{}` is not in the class mapping", gt.class_name);
            continue;
        };
        let mut label_row = vec![0u8; n];
        label_row[id] = 1;
        samples.labels.push(label_row);
        samples.scores.push(vec![0.; n]);
    }
    samples
}
