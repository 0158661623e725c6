use serde::{Deserialize, Serialize};
use crate::common::FrcnnBox;
use crate::detection_runners::frcnn_detector::nms::Nms;

/// A finalized detection in original-image pixel coordinates.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrcnnDetection {
    pub class_id: usize,
    pub bbox: FrcnnBox,
    pub label: Option<String>,
    pub confidence: f32,
    /// Full class-probability vector, background slot included, when the
    /// assembler was asked to keep it.
    pub all_probs: Option<Vec<f32>>,
}

impl Nms for FrcnnDetection {
    fn bbox(&self) -> &FrcnnBox {
        &self.bbox
    }

    /// Returns the confidence score of the bounding box.
    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl FrcnnDetection {
    pub fn new(class_id: usize, bbox: FrcnnBox, label: Option<String>, confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            label,
            confidence,
            all_probs: None,
        }
    }

    pub fn with_all_probs(mut self, probs: Vec<f32>) -> Self {
        self.all_probs = Some(probs);
        self
    }

    pub fn get_label(&self) -> String {
        self.label.clone().unwrap_or("Unknown".to_string())
    }

    /// Caption used when drawing: `label: percent`.
    pub fn caption(&self) -> String {
        format!("{}: {}", self.get_label(), (100. * self.confidence) as i32)
    }
}
