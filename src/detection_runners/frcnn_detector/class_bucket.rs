use rayon::prelude::*;
use crate::common::{FrcnnBox, PixelConvention};
use crate::detection_runners::frcnn_detector::nms::{nms, Nms};

/// A candidate box in resized-image pixels, waiting for NMS.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub bbox: FrcnnBox,
    pub prob: f32,
    pub all_probs: Option<Vec<f32>>,
}

impl Nms for Candidate {
    fn bbox(&self) -> &FrcnnBox {
        &self.bbox
    }

    fn confidence(&self) -> f32 {
        self.prob
    }
}

/// One candidate list per foreground class, indexed by class id.
#[derive(Debug, Clone)]
pub struct ClassBuckets {
    buckets: Vec<Vec<Candidate>>,
}

impl ClassBuckets {
    pub fn new(num_foreground: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); num_foreground],
        }
    }

    /// Returns `false` and drops the candidate when `class_id` has no bucket.
    pub fn push(&mut self, class_id: usize, candidate: Candidate) -> bool {
        match self.buckets.get_mut(class_id) {
            Some(bucket) => {
                bucket.push(candidate);
                true
            }
            None => false,
        }
    }

    pub fn bucket(&self, class_id: usize) -> &[Candidate] {
        self.buckets.get(class_id).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.is_empty())
    }

    /// Runs NMS in every bucket. Classes never compete with each other.
    ///
    /// Returns `(class_id, survivors)` pairs in class order.
    pub fn suppress(
        self,
        overlap_thresh: f32,
        max_boxes: usize,
        convention: PixelConvention,
    ) -> Vec<(usize, Vec<Candidate>)> {
        self.buckets
            .into_par_iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(class_id, mut bucket)| {
                nms(&mut bucket, overlap_thresh, max_boxes, convention);
                (class_id, bucket)
            })
            .collect()
    }
}
