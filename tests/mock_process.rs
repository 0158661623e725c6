#![allow(dead_code)]

use anyhow::Result;
use ndarray::{Array2, Array4, ArrayView1, ArrayView2};
use frcnn_detect::data::ClassifierOutput;
use frcnn_detect::detection_runners::InferenceProcess;

type Rule = Box<dyn Fn(ArrayView1<f32>) -> (Vec<f32>, Vec<f32>)>;

/// Deterministic stand-in for a network: fixed proposals, and per-region
/// classifier rows computed from the region alone.
pub(crate) struct MockProcess {
    proposals: Array2<f32>,
    rule: Rule,
    pub(crate) classify_calls: usize,
    pub(crate) chunk_sizes: Vec<usize>,
}

impl MockProcess {
    pub(crate) fn new<F>(proposals: Array2<f32>, rule: F) -> Self
    where
        F: Fn(ArrayView1<f32>) -> (Vec<f32>, Vec<f32>) + 'static,
    {
        Self {
            proposals,
            rule: Box::new(rule),
            classify_calls: 0,
            chunk_sizes: Vec::new(),
        }
    }
}

impl InferenceProcess for MockProcess {
    fn propose(&mut self, _input: &Array4<f32>) -> Result<Array2<f32>> {
        Ok(self.proposals.clone())
    }

    fn classify(&mut self, rois: ArrayView2<f32>) -> Result<ClassifierOutput> {
        self.classify_calls += 1;
        self.chunk_sizes.push(rois.nrows());

        let rows: Vec<(Vec<f32>, Vec<f32>)> = rois.rows().into_iter().map(|r| (self.rule)(r)).collect();
        let n_cls = rows.first().map_or(0, |r| r.0.len());
        let n_reg = rows.first().map_or(0, |r| r.1.len());
        let scores = Array2::from_shape_vec((rows.len(), n_cls), rows.iter().flat_map(|r| r.0.clone()).collect())?;
        let regressions = Array2::from_shape_vec((rows.len(), n_reg), rows.iter().flat_map(|r| r.1.clone()).collect())?;
        ClassifierOutput::new(scores, regressions)
    }
}

/// Two foreground classes: `x == 0` scores class 0, `x == 10` class 1, anything else background.
pub(crate) fn by_x(roi: ArrayView1<f32>) -> (Vec<f32>, Vec<f32>) {
    let scores = match roi[0] as i32 {
        0 => vec![0.9, 0.05, 0.05],
        10 => vec![0.1, 0.8, 0.1],
        20 => vec![0.5, 0.3, 0.2],
        _ => vec![0.1, 0.1, 0.8],
    };
    (scores, vec![0.; 8])
}
