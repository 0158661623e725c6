use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};

/// Raw output of one classifier call over a chunk of regions.
///
/// # Fields
///
/// * `scores` - `rois x classes` class probabilities, background in the last column.
/// * `regressions` - `rois x 4*(classes - 1)` regression deltas, four per foreground class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub scores: Array2<f32>,
    pub regressions: Array2<f32>,
}

impl ClassifierOutput {
    pub fn new(scores: Array2<f32>, regressions: Array2<f32>) -> Result<Self> {
        if scores.nrows() != regressions.nrows() {
            bail!(
                "Classifier scores and regressions disagree on the number of regions: {} vs {}.",
                scores.nrows(),
                regressions.nrows()
            );
        }
        Ok(Self { scores, regressions })
    }

    pub fn num_rois(&self) -> usize {
        self.scores.nrows()
    }

    pub fn num_classes(&self) -> usize {
        self.scores.ncols()
    }

    pub fn class_scores(&self, roi: usize) -> ArrayView1<'_, f32> {
        self.scores.row(roi)
    }

    /// Regression deltas `(tx, ty, tw, th)` of `class_id` for region `roi`.
    ///
    /// `None` when the row is too short for that class or holds non-finite values.
    pub fn regression_delta(&self, roi: usize, class_id: usize) -> Option<[f32; 4]> {
        if roi >= self.regressions.nrows() {
            return None;
        }
        let row = self.regressions.row(roi);
        let start = 4 * class_id;
        if start + 4 > row.len() {
            return None;
        }
        let delta = [row[start], row[start + 1], row[start + 2], row[start + 3]];
        delta.iter().all(|v| v.is_finite()).then_some(delta)
    }
}
