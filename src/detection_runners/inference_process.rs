use ndarray::{Array2, Array4, ArrayView2};
use crate::data::ClassifierOutput;

/// The two network stages of a Faster R-CNN model, seen as a black box.
///
/// Implementations wrap whatever runtime holds the weights. They must be
/// deterministic for a given input so that padded classifier chunks
/// reproduce the outputs of the proposals they repeat.
pub trait InferenceProcess {
    /// Runs the backbone and region proposal network on a `(1, h, w, 3)` input
    /// and returns the filtered proposals as `[x1, y1, x2, y2]` rows in
    /// feature-map units.
    fn propose(&mut self, input: &Array4<f32>) -> anyhow::Result<Array2<f32>>;

    /// Runs the classifier head on a `num_rois x 4` chunk of `[x, y, w, h]` regions.
    fn classify(&mut self, rois: ArrayView2<f32>) -> anyhow::Result<ClassifierOutput>;
}

impl<T: InferenceProcess + ?Sized> InferenceProcess for Box<T> {
    fn propose(&mut self, input: &Array4<f32>) -> anyhow::Result<Array2<f32>> {
        (**self).propose(input)
    }

    fn classify(&mut self, rois: ArrayView2<f32>) -> anyhow::Result<ClassifierOutput> {
        (**self).classify(rois)
    }
}
