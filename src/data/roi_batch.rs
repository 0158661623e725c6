use ndarray::{s, Array2, ArrayView2, Axis};

/// A fixed-size block of regions handed to the classifier in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiChunk {
    /// `num_rois x 4` regions in `(x, y, w, h)` feature-map units.
    pub rois: Array2<f32>,
    /// Rows before this index are real proposals; the rest repeat row 0.
    pub num_real: usize,
    /// Index of row 0 in the image's full proposal list.
    pub offset: usize,
}

impl RoiChunk {
    pub fn is_padded(&self) -> bool {
        self.num_real < self.rois.nrows()
    }
}

/// Splits an image's proposals into classifier-sized chunks.
///
/// The last chunk is padded to full size by repeating its first proposal,
/// since the classifier only accepts a fixed input shape.
pub struct RoiChunks<'a> {
    rois: ArrayView2<'a, f32>,
    num_rois: usize,
    next: usize,
}

impl<'a> RoiChunks<'a> {
    /// `num_rois` must be non-zero.
    pub fn new(rois: ArrayView2<'a, f32>, num_rois: usize) -> Self {
        Self { rois, num_rois, next: 0 }
    }

    pub fn num_chunks(&self) -> usize {
        if self.num_rois == 0 {
            return 0;
        }
        self.rois.nrows().div_ceil(self.num_rois)
    }
}

impl Iterator for RoiChunks<'_> {
    type Item = RoiChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.rois.nrows();
        if self.num_rois == 0 || self.next >= total {
            return None;
        }
        let offset = self.next;
        let end = (offset + self.num_rois).min(total);
        let real = self.rois.slice(s![offset..end, ..]);
        let num_real = real.nrows();

        let mut rois = Array2::<f32>::zeros((self.num_rois, self.rois.ncols()));
        rois.slice_mut(s![..num_real, ..]).assign(&real);
        let first = real.row(0);
        for mut row in rois.axis_iter_mut(Axis(0)).skip(num_real) {
            row.assign(&first);
        }

        self.next = end;
        Some(RoiChunk { rois, num_real, offset })
    }
}
