use crate::common::{FrcnnBox, PixelConvention};

pub trait Nms {
    fn bbox(&self) -> &FrcnnBox;
    fn confidence(&self) -> f32;
}

/// Greedy non-maximum suppression, in place.
///
/// Boxes are visited from the highest confidence down. A box is dropped when
/// its IoU with an already kept box exceeds `overlap_thresh`. At most
/// `max_boxes` survive, in descending confidence order.
pub fn nms<T: Nms>(boxes: &mut Vec<T>, overlap_thresh: f32, max_boxes: usize, convention: PixelConvention) {
    boxes.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));
    let mut current_index = 0;
    for index in 0..boxes.len() {
        if current_index >= max_boxes {
            break;
        }
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = boxes[prev_index].bbox().iou(boxes[index].bbox(), convention);
            if iou > overlap_thresh {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
}

struct Indexed {
    bbox: FrcnnBox,
    prob: f32,
    index: usize,
}

impl Nms for Indexed {
    fn bbox(&self) -> &FrcnnBox {
        &self.bbox
    }

    fn confidence(&self) -> f32 {
        self.prob
    }
}

/// Indices of the boxes surviving [`nms`], in processing order.
pub fn nms_indices(
    boxes: &[FrcnnBox],
    probs: &[f32],
    overlap_thresh: f32,
    max_boxes: usize,
    convention: PixelConvention,
) -> Vec<usize> {
    if boxes.len() != probs.len() {
        log::warn!(
            "NMS got {} boxes but {} scores, ignoring the surplus",
            boxes.len(),
            probs.len()
        );
    }
    let mut indexed: Vec<Indexed> = boxes
        .iter()
        .zip(probs)
        .enumerate()
        .map(|(index, (bbox, prob))| Indexed { bbox: *bbox, prob: *prob, index })
        .collect();
    nms(&mut indexed, overlap_thresh, max_boxes, convention);
    indexed.into_iter().map(|x| x.index).collect()
}

/// Parallel-array form: returns the surviving boxes and their scores.
pub fn non_max_suppression(
    boxes: &[FrcnnBox],
    probs: &[f32],
    overlap_thresh: f32,
    max_boxes: usize,
    convention: PixelConvention,
) -> (Vec<FrcnnBox>, Vec<f32>) {
    nms_indices(boxes, probs, overlap_thresh, max_boxes, convention)
        .into_iter()
        .map(|i| (boxes[i], probs[i]))
        .unzip()
}

/// Like [`non_max_suppression`], carrying one payload item per box through the filter.
pub fn non_max_suppression_with_payload<P>(
    boxes: &[FrcnnBox],
    probs: &[f32],
    payload: Vec<P>,
    overlap_thresh: f32,
    max_boxes: usize,
    convention: PixelConvention,
) -> (Vec<FrcnnBox>, Vec<f32>, Vec<P>) {
    let keep = nms_indices(boxes, probs, overlap_thresh, max_boxes, convention);
    let mut payload: Vec<Option<P>> = payload.into_iter().map(Some).collect();

    let mut kept_boxes = Vec::with_capacity(keep.len());
    let mut kept_probs = Vec::with_capacity(keep.len());
    let mut kept_payload = Vec::with_capacity(keep.len());
    for i in keep {
        if let Some(item) = payload.get_mut(i).and_then(Option::take) {
            kept_boxes.push(boxes[i]);
            kept_probs.push(probs[i]);
            kept_payload.push(item);
        }
    }
    (kept_boxes, kept_probs, kept_payload)
}
