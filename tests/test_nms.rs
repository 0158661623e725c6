extern crate frcnn_detect;

use frcnn_detect::common::{FrcnnBox, FrcnnDetection, PixelConvention};
use frcnn_detect::detection_runners::frcnn_detector::nms::{
    nms, non_max_suppression, non_max_suppression_with_payload,
};

const INCLUSIVE: PixelConvention = PixelConvention::Inclusive;
const EXCLUSIVE: PixelConvention = PixelConvention::Exclusive;

/// Three clusters of jittered boxes, a few of them isolated.
fn clustered() -> (Vec<FrcnnBox>, Vec<f32>) {
    let mut boxes = Vec::new();
    let mut probs = Vec::new();
    for (c, (cx, cy)) in [(0., 0.), (200., 40.), (90., 300.)].into_iter().enumerate() {
        for k in 0..6 {
            let d = 3. * k as f32;
            boxes.push(FrcnnBox::new(cx + d, cy + d / 2., cx + 50. + d, cy + 40. + d));
            probs.push(0.95 - 0.1 * k as f32 - 0.01 * c as f32);
        }
    }
    boxes.push(FrcnnBox::new(500., 500., 520., 530.));
    probs.push(0.3);
    (boxes, probs)
}

#[test]
fn empty_input_gives_empty_output() {
    let (boxes, probs) = non_max_suppression(&[], &[], 0.5, 300, INCLUSIVE);
    assert!(boxes.is_empty());
    assert!(probs.is_empty());
}

#[test]
fn higher_score_wins_an_overlap() {
    // Inclusive IoU of A and B is 100 / 142, about 0.70.
    let a = FrcnnBox::new(0., 0., 10., 10.);
    let b = FrcnnBox::new(1., 1., 11., 11.);

    let (kept, probs) = non_max_suppression(&[b, a], &[0.8, 0.9], 0.5, 300, INCLUSIVE);
    assert_eq!(kept, vec![a]);
    assert_eq!(probs, vec![0.9]);

    let (kept, _) = non_max_suppression(&[b, a], &[0.8, 0.9], 0.8, 300, INCLUSIVE);
    assert_eq!(kept, vec![a, b]);
}

#[test]
fn nested_lower_score_box_is_suppressed_in_any_order() {
    // Inclusive IoU is 100 / 121, exclusive 81 / 100.
    let a = FrcnnBox::new(0., 0., 10., 10.);
    let b = FrcnnBox::new(1., 1., 10., 10.);
    for convention in [INCLUSIVE, EXCLUSIVE] {
        let (kept, probs) = non_max_suppression(&[a, b], &[0.9, 0.5], 0.2, 300, convention);
        assert_eq!(kept, vec![a]);
        assert_eq!(probs, vec![0.9]);

        let (kept, probs) = non_max_suppression(&[b, a], &[0.5, 0.9], 0.2, 300, convention);
        assert_eq!(kept, vec![a]);
        assert_eq!(probs, vec![0.9]);
    }
}

#[test]
fn nan_score_does_not_break_ordering() {
    let boxes = [
        FrcnnBox::new(0., 0., 10., 10.),
        FrcnnBox::new(100., 100., 110., 110.),
        FrcnnBox::new(200., 200., 210., 210.),
    ];
    let (kept, probs) = non_max_suppression(&boxes, &[0.5, f32::NAN, 0.7], 0.5, 300, INCLUSIVE);
    assert_eq!(kept.len(), 3);
    let finite: Vec<f32> = probs.into_iter().filter(|p| !p.is_nan()).collect();
    assert_eq!(finite, vec![0.7, 0.5]);
}

#[test]
fn iou_equal_to_threshold_survives() {
    // Exclusive IoU is exactly 50 / 100.
    let a = FrcnnBox::new(0., 0., 10., 10.);
    let b = FrcnnBox::new(0., 0., 10., 5.);
    let (kept, _) = non_max_suppression(&[a, b], &[0.9, 0.8], 0.5, 300, EXCLUSIVE);
    assert_eq!(kept.len(), 2);
}

#[test]
fn convention_changes_the_overlap() {
    // Exclusive IoU is 50 / 150, inclusive 66 / 176.
    let a = FrcnnBox::new(0., 0., 10., 10.);
    let b = FrcnnBox::new(5., 0., 15., 10.);
    let (exclusive, _) = non_max_suppression(&[a, b], &[0.9, 0.8], 0.35, 300, EXCLUSIVE);
    let (inclusive, _) = non_max_suppression(&[a, b], &[0.9, 0.8], 0.35, 300, INCLUSIVE);
    assert_eq!(exclusive.len(), 2);
    assert_eq!(inclusive, vec![a]);
}

#[test]
fn suppression_is_idempotent() {
    let (boxes, probs) = clustered();
    let (once_boxes, once_probs) = non_max_suppression(&boxes, &probs, 0.3, 300, INCLUSIVE);
    let (twice_boxes, twice_probs) = non_max_suppression(&once_boxes, &once_probs, 0.3, 300, INCLUSIVE);
    assert_eq!(once_boxes, twice_boxes);
    assert_eq!(once_probs, twice_probs);
}

#[test]
fn higher_threshold_keeps_at_least_as_many_on_clusters() {
    let (boxes, probs) = clustered();
    let mut last = 0;
    for theta in [0., 0.1, 0.3, 0.5, 0.7, 0.9, 1.] {
        let (kept, _) = non_max_suppression(&boxes, &probs, theta, 300, INCLUSIVE);
        assert!(kept.len() >= last, "theta {theta} kept {} < {last}", kept.len());
        last = kept.len();
    }
    assert_eq!(last, boxes.len());
}

#[test]
fn survivors_are_sorted_and_capped() {
    let boxes: Vec<FrcnnBox> = (0..5)
        .map(|i| FrcnnBox::new(100. * i as f32, 0., 100. * i as f32 + 20., 20.))
        .collect();
    let probs = [0.1, 0.5, 0.3, 0.9, 0.7];

    let (kept, kept_probs) = non_max_suppression(&boxes, &probs, 0.5, 300, INCLUSIVE);
    assert_eq!(kept.len(), 5);
    assert_eq!(kept_probs, vec![0.9, 0.7, 0.5, 0.3, 0.1]);

    let (kept, kept_probs) = non_max_suppression(&boxes, &probs, 0.5, 2, INCLUSIVE);
    assert_eq!(kept, vec![boxes[3], boxes[4]]);
    assert_eq!(kept_probs, vec![0.9, 0.7]);
}

#[test]
fn payload_follows_its_box() {
    let a = FrcnnBox::new(0., 0., 10., 10.);
    let b = FrcnnBox::new(1., 1., 11., 11.);
    let c = FrcnnBox::new(50., 50., 60., 60.);
    let payload = vec!["b", "a", "c"];

    let (kept, probs, payload) =
        non_max_suppression_with_payload(&[b, a, c], &[0.8, 0.9, 0.4], payload, 0.5, 300, INCLUSIVE);
    assert_eq!(kept, vec![a, c]);
    assert_eq!(probs, vec![0.9, 0.4]);
    assert_eq!(payload, vec!["a", "c"]);
}

#[test]
fn in_place_form_works_on_detections() {
    let mut dets = vec![
        FrcnnDetection::new(0, FrcnnBox::new(1., 1., 11., 11.), None, 0.8),
        FrcnnDetection::new(0, FrcnnBox::new(0., 0., 10., 10.), None, 0.9),
        FrcnnDetection::new(0, FrcnnBox::new(30., 30., 40., 40.), None, 0.2),
    ];
    nms(&mut dets, 0.5, 300, INCLUSIVE);
    let confidences: Vec<f32> = dets.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.9, 0.2]);
}
