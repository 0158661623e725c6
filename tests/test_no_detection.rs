extern crate frcnn_detect;

use image::{Rgb, RgbImage};
use ndarray::{array, Array2};
use frcnn_detect::common::{ClassMapping, EvalMode, FrcnnConfig, FrcnnImage};

mod mock_process;
use mock_process::{by_x, MockProcess};

fn blank() -> FrcnnImage {
    FrcnnImage::from(RgbImage::from_pixel(320, 240, Rgb([0, 0, 0])))
}

#[test]
fn no_detections() {
    let classes = ClassMapping::new(&["abeille", "bourdon"]).unwrap();
    // Every proposal scores highest on the background class.
    let proposals = array![[5., 5., 7., 7.], [30., 2., 34., 9.]];
    let mut detector = frcnn_detect::init_detector(
        FrcnnConfig::default().with_mode(EvalMode::Metrics),
        classes,
        MockProcess::new(proposals, by_x),
    )
    .unwrap();

    let result = frcnn_detect::run_detection(&mut detector, &blank()).unwrap();
    assert!(result.is_empty());
    assert_eq!(detector.process_mut().classify_calls, 1);
}

#[test]
fn no_proposals() {
    let classes = ClassMapping::new(&["abeille"]).unwrap();
    let mut detector = frcnn_detect::init_detector(
        FrcnnConfig::default(),
        classes,
        MockProcess::new(Array2::zeros((0, 4)), by_x),
    )
    .unwrap();

    let result = frcnn_detect::run_detection(&mut detector, &blank()).unwrap();
    assert!(result.is_empty());
    assert_eq!(detector.process_mut().classify_calls, 0);
}
