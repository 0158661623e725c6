extern crate frcnn_detect;

use std::fs;
use std::path::{Path, PathBuf};
use image::{Rgb, RgbImage};
use ndarray::array;
use frcnn_detect::common::{ClassMapping, FrcnnBox, FrcnnConfig};
use frcnn_detect::data::{load_annotations, parse_annotation_line, FsAccess};
use frcnn_detect::dataset_stats::{box_image_ratios, histogram};
use frcnn_detect::detection_runners::FrcnnDetector;
use frcnn_detect::drawing::ClassPalette;
use frcnn_detect::evaluation::{compute_accuracy, list_images, save_images, write_report};

mod mock_process;
use mock_process::{by_x, MockProcess};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("frcnn_detect_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([90, 140, 200]))
        .save(dir.join(name))
        .unwrap();
}

#[test]
fn annotation_line_is_parsed() {
    let (path, gt) = parse_annotation_line("imgs/a.png, 1,2,30,40,abeille\n").unwrap();
    assert_eq!(path, "imgs/a.png");
    assert_eq!(gt.class_name, "abeille");
    assert_eq!(gt.bbox, FrcnnBox::new(1., 2., 30., 40.));

    assert!(parse_annotation_line("imgs/a.png,1,2,30,abeille").is_err());
    assert!(parse_annotation_line("imgs/a.png,1,2,x,40,abeille").is_err());
}

#[test]
fn annotations_are_grouped_by_image() {
    let dir = scratch_dir("annotations");
    let file = dir.join("annotations.txt");
    fs::write(
        &file,
        "one.png,0,0,10,10,a\ntwo.png,5,5,20,20,b\n\none.png,20,0,40,0,b\n",
    )
    .unwrap();

    let images = load_annotations(file.to_str().unwrap(), Some(&dir)).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].filepath, dir.join("one.png"));
    assert_eq!(images[0].bboxes.len(), 2);
    assert_eq!(images[1].bboxes[0].class_name, "b");
}

#[test]
fn box_ratios_use_image_sizes_from_disk() {
    let dir = scratch_dir("ratios");
    write_image(&dir, "one.png", 100, 50);
    let file = dir.join("annotations.txt");
    fs::write(&file, "one.png,0,0,10,10,a\none.png,20,0,40,0,b\n").unwrap();

    let images = load_annotations(file.to_str().unwrap(), Some(&dir)).unwrap();
    let ratios = box_image_ratios(&images, None).unwrap();

    assert_eq!(ratios["a"].area_ratios, vec![0.02]);
    assert_eq!(ratios["a"].aspect_ratios, vec![1.]);
    // A flat box has no aspect ratio.
    assert_eq!(ratios["b"].area_ratios, vec![0.]);
    assert!(ratios["b"].aspect_ratios.is_empty());

    let h = histogram(&ratios["a"].area_ratios, 10);
    assert_eq!(h.counts.iter().sum::<usize>(), 1);
}

#[test]
fn missing_image_is_an_error() {
    let dir = scratch_dir("missing");
    let file = dir.join("annotations.txt");
    fs::write(&file, "nowhere.png,0,0,10,10,a\n").unwrap();
    let images = load_annotations(file.to_str().unwrap(), Some(&dir)).unwrap();
    assert!(box_image_ratios(&images, None).is_err());
}

fn detector() -> FrcnnDetector<MockProcess> {
    let classes = ClassMapping::new(&["a", "b"]).unwrap();
    let process = MockProcess::new(array![[0., 0., 2., 2.]], by_x);
    FrcnnDetector::new(FrcnnConfig::default().with_model_name("mock"), classes, process).unwrap()
}

#[test]
fn annotated_images_are_saved_as_jpeg() {
    let dir = scratch_dir("save_images");
    write_image(&dir, "one.png", 100, 50);
    write_image(&dir, "two.bmp", 60, 60);
    fs::write(dir.join("notes.txt"), "not an image").unwrap();
    let out_dir = dir.join("out");

    let paths = list_images(&dir).unwrap();
    assert_eq!(paths.len(), 2);

    let mut detector = detector();
    let mut palette = ClassPalette::new(1);
    let written = save_images(&mut detector, &paths, &mut palette, None, &out_dir).unwrap();

    assert_eq!(written, vec![out_dir.join("one.jpg"), out_dir.join("two.jpg")]);
    assert!(written.iter().all(|p| p.is_file()));
}

#[test]
fn accuracy_is_computed_over_a_dataset() {
    let dir = scratch_dir("accuracy");
    // 100x50 is resized by 6, so the mock's (0, 0, 32, 32) box lands on (0, 0, 5, 5).
    write_image(&dir, "one.png", 100, 50);
    write_image(&dir, "two.png", 100, 50);
    let file = dir.join("annotations.txt");
    fs::write(&file, "one.png,0,0,5,5,a\ntwo.png,0,0,5,5,a\n").unwrap();

    let images = load_annotations(file.to_str().unwrap(), Some(&dir)).unwrap();
    let mut detector = detector();
    let summary = compute_accuracy(&mut detector, &images).unwrap();

    assert_eq!(summary.num_images, 2);
    assert_eq!(summary.mean_average_precision, Some(1.));
    assert_eq!(summary.classes.len(), 1);
    assert_eq!(summary.classes[0].num_positives, 2);

    let report = dir.join("report").join("summary.json");
    write_report(&summary, &report).unwrap();
    assert!(fs::read_to_string(&report).unwrap().contains("\"num_images\": 2"));
}

#[test]
fn config_is_cached_per_model() {
    let name = format!("frcnn_detect_cache_{}", std::process::id());
    let missing = FrcnnConfig::from_cache_or_default(&name).unwrap();
    assert_eq!(missing, FrcnnConfig::default().with_model_name(&name));

    let config = FrcnnConfig::default().with_model_name(&name).with_num_rois(8).with_nms_overlap(0.4);
    let path = config.save_to_cache().unwrap();
    assert_eq!(path, FsAccess::config_file(&name).unwrap());
    assert!(path.ends_with(format!("configs/{name}.json")));

    let cached = FrcnnConfig::from_cache_or_default(&name).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(cached, config);
}
