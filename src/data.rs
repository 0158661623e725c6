mod annotation;
mod classifier_output;
mod filesystem_access;
mod roi_batch;
mod time_calc;

pub use annotation::{load_annotations, parse_annotation_line, AnnotatedImage, GroundTruthBox};
pub use classifier_output::ClassifierOutput;
pub use filesystem_access::{create_directory, FsAccess};
pub use roi_batch::{RoiChunk, RoiChunks};
pub use time_calc::TimeCalc;

pub use crate::detection_runners::frcnn_detector::geometry::ResizeRatio;
