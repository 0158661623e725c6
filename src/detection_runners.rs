pub mod frcnn_detector;
pub mod inference_process;

pub use frcnn_detector::*;
pub use inference_process::InferenceProcess;
