mod class_mapping;
mod eval_mode;
mod frcnn_box;
mod frcnn_detection;
mod frcnn_image;
mod model_config;

pub use class_mapping::*;
pub use eval_mode::*;
pub use frcnn_box::*;
pub use frcnn_detection::*;
pub use frcnn_image::*;
pub use model_config::*;
