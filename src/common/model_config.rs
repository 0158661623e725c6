//! Options for running the detector and assembling its detections.

use std::path::PathBuf;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::common::{EvalMode, PixelConvention};
use crate::data::FsAccess;

/// Denoising applied before resizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoiseReduction {
    /// Per-channel mean filter over a `(2r+1) x (2r+1)` window.
    BoxFilter { radius: u32 },
    /// 7x7 Gaussian blur.
    Gaussian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Length the shorter image side is resized to.
    pub im_size: u32,
    /// BGR channel means subtracted from the input tensor.
    pub img_channel_mean: [f32; 3],
    pub img_scaling_factor: f32,
    pub noise_reduction: Option<NoiseReduction>,
    pub histogram_equalization: bool,
    /// Gamma value; `None` disables correction.
    pub gamma_correction: Option<f32>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            im_size: 300,
            img_channel_mean: [103.939, 116.779, 123.68],
            img_scaling_factor: 1.0,
            noise_reduction: None,
            histogram_equalization: false,
            gamma_correction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Regions of interest per classifier call.
    pub num_rois: usize,
    /// Feature-map cell size in resized-image pixels.
    pub rpn_stride: f32,
    /// Scale of the classifier's (tx, ty, tw, th) outputs.
    pub classifier_regr_std: [f32; 4],
    pub bbox_threshold: Option<f32>,
    pub nms_overlap: f32,
    pub max_boxes: usize,
    pub keep_all_probs: bool,
    pub pixel_convention: PixelConvention,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            num_rois: 32,
            rpn_stride: 16.,
            classifier_regr_std: [8.0, 8.0, 4.0, 4.0],
            bbox_threshold: EvalMode::Visualize.bbox_threshold(),
            nms_overlap: 0.2,
            max_boxes: 300,
            keep_all_probs: false,
            pixel_convention: PixelConvention::Inclusive,
        }
    }
}

impl AssemblerConfig {
    pub fn for_mode(mode: EvalMode) -> Self {
        Self::default().with_mode(mode)
    }

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.bbox_threshold = mode.bbox_threshold();
        self.keep_all_probs = mode.keep_all_probs();
        self
    }
}

/// Everything the detector needs, constructed once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrcnnConfig {
    pub model_name: String,
    pub mode: EvalMode,
    pub preprocess: PreprocessConfig,
    pub assembler: AssemblerConfig,
    pub profile: bool,
}

impl FrcnnConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        Self::from_json_str(&raw).with_context(|| format!("Failed to parse config file {path}"))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config)
    }

    /// Loads the settings cached for `model_name`, or the defaults under that
    /// name when nothing was cached yet.
    pub fn from_cache_or_default(model_name: &str) -> Result<Self> {
        let path = FsAccess::config_file(model_name)?;
        if !path.is_file() {
            log::info!("No cached config for `{}`, using defaults", model_name);
            return Ok(Self::default().with_model_name(model_name));
        }
        Self::from_json_file(&path.to_string_lossy())
    }

    /// Writes these settings to the cache entry of their model name.
    pub fn save_to_cache(&self) -> Result<PathBuf> {
        let path = FsAccess::config_file(&self.model_name)?;
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, raw)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        log::debug!("Cached config at {}", path.display());
        Ok(path)
    }

    pub fn with_model_name(mut self, name: &str) -> Self {
        self.model_name = name.to_string();
        self
    }

    /// Switches mode and the assembler settings that depend on it.
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self.assembler = self.assembler.with_mode(mode);
        self
    }

    pub fn with_num_rois(mut self, n: usize) -> Self {
        self.assembler.num_rois = n;
        self
    }

    pub fn with_rpn_stride(mut self, x: f32) -> Self {
        self.assembler.rpn_stride = x;
        self
    }

    pub fn with_regr_std(mut self, x: [f32; 4]) -> Self {
        self.assembler.classifier_regr_std = x;
        self
    }

    pub fn with_bbox_threshold(mut self, x: Option<f32>) -> Self {
        self.assembler.bbox_threshold = x;
        self
    }

    pub fn with_nms_overlap(mut self, x: f32) -> Self {
        self.assembler.nms_overlap = x;
        self
    }

    pub fn with_max_boxes(mut self, n: usize) -> Self {
        self.assembler.max_boxes = n;
        self
    }

    pub fn with_pixel_convention(mut self, x: PixelConvention) -> Self {
        self.assembler.pixel_convention = x;
        self
    }

    pub fn with_im_size(mut self, n: u32) -> Self {
        self.preprocess.im_size = n;
        self
    }

    pub fn with_noise_reduction(mut self, x: Option<NoiseReduction>) -> Self {
        self.preprocess.noise_reduction = x;
        self
    }

    pub fn with_histogram_equalization(mut self, x: bool) -> Self {
        self.preprocess.histogram_equalization = x;
        self
    }

    pub fn with_gamma_correction(mut self, x: Option<f32>) -> Self {
        self.preprocess.gamma_correction = x;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn to_string(&self) -> String {
        format!("Model Name: {}\n\
        Mode: {}\n\
        Image Min Side: {}\n\
        ROIs Per Classifier Call: {}\n\
        RPN Stride: {}\n\
        Classifier Regression Std: {:?}\n\
        Detection Threshold: {:?}\n\
        NMS Overlap: {}",
                self.model_name, self.mode.str(), self.preprocess.im_size,
                self.assembler.num_rois, self.assembler.rpn_stride,
                self.assembler.classifier_regr_std, self.assembler.bbox_threshold,
                self.assembler.nms_overlap)
    }
}
