use serde::{Deserialize, Serialize};

/// What the detections of a run are for.
///
/// `Visualize` keeps only confident detections for drawing. `Metrics` keeps
/// every non-background candidate together with its full score vector so the
/// curves can sweep the whole score range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalMode {
    #[default] Visualize,
    Metrics,
}

// Hardcoded mode names, "proper" spelling first and the lowercase version second.
static VISUALIZE: [&str; 2] = ["Visualize", "visualize"];
static METRICS: [&str; 2] = ["Metrics", "metrics"];

impl EvalMode {
    pub fn from_str(mode: &str) -> Option<Self> {
        match mode.to_lowercase().as_str() {
            "visualize" | "save_images" => Some(EvalMode::Visualize),
            "metrics" | "compute_accuracy" => Some(EvalMode::Metrics),
            _ => None,
        }
    }

    pub fn str(&self) -> &'static str {
        match self {
            EvalMode::Visualize => VISUALIZE[0],
            EvalMode::Metrics => METRICS[0],
        }
    }

    pub fn str_lowercase(&self) -> &'static str {
        match self {
            EvalMode::Visualize => VISUALIZE[1],
            EvalMode::Metrics => METRICS[1],
        }
    }

    /// Minimum class score a candidate needs; `None` keeps everything.
    pub fn bbox_threshold(&self) -> Option<f32> {
        match self {
            EvalMode::Visualize => Some(0.6),
            EvalMode::Metrics => None,
        }
    }

    pub fn keep_all_probs(&self) -> bool {
        matches!(self, EvalMode::Metrics)
    }
}
