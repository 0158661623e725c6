use std::collections::BTreeMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::common::{ClassMapping, FrcnnDetection};
use crate::data::GroundTruthBox;
use crate::metrics::curves::{
    accuracy, auc, average_precision, maximise_f_score, mean_defined, precision_recall_curve, roc_curve,
    BestThreshold,
};
use crate::metrics::matching::{match_detections, match_detections_all_classes, ClassSamples};

/// Ranking metrics of one class, or of the flattened micro average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub name: String,
    pub num_samples: usize,
    pub num_positives: usize,
    pub average_precision: Option<f64>,
    pub roc_auc: Option<f64>,
    pub best: BestThreshold,
}

impl ClassReport {
    pub fn from_samples(name: &str, samples: &ClassSamples) -> Self {
        let pr = precision_recall_curve(&samples.labels, &samples.scores);
        let roc_auc = roc_curve(&samples.labels, &samples.scores).map(|roc| auc(&roc.fpr, &roc.tpr));
        Self {
            name: name.to_string(),
            num_samples: samples.len(),
            num_positives: samples.num_positives(),
            average_precision: average_precision(&samples.labels, &samples.scores),
            roc_auc,
            best: maximise_f_score(&pr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub num_images: usize,
    /// Mean of the defined per-class average precisions.
    pub mean_average_precision: Option<f64>,
    /// Mean of the running mAP recorded after each image.
    pub mean_running_map: Option<f64>,
    pub classes: Vec<ClassReport>,
    pub micro_average: ClassReport,
    /// Accuracy of the micro-averaged cells at the micro-average best F-score threshold.
    pub accuracy: Option<f64>,
}

impl std::fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_opt = |x: Option<f64>| x.map_or("n/a".to_string(), |v| format!("{v:.4}"));
        writeln!(f, "Images evaluated: {}", self.num_images)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:<24} AP={} AUC={} best threshold={:.3} (F={:.3} P={:.3} R={:.3})",
                class.name,
                fmt_opt(class.average_precision),
                fmt_opt(class.roc_auc),
                class.best.threshold,
                class.best.f_score,
                class.best.precision,
                class.best.recall
            )?;
        }
        writeln!(f, "mAP = {}", fmt_opt(self.mean_average_precision))?;
        writeln!(f, "Micro-average AP = {}", fmt_opt(self.micro_average.average_precision))?;
        write!(f, "Accuracy = {}", fmt_opt(self.accuracy))
    }
}

/// Accumulates matched samples across a dataset.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    classes: ClassMapping,
    per_class: BTreeMap<String, ClassSamples>,
    micro: ClassSamples,
    running_maps: Vec<Option<f64>>,
}

impl MetricsAggregator {
    pub fn new(classes: ClassMapping) -> Self {
        Self {
            classes,
            per_class: BTreeMap::new(),
            micro: ClassSamples::default(),
            running_maps: Vec::new(),
        }
    }

    /// Matches one image's detections and returns the mAP over everything recorded so far.
    pub fn record_image(&mut self, detections: &[FrcnnDetection], ground_truth: &[GroundTruthBox]) -> Option<f64> {
        for (name, samples) in match_detections(detections, ground_truth, &self.classes) {
            self.per_class.entry(name).or_default().extend(samples);
        }

        let rows = match_detections_all_classes(detections, ground_truth, &self.classes);
        for (labels, scores) in rows.labels.into_iter().zip(rows.scores) {
            self.micro.labels.extend(labels);
            self.micro.scores.extend(scores);
        }

        let map = self.mean_average_precision();
        self.running_maps.push(map);
        log::debug!(
            "Image {}: {} detections, {} ground-truth boxes, running mAP {:?}",
            self.running_maps.len(),
            detections.len(),
            ground_truth.len(),
            map
        );
        map
    }

    pub fn num_images(&self) -> usize {
        self.running_maps.len()
    }

    pub fn running_maps(&self) -> &[Option<f64>] {
        &self.running_maps
    }

    pub fn class_samples(&self) -> &BTreeMap<String, ClassSamples> {
        &self.per_class
    }

    pub fn micro_samples(&self) -> &ClassSamples {
        &self.micro
    }

    /// Average precision per class name; `None` for classes without positives.
    pub fn class_average_precisions(&self) -> BTreeMap<String, Option<f64>> {
        self.per_class
            .iter()
            .map(|(name, s)| (name.clone(), average_precision(&s.labels, &s.scores)))
            .collect()
    }

    pub fn mean_average_precision(&self) -> Option<f64> {
        mean_defined(self.class_average_precisions().into_values())
    }

    pub fn summary(&self) -> EvaluationSummary {
        let entries: Vec<(&String, &ClassSamples)> = self.per_class.iter().collect();
        let classes: Vec<ClassReport> = entries
            .into_par_iter()
            .map(|(name, samples)| ClassReport::from_samples(name, samples))
            .collect();

        let micro_average = ClassReport::from_samples("micro-average", &self.micro);
        let accuracy = if micro_average.best.threshold >= 0. {
            accuracy(&self.micro.labels, &self.micro.scores, micro_average.best.threshold)
        } else {
            None
        };

        EvaluationSummary {
            num_images: self.num_images(),
            mean_average_precision: mean_defined(classes.iter().map(|c| c.average_precision)),
            mean_running_map: mean_defined(self.running_maps.iter().copied()),
            classes,
            micro_average,
            accuracy,
        }
    }
}
