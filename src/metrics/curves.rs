//! Ranking metrics over binary labels and confidence scores.

use serde::{Deserialize, Serialize};
use crate::utils::round3;

/// Precision/recall pairs, recall decreasing, ending at `(1.0, 0.0)`.
///
/// `thresholds` is increasing and one shorter than the other two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// False/true positive rates, starting at `(0.0, 0.0)` with an infinite threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Best F-score operating point of a precision/recall curve, rounded to three decimals.
///
/// The defaults (`-1` everywhere, F = 0) mean no threshold had a positive F-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestThreshold {
    pub threshold: f64,
    pub f_score: f64,
    pub precision: f64,
    pub recall: f64,
}

impl Default for BestThreshold {
    fn default() -> Self {
        Self {
            threshold: -1.,
            f_score: 0.,
            precision: -1.,
            recall: -1.,
        }
    }
}

/// Cumulative false and true positives at each distinct score, highest score first.
fn binary_clf_curve(labels: &[u8], scores: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..labels.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0.;
    for (k, &i) in order.iter().enumerate() {
        if labels[i] > 0 {
            tp += 1.;
        }
        let last_of_value = match order.get(k + 1) {
            Some(&next) => scores[next] != scores[i],
            None => true,
        };
        if last_of_value {
            tps.push(tp);
            fps.push((k + 1) as f64 - tp);
            thresholds.push(scores[i]);
        }
    }
    (fps, tps, thresholds)
}

pub fn precision_recall_curve(labels: &[u8], scores: &[f64]) -> PrCurve {
    let (fps, tps, thresholds) = binary_clf_curve(labels, scores);
    let total_tp = tps.last().copied().unwrap_or(0.);

    let mut precision: Vec<f64> = tps
        .iter()
        .zip(&fps)
        .map(|(tp, fp)| if tp + fp > 0. { tp / (tp + fp) } else { 0. })
        .collect();
    let mut recall: Vec<f64> = tps
        .iter()
        .map(|tp| if total_tp > 0. { tp / total_tp } else { 1. })
        .collect();
    let mut thresholds = thresholds;

    precision.reverse();
    recall.reverse();
    thresholds.reverse();
    precision.push(1.);
    recall.push(0.);

    PrCurve { precision, recall, thresholds }
}

/// `None` unless both positive and negative labels are present.
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> Option<RocCurve> {
    let (fps, tps, thresholds) = binary_clf_curve(labels, scores);
    let total_fp = fps.last().copied().unwrap_or(0.);
    let total_tp = tps.last().copied().unwrap_or(0.);
    if total_fp == 0. || total_tp == 0. {
        return None;
    }

    let mut fpr = vec![0.];
    let mut tpr = vec![0.];
    let mut ths = vec![f64::INFINITY];
    fpr.extend(fps.iter().map(|fp| fp / total_fp));
    tpr.extend(tps.iter().map(|tp| tp / total_tp));
    ths.extend(thresholds);
    Some(RocCurve { fpr, tpr, thresholds: ths })
}

/// Area under a curve by the trapezoidal rule. `x` must be monotonic.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.)
        .sum();
    match (x.first(), x.last()) {
        (Some(first), Some(last)) if last < first => -area,
        _ => area,
    }
}

/// Step-wise average precision, `-sum(diff(recall) * precision[..-1])`.
///
/// `None` when there are no positive labels, as precision is then undefined.
pub fn average_precision(labels: &[u8], scores: &[f64]) -> Option<f64> {
    if !labels.iter().any(|&l| l > 0) {
        return None;
    }
    let curve = precision_recall_curve(labels, scores);
    let ap = curve
        .recall
        .windows(2)
        .zip(&curve.precision)
        .map(|(r, p)| (r[1] - r[0]) * p)
        .sum::<f64>();
    Some(-ap)
}

pub fn maximise_f_score(curve: &PrCurve) -> BestThreshold {
    let mut best = BestThreshold::default();
    let mut best_f = 0.;
    for (i, &threshold) in curve.thresholds.iter().enumerate() {
        let (p, r) = (curve.precision[i], curve.recall[i]);
        if p + r <= 0. {
            continue;
        }
        let f = 2. * p * r / (p + r);
        if f > best_f {
            best_f = f;
            best = BestThreshold { threshold, f_score: f, precision: p, recall: r };
        }
    }
    BestThreshold {
        threshold: round3(best.threshold),
        f_score: round3(best.f_score),
        precision: round3(best.precision),
        recall: round3(best.recall),
    }
}

/// Fraction of samples where `score >= threshold` agrees with the label.
pub fn accuracy(labels: &[u8], scores: &[f64], threshold: f64) -> Option<f64> {
    let n = labels.len().min(scores.len());
    if n == 0 {
        return None;
    }
    let correct = labels
        .iter()
        .zip(scores)
        .filter(|(&l, &s)| (s >= threshold) == (l > 0))
        .count();
    Some(correct as f64 / n as f64)
}

/// Mean of the defined, non-NaN values.
pub fn mean_defined<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let defined: Vec<f64> = values.into_iter().flatten().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}
