/*!
Shared metric primitives: true/false positive counts, precision, recall and f-score, and the
micro and macro averages built from them. Every division by zero results in `0`.
*/
use ndarray::Array1;
use num::Float;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Divides `numerator` by `denominator` and returns `0` if the denominator is `0`.
pub(crate) fn safe_divide<F: Float>(numerator: F, denominator: F) -> F {
    if denominator.is_zero() {
        F::zero()
    } else {
        numerator / denominator
    }
}

/// Converts a count into a float.
pub(crate) fn as_float<F: Float>(count: usize) -> F {
    F::from(count).unwrap_or_else(F::zero)
}

/// Converts a ratio in `[0, 1]` to a percentage rounded to two decimals.
pub fn to_percent(ratio: f64) -> f64 {
    (ratio * 100.0 * 100.0).round() / 100.0
}

/// True positives, false positives and false negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Counts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl Counts {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }

    /// F1 computed directly from the counts: `2tp / (2tp + fp + fn)`.
    pub fn f1(&self) -> f64 {
        let tp: f64 = as_float(self.true_positives);
        safe_divide(
            2.0 * tp,
            2.0 * tp + as_float::<f64>(self.false_positives + self.false_negatives),
        )
    }

    /// Precision, recall and f-score of these counts. The support is `tp + fn`.
    pub fn prf(&self) -> Prf {
        let tp: f64 = as_float(self.true_positives);
        let precision = safe_divide(tp, as_float(self.true_positives + self.false_positives));
        let recall = safe_divide(tp, as_float(self.true_positives + self.false_negatives));
        Prf {
            precision,
            recall,
            f1: harmonic_mean(precision, recall),
            support: self.true_positives + self.false_negatives,
        }
    }
}

impl Add for Counts {
    type Output = Counts;
    fn add(self, rhs: Self) -> Self::Output {
        Counts {
            true_positives: self.true_positives + rhs.true_positives,
            false_positives: self.false_positives + rhs.false_positives,
            false_negatives: self.false_negatives + rhs.false_negatives,
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

pub(crate) fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    safe_divide(2.0 * precision * recall, precision + recall)
}

/// Precision, recall, f-score and support.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Prf {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Collects the metrics of individual units (events, documents) and averages them without
/// weighting.
#[derive(Debug, Clone, Default)]
pub struct MacroAverage {
    precision: Vec<f64>,
    recall: Vec<f64>,
    f1: Vec<f64>,
}

impl MacroAverage {
    pub fn push(&mut self, metrics: &Prf) {
        self.precision.push(metrics.precision);
        self.recall.push(metrics.recall);
        self.f1.push(metrics.f1);
    }

    pub fn len(&self) -> usize {
        self.f1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f1.is_empty()
    }

    /// Unweighted mean of every pushed metric. The support is the number of units.
    pub fn average(&self) -> Prf {
        let mean = |values: &[f64]| Array1::from(values.to_vec()).mean().unwrap_or(0.0);
        Prf {
            precision: mean(&self.precision),
            recall: mean(&self.recall),
            f1: mean(&self.f1),
            support: self.len(),
        }
    }
}

/// Macro and micro metrics of one evaluation level (events or documents).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LevelMetrics {
    #[serde(rename = "macro")]
    pub macro_avg: Prf,
    pub micro: Prf,
    /// Corpus-wide sums the micro metrics were computed from.
    #[serde(skip)]
    pub counts: Counts,
}

impl LevelMetrics {
    pub(crate) fn new(macro_average: &MacroAverage, counts: Counts) -> Self {
        Self {
            macro_avg: macro_average.average(),
            micro: counts.prf(),
            counts,
        }
    }
}

/// Averages reported for the entity level.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub enum Average {
    Micro,
    Macro,
    Weighted,
}
