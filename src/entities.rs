/*!
Entity-level scoring. The overall (micro) metrics come straight from the `SpanMatcher`; the macro
and weighted averages are computed over the per-tag metrics of the gold tags.
*/
use crate::canonical::FlatSpan;
use crate::error::StructuralError;
use crate::metrics::{Average, Prf};
use crate::schema::{Schema, SpanEvaluation, SpanMatcher};
use ndarray::prelude::*;
use ndarray_stats::SummaryStatisticsExt;
use std::collections::{BTreeMap, BTreeSet};

/// Entity metrics of a prediction file.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityScores {
    /// Schema the averages were computed with.
    pub schema: Schema,
    pub micro: Prf,
    pub macro_avg: Prf,
    pub weighted: Prf,
    /// Number of gold spans of each gold tag.
    pub support: BTreeMap<String, usize>,
    /// Raw matcher output, with the per-tag counts of every schema.
    pub evaluation: SpanEvaluation,
}

impl EntityScores {
    pub fn average(&self, average: Average) -> Prf {
        match average {
            Average::Micro => self.micro,
            Average::Macro => self.macro_avg,
            Average::Weighted => self.weighted,
        }
    }

    /// Metrics of a single tag under any schema.
    pub fn tag_metrics(&self, tag: &str, schema: Schema) -> Option<Prf> {
        self.evaluation.tag_metrics(tag, schema)
    }
}

/// Scores the predicted spans against the gold spans.
///
/// * `matcher`: Span-matching primitive.
/// * `gold`: Gold spans of each document.
/// * `predicted`: Predicted spans of each document.
/// * `gold_tags`: Tags of the gold file. Tags seen only in predictions are never scored.
/// * `schema`: Schema used for the overall and averaged metrics.
pub fn score_entities<M>(
    matcher: &M,
    gold: &[Vec<FlatSpan>],
    predicted: &[Vec<FlatSpan>],
    gold_tags: &BTreeSet<String>,
    schema: Schema,
) -> Result<EntityScores, StructuralError>
where
    M: SpanMatcher + ?Sized,
{
    let tags: Vec<String> = gold_tags.iter().cloned().collect();
    let evaluation = matcher.evaluate(gold, predicted, &tags)?;

    let mut support: BTreeMap<String, usize> = tags.iter().map(|t| (t.clone(), 0)).collect();
    for span in gold.iter().flatten() {
        if let Some(count) = support.get_mut(&span.label) {
            *count += 1;
        }
    }

    // One row per tag: precision, recall, f1.
    let per_tag = Array2::from_shape_fn((tags.len(), 3), |(i, j)| {
        let prf = evaluation.tag_metrics(&tags[i], schema).unwrap_or_default();
        [prf.precision, prf.recall, prf.f1][j]
    });
    let weights: Array1<f64> = tags.iter().map(|t| support[t] as f64).collect();
    let total_support: usize = support.values().sum();

    Ok(EntityScores {
        schema,
        micro: evaluation.overall_metrics(schema),
        macro_avg: macro_average(&per_tag, total_support),
        weighted: weighted_average(&per_tag, &weights, total_support),
        support,
        evaluation,
    })
}

fn prf_from_row(row: ArrayView1<f64>, support: usize) -> Prf {
    Prf {
        precision: row[0],
        recall: row[1],
        f1: row[2],
        support,
    }
}

fn macro_average(per_tag: &Array2<f64>, total_support: usize) -> Prf {
    match per_tag.mean_axis(Axis(0)) {
        Some(means) => prf_from_row(means.view(), total_support),
        None => Prf::default(),
    }
}

fn weighted_average(per_tag: &Array2<f64>, weights: &Array1<f64>, total_support: usize) -> Prf {
    if total_support == 0 {
        return Prf::default();
    }
    let column = |j: usize| per_tag.column(j).weighted_mean(&weights.view()).unwrap_or(0.0);
    Prf {
        precision: column(0),
        recall: column(1),
        f1: column(2),
        support: total_support,
    }
}

/// Gold tags that never appear in the prediction file.
pub fn missing_tags(
    gold_tags: &BTreeSet<String>,
    predicted_tags: &BTreeSet<String>,
) -> Vec<String> {
    gold_tags.difference(predicted_tags).cloned().collect()
}
