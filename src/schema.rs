/*!
Span matching of flat entities. A `SpanMatcher` receives the gold and predicted spans of every
document and returns, for each of the four schemas, the overall and per-tag counts.

# SCHEMAS
The schemas follow SemEval-2013 Task 9.1:
* `strict`: exact boundaries and same label.
* `exact`: exact boundaries, whatever the label.
* `partial`: overlapping boundaries, whatever the label. A partial overlap counts for half.
* `type`: overlapping boundaries and same label.

`SemEvalMatcher` is the matcher shipped with this crate. Other implementations can be plugged in
the pipeline through the `SpanMatcher` trait.
*/
use crate::canonical::FlatSpan;
use crate::error::{SchemaParseError, StructuralError};
use crate::metrics::{as_float, harmonic_mean, safe_divide, Prf};
use ahash::AHashSet;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Span-matching schema.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// Exact boundaries and same label.
    #[default]
    Strict,
    /// Exact boundaries only.
    Exact,
    /// Overlapping boundaries, partial matches count for half.
    Partial,
    /// Overlapping boundaries and same label.
    Type,
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::Type => "type",
        }
    }

    /// Partial and type schemas give half a point to partial matches.
    fn credits_partial_matches(&self) -> bool {
        matches!(self, Self::Partial | Self::Type)
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Schema {
    type Err = SchemaParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "exact" => Ok(Self::Exact),
            "partial" => Ok(Self::Partial),
            "type" | "ent_type" => Ok(Self::Type),
            _ => Err(SchemaParseError(String::from(s))),
        }
    }
}

/// SemEval counts of a single schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub partial: usize,
    pub missed: usize,
    pub spurious: usize,
}

impl SchemaCounts {
    /// Number of gold spans that could be found.
    pub fn possible(&self) -> usize {
        self.correct + self.incorrect + self.partial + self.missed
    }

    /// Number of predicted spans.
    pub fn actual(&self) -> usize {
        self.correct + self.incorrect + self.partial + self.spurious
    }

    /// Precision, recall and f-score of these counts under `schema`. The support is the number of
    /// possible spans.
    pub fn metrics(&self, schema: Schema) -> Prf {
        let mut hits: f64 = as_float(self.correct);
        if schema.credits_partial_matches() {
            hits += 0.5 * as_float::<f64>(self.partial);
        }
        let precision = safe_divide(hits, as_float(self.actual()));
        let recall = safe_divide(hits, as_float(self.possible()));
        Prf {
            precision,
            recall,
            f1: harmonic_mean(precision, recall),
            support: self.possible(),
        }
    }

    fn add(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Correct => self.correct += 1,
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Partial => self.partial += 1,
            Verdict::Missed => self.missed += 1,
            Verdict::Spurious => self.spurious += 1,
        }
    }
}

/// Counts of the four schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaResults {
    pub strict: SchemaCounts,
    pub exact: SchemaCounts,
    pub partial: SchemaCounts,
    #[serde(rename = "type")]
    pub type_match: SchemaCounts,
}

impl SchemaResults {
    pub fn get(&self, schema: Schema) -> &SchemaCounts {
        match schema {
            Schema::Strict => &self.strict,
            Schema::Exact => &self.exact,
            Schema::Partial => &self.partial,
            Schema::Type => &self.type_match,
        }
    }

    fn get_mut(&mut self, schema: Schema) -> &mut SchemaCounts {
        match schema {
            Schema::Strict => &mut self.strict,
            Schema::Exact => &mut self.exact,
            Schema::Partial => &mut self.partial,
            Schema::Type => &mut self.type_match,
        }
    }

    pub fn metrics(&self, schema: Schema) -> Prf {
        self.get(schema).metrics(schema)
    }

    fn record(&mut self, outcome: Outcome) {
        for schema in all::<Schema>() {
            self.get_mut(schema).add(outcome.verdict(schema));
        }
    }
}

/// Result of a `SpanMatcher`: overall counts and counts per tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpanEvaluation {
    pub overall: SchemaResults,
    pub by_tag: BTreeMap<String, SchemaResults>,
}

impl SpanEvaluation {
    fn with_tags(tags: &[String]) -> Self {
        Self {
            overall: SchemaResults::default(),
            by_tag: tags
                .iter()
                .map(|t| (t.clone(), SchemaResults::default()))
                .collect(),
        }
    }

    pub fn overall_metrics(&self, schema: Schema) -> Prf {
        self.overall.metrics(schema)
    }

    pub fn tag_metrics(&self, tag: &str, schema: Schema) -> Option<Prf> {
        self.by_tag.get(tag).map(|r| r.metrics(schema))
    }

    fn record(&mut self, tag: &str, outcome: Outcome) {
        self.overall.record(outcome);
        if let Some(tag_results) = self.by_tag.get_mut(tag) {
            tag_results.record(outcome);
        }
    }
}

/// Compares gold and predicted flat spans, document by document.
pub trait SpanMatcher {
    /// * `gold`: Gold spans of each document.
    /// * `predicted`: Predicted spans of each document. Must have as many documents as `gold`.
    /// * `tags`: Labels to evaluate. Spans with any other label are ignored.
    fn evaluate(
        &self,
        gold: &[Vec<FlatSpan>],
        predicted: &[Vec<FlatSpan>],
        tags: &[String],
    ) -> Result<SpanEvaluation, StructuralError>;
}

/// How a predicted span relates to the gold spans of its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Same boundaries, same label.
    Identical,
    /// Same boundaries, different label.
    WrongLabel,
    /// Overlapping boundaries, same label.
    OverlapSameLabel,
    /// Overlapping boundaries, different label.
    OverlapWrongLabel,
    /// No gold span matches the prediction.
    Spurious,
    /// No prediction matches the gold span.
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Correct,
    Incorrect,
    Partial,
    Missed,
    Spurious,
}

impl Outcome {
    fn verdict(self, schema: Schema) -> Verdict {
        use Verdict::*;
        match (self, schema) {
            (Self::Identical, _) => Correct,
            (Self::Spurious, _) => Spurious,
            (Self::Missed, _) => Missed,
            (Self::WrongLabel, Schema::Exact | Schema::Partial) => Correct,
            (Self::WrongLabel, Schema::Strict | Schema::Type) => Incorrect,
            (Self::OverlapSameLabel, Schema::Type) => Correct,
            (Self::OverlapSameLabel | Self::OverlapWrongLabel, Schema::Partial) => Partial,
            (Self::OverlapSameLabel | Self::OverlapWrongLabel, _) => Incorrect,
        }
    }
}

/// Offsets are compared inclusively: two spans sharing a boundary offset overlap.
fn overlaps(a: &FlatSpan, b: &FlatSpan) -> bool {
    a.start <= b.end && b.start <= a.end
}

/// SemEval-2013 Task 9.1 span matcher. Counts are summed over all documents before the ratios
/// are computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemEvalMatcher;

impl SemEvalMatcher {
    fn count_document(
        evaluation: &mut SpanEvaluation,
        gold: &[FlatSpan],
        predicted: &[FlatSpan],
        tags: &AHashSet<&str>,
    ) {
        let gold: Vec<&FlatSpan> = gold
            .iter()
            .filter(|s| tags.contains(s.label.as_str()))
            .collect();
        // Touched gold spans are compared by value: every copy of a touched span counts as found.
        let mut touched: AHashSet<&FlatSpan> = AHashSet::new();

        for pred in predicted.iter().filter(|s| tags.contains(s.label.as_str())) {
            if let Some(g) = gold.iter().find(|g| **g == pred) {
                touched.insert(*g);
                evaluation.record(&pred.label, Outcome::Identical);
                continue;
            }
            // First gold span with the same boundaries or an overlap.
            let found = gold.iter().enumerate().find_map(|(i, g)| {
                if g.start == pred.start && g.end == pred.end {
                    Some((i, Outcome::WrongLabel))
                } else if overlaps(g, pred) {
                    if g.label == pred.label {
                        Some((i, Outcome::OverlapSameLabel))
                    } else {
                        Some((i, Outcome::OverlapWrongLabel))
                    }
                } else {
                    None
                }
            });
            match found {
                Some((i, outcome)) => {
                    touched.insert(gold[i]);
                    evaluation.record(&gold[i].label, outcome);
                }
                None => evaluation.record(&pred.label, Outcome::Spurious),
            }
        }

        for g in gold.iter() {
            if !touched.contains(*g) {
                evaluation.record(&g.label, Outcome::Missed);
            }
        }
    }
}

impl SpanMatcher for SemEvalMatcher {
    fn evaluate(
        &self,
        gold: &[Vec<FlatSpan>],
        predicted: &[Vec<FlatSpan>],
        tags: &[String],
    ) -> Result<SpanEvaluation, StructuralError> {
        if gold.len() != predicted.len() {
            return Err(StructuralError::DocumentCountMismatch {
                gold: gold.len(),
                predicted: predicted.len(),
            });
        }
        let tag_set: AHashSet<&str> = tags.iter().map(String::as_str).collect();
        let mut evaluation = SpanEvaluation::with_tags(tags);
        for (gold_doc, pred_doc) in gold.iter().zip(predicted) {
            Self::count_document(&mut evaluation, gold_doc, pred_doc, &tag_set);
        }
        Ok(evaluation)
    }
}
