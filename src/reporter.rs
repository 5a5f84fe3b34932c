/**
This modules gives a few tools to write the results of every prediction file as CSV and to
prettyprint a summary of them.
*/
use crate::error::Result;
use crate::metrics::{to_percent, Average, Prf};
use crate::pipeline::FileScores;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Results of a single prediction file. The field order is the column order of the CSV output.
/// Ratios are percentages rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub pred_file: String,
    pub eval_schema: Schema,
    /// Gold tags absent from the prediction file, comma-joined.
    pub missing_tags: String,
    pub num_missing_tags: usize,

    pub entity_micro_precision: f64,
    pub entity_micro_recall: f64,
    pub entity_micro_f1: f64,
    pub entity_macro_precision: f64,
    pub entity_macro_recall: f64,
    pub entity_macro_f1: f64,
    pub entity_weighted_precision: f64,
    pub entity_weighted_recall: f64,
    pub entity_weighted_f1: f64,

    pub event_macro_precision: f64,
    pub event_macro_recall: f64,
    pub event_macro_f1: f64,
    pub event_macro_support: usize,
    pub event_micro_precision: f64,
    pub event_micro_recall: f64,
    pub event_micro_f1: f64,
    pub event_micro_support: usize,

    pub doc_macro_precision: f64,
    pub doc_macro_recall: f64,
    pub doc_macro_f1: f64,
    pub doc_macro_support: usize,
    pub doc_micro_precision: f64,
    pub doc_micro_recall: f64,
    pub doc_micro_f1: f64,
    pub doc_micro_support: usize,

    pub event_strict_completeness: f64,
    pub event_relaxed_completeness: f64,
    /// Event occurrences referring to an unknown entity id.
    pub num_invalid_occurrences: usize,
    /// Prediction documents without any event.
    pub num_empty_event_docs: usize,
}

/// Percentages of a `Prf`.
fn percents(prf: &Prf) -> (f64, f64, f64) {
    (
        to_percent(prf.precision),
        to_percent(prf.recall),
        to_percent(prf.f1),
    )
}

impl ResultRow {
    pub fn new<S: Into<String>>(pred_file: S, scores: &FileScores) -> Self {
        let entities = &scores.entities;
        let (entity_micro_precision, entity_micro_recall, entity_micro_f1) =
            percents(&entities.average(Average::Micro));
        let (entity_macro_precision, entity_macro_recall, entity_macro_f1) =
            percents(&entities.average(Average::Macro));
        let (entity_weighted_precision, entity_weighted_recall, entity_weighted_f1) =
            percents(&entities.average(Average::Weighted));
        let (event_macro_precision, event_macro_recall, event_macro_f1) =
            percents(&scores.events.macro_avg);
        let (event_micro_precision, event_micro_recall, event_micro_f1) =
            percents(&scores.events.micro);
        let (doc_macro_precision, doc_macro_recall, doc_macro_f1) =
            percents(&scores.documents.macro_avg);
        let (doc_micro_precision, doc_micro_recall, doc_micro_f1) =
            percents(&scores.documents.micro);

        Self {
            pred_file: pred_file.into(),
            eval_schema: entities.schema,
            missing_tags: scores.missing_tags.join(","),
            num_missing_tags: scores.missing_tags.len(),
            entity_micro_precision,
            entity_micro_recall,
            entity_micro_f1,
            entity_macro_precision,
            entity_macro_recall,
            entity_macro_f1,
            entity_weighted_precision,
            entity_weighted_recall,
            entity_weighted_f1,
            event_macro_precision,
            event_macro_recall,
            event_macro_f1,
            event_macro_support: scores.events.macro_avg.support,
            event_micro_precision,
            event_micro_recall,
            event_micro_f1,
            event_micro_support: scores.events.micro.support,
            doc_macro_precision,
            doc_macro_recall,
            doc_macro_f1,
            doc_macro_support: scores.documents.macro_avg.support,
            doc_micro_precision,
            doc_micro_recall,
            doc_micro_f1,
            doc_micro_support: scores.documents.micro.support,
            event_strict_completeness: to_percent(scores.completeness.strict),
            event_relaxed_completeness: to_percent(scores.completeness.relaxed),
            num_invalid_occurrences: scores.num_invalid_occurrences,
            num_empty_event_docs: scores.num_empty_event_docs,
        }
    }
}

/// The Resultrow struct acts as a line in a dataframe when displayed.
impl Display for ResultRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.pred_file,
            self.eval_schema,
            self.entity_micro_f1,
            self.event_micro_f1,
            self.doc_micro_f1,
            self.num_missing_tags
        )
    }
}

/// The reporter holds one row per evaluated prediction file, in evaluation order. It can be
/// written as CSV or displayed as if it was a dataframe.
///
/// # Example
///
/// ```rust
/// use eventeval::{
///     evaluate_file, DataSource, EvalConfig, GoldStandard, RawDocument, Reporter, SemEvalMatcher,
/// };
///
/// let documents: Vec<RawDocument> = serde_json::from_str(r#"[{"text": "Jean.",
///     "entities": [{"id": "T1", "text": "Jean", "label": "PER", "start": [0], "end": [4]}],
///     "events": [[{"attribute": "evt:central_element", "occurrences": ["T1"]}]]}]"#).unwrap();
/// let config = EvalConfig::default();
/// let gold = GoldStandard::from_documents(&documents, &config).unwrap();
/// let source = DataSource::Right(documents.clone());
/// let row = evaluate_file(&gold, source, "copy.json", &config, &SemEvalMatcher).unwrap();
///
/// let reporter: Reporter = vec![row].into_iter().collect();
/// let expected_report = "File, Schema, Entity F1, Event F1, Document F1, Missing tags
/// copy.json, strict, 100, 100, 100, 0\n";
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reporter {
    rows: Vec<ResultRow>,
}

impl Reporter {
    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row)
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the rows as CSV, headers included, into `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in self.rows.iter() {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the rows as CSV into the file at `path`, replacing it if it exists.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }
}

impl FromIterator<ResultRow> for Reporter {
    fn from_iter<T: IntoIterator<Item = ResultRow>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl From<Reporter> for Vec<ResultRow> {
    fn from(value: Reporter) -> Self {
        value.rows
    }
}

/// The Reporter struct acts as a dataframe when displayed. Only the micro f-scores are shown.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "File, Schema, Entity F1, Event F1, Document F1, Missing tags"
        )?;
        for row in self.rows.iter() {
            writeln!(f, "{}", row)?
        }
        Ok(())
    }
}
