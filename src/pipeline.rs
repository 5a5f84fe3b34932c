/*!
Evaluation orchestration. The gold file is canonicalized once into a `GoldStandard`; every
prediction file is then scored against it by `evaluate_file`, a pure function returning one
`ResultRow`. `EvaluationPipeline` runs `evaluate_file` over a whole directory, skips the files that
cannot be evaluated and writes the rows as CSV.
*/
use crate::canonical::{canonicalize_entities, remap_events, Event, FlatSpan};
use crate::config::EvalConfig;
use crate::document::{count_empty_event_documents, load_documents, DataSource, RawDocument};
use crate::documents::doc_level_metrics;
use crate::entities::{missing_tags, score_entities, EntityScores};
use crate::error::{EvalError, Result, StructuralError};
use crate::events::{compute_completeness, event_level_metrics, Completeness};
use crate::metrics::LevelMetrics;
use crate::reporter::{Reporter, ResultRow};
use crate::schema::{SemEvalMatcher, SpanMatcher};
use either::Either;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Canonical form of the gold file, shared read-only by the evaluation of every prediction file.
#[derive(Debug, Clone)]
pub struct GoldStandard {
    spans: Vec<Vec<FlatSpan>>,
    tags: BTreeSet<String>,
    events: Vec<Vec<Event>>,
}

impl GoldStandard {
    /// Loads and canonicalizes the gold documents.
    pub fn load(source: DataSource, config: &EvalConfig) -> Result<Self> {
        let documents = load_documents(source)?;
        Self::from_documents(&documents, config)
    }

    pub fn from_documents(documents: &[RawDocument], config: &EvalConfig) -> Result<Self> {
        let entities = canonicalize_entities(documents, config.discontinuous_spans())?;
        let remapped = remap_events(documents, &entities.ids);
        if !remapped.unresolved.is_empty() {
            debug!(
                "{} gold occurrences refer to unknown entity ids",
                remapped.unresolved.len()
            );
        }
        Ok(Self {
            spans: entities.spans,
            tags: entities.tags,
            events: remapped.events,
        })
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Entity labels of the gold file.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Canonical events of each gold document.
    pub fn events(&self) -> &[Vec<Event>] {
        &self.events
    }
}

/// Every metric computed for a prediction file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileScores {
    pub entities: EntityScores,
    pub events: LevelMetrics,
    pub documents: LevelMetrics,
    pub completeness: Completeness,
    pub missing_tags: Vec<String>,
    pub num_invalid_occurrences: usize,
    pub num_empty_event_docs: usize,
}

/// Scores the prediction documents against the gold standard.
///
/// * `gold`: Canonical gold file.
/// * `predicted`: Documents of the prediction file, in the same order as the gold documents.
/// * `config`: Evaluation parameters.
/// * `matcher`: Span-matching primitive used at the entity level.
pub fn score_documents<M>(
    gold: &GoldStandard,
    predicted: &[RawDocument],
    config: &EvalConfig,
    matcher: &M,
) -> Result<FileScores>
where
    M: SpanMatcher + ?Sized,
{
    if predicted.len() != gold.len() {
        return Err(StructuralError::DocumentCountMismatch {
            gold: gold.len(),
            predicted: predicted.len(),
        }
        .into());
    }
    let entities = canonicalize_entities(predicted, config.discontinuous_spans())?;
    let remapped = remap_events(predicted, &entities.ids);

    Ok(FileScores {
        entities: score_entities(
            matcher,
            &gold.spans,
            &entities.spans,
            &gold.tags,
            config.schema(),
        )?,
        events: event_level_metrics(
            &gold.events,
            &remapped.events,
            config.max_false_occurrences(),
        ),
        documents: doc_level_metrics(&gold.events, &remapped.events),
        completeness: compute_completeness(
            &gold.events,
            &remapped.events,
            config.completeness_threshold(),
        ),
        missing_tags: missing_tags(&gold.tags, &entities.tags),
        num_invalid_occurrences: remapped.unresolved.len(),
        num_empty_event_docs: count_empty_event_documents(predicted),
    })
}

/// Evaluates a single prediction file and returns its row.
///
/// * `gold`: Canonical gold file.
/// * `source`: Path of the prediction file or its documents.
/// * `pred_file`: Name reported in the `pred_file` column.
/// * `config`: Evaluation parameters.
/// * `matcher`: Span-matching primitive used at the entity level.
pub fn evaluate_file<M>(
    gold: &GoldStandard,
    source: DataSource,
    pred_file: &str,
    config: &EvalConfig,
    matcher: &M,
) -> Result<ResultRow>
where
    M: SpanMatcher + ?Sized,
{
    let predicted = load_documents(source)?;
    let scores = score_documents(gold, &predicted, config, matcher)?;
    Ok(ResultRow::new(pred_file, &scores))
}

/// A prediction file that could not be evaluated.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: EvalError,
}

/// Outcome of `EvaluationPipeline::run`.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One row per evaluated file, in file-name order.
    pub reporter: Reporter,
    pub skipped: Vec<SkippedFile>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.reporter.len()
    }
}

/// Evaluates every file of a prediction directory against a gold file.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPipeline<M = SemEvalMatcher> {
    config: EvalConfig,
    matcher: M,
}

impl EvaluationPipeline<SemEvalMatcher> {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            matcher: SemEvalMatcher,
        }
    }
}

impl<M> EvaluationPipeline<M>
where
    M: SpanMatcher + Sync,
{
    /// Pipeline using another span-matching primitive.
    pub fn with_matcher(config: EvalConfig, matcher: M) -> Self {
        Self { config, matcher }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluates every regular file of `predictions_dir` and writes the rows to `output`.
    ///
    /// * `gold_path`: The gold file. Failing to load it aborts the run.
    /// * `predictions_dir`: Directory holding the prediction files. A file that cannot be
    ///   evaluated is logged and skipped.
    /// * `output`: CSV file receiving the rows. Nothing is written if no file was evaluated.
    pub fn run<P, Q, R>(&self, gold_path: P, predictions_dir: Q, output: R) -> Result<RunSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        info!("Evaluation config:\n {}", self.config);
        let gold_source = Either::Left(gold_path.as_ref().to_path_buf());
        let gold = GoldStandard::load(gold_source, &self.config)?;
        info!(
            "Gold file {} loaded: {} documents, {} tags",
            gold_path.as_ref().display(),
            gold.len(),
            gold.tags().len()
        );

        let files = list_prediction_files(predictions_dir.as_ref())?;
        let evaluate = |path: &PathBuf| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let outcome = evaluate_file(
                &gold,
                Either::Left(path.clone()),
                &name,
                &self.config,
                &self.matcher,
            );
            (path.clone(), outcome)
        };
        let outcomes: Vec<(PathBuf, Result<ResultRow>)> = if self.config.parallel() {
            files.par_iter().map(evaluate).collect()
        } else {
            files.iter().map(evaluate).collect()
        };

        let mut summary = RunSummary::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(row) => {
                    info!("Evaluated {}", path.display());
                    summary.reporter.push(row);
                }
                Err(error) => {
                    warn!(file = %path.display(), error = %error, "Skipping prediction file");
                    summary.skipped.push(SkippedFile { path, error });
                }
            }
        }

        if summary.reporter.is_empty() {
            warn!("No files processed");
        } else {
            summary.reporter.write_csv(output.as_ref())?;
            info!(
                "Results of {} files saved to {} ({} skipped)",
                summary.processed(),
                output.as_ref().display(),
                summary.skipped.len()
            );
        }
        Ok(summary)
    }
}

/// Regular files of `dir`, sorted by name.
pub fn list_prediction_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| EvalError::io(dir, e))? {
        let path = entry.map_err(|e| EvalError::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
