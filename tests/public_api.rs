use eventeval::{
    read_documents, EvalConfigBuilder, EvalError, EvaluationPipeline, ResultRow, Schema,
    StructuralError,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const GOLD: &str = "tests/data/gold.json";
const RENUMBERED: &str = "tests/data/renumbered.json";

pub trait CloseEnough {
    fn is_close(&self, other: f64) -> bool;
}

impl CloseEnough for f64 {
    fn is_close(&self, other: f64) -> bool {
        f64::abs(self - other) < 1e-6
    }
}

fn read_rows(path: &Path) -> Vec<ResultRow> {
    csv::Reader::from_path(path)
        .unwrap()
        .deserialize()
        .collect::<Result<Vec<ResultRow>, _>>()
        .unwrap()
}

/// Temporary prediction directory and the path of the CSV output, next to it.
fn workspace() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let predictions = root.path().join("predictions");
    fs::create_dir(&predictions).unwrap();
    let output = root.path().join("results.csv");
    (root, predictions, output)
}

#[test]
fn perfect_predictions() {
    let (_root, predictions, output) = workspace();
    fs::copy(GOLD, predictions.join("copy.json")).unwrap();

    let pipeline = EvaluationPipeline::new(EvalConfigBuilder::default().build());
    let summary = pipeline.run(GOLD, &predictions, &output).unwrap();
    assert_eq!(summary.processed(), 1);
    assert!(summary.skipped.is_empty());

    let rows = read_rows(&output);
    assert_eq!(rows, summary.reporter.rows());
    let row = &rows[0];
    assert_eq!(row.pred_file, "copy.json");
    assert_eq!(row.eval_schema, Schema::Strict);
    assert_eq!(row.num_missing_tags, 0);
    assert_eq!(row.entity_micro_f1, 100.0);
    assert_eq!(row.entity_macro_f1, 100.0);
    assert_eq!(row.entity_weighted_f1, 100.0);
    assert_eq!(row.event_micro_f1, 100.0);
    assert_eq!(row.event_macro_f1, 100.0);
    assert_eq!(row.event_macro_support, 3);
    assert_eq!(row.doc_micro_f1, 100.0);
    assert_eq!(row.doc_macro_support, 2);
    assert_eq!(row.event_strict_completeness, 100.0);
    assert_eq!(row.num_invalid_occurrences, 0);
    assert_eq!(row.num_empty_event_docs, 1);
}

#[test]
fn renumbered_predictions() {
    let (_root, predictions, output) = workspace();
    fs::copy(RENUMBERED, predictions.join("renumbered.json")).unwrap();

    let summary = EvaluationPipeline::new(Default::default())
        .run(GOLD, &predictions, &output)
        .unwrap();
    let row = &summary.reporter.rows()[0];

    // Paris is missing: 6 of the 7 gold spans are found.
    assert_eq!(row.entity_micro_precision, 100.0);
    assert_eq!(row.entity_micro_recall, 85.71);
    assert_eq!(row.num_missing_tags, 0);

    // The place of the first event refers to an unknown id.
    assert_eq!(row.num_invalid_occurrences, 1);
    assert!(row.event_micro_precision.is_close(80.0));
    assert!(row.event_micro_recall.is_close(80.0));
    assert_eq!(row.event_micro_support, 5);
    assert_eq!(row.event_macro_f1, 83.33);
    assert_eq!(row.event_macro_support, 3);

    // Central elements are untouched.
    assert_eq!(row.doc_micro_f1, 100.0);
    assert_eq!(row.event_strict_completeness, 66.67);
    assert_eq!(row.event_relaxed_completeness, 100.0);
}

#[test]
fn empty_predictions_only_yield_false_negatives() {
    let (_root, predictions, output) = workspace();
    let mut documents = read_documents(GOLD).unwrap();
    documents[0].events.clear();
    // Written as JSON lines.
    let mut file = fs::File::create(predictions.join("no_events.jsonl")).unwrap();
    for document in documents.iter() {
        writeln!(file, "{}", serde_json::to_string(document).unwrap()).unwrap();
    }
    drop(file);

    let summary = EvaluationPipeline::new(Default::default())
        .run(GOLD, &predictions, &output)
        .unwrap();
    let row = &summary.reporter.rows()[0];
    assert_eq!(row.entity_micro_f1, 100.0);
    // First document: 3 gold elements missed. Second document: 2 elements found.
    assert_eq!(row.event_micro_precision, 100.0);
    assert_eq!(row.event_micro_recall, 40.0);
    // First document: 2 central sets missed and 2 missing sets.
    assert_eq!(row.doc_micro_precision, 100.0);
    assert_eq!(row.doc_micro_recall, 20.0);
    assert_eq!(row.num_empty_event_docs, 2);
}

#[test]
fn invalid_files_are_skipped() {
    let (_root, predictions, output) = workspace();
    fs::copy(GOLD, predictions.join("copy.json")).unwrap();
    fs::write(predictions.join("broken.json"), "{not json").unwrap();
    let documents = read_documents(GOLD).unwrap();
    fs::write(
        predictions.join("short.json"),
        serde_json::to_string(&documents[..2]).unwrap(),
    )
    .unwrap();

    let summary = EvaluationPipeline::new(Default::default())
        .run(GOLD, &predictions, &output)
        .unwrap();
    assert_eq!(summary.processed(), 1);
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.skipped[0].path.ends_with("broken.json"));
    assert!(matches!(summary.skipped[0].error, EvalError::Json { .. }));
    assert!(summary.skipped[1].path.ends_with("short.json"));
    assert!(matches!(
        summary.skipped[1].error,
        EvalError::Structural(StructuralError::DocumentCountMismatch {
            gold: 3,
            predicted: 2
        })
    ));
    assert_eq!(read_rows(&output).len(), 1);
}

#[test]
fn no_file_processed_writes_nothing() {
    let (_root, predictions, output) = workspace();
    // As many documents as the gold file, but an entity without text.
    let content = r#"[{"entities": [{"id": "T1", "label": "PER"}]}, {}, {}]"#;
    fs::write(predictions.join("broken.json"), content).unwrap();

    let summary = EvaluationPipeline::new(Default::default())
        .run(GOLD, &predictions, &output)
        .unwrap();
    assert_eq!(summary.processed(), 0);
    assert!(matches!(
        summary.skipped[0].error,
        EvalError::Structural(StructuralError::MissingField { field: "text", .. })
    ));
    assert!(!output.exists());
}

#[test]
fn missing_gold_file_aborts_the_run() {
    let (_root, predictions, output) = workspace();
    let result = EvaluationPipeline::new(Default::default()).run(
        "tests/data/missing.json",
        &predictions,
        &output,
    );
    assert!(matches!(result, Err(EvalError::Io { .. })));
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let (_root, predictions, output) = workspace();
    for name in ["c.json", "a.json", "b.json"] {
        fs::copy(GOLD, predictions.join(name)).unwrap();
    }
    fs::copy(RENUMBERED, predictions.join("d.json")).unwrap();

    let run = |parallel: bool| {
        let config = EvalConfigBuilder::default()
            .parallel(parallel)
            .schema(Schema::Partial)
            .build();
        EvaluationPipeline::new(config)
            .run(GOLD, &predictions, &output)
            .unwrap()
            .reporter
    };
    let sequential = run(false);
    let parallel = run(true);
    assert_eq!(sequential, parallel);
    let names: Vec<&str> = sequential.rows().iter().map(|r| r.pred_file.as_str()).collect();
    assert_eq!(names, vec!["a.json", "b.json", "c.json", "d.json"]);
}
