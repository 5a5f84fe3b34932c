//! eventeval: scores the prediction files of a directory against a gold file.
//!
//! * `eventeval evaluate` writes one CSV row per prediction file.
//! * `eventeval empty-events` counts the documents without any event, exiting with status 1 if
//!   there is at least one.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use eventeval::{
    count_empty_event_documents, read_documents, EvalConfigBuilder, EvaluationPipeline, Schema,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "eventeval")]
#[command(about = "Entity, event and document level evaluation of extraction predictions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate every prediction file of a directory against the gold file
    Evaluate {
        /// Gold file (.json array or .jsonl)
        #[arg(short, long, env = "EVENTEVAL_GOLD")]
        gold: PathBuf,

        /// Directory holding the prediction files
        #[arg(short, long, env = "EVENTEVAL_PREDICTIONS")]
        predictions: PathBuf,

        /// CSV file receiving the results
        #[arg(short, long, env = "EVENTEVAL_OUTPUT")]
        output: PathBuf,

        /// Span-matching schema of the entity metrics (strict, exact, partial, type)
        #[arg(short, long, env = "EVENTEVAL_SCHEMA", default_value = "strict")]
        schema: Schema,

        /// Score discontinuous entities as a single span
        #[arg(long, env = "EVENTEVAL_NO_DISCONTINUOUS")]
        no_discontinuous: bool,

        /// Minimal recovered fraction of a gold event for relaxed completeness
        #[arg(long, env = "EVENTEVAL_COMPLETENESS_THRESHOLD", default_value_t = 0.5)]
        completeness_threshold: f64,

        /// Predicted occurrences tolerated outside the gold occurrences of an element
        #[arg(long, env = "EVENTEVAL_MAX_FALSE_OCCURRENCES", default_value_t = 0)]
        max_false_occurrences: usize,

        /// Reserved
        #[arg(long, env = "EVENTEVAL_STRICT_LOADING")]
        strict_loading: bool,

        /// Evaluate the prediction files on several threads
        #[arg(long, env = "EVENTEVAL_PARALLEL")]
        parallel: bool,
    },

    /// Count the documents without any event
    EmptyEvents {
        /// Files to inspect (.json array or .jsonl)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eventeval=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate {
            gold,
            predictions,
            output,
            schema,
            no_discontinuous,
            completeness_threshold,
            max_false_occurrences,
            strict_loading,
            parallel,
        } => {
            let config = EvalConfigBuilder::new()
                .schema(schema)
                .discontinuous_spans(!no_discontinuous)
                .completeness_threshold(completeness_threshold)
                .max_false_occurrences(max_false_occurrences)
                .strict_loading(strict_loading)
                .parallel(parallel)
                .build();
            match EvaluationPipeline::new(config).run(&gold, &predictions, &output) {
                Ok(summary) => {
                    if !summary.reporter.is_empty() {
                        print!("{}", summary.reporter);
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "Evaluation failed");
                    ExitCode::FAILURE
                }
            }
        }
        Command::EmptyEvents { files } => empty_events(&files),
    }
}

fn empty_events(files: &[PathBuf]) -> ExitCode {
    let mut total_empty = 0;
    let mut total_docs = 0;
    let mut failed = false;
    for path in files {
        let documents = match read_documents(path) {
            Ok(documents) => documents,
            Err(e) => {
                error!(error = %e, "Could not inspect file");
                failed = true;
                continue;
            }
        };
        let empty = count_empty_event_documents(&documents);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:40} : {:5} / {} documents without events",
            name,
            empty,
            documents.len()
        );
        total_empty += empty;
        total_docs += documents.len();
    }
    println!("Total: {} / {} documents without events", total_empty, total_docs);
    info!("{} files inspected", files.len());

    if failed || total_empty > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
