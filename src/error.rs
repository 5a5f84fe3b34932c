/*!
Error types of the crate. Two kinds of failures coexist during an evaluation:

* `StructuralError`s make a file unusable (an entity without a label, offsets that cannot be
  paired, a prediction file that does not have as many documents as the gold file). They abort
  the evaluation of that file only.
* `ReferenceError`s are recorded while remapping event occurrences. They never abort anything:
  the unknown id is replaced by a sentinel that simply fails to match.
*/
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that stop the evaluation of a single file.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EvalError {
    /// The file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid JSON array of documents.
    #[error("could not parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A line of a `.jsonl` file is not a valid document.
    #[error("could not parse {path} (JSON lines): {source}")]
    JsonLines {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content of the file does not follow the expected document structure.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The span-matching schema is unknown.
    #[error(transparent)]
    Schema(#[from] SchemaParseError),

    /// The results could not be written.
    #[error("could not write the results: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while writing the results or listing the prediction directory.
    #[error("IO error: {0}")]
    Output(#[from] std::io::Error),
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// The document structure is broken. Fatal for the file containing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("entity #{entity} of document #{document} has no `{field}` field")]
    MissingField {
        document: usize,
        entity: usize,
        field: &'static str,
    },
    #[error("entity #{entity} of document #{document} has no offsets")]
    EmptyOffsets { document: usize, entity: usize },
    #[error(
        "entity #{entity} of document #{document} has {starts} start offsets but {ends} end offsets"
    )]
    UnpairedOffsets {
        document: usize,
        entity: usize,
        starts: usize,
        ends: usize,
    },
    #[error("the gold file has {gold} documents but the prediction file has {predicted}")]
    DocumentCountMismatch { gold: usize, predicted: usize },
}

/// An event occurrence refers to an entity id that does not exist in its document. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("document #{document}: unknown entity id `{raw_id}` in attribute `{attribute}`")]
pub struct ReferenceError {
    pub document: usize,
    pub attribute: String,
    pub raw_id: String,
}

/// Error returned when a string cannot be parsed into a `Schema`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Impossible to parse the string ({0}) into a span-matching schema. Expected one of: strict, exact, partial, type")]
pub struct SchemaParseError(pub String);
