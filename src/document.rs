/*!
Raw documents, as they are found in the gold and prediction files. A file is either a JSON array
of documents or a JSON lines file (`.jsonl`) holding one document per line.
*/
use crate::error::{EvalError, Result};
use either::Either;
use serde::{Deserialize, Serialize};
use serde_jsonlines::json_lines;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where the documents come from: a file on disk or documents already in memory.
pub type DataSource = Either<PathBuf, Vec<RawDocument>>;

/// A document of the gold or prediction file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    /// Each event is an ordered list of elements.
    #[serde(default)]
    pub events: Vec<Vec<RawEventElement>>,
}

/// An annotated entity. Every field is optional at this stage: the canonicalizer is the one
/// deciding which missing fields are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Offsets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Offsets>,
}

/// Character offsets of an entity. A discontinuous entity has several of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Offsets {
    Single(usize),
    Many(Vec<usize>),
}

impl Offsets {
    pub fn as_slice(&self) -> &[usize] {
        match self {
            Self::Single(offset) => std::slice::from_ref(offset),
            Self::Many(offsets) => offsets,
        }
    }
}

impl From<Vec<usize>> for Offsets {
    fn from(value: Vec<usize>) -> Self {
        Self::Many(value)
    }
}

/// One element of an event, before canonicalization. `occurrences` holds the raw entity ids of
/// the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventElement {
    pub attribute: String,
    #[serde(default)]
    pub occurrences: Vec<String>,
}

/// Loads the documents of a source. In-memory documents are returned as is.
pub fn load_documents(source: DataSource) -> Result<Vec<RawDocument>> {
    match source {
        Either::Left(path) => read_documents(path),
        Either::Right(documents) => Ok(documents),
    }
}

/// Reads a `.json` (array of documents) or a `.jsonl` (one document per line) file.
pub fn read_documents<P: AsRef<Path>>(path: P) -> Result<Vec<RawDocument>> {
    let path = path.as_ref();
    if is_json_lines(path) {
        let lines = json_lines::<RawDocument, _>(path).map_err(|e| EvalError::io(path, e))?;
        lines
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|source| EvalError::JsonLines {
                path: path.to_path_buf(),
                source,
            })
    } else {
        let file = File::open(path).map_err(|e| EvalError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| EvalError::json(path, e))
    }
}

fn is_json_lines(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
}

/// Number of documents without any event (missing or empty `events`).
pub fn count_empty_event_documents(documents: &[RawDocument]) -> usize {
    documents.iter().filter(|d| d.events.is_empty()).count()
}
