/*!
This library scores structured predictions of an information-extraction model (named entities and
the events built on top of them) against a hand-annotated gold file. Precision, recall and f-score
are computed at three levels:
* Entities: each entity is a labelled span of the text. The spans are compared with one of the
    four span-matching schemas (`strict`, `exact`, `partial`, `type`) and the metrics are averaged
    over the labels (micro, macro and weighted averages).
* Events: an event is an ordered list of elements, each element giving an attribute (a role such
    as `evt:agent`) and the entities occupying it. Each gold event is paired with its best
    predicted event, greedily, and the elements of the pair are compared.
* Documents: the distinct entity sets of the `evt:central_element` attribute of each document are
    compared by inclusion.

Gold and prediction files are produced independently and do not share their entity ids. Before
any comparison, every entity is given a canonical id derived from its offsets and its text. Event
occurrences are rewritten with these canonical ids, so that the events of different files can be
compared.

# Terminology
* A tag is the label of an entity, such as 'PER', 'LOC', 'ORG'.
* An occurrence is a reference from an event element to an entity.
* A schema is a set of rules deciding when a predicted span matches a gold span.
* Completeness is the fraction of the elements of a gold event recovered by its best predicted
    event.
*/

mod canonical;
mod config;
mod document;
mod documents;
mod entities;
mod error;
mod events;
mod metrics;
mod pipeline;
mod reporter;
mod schema;

// The public api starts here
pub use canonical::{
    canonical_id, canonicalize_entities, remap_events, CanonicalEntities, CanonicalIds, Event,
    EventElement, FlatSpan, RemappedEvents, INVALID_ID,
};

pub use config::{EvalConfig, EvalConfigBuilder};

pub use document::{
    count_empty_event_documents, load_documents, read_documents, DataSource, Offsets,
    RawDocument, RawEntity, RawEventElement,
};

pub use documents::{central_element_sets, doc_level_metrics, document_counts, CENTRAL_ELEMENT};

pub use entities::{missing_tags, score_entities, EntityScores};

pub use error::{EvalError, ReferenceError, Result, SchemaParseError, StructuralError};

pub use events::{
    compute_completeness, elements_match, event_counts, event_level_metrics, find_best_match,
    BestMatch, Completeness,
};

pub use metrics::{to_percent, Average, Counts, LevelMetrics, MacroAverage, Prf};

pub use pipeline::{
    evaluate_file, list_prediction_files, score_documents, EvaluationPipeline, FileScores,
    GoldStandard, RunSummary, SkippedFile,
};

pub use reporter::{Reporter, ResultRow};

pub use schema::{
    Schema, SchemaCounts, SchemaResults, SemEvalMatcher, SpanEvaluation, SpanMatcher,
};
