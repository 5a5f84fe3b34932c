/*!
Canonicalization of raw documents. Gold and prediction files use unrelated entity-id spaces, so
every entity is given a content-addressed id derived from its offsets and surface text. Two
entities with the same offsets and text get the same canonical id, whatever file they come from,
which makes the occurrence sets of events comparable across files.
*/
use crate::document::RawDocument;
use crate::error::{ReferenceError, StructuralError};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::debug;

/// Canonical id given to an occurrence whose raw id is unknown in its document.
pub const INVALID_ID: &str = "EVAL_INVALID_ID";

/// A single contiguous span, used for entity-level scoring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlatSpan {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl FlatSpan {
    pub fn new<S: Into<String>>(label: S, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }
}

/// Computes the canonical id of an entity: the first 8 hexadecimal characters of the SHA-256
/// digest of `"{start}-{end}-{text}"`, the offsets being written as lists (`[0, 12]`).
pub fn canonical_id(start: &[usize], end: &[usize], text: &str) -> String {
    let key = format!("{}-{}-{}", format_offsets(start), format_offsets(end), text);
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..4])
}

fn format_offsets(offsets: &[usize]) -> String {
    format!("[{}]", offsets.iter().join(", "))
}

/// Table from the raw entity ids of a file to their canonical ids. Raw ids are looked up in the
/// document they belong to.
#[derive(Debug, Clone, Default)]
pub struct CanonicalIds {
    documents: Vec<AHashMap<String, String>>,
}

impl CanonicalIds {
    /// Canonical id of the raw id `raw_id` of the document at index `document`.
    pub fn get(&self, document: usize, raw_id: &str) -> Option<&str> {
        self.documents
            .get(document)
            .and_then(|table| table.get(raw_id))
            .map(String::as_str)
    }

    /// Total number of remap entries.
    pub fn len(&self) -> usize {
        self.documents.iter().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of the entity canonicalization of a file.
#[derive(Debug, Clone, Default)]
pub struct CanonicalEntities {
    /// Flat spans of each document, in file order.
    pub spans: Vec<Vec<FlatSpan>>,
    /// Distinct labels seen in the file.
    pub tags: BTreeSet<String>,
    pub ids: CanonicalIds,
}

/// Canonicalizes the entities of every document.
///
/// * `documents`: Raw documents of a single file.
/// * `discontinuous_spans`: If `true`, a discontinuous entity gives one span per `(start, end)`
///   pair. If `false`, it gives a single span from its first start to its last end.
///
/// An entity missing its `text`, `label`, `start` or `end` makes the whole file unusable.
pub fn canonicalize_entities(
    documents: &[RawDocument],
    discontinuous_spans: bool,
) -> Result<CanonicalEntities, StructuralError> {
    let mut spans = Vec::with_capacity(documents.len());
    let mut tags = BTreeSet::new();
    let mut id_tables = Vec::with_capacity(documents.len());

    for (doc_index, document) in documents.iter().enumerate() {
        let mut doc_spans = Vec::with_capacity(document.entities.len());
        let mut id_table = AHashMap::with_capacity(document.entities.len());
        for (entity_index, entity) in document.entities.iter().enumerate() {
            let missing = |field| StructuralError::MissingField {
                document: doc_index,
                entity: entity_index,
                field,
            };
            let text = entity.text.as_deref().ok_or_else(|| missing("text"))?;
            let label = entity.label.as_deref().ok_or_else(|| missing("label"))?;
            let starts = entity.start.as_ref().ok_or_else(|| missing("start"))?.as_slice();
            let ends = entity.end.as_ref().ok_or_else(|| missing("end"))?.as_slice();
            let (Some(first_start), Some(last_end)) = (starts.first(), ends.last()) else {
                return Err(StructuralError::EmptyOffsets {
                    document: doc_index,
                    entity: entity_index,
                });
            };

            // One id per entity, whatever the number of spans it is split into.
            if let Some(raw_id) = &entity.id {
                id_table.insert(raw_id.clone(), canonical_id(starts, ends, text));
            }
            tags.insert(label.to_string());

            if discontinuous_spans && starts.len() > 1 {
                if starts.len() != ends.len() {
                    return Err(StructuralError::UnpairedOffsets {
                        document: doc_index,
                        entity: entity_index,
                        starts: starts.len(),
                        ends: ends.len(),
                    });
                }
                doc_spans.extend(
                    starts
                        .iter()
                        .zip(ends)
                        .map(|(s, e)| FlatSpan::new(label, *s, *e)),
                );
            } else {
                doc_spans.push(FlatSpan::new(label, *first_start, *last_end));
            }
        }
        spans.push(doc_spans);
        id_tables.push(id_table);
    }

    Ok(CanonicalEntities {
        spans,
        tags,
        ids: CanonicalIds {
            documents: id_tables,
        },
    })
}

/// An element of a canonical event: an attribute and the canonical ids of its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventElement {
    pub attribute: String,
    pub occurrences: BTreeSet<String>,
}

impl EventElement {
    pub fn new<A, I, S>(attribute: A, occurrences: I) -> Self
    where
        A: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute: attribute.into(),
            occurrences: occurrences.into_iter().map(Into::into).collect(),
        }
    }
}

/// An event is an ordered list of elements.
pub type Event = Vec<EventElement>;

/// Events of a file after remapping, with the references that could not be resolved.
#[derive(Debug, Clone, Default)]
pub struct RemappedEvents {
    /// Events of each document, in file order.
    pub events: Vec<Vec<Event>>,
    pub unresolved: Vec<ReferenceError>,
}

/// Rewrites the raw occurrence ids of every event into canonical ids. Unknown ids become
/// `INVALID_ID` and are reported in `unresolved`.
pub fn remap_events(documents: &[RawDocument], ids: &CanonicalIds) -> RemappedEvents {
    let mut unresolved = vec![];
    let events = documents
        .iter()
        .enumerate()
        .map(|(doc_index, document)| {
            document
                .events
                .iter()
                .map(|raw_event| {
                    raw_event
                        .iter()
                        .map(|raw_element| {
                            let occurrences = raw_element
                                .occurrences
                                .iter()
                                .map(|raw_id| match ids.get(doc_index, raw_id) {
                                    Some(id) => id.to_string(),
                                    None => {
                                        let err = ReferenceError {
                                            document: doc_index,
                                            attribute: raw_element.attribute.clone(),
                                            raw_id: raw_id.clone(),
                                        };
                                        debug!("{err}");
                                        unresolved.push(err);
                                        INVALID_ID.to_string()
                                    }
                                })
                                .collect();
                            EventElement {
                                attribute: raw_element.attribute.clone(),
                                occurrences,
                            }
                        })
                        .collect()
                })
                .collect()
        })
        .collect();
    RemappedEvents { events, unresolved }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{Offsets, RawEntity, RawEventElement};
    use quickcheck::{self, TestResult};
    use rstest::rstest;

    fn entity(id: &str, text: &str, label: &str, start: Vec<usize>, end: Vec<usize>) -> RawEntity {
        RawEntity {
            id: Some(id.to_string()),
            text: Some(text.to_string()),
            label: Some(label.to_string()),
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    fn build_documents() -> Vec<RawDocument> {
        vec![RawDocument {
            doc_id: None,
            text: String::from("Jean Dupont est venu avec Marie."),
            entities: vec![
                entity("T1", "Jean Dupont", "PER", vec![0, 10], vec![4, 15]),
                entity("T2", "Marie", "PER", vec![26], vec![31]),
                entity("T3", "venu", "ACT", vec![20], vec![24]),
            ],
            events: vec![vec![
                RawEventElement {
                    attribute: String::from("evt:central_element"),
                    occurrences: vec![String::from("T3")],
                },
                RawEventElement {
                    attribute: String::from("evt:agent"),
                    occurrences: vec![String::from("T1"), String::from("T9")],
                },
            ]],
        }]
    }

    #[test]
    fn test_canonical_id_known_values() {
        assert_eq!(canonical_id(&[0], &[4], "Jean"), "00721d95");
        assert_eq!(canonical_id(&[0, 10], &[4, 15], "Jean Dupont"), "b9a6494c");
    }

    #[test]
    fn test_propertie_canonical_id_is_deterministic() {
        fn same_content_same_id(start: Vec<usize>, end: Vec<usize>, text: String) -> bool {
            let first = canonical_id(&start, &end, &text);
            let second = canonical_id(&start.clone(), &end.clone(), &text.clone());
            first == second && first.len() == 8
        }
        quickcheck::QuickCheck::new()
            .tests(500)
            .quickcheck(same_content_same_id as fn(Vec<usize>, Vec<usize>, String) -> bool);
    }

    #[test]
    fn test_propertie_canonical_id_differs_with_text() {
        fn different_text_different_id(
            start: usize,
            end: usize,
            a: String,
            b: String,
        ) -> TestResult {
            if a == b {
                return TestResult::discard();
            }
            let (id_a, id_b) = (
                canonical_id(&[start], &[end], &a),
                canonical_id(&[start], &[end], &b),
            );
            TestResult::from_bool(id_a != id_b)
        }
        quickcheck::QuickCheck::new().tests(500).quickcheck(
            different_text_different_id as fn(usize, usize, String, String) -> TestResult,
        );
    }

    #[rstest]
    #[case(true, vec![FlatSpan::new("PER", 0, 4), FlatSpan::new("PER", 10, 15)])]
    #[case(false, vec![FlatSpan::new("PER", 0, 15)])]
    fn test_discontinuous_span_policy(
        #[case] discontinuous: bool,
        #[case] expected: Vec<FlatSpan>,
    ) {
        let docs = build_documents();
        let canonical = canonicalize_entities(&docs, discontinuous).unwrap();
        assert_eq!(&canonical.spans[0][..expected.len()], expected.as_slice());
        // The entity keeps a single id whatever the policy.
        assert_eq!(canonical.ids.len(), 3);
        assert_eq!(canonical.ids.get(0, "T1"), Some("b9a6494c"));
    }

    #[test]
    fn test_tags_are_collected() {
        let canonical = canonicalize_entities(&build_documents(), true).unwrap();
        let tags: Vec<_> = canonical.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["ACT", "PER"]);
    }

    #[rstest]
    #[case("label")]
    #[case("start")]
    #[case("end")]
    #[case("text")]
    fn test_missing_field_is_structural(#[case] field: &'static str) {
        let mut docs = build_documents();
        let broken = &mut docs[0].entities[1];
        match field {
            "label" => broken.label = None,
            "start" => broken.start = None,
            "end" => broken.end = None,
            _ => broken.text = None,
        }
        let err = canonicalize_entities(&docs, true).unwrap_err();
        assert_eq!(
            err,
            StructuralError::MissingField {
                document: 0,
                entity: 1,
                field
            }
        );
    }

    #[test]
    fn test_empty_and_unpaired_offsets() {
        let mut docs = build_documents();
        docs[0].entities[1].start = Some(Offsets::Many(vec![]));
        assert!(matches!(
            canonicalize_entities(&docs, true),
            Err(StructuralError::EmptyOffsets { .. })
        ));

        let mut docs = build_documents();
        docs[0].entities[0].end = Some(Offsets::Single(15));
        assert!(matches!(
            canonicalize_entities(&docs, true),
            Err(StructuralError::UnpairedOffsets { .. })
        ));
        // Without explosion, only the first start and the last end are needed.
        assert!(canonicalize_entities(&docs, false).is_ok());
    }

    #[test]
    fn test_remap_events_with_unknown_id() {
        let docs = build_documents();
        let canonical = canonicalize_entities(&docs, true).unwrap();
        let remapped = remap_events(&docs, &canonical.ids);
        let agent = &remapped.events[0][0][1];
        assert_eq!(agent.attribute, "evt:agent");
        assert!(agent.occurrences.contains("b9a6494c"));
        assert!(agent.occurrences.contains(INVALID_ID));
        assert_eq!(
            remapped.unresolved,
            vec![ReferenceError {
                document: 0,
                attribute: String::from("evt:agent"),
                raw_id: String::from("T9"),
            }]
        );
    }

    #[test]
    fn test_ids_are_scoped_to_their_document() {
        let mut docs = build_documents();
        let mut second = docs[0].clone();
        second.entities.truncate(1);
        docs.push(second);
        let canonical = canonicalize_entities(&docs, true).unwrap();
        let remapped = remap_events(&docs, &canonical.ids);
        // `T3` only exists in the first document.
        assert!(!remapped.events[0][0][0].occurrences.contains(INVALID_ID));
        assert!(remapped.events[1][0][0].occurrences.contains(INVALID_ID));
    }
}
