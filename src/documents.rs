/*!
Document-level matching. A document is reduced to the distinct occurrence sets of its
`evt:central_element` elements; predicted sets are then matched by inclusion in the gold sets.
A difference between the number of predicted and gold sets is penalized on top of the inclusion
counts.
*/
use crate::canonical::Event;
use crate::metrics::{Counts, LevelMetrics, MacroAverage};
use ahash::AHashSet;
use std::collections::BTreeSet;

/// Attribute defining the identity of an event at the document level.
pub const CENTRAL_ELEMENT: &str = "evt:central_element";

/// Distinct occurrence sets of the central elements of a document.
pub fn central_element_sets(events: &[Event]) -> AHashSet<&BTreeSet<String>> {
    events
        .iter()
        .flatten()
        .filter(|element| element.attribute == CENTRAL_ELEMENT)
        .map(|element| &element.occurrences)
        .collect()
}

/// Counts of a single document. Returns `None` when neither side has a central element.
pub fn document_counts(gold_doc: &[Event], pred_doc: &[Event]) -> Option<Counts> {
    let gold = central_element_sets(gold_doc);
    let pred = central_element_sets(pred_doc);
    match (gold.is_empty(), pred.is_empty()) {
        (true, true) => None,
        (true, false) => Some(Counts::new(0, pred.len(), 0)),
        (false, _) => {
            let true_positives = pred
                .iter()
                .filter(|p| gold.iter().any(|g| p.is_subset(g)))
                .count();
            let mut false_positives = pred.len() - true_positives;
            let mut false_negatives = gold
                .iter()
                .filter(|g| !pred.iter().any(|p| p.is_subset(g)))
                .count();
            // Count penalty
            false_positives += pred.len().saturating_sub(gold.len());
            false_negatives += gold.len().saturating_sub(pred.len());
            Some(Counts::new(true_positives, false_positives, false_negatives))
        }
    }
}

/// Macro and micro metrics over documents. Documents without any central element on both sides
/// are not scored.
pub fn doc_level_metrics(gold: &[Vec<Event>], predicted: &[Vec<Event>]) -> LevelMetrics {
    let mut macro_average = MacroAverage::default();
    let mut total = Counts::default();
    for counts in gold
        .iter()
        .zip(predicted)
        .filter_map(|(gold_doc, pred_doc)| document_counts(gold_doc, pred_doc))
    {
        macro_average.push(&counts.prf());
        total += counts;
    }
    LevelMetrics::new(&macro_average, total)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::canonical::EventElement;
    use rstest::rstest;

    fn central(occurrences: &[&str]) -> Event {
        vec![EventElement::new(CENTRAL_ELEMENT, occurrences.iter().copied())]
    }

    fn events(sets: &[Vec<&str>]) -> Vec<Event> {
        sets.iter().map(|s| central(s)).collect()
    }

    #[rstest]
    // Two gold sets, one found: the missing one is both unmatched and under-generated.
    #[case(vec![vec!["e1"], vec!["e2"]], vec![vec!["e1"]], Some(Counts::new(1, 0, 2)))]
    #[case(vec![vec!["e1", "e2"]], vec![vec!["e1"]], Some(Counts::new(1, 0, 0)))]
    #[case(vec![vec!["e1"]], vec![vec!["e1", "e2"]], Some(Counts::new(0, 1, 1)))]
    #[case(
        vec![vec!["e1"]],
        vec![vec!["e1"], vec!["e1", "e3"], vec!["e4"]],
        Some(Counts::new(1, 4, 0))
    )]
    #[case(vec![], vec![vec!["e1"], vec!["e2"]], Some(Counts::new(0, 2, 0)))]
    #[case(vec![vec!["e1"]], vec![], Some(Counts::new(0, 0, 2)))]
    #[case(vec![], vec![], None)]
    fn test_document_counts(
        #[case] gold: Vec<Vec<&str>>,
        #[case] pred: Vec<Vec<&str>>,
        #[case] expected: Option<Counts>,
    ) {
        assert_eq!(document_counts(&events(&gold), &events(&pred)), expected);
    }

    #[test]
    fn test_duplicate_sets_and_other_attributes_are_ignored() {
        let mut gold_doc = events(&[vec!["e1"], vec!["e1"]]);
        gold_doc.push(vec![EventElement::new("evt:agent", ["a1"])]);
        assert_eq!(central_element_sets(&gold_doc).len(), 1);
        assert_eq!(
            document_counts(&gold_doc, &events(&[vec!["e1"]])),
            Some(Counts::new(1, 0, 0))
        );
    }

    #[test]
    fn test_doc_level_metrics() {
        let gold = vec![events(&[vec!["e1"], vec!["e2"]]), vec![], events(&[vec!["e3"]])];
        let pred = vec![events(&[vec!["e1"]]), vec![], events(&[vec!["e3"]])];
        let metrics = doc_level_metrics(&gold, &pred);
        // The second document is skipped.
        assert_eq!(metrics.macro_avg.support, 2);
        assert_eq!(metrics.counts, Counts::new(2, 0, 2));
        assert!((metrics.micro.recall - 0.5).abs() < 1e-9);
        assert_eq!(metrics.micro.support, 4);

        let perfect = doc_level_metrics(&gold, &gold);
        assert!((perfect.micro.f1 - 1.0).abs() < 1e-9);
        assert!((perfect.macro_avg.f1 - 1.0).abs() < 1e-9);
    }
}
