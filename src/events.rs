/*!
Event-level matching. Every gold event is paired with the predicted event of its document that
maximizes the f-score of their elements. The search is greedy: gold events are processed in order
and a predicted event, once selected, is no longer available to the following gold events.

An element of a predicted event matches an element of a gold event when they share the same
attribute, their occurrence sets intersect, and the predicted element holds at most
`max_false_occurrences` occurrences that are not in the gold element.
*/
use crate::canonical::{Event, EventElement};
use crate::metrics::{as_float, safe_divide, Counts, LevelMetrics, MacroAverage};
use serde::Serialize;

/// Whether the predicted element `pred` matches the gold element `gold`.
pub fn elements_match(
    pred: &EventElement,
    gold: &EventElement,
    max_false_occurrences: usize,
) -> bool {
    pred.attribute == gold.attribute
        && !pred.occurrences.is_disjoint(&gold.occurrences)
        && pred.occurrences.difference(&gold.occurrences).count() <= max_false_occurrences
}

/// Element counts of a gold event compared to a single predicted event.
pub fn event_counts(
    gold_event: &[EventElement],
    pred_event: &[EventElement],
    max_false_occurrences: usize,
) -> Counts {
    let true_positives = gold_event
        .iter()
        .filter(|g| pred_event.iter().any(|p| elements_match(p, g, max_false_occurrences)))
        .count();
    let false_positives = pred_event
        .iter()
        .filter(|p| !gold_event.iter().any(|g| elements_match(p, g, max_false_occurrences)))
        .count();
    Counts::new(true_positives, false_positives, gold_event.len() - true_positives)
}

/// Predicted event selected for a gold event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestMatch {
    /// Index of the predicted event in its document.
    pub index: usize,
    pub counts: Counts,
}

/// Finds the available predicted event with the highest f-score against `gold_event`.
///
/// * `gold_event`: The gold event.
/// * `candidates`: Predicted events of the same document.
/// * `consumed`: `consumed[i]` is `true` if `candidates[i]` was already selected.
/// * `max_false_occurrences`: Tolerated number of predicted occurrences missing from the gold
///   element.
///
/// Ties keep the first candidate. Returns `None` if no candidate has a positive f-score.
pub fn find_best_match(
    gold_event: &[EventElement],
    candidates: &[Event],
    consumed: &[bool],
    max_false_occurrences: usize,
) -> Option<BestMatch> {
    let mut best: Option<(f64, BestMatch)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        if consumed.get(index).copied().unwrap_or(false) {
            continue;
        }
        let counts = event_counts(gold_event, candidate, max_false_occurrences);
        let f1 = counts.f1();
        let best_f1 = best.map_or(0.0, |(f1, _)| f1);
        if f1 > best_f1 {
            best = Some((f1, BestMatch { index, counts }));
        }
    }
    best.map(|(_, best_match)| best_match)
}

/// Macro and micro metrics of the predicted events against the gold events.
///
/// Each gold event scores its best match, or only false negatives when it has none. Each
/// predicted event left unselected scores only false positives. A document without any
/// predicted event therefore scores all of its gold events as false negatives.
pub fn event_level_metrics(
    gold: &[Vec<Event>],
    predicted: &[Vec<Event>],
    max_false_occurrences: usize,
) -> LevelMetrics {
    let mut macro_average = MacroAverage::default();
    let mut total = Counts::default();
    let mut score = |counts: Counts| {
        macro_average.push(&counts.prf());
        total += counts;
    };

    for (gold_doc, pred_doc) in gold.iter().zip(predicted) {
        let mut consumed = vec![false; pred_doc.len()];
        for gold_event in gold_doc {
            match find_best_match(gold_event, pred_doc, &consumed, max_false_occurrences) {
                Some(best) => {
                    consumed[best.index] = true;
                    score(best.counts);
                }
                None => score(Counts::new(0, 0, gold_event.len())),
            }
        }
        for (pred_event, _) in pred_doc.iter().zip(&consumed).filter(|(_, used)| !**used) {
            score(Counts::new(0, pred_event.len(), 0));
        }
    }

    LevelMetrics::new(&macro_average, total)
}

/// Share of gold events whose elements are all (strict) or mostly (relaxed) found by a single
/// predicted event. Both ratios are divided by the number of gold documents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Completeness {
    pub strict: f64,
    pub relaxed: f64,
}

/// Fraction of the elements of `gold_event` found in `pred_event`, by attribute and occurrence
/// overlap.
fn recovered_fraction(gold_event: &[EventElement], pred_event: &[EventElement]) -> f64 {
    let recovered = gold_event
        .iter()
        .filter(|g| {
            pred_event
                .iter()
                .any(|p| p.attribute == g.attribute && !p.occurrences.is_disjoint(&g.occurrences))
        })
        .count();
    safe_divide(as_float(recovered), as_float(gold_event.len()))
}

/// Computes the strict and relaxed completeness of the predicted events.
///
/// * `threshold`: Minimal recovered fraction for a gold event to count as relaxed-complete.
pub fn compute_completeness(
    gold: &[Vec<Event>],
    predicted: &[Vec<Event>],
    threshold: f64,
) -> Completeness {
    let mut complete_strict = 0usize;
    let mut complete_relaxed = 0usize;
    for (gold_doc, pred_doc) in gold.iter().zip(predicted) {
        for gold_event in gold_doc {
            let best_match = pred_doc
                .iter()
                .map(|pred_event| recovered_fraction(gold_event, pred_event))
                .fold(0.0, f64::max);
            if best_match >= 1.0 {
                complete_strict += 1;
            }
            if best_match >= threshold {
                complete_relaxed += 1;
            }
        }
    }
    let documents: f64 = as_float(gold.len());
    Completeness {
        strict: safe_divide(as_float(complete_strict), documents),
        relaxed: safe_divide(as_float(complete_relaxed), documents),
    }
}
