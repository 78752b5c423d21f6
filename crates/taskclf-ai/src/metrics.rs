//! Classification report: per-class precision/recall/F1 and their averages.
//!
//! Division by zero resolves to 0: a class never predicted has precision 0,
//! a class never present has recall 0, and F1 is 0 when both are.

use std::collections::{BTreeMap, BTreeSet};

use taskclf_core::{ClassMetrics, ClassificationReport};

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Build a report over the sorted union of true and predicted labels.
pub fn classification_report(y_true: &[&str], y_pred: &[&str]) -> ClassificationReport {
    debug_assert_eq!(y_true.len(), y_pred.len());

    let labels: BTreeSet<&str> = y_true.iter().chain(y_pred).copied().collect();
    let mut classes = BTreeMap::new();
    let mut correct = 0usize;

    let mut tp: BTreeMap<&str, usize> = BTreeMap::new();
    let mut predicted: BTreeMap<&str, usize> = BTreeMap::new();
    let mut actual: BTreeMap<&str, usize> = BTreeMap::new();
    for (&t, &p) in y_true.iter().zip(y_pred) {
        *actual.entry(t).or_default() += 1;
        *predicted.entry(p).or_default() += 1;
        if t == p {
            *tp.entry(t).or_default() += 1;
            correct += 1;
        }
    }

    for label in &labels {
        let hits = tp.get(label).copied().unwrap_or(0);
        let support = actual.get(label).copied().unwrap_or(0);
        let precision = ratio(hits, predicted.get(label).copied().unwrap_or(0));
        let recall = ratio(hits, support);
        classes.insert(
            label.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1_score: f1(precision, recall),
                support,
            },
        );
    }

    let total = y_true.len();
    let n_labels = classes.len();
    let mean = |f: fn(&ClassMetrics) -> f64| {
        if n_labels == 0 {
            0.0
        } else {
            classes.values().map(f).sum::<f64>() / n_labels as f64
        }
    };
    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            classes
                .values()
                .map(|m| f(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        }
    };

    let macro_avg = ClassMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1_score: mean(|m| m.f1_score),
        support: total,
    };
    let weighted_avg = ClassMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1_score: weighted(|m| m.f1_score),
        support: total,
    };

    ClassificationReport {
        classes,
        accuracy: ratio(correct, total),
        macro_avg,
        weighted_avg,
    }
}
