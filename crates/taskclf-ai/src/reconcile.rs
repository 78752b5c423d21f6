//! Merge manual labels with strategy output.
//!
//! Every sample ends up in exactly one place: labeled by a human, labeled by
//! the strategy, or queued for review. Output order follows sample order.

use std::collections::{HashMap, HashSet};

use taskclf_core::{LabelRecord, SampleRecord};
use tracing::{debug, info};

use crate::strategy::LabelingStrategy;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Label-store rows in sample order.
    pub labels: Vec<LabelRecord>,
    /// Samples with no manual label that the strategy declined (or no strategy ran).
    pub review_queue: Vec<SampleRecord>,
    pub human_count: usize,
    pub strategy_count: usize,
    /// Manual labels whose `sample_id` matched no sample.
    pub unmatched_manual: usize,
}

/// Reconcile the sample store against manual labels and an optional strategy.
///
/// A manual label is forwarded as-is and the strategy is never consulted for
/// that sample. Otherwise a strategy label is accepted as-is, and a `None`
/// (or no strategy at all) sends the sample to the review queue.
pub fn reconcile(
    samples: &[SampleRecord],
    manual: &HashMap<String, LabelRecord>,
    strategy: Option<&dyn LabelingStrategy>,
) -> Reconciliation {
    let mut out = Reconciliation {
        labels: Vec::with_capacity(samples.len()),
        ..Default::default()
    };
    let mut matched: HashSet<&str> = HashSet::with_capacity(manual.len());

    for sample in samples {
        if let Some(record) = manual.get(&sample.sample_id) {
            matched.insert(sample.sample_id.as_str());
            out.labels.push(LabelRecord::new(
                sample.sample_id.clone(),
                record.label.clone(),
            ));
            out.human_count += 1;
            continue;
        }

        match strategy.and_then(|s| s.label(sample)) {
            Some(label) => {
                out.labels
                    .push(LabelRecord::new(sample.sample_id.clone(), label));
                out.strategy_count += 1;
            }
            None => {
                debug!(sample_id = %sample.sample_id, "no label, queued for review");
                out.review_queue.push(sample.clone());
            }
        }
    }

    out.unmatched_manual = manual.len() - matched.len();
    info!(
        samples = samples.len(),
        human = out.human_count,
        strategy = out.strategy_count,
        strategy_name = strategy.map(|s| s.name()).unwrap_or("none"),
        review = out.review_queue.len(),
        unmatched_manual = out.unmatched_manual,
        "reconciled labels"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{HEURISTIC_SOURCE, KeywordHeuristicLabeler};
    use taskclf_core::TaskLabel;

    /// Labels only samples whose query mentions "label me".
    struct Picky;

    impl LabelingStrategy for Picky {
        fn name(&self) -> &str {
            "picky"
        }

        fn label(&self, sample: &SampleRecord) -> Option<TaskLabel> {
            sample
                .query
                .contains("label me")
                .then(|| TaskLabel::new(0.5, "picky").with_axis("complexity", "simple"))
        }
    }

    fn samples() -> Vec<SampleRecord> {
        vec![
            SampleRecord::new("a", "app", "label me please"),
            SampleRecord::new("b", "app", "nothing to see"),
            SampleRecord::new("c", "app", "label me too"),
            SampleRecord::new("d", "app", "manual one"),
        ]
    }

    fn manual(ids: &[&str], source: &str) -> HashMap<String, LabelRecord> {
        ids.iter()
            .map(|id| {
                let label = TaskLabel::new(1.0, source).with_axis("complexity", "complex");
                (id.to_string(), LabelRecord::new(*id, label))
            })
            .collect()
    }

    fn assert_partition(samples: &[SampleRecord], r: &Reconciliation) {
        let mut seen: HashSet<&str> = HashSet::new();
        for id in r
            .labels
            .iter()
            .map(|l| l.sample_id.as_str())
            .chain(r.review_queue.iter().map(|s| s.sample_id.as_str()))
        {
            assert!(seen.insert(id), "sample {id} assigned twice");
        }
        assert_eq!(seen.len(), samples.len(), "every sample assigned once");
        assert_eq!(r.human_count + r.strategy_count, r.labels.len());
    }

    #[test]
    fn partitions_samples_without_overlap() {
        let samples = samples();
        let r = reconcile(&samples, &manual(&["d"], "human"), Some(&Picky));
        assert_partition(&samples, &r);
        assert_eq!(r.human_count, 1);
        assert_eq!(r.strategy_count, 2);
        let queued: Vec<&str> = r.review_queue.iter().map(|s| s.sample_id.as_str()).collect();
        assert_eq!(queued, vec!["b"]);
    }

    #[test]
    fn manual_label_beats_strategy() {
        let samples = samples();
        let r = reconcile(&samples, &manual(&["a"], "annotator"), Some(&Picky));
        let a = r.labels.iter().find(|l| l.sample_id == "a").unwrap();
        assert_eq!(a.label.source, "annotator");
        assert_eq!(a.label.get("complexity"), Some("complex"));
        assert_eq!(r.human_count, 1);
    }

    #[test]
    fn no_strategy_queues_everything_unlabeled() {
        let samples = samples();
        let r = reconcile(&samples, &manual(&["b"], "human"), None);
        assert_partition(&samples, &r);
        assert_eq!(r.labels.len(), 1);
        assert_eq!(r.review_queue.len(), 3);
    }

    #[test]
    fn heuristic_labels_everything_left() {
        let samples = samples();
        let heuristic = KeywordHeuristicLabeler::default();
        let r = reconcile(&samples, &HashMap::new(), Some(&heuristic));
        assert_partition(&samples, &r);
        assert!(r.review_queue.is_empty());
        assert!(r.labels.iter().all(|l| l.label.source == HEURISTIC_SOURCE));
    }

    #[test]
    fn labels_follow_sample_order() {
        let samples = samples();
        let heuristic = KeywordHeuristicLabeler::default();
        let r = reconcile(&samples, &manual(&["c"], "human"), Some(&heuristic));
        let ids: Vec<&str> = r.labels.iter().map(|l| l.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn counts_unmatched_manual_labels() {
        let samples = samples();
        let r = reconcile(&samples, &manual(&["a", "zz"], "human"), None);
        assert_eq!(r.unmatched_manual, 1);
        assert!(r.labels.iter().all(|l| l.sample_id != "zz"));
    }

    #[test]
    fn reconciliation_is_deterministic() {
        let samples = samples();
        let heuristic = KeywordHeuristicLabeler::default();
        let manual = manual(&["b", "d"], "human");
        let first = reconcile(&samples, &manual, Some(&heuristic));
        let second = reconcile(&samples, &manual, Some(&heuristic));
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.review_queue, second.review_queue);
    }
}
