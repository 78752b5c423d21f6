//! Label → features → train over a synthetic corpus on disk.

use std::fs;
use std::path::Path;

use taskclf_ai::{FeatureBuilder, FeatureFrame, LabelSet, Trainer, configured_strategy, reconcile};
use taskclf_core::{ArtifactLayout, PipelineConfig, SampleRecord};
use taskclf_store::ArtifactStore;

fn corpus() -> Vec<SampleRecord> {
    (0..40)
        .map(|i| {
            let mut query = format!("task number {i}");
            if i % 2 == 0 {
                query.push_str(" answer now");
            }
            if i % 3 == 0 {
                query.push_str(" about my account");
            }
            if i % 4 == 0 {
                query.push_str(" and cite a source");
            }
            if i % 5 == 0 {
                query.push_str(&" filler".repeat(85));
            }
            if i % 7 == 0 {
                query.push('?');
            }
            let source = if i % 2 == 0 { "xsum" } else { "jfleg" };
            SampleRecord::new(format!("s{i:02}"), source, query)
        })
        .collect()
}

fn write_manual_labels(path: &Path) {
    let rows = [
        serde_json::json!({
            "sample_id": "s01",
            "complexity": "complex",
            "latency": "realtime",
            "privacy": "private",
            "knowledge": "high",
            "device_load": "heavy",
        }),
        serde_json::json!({
            "sample_id": "not_in_corpus",
            "complexity": "simple",
            "latency": "relaxed",
            "privacy": "public",
            "knowledge": "low",
            "device_load": "light",
        }),
    ];
    let text: String = rows.iter().map(|r| format!("{r}\n")).collect();
    fs::write(path, text).unwrap();
}

fn config(root: &Path, use_heuristic: bool) -> PipelineConfig {
    PipelineConfig {
        layout: ArtifactLayout::rooted(root),
        use_heuristic,
        manual_labels: Some(root.join("manual_labels.jsonl")),
        ..Default::default()
    }
}

/// Run the label stage and return the label store bytes.
fn label_stage(config: &PipelineConfig, store: &ArtifactStore) -> Vec<u8> {
    let samples = store.load_samples().unwrap();
    let manual = store
        .load_manual_labels(config.manual_labels.as_deref().unwrap(), &config.taxonomy)
        .unwrap();
    let strategy = configured_strategy(config);
    let rec = reconcile(&samples, &manual, strategy.as_deref());
    store.save_label_store(&rec.labels, &config.taxonomy).unwrap();
    store.save_review_queue(&rec.review_queue).unwrap();
    fs::read(store.layout().labels_path()).unwrap()
}

#[test]
fn heuristic_labels_train_every_axis() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), true);
    let store = ArtifactStore::new(config.layout.clone());
    store.prepare_dirs().unwrap();
    store.save_samples(&corpus()).unwrap();
    write_manual_labels(config.manual_labels.as_deref().unwrap());

    let first = label_stage(&config, &store);
    let second = label_stage(&config, &store);
    assert_eq!(first, second, "label store must be byte-identical across runs");
    assert!(!store.layout().review_queue_path().exists());

    let records = store.load_label_store(&config.taxonomy).unwrap();
    assert_eq!(records.len(), 40);
    let s01 = records.iter().find(|r| r.sample_id == "s01").unwrap();
    assert_eq!(s01.label.source, "human");
    assert_eq!(s01.label.get("complexity"), Some("complex"));
    let s02 = records.iter().find(|r| r.sample_id == "s02").unwrap();
    assert_eq!(s02.label.source, "heuristic");
    assert_eq!(s02.label.get("latency"), Some("realtime"));

    let labels = LabelSet::from_records(&records);
    let samples = store.load_samples().unwrap();
    let builder = FeatureBuilder::from_config(&config.features);
    let frame = FeatureFrame::from_samples(&samples, &builder).unwrap();
    assert_eq!(frame.num_rows(), 40);

    for model in ["logistic_regression", "decision_tree"] {
        let config = PipelineConfig {
            model_name: model.into(),
            ..config.clone()
        };
        let trainer = Trainer::new(&config).unwrap();
        let run = trainer.train_all(&frame, &labels).unwrap();
        assert!(run.failures().is_empty(), "{model}: {:?}", run.failures());

        let path = store.save_metrics(model, &run.report_rows()).unwrap();
        assert!(path.ends_with(format!("{model}_metrics.jsonl")));
        store.save_class_reports(model, &run.class_reports()).unwrap();

        let rows = store.load_metrics(model).unwrap();
        let axes: Vec<&str> = rows.iter().map(|r| r.axis.as_str()).collect();
        assert_eq!(
            axes,
            vec!["complexity", "latency", "privacy", "knowledge", "device_load"]
        );
        for row in &rows {
            assert!((0.0..=1.0).contains(&row.metrics.f1_score));
            assert!(row.metrics.support > 0);
        }
    }
}

#[test]
fn without_heuristic_unlabeled_samples_queue_for_review() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), false);
    let store = ArtifactStore::new(config.layout.clone());
    store.prepare_dirs().unwrap();
    store.save_samples(&corpus()).unwrap();
    write_manual_labels(config.manual_labels.as_deref().unwrap());

    label_stage(&config, &store);

    let records = store.load_label_store(&config.taxonomy).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sample_id, "s01");

    let queue = fs::read_to_string(store.layout().review_queue_path()).unwrap();
    assert_eq!(queue.lines().count(), 39);
    assert!(!queue.contains("\"s01\""));
}
