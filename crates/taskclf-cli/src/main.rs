use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use taskclf_ai::TrainingRun;
use taskclf_core::PipelineConfig;
use taskclf_store::ArtifactStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod stages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    /// Reconcile manual and auto labels into the label store.
    Label,
    /// Fit one pipeline per taxonomy axis and write the metrics report.
    Train,
    /// Re-score exported pipelines on their held-out partitions.
    Evaluate,
    /// label, then train, then evaluate.
    All,
}

#[derive(Parser, Debug)]
#[command(name = "taskclf")]
#[command(about = "Task-taxonomy labeling and per-axis classifier training")]
#[command(version)]
struct Args {
    #[arg(long, value_enum, default_value_t = Stage::All, env = "TASKCLF_STAGE")]
    stage: Stage,

    /// TOML pipeline config; flags below override its values
    #[arg(long, env = "TASKCLF_CONFIG")]
    config: Option<PathBuf>,

    /// Estimator: logistic_regression or decision_tree
    #[arg(long, env = "TASKCLF_MODEL")]
    model: Option<String>,

    /// Label samples with no manual label using the keyword heuristic (true/false)
    #[arg(long, env = "TASKCLF_USE_HEURISTIC", action = ArgAction::Set)]
    use_heuristic: Option<bool>,

    /// JSONL file of manual labels
    #[arg(long, env = "TASKCLF_MANUAL_LABELS")]
    manual_labels: Option<PathBuf>,

    /// Seed for the stratified split
    #[arg(long, env = "TASKCLF_SEED")]
    seed: Option<u64>,

    /// Root of the processed sample and label directories
    #[arg(long, env = "TASKCLF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `taskclf_ai=debug`; falls back to RUST_LOG
    #[arg(long, env = "TASKCLF_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model_name = model.clone();
        }
        if let Some(enabled) = self.use_heuristic {
            config.use_heuristic = enabled;
        }
        if let Some(path) = &self.manual_labels {
            config.manual_labels = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(dir) = &self.data_dir {
            config.layout.data_dir = dir.clone();
        }
        config.validate().context("validating pipeline config")?;
        Ok(config)
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Fail the stage if any axis failed. Successful axes are already persisted.
fn check_axes(stage: &str, run: &TrainingRun) -> Result<()> {
    let failures = run.failures();
    if failures.is_empty() {
        return Ok(());
    }
    for (axis, e) in &failures {
        error!(stage, axis = %axis, error = %e, "axis failed");
    }
    let axes: Vec<&str> = failures.iter().map(|(axis, _)| *axis).collect();
    bail!("{stage}: {} axis run(s) failed: {}", axes.len(), axes.join(", "))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());
    info!("taskclf v{}", env!("CARGO_PKG_VERSION"));

    let config = args.pipeline_config()?;
    let store = ArtifactStore::new(config.layout.clone());
    store.prepare_dirs().context("creating output directories")?;
    info!(
        stage = ?args.stage,
        model = %config.model_name,
        use_heuristic = config.use_heuristic,
        seed = config.seed,
        "starting"
    );

    if matches!(args.stage, Stage::Label | Stage::All) {
        let stats = stages::run_label(&config, &store)?;
        info!(
            labeled = stats.labeled,
            queued = stats.queued,
            "label stage complete"
        );
    }

    if matches!(args.stage, Stage::Train | Stage::All) {
        let run = stages::run_train(&config, &store)?;
        check_axes("train", &run)?;
    }

    if matches!(args.stage, Stage::Evaluate | Stage::All) {
        let run = stages::run_evaluate(&config, &store)?;
        check_axes("evaluate", &run)?;
    }

    Ok(())
}
