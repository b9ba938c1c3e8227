use anyhow::Context;

use bout_analysis::config::AppConfig;
use bout_analysis::metrics::init_metrics;
use bout_analysis::pipeline;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let metrics_handle = init_metrics()?;

    tracing::info!(
        data = %config.data_path.display(),
        seed = config.seed,
        folds = config.folds,
        sample_per_class = config.sample_per_class,
        tree_counts = ?config.tree_counts,
        parallel = config.parallel,
        "Starting bout analysis"
    );

    let report = pipeline::run(&config)?;
    report.save(config.report_path.as_deref())?;

    if let Some(path) = &config.metrics_path {
        std::fs::write(path, metrics_handle.render())
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Metrics snapshot written");
    }

    if !report.branch_errors.is_empty() {
        tracing::warn!(
            count = report.branch_errors.len(),
            "Run finished with failed branches"
        );
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // stdout carries the report when REPORT_PATH is unset
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
