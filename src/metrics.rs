use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register the pipeline's metrics.
/// The returned handle's `render()` produces the text exposition snapshot
/// written at the end of a run.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so a clean run still reports zeros.
    counter!("records_loaded_total").absolute(0);
    counter!("records_rejected_total").absolute(0);
    counter!("fit_failures_total").absolute(0);
    counter!("folds_evaluated_total").absolute(0);

    // Histograms are created on first record.
    histogram!("fold_fit_seconds").record(0.0);

    Ok(handle)
}
