use crate::config::AppConfig;
use crate::errors::{AnalysisError, Result};
use crate::evaluation::{aggregate, evaluate, EvaluatorOptions};
use crate::ingestion::{
    clean, derive_differences, exclude_draws, exclude_for, load_csv, AttributeRange,
};
use crate::learning::{fit_attributes, Formula, Predictor, RandomForest};
use crate::models::{Attribute, Dataset, Difference, Outcome, Side};
use crate::report::{Classification, RecordCounts, Regression, RunParameters, RunReport};
use crate::sampling::{balance, stratified_folds};
use crate::stats::{advantage_test, describe, AdvantageTable, AdvantageTest};

const REACH_ON_HEIGHT: &str = "reach_A ~ height_A";

/// Load the configured CSV and run every analysis over it.
pub fn run(config: &AppConfig) -> Result<RunReport> {
    let dataset = load_csv(&config.data_path)?;
    analyse(&dataset, config)
}

/// Run every analysis branch over an already loaded dataset.
///
/// Schema and configuration problems abort the run. A branch that cannot
/// proceed on this data (too few records of a class, a failed one-off fit)
/// is recorded in the report and the remaining branches still run.
pub fn analyse(dataset: &Dataset, config: &AppConfig) -> Result<RunReport> {
    config.validate()?;

    let mut report = RunReport::new(parameters(config));
    report.records.loaded = dataset.len();

    let cleaned = derive_differences(&clean(dataset, &config.ranges()));
    report.records.cleaned = cleaned.len();

    report.summaries = describe(&cleaned);
    report.hypotheses = test_advantages(dataset, &config.ranges());

    match regress_reach_on_height(&cleaned) {
        Ok(regression) => report.regression = Some(regression),
        Err(e @ AnalysisError::FitFailure { .. }) => report.branch_failed("regression", &e),
        Err(e) => return Err(e),
    }

    match classify(&cleaned, config, &mut report.records) {
        Ok(classification) => report.classification = Some(classification),
        Err(e @ (AnalysisError::RangeExhaustion { .. } | AnalysisError::FitFailure { .. })) => {
            report.branch_failed("classification", &e)
        }
        Err(e) => return Err(e),
    }

    tracing::info!(
        run_id = %report.run_id,
        loaded = report.records.loaded,
        cleaned = report.records.cleaned,
        branch_errors = report.branch_errors.len(),
        "Analysis complete"
    );

    Ok(report)
}

fn parameters(config: &AppConfig) -> RunParameters {
    RunParameters {
        data_path: config.data_path.display().to_string(),
        seed: config.seed,
        folds: config.folds,
        sample_per_class: config.sample_per_class,
        tree_counts: config.tree_counts.clone(),
        parallel: config.parallel,
        ranges: config.ranges(),
    }
}

/// One advantage test per difference over the loaded records.
///
/// Each question filters on its own attribute's range only, then drops
/// draws and zero or missing differences, so a bout with an implausible
/// reach still counts towards the age table.
pub fn test_advantages(dataset: &Dataset, ranges: &[AttributeRange]) -> Vec<AdvantageTest> {
    Difference::ALL
        .iter()
        .filter_map(|&gate| {
            let eligible = advantage_population(dataset, ranges, gate);
            let table = AdvantageTable::count(&eligible, gate);
            let Some(test) = advantage_test(table) else {
                tracing::warn!(gate = %gate, "No eligible bouts, advantage test skipped");
                return None;
            };
            tracing::info!(
                gate = %gate,
                bouts = table.total(),
                larger_side_win_rate = test.larger_side_win_rate,
                chi_square = test.chi_square,
                p_value = test.chi_square_p_value,
                "Advantage test"
            );
            Some(test)
        })
        .collect()
}

/// Records eligible for the `gate` advantage question: in range on the
/// gate's attribute (when a range is configured for it), decisive, with a
/// non-zero difference.
pub fn advantage_population(
    dataset: &Dataset,
    ranges: &[AttributeRange],
    gate: Difference,
) -> Dataset {
    let own: Vec<AttributeRange> = ranges
        .iter()
        .filter(|r| r.attribute == gate.attribute())
        .copied()
        .collect();
    exclude_for(&derive_differences(&clean(dataset, &own)), gate)
}

pub fn regress_reach_on_height(cleaned: &Dataset) -> Result<Regression> {
    let fit = fit_attributes(
        cleaned,
        Predictor::Value(Attribute::Reach, Side::A),
        &[Predictor::Value(Attribute::Height, Side::A)],
    )
    .map_err(|source| AnalysisError::FitFailure {
        model: REACH_ON_HEIGHT.to_string(),
        source,
    })?;

    Ok(Regression {
        model: REACH_ON_HEIGHT.to_string(),
        observations: fit.df_residual + fit.coefficients.len(),
        fit,
    })
}

/// Balanced, stratified cross-validation of the configured forests on the
/// decisive bouts.
pub fn classify(
    cleaned: &Dataset,
    config: &AppConfig,
    counts: &mut RecordCounts,
) -> Result<Classification> {
    let formula = Formula::bout_outcome();

    let decisive = exclude_draws(cleaned);
    let complete = formula.complete_cases(&decisive);
    counts.decisive = decisive.len();
    counts.complete_cases = complete.len();

    let sample = balance(
        &complete,
        &[Outcome::WinA, Outcome::WinB],
        config.sample_per_class,
        config.seed,
    )?;
    counts.balanced = sample.len();

    let folds = stratified_folds(&sample, config.folds, config.seed)?;
    let configs = config.classifier_configs();
    let options = EvaluatorOptions {
        seed: config.seed,
        parallel: config.parallel,
    };

    let evaluation = evaluate(&RandomForest::default(), &sample, &folds, &formula, &configs, &options)?;
    let metrics = aggregate(&evaluation, &configs);

    for summary in &metrics.configs {
        tracing::info!(
            config = %summary.config,
            folds_scored = summary.folds_scored,
            mean_error = ?summary.mean_error,
            mean_auc = ?summary.mean_auc,
            "Config evaluated"
        );
    }

    Ok(Classification {
        formula: formula.to_string(),
        positive: formula.positive,
        per_class: config.sample_per_class,
        k: folds.k(),
        fold_sizes: folds.iter().map(|(_, held_out)| held_out.len()).collect(),
        failures: evaluation.failures,
        metrics,
    })
}
