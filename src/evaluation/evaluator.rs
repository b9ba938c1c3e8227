use metrics::{counter, histogram};
use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;

use crate::errors::{AnalysisError, Result};
use crate::learning::{Classifier, DesignMatrix, Formula};
use crate::models::{
    ClassifierConfig, ConfigPrediction, Dataset, FitFailureNote, Outcome, PredictionRecord,
};
use crate::sampling::Folds;

#[derive(Debug, Clone, Copy)]
pub struct EvaluatorOptions {
    pub seed: u64,
    /// Run folds on the rayon pool.
    pub parallel: bool,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            parallel: true,
        }
    }
}

/// Concatenated out-of-fold predictions for every config.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub positive: Outcome,
    pub k: usize,
    /// Sorted by (fold, record index).
    pub predictions: Vec<PredictionRecord>,
    /// Sorted by fold, then config order.
    pub failures: Vec<FitFailureNote>,
}

impl Evaluation {
    pub fn fold(&self, fold: usize) -> impl Iterator<Item = &PredictionRecord> {
        self.predictions.iter().filter(move |p| p.fold == fold)
    }
}

struct FoldResult {
    rows: Vec<PredictionRecord>,
    failures: Vec<(usize, FitFailureNote)>,
}

/// Cross-validate every config on `dataset` over `folds`.
///
/// For each fold, each config is fitted on the training partition and scores
/// the held-out records. A config that fails to fit in a fold contributes no
/// predictions for that fold and is recorded in `failures`; it never aborts
/// the evaluation.
pub fn evaluate<C: Classifier>(
    classifier: &C,
    dataset: &Dataset,
    folds: &Folds,
    formula: &Formula,
    configs: &[ClassifierConfig],
    options: &EvaluatorOptions,
) -> Result<Evaluation> {
    validate_configs(configs)?;
    if folds.n() != dataset.len() {
        return Err(AnalysisError::config(
            "folds",
            folds.n(),
            format!("partition size must match the dataset ({})", dataset.len()),
        ));
    }

    let design = formula.design(dataset).map_err(|source| AnalysisError::FitFailure {
        model: formula.to_string(),
        source,
    })?;

    tracing::info!(
        k = folds.k(),
        records = dataset.len(),
        configs = configs.len(),
        parallel = options.parallel,
        "Cross-validation started"
    );

    let run = |(fold, held_out): (usize, &[usize])| {
        evaluate_fold(classifier, dataset, &design, folds, fold, held_out, configs, options.seed)
    };

    let results: Vec<FoldResult> = if options.parallel {
        folds.iter().collect::<Vec<_>>().into_par_iter().map(run).collect()
    } else {
        folds.iter().map(run).collect()
    };

    let mut predictions = Vec::with_capacity(dataset.len());
    let mut failures = Vec::new();
    for result in results {
        predictions.extend(result.rows);
        failures.extend(result.failures);
    }

    predictions.sort_by_key(|p| (p.fold, p.record_index));
    failures.sort_by_key(|(config_index, note)| (note.fold, *config_index));

    Ok(Evaluation {
        positive: formula.positive,
        k: folds.k(),
        predictions,
        failures: failures.into_iter().map(|(_, note)| note).collect(),
    })
}

#[allow(clippy::too_many_arguments)]
fn evaluate_fold<C: Classifier>(
    classifier: &C,
    dataset: &Dataset,
    design: &DesignMatrix,
    folds: &Folds,
    fold: usize,
    held_out: &[usize],
    configs: &[ClassifierConfig],
    seed: u64,
) -> FoldResult {
    // `fold` comes from `folds.iter()`, so it is always in range
    let train = design.select(&folds.training(fold).unwrap_or_default());
    let test = design.select(held_out);

    let mut rows: Vec<PredictionRecord> = held_out
        .iter()
        .map(|&i| PredictionRecord {
            fold,
            record_index: i,
            observed: dataset.records()[i].result,
            predictions: Vec::with_capacity(configs.len()),
        })
        .collect();
    let mut failures = Vec::new();

    for (config_index, config) in configs.iter().enumerate() {
        let started = Instant::now();

        match classifier.fit(&train, config, fit_seed(seed, fold, config_index)) {
            Ok(model) => {
                let probabilities = classifier.predict_probability(&model, &test);
                for (row, probability) in rows.iter_mut().zip(probabilities) {
                    row.predictions.push(ConfigPrediction::from_probability(
                        config.name.clone(),
                        probability,
                        design.positive(),
                    ));
                }
                histogram!("fold_fit_seconds").record(started.elapsed().as_secs_f64());
                tracing::debug!(
                    fold,
                    config = %config.name,
                    train = train.rows(),
                    test = test.rows(),
                    "Fold scored"
                );
            }
            Err(e) => {
                counter!("fit_failures_total").increment(1);
                tracing::warn!(
                    fold,
                    config = %config.name,
                    error = %e,
                    "Fit failed, fold skipped for this config"
                );
                failures.push((
                    config_index,
                    FitFailureNote {
                        fold,
                        config: config.name.clone(),
                        reason: e.to_string(),
                    },
                ));
            }
        }
    }

    counter!("folds_evaluated_total").increment(1);

    FoldResult { rows, failures }
}

fn validate_configs(configs: &[ClassifierConfig]) -> Result<()> {
    if configs.is_empty() {
        return Err(AnalysisError::config(
            "configs",
            "[]",
            "at least one classifier config is required",
        ));
    }
    let mut names = HashSet::new();
    for config in configs {
        if !names.insert(config.name.as_str()) {
            return Err(AnalysisError::config(
                "configs",
                &config.name,
                "config names must be unique",
            ));
        }
    }
    Ok(())
}

/// Seed for one fold/config fit, independent of evaluation order.
fn fit_seed(seed: u64, fold: usize, config_index: usize) -> u64 {
    // splitmix64 finaliser over the combined key
    let mut z = seed ^ ((fold as u64) << 32 | config_index as u64);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::{FitError, Predictor};
    use crate::models::{Attribute, Corner, Record, Side};
    use crate::sampling::stratified_folds;

    /// Predicts the training share of positives for every row.
    struct BaseRate;

    impl Classifier for BaseRate {
        type Model = f64;

        fn fit(&self, train: &DesignMatrix, config: &ClassifierConfig, _seed: u64) -> std::result::Result<f64, FitError> {
            if config.trees == 0 {
                return Err(FitError::EmptyEnsemble);
            }
            if train.rows() == 0 {
                return Err(FitError::EmptyTraining);
            }
            Ok(train.positives() as f64 / train.rows() as f64)
        }

        fn predict_probability(&self, model: &f64, test: &DesignMatrix) -> Vec<f64> {
            vec![*model; test.rows()]
        }
    }

    fn dataset(wins_a: usize, wins_b: usize) -> Dataset {
        std::iter::repeat(Outcome::WinA)
            .take(wins_a)
            .chain(std::iter::repeat(Outcome::WinB).take(wins_b))
            .enumerate()
            .map(|(i, result)| {
                Record::new(
                    Corner {
                        age: Some(i as f64),
                        ..Corner::default()
                    },
                    Corner::default(),
                    result,
                )
            })
            .collect()
    }

    fn formula() -> Formula {
        Formula::new(vec![Predictor::Value(Attribute::Age, Side::A)], Outcome::WinB)
    }

    #[test]
    fn test_every_record_scored_once_per_config() {
        let ds = dataset(30, 20);
        let folds = stratified_folds(&ds, 5, 1).unwrap();
        let configs = [ClassifierConfig::new("a", 1), ClassifierConfig::new("b", 2)];

        let eval = evaluate(&BaseRate, &ds, &folds, &formula(), &configs, &EvaluatorOptions::default())
            .unwrap();

        assert_eq!(eval.predictions.len(), 50);
        assert!(eval.failures.is_empty());
        let mut indices: Vec<usize> = eval.predictions.iter().map(|p| p.record_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..50).collect::<Vec<_>>());

        for row in &eval.predictions {
            assert_eq!(row.predictions.len(), 2);
            assert_eq!(row.observed, ds.records()[row.record_index].result);
            assert!(folds.held_out(row.fold).unwrap().contains(&row.record_index));
            // base rate 0.4 → always predicts the negative class
            assert_eq!(row.prediction("a").unwrap().predicted, Outcome::WinA);
        }
    }

    #[test]
    fn test_failed_config_is_flagged_not_fatal() {
        let ds = dataset(10, 10);
        let folds = stratified_folds(&ds, 2, 1).unwrap();
        let configs = [ClassifierConfig::new("ok", 1), ClassifierConfig::new("broken", 0)];

        let eval = evaluate(&BaseRate, &ds, &folds, &formula(), &configs, &EvaluatorOptions::default())
            .unwrap();

        assert_eq!(eval.failures.len(), 2);
        assert_eq!(eval.failures[0].fold, 1);
        assert_eq!(eval.failures[1].fold, 2);
        assert!(eval.failures.iter().all(|f| f.config == "broken"));
        for row in &eval.predictions {
            assert!(row.prediction("ok").is_some());
            assert!(row.prediction("broken").is_none());
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ds = dataset(40, 25);
        let folds = stratified_folds(&ds, 5, 8).unwrap();
        let configs = [ClassifierConfig::new("a", 1)];
        let seq = EvaluatorOptions {
            seed: 3,
            parallel: false,
        };
        let par = EvaluatorOptions {
            seed: 3,
            parallel: true,
        };

        assert_eq!(
            evaluate(&BaseRate, &ds, &folds, &formula(), &configs, &seq).unwrap(),
            evaluate(&BaseRate, &ds, &folds, &formula(), &configs, &par).unwrap()
        );
    }

    #[test]
    fn test_duplicate_config_names_are_rejected() {
        let ds = dataset(5, 5);
        let folds = stratified_folds(&ds, 2, 1).unwrap();
        let configs = [ClassifierConfig::new("a", 1), ClassifierConfig::new("a", 2)];
        assert!(matches!(
            evaluate(&BaseRate, &ds, &folds, &formula(), &configs, &EvaluatorOptions::default()),
            Err(AnalysisError::Configuration { .. })
        ));
    }

    #[test]
    fn test_mismatched_folds_are_rejected() {
        let folds = stratified_folds(&dataset(5, 5), 2, 1).unwrap();
        let configs = [ClassifierConfig::new("a", 1)];
        assert!(evaluate(
            &BaseRate,
            &dataset(6, 6),
            &folds,
            &formula(),
            &configs,
            &EvaluatorOptions::default()
        )
        .is_err());
    }

    #[test]
    fn test_fit_seeds_differ_per_fold_and_config() {
        let seeds: HashSet<u64> = (1..=10)
            .flat_map(|fold| (0..2).map(move |c| fit_seed(42, fold, c)))
            .collect();
        assert_eq!(seeds.len(), 20);
    }
}
