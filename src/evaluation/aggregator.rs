use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::evaluator::Evaluation;
use super::roc::{auc, roc_curve, vertical_average, RocPoint};
use crate::learning::linear::{fit_ols, INTERCEPT};
use crate::models::{ClassifierConfig, PredictionRecord};

/// Points in the display ROC curve.
const ROC_GRID: usize = 101;

/// Error rate of one config in one fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldScore {
    pub fold: usize,
    pub config: String,
    pub scored: usize,
    pub error: f64,
    /// `None` when the fold's held-out records are all one class.
    pub auc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub config: String,
    pub trees: usize,
    pub folds_scored: usize,
    pub folds_failed: usize,
    pub mean_error: Option<f64>,
    /// Mean of the per-fold AUCs.
    pub mean_auc: Option<f64>,
    pub auc_sd: Option<f64>,
    /// Vertically averaged ROC curve for plotting, `(fpr, tpr)`.
    pub roc: Vec<(f64, f64)>,
}

/// One non-baseline config's effect in `error ~ config`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEffect {
    pub config: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Linear comparison of fold error rates across configs. The intercept is
/// the baseline config's mean error; each effect is a difference from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigComparison {
    pub baseline: String,
    pub intercept: f64,
    pub effects: Vec<ConfigEffect>,
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub fold_scores: Vec<FoldScore>,
    pub configs: Vec<ConfigSummary>,
    pub comparison: Option<ConfigComparison>,
    /// Conditions that left a value out of the summaries.
    pub notes: Vec<String>,
}

impl Aggregate {
    pub fn config(&self, name: &str) -> Option<&ConfigSummary> {
        self.configs.iter().find(|c| c.config == name)
    }
}

/// Fraction of rows where `config`'s label differs from the observed one.
/// `None` if no row carries a prediction for `config`.
pub fn error_rate<'a>(
    rows: impl IntoIterator<Item = &'a PredictionRecord>,
    config: &str,
) -> Option<f64> {
    let (mut wrong, mut total) = (0usize, 0usize);
    for row in rows {
        if let Some(p) = row.prediction(config) {
            total += 1;
            if p.predicted != row.observed {
                wrong += 1;
            }
        }
    }
    (total > 0).then(|| wrong as f64 / total as f64)
}

/// Summarise an evaluation per fold and per config.
pub fn aggregate(evaluation: &Evaluation, configs: &[ClassifierConfig]) -> Aggregate {
    let mut fold_scores = Vec::new();
    let mut summaries = Vec::with_capacity(configs.len());
    let mut notes = Vec::new();

    for config in configs {
        let mut curves: Vec<Vec<RocPoint>> = Vec::new();
        let mut errors = Vec::new();
        let mut aucs = Vec::new();

        for fold in 1..=evaluation.k {
            let rows: Vec<&PredictionRecord> = evaluation.fold(fold).collect();
            let Some(error) = error_rate(rows.iter().copied(), &config.name) else {
                continue;
            };

            let scored: Vec<(f64, bool)> = rows
                .iter()
                .filter_map(|r| {
                    r.prediction(&config.name)
                        .map(|p| (p.probability, r.observed == evaluation.positive))
                })
                .collect();

            let curve = roc_curve(&scored);
            let fold_auc = curve.as_deref().map(auc);
            match curve {
                Some(curve) => curves.push(curve),
                None => {
                    tracing::warn!(fold, config = %config.name, "Held-out fold has one class, AUC skipped");
                    notes.push(format!("{}: fold {fold} has a single class, no AUC", config.name));
                }
            }

            errors.push(error);
            if let Some(a) = fold_auc {
                aucs.push(a);
            }
            fold_scores.push(FoldScore {
                fold,
                config: config.name.clone(),
                scored: scored.len(),
                error,
                auc: fold_auc,
            });
        }

        let folds_failed = evaluation
            .failures
            .iter()
            .filter(|f| f.config == config.name)
            .count();

        summaries.push(ConfigSummary {
            config: config.name.clone(),
            trees: config.trees,
            folds_scored: errors.len(),
            folds_failed,
            mean_error: mean(&errors),
            mean_auc: mean(&aucs),
            auc_sd: sample_sd(&aucs),
            roc: vertical_average(&curves, ROC_GRID),
        });
    }

    let comparison = compare_configs(&fold_scores, configs, &mut notes);

    for s in &summaries {
        tracing::info!(
            config = %s.config,
            folds = s.folds_scored,
            failed = s.folds_failed,
            mean_error = ?s.mean_error,
            mean_auc = ?s.mean_auc,
            "Config summarised"
        );
    }

    Aggregate {
        fold_scores,
        configs: summaries,
        comparison,
        notes,
    }
}

/// Fit `error ~ config` over the fold scores with the first config as the
/// intercept and one indicator per remaining config that has scores.
fn compare_configs(
    fold_scores: &[FoldScore],
    configs: &[ClassifierConfig],
    notes: &mut Vec<String>,
) -> Option<ConfigComparison> {
    let baseline = configs.first()?;
    let others: Vec<&ClassifierConfig> = configs[1..]
        .iter()
        .filter(|c| fold_scores.iter().any(|s| s.config == c.name))
        .collect();

    if others.is_empty() || !fold_scores.iter().any(|s| s.config == baseline.name) {
        notes.push("comparison needs scored folds for at least two configs".into());
        return None;
    }

    let rows: Vec<&FoldScore> = fold_scores
        .iter()
        .filter(|s| s.config == baseline.name || others.iter().any(|c| c.name == s.config))
        .collect();

    let p = others.len() + 1;
    let x = DMatrix::from_fn(rows.len(), p, |i, j| {
        if j == 0 || rows[i].config == others[j - 1].name {
            1.0
        } else {
            0.0
        }
    });
    let y = DVector::from_iterator(rows.len(), rows.iter().map(|s| s.error));
    let names: Vec<String> = std::iter::once(INTERCEPT.to_string())
        .chain(others.iter().map(|c| c.name.clone()))
        .collect();

    match fit_ols(&x, &y, &names) {
        Ok(fit) => Some(ConfigComparison {
            baseline: baseline.name.clone(),
            intercept: fit.coefficients[0].estimate,
            effects: fit.coefficients[1..]
                .iter()
                .map(|c| ConfigEffect {
                    config: c.name.clone(),
                    estimate: c.estimate,
                    std_error: c.std_error,
                    t_value: c.t_value,
                    p_value: c.p_value,
                })
                .collect(),
            r_squared: fit.r_squared,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Config comparison could not be fitted");
            notes.push(format!("comparison not fitted: {e}"));
            None
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
