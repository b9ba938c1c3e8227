use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::formula::Predictor;
use super::FitError;
use crate::models::Dataset;
use crate::stats::distribution::student_t_two_sided;

pub const INTERCEPT: &str = "(Intercept)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Ordinary least squares fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearFit {
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub residual_std_error: f64,
    pub df_residual: usize,
    #[serde(skip)]
    pub residuals: Vec<f64>,
    #[serde(skip)]
    pub fitted_values: Vec<f64>,
}

impl LinearFit {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

/// Fit `y = X b` by least squares. `x` must already contain an intercept
/// column if one is wanted; `names` labels the columns of `x`.
///
/// R² is measured around the mean of `y`, which assumes an intercept.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>, names: &[String]) -> Result<LinearFit, FitError> {
    let (n, p) = x.shape();
    if p == 0 {
        return Err(FitError::NoPredictors);
    }
    if n <= p {
        return Err(FitError::TooFewObservations {
            observations: n,
            parameters: p,
        });
    }

    let xt = x.transpose();
    let gram = &xt * x;
    let scale = gram.diagonal().max();
    let cholesky = gram.cholesky().ok_or(FitError::Singular)?;

    // Exactly collinear columns can still factor with a rounding-sized pivot.
    let l = cholesky.l();
    if (0..p).any(|j| l[(j, j)].powi(2) <= scale * 1e-12) {
        return Err(FitError::Singular);
    }

    let beta = cholesky.solve(&(&xt * y));
    let gram_inv = cholesky.inverse();

    let fitted = x * &beta;
    let residuals = y - &fitted;

    let df = n - p;
    let rss = residuals.norm_squared();
    let mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let sigma2 = rss / df as f64;

    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df as f64;

    let coefficients = (0..p)
        .map(|j| {
            let estimate = beta[j];
            let std_error = (sigma2 * gram_inv[(j, j)]).sqrt();
            let t_value = estimate / std_error;
            Coefficient {
                name: names.get(j).cloned().unwrap_or_else(|| format!("x{j}")),
                estimate,
                std_error,
                t_value,
                p_value: student_t_two_sided(t_value, df as f64),
            }
        })
        .collect();

    Ok(LinearFit {
        coefficients,
        r_squared,
        adj_r_squared,
        residual_std_error: sigma2.sqrt(),
        df_residual: df,
        residuals: residuals.iter().copied().collect(),
        fitted_values: fitted.iter().copied().collect(),
    })
}

/// `response ~ predictors` with an intercept over the complete cases of `dataset`.
pub fn fit_attributes(
    dataset: &Dataset,
    response: Predictor,
    predictors: &[Predictor],
) -> Result<LinearFit, FitError> {
    if predictors.is_empty() {
        return Err(FitError::NoPredictors);
    }

    let rows: Vec<(f64, Vec<f64>)> = dataset
        .iter()
        .filter_map(|r| {
            let y = response.extract(r)?;
            let xs = predictors
                .iter()
                .map(|p| p.extract(r))
                .collect::<Option<Vec<f64>>>()?;
            Some((y, xs))
        })
        .collect();

    let n = rows.len();
    let p = predictors.len() + 1;
    let x = DMatrix::from_fn(n, p, |i, j| if j == 0 { 1.0 } else { rows[i].1[j - 1] });
    let y = DVector::from_iterator(n, rows.iter().map(|(y, _)| *y));

    let names: Vec<String> = std::iter::once(INTERCEPT.to_string())
        .chain(predictors.iter().map(Predictor::name))
        .collect();

    let fit = fit_ols(&x, &y, &names)?;

    tracing::info!(
        response = %response,
        predictors = predictors.len(),
        observations = n,
        r_squared = fit.r_squared,
        "Linear model fitted"
    );

    Ok(fit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
