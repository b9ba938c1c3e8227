//! Model fitting collaborators used by the analysis.
//!
//! The evaluation core only sees the [`Classifier`] trait; [`RandomForest`]
//! is the implementation the driver wires in. Ordinary least squares lives
//! in [`linear`].

pub mod forest;
pub mod formula;
pub mod linear;
pub mod tree;

use thiserror::Error;

use crate::models::{ClassifierConfig, Outcome};

pub use forest::{ForestModel, RandomForest};
pub use formula::{DesignMatrix, Formula, Predictor};
pub use linear::{fit_attributes, fit_ols, Coefficient, LinearFit};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("training partition is empty")]
    EmptyTraining,

    #[error("training partition contains a single class ({0})")]
    SingleClass(Outcome),

    #[error("formula has no predictors")]
    NoPredictors,

    #[error("ensemble size must be at least 1")]
    EmptyEnsemble,

    #[error("missing `{predictor}` at row {row}")]
    MissingValue { row: usize, predictor: String },

    #[error("{observations} observations cannot estimate {parameters} parameters")]
    TooFewObservations { observations: usize, parameters: usize },

    #[error("design matrix is singular")]
    Singular,
}

/// Binary probabilistic classifier.
///
/// `fit` must not depend on state shared with other fits: the evaluator may
/// call it concurrently for different folds.
pub trait Classifier: Sync {
    type Model: Send + Sync;

    fn fit(
        &self,
        train: &DesignMatrix,
        config: &ClassifierConfig,
        seed: u64,
    ) -> Result<Self::Model, FitError>;

    /// Probability of the design's positive class for every row of `test`.
    fn predict_probability(&self, model: &Self::Model, test: &DesignMatrix) -> Vec<f64>;
}
