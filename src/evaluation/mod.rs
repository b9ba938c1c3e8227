pub mod aggregator;
pub mod evaluator;
pub mod roc;

pub use aggregator::{aggregate, error_rate, Aggregate, ConfigComparison, ConfigEffect, ConfigSummary, FoldScore};
pub use evaluator::{evaluate, Evaluation, EvaluatorOptions};
pub use roc::{auc, roc_curve, vertical_average, RocPoint};
