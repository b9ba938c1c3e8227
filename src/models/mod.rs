pub mod dataset;
pub mod prediction;
pub mod record;

pub use dataset::Dataset;
pub use prediction::{
    ClassifierConfig, ConfigPrediction, FitFailureNote, PredictionRecord, DECISION_THRESHOLD,
};
pub use record::{Attribute, Corner, Difference, Differentials, Outcome, Record, Side};
