use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{AnalysisError, Result};
use crate::ingestion::AttributeRange;
use crate::models::{Attribute, ClassifierConfig};

const DEFAULT_DATA_PATH: &str = "data/boxing_matches.csv";

// Plausibility bounds chosen by inspecting the data; override per run.
pub const DEFAULT_AGE_RANGE: AttributeRange = AttributeRange::new(Attribute::Age, 15.0, 50.0);
pub const DEFAULT_HEIGHT_RANGE: AttributeRange = AttributeRange::new(Attribute::Height, 150.0, 225.0);
pub const DEFAULT_REACH_RANGE: AttributeRange = AttributeRange::new(Attribute::Reach, 150.0, 230.0);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub seed: u64,

    // Cross-validation
    pub folds: usize,
    pub sample_per_class: usize,
    pub tree_counts: Vec<usize>,
    pub parallel: bool,

    // Cleaning
    pub age_range: Option<AttributeRange>,
    pub height_range: Option<AttributeRange>,
    pub reach_range: Option<AttributeRange>,
    pub weight_range: Option<AttributeRange>,

    // Output
    pub report_path: Option<PathBuf>,
    pub metrics_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            seed: 42,
            folds: 10,
            sample_per_class: 1000,
            tree_counts: vec![16, 512],
            parallel: true,
            age_range: Some(DEFAULT_AGE_RANGE),
            height_range: Some(DEFAULT_HEIGHT_RANGE),
            reach_range: Some(DEFAULT_REACH_RANGE),
            weight_range: None,
            report_path: None,
            metrics_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            data_path: env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            seed: parse_var("SEED")?.unwrap_or(defaults.seed),
            folds: parse_var("FOLDS")?.unwrap_or(defaults.folds),
            sample_per_class: parse_var("SAMPLE_PER_CLASS")?.unwrap_or(defaults.sample_per_class),
            tree_counts: match env::var("TREE_COUNTS") {
                Ok(raw) => parse_list("TREE_COUNTS", &raw)?,
                Err(_) => defaults.tree_counts,
            },
            parallel: parse_var("PARALLEL")?.unwrap_or(defaults.parallel),
            age_range: range_var("RANGE_AGE", Attribute::Age)?.or(defaults.age_range),
            height_range: range_var("RANGE_HEIGHT", Attribute::Height)?.or(defaults.height_range),
            reach_range: range_var("RANGE_REACH", Attribute::Reach)?.or(defaults.reach_range),
            weight_range: range_var("RANGE_WEIGHT", Attribute::Weight)?.or(defaults.weight_range),
            report_path: env::var("REPORT_PATH").ok().map(PathBuf::from),
            metrics_path: env::var("METRICS_PATH").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent parameters before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.folds < 2 {
            return Err(AnalysisError::config("FOLDS", self.folds, "must be at least 2"));
        }
        if self.sample_per_class == 0 {
            return Err(AnalysisError::config(
                "SAMPLE_PER_CLASS",
                self.sample_per_class,
                "must be at least 1",
            ));
        }
        // two decisive classes are sampled
        if self.folds > self.sample_per_class * 2 {
            return Err(AnalysisError::config(
                "FOLDS",
                self.folds,
                format!(
                    "cannot exceed the balanced sample size ({})",
                    self.sample_per_class * 2
                ),
            ));
        }
        if self.tree_counts.is_empty() {
            return Err(AnalysisError::config("TREE_COUNTS", "", "at least one tree count is required"));
        }
        if let Some(&zero) = self.tree_counts.iter().find(|&&t| t == 0) {
            return Err(AnalysisError::config("TREE_COUNTS", zero, "tree counts must be positive"));
        }
        let mut sorted = self.tree_counts.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.tree_counts.len() {
            return Err(AnalysisError::config(
                "TREE_COUNTS",
                format!("{:?}", self.tree_counts),
                "tree counts must be distinct",
            ));
        }
        for range in self.ranges() {
            if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
                return Err(AnalysisError::config(
                    format!("RANGE_{}", range.attribute.as_str().to_uppercase()),
                    format!("{}..{}", range.min, range.max),
                    "min must not exceed max",
                ));
            }
        }
        Ok(())
    }

    /// Attribute ranges the cleaner enforces.
    pub fn ranges(&self) -> Vec<AttributeRange> {
        [self.age_range, self.height_range, self.reach_range, self.weight_range]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn classifier_configs(&self) -> Vec<ClassifierConfig> {
        self.tree_counts.iter().map(|&t| ClassifierConfig::forest(t)).collect()
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AnalysisError::config(key, &raw, "could not be parsed")),
        Err(_) => Ok(None),
    }
}

fn parse_list(key: &str, raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AnalysisError::config(key, raw, "expected comma-separated integers"))
        })
        .collect()
}

fn range_var(key: &str, attribute: Attribute) -> Result<Option<AttributeRange>> {
    match env::var(key) {
        Ok(raw) => parse_range(key, attribute, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Parse `min..max` (inclusive).
pub fn parse_range(key: &str, attribute: Attribute, raw: &str) -> Result<AttributeRange> {
    let invalid = || AnalysisError::config(key, raw, "expected `min..max`");
    let (lo, hi) = raw.split_once("..").ok_or_else(invalid)?;
    let min: f64 = lo.trim().parse().map_err(|_| invalid())?;
    let max: f64 = hi.trim().parse().map_err(|_| invalid())?;
    Ok(AttributeRange::new(attribute, min, max))
}
