use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AnalysisError, Result};
use crate::evaluation::Aggregate;
use crate::ingestion::AttributeRange;
use crate::learning::LinearFit;
use crate::models::{FitFailureNote, Outcome};
use crate::stats::{AdvantageTest, Summary};

/// Parameters a run was started with.
#[derive(Debug, Clone, Serialize)]
pub struct RunParameters {
    pub data_path: String,
    pub seed: u64,
    pub folds: usize,
    pub sample_per_class: usize,
    pub tree_counts: Vec<usize>,
    pub parallel: bool,
    pub ranges: Vec<AttributeRange>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RecordCounts {
    pub loaded: usize,
    pub cleaned: usize,
    pub decisive: usize,
    pub complete_cases: usize,
    pub balanced: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Regression {
    pub model: String,
    pub observations: usize,
    pub fit: LinearFit,
}

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub formula: String,
    pub positive: Outcome,
    pub per_class: usize,
    pub k: usize,
    pub fold_sizes: Vec<usize>,
    pub failures: Vec<FitFailureNote>,
    pub metrics: Aggregate,
}

/// A stage that could not run, and why. Other stages still report.
#[derive(Debug, Clone, Serialize)]
pub struct BranchError {
    pub branch: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub parameters: RunParameters,
    pub records: RecordCounts,
    pub summaries: Vec<Summary>,
    pub hypotheses: Vec<AdvantageTest>,
    pub regression: Option<Regression>,
    pub classification: Option<Classification>,
    pub branch_errors: Vec<BranchError>,
}

impl RunReport {
    pub fn new(parameters: RunParameters) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            parameters,
            records: RecordCounts::default(),
            summaries: Vec::new(),
            hypotheses: Vec::new(),
            regression: None,
            classification: None,
            branch_errors: Vec::new(),
        }
    }

    pub fn branch_failed(&mut self, branch: &str, error: &AnalysisError) {
        tracing::error!(branch, error = %error, "Analysis branch failed");
        self.branch_errors.push(BranchError {
            branch: branch.to_string(),
            error: error.to_string(),
        });
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }

    /// Pretty JSON to `path`, or stdout when `None`.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let label = path.map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string());
        let io_error = |source: io::Error| AnalysisError::Io {
            path: label.clone(),
            source,
        };

        match path {
            Some(path) => {
                let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
                self.write_json(&mut writer).map_err(|e| io_error(e.into()))?;
                writer.flush().map_err(io_error)?;
            }
            None => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                self.write_json(&mut lock).map_err(|e| io_error(e.into()))?;
                writeln!(lock).map_err(io_error)?;
            }
        }

        tracing::info!(run_id = %self.run_id, destination = %label, "Report written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters() -> RunParameters {
        RunParameters {
            data_path: "bouts.csv".into(),
            seed: 1,
            folds: 5,
            sample_per_class: 10,
            tree_counts: vec![4],
            parallel: false,
            ranges: Vec::new(),
        }
    }

    #[test]
    fn test_report_serialises_branch_errors() {
        let mut report = RunReport::new(parameters());
        report.branch_failed(
            "classification",
            &AnalysisError::RangeExhaustion {
                class: Outcome::WinB,
                required: 10,
                available: 3,
            },
        );

        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["parameters"]["folds"], 5);
        assert_eq!(json["branch_errors"][0]["branch"], "classification");
        assert!(json["branch_errors"][0]["error"]
            .as_str()
            .unwrap()
            .contains("win_B"));
        assert!(json["classification"].is_null());
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        RunReport::new(parameters()).save(Some(&path)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["parameters"]["data_path"], "bouts.csv");
    }

    #[test]
    fn test_save_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        assert!(matches!(
            RunReport::new(parameters()).save(Some(&path)),
            Err(AnalysisError::Io { .. })
        ));
    }
}
