use serde::Serialize;
use std::fmt;

use super::FitError;
use crate::models::{Attribute, Dataset, Difference, Outcome, Record, Side};

/// A predictor column drawn from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Predictor {
    Value(Attribute, Side),
    Diff(Difference),
}

impl Predictor {
    pub fn extract(&self, record: &Record) -> Option<f64> {
        match *self {
            Predictor::Value(attribute, side) => record.value(attribute, side),
            Predictor::Diff(difference) => record.diffs.get(difference),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Predictor::Value(attribute, side) => attribute.column(*side),
            Predictor::Diff(difference) => difference.to_string(),
        }
    }
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// `label ~ predictors`, with the label reduced to "is `positive`".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formula {
    pub predictors: Vec<Predictor>,
    pub positive: Outcome,
}

impl Formula {
    pub fn new(predictors: Vec<Predictor>, positive: Outcome) -> Self {
        Self {
            predictors,
            positive,
        }
    }

    /// Every per-side attribute of both corners, predicting a B win.
    pub fn bout_outcome() -> Self {
        let predictors = Attribute::ALL
            .iter()
            .flat_map(|&a| [Predictor::Value(a, Side::A), Predictor::Value(a, Side::B)])
            .collect();
        Self::new(predictors, Outcome::WinB)
    }

    /// Records with every predictor present.
    pub fn complete_cases(&self, dataset: &Dataset) -> Dataset {
        dataset.filter(|r| self.predictors.iter().all(|p| p.extract(r).is_some()))
    }

    pub fn design(&self, dataset: &Dataset) -> Result<DesignMatrix, FitError> {
        if self.predictors.is_empty() {
            return Err(FitError::NoPredictors);
        }

        let cols = self.predictors.len();
        let mut values = Vec::with_capacity(dataset.len() * cols);
        let mut labels = Vec::with_capacity(dataset.len());

        for (row, record) in dataset.iter().enumerate() {
            for predictor in &self.predictors {
                let value = predictor.extract(record).ok_or_else(|| FitError::MissingValue {
                    row,
                    predictor: predictor.name(),
                })?;
                values.push(value);
            }
            labels.push(record.result == self.positive);
        }

        Ok(DesignMatrix {
            values,
            labels,
            cols,
            positive: self.positive,
        })
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.predictors.iter().map(Predictor::name).collect();
        write!(f, "[{}] ~ {}", self.positive, names.join(" + "))
    }
}

// ---------------------------------------------------------------------------
// DesignMatrix
// ---------------------------------------------------------------------------

/// Dense row-major predictors with a binary label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    values: Vec<f64>,
    labels: Vec<bool>,
    cols: usize,
    positive: Outcome,
}

impl DesignMatrix {
    pub fn rows(&self) -> usize {
        self.labels.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn positive(&self) -> Outcome {
        self.positive
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn label(&self, row: usize) -> bool {
        self.labels[row]
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }

    /// New matrix holding `rows` in the given order.
    pub fn select(&self, rows: &[usize]) -> DesignMatrix {
        let mut values = Vec::with_capacity(rows.len() * self.cols);
        let mut labels = Vec::with_capacity(rows.len());
        for &i in rows {
            values.extend_from_slice(self.row(i));
            labels.push(self.labels[i]);
        }
        DesignMatrix {
            values,
            labels,
            cols: self.cols,
            positive: self.positive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Corner;

    fn record(age_a: Option<f64>, age_b: f64, result: Outcome) -> Record {
        Record::new(
            Corner {
                age: age_a,
                ..Corner::default()
            },
            Corner {
                age: Some(age_b),
                ..Corner::default()
            },
            result,
        )
    }

    fn ages() -> Formula {
        Formula::new(
            vec![
                Predictor::Value(Attribute::Age, Side::A),
                Predictor::Value(Attribute::Age, Side::B),
            ],
            Outcome::WinB,
        )
    }

    #[test]
    fn test_design_rows_and_labels() {
        let ds = Dataset::new(vec![
            record(Some(30.0), 25.0, Outcome::WinA),
            record(Some(22.0), 35.0, Outcome::WinB),
        ]);
        let m = ages().design(&ds).unwrap();

        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.row(1), &[22.0, 35.0]);
        assert_eq!(m.labels(), &[false, true]);
        assert_eq!(m.positives(), 1);
    }

    #[test]
    fn test_missing_predictor_is_reported() {
        let ds = Dataset::new(vec![record(None, 25.0, Outcome::WinA)]);
        let err = ages().design(&ds).unwrap_err();
        assert_eq!(
            err,
            FitError::MissingValue {
                row: 0,
                predictor: "age_A".into()
            }
        );
        assert!(ages().complete_cases(&ds).is_empty());
    }

    #[test]
    fn test_select_reorders_rows() {
        let ds = Dataset::new(vec![
            record(Some(1.0), 2.0, Outcome::WinA),
            record(Some(3.0), 4.0, Outcome::WinB),
        ]);
        let m = ages().design(&ds).unwrap().select(&[1, 0, 1]);
        assert_eq!(m.rows(), 3);
        assert_eq!(m.row(0), &[3.0, 4.0]);
        assert_eq!(m.labels(), &[true, false, true]);
    }

    #[test]
    fn test_bout_outcome_formula_covers_both_corners() {
        let f = Formula::bout_outcome();
        assert_eq!(f.predictors.len(), 16);
        assert_eq!(f.positive, Outcome::WinB);
        assert!(f.to_string().starts_with("[win_B] ~ age_A + age_B"));
    }
}
