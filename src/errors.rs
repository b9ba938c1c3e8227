use crate::learning::FitError;
use crate::models::Outcome;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("schema error{}: column `{column}`: {reason}", line_suffix(.line))]
    Schema {
        line: Option<u64>,
        column: String,
        reason: String,
    },

    #[error("not enough `{class}` records: required {required}, available {available}")]
    RangeExhaustion {
        class: Outcome,
        required: usize,
        available: usize,
    },

    #[error("fit failed for {model}: {source}")]
    FitFailure {
        model: String,
        #[source]
        source: FitError,
    },

    #[error("invalid configuration `{parameter}` = {value}: {constraint}")]
    Configuration {
        parameter: String,
        value: String,
        constraint: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub fn config(
        parameter: impl Into<String>,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        AnalysisError::Configuration {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    pub fn schema(line: Option<u64>, column: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::Schema {
            line,
            column: column.into(),
            reason: reason.into(),
        }
    }
}

fn line_suffix(line: &Option<u64>) -> String {
    match line {
        Some(l) => format!(" at line {l}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message_names_line_and_column() {
        let err = AnalysisError::schema(Some(12), "height_A", "invalid float literal");
        assert_eq!(
            err.to_string(),
            "schema error at line 12: column `height_A`: invalid float literal"
        );
    }

    #[test]
    fn test_schema_message_without_line() {
        let err = AnalysisError::schema(None, "result", "missing required column");
        assert_eq!(
            err.to_string(),
            "schema error: column `result`: missing required column"
        );
    }

    #[test]
    fn test_range_exhaustion_message() {
        let err = AnalysisError::RangeExhaustion {
            class: Outcome::WinB,
            required: 1000,
            available: 12,
        };
        assert_eq!(
            err.to_string(),
            "not enough `win_B` records: required 1000, available 12"
        );
    }

    #[test]
    fn test_configuration_message() {
        let err = AnalysisError::config("folds", 1, "must be at least 2");
        assert_eq!(
            err.to_string(),
            "invalid configuration `folds` = 1: must be at least 2"
        );
    }
}
