use metrics::counter;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, StringRecord};

use crate::errors::{AnalysisError, Result};
use crate::models::{Attribute, Corner, Dataset, Outcome, Record, Side};

/// Column holding the bout outcome.
pub const RESULT_COLUMN: &str = "result";
const DECISION_COLUMN: &str = "decision";

/// Tokens accepted as an explicit missing value in numeric columns.
const MISSING_TOKENS: [&str; 3] = ["", "NA", "NaN"];

/// Load the bouts file at `path`.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let dataset = read_bouts(file)?;

    tracing::info!(
        path = %path.display(),
        records = dataset.len(),
        "Bouts loaded"
    );

    Ok(dataset)
}

/// Parse bouts from any CSV source with a header row.
///
/// Every row must have the header's column count and every numeric column
/// must be empty, `NA`/`NaN`, or a finite number. Unknown columns (judge
/// scorecards and the like) are ignored.
pub fn read_bouts<R: Read>(source: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        records.push(columns.parse_row(&row)?);
    }

    counter!("records_loaded_total").increment(records.len() as u64);

    Ok(Dataset::new(records))
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

struct ColumnMap {
    numeric: Vec<(Attribute, Side, usize)>,
    stance_a: Option<usize>,
    stance_b: Option<usize>,
    result: usize,
    decision: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

        let require = |name: &str| -> Result<usize> {
            index
                .get(name)
                .copied()
                .ok_or_else(|| AnalysisError::schema(None, name, "missing required column"))
        };

        let mut numeric = Vec::with_capacity(Attribute::ALL.len() * 2);
        for attribute in Attribute::ALL {
            for side in [Side::A, Side::B] {
                numeric.push((attribute, side, require(&attribute.column(side))?));
            }
        }

        Ok(Self {
            numeric,
            stance_a: index.get("stance_A").copied(),
            stance_b: index.get("stance_B").copied(),
            result: require(RESULT_COLUMN)?,
            decision: index.get(DECISION_COLUMN).copied(),
        })
    }

    fn parse_row(&self, row: &StringRecord) -> Result<Record> {
        let line = row.position().map(|p| p.line());

        let mut a = Corner {
            stance: text(row, self.stance_a),
            ..Corner::default()
        };
        let mut b = Corner {
            stance: text(row, self.stance_b),
            ..Corner::default()
        };

        for &(attribute, side, idx) in &self.numeric {
            let raw = row.get(idx).unwrap_or("");
            let value = parse_number(raw).map_err(|reason| {
                AnalysisError::schema(line, attribute.column(side), reason)
            })?;
            let corner = match side {
                Side::A => &mut a,
                Side::B => &mut b,
            };
            set_attribute(corner, attribute, value);
        }

        let label = row.get(self.result).unwrap_or("");
        let result = Outcome::from_label(label).ok_or_else(|| {
            AnalysisError::schema(
                line,
                RESULT_COLUMN,
                format!("unknown outcome `{label}` (expected win_A, win_B or draw)"),
            )
        })?;

        let mut record = Record::new(a, b, result);
        record.decision = text(row, self.decision);
        Ok(record)
    }
}

fn parse_number(raw: &str) -> std::result::Result<Option<f64>, String> {
    if MISSING_TOKENS.contains(&raw) {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err(format!("non-finite value `{raw}`")),
        Err(_) => Err(format!("expected a number, found `{raw}`")),
    }
}

fn text(row: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn set_attribute(corner: &mut Corner, attribute: Attribute, value: Option<f64>) {
    let slot = match attribute {
        Attribute::Age => &mut corner.age,
        Attribute::Height => &mut corner.height,
        Attribute::Reach => &mut corner.reach,
        Attribute::Weight => &mut corner.weight,
        Attribute::Won => &mut corner.won,
        Attribute::Lost => &mut corner.lost,
        Attribute::Drawn => &mut corner.drawn,
        Attribute::Kos => &mut corner.kos,
    };
    *slot = value;
}

fn csv_error(err: csv::Error) -> AnalysisError {
    let line = err.position().map(|p| p.line());
    match err.into_kind() {
        ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => AnalysisError::schema(
            line,
            "*",
            format!("expected {expected_len} fields, found {len}"),
        ),
        ErrorKind::Io(source) => AnalysisError::Io {
            path: "<csv input>".into(),
            source,
        },
        ErrorKind::Utf8 { err, .. } => AnalysisError::schema(line, "*", err.to_string()),
        other => AnalysisError::schema(line, "*", format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "age_A,age_B,height_A,height_B,reach_A,reach_B,stance_A,stance_B,weight_A,weight_B,won_A,won_B,lost_A,lost_B,drawn_A,drawn_B,kos_A,kos_B,result,decision,judge1_A,judge1_B";

    fn parse(body: &str) -> Result<Dataset> {
        read_bouts(format!("{HEADER}\n{body}").as_bytes())
    }

    #[test]
    fn test_parses_complete_row() {
        let ds = parse("35,27,175,185,178,179,orthodox,orthodox,160,160,37,49,0,1,0,1,33,34,win_B,UD,110,118\n")
            .expect("row should parse");

        assert_eq!(ds.len(), 1);
        let r = &ds.records()[0];
        assert_eq!(r.a.age, Some(35.0));
        assert_eq!(r.b.height, Some(185.0));
        assert_eq!(r.b.kos, Some(34.0));
        assert_eq!(r.a.stance.as_deref(), Some("orthodox"));
        assert_eq!(r.result, Outcome::WinB);
        assert_eq!(r.decision.as_deref(), Some("UD"));
    }

    #[test]
    fn test_empty_fields_are_missing() {
        let ds = parse("35,,175,,,,,,,,1,2,0,0,0,0,1,1,draw,,,\n").expect("row should parse");
        let r = &ds.records()[0];
        assert_eq!(r.b.age, None);
        assert_eq!(r.a.reach, None);
        assert_eq!(r.a.stance, None);
        assert_eq!(r.result, Outcome::Draw);
    }

    #[test]
    fn test_non_numeric_value_is_schema_error() {
        let err = parse("35,27,tall,185,178,179,,,160,160,1,1,0,0,0,0,1,1,win_A,,,\n")
            .expect_err("non-numeric height must fail");

        match err {
            AnalysisError::Schema { line, column, .. } => {
                assert_eq!(line, Some(2));
                assert_eq!(column, "height_A");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_column_count_is_schema_error() {
        let err = parse("35,27,175\n").expect_err("short row must fail");
        assert!(matches!(err, AnalysisError::Schema { .. }));
    }

    #[test]
    fn test_missing_column_is_reported_by_name() {
        let err = read_bouts("age_A,age_B,result\n30,31,win_A\n".as_bytes())
            .expect_err("missing columns must fail");

        match err {
            AnalysisError::Schema { column, line, .. } => {
                assert_eq!(column, "height_A");
                assert_eq!(line, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_outcome_is_schema_error() {
        let err = parse("35,27,175,185,178,179,,,160,160,1,1,0,0,0,0,1,1,no_contest,,,\n")
            .expect_err("unknown label must fail");

        match err {
            AnalysisError::Schema { column, .. } => assert_eq!(column, RESULT_COLUMN),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
