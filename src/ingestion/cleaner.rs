use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::models::{Attribute, Dataset, Record, Side};

/// Inclusive plausibility bounds for one attribute, applied to both corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeRange {
    pub attribute: Attribute,
    pub min: f64,
    pub max: f64,
}

impl AttributeRange {
    pub const fn new(attribute: Attribute, min: f64, max: f64) -> Self {
        Self { attribute, min, max }
    }

    /// Missing values never satisfy a range.
    pub fn contains(&self, value: Option<f64>) -> bool {
        matches!(value, Some(v) if v >= self.min && v <= self.max)
    }

    pub fn admits(&self, record: &Record) -> bool {
        self.contains(record.value(self.attribute, Side::A))
            && self.contains(record.value(self.attribute, Side::B))
    }
}

/// Keep only records whose tracked attributes are present and in range on
/// both sides. No imputation: a missing value drops the record.
pub fn clean(dataset: &Dataset, ranges: &[AttributeRange]) -> Dataset {
    let cleaned = dataset.filter(|record| ranges.iter().all(|range| range.admits(record)));

    let dropped = dataset.len() - cleaned.len();
    counter!("records_rejected_total").increment(dropped as u64);

    if cleaned.is_empty() && !dataset.is_empty() {
        tracing::warn!(
            input = dataset.len(),
            ranges = ranges.len(),
            "Range filter rejected every record"
        );
    } else {
        tracing::info!(
            input = dataset.len(),
            kept = cleaned.len(),
            dropped,
            "Range filter applied"
        );
    }

    cleaned
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
