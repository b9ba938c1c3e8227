use crate::models::{Dataset, Difference, Differentials, Outcome, Record, Side};

/// Populate the A − B difference fields for age, height and reach.
///
/// A difference is `None` when either side's value is missing.
pub fn derive_differences(dataset: &Dataset) -> Dataset {
    dataset.map(|record| {
        let mut derived = record.clone();
        derived.diffs = Differentials {
            age: difference(record, Difference::Age),
            height: difference(record, Difference::Height),
            reach: difference(record, Difference::Reach),
        };
        derived
    })
}

fn difference(record: &Record, difference: Difference) -> Option<f64> {
    let attribute = difference.attribute();
    Some(record.value(attribute, Side::A)? - record.value(attribute, Side::B)?)
}

/// Drop draws.
pub fn exclude_draws(dataset: &Dataset) -> Dataset {
    dataset.filter(|r| r.result != Outcome::Draw)
}

/// Prepare a dataset for an "does the advantaged side win" question on
/// `gate`: drops draws and records whose `gate` difference is zero or
/// missing. Expects `derive_differences` to have run.
pub fn exclude_for(dataset: &Dataset, gate: Difference) -> Dataset {
    let prepared = dataset.filter(|r| {
        r.result != Outcome::Draw && matches!(r.diffs.get(gate), Some(d) if d != 0.0)
    });

    tracing::debug!(
        gate = %gate,
        input = dataset.len(),
        kept = prepared.len(),
        "Draw and zero-difference exclusion applied"
    );

    prepared
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
