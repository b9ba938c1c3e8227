use serde::Serialize;

use crate::models::{Attribute, Dataset, Side};

/// Five-number summary plus mean and sample standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summarise one column; `None` when no value is present.
pub fn summarize(column: impl Into<String>, values: &[Option<f64>]) -> Option<Summary> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);

    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let sd = if present.len() > 1 {
        (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Some(Summary {
        column: column.into(),
        count: present.len(),
        missing: values.len() - present.len(),
        mean,
        sd,
        min: present[0],
        q1: quantile(&present, 0.25),
        median: quantile(&present, 0.5),
        q3: quantile(&present, 0.75),
        max: present[present.len() - 1],
    })
}

/// Linear-interpolation quantile of sorted data (Hyndman–Fan type 7).
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Summaries of every numeric attribute on both sides, skipping empty columns.
pub fn describe(dataset: &Dataset) -> Vec<Summary> {
    let mut summaries = Vec::new();
    for attribute in Attribute::ALL {
        for side in [Side::A, Side::B] {
            let values: Vec<Option<f64>> = dataset.iter().map(|r| r.value(attribute, side)).collect();
            if let Some(summary) = summarize(attribute.column(side), &values) {
                summaries.push(summary);
            }
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_values() {
        let values = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)];
        let s = summarize("x", &values).unwrap();

        assert_eq!(s.count, 4);
        assert_eq!(s.missing, 1);
        assert_eq!(s.mean, 2.5);
        assert!((s.sd - 1.290_994_4).abs() < 1e-6);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q1, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q3, 3.25);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn test_all_missing_is_none() {
        assert!(summarize("x", &[None, None]).is_none());
    }

    #[test]
    fn test_single_value_has_zero_sd() {
        let s = summarize("x", &[Some(7.0)]).unwrap();
        assert_eq!(s.sd, 0.0);
        assert_eq!(s.median, 7.0);
    }
}
