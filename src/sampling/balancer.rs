use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::errors::{AnalysisError, Result};
use crate::models::{Dataset, Outcome};

/// Draw exactly `per_class` records from each class in `classes`, uniformly
/// without replacement, and concatenate them in `classes` order.
///
/// Fails with `RangeExhaustion` if any listed class has fewer than
/// `per_class` records; never returns a short sample.
pub fn balance(dataset: &Dataset, classes: &[Outcome], per_class: usize, seed: u64) -> Result<Dataset> {
    if per_class == 0 {
        return Err(AnalysisError::config("sample_per_class", per_class, "must be at least 1"));
    }
    if classes.is_empty() {
        return Err(AnalysisError::config("classes", "[]", "at least one class is required"));
    }

    let groups = dataset.indices_by_outcome();

    // Check every class before drawing so the error names the first short class.
    for &class in classes {
        let available = groups.get(&class).map_or(0, Vec::len);
        if available < per_class {
            return Err(AnalysisError::RangeExhaustion {
                class,
                required: per_class,
                available,
            });
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut selected = Vec::with_capacity(per_class * classes.len());

    for class in classes {
        let pool = &groups[class];
        let picks = rand::seq::index::sample(&mut rng, pool.len(), per_class);
        selected.extend(picks.iter().map(|i| pool[i]));
    }

    let sample = dataset.subset(&selected);

    tracing::info!(
        classes = classes.len(),
        per_class,
        total = sample.len(),
        seed,
        "Class-balanced sample drawn"
    );

    Ok(sample)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Corner, Record};
    use proptest::prelude::*;

    /// Records tagged with their position through `age_A` so samples can be compared.
    fn skewed(wins_a: usize, wins_b: usize) -> Dataset {
        let results = std::iter::repeat(Outcome::WinA)
            .take(wins_a)
            .chain(std::iter::repeat(Outcome::WinB).take(wins_b));
        results
            .enumerate()
            .map(|(i, result)| {
                Record::new(
                    Corner {
                        age: Some(i as f64),
                        ..Corner::default()
                    },
                    Corner::default(),
                    result,
                )
            })
            .collect()
    }

    const DECISIVE: [Outcome; 2] = [Outcome::WinA, Outcome::WinB];

    #[test]
    fn test_balanced_sample_has_n_per_class() {
        let ds = skewed(300, 40);
        let sample = balance(&ds, &DECISIVE, 25, 7).expect("enough records");

        assert_eq!(sample.len(), 50);
        let counts = sample.class_counts();
        assert_eq!(counts[&Outcome::WinA], 25);
        assert_eq!(counts[&Outcome::WinB], 25);
    }

    #[test]
    fn test_no_replacement() {
        let ds = skewed(30, 30);
        let sample = balance(&ds, &DECISIVE, 30, 1).expect("exact class size");
        let mut ages: Vec<i64> = sample.iter().map(|r| r.a.age.unwrap() as i64).collect();
        ages.sort_unstable();
        ages.dedup();
        assert_eq!(ages.len(), 60);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let ds = skewed(200, 200);
        let first = balance(&ds, &DECISIVE, 50, 2023).unwrap();
        let second = balance(&ds, &DECISIVE, 50, 2023).unwrap();
        assert_eq!(first, second);

        let other = balance(&ds, &DECISIVE, 50, 2024).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_short_class_is_range_exhaustion() {
        let ds = skewed(100, 10);
        let err = balance(&ds, &DECISIVE, 20, 0).expect_err("win_B has only 10");

        match err {
            AnalysisError::RangeExhaustion {
                class,
                required,
                available,
            } => {
                assert_eq!(class, Outcome::WinB);
                assert_eq!(required, 20);
                assert_eq!(available, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_single_class_dataset_fails() {
        let ds = skewed(500, 0);
        let err = balance(&ds, &DECISIVE, 10, 0).expect_err("win_B is absent");
        assert!(matches!(
            err,
            AnalysisError::RangeExhaustion {
                class: Outcome::WinB,
                available: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_sample_size_is_configuration_error() {
        let ds = skewed(5, 5);
        assert!(matches!(
            balance(&ds, &DECISIVE, 0, 0),
            Err(AnalysisError::Configuration { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_size_and_determinism(a in 1usize..80, b in 1usize..80, seed in any::<u64>()) {
            let ds = skewed(a, b);
            let n = a.min(b);
            let first = balance(&ds, &DECISIVE, n, seed).unwrap();
            prop_assert_eq!(first.len(), n * 2);
            prop_assert_eq!(first, balance(&ds, &DECISIVE, n, seed).unwrap());
        }
    }
}
