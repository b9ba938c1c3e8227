use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::errors::{AnalysisError, Result};
use crate::models::Dataset;

/// A k-fold partition of `0..n`. Fold indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folds {
    n: usize,
    held_out: Vec<Vec<usize>>,
}

impl Folds {
    pub fn k(&self) -> usize {
        self.held_out.len()
    }

    /// Number of records partitioned.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Test partition of fold `fold` (1..=k), ascending. `None` outside 1..=k.
    pub fn held_out(&self, fold: usize) -> Option<&[usize]> {
        let index = fold.checked_sub(1)?;
        self.held_out.get(index).map(Vec::as_slice)
    }

    /// Training partition of fold `fold`: every index not held out.
    pub fn training(&self, fold: usize) -> Option<Vec<usize>> {
        let mut in_test = vec![false; self.n];
        for &i in self.held_out(fold)? {
            in_test[i] = true;
        }
        Some((0..self.n).filter(|&i| !in_test[i]).collect())
    }

    /// `(fold, held_out)` pairs in fold order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.held_out
            .iter()
            .enumerate()
            .map(|(i, idx)| (i + 1, idx.as_slice()))
    }
}

/// Stratified k-fold split.
///
/// Each outcome's indices are shuffled and dealt round-robin over the folds;
/// the rotation continues from class to class, so fold sizes differ by at
/// most one and each fold carries roughly the overall class mix.
pub fn stratified_folds(dataset: &Dataset, k: usize, seed: u64) -> Result<Folds> {
    let n = dataset.len();
    if k < 2 {
        return Err(AnalysisError::config("folds", k, "must be at least 2"));
    }
    if k > n {
        return Err(AnalysisError::config(
            "folds",
            k,
            format!("cannot exceed the number of records ({n})"),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut held_out = vec![Vec::with_capacity(n / k + 1); k];
    let mut next = 0usize;

    for (_, mut indices) in dataset.indices_by_outcome() {
        indices.shuffle(&mut rng);
        for i in indices {
            held_out[next].push(i);
            next = (next + 1) % k;
        }
    }

    for fold in &mut held_out {
        fold.sort_unstable();
    }

    tracing::debug!(k, n, seed, "Stratified folds built");

    Ok(Folds { n, held_out })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
