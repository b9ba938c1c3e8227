use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::formula::DesignMatrix;
use super::tree::DecisionTree;
use super::{Classifier, FitError};
use crate::models::ClassifierConfig;

/// Bagged ensemble of unpruned CART trees.
///
/// Each tree is grown on a bootstrap sample of the training rows, trying
/// `floor(sqrt(p))` features per split unless `max_features` is set. The
/// positive-class probability is the fraction of trees voting positive.
#[derive(Debug, Clone, Default)]
pub struct RandomForest {
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ForestModel {
    trees: Vec<DecisionTree>,
}

impl ForestModel {
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn vote_fraction(&self, row: &[f64]) -> f64 {
        let votes = self.trees.iter().filter(|t| t.predict(row)).count();
        votes as f64 / self.trees.len() as f64
    }
}

impl RandomForest {
    fn features_per_split(&self, cols: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (cols as f64).sqrt().floor() as usize)
            .clamp(1, cols)
    }
}

impl Classifier for RandomForest {
    type Model = ForestModel;

    fn fit(
        &self,
        train: &DesignMatrix,
        config: &ClassifierConfig,
        seed: u64,
    ) -> Result<ForestModel, FitError> {
        if config.trees == 0 {
            return Err(FitError::EmptyEnsemble);
        }
        if train.cols() == 0 {
            return Err(FitError::NoPredictors);
        }
        let n = train.rows();
        if n == 0 {
            return Err(FitError::EmptyTraining);
        }
        match train.positives() {
            0 => return Err(FitError::SingleClass(train.positive().opposite())),
            p if p == n => return Err(FitError::SingleClass(train.positive())),
            _ => {}
        }

        let mtry = self.features_per_split(train.cols());

        // Per-tree seeds are drawn up front so the ensemble does not depend
        // on rayon's scheduling.
        let mut master = ChaCha8Rng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..config.trees).map(|_| master.gen()).collect();

        let trees = seeds
            .into_par_iter()
            .map(|tree_seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::grow(train, bootstrap, mtry, &mut rng)
            })
            .collect();

        Ok(ForestModel { trees })
    }

    fn predict_probability(&self, model: &ForestModel, test: &DesignMatrix) -> Vec<f64> {
        (0..test.rows())
            .map(|i| model.vote_fraction(test.row(i)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
