use rand::seq::index;
use rand::Rng;

use super::formula::DesignMatrix;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        positive: bool,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Unpruned CART classification tree using Gini impurity.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Best split found for one node.
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl DecisionTree {
    /// Grow a tree on `rows` of `data` (duplicates allowed, as in a bootstrap
    /// sample), trying `max_features` random features at every node.
    ///
    /// Nodes stop splitting when pure or when none of the sampled features
    /// reduces impurity. Leaves vote for their majority class; ties are
    /// broken with `rng`.
    pub fn grow<R: Rng>(data: &DesignMatrix, rows: Vec<usize>, max_features: usize, rng: &mut R) -> Self {
        let mut nodes = vec![Node::Leaf { positive: false }];
        let mut pending = vec![(0usize, rows)];
        let max_features = max_features.clamp(1, data.cols().max(1));

        while let Some((slot, rows)) = pending.pop() {
            let positives = rows.iter().filter(|&&r| data.label(r)).count();
            let negatives = rows.len() - positives;

            let split = if positives == 0 || negatives == 0 {
                None
            } else {
                best_split(data, &rows, positives, max_features, rng)
            };

            let Some(split) = split else {
                let positive = match positives.cmp(&negatives) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Less => false,
                    std::cmp::Ordering::Equal => rng.gen_bool(0.5),
                };
                nodes[slot] = Node::Leaf { positive };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&r| data.value(r, split.feature) <= split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { positive: false });
            let right = nodes.len();
            nodes.push(Node::Leaf { positive: false });

            nodes[slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            pending.push((left, left_rows));
            pending.push((right, right_rows));
        }

        Self { nodes }
    }

    /// Class vote for one feature row.
    pub fn predict(&self, row: &[f64]) -> bool {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { positive } => return *positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Search `max_features` randomly chosen features for the split that
/// maximises `sum(count_c^2) / n` over both children (equivalent to the
/// largest Gini decrease). Returns `None` if nothing beats the parent.
fn best_split<R: Rng>(
    data: &DesignMatrix,
    rows: &[usize],
    positives: usize,
    max_features: usize,
    rng: &mut R,
) -> Option<Split> {
    let n = rows.len() as f64;
    let pos = positives as f64;
    let neg = n - pos;
    let parent = (pos * pos + neg * neg) / n;

    let mut best: Option<Split> = None;
    let mut column: Vec<(f64, bool)> = Vec::with_capacity(rows.len());

    for feature in index::sample(rng, data.cols(), max_features).iter() {
        column.clear();
        column.extend(rows.iter().map(|&r| (data.value(r, feature), data.label(r))));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (mut left_pos, mut left_n) = (0.0, 0.0);
        for i in 0..column.len() - 1 {
            left_n += 1.0;
            if column[i].1 {
                left_pos += 1.0;
            }
            if column[i].0 == column[i + 1].0 {
                continue;
            }

            let left_neg = left_n - left_pos;
            let right_n = n - left_n;
            let right_pos = pos - left_pos;
            let right_neg = right_n - right_pos;
            let score = (left_pos * left_pos + left_neg * left_neg) / left_n
                + (right_pos * right_pos + right_neg * right_neg) / right_n;

            if score > parent + 1e-12 && best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Split {
                    feature,
                    threshold: (column[i].0 + column[i + 1].0) / 2.0,
                    score,
                });
            }
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
