use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    /// Scores `>= threshold` are called positive at this point.
    pub threshold: f64,
}

/// Empirical ROC curve of `(score, is_positive)` pairs.
///
/// Starts at (0, 0) and ends at (1, 1); tied scores form a single point.
/// `None` unless both classes are present.
pub fn roc_curve(scored: &[(f64, bool)]) -> Option<Vec<RocPoint>> {
    let positives = scored.iter().filter(|(_, p)| *p).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut sorted = scored.to_vec();
    sorted.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut curve = Vec::with_capacity(sorted.len() + 1);
    curve.push(RocPoint {
        fpr: 0.0,
        tpr: 0.0,
        threshold: f64::INFINITY,
    });

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < sorted.len() {
        let threshold = sorted[i].0;
        while i < sorted.len() && sorted[i].0 == threshold {
            if sorted[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        curve.push(RocPoint {
            fpr: fp as f64 / negatives as f64,
            tpr: tp as f64 / positives as f64,
            threshold,
        });
    }

    Some(curve)
}

/// Trapezoidal area under a curve ordered by increasing FPR.
pub fn auc(curve: &[RocPoint]) -> f64 {
    curve
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

/// Vertical average of several curves: mean TPR at `grid` evenly spaced FPR
/// values in [0, 1], interpolating linearly within each curve.
///
/// Used to draw a single representative curve. Scalar AUC is the mean of
/// the per-fold AUCs, not the area under this curve.
pub fn vertical_average(curves: &[Vec<RocPoint>], grid: usize) -> Vec<(f64, f64)> {
    if curves.is_empty() || grid < 2 {
        return Vec::new();
    }

    (0..grid)
        .map(|g| {
            let fpr = g as f64 / (grid - 1) as f64;
            let mean_tpr =
                curves.iter().map(|c| tpr_at(c, fpr)).sum::<f64>() / curves.len() as f64;
            (fpr, mean_tpr)
        })
        .collect()
}

fn tpr_at(curve: &[RocPoint], fpr: f64) -> f64 {
    // highest TPR reached at exactly this FPR, else interpolate the segment
    let mut at = None;
    for w in curve.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if hi.fpr == fpr {
            at = Some(hi.tpr);
        } else if lo.fpr <= fpr && fpr < hi.fpr {
            let t = (fpr - lo.fpr) / (hi.fpr - lo.fpr);
            return at.unwrap_or(lo.tpr + t * (hi.tpr - lo.tpr));
        }
    }
    at.unwrap_or(if fpr <= 0.0 { 0.0 } else { 1.0 })
}
