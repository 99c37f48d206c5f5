//! Density threshold classification.

use geotargeting_urban_models::{Classification, DensityStats, FinishRule, Thresholds};

/// Returns `true` if the ring's mean density exceeds the mean threshold
/// or its max density exceeds the max threshold. Both comparisons are
/// strict.
#[must_use]
pub fn exceeds(stats: &DensityStats, thresholds: &Thresholds) -> bool {
    stats.mean > thresholds.mean || stats.max > thresholds.max
}

/// A ring is finished when it exceeds either threshold; otherwise the
/// city keeps growing.
#[must_use]
pub fn classify(stats: &DensityStats, thresholds: &Thresholds) -> Classification {
    classify_with_rule(stats, thresholds, FinishRule::Dense)
}

/// Classifies a ring under an explicit [`FinishRule`].
///
/// [`FinishRule::Sparse`] inverts the decision: growth continues while
/// the ring exceeds a threshold and stops once it no longer does.
#[must_use]
pub fn classify_with_rule(
    stats: &DensityStats,
    thresholds: &Thresholds,
    rule: FinishRule,
) -> Classification {
    let finished = match rule {
        FinishRule::Dense => exceeds(stats, thresholds),
        FinishRule::Sparse => !exceeds(stats, thresholds),
    };

    if finished {
        Classification::Finished
    } else {
        Classification::Continue
    }
}
