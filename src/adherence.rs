use chrono::Duration;

use crate::models::{AdherenceScore, MacroBundle, Nutrient, NutrientScore, Target, TargetsSet};

pub fn one_day() -> Duration {
    Duration::hours(24)
}

// Bounds are per 24 hours.
fn scale_factor(duration: Duration) -> f64 {
    let hours = duration.num_seconds() as f64 / 3600.0;
    (hours / 24.0).max(0.01)
}

pub fn score_nutrient(value: Option<f64>, target: &Target, duration: Duration) -> Option<f64> {
    if !target.enabled || !target.is_bounded() {
        return None;
    }
    let value = value?;
    let factor = scale_factor(duration);
    let min = target.min.map(|m| m * factor);
    let max = target.max.map(|m| m * factor);

    if let Some(min) = min.filter(|min| value < *min) {
        let span = if min > 0.0 { min } else { 1.0 };
        return Some((1.0 - (min - value) / span).clamp(0.0, 1.0));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        let span = if max > 0.0 { max } else { 1.0 };
        return Some((1.0 - (value - max) / span).clamp(0.0, 1.0));
    }
    Some(1.0)
}

pub fn score(bundle: &MacroBundle, targets: &TargetsSet, duration: Duration) -> AdherenceScore {
    let scores: Vec<NutrientScore> = Nutrient::TARGETED
        .iter()
        .filter_map(|nutrient| {
            let target = targets.get(*nutrient)?;
            score_nutrient(bundle.get(*nutrient), target, duration).map(|score| NutrientScore {
                nutrient: *nutrient,
                score,
            })
        })
        .collect();

    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
    };

    AdherenceScore { scores, overall }
}

/// Fraction of the target reached: against the upper bound when there is
/// one, otherwise against the lower bound.
pub fn progress(value: Option<f64>, target: &Target, duration: Duration) -> Option<f64> {
    if !target.enabled {
        return None;
    }
    let value = value?;
    let reference = target.max.or(target.min)? * scale_factor(duration);
    if reference == 0.0 {
        return None;
    }
    Some(value / reference)
}
