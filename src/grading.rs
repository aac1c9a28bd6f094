use std::collections::BTreeMap;

use crate::config::Thresholds;
use crate::models::Letter;

/// Weighted mean over assessments `1..=weights.len()`.
///
/// An assessment without a recorded score counts as zero in the numerator
/// while its weight still lands in the denominator. A zero weight sum
/// yields a non-finite value.
pub fn weighted_average(scores: &BTreeMap<u32, f64>, weights: &[f64]) -> f64 {
    let weight_sum: f64 = weights.iter().sum();
    let weighted: f64 = (1u32..)
        .zip(weights.iter())
        .map(|(index, weight)| scores.get(&index).copied().unwrap_or(0.0) * weight)
        .sum();
    weighted / weight_sum
}

/// Maps an average onto a letter. Bands are closed at their lower bound.
pub fn letter_for(average: f64, thresholds: &Thresholds) -> Letter {
    if average < thresholds.min_d {
        Letter::F
    } else if average < thresholds.min_c {
        Letter::D
    } else if average < thresholds.min_b {
        Letter::C
    } else if average < thresholds.min_a {
        Letter::B
    } else {
        Letter::A
    }
}

pub fn final_letter(
    scores: &BTreeMap<u32, f64>,
    attendance_pct: f64,
    weights: &[f64],
    thresholds: &Thresholds,
    min_attendance_pct: f64,
) -> Letter {
    if attendance_pct < min_attendance_pct || scores.is_empty() {
        return Letter::O;
    }
    letter_for(weighted_average(scores, weights), thresholds)
}
