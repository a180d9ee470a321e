//! Live workout numbers: volume, personal records and one-rep-max
//! estimates. The same formulas back the cross-session reports.

use crate::live::LiveExercise;

/// Parses the raw weight text of a set. Empty or malformed text is absent.
pub fn parse_weight(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|w| w.is_finite())
}

/// Parses the raw rep text of a set. Empty or malformed text is absent.
pub fn parse_reps(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Volume of a single set. Each missing factor counts as zero on its own.
pub fn set_volume(weight: Option<f64>, reps: Option<u32>) -> f64 {
    weight.unwrap_or(0.0) * reps.unwrap_or(0) as f64
}

/// Sum of weight × reps over completed sets only.
pub fn total_volume(exercises: &[LiveExercise]) -> f64 {
    exercises
        .iter()
        .flat_map(|ex| ex.sets.iter())
        .filter(|s| s.completed)
        .map(|s| set_volume(parse_weight(&s.weight), parse_reps(&s.reps)))
        .sum()
}

/// Epley estimate. A single rep is the one-rep max itself.
pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps == 1 {
        return weight;
    }
    weight * (1.0 + reps as f64 / 30.0)
}

/// Number of sets the store flagged as personal records.
pub fn personal_record_count(exercises: &[LiveExercise]) -> usize {
    exercises
        .iter()
        .flat_map(|ex| ex.sets.iter())
        .filter(|s| s.is_pr)
        .count()
}

/// Best estimate over completed sets that carry both weight and reps.
pub fn best_one_rep_max<I>(sets: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, Option<u32>, bool)>,
{
    sets.into_iter()
        .filter_map(|(weight, reps, completed)| match (weight, reps, completed) {
            (Some(w), Some(r), true) if w > 0.0 && r > 0 => Some(estimated_one_rep_max(w, r)),
            _ => None,
        })
        .fold(None, |best, rm| match best {
            Some(b) if b >= rm => Some(b),
            _ => Some(rm),
        })
}
