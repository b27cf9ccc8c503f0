//! Baseline-100 rescaling.
//!
//! The base is the value of the bucket that starts at the baseline bucket start,
//! or the first bucket when the baseline is not in the series. A base that is
//! missing, zero or non-finite is replaced with 100, which leaves the series
//! unscaled instead of producing infinities.

use chrono::{DateTime, Utc};

/// Position of the base bucket: the baseline bucket if present, else the first.
pub fn base_position(starts: &[DateTime<Utc>], baseline_start: DateTime<Utc>) -> Option<usize> {
    if starts.is_empty() {
        return None;
    }
    Some(starts.iter().position(|s| *s == baseline_start).unwrap_or(0))
}

/// Rescale `values` in place so the base bucket equals 100.
///
/// `starts[i]` is the bucket start of `values[i]`. Returns the base value that
/// was divided out (100 when the observed base was unusable).
pub fn rebase_to_100(
    starts: &[DateTime<Utc>],
    values: &mut [f64],
    baseline_start: DateTime<Utc>,
) -> f64 {
    let Some(pos) = base_position(starts, baseline_start) else {
        return 100.0;
    };
    let base = values
        .get(pos)
        .copied()
        .filter(|b| b.is_finite() && *b != 0.0)
        .unwrap_or(100.0);
    for v in values.iter_mut() {
        *v = *v / base * 100.0;
    }
    base
}
