//! Gap repair over a column of optional values.
//!
//! The chain is forward-fill, then backward-fill, then linear interpolation by
//! position. After the first two steps only an all-missing column still has gaps,
//! so interpolation matters for callers that run it on its own.

/// Non-finite values become `None`.
pub fn nulled(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| v.is_finite().then_some(*v))
        .collect()
}

/// Propagate the last seen value forward over gaps.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
}

/// Propagate the next seen value backward over gaps.
pub fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}

/// Fill interior gaps on the straight line between their neighbours; trailing
/// gaps hold the last value, leading gaps stay empty.
pub fn interpolate_linear(values: &mut [Option<f64>]) {
    let mut prev: Option<(usize, f64)> = None;
    let mut i = 0;
    while i < values.len() {
        match values[i] {
            Some(x) => {
                prev = Some((i, x));
                i += 1;
            }
            None => {
                let gap_start = i;
                while i < values.len() && values[i].is_none() {
                    i += 1;
                }
                let Some((lo, lo_val)) = prev else { continue };
                match values.get(i).copied().flatten() {
                    Some(hi_val) => {
                        let span = (i - lo) as f64;
                        for (j, slot) in values[gap_start..i].iter_mut().enumerate() {
                            let step = (gap_start + j - lo) as f64;
                            *slot = Some(lo_val + (hi_val - lo_val) * step / span);
                        }
                    }
                    None => {
                        for slot in &mut values[gap_start..i] {
                            *slot = Some(lo_val);
                        }
                    }
                }
            }
        }
    }
}

/// Run the full chain.
pub fn repair(values: &mut [Option<f64>]) {
    forward_fill(values);
    backward_fill(values);
    interpolate_linear(values);
}

/// Mean of the present values, or `None` when nothing is present.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Repair a copy of the column and return its mean.
pub fn filled_mean(values: &[f64]) -> Option<f64> {
    let mut col = nulled(values);
    repair(&mut col);
    mean(&col)
}
