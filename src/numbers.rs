// NonNan numbers Floating point numbers cannot be sorted because they
// can be Nan.  We introduce a new type of number guaranteed not to be
// an NaN to allow floats to be sorted or the maximum found.

use std::cmp::Ordering;

#[derive(PartialEq, Clone, Copy, Debug)]
pub struct NonNan(f64);

impl NonNan {
    pub fn new(val: f64) -> Option<NonNan> {
        if val.is_nan() {
            None
        } else {
            Some(NonNan(val))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for NonNan {}
impl Ord for NonNan {
    fn cmp(&self, other: &NonNan) -> Ordering {
        // neither side can be NaN so partial_cmp always succeeds
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for NonNan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Largest value in the slice, ignoring NaNs.
pub fn max(x: &[f64]) -> Option<f64> {
    x.iter().filter_map(|&v| NonNan::new(v)).max().map(NonNan::value)
}

/// Smallest value in the slice, ignoring NaNs.
pub fn min(x: &[f64]) -> Option<f64> {
    x.iter().filter_map(|&v| NonNan::new(v)).min().map(NonNan::value)
}

/// Arithmetic mean. Returns `None` for an empty slice.
pub fn mean(x: &[f64]) -> Option<f64> {
    if x.is_empty() {
        None
    } else {
        Some(x.iter().sum::<f64>() / x.len() as f64)
    }
}

/// Half of the peak to peak range of a signal.
pub fn half_range(x: &[f64]) -> Option<f64> {
    match (min(x), max(x)) {
        (Some(lo), Some(hi)) => Some((hi - lo) / 2.0),
        _ => None,
    }
}

/// Linearly rescale values onto [0, 1]. Returns `None` if the values
/// have no spread.
pub fn normalise(x: &[f64]) -> Option<Vec<f64>> {
    let lo = min(x)?;
    let hi = max(x)?;
    let span = hi - lo;
    if span <= 0.0 || !span.is_finite() {
        return None;
    }

    Some(x.iter().map(|v| (v - lo) / span).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrema_skip_nan() {
        let x = [1.0, f64::NAN, -3.0, 2.5];

        assert_eq!(max(&x), Some(2.5));
        assert_eq!(min(&x), Some(-3.0));
        assert_eq!(half_range(&x), Some(2.75));
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert!((mean(&[1.0, 2.0, 6.0]).unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn normalise_flat_signal_is_none() {
        assert!(normalise(&[2.0, 2.0, 2.0]).is_none());

        let n = normalise(&[10.0, 15.0, 20.0]).unwrap();
        assert_eq!(n, vec![0.0, 0.5, 1.0]);
    }
}
