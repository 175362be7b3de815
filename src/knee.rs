//! Knee (elbow) detection with the Kneedle algorithm.
//!
//! Satopaa, Albrecht, Irwin and Raghavan, "Finding a 'Kneedle' in a
//! Haystack: Detecting Knee Points in System Behavior", 2011.
//!
//! Both axes are normalised onto [0, 1] and the curve is turned so the
//! knee becomes a maximum of the difference between y and x. The first
//! maximum whose difference curve then drops below its threshold is the
//! knee.

use log::debug;

use crate::numbers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Concave,
    Convex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// A detected knee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knee {
    /// Position in the input series.
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct KneeLocator {
    /// Larger values wait for a more pronounced drop before calling a
    /// knee.
    pub sensitivity: f64,
    pub curve: Curve,
    pub direction: Direction,
}

impl Default for KneeLocator {
    fn default() -> Self {
        KneeLocator {
            sensitivity: 1.0,
            curve: Curve::Concave,
            direction: Direction::Decreasing,
        }
    }
}

impl KneeLocator {
    pub fn new(sensitivity: f64, curve: Curve, direction: Direction) -> Self {
        KneeLocator {
            sensitivity,
            curve,
            direction,
        }
    }

    /// Map the normalised y values so the knee is a maximum of y - x.
    fn transform(&self, mut y: Vec<f64>) -> Vec<f64> {
        let top = numbers::max(&y).unwrap_or(1.0);
        match (self.direction, self.curve) {
            (Direction::Decreasing, Curve::Concave) => y.reverse(),
            (Direction::Decreasing, Curve::Convex) => y.iter_mut().for_each(|v| *v = top - *v),
            (Direction::Increasing, Curve::Convex) => {
                y.iter_mut().for_each(|v| *v = top - *v);
                y.reverse();
            }
            (Direction::Increasing, Curve::Concave) => (),
        }
        y
    }

    /// The first knee of the curve, or `None` if it has none. The
    /// series needs at least three points and some spread in both axes.
    pub fn locate(&self, x: &[f64], y: &[f64]) -> Option<Knee> {
        let n = x.len();
        if n < 3 || y.len() != n {
            return None;
        }

        let x_norm = numbers::normalise(x)?;
        let y_norm = self.transform(numbers::normalise(y)?);
        let diff: Vec<f64> = y_norm.iter().zip(&x_norm).map(|(yn, xn)| yn - xn).collect();

        let maxima = extrema(&diff, |a, b| a >= b);
        let minima = extrema(&diff, |a, b| a <= b);
        let first_max = *maxima.first()?;

        let mean_step = x_norm.windows(2).map(|w| w[1] - w[0]).sum::<f64>() / (n - 1) as f64;
        let drop = self.sensitivity * mean_step.abs();

        let mut threshold = 0.0;
        let mut threshold_index = first_max;
        for i in first_max..n - 1 {
            if maxima.contains(&i) {
                threshold = diff[i] - drop;
                threshold_index = i;
            }
            if minima.contains(&i) {
                threshold = 0.0;
            }

            if diff[i + 1] < threshold {
                // the concave decreasing and convex increasing curves
                // were reversed, so count back from the end
                let index = match (self.curve, self.direction) {
                    (Curve::Concave, Direction::Decreasing) | (Curve::Convex, Direction::Increasing) => {
                        n - 1 - threshold_index
                    }
                    _ => threshold_index,
                };
                debug!("knee at index {} of {}", index, n);
                return Some(Knee { index, x: x[index], y: y[index] });
            }
        }

        None
    }
}

/// Indices where `cmp` holds against both neighbours. An end point is
/// compared with itself on the missing side.
fn extrema<F>(v: &[f64], cmp: F) -> Vec<usize>
where
    F: Fn(f64, f64) -> bool,
{
    let last = v.len().saturating_sub(1);
    (0..v.len())
        .filter(|&i| {
            let before = v[i.saturating_sub(1)];
            let after = v[(i + 1).min(last)];
            cmp(v[i], before) && cmp(v[i], after)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // gentle decrease to index 20 then a steep one
    fn elbow() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..=40).map(|i| i as f64).collect();
        let y = x
            .iter()
            .map(|&i| if i <= 20.0 { -i } else { -20.0 - 5.0 * (i - 20.0) })
            .collect();
        (x, y)
    }

    #[test]
    fn finds_the_elbow_of_a_concave_decreasing_curve() {
        let (x, y) = elbow();

        let knee = KneeLocator::default().locate(&x, &y).unwrap();

        assert!((knee.index as i64 - 20).abs() <= 1);
        assert_eq!(knee.x, x[knee.index]);
        assert_eq!(knee.y, y[knee.index]);
    }

    #[test]
    fn scaled_axes_give_the_same_knee() {
        let (x, y) = elbow();
        let cycles: Vec<f64> = x.iter().map(|c| 5000.0 + 250.0 * c).collect();
        let disp: Vec<f64> = y.iter().map(|d| 1.2 + 0.001 * d).collect();

        let knee = KneeLocator::default().locate(&cycles, &disp).unwrap();

        assert_eq!(knee.index, 20);
        assert_eq!(knee.x, 10000.0);
    }

    #[test]
    fn finds_the_elbow_of_a_convex_increasing_curve() {
        // mirror image: flat then steep rise
        let x: Vec<f64> = (0..=40).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&i| if i <= 20.0 { i } else { 20.0 + 5.0 * (i - 20.0) })
            .collect();

        let locator = KneeLocator::new(1.0, Curve::Convex, Direction::Increasing);
        let knee = locator.locate(&x, &y).unwrap();

        assert!((knee.index as i64 - 20).abs() <= 1);
    }

    #[test]
    fn straight_line_has_no_knee() {
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 10.0 - 0.5 * v).collect();

        assert_eq!(KneeLocator::default().locate(&x, &y), None);
    }

    #[test]
    fn degenerate_series_have_no_knee() {
        let locator = KneeLocator::default();

        assert_eq!(locator.locate(&[1.0, 2.0], &[3.0, 1.0]), None);
        assert_eq!(locator.locate(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), None);
        assert_eq!(locator.locate(&[1.0, 2.0, 3.0], &[2.0, 1.0]), None);
    }

    #[test]
    fn extrema_include_plateaus_and_ends() {
        let v = [0.0, 1.0, 1.0, 0.5, 2.0];
        assert_eq!(extrema(&v, |a, b| a >= b), vec![1, 2, 4]);
        assert_eq!(extrema(&v, |a, b| a <= b), vec![0, 3]);
    }
}
