//! Small dense linear algebra used by the curve fits.
//!
//! Matrices are row-major `Vec<Vec<f64>>`. The systems solved here are
//! tiny (3x3 normal equations, 10 column polynomial fits) so nothing
//! more elaborate is warranted.

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` if the matrix is singular to working precision.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut m: Vec<Vec<f64>> = a.to_vec();
    let mut x = b.to_vec();

    let scale = m
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let tiny = scale * 1e-14;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            m[i][col]
                .abs()
                .partial_cmp(&m[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if m[pivot][col].abs() <= tiny {
            return None;
        }
        m.swap(col, pivot);
        x.swap(col, pivot);

        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            x[row] -= factor * x[col];
        }
    }

    for col in (0..n).rev() {
        let sum: f64 = (col + 1..n).map(|k| m[col][k] * x[k]).sum();
        x[col] = (x[col] - sum) / m[col][col];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Least squares solution of the overdetermined system `a x ≈ b` using
/// Householder QR. `a` has one row per observation.
pub fn least_squares(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let m = a.len();
    if m == 0 || b.len() != m {
        return None;
    }
    let n = a[0].len();
    if n == 0 || m < n {
        return None;
    }

    let mut r: Vec<Vec<f64>> = a.to_vec();
    let mut y = b.to_vec();

    for k in 0..n {
        let norm = (k..m).map(|i| r[i][k] * r[i][k]).sum::<f64>().sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if r[k][k] > 0.0 { -norm } else { norm };

        // Householder vector v = x - alpha e_k
        let mut v: Vec<f64> = (k..m).map(|i| r[i][k]).collect();
        v[0] -= alpha;
        let vnorm2: f64 = v.iter().map(|vi| vi * vi).sum();
        if vnorm2 == 0.0 {
            continue;
        }

        for j in k..n {
            let dot: f64 = (k..m).map(|i| v[i - k] * r[i][j]).sum();
            let f = 2.0 * dot / vnorm2;
            for i in k..m {
                r[i][j] -= f * v[i - k];
            }
        }
        let dot: f64 = (k..m).map(|i| v[i - k] * y[i]).sum();
        let f = 2.0 * dot / vnorm2;
        for i in k..m {
            y[i] -= f * v[i - k];
        }
    }

    let diag = (0..n).fold(0.0f64, |acc, i| acc.max(r[i][i].abs()));
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        if r[i][i].abs() <= diag * 1e-13 {
            return None;
        }
        let sum: f64 = (i + 1..n).map(|j| r[i][j] * x[j]).sum();
        x[i] = (y[i] - sum) / r[i][i];
    }

    Some(x)
}

/// A least squares polynomial in a rescaled variable.
///
/// The abscissae are mapped onto [-1, 1] before fitting, which keeps
/// the Vandermonde matrix well conditioned for cycle counts in the
/// hundreds of thousands. The fitted curve is the same as a fit in the
/// raw variable.
#[derive(Debug, Clone)]
pub struct Polynomial {
    /// Coefficients in increasing power of the scaled variable.
    coefficients: Vec<f64>,
    centre: f64,
    half_width: f64,
}

impl Polynomial {
    /// Fit a polynomial of the given degree. The degree is reduced to
    /// `x.len() - 1` when there are too few points.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Option<Polynomial> {
        if x.is_empty() || x.len() != y.len() {
            return None;
        }
        let degree = degree.min(x.len() - 1);

        let lo = crate::numbers::min(x)?;
        let hi = crate::numbers::max(x)?;
        let centre = 0.5 * (hi + lo);
        let half_width = if hi > lo { 0.5 * (hi - lo) } else { 1.0 };

        let vandermonde: Vec<Vec<f64>> = x
            .iter()
            .map(|&xi| {
                let s = (xi - centre) / half_width;
                (0..=degree).map(|p| s.powi(p as i32)).collect()
            })
            .collect();

        let coefficients = least_squares(&vandermonde, y)?;

        Some(Polynomial {
            coefficients,
            centre,
            half_width,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate using Horner's rule.
    pub fn eval(&self, x: f64) -> f64 {
        let s = (x - self.centre) / self.half_width;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * s + c)
    }
}
