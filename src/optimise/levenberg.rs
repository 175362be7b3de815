//! Levenberg-Marquardt least squares.
//!
//! The Jacobian is estimated by forward differences so any residual
//! function can be fitted. The damping term is scaled by the diagonal
//! of the normal matrix (Marquardt's variant) which makes the method
//! insensitive to the relative size of the parameters.
//! Reference: <https://en.wikipedia.org/wiki/Levenberg%E2%80%93Marquardt_algorithm>

use log::{debug, warn};

use super::{norm, sum_of_squares, Optimisation};
use crate::error::{Error, Result};
use crate::linalg;

/// Damping beyond which a step is no longer worth trying.
const LAMBDA_MAX: f64 = 1e16;

/// Levenberg-Marquardt specific parameters.
#[derive(Debug, Clone, Copy)]
pub struct Parameters {
    /// starting damping factor
    pub lambda: f64,
    /// damping multiplier after a rejected step
    pub increase: f64,
    /// damping divisor after an accepted step
    pub decrease: f64,
    /// relative step used for the finite difference Jacobian
    pub step: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            lambda: 1e-3,
            increase: 10.0,
            decrease: 10.0,
            step: f64::EPSILON.sqrt(),
        }
    }
}

#[derive(Debug)]
pub struct Levenberg {
    lm_parameters: Parameters,
    /// Parameters being fitted
    parameters: Vec<f64>,
    /// Relative tolerance on both the cost reduction and the step size
    converge_tol: f64,
    max_iter: usize,
    /// Printable result
    result: String,
}

impl Levenberg {
    pub fn new(lm_parameters: Parameters, parameters: Vec<f64>, converge_tol: f64, max_iter: usize) -> Self {
        Self {
            lm_parameters,
            parameters,
            converge_tol,
            max_iter,
            result: "N/A".to_string(),
        }
    }

    // Forward difference estimate of d r_i / d x_j, one row per residual.
    fn jacobian<F>(&self, residuals: &F, x: &[f64], r: &[f64]) -> Vec<Vec<f64>>
    where
        F: Fn(&[f64]) -> Vec<f64> + ?Sized,
    {
        let mut jac = vec![vec![0.0; x.len()]; r.len()];
        let mut xh = x.to_vec();

        for j in 0..x.len() {
            let h = if x[j] == 0.0 {
                self.lm_parameters.step
            } else {
                self.lm_parameters.step * x[j].abs()
            };
            xh[j] = x[j] + h;
            let rh = residuals(&xh);
            for (i, row) in jac.iter_mut().enumerate() {
                row[j] = (rh[i] - r[i]) / h;
            }
            xh[j] = x[j];
        }

        jac
    }

    fn solve<F>(&mut self, residuals: &F) -> Result<f64>
    where
        F: Fn(&[f64]) -> Vec<f64> + ?Sized,
    {
        let n = self.parameters.len();
        let mut x = self.parameters.clone();
        let mut r = residuals(&x);

        if r.len() < n {
            return Err(Error::fit(format!(
                "{} observations cannot determine {} parameters",
                r.len(),
                n
            )));
        }
        let mut cost = sum_of_squares(&r);
        if !cost.is_finite() {
            return Err(Error::fit("residuals are not finite at the starting point"));
        }

        let mut lambda = self.lm_parameters.lambda;
        let tol = self.converge_tol;

        for iter in 1..=self.max_iter {
            if cost == 0.0 {
                return Ok(self.finish(x, cost, iter));
            }

            let jac = self.jacobian(residuals, &x, &r);

            // normal equations J^T J and the gradient J^T r
            let mut jtj = vec![vec![0.0; n]; n];
            let mut jtr = vec![0.0; n];
            for (row, ri) in jac.iter().zip(&r) {
                for a in 0..n {
                    jtr[a] += row[a] * ri;
                    for b in a..n {
                        jtj[a][b] += row[a] * row[b];
                    }
                }
            }
            for a in 0..n {
                for b in 0..a {
                    jtj[a][b] = jtj[b][a];
                }
            }
            let diag_max = (0..n).fold(0.0f64, |acc, i| acc.max(jtj[i][i]));
            if diag_max == 0.0 {
                return Err(Error::fit("the model does not depend on its parameters"));
            }
            let rhs: Vec<f64> = jtr.iter().map(|g| -g).collect();

            loop {
                let mut damped = jtj.clone();
                for i in 0..n {
                    damped[i][i] += lambda * jtj[i][i].max(diag_max * 1e-12);
                }

                if let Some(delta) = linalg::solve(&damped, &rhs) {
                    let x_new: Vec<f64> = x.iter().zip(&delta).map(|(xi, di)| xi + di).collect();
                    let r_new = residuals(&x_new);
                    let cost_new = sum_of_squares(&r_new);
                    let small_step = norm(&delta) <= tol * (norm(&x) + tol);

                    if cost_new.is_finite() && cost_new < cost {
                        let reduction = (cost - cost_new) / cost;
                        x = x_new;
                        r = r_new;
                        cost = cost_new;
                        lambda /= self.lm_parameters.decrease;

                        if reduction <= tol || small_step {
                            return Ok(self.finish(x, cost, iter));
                        }
                        break;
                    }

                    // Rejected step, but nothing left to gain.
                    if small_step {
                        return Ok(self.finish(x, cost, iter));
                    }
                }

                lambda *= self.lm_parameters.increase;
                if lambda > LAMBDA_MAX {
                    return Err(Error::fit(format!(
                        "no downhill step found after {} iterations (cost {})",
                        iter, cost
                    )));
                }
            }
        }

        warn!(
            "***Warning: Levenberg-Marquardt failed to converge within {} iterations.",
            self.max_iter
        );
        self.parameters = x;
        Err(Error::fit(format!(
            "not converged within {} iterations (cost {})",
            self.max_iter, cost
        )))
    }

    fn finish(&mut self, x: Vec<f64>, cost: f64, iter: usize) -> f64 {
        debug!("Levenberg: converged after {} iterations, cost {}", iter, cost);
        self.result = format!("parameters {:?} cost {} iterations {}", x, cost, iter);
        self.parameters = x;
        cost
    }
}

impl Optimisation for Levenberg {
    fn run(&mut self, residuals: &dyn Fn(&[f64]) -> Vec<f64>) -> Result<f64> {
        self.solve(residuals)
    }

    fn get_parameters(&self) -> &[f64] {
        &self.parameters
    }

    fn get_result(&self) -> String {
        self.result.to_owned()
    }
}
