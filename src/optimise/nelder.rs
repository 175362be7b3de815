//! Numerical optimisation using the Nelder-Mead algorithim
//!
//! Used here to minimise the sum of squared residuals of a fit. It
//! needs no derivatives so it keeps working on residual functions that
//! are too rough for Levenberg-Marquardt, at the cost of many more
//! function evaluations.
//! Reference: <https://en.wikipedia.org/wiki/Nelder%E2%80%93Mead_method>

use log::{debug, warn};

use super::{sum_of_squares, Optimisation};
use crate::error::{Error, Result};

/// A point on the simplex.
#[derive(Debug, Clone)]
struct Eval {
    x: Vec<f64>,
    score: f64,
}

// x + factor * (y - z)
fn offset(x: &[f64], factor: f64, y: &[f64], z: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(y.iter().zip(z))
        .map(|(xi, (yi, zi))| xi + factor * (yi - zi))
        .collect()
}

// finds the centroids of a list of points
fn centroid(simplex: &[Eval]) -> Vec<f64> {
    let n = simplex[0].x.len();
    let sum = simplex.iter().fold(vec![0.0_f64; n], |mut sum, r| {
        for (s, xi) in sum.iter_mut().zip(&r.x) {
            *s += xi;
        }
        sum
    });
    sum.iter().map(|s| s / simplex.len() as f64).collect()
}

// largest distance of any vertex from the best one
fn diameter(simplex: &[Eval]) -> f64 {
    simplex[1..]
        .iter()
        .map(|e| {
            e.x.iter()
                .zip(&simplex[0].x)
                .fold(0.0f64, |acc, (a, b)| acc.max((a - b).abs()))
        })
        .fold(0.0, f64::max)
}

// Keep track of each type of modification.
#[derive(Debug)]
enum Operation {
    Reflection,
    Expansion,
    Contraction,
    Reduction,
}

/// Nelder-Mead specific optimisation parameters.
#[derive(Debug, Clone, Copy)]
pub struct Parameters {
    /// step increment in each direction from the starting point,
    /// relative to the size of the parameter (or absolute below 1)
    pub step: f64,
    /// reflection factor (relects the worst point through the centroid)
    pub alpha: f64,
    /// expansion factor (extends the reflected point)
    pub gamma: f64,
    /// contraction factor (away from the worst point)
    pub rho: f64,
    /// shrinking factor (around the best point)
    pub sigma: f64,
}

#[derive(Debug)]
pub struct Nelder {
    /// Nelder-Mead specific parameters
    nelder_parameters: Parameters,
    /// Parameters to be optimised
    parameters: Vec<f64>,
    converge_tol: f64,
    /// Maximum number of iterations to run
    max_iter: usize,
    /// Printable result
    result: String,
}

impl Default for Parameters {
    fn default() -> Parameters {
        Parameters {
            step: 0.1,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
        }
    }
}

impl Nelder {
    pub fn new(nelder_parameters: Parameters, parameters: Vec<f64>, converge_tol: f64, max_iter: usize) -> Self {
        let result = "N/A".to_string();
        Self {
            nelder_parameters,
            parameters,
            converge_tol,
            max_iter,
            result,
        }
    }

    /// Nelder-Mead non-linear optimisation
    ///
    /// Converges when either the spread of the scores or the size of
    /// the simplex falls below the tolerance (relative to the best
    /// point). Running out of iterations is an error.
    fn minimise<F>(&mut self, mut objective_function: F) -> Result<f64>
    where
        F: FnMut(&[f64]) -> f64,
    {
        check_nelder_limits(&self.nelder_parameters);

        let x_start = self.parameters.clone();
        let mut results = Vec::with_capacity(x_start.len() + 1);
        let mut ops = Vec::new();

        results.push(Eval {
            score: objective_function(&x_start),
            x: x_start.clone(),
        });

        // iniitalise the simplex by taking a step in each direction.
        for i in 0..x_start.len() {
            let mut x_init = x_start.clone();
            x_init[i] += self.nelder_parameters.step * x_start[i].abs().max(1.0);
            results.push(Eval {
                score: objective_function(&x_init),
                x: x_init,
            });
        }
        debug!("Nelder: starting simplex {:?}", results);

        let mut iter = 0;
        let n = results.len();

        loop {
            // Check if exceeding the iteration limit.
            if iter >= self.max_iter {
                warn!(
                    "***Warning: Nelder-Mead failed to converge within the iteration limit {}.",
                    self.max_iter
                );
                self.parameters = results[0].x.clone();
                return Err(Error::fit(format!(
                    "not converged within {} iterations (cost {})",
                    self.max_iter, results[0].score
                )));
            }
            iter += 1;

            // NaN scores sort last
            results.sort_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or_else(|| b.score.is_nan().cmp(&a.score.is_nan()).reverse())
            });

            // check for convergence
            let best = results[0].score;
            let change_tol = (best - results[n - 1].score).abs();
            let scale = results[0].x.iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
            if change_tol <= self.converge_tol * (1.0 + best.abs())
                || diameter(&results) <= self.converge_tol * scale
            {
                debug!("Nelder: Success. Converged tol {} after {} iterations", change_tol, iter);
                break;
            }

            // calculate centro
            let x0 = centroid(&results[0..n - 1]);

            // reflection
            // if the reflected point is better than the second worst,
            // but not better than the best, then replace the worst point
            // with the reflected point
            let xr = offset(&x0, self.nelder_parameters.alpha, &x0, &results[n - 1].x);
            let rscore = objective_function(&xr);

            if rscore >= results[0].score && results[n - 2].score > rscore {
                ops.push(Operation::Reflection);
                results[n - 1] = Eval { x: xr, score: rscore };
                continue;
            }

            // expansion
            // If the reflected point is the best point so far
            // then compute the expanded point
            if rscore < results[0].score {
                let xe = offset(&x0, self.nelder_parameters.gamma, &xr, &x0);
                let escore = objective_function(&xe);

                results[n - 1] = if escore < rscore {
                    ops.push(Operation::Expansion);
                    Eval { x: xe, score: escore }
                } else {
                    ops.push(Operation::Reflection);
                    Eval { x: xr, score: rscore }
                };
                continue;
            }

            // contraction
            // If the contracted point is better than the worst point,
            // replace the worst point with the contracted point
            let xc = offset(&x0, self.nelder_parameters.rho, &results[n - 1].x, &x0);
            let cscore = objective_function(&xc);

            if cscore < results[n - 1].score {
                ops.push(Operation::Contraction);
                results[n - 1] = Eval { x: xc, score: cscore };
                continue;
            }

            // reduction
            // For all but the best point, replace the point with
            // xi = x1 + sigma(xi - x1)
            // This is a shrinking of the simplex around the best point
            ops.push(Operation::Reduction);
            let best_x = results[0].x.clone();
            for r in results.iter_mut().skip(1) {
                r.x = offset(&best_x, self.nelder_parameters.sigma, &r.x, &best_x);
                r.score = objective_function(&r.x);
            }
        }

        let count = count_nelder_ops(&ops);
        debug!(
            "Nelder: Operations: reflection {}, expansion {}, contraction {}, reduction {}",
            count.reflection, count.expansion, count.contraction, count.reduction
        );
        self.parameters = results[0].x.clone();
        self.result = format!("parameters {:?} cost {} iterations {}", self.parameters, results[0].score, iter);

        Ok(results[0].score)
    }
}

impl Optimisation for Nelder {
    fn run(&mut self, residuals: &dyn Fn(&[f64]) -> Vec<f64>) -> Result<f64> {
        if residuals(&self.parameters).len() < self.parameters.len() {
            return Err(Error::fit("fewer observations than parameters"));
        }

        self.minimise(|x: &[f64]| {
            let score = sum_of_squares(&residuals(x));
            if score.is_finite() {
                score
            } else {
                f64::INFINITY
            }
        })
    }

    fn get_parameters(&self) -> &[f64] {
        &self.parameters
    }

    fn get_result(&self) -> String {
        self.result.to_owned()
    }
}

struct NelderSum {
    reflection: usize,
    expansion: usize,
    contraction: usize,
    reduction: usize,
}

// Count the number of each type of operation in the nelder search.
fn count_nelder_ops(ops: &[Operation]) -> NelderSum {
    ops.iter().fold(
        NelderSum {
            reflection: 0,
            expansion: 0,
            contraction: 0,
            reduction: 0,
        },
        |mut count, op| {
            match *op {
                Operation::Reflection => count.reflection += 1,
                Operation::Expansion => count.expansion += 1,
                Operation::Contraction => count.contraction += 1,
                Operation::Reduction => count.reduction += 1,
            };

            count
        },
    )
}

/// Check that the Nelder parameters are acceptable.
fn check_nelder_limits(params: &Parameters) {
    // recommended parameter limits (wikipedia)
    if params.gamma < 0.0 {
        warn!("***Warning: Wikipedia recommends using a Nelder-Mead value for gamma > 0.0, using {} .", params.gamma);
    }
    if params.rho < 0.0 || params.rho > 0.5 {
        warn!(
            "***Warning: Wikipedia recommends using a Nelder-Mead value 0.0 < rho < 0.5, using {}.",
            params.rho
        );
    }
    if params.sigma < 0.0 {
        warn!(
            "***Warning: Wikipedia recommends using a Nelder-Mead value for sigma > 0.0, using {}.",
            params.sigma
        );
    }
}
