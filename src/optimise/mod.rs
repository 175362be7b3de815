//! Unconstrained nonlinear least squares solvers.
//!
//! Both solvers minimise the sum of squared residuals of a model. The
//! residual function takes the current parameters and returns one
//! residual per observation.

use std::fmt;
use std::str::FromStr;

use crate::config::FitOptions;
use crate::error::{Error, Result};

pub mod levenberg;
pub mod nelder;

/// Solver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Levenberg,
    Nelder,
}

impl Method {
    pub fn variants() -> [&'static str; 2] {
        ["levenberg", "nelder"]
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "levenberg" | "lm" => Ok(Method::Levenberg),
            "nelder" => Ok(Method::Nelder),
            other => Err(Error::Config(format!("unknown fit method '{}'", other))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Levenberg => write!(f, "levenberg"),
            Method::Nelder => write!(f, "nelder"),
        }
    }
}

pub trait Optimisation {
    /// Minimise the sum of squares of `residuals`, starting from the
    /// parameters the solver was built with. Returns the final sum of
    /// squares, or a fit error if the solver did not converge.
    fn run(&mut self, residuals: &dyn Fn(&[f64]) -> Vec<f64>) -> Result<f64>;

    fn get_parameters(&self) -> &[f64];

    fn get_result(&self) -> String;
}

/// Build the solver chosen in the fit options.
pub fn get_optimisation(options: &FitOptions, start: Vec<f64>) -> Box<dyn Optimisation> {
    match options.method {
        Method::Levenberg => Box::new(levenberg::Levenberg::new(
            levenberg::Parameters::default(),
            start,
            options.tol,
            options.max_iter,
        )),
        Method::Nelder => Box::new(nelder::Nelder::new(
            nelder::Parameters::default(),
            start,
            options.tol,
            options.max_iter,
        )),
    }
}

/// Sum of the squares of a sequence.
pub fn sum_of_squares(x: &[f64]) -> f64 {
    x.iter().fold(0.0f64, |acc, &a| acc + a.powi(2))
}

/// Euclidean norm.
pub fn norm(x: &[f64]) -> f64 {
    sum_of_squares(x).sqrt()
}
