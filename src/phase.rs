//! Phase lag between force and displacement.
//!
//! Each signal is fitted on its own to `a sin(w t + p) + c` at the known
//! test frequency. The lag is the difference of the two fitted phases.

use std::f64::consts::PI;

use log::debug;

use crate::config::FitOptions;
use crate::error::{Error, Result};
use crate::numbers;
use crate::optimise;

/// Fitted sinusoid `amplitude sin(omega t + phase) + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineFit {
    /// Always non-negative.
    pub amplitude: f64,
    /// Radians in [0, 2 pi).
    pub phase: f64,
    pub offset: f64,
    /// Final sum of squared residuals.
    pub cost: f64,
}

impl SineFit {
    pub fn eval(&self, t: f64, omega: f64) -> f64 {
        self.amplitude * (omega * t + self.phase).sin() + self.offset
    }
}

/// Least squares fit of a sinusoid of known angular frequency.
///
/// The fit starts from the half-range of the signal, zero phase and the
/// mean of the signal. A constant signal cannot be fitted.
pub fn fit_sine(t: &[f64], y: &[f64], omega: f64, options: &FitOptions) -> Result<SineFit> {
    if t.len() != y.len() {
        return Err(Error::fit(format!("{} times for {} values", t.len(), y.len())));
    }

    let amplitude = numbers::half_range(y).ok_or_else(|| Error::fit("empty signal"))?;
    let offset = numbers::mean(y).ok_or_else(|| Error::fit("empty signal"))?;
    if !(amplitude > 0.0) {
        return Err(Error::fit("signal is constant"));
    }

    let residuals = |p: &[f64]| {
        t.iter()
            .zip(y)
            .map(|(&ti, &yi)| p[0] * (omega * ti + p[1]).sin() + p[2] - yi)
            .collect::<Vec<f64>>()
    };

    let mut solver = optimise::get_optimisation(options, vec![amplitude, 0.0, offset]);
    let cost = solver.run(&residuals)?;
    debug!("sine fit ({}): {}", options.method, solver.get_result());

    let p = solver.get_parameters();
    let (amplitude, phase) = if p[0] < 0.0 { (-p[0], p[1] + PI) } else { (p[0], p[1]) };
    if !(amplitude.is_finite() && phase.is_finite() && p[2].is_finite()) {
        return Err(Error::fit("fitted parameters are not finite"));
    }

    Ok(SineFit {
        amplitude,
        phase: phase.rem_euclid(2.0 * PI),
        offset: p[2],
        cost,
    })
}

/// Angle between two phases in degrees.
///
/// The difference is taken modulo 180 since a sinusoid cannot be told
/// apart from its negation shifted by half a period, and angles above 90
/// are reported as their supplement. The result lies in [0, 90].
pub fn phase_lag(force_phase: f64, disp_phase: f64) -> f64 {
    let lag = (force_phase - disp_phase).abs().to_degrees().rem_euclid(180.0);
    if lag > 90.0 {
        180.0 - lag
    } else {
        lag
    }
}

/// Phase lag between force and displacement of one cycle, in degrees.
pub fn phase_angle(t: &[f64], disp: &[f64], force: &[f64], omega: f64, options: &FitOptions) -> Result<f64> {
    let disp_fit = fit_sine(t, disp, omega, options)?;
    let force_fit = fit_sine(t, force, omega, options)?;

    Ok(phase_lag(force_fit.phase, disp_fit.phase))
}
