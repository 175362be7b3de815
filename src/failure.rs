//! Failure cycle of a fatigue test.
//!
//! Once the specimen starts to fail the minimum displacement per cycle
//! falls away quickly. The failure cycle is taken as the knee of the
//! (cycle, minimum displacement) curve over the second half of the test.
//! The displacement there is read off a polynomial fitted to the same
//! curve to smooth out sampling noise at the single knee point.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::knee::KneeLocator;
use crate::linalg::Polynomial;
use crate::numbers;
use crate::table::CycleTable;

/// Degree of the smoothing polynomial.
pub const POLY_DEGREE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureResult {
    pub failure_cycle: u64,
    /// Minimum displacement at the failure cycle (mm).
    pub failure_displacement: f64,
}

pub fn locate_failure(table: &CycleTable) -> Result<FailureResult> {
    let (cycles, disp_min) = table.second_half();

    if cycles.len() < 2 {
        return Err(Error::NoFailurePoint(format!(
            "{} cycles in the second half of a {} cycle table",
            cycles.len(),
            table.len()
        )));
    }
    if numbers::half_range(&disp_min) == Some(0.0) {
        return Err(Error::NoFailurePoint("minimum displacement does not change".to_string()));
    }

    let knee = KneeLocator::default()
        .locate(&cycles, &disp_min)
        .ok_or_else(|| Error::NoFailurePoint("no knee in the minimum displacement curve".to_string()))?;
    let failure_cycle = knee.x.round() as u64;

    let failure_displacement = match Polynomial::fit(&cycles, &disp_min, POLY_DEGREE) {
        Some(poly) => poly.eval(failure_cycle as f64),
        None => {
            warn!(
                "polynomial fit of the minimum displacement failed, using the value measured at cycle {}",
                failure_cycle
            );
            knee.y
        }
    };
    info!(
        "failure at cycle {} with displacement {}",
        failure_cycle, failure_displacement
    );

    Ok(FailureResult {
        failure_cycle,
        failure_displacement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::CycleMetrics;
    use crate::table;

    fn metrics(cycle: u64, disp_min: f64) -> CycleMetrics {
        CycleMetrics {
            cycle,
            disp_amp: 0.1,
            force_amp: 100.0,
            disp_max: disp_min + 0.2,
            disp_min,
            force_max: 100.0,
            force_min: -100.0,
            stress: None,
            loop_area: 1.0,
            phase: None,
            loading_rate: 240.0,
        }
    }

    #[test]
    fn too_few_cycles_is_no_failure_point() {
        let empty = table::build(Vec::new(), None).unwrap();
        assert!(matches!(locate_failure(&empty), Err(Error::NoFailurePoint(_))));

        // a single cycle leaves one point in the second half
        let one = table::build(vec![metrics(1, -1.0)], None).unwrap();
        assert!(matches!(locate_failure(&one), Err(Error::NoFailurePoint(_))));
    }

    #[test]
    fn flat_curve_is_no_failure_point() {
        let flat = table::build((1..=20).map(|c| metrics(c, -0.5)), None).unwrap();
        assert!(matches!(locate_failure(&flat), Err(Error::NoFailurePoint(_))));
    }

    #[test]
    fn failure_at_the_elbow_of_the_second_half() {
        // 41 rows of noise-free run-in, then the 41 rows searched: a slow
        // decline up to row 20 of the second half and a steep one after
        let rows = (0..82).map(|k| {
            let cycle = 100 * (k + 1) as u64;
            let j = k as f64 - 41.0;
            let disp = if j < 0.0 {
                0.0
            } else if j <= 20.0 {
                -0.01 * j
            } else {
                -0.2 - 0.05 * (j - 20.0)
            };
            metrics(cycle, disp)
        });
        let table = table::build(rows, None).unwrap();

        let failure = locate_failure(&table).unwrap();

        assert!((failure.failure_cycle as i64 - 6200).abs() <= 100);
        assert!((failure.failure_displacement + 0.2).abs() < 0.05);
    }
}
