//! Per-cycle parameters of a cyclic loading test.
//!
//! A [`CycleBlock`] holds the samples the instrument recorded for one
//! cycle. From it we derive the amplitudes and extremes of displacement
//! and force, the stresses, the area of the hysteresis loop, the phase
//! lag between force and displacement and the loading rate.

use log::warn;

use crate::config::{Config, GRAVITY};
use crate::error::{Error, Result};
use crate::numbers;
use crate::phase;

/// One instrument reading.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// time (s)
    pub time: f64,
    /// displacement (mm)
    pub displacement: f64,
    /// force (kgf)
    pub force: f64,
    /// any further numeric columns, in file order
    pub extra: Vec<f64>,
}

impl RawSample {
    /// Value of a column counted from the start of the row.
    pub fn column(&self, col: usize) -> Option<f64> {
        match col {
            0 => Some(self.time),
            1 => Some(self.displacement),
            2 => Some(self.force),
            n => self.extra.get(n - 3).cloned(),
        }
    }
}

/// The contiguous samples of a single cycle.
#[derive(Debug, Clone)]
pub struct CycleBlock {
    cycle: u64,
    /// raw table row of the first sample
    row: usize,
    samples: Vec<RawSample>,
}

impl CycleBlock {
    /// A cycle needs at least two samples to trace a loop.
    pub fn new(cycle: u64, row: usize, samples: Vec<RawSample>) -> Result<CycleBlock> {
        if samples.len() < 2 {
            return Err(Error::malformed(
                row,
                format!("cycle {} has {} samples, at least 2 are needed", cycle, samples.len()),
            ));
        }

        Ok(CycleBlock { cycle, row, samples })
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn displacements(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.displacement).collect()
    }

    pub fn forces(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.force).collect()
    }
}

/// Stresses derived from force over the specimen cross-section (MPa).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stress {
    pub amp: f64,
    pub max: f64,
    pub min: f64,
}

impl Stress {
    pub fn from_force(force_amp: f64, force_max: f64, force_min: f64, area: f64) -> Stress {
        let to_stress = |force: f64| force * GRAVITY / area;
        Stress {
            amp: to_stress(force_amp),
            max: to_stress(force_max),
            min: to_stress(force_min),
        }
    }
}

/// Everything derived from one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMetrics {
    pub cycle: u64,
    pub disp_amp: f64,
    pub force_amp: f64,
    pub disp_max: f64,
    pub disp_min: f64,
    pub force_max: f64,
    pub force_min: f64,
    /// Absent without a cross-section.
    pub stress: Option<Stress>,
    /// Hysteresis loop area (mm*kgf).
    pub loop_area: f64,
    /// Phase lag in degrees within [0, 90]. Absent if a sine fit failed.
    pub phase: Option<f64>,
    /// Piston speed (mm/min).
    pub loading_rate: f64,
}

/// Area enclosed by the (x, y) polygon, closing the last point back to
/// the first (shoelace formula).
pub fn loop_area(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::malformed(
            0,
            format!("{} displacements for {} forces", x.len(), y.len()),
        ));
    }
    let n = x.len();
    if n < 2 {
        return Err(Error::malformed(0, format!("loop of {} samples", n)));
    }

    let (add, subs) = (0..n).fold((0.0, 0.0), |(add, subs), k| {
        let next = (k + 1) % n;
        (add + x[k] * y[next], subs + x[next] * y[k])
    });

    Ok(0.5 * (add - subs).abs())
}

/// Piston speed in mm/min from the displacement range covered in half a
/// cycle of the given duration (s).
pub fn loading_rate(disp_max: f64, disp_min: f64, half_cycle_duration: f64) -> f64 {
    60.0 * (disp_max - disp_min) / half_cycle_duration
}

/// Compute the metrics of a block. A failed phase fit is logged and
/// leaves the phase empty, anything else wrong with the block is an
/// error.
pub fn analyse(block: &CycleBlock, config: &Config) -> Result<CycleMetrics> {
    let time = block.times();
    let disp = block.displacements();
    let force = block.forces();

    let non_finite = |x: &[f64]| x.iter().any(|v| !v.is_finite());
    if non_finite(&time) || non_finite(&disp) || non_finite(&force) {
        return Err(Error::malformed(block.row(), format!("cycle {} has non-finite samples", block.cycle())));
    }

    let extremes = |x: &[f64]| -> Result<(f64, f64)> {
        match (numbers::min(x), numbers::max(x)) {
            (Some(lo), Some(hi)) => Ok((lo, hi)),
            _ => Err(Error::malformed(block.row(), "empty signal")),
        }
    };
    let (disp_min, disp_max) = extremes(&disp)?;
    let (force_min, force_max) = extremes(&force)?;
    let disp_amp = (disp_max - disp_min) / 2.0;
    let force_amp = (force_max - force_min) / 2.0;

    let stress = config
        .stress_area()
        .map(|area| Stress::from_force(force_amp, force_max, force_min, area));

    let loop_area = loop_area(&disp, &force).map_err(|why| match why {
        Error::MalformedRow { reason, .. } => Error::malformed(block.row(), reason),
        other => other,
    })?;

    let phase = match phase::phase_angle(&time, &disp, &force, config.omega(), &config.fit) {
        Ok(angle) => Some(angle),
        Err(why) => {
            warn!("cycle {}: {}; phase left empty", block.cycle(), why);
            None
        }
    };

    Ok(CycleMetrics {
        cycle: block.cycle(),
        disp_amp,
        force_amp,
        disp_max,
        disp_min,
        force_max,
        force_min,
        stress,
        loop_area,
        phase,
        loading_rate: loading_rate(disp_max, disp_min, config.half_cycle_duration),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecimalSeparator, Detail, Layout, Locale};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn sample(time: f64, displacement: f64, force: f64) -> RawSample {
        RawSample {
            time,
            displacement,
            force,
            extra: vec![],
        }
    }

    fn config() -> Config {
        Config::new(DecimalSeparator::Point, Locale::English, Layout::FourColumn, 10.0, Some(50.0)).unwrap()
    }

    // Displacement and force sinusoids with force leading by `lag` degrees.
    fn sine_block(cycle: u64, lag: f64) -> CycleBlock {
        let samples = (0..50)
            .map(|i| {
                let t = 12.3 + i as f64 / 500.0;
                let wt = 2.0 * PI * 10.0 * t;
                sample(t, 1.0 + 0.2 * wt.sin(), 300.0 + 100.0 * (wt + lag.to_radians()).sin())
            })
            .collect();
        CycleBlock::new(cycle, 10, samples).unwrap()
    }

    #[test]
    fn unit_square_has_unit_area() {
        let x = [0.0, 1.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0, 1.0];
        assert!((loop_area(&x, &y).unwrap() - 1.0).abs() < f64::EPSILON);

        // clockwise gives the same area
        let x = [0.0, 0.0, 1.0, 1.0];
        let y = [0.0, 1.0, 1.0, 0.0];
        assert!((loop_area(&x, &y).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn loop_area_is_rotation_invariant_and_positive() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let n = rng.gen_range(3..60);
            let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-5.0..5.0)).collect();
            let y: Vec<f64> = (0..n).map(|_| rng.gen_range(-500.0..500.0)).collect();
            let area = loop_area(&x, &y).unwrap();
            assert!(area >= 0.0);

            for shift in 1..n {
                let mut xr = x.clone();
                let mut yr = y.clone();
                xr.rotate_left(shift);
                yr.rotate_left(shift);
                let rotated = loop_area(&xr, &yr).unwrap();
                assert!((rotated - area).abs() <= 1e-9 * area.max(1.0));
            }
        }
    }

    #[test]
    fn loop_area_needs_two_points() {
        assert!(matches!(loop_area(&[1.0], &[2.0]), Err(Error::MalformedRow { .. })));
        assert_eq!(loop_area(&[0.0, 1.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn block_of_one_sample_is_malformed() {
        let result = CycleBlock::new(3, 42, vec![sample(0.0, 1.0, 2.0)]);
        assert!(matches!(result, Err(Error::MalformedRow { row: 42, .. })));
    }

    #[test]
    fn amplitudes_and_extremes() {
        let block = CycleBlock::new(
            1,
            0,
            vec![
                sample(0.0, 1.0, 10.0),
                sample(0.1, 3.0, -30.0),
                sample(0.2, 2.0, 50.0),
            ],
        )
        .unwrap();

        let m = analyse(&block, &config()).unwrap();

        assert_eq!(m.cycle, 1);
        assert_eq!(m.disp_min, 1.0);
        assert_eq!(m.disp_max, 3.0);
        assert_eq!(m.disp_amp, 1.0);
        assert_eq!(m.force_amp, 40.0);
        assert!((m.loading_rate - 60.0 * 2.0 / 0.05).abs() < 1e-9);

        let stress = m.stress.unwrap();
        assert!((stress.amp - 40.0 * 9.81 / 50.0).abs() < 1e-12);
        assert!((stress.max - 50.0 * 9.81 / 50.0).abs() < 1e-12);
        assert!((stress.min + 30.0 * 9.81 / 50.0).abs() < 1e-12);
    }

    #[test]
    fn metrics_invariants_hold_for_random_blocks() {
        let mut rng = StdRng::seed_from_u64(11);
        let c = config();

        for cycle in 0..10 {
            let samples = (0..rng.gen_range(2..60))
                .map(|i| sample(i as f64 * 0.002, rng.gen_range(-2.0..2.0), rng.gen_range(-100.0..400.0)))
                .collect();
            let block = CycleBlock::new(cycle, 0, samples).unwrap();
            let m = analyse(&block, &c).unwrap();

            assert!(m.disp_amp >= 0.0 && m.force_amp >= 0.0);
            assert!(m.disp_min <= m.disp_max && m.force_min <= m.force_max);
            assert!(m.loop_area >= 0.0);
            if let Some(phase) = m.phase {
                assert!((0.0..=90.0).contains(&phase));
            }
        }
    }

    #[test]
    fn sinusoidal_cycle_recovers_phase() {
        let m = analyse(&sine_block(500, 20.0), &config()).unwrap();

        assert!((m.disp_amp - 0.2).abs() < 1e-3);
        assert!((m.phase.unwrap() - 20.0).abs() < 0.5);
        // an ellipse with semi-axes 0.2 and 100 sin(lag) in the rotated frame
        let ellipse = PI * 0.2 * 100.0 * 20f64.to_radians().sin();
        assert!((m.loop_area - ellipse).abs() / ellipse < 0.01);
    }

    #[test]
    fn flat_force_leaves_phase_empty() {
        let samples = (0..50)
            .map(|i| {
                let t = i as f64 / 500.0;
                sample(t, (2.0 * PI * 10.0 * t).sin(), 5.0)
            })
            .collect();
        let block = CycleBlock::new(9, 0, samples).unwrap();

        let m = analyse(&block, &config()).unwrap();
        assert_eq!(m.phase, None);
        assert_eq!(m.force_amp, 0.0);
    }

    #[test]
    fn basic_detail_has_no_stress() {
        let mut c = config();
        c.detail = Detail::Basic;

        let m = analyse(&sine_block(1, 10.0), &c).unwrap();
        assert!(m.stress.is_none());
    }
}
