//! Cycle table: the per-cycle metrics of a whole test in cycle order.

use crate::cycle::CycleMetrics;
use crate::error::{Error, Result};
use crate::numbers;

/// Whole-test means. Each is absent when the table has no rows, and the
/// stress mean is absent without a cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregates {
    /// mean of 2 * force amplitude (kgf)
    pub mean_force_range: Option<f64>,
    /// mean loading rate (mm/min)
    pub mean_loading_rate: Option<f64>,
    /// mean of 2 * stress amplitude (MPa)
    pub mean_stress_range: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CycleTable {
    rows: Vec<CycleMetrics>,
    aggregates: Aggregates,
    cross_section: Option<f64>,
}

/// Assemble the table from metrics in block order. A misordered cycle
/// is reported by its position in `metrics`.
pub fn build<I>(metrics: I, cross_section: Option<f64>) -> Result<CycleTable>
where
    I: IntoIterator<Item = CycleMetrics>,
{
    build_located(metrics.into_iter().enumerate(), cross_section)
}

/// Assemble the table from `(row, metrics)` pairs in block order, the
/// row being where the block sits in the raw file.
///
/// Cycle numbers must strictly increase. The first one that does not is
/// reported with its row and the cycle it should have followed.
pub fn build_located<I>(metrics: I, cross_section: Option<f64>) -> Result<CycleTable>
where
    I: IntoIterator<Item = (usize, CycleMetrics)>,
{
    let rows = metrics
        .into_iter()
        .try_fold(Vec::new(), |mut rows: Vec<CycleMetrics>, (row, m)| {
            if let Some(last) = rows.last() {
                if m.cycle <= last.cycle {
                    return Err(Error::Ordering {
                        previous: last.cycle,
                        offending: m.cycle,
                        row,
                    });
                }
            }
            rows.push(m);
            Ok(rows)
        })?;

    let aggregates = aggregate(&rows, cross_section);

    Ok(CycleTable {
        rows,
        aggregates,
        cross_section,
    })
}

fn aggregate(rows: &[CycleMetrics], cross_section: Option<f64>) -> Aggregates {
    let force_range: Vec<f64> = rows.iter().map(|m| 2.0 * m.force_amp).collect();
    let loading_rate: Vec<f64> = rows.iter().map(|m| m.loading_rate).collect();
    let stress_range: Vec<f64> = rows
        .iter()
        .filter_map(|m| m.stress.map(|s| 2.0 * s.amp))
        .collect();

    Aggregates {
        mean_force_range: numbers::mean(&force_range),
        mean_loading_rate: numbers::mean(&loading_rate),
        mean_stress_range: cross_section.and_then(|_| numbers::mean(&stress_range)),
    }
}

impl CycleTable {
    pub fn rows(&self) -> &[CycleMetrics] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Metrics of a cycle by its number.
    pub fn get(&self, cycle: u64) -> Option<&CycleMetrics> {
        self.rows
            .binary_search_by_key(&cycle, |m| m.cycle)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn aggregates(&self) -> Aggregates {
        self.aggregates
    }

    pub fn cross_section(&self) -> Option<f64> {
        self.cross_section
    }

    /// (cycle, minimum displacement) of the rows from `len / 2` on.
    pub fn second_half(&self) -> (Vec<f64>, Vec<f64>) {
        self.rows[self.rows.len() / 2..]
            .iter()
            .map(|m| (m.cycle as f64, m.disp_min))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::Stress;

    fn metrics(cycle: u64, force_amp: f64) -> CycleMetrics {
        CycleMetrics {
            cycle,
            disp_amp: 0.1,
            force_amp,
            disp_max: 1.0,
            disp_min: -(cycle as f64),
            force_max: force_amp,
            force_min: -force_amp,
            stress: Some(Stress::from_force(force_amp, force_amp, -force_amp, 9.81)),
            loop_area: 1.0,
            phase: Some(10.0),
            loading_rate: cycle as f64,
        }
    }

    #[test]
    fn duplicate_cycle_is_an_ordering_error() {
        let result = build(vec![metrics(1, 1.0), metrics(2, 1.0), metrics(2, 1.0)], None);

        match result {
            Err(Error::Ordering {
                previous,
                offending,
                row,
            }) => {
                assert_eq!((previous, offending, row), (2, 2, 2));
            }
            other => panic!("expected an ordering error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn ordering_error_carries_the_block_row() {
        let located = vec![(3, metrics(100, 1.0)), (56, metrics(300, 1.0)), (162, metrics(250, 1.0))];

        match build_located(located, None) {
            Err(Error::Ordering { offending, row, .. }) => assert_eq!((offending, row), (250, 162)),
            other => panic!("expected an ordering error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn decreasing_cycle_is_an_ordering_error() {
        assert!(build(vec![metrics(10, 1.0), metrics(5, 1.0)], None).is_err());
    }

    #[test]
    fn gaps_in_cycle_numbers_are_fine() {
        let table = build(vec![metrics(100, 1.0), metrics(600, 3.0), metrics(1100, 5.0)], Some(9.81)).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(600).unwrap().force_amp, 3.0);
        assert!(table.get(601).is_none());

        let agg = table.aggregates();
        assert_eq!(agg.mean_force_range, Some(6.0));
        assert_eq!(agg.mean_loading_rate, Some(600.0));
        // stress = force here since the area is 9.81
        assert!((agg.mean_stress_range.unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn no_stress_mean_without_cross_section() {
        let table = build(vec![metrics(1, 1.0)], None).unwrap();
        assert_eq!(table.aggregates().mean_stress_range, None);
        assert_eq!(table.cross_section(), None);
    }

    #[test]
    fn empty_table_has_no_means() {
        let table = build(Vec::new(), Some(1.0)).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.aggregates(), Aggregates::default());
        assert_eq!(table.second_half(), (vec![], vec![]));
    }

    #[test]
    fn second_half_uses_floor_division() {
        let table = build((1..=5).map(|c| metrics(c, 1.0)), None).unwrap();
        let (x, y) = table.second_half();

        assert_eq!(x, vec![3.0, 4.0, 5.0]);
        assert_eq!(y, vec![-3.0, -4.0, -5.0]);
    }
}
