//! The whole run: raw table in, cycle table and failure estimate out.

use std::path::Path;

use log::{info, warn};

use crate::config::{Config, HEADER_ROW};
use crate::cycle;
use crate::error::{Error, Result};
use crate::failure::{self, FailureResult};
use crate::io::{self, RawTable};
use crate::segment::{self, Segmenter};
use crate::table::{self, CycleTable};

/// A block left out of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// Row of the block's marker, or of the offending sample.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct Report {
    pub table: CycleTable,
    pub rejected: Vec<Rejected>,
    /// A missing knee does not spoil the table, so it is kept here.
    pub failure: Result<FailureResult>,
}

impl Report {
    pub fn failure_result(&self) -> Option<&FailureResult> {
        self.failure.as_ref().ok()
    }
}

/// Process a raw table.
///
/// Blocks that cannot be read are logged and recorded as rejected. An
/// out of order cycle number or a missing column stops the run. A
/// missing failure point is kept in the report alongside the table.
pub fn analyse(raw: &RawTable, config: &Config) -> Result<Report> {
    let mut rejected = Vec::new();
    let mut metrics = Vec::new();

    for span in Segmenter::new(raw, config)? {
        let result = span
            .and_then(|span| segment::extract_block(raw, &span, config))
            .and_then(|block| cycle::analyse(&block, config).map(|m| (block.row(), m)));

        match result {
            Ok(located) => metrics.push(located),
            Err(Error::MalformedRow { row, reason }) => {
                warn!("block at row {} rejected: {}", row, reason);
                rejected.push(Rejected { row, reason });
            }
            Err(why) => return Err(why),
        }
    }

    let table = table::build_located(metrics, config.stress_area())?;
    info!("{} cycles tabulated, {} blocks rejected", table.len(), rejected.len());

    let failure = failure::locate_failure(&table);
    if let Err(why) = &failure {
        warn!("{}", why);
    }

    Ok(Report {
        table,
        rejected,
        failure,
    })
}

/// Load a tab separated instrument export and process it.
pub fn process_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<Report> {
    let raw = io::read_raw_table(path, HEADER_ROW, b'\t')?;
    analyse(&raw, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecimalSeparator, Detail, Layout, Locale};
    use std::f64::consts::PI;
    use std::fs;
    use std::io::Write;
    use tempdir::TempDir;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    // One 50 sample block per cycle at 10 Hz with force leading by 15
    // degrees. The minimum displacement sags slowly then drops after
    // the 60th block.
    fn test_rows(cycles: &[u64]) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        for (k, &cycle) in cycles.iter().enumerate() {
            let sag = if k < 60 { 0.001 * k as f64 } else { 0.06 + 0.02 * (k - 60) as f64 };
            rows.push(strings(&["Points: ", "50", "", ""]));
            rows.push(strings(&["s", "mm", "kgf", "cycles"]));
            rows.push(strings(&["", "", "", ""]));
            for i in 0..50 {
                let t = cycle as f64 * 0.1 + i as f64 * 0.002;
                let wt = 2.0 * PI * 10.0 * t;
                let disp = 1.0 - sag + 0.25 * wt.sin();
                let force = 200.0 + 150.0 * (wt + 15f64.to_radians()).sin();
                rows.push(vec![
                    format!("{:.4}", t),
                    format!("{:.6}", disp),
                    format!("{:.4}", force),
                    cycle.to_string(),
                ]);
            }
        }
        rows
    }

    fn raw(rows: Vec<Vec<String>>) -> RawTable {
        RawTable::from_rows(strings(&["Time", "Axial Desplazamiento", "Force", "Cycle"]), rows)
    }

    fn config() -> Config {
        Config::new(DecimalSeparator::Point, Locale::English, Layout::FourColumn, 10.0, Some(25.0)).unwrap()
    }

    #[test]
    fn full_run_tabulates_every_block() {
        let cycles: Vec<u64> = (1..=100).map(|c| c * 100).collect();

        let report = analyse(&raw(test_rows(&cycles)), &config()).unwrap();

        assert_eq!(report.table.len(), 100);
        assert!(report.rejected.is_empty());
        let first = &report.table.rows()[0];
        assert!((first.disp_amp - 0.25).abs() < 1e-3);
        assert!((first.phase.unwrap() - 15.0).abs() < 0.5);
        assert!(first.stress.is_some());

        let failure = report.failure_result().unwrap();
        assert!((failure.failure_cycle as i64 - 6100).abs() <= 200);
    }

    #[test]
    fn bad_block_is_rejected_and_the_rest_kept() {
        let mut rows = test_rows(&[100, 200, 300]);
        // a sample of the second block
        rows[53 + 10][1] = "overload".to_string();

        let report = analyse(&raw(rows), &config()).unwrap();

        assert_eq!(report.table.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].row, 63);
        assert!(report.table.get(200).is_none());
        // too few cycles for a failure estimate, the table stands
        assert!(matches!(report.failure, Err(Error::NoFailurePoint(_))));
    }

    #[test]
    fn out_of_order_cycles_stop_the_run() {
        let rows = test_rows(&[100, 300, 200]);

        match analyse(&raw(rows), &config()) {
            Err(Error::Ordering {
                previous,
                offending,
                row,
            }) => assert_eq!((previous, offending, row), (300, 200, 2 * 53 + 3)),
            other => panic!("expected an ordering error, got {:?}", other.map(|r| r.table.len())),
        }
    }

    #[test]
    fn ordering_error_names_the_file_row_after_a_rejected_block() {
        let mut rows = test_rows(&[100, 200, 300, 250]);
        rows[53 + 10][2] = "---".to_string();

        match analyse(&raw(rows), &config()) {
            Err(Error::Ordering {
                previous,
                offending,
                row,
            }) => {
                assert_eq!((previous, offending), (300, 250));
                // first sample of the fourth block, not its place among kept cycles
                assert_eq!(row, 3 * 53 + 3);
            }
            other => panic!("expected an ordering error, got {:?}", other.map(|r| r.table.len())),
        }
    }

    #[test]
    fn basic_run_skips_stress_but_locates_failure() {
        let cycles: Vec<u64> = (1..=100).map(|c| c * 100).collect();
        let mut c = config();
        c.detail = Detail::Basic;

        let report = analyse(&raw(test_rows(&cycles)), &c).unwrap();

        assert!(report.table.rows().iter().all(|m| m.stress.is_none()));
        assert_eq!(report.table.cross_section(), None);
        let failure = report.failure_result().unwrap();
        assert!((failure.failure_cycle as i64 - 6100).abs() <= 200);
    }

    #[test]
    fn wrong_language_is_a_missing_column() {
        let c = Config::new(DecimalSeparator::Point, Locale::Spanish, Layout::FourColumn, 10.0, None).unwrap();
        assert!(matches!(
            analyse(&raw(test_rows(&[100])), &c),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn file_round_trip_to_results() {
        let dir = TempDir::new("mtscyclic").unwrap();
        let input = dir.path().join("specimen.txt");
        let output = dir.path().join("results.csv");

        let mut file = fs::File::create(&input).unwrap();
        // blank lines in the preamble do not count towards the four
        writeln!(file, "MTS 793\n\nSpecimen 7\nStation 1\n\nFatigue run").unwrap();
        writeln!(file, "Time\tAxial Desplazamiento\tForce\tCycle").unwrap();
        for row in test_rows(&[100, 200, 300, 400]) {
            writeln!(file, "{}", row.join("\t")).unwrap();
        }
        drop(file);

        let c = config();
        let report = process_file(&input, &c).unwrap();
        assert_eq!(report.table.len(), 4);

        io::write_results(&output, &report, c.detail).unwrap();
        let written = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Cycle;Disp amp.(mm);"));
        assert_eq!(lines[1].split(';').count(), 19);
        assert!(lines[1].starts_with("100;"));
        // whole-test values on the first row only
        assert!(lines[2].ends_with(";;;;;;"));
        assert!(lines[1].contains(";25;"));
    }
}
