//! Reading raw instrument files and writing cycle results.

use std::fs;
use std::io::Write;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};

use crate::config::Detail;
use crate::error::{Error, Result};
use crate::pipeline::Report;

/// The raw data file as read: column headers and rows of untyped cells.
///
/// Marker rows, blank separators and sample rows all live here side by
/// side. Nothing is interpreted until the segmenter looks at it.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> RawTable {
        RawTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Cell contents, or an empty string for cells a short row lacks.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Position of the column with the given (trimmed) header.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.trim() == name.trim())
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }
}

/// Read a delimited instrument export.
///
/// The first `header_row` non-blank lines are descriptive and skipped,
/// the next one names the columns. Blank lines count for nothing, in the
/// preamble as in the body. Rows with more cells than there are headers
/// are dropped. The file is decoded lossily since the instrument writes
/// in a Windows code page.
pub fn read_raw_table<P: AsRef<Path>>(path: P, header_row: usize, delimiter: u8) -> Result<RawTable> {
    let bytes = fs::read(path.as_ref())?;
    let text = String::from_utf8_lossy(&bytes);
    let mut descriptive = 0;
    let body = text
        .lines()
        .skip_while(|line| {
            if descriptive == header_row {
                return false;
            }
            if !line.is_empty() {
                descriptive += 1;
            }
            true
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut skipped = 0;
    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            skipped += 1;
            debug!("skipping line {:?}: {} cells for {} columns", record.position().map(|p| p.line()), record.len(), headers.len());
            continue;
        }
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    info!(
        "read {} rows from '{}' ({} bad lines skipped)",
        rows.len(),
        path.as_ref().display(),
        skipped
    );

    Ok(RawTable::from_rows(headers, rows))
}

/// Column titles of the results file, in order. The stress columns are
/// left out for a basic run.
pub fn result_headers(detail: Detail) -> Vec<&'static str> {
    let mut headers = vec!["Cycle", "Disp amp.(mm)", "Force amp. (kgf)"];
    if detail == Detail::Full {
        headers.push("Stress amp. (MPa)");
    }
    headers.extend(&["Loop area (mm*kgf)", "Phase (º)", "Disp. max. (mm)", "Disp. min. (mm)", "Force max. (kgf)"]);
    if detail == Detail::Full {
        headers.push("Stress max. (MPa)");
    }
    headers.push("Force min. (kgf)");
    if detail == Detail::Full {
        headers.push("Stress min. (MPa)");
    }
    headers.push("Loading rate (mm/min)");

    headers.push("Mean Force max-min (kgf)");
    headers.push("Mean loading rate (mm/min)");
    if detail == Detail::Full {
        headers.extend(&["Cross-section area (mm^2)", "Mean Stress max-min (MPa)"]);
    }
    headers.extend(&["Failure cycle", "Failure displacement (mm)"]);

    headers
}

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

/// Write the cycle table as semicolon separated values. Whole-test
/// values go in the trailing columns of the first row.
pub fn write_results_to<W: Write>(writer: W, report: &Report, detail: Detail) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b';').from_writer(writer);
    wtr.write_record(result_headers(detail))?;

    let aggregates = report.table.aggregates();
    let failure = report.failure_result();

    for (i, m) in report.table.rows().iter().enumerate() {
        let stress = m.stress.as_ref();
        let mut record = vec![m.cycle.to_string(), m.disp_amp.to_string(), m.force_amp.to_string()];
        if detail == Detail::Full {
            record.push(number(stress.map(|s| s.amp)));
        }
        record.push(m.loop_area.to_string());
        record.push(number(m.phase));
        record.push(m.disp_max.to_string());
        record.push(m.disp_min.to_string());
        record.push(m.force_max.to_string());
        if detail == Detail::Full {
            record.push(number(stress.map(|s| s.max)));
        }
        record.push(m.force_min.to_string());
        if detail == Detail::Full {
            record.push(number(stress.map(|s| s.min)));
        }
        record.push(m.loading_rate.to_string());

        let first = i == 0;
        let only_first = |v: Option<f64>| if first { number(v) } else { String::new() };
        record.push(only_first(aggregates.mean_force_range));
        record.push(only_first(aggregates.mean_loading_rate));
        if detail == Detail::Full {
            record.push(only_first(report.table.cross_section()));
            record.push(only_first(aggregates.mean_stress_range));
        }
        record.push(only_first(failure.map(|f| f.failure_cycle as f64)));
        record.push(only_first(failure.map(|f| f.failure_displacement)));

        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Write the results file.
pub fn write_results<P: AsRef<Path>>(path: P, report: &Report, detail: Detail) -> Result<()> {
    let file = fs::File::create(path.as_ref())?;
    write_results_to(file, report, detail)?;
    info!("results written to '{}'", path.as_ref().display());

    Ok(())
}
