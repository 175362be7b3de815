//! Split the raw row stream into per-cycle blocks.
//!
//! The instrument writes a block of about 50 samples every so many
//! cycles. Each block is announced by a marker row whose time column
//! reads `Points: ` (or `Puntos: `) and whose displacement column holds
//! the number of samples that follow. Two descriptive rows (units and
//! a blank) sit between the marker and the first sample.

use std::ops::Range;

use log::warn;

use crate::config::{Config, DecimalSeparator, Layout, TruncationPolicy, MARKER_OFFSET};
use crate::cycle::{CycleBlock, RawSample};
use crate::error::{Error, Result};
use crate::io::RawTable;

/// Where a block's samples are in the raw table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Row of the marker announcing the block.
    pub marker_row: usize,
    /// First sample row.
    pub start: usize,
    /// Number of samples the marker declares.
    pub declared: usize,
    /// Number of sample rows actually available.
    pub len: usize,
}

impl BlockSpan {
    pub fn rows(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    pub fn is_truncated(&self) -> bool {
        self.len < self.declared
    }
}

/// Lazy iterator over the block spans of a raw table, in file order.
///
/// A span never runs into the next marker row or past the end of the
/// table. A marker whose point count cannot be read yields a
/// `MalformedRow` error and iteration carries on with the next marker.
pub struct Segmenter<'a> {
    table: &'a RawTable,
    marker_col: usize,
    count_col: usize,
    marker_text: &'static str,
    separator: DecimalSeparator,
    next_marker: Option<usize>,
}

impl<'a> Segmenter<'a> {
    pub fn new(table: &'a RawTable, config: &Config) -> Result<Segmenter<'a>> {
        let marker_col = table.column(config.locale.marker_column())?;
        let count_col = table.column(config.locale.count_column())?;
        let marker_text = config.locale.marker_text();

        let mut segmenter = Segmenter {
            table,
            marker_col,
            count_col,
            marker_text,
            separator: config.decimal_separator,
            next_marker: None,
        };
        segmenter.next_marker = segmenter.find_marker(0);

        Ok(segmenter)
    }

    fn is_marker(&self, row: usize) -> bool {
        self.table.cell(row, self.marker_col).trim() == self.marker_text.trim()
    }

    fn find_marker(&self, from: usize) -> Option<usize> {
        (from..self.table.len()).find(|&row| self.is_marker(row))
    }

    fn point_count(&self, row: usize) -> Result<usize> {
        let cell = self.table.cell(row, self.count_col).trim();
        if let Ok(count) = cell.parse::<usize>() {
            return Ok(count);
        }

        // some exports write the count as a float
        match self.separator.parse(cell) {
            Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as usize),
            _ => Err(Error::malformed(row, format!("point count '{}' is not an integer", cell))),
        }
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = Result<BlockSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        let marker_row = self.next_marker?;
        self.next_marker = self.find_marker(marker_row + 1);

        let declared = match self.point_count(marker_row) {
            Ok(count) => count,
            Err(why) => return Some(Err(why)),
        };

        let limit = self.next_marker.unwrap_or_else(|| self.table.len());
        let start = marker_row + MARKER_OFFSET;
        let end = (start + declared).min(limit);

        Some(Ok(BlockSpan {
            marker_row,
            start,
            declared,
            len: end.saturating_sub(start),
        }))
    }
}

/// Convert the rows of a span into a numeric block.
///
/// Every cell of the layout's columns must be a number. The cycle
/// number is taken from the first sample.
pub fn extract_block(table: &RawTable, span: &BlockSpan, config: &Config) -> Result<CycleBlock> {
    if span.is_truncated() {
        match config.truncation {
            TruncationPolicy::Reject => {
                return Err(Error::malformed(
                    span.marker_row,
                    format!("block declares {} samples but only {} are present", span.declared, span.len),
                ))
            }
            TruncationPolicy::Truncate => warn!(
                "block at row {} declares {} samples, using the {} present",
                span.marker_row, span.declared, span.len
            ),
        }
    }

    let samples = span
        .rows()
        .map(|row| parse_sample(table, row, config.layout, config.decimal_separator))
        .collect::<Result<Vec<RawSample>>>()?;

    let first = samples
        .first()
        .ok_or_else(|| Error::malformed(span.marker_row, "block has no samples"))?;
    let cycle_value = first.column(config.layout.cycle_column());
    let cycle = match cycle_value {
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => v as u64,
        _ => {
            return Err(Error::malformed(
                span.start,
                format!("cycle number {:?} is not a whole number", cycle_value),
            ))
        }
    };

    CycleBlock::new(cycle, span.start, samples)
}

fn parse_sample(table: &RawTable, row: usize, layout: Layout, separator: DecimalSeparator) -> Result<RawSample> {
    let mut values = Vec::with_capacity(layout.columns());
    for col in 0..layout.columns() {
        let cell = table.cell(row, col);
        match separator.parse(cell) {
            Some(v) => values.push(v),
            None => {
                return Err(Error::malformed(
                    row,
                    format!("cell '{}' in column {} is not a number", cell, col),
                ))
            }
        }
    }
    let extra_cells = table.row(row).map_or(0, |cells| cells.len()).max(layout.columns());
    let extras = (layout.columns()..extra_cells).filter_map(|col| separator.parse(table.cell(row, col)));

    Ok(RawSample {
        time: values[0],
        displacement: values[1],
        force: values[2],
        extra: values[3..].iter().cloned().chain(extras).collect(),
    })
}
