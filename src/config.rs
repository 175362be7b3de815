//! Run configuration for processing a cyclic test file.
//!
//! Everything the operator used to be asked for interactively ends up
//! in a [`Config`]. The free-form answers are parsed into closed enums
//! once, so the rest of the pipeline never compares strings.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::optimise;

/// Conversion from kgf to N.
pub const GRAVITY: f64 = 9.81;

/// Time in seconds between a displacement peak and valley of the test
/// protocol. Used for the loading rate.
pub const HALF_CYCLE_DURATION: f64 = 0.05;

/// Rows between a marker row and the first sample of its block.
pub const MARKER_OFFSET: usize = 3;

/// Lines preceding the column header line in an MTS export.
pub const HEADER_ROW: usize = 4;

/// Decimal separator used in the numeric cells of the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalSeparator {
    Point,
    Comma,
}

impl DecimalSeparator {
    /// Parse a cell as a float after normalising the decimal separator.
    pub fn parse(self, cell: &str) -> Option<f64> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }

        let value = match self {
            DecimalSeparator::Point => cell.parse::<f64>(),
            DecimalSeparator::Comma => cell.replace(',', ".").parse::<f64>(),
        };
        value.ok()
    }
}

impl FromStr for DecimalSeparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "." | "point" => Ok(DecimalSeparator::Point),
            "," | "comma" => Ok(DecimalSeparator::Comma),
            other => Err(Error::Config(format!(
                "unknown decimal separator '{}', use ',' or '.'",
                other
            ))),
        }
    }
}

/// Language the instrument software wrote the file in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    English,
    Spanish,
}

impl Locale {
    /// Column holding the marker text on marker rows (and time otherwise).
    pub fn marker_column(self) -> &'static str {
        match self {
            Locale::English => "Time",
            Locale::Spanish => "Tiempo",
        }
    }

    /// Text announcing the point count of the next block.
    pub fn marker_text(self) -> &'static str {
        match self {
            Locale::English => "Points: ",
            Locale::Spanish => "Puntos: ",
        }
    }

    /// Column holding the point count on marker rows (and displacement
    /// otherwise). The names are those the instrument actually writes.
    pub fn count_column(self) -> &'static str {
        match self {
            Locale::English => "Axial Desplazamiento",
            Locale::Spanish => "Channel 1 Displacement",
        }
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "e" | "en" | "english" => Ok(Locale::English),
            "s" | "es" | "spanish" => Ok(Locale::Spanish),
            other => Err(Error::Config(format!(
                "unknown language '{}', use 'english' or 'spanish'",
                other
            ))),
        }
    }
}

/// Column layout of the sample rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    FourColumn,
    SixColumn,
}

impl Layout {
    pub fn from_rows(rows: usize) -> Result<Layout> {
        match rows {
            4 => Ok(Layout::FourColumn),
            6 => Ok(Layout::SixColumn),
            n => Err(Error::Config(format!(
                "unsupported number of data columns {}, use 4 or 6",
                n
            ))),
        }
    }

    /// Number of numeric columns in a sample row.
    pub fn columns(self) -> usize {
        match self {
            Layout::FourColumn => 4,
            Layout::SixColumn => 6,
        }
    }

    /// Column holding the cycle number.
    pub fn cycle_column(self) -> usize {
        self.columns() - 1
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::Config(format!("number of columns '{}' is not an integer", s)))?;
        Layout::from_rows(rows)
    }
}

/// What to do with a block that has fewer rows than its marker declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPolicy {
    /// Keep the rows that are there.
    Truncate,
    /// Drop the block.
    Reject,
}

impl FromStr for TruncationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "truncate" => Ok(TruncationPolicy::Truncate),
            "reject" => Ok(TruncationPolicy::Reject),
            other => Err(Error::Config(format!("unknown truncation policy '{}'", other))),
        }
    }
}

/// Amount of derived output produced by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// No stresses. Amplitudes, loop area, phase, loading rate and the
    /// failure estimate.
    Basic,
    /// Adds stresses, the cross-section and the mean stress range.
    Full,
}

/// Settings for the per-cycle sine fits.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub method: optimise::Method,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            method: optimise::Method::Levenberg,
            max_iter: 200,
            tol: 1.49012e-8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub decimal_separator: DecimalSeparator,
    pub locale: Locale,
    pub layout: Layout,
    /// Test frequency in Hz.
    pub test_frequency_hz: f64,
    /// Specimen cross-section in mm^2. Stresses need it.
    pub cross_section_mm2: Option<f64>,
    pub half_cycle_duration: f64,
    pub truncation: TruncationPolicy,
    pub fit: FitOptions,
    pub detail: Detail,
}

impl Config {
    pub fn new(
        decimal_separator: DecimalSeparator,
        locale: Locale,
        layout: Layout,
        test_frequency_hz: f64,
        cross_section_mm2: Option<f64>,
    ) -> Result<Config> {
        let config = Config {
            decimal_separator,
            locale,
            layout,
            test_frequency_hz,
            cross_section_mm2,
            half_cycle_duration: HALF_CYCLE_DURATION,
            truncation: TruncationPolicy::Truncate,
            fit: FitOptions::default(),
            detail: Detail::Full,
        };
        config.validate()?;

        Ok(config)
    }

    /// Check the numeric settings. Called once before any row is read.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_frequency_hz.is_finite() && self.test_frequency_hz > 0.0) {
            return Err(Error::Config(format!(
                "test frequency must be positive, got {}",
                self.test_frequency_hz
            )));
        }
        if let Some(area) = self.cross_section_mm2 {
            if !(area.is_finite() && area > 0.0) {
                return Err(Error::Config(format!(
                    "cross-section area must be positive, got {}",
                    area
                )));
            }
        }
        if !(self.half_cycle_duration.is_finite() && self.half_cycle_duration > 0.0) {
            return Err(Error::Config(format!(
                "half cycle duration must be positive, got {}",
                self.half_cycle_duration
            )));
        }
        if self.fit.max_iter == 0 {
            return Err(Error::Config("fit iteration limit must be at least 1".to_string()));
        }
        if !(self.fit.tol.is_finite() && self.fit.tol > 0.0) {
            return Err(Error::Config(format!(
                "fit tolerance must be positive, got {}",
                self.fit.tol
            )));
        }

        Ok(())
    }

    /// Angular frequency of the loading in rad/s.
    pub fn omega(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.test_frequency_hz
    }

    /// Cross-section used for stresses, if stresses are wanted.
    pub fn stress_area(&self) -> Option<f64> {
        match self.detail {
            Detail::Full => self.cross_section_mm2,
            Detail::Basic => None,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "decimal_separator: {:?}", self.decimal_separator)?;
        writeln!(f, "locale: {:?}", self.locale)?;
        writeln!(f, "layout: {:?}", self.layout)?;
        writeln!(f, "test_frequency_hz: {}", self.test_frequency_hz)?;
        writeln!(f, "cross_section_mm2: {:?}", self.cross_section_mm2)?;
        writeln!(f, "half_cycle_duration: {}", self.half_cycle_duration)?;
        writeln!(f, "truncation: {:?}", self.truncation)?;
        writeln!(f, "fit: {:?}", self.fit)?;
        write!(f, "detail: {:?}", self.detail)
    }
}
