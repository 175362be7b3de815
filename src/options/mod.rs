/// These are the data structures for command line options as well as
/// the initial default values.

use cyclic::config::FitOptions;
use cyclic::optimise::Method;
use cyclic::COMMENT;

pub mod builder;
pub mod clap;

#[derive(Debug, Clone, PartialEq)]
pub enum Verbosity {
    Verbose,
    Terse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminatingOutput {
    List,
    None,
}

/// Option data for processing a cyclic test file.
///
/// Values are kept as typed in so that a bad answer can be reported
/// against the option that carried it.
#[derive(Debug, Clone)]
pub struct MtsOptions {
    /// Raw instrument export to process.
    pub infile: String,
    /// Decimal separator of the numbers in the data file.
    pub separator: String,
    /// Language the instrument software wrote the file in.
    pub language: String,
    /// Number of data columns (4 or 6).
    pub rows: String,
    /// Test frequency in Hz. Zero means not given.
    pub frequency: f64,
    /// Specimen cross-section sides in mm.
    pub side1: Option<f64>,
    pub side2: Option<f64>,
    /// Duration of half a loading cycle in s.
    pub half_cycle: f64,
    pub truncation: String,
    pub fit_method: Method,
    pub fit_maxiter: usize,
    pub fit_tol: f64,
    /// Leave out stresses and the failure estimate.
    pub basic: bool,
    /// Results file. Results go to stdout when empty.
    pub outfile: String,
    /// SVG chart of the minimum displacement.
    pub chart: String,
    pub output: TerminatingOutput,
    pub verbosity: Verbosity,
}

impl std::fmt::Display for MtsOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "{}infile: {:?}", COMMENT, self.infile)?;
        writeln!(f, "{}separator: {:?}", COMMENT, self.separator)?;
        writeln!(f, "{}language: {:?}", COMMENT, self.language)?;
        writeln!(f, "{}rows: {:?}", COMMENT, self.rows)?;
        writeln!(f, "{}frequency: {:?}", COMMENT, self.frequency)?;
        writeln!(f, "{}side1: {:?}", COMMENT, self.side1)?;
        writeln!(f, "{}side2: {:?}", COMMENT, self.side2)?;
        writeln!(f, "{}half_cycle: {:?}", COMMENT, self.half_cycle)?;
        writeln!(f, "{}truncation: {:?}", COMMENT, self.truncation)?;
        writeln!(f, "{}fit: {} maxiter {} tol {:e}", COMMENT, self.fit_method, self.fit_maxiter, self.fit_tol)?;
        writeln!(f, "{}basic: {:?}", COMMENT, self.basic)?;
        writeln!(f, "{}outfile: {:?}", COMMENT, self.outfile)?;
        write!(f, "{}chart: {:?}", COMMENT, self.chart)
    }
}

pub fn get_default_options() -> MtsOptions {
    let fit = FitOptions::default();

    MtsOptions {
        infile: "".to_string(),

        // data file format
        separator: ",".to_string(),
        language: "english".to_string(),
        rows: "4".to_string(),
        truncation: "truncate".to_string(),

        // test description
        frequency: 0.0, // Hz, must be given
        side1: None,    // mm
        side2: None,
        half_cycle: cyclic::config::HALF_CYCLE_DURATION,

        // sine fits
        fit_method: fit.method,
        fit_maxiter: fit.max_iter,
        fit_tol: fit.tol,

        // output options
        basic: false,
        outfile: "".to_string(),
        chart: "".to_string(),
        output: TerminatingOutput::None,
        verbosity: Verbosity::Terse,
    }
}
