//! Errors raised while turning a raw test file into cycle results.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A block row could not be read as numbers, or the block is too
    /// short to describe a cycle. Only the block is lost.
    #[error("malformed block at row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// The sine fit of one signal did not converge. The cycle is kept
    /// without a phase angle.
    #[error("sine fit failed: {reason}")]
    Fit { reason: String },

    /// Cycle numbers must increase from block to block. `row` is the
    /// first sample row of the offending block.
    #[error("cycle {offending} at row {row} does not follow cycle {previous}")]
    Ordering {
        previous: u64,
        offending: u64,
        row: usize,
    },

    /// The fatigue curve has no usable knee.
    #[error("no failure point: {0}")]
    NoFailurePoint(String),

    #[error("column '{0}' not found in the data file")]
    MissingColumn(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn malformed<S: Into<String>>(row: usize, reason: S) -> Error {
        Error::MalformedRow {
            row,
            reason: reason.into(),
        }
    }

    pub fn fit<S: Into<String>>(reason: S) -> Error {
        Error::Fit {
            reason: reason.into(),
        }
    }
}
