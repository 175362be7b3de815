//! cyclic
//! Cycle parameters and failure point of cyclic loading tests.
//!
//! Data flows one way: the raw table is split into cycle blocks
//! (`segment`), each block becomes a set of metrics (`cycle`, `phase`),
//! the metrics are folded into a `table` and the `failure` cycle is
//! located on the table. `pipeline` runs the lot.

pub static COMMENT: &str = "#  ";

pub mod chart;
pub mod config;
pub mod cycle;
pub mod error;
pub mod failure;
pub mod io;
pub mod knee;
pub mod linalg;
pub mod numbers;
pub mod optimise;
pub mod phase;
pub mod pipeline;
pub mod segment;
pub mod table;

pub use error::{Error, Result};
