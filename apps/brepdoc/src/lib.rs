//! # brepdoc
//!
//! Library half of the brepdoc binary: command line interface and
//! configuration loading over `brepdoc-core`.

pub mod cli;
pub mod config;
