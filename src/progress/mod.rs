//! Progress reporting module
//!
//! Per-transfer byte progress bars and run totals.

mod reporter;

pub use reporter::*;
