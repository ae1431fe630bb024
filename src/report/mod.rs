//! Human-readable operation log
//!
//! Every public operation answers with log entries: one for a single
//! transfer, a newline-joined sequence for bulk operations.

mod entry;

pub use entry::*;
