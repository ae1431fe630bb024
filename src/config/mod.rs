//! Configuration module for BucketSync
//!
//! Connection parameters, CLI arguments and the static label table
//! used for log lines and node names.

mod labels;
mod settings;

pub use labels::*;
pub use settings::*;
