//! Fingerprint-gated synchronization module
//!
//! Provides idempotent transfers between local files and object storage:
//! - Skip/proceed decision from local and remote fingerprints
//! - Single-object upload and download with per-item failure capture
//! - Folder, glob and bucket traversal with pattern filtering and key remapping

mod gate;
mod transfer;
mod traversal;

pub use gate::*;
pub use transfer::*;
pub use traversal::*;
