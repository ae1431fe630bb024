//! Content fingerprinting module
//!
//! Streams local files through MD5 (ETag-compatible), SHA-256 or BLAKE3
//! in fixed-size blocks, so memory stays bounded for any file size.

mod fingerprint;

pub use fingerprint::*;
