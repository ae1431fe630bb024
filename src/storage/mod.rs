//! Object storage module
//!
//! Backends implement [`ObjectStore`]; the transfer and traversal logic only
//! ever sees that trait. MinIO and Aliyun OSS are served through the native
//! AWS S3 SDK, and [`MemoryStore`] keeps objects in process.

mod backend;
mod memory;

#[cfg(feature = "native_s3")]
mod s3;
#[cfg(feature = "native_s3")]
mod transport;

pub use backend::*;
pub use memory::*;

#[cfg(feature = "native_s3")]
pub use s3::S3Store;
#[cfg(feature = "native_s3")]
pub use transport::S3Transport;
