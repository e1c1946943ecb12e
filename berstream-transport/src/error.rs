//! Error types shared with `berstream-core`

pub use berstream_core::error::{BerError, BerResult};
