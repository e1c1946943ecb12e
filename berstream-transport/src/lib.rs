//! Transport-facing adapters for the streaming BER decoder
//!
//! The decoding engine never performs I/O. This crate sits between it and
//! the bytes a connection produces:
//!
//! - [`session`]: decodes every complete PDU found in buffered input, one
//!   container per connection
//! - [`reader`]: pulls bytes from a `tokio` stream and returns decoded
//!   messages one at a time
//! - [`statistics`]: counters for monitoring a connection

pub mod error;
pub mod reader;
pub mod session;
pub mod statistics;

pub use error::{BerError, BerResult};
pub use reader::{PduReader, ReaderSettings};
pub use session::{MessageGrammar, PduSession};
pub use statistics::DecodeStatistics;
