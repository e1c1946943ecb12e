//! Core types and utilities for the streaming BER decoder
//!
//! This crate provides the error taxonomy and the decoder configuration
//! shared by the codec and transport crates.

pub mod config;
pub mod error;

pub use config::DecoderConfig;
pub use error::{BerError, BerResult, GrammarError};
