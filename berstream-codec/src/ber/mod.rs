//! BER (Basic Encoding Rules) tag/length types and a reference encoder
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! The first tag octet carries:
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number** (5 bits): 0-30, or 11111 for a multi-octet tag number
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127, bit 8 clear
//! - **Long form** (2-5 bytes): first byte `0x80 | N`, then N big-endian octets.
//!   `0x80` (indefinite) and `0xFF` (reserved) are rejected by the decoder.
//!
//! ## Value Encoding
//!
//! - **Primitive types**: raw bytes (INTEGER, OCTET STRING, etc.)
//! - **Constructed types**: concatenated child TLVs (SEQUENCE, SET, etc.)
//!
//! The incremental decoder lives in [`crate::tlv`].

pub mod encoder;
pub mod types;

pub use encoder::BerEncoder;
pub use types::{BerLength, BerTag, BerTagClass, CONSTRUCTED_FLAG};
