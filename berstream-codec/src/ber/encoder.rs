//! BER encoder for ASN.1 structures
//!
//! A minimal definite-length encoder, enough to produce PDUs for the
//! decoder to consume.
//!
//! # Usage Example
//!
//! ```rust
//! use berstream_codec::ber::{BerEncoder, BerTag};
//!
//! let mut inner = BerEncoder::new();
//! inner.encode_integer(12345).unwrap();
//! let mut encoder = BerEncoder::new();
//! encoder.encode_sequence(inner.as_bytes()).unwrap();
//! assert_eq!(encoder.as_bytes()[0], BerTag::SEQUENCE.to_octet());
//! ```

use crate::ber::types::{BerLength, BerTag};
use crate::error::{BerError, BerResult};

/// BER encoder for ASN.1 structures
///
/// Each encoded value is a TLV (Tag-Length-Value) triplet appended to an
/// internal `Vec<u8>`.
pub struct BerEncoder {
    buffer: Vec<u8>,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// # Error Handling
    /// Returns `PduTooLarge` if the value does not fit a 4-octet length.
    pub fn encode_tlv(&mut self, tag: BerTag, value: &[u8]) -> BerResult<()> {
        let length = u32::try_from(value.len()).map_err(|_| BerError::PduTooLarge {
            length: value.len() as u64,
            max: u32::MAX,
        })?;

        let header = BerLength::new(length);
        self.buffer.reserve(1 + header.encoded_len() + value.len());
        self.buffer.push(tag.to_octet());
        self.buffer.extend_from_slice(&header.encode());
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    /// Encode an INTEGER
    ///
    /// The value is written in minimal big-endian two's complement: 127 is
    /// one byte (0x7F), 128 is two bytes (0x00 0x80).
    pub fn encode_integer(&mut self, value: i64) -> BerResult<()> {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        while start < bytes.len() - 1 {
            let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.encode_tlv(BerTag::INTEGER, &bytes[start..])
    }

    pub fn encode_null(&mut self) -> BerResult<()> {
        self.encode_tlv(BerTag::NULL, &[])
    }

    pub fn encode_octet_string(&mut self, value: &[u8]) -> BerResult<()> {
        self.encode_tlv(BerTag::OCTET_STRING, value)
    }

    /// Encode a SEQUENCE whose elements are already encoded TLVs
    pub fn encode_sequence(&mut self, elements: &[u8]) -> BerResult<()> {
        self.encode_tlv(BerTag::SEQUENCE, elements)
    }

    /// Encode any constructed TLV whose content is already encoded
    pub fn encode_constructed(&mut self, tag: BerTag, elements: &[u8]) -> BerResult<()> {
        debug_assert!(tag.is_constructed());
        self.encode_tlv(tag, elements)
    }

    pub fn encode_context_specific(
        &mut self,
        tag_number: u8,
        value: &[u8],
        constructed: bool,
    ) -> BerResult<()> {
        self.encode_tlv(BerTag::context_specific(constructed, tag_number), value)
    }

    pub fn encode_application(
        &mut self,
        tag_number: u8,
        value: &[u8],
        constructed: bool,
    ) -> BerResult<()> {
        self.encode_tlv(BerTag::application(constructed, tag_number), value)
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for BerEncoder {
    fn default() -> Self {
        Self::new()
    }
}
