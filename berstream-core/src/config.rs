//! Decoder configuration
//!
//! These knobs are set once before a decoder is used and are shared by
//! every container it drives.

use serde::{Deserialize, Serialize};

use crate::error::{BerError, BerResult};

/// Longest length-of-length a long-form length can declare (0x7F is reserved)
pub const MAX_LENGTH_LENGTH_CAP: usize = 126;

/// Decoder-level settings
///
/// # Defaults
/// - `max_tag_length`: 1 (only single-octet tags are decoded)
/// - `max_length_length`: 1
/// - `indefinite_length_allowed`: false
/// - `max_pdu_size`: `i32::MAX`
///
/// `max_tag_length`, `max_length_length` and `indefinite_length_allowed` are
/// advisory: `validate()` checks them but the decoder does not enforce them.
/// Long-form lengths are always accepted up to 4 length octets, so a
/// `max_length_length` of 1 does not reject lengths above 255, and the
/// indefinite form is always rejected. Only `max_pdu_size` is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Octets reserved for the tag (advisory, not enforced)
    pub max_tag_length: usize,
    /// Maximum long-form length-of-length (advisory, not enforced)
    pub max_length_length: usize,
    /// Whether the indefinite length form may be enabled (advisory; the
    /// decoder rejects it regardless)
    pub indefinite_length_allowed: bool,
    /// Largest accepted PDU (root TLV header plus value), in bytes
    pub max_pdu_size: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_tag_length: 1,
            max_length_length: 1,
            indefinite_length_allowed: false,
            max_pdu_size: i32::MAX as u32,
        }
    }
}

impl DecoderConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tag_length(mut self, max_tag_length: usize) -> Self {
        self.max_tag_length = max_tag_length;
        self
    }

    pub fn with_max_length_length(mut self, max_length_length: usize) -> Self {
        self.max_length_length = max_length_length;
        self
    }

    /// Allow the indefinite length form
    pub fn allow_indefinite_length(mut self) -> Self {
        self.indefinite_length_allowed = true;
        self
    }

    pub fn with_max_pdu_size(mut self, max_pdu_size: u32) -> Self {
        self.max_pdu_size = max_pdu_size;
        self
    }

    /// Check the settings for consistency
    ///
    /// # Error Handling
    /// Returns `InvalidConfig` if:
    /// - `max_tag_length` or `max_length_length` is zero
    /// - indefinite length is allowed and `max_length_length` exceeds 126
    pub fn validate(&self) -> BerResult<()> {
        if self.max_tag_length == 0 {
            return Err(BerError::InvalidConfig(
                "max_tag_length must be at least 1".to_string(),
            ));
        }

        if self.max_length_length == 0 {
            return Err(BerError::InvalidConfig(
                "max_length_length must be at least 1".to_string(),
            ));
        }

        if self.indefinite_length_allowed && self.max_length_length > MAX_LENGTH_LENGTH_CAP {
            return Err(BerError::InvalidConfig(format!(
                "max_length_length is limited to {} bytes, got {}",
                MAX_LENGTH_LENGTH_CAP, self.max_length_length
            )));
        }

        Ok(())
    }
}
