use thiserror::Error;

/// Main error type for BER decoding operations
///
/// Every decode-time variant aborts decoding of the current PDU. The
/// container that produced it must be cleaned before it is reused.
#[derive(Error, Debug)]
pub enum BerError {
    /// Long-form length declares more length octets than a 32-bit length holds
    #[error("Length overflow: cannot encode a length in more than 4 bytes (got {octets})")]
    LengthOverflow { octets: u8 },

    /// Reserved or indefinite long-form length marker
    #[error("Reserved length form: 0x{0:02X}")]
    ReservedLengthForm(u8),

    /// A child TLV does not fit in what remains of its parent
    #[error("Expected length exceeded: TLV size {tlv_size} > remaining {remaining}")]
    ExpectedLengthExceeded { tlv_size: u64, remaining: u32 },

    /// The PDU is structurally complete but the grammar expects more TLVs
    #[error("Truncated PDU: grammar cannot end at the current TLV")]
    TruncatedPdu,

    #[error("Grammar rejected the PDU: {0}")]
    GrammarRejected(#[from] GrammarError),

    #[error("PDU too large: {length} bytes (max {max})")]
    PduTooLarge { length: u64, max: u32 },

    /// The container was driven from a state it cannot be in
    #[error("Invalid decoder state: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    /// The stream ended while a PDU was still being decoded
    #[error("Unexpected end of stream with {buffered} bytes of a partial PDU decoded")]
    UnexpectedEof { buffered: usize },
}

/// Protocol-level failure reported by a grammar action
///
/// The decoder treats it as opaque and hands it back unchanged inside
/// [`BerError::GrammarRejected`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{grammar} grammar, state {state}: {message}")]
pub struct GrammarError {
    grammar: String,
    state: String,
    message: String,
}

impl GrammarError {
    pub fn new(
        grammar: impl Into<String>,
        state: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            grammar: grammar.into(),
            state: state.into(),
            message: message.into(),
        }
    }

    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type alias for BER decoding operations
pub type BerResult<T> = Result<T, BerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_error_is_carried_unchanged() {
        let err = GrammarError::new("LdapMessage", "BindRequest", "unexpected tag 0x04");
        let wrapped: BerError = err.clone().into();
        match wrapped {
            BerError::GrammarRejected(inner) => assert_eq!(inner, err),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = BerError::ReservedLengthForm(0xFF);
        assert_eq!(err.to_string(), "Reserved length form: 0xFF");

        let err = BerError::ExpectedLengthExceeded { tlv_size: 7, remaining: 3 };
        assert_eq!(err.to_string(), "Expected length exceeded: TLV size 7 > remaining 3");
    }
}
