//! TLV decoder state machine

use std::fmt;

/// Position of a container in the TLV state machine
///
/// # State Transitions
/// ```text
/// TagStart -> LengthStart
/// LengthStart -> LengthEnd            (short form)
/// LengthStart -> LengthPending        (long form)
/// LengthPending -> LengthPending      (input exhausted mid-length)
/// LengthPending -> LengthEnd
/// LengthEnd -> TlvDone                (zero length)
/// LengthEnd -> ValueStart
/// ValueStart -> TlvDone               (constructed, or value fully available)
/// ValueStart -> ValuePending
/// ValuePending -> TlvDone
/// TlvDone -> TagStart                 (PDU not finished)
/// TlvDone -> PduDecoded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TlvState {
    /// Waiting for the tag octet of a new TLV
    #[default]
    TagStart,
    /// Waiting for the first length octet
    LengthStart,
    /// Reading the octets of a long-form length
    LengthPending,
    /// Length fully known, nesting not yet resolved
    LengthEnd,
    /// Value not started
    ValueStart,
    /// Value partially read
    ValuePending,
    /// TLV complete, grammar action not yet run
    TlvDone,
    /// The whole PDU has been decoded
    PduDecoded,
}

impl TlvState {
    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            TlvState::TagStart => "TAG_STATE_START",
            TlvState::LengthStart => "LENGTH_STATE_START",
            TlvState::LengthPending => "LENGTH_STATE_PENDING",
            TlvState::LengthEnd => "LENGTH_STATE_END",
            TlvState::ValueStart => "VALUE_STATE_START",
            TlvState::ValuePending => "VALUE_STATE_PENDING",
            TlvState::TlvDone => "TLV_STATE_DONE",
            TlvState::PduDecoded => "PDU_DECODED",
        }
    }
}

impl fmt::Display for TlvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
