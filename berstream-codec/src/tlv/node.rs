//! A single decoded Tag-Length-Value unit

use std::fmt;

use crate::ber::types::BerTag;
use crate::tlv::arena::TlvIndex;
use crate::tlv::value::ValueBuffer;

/// Identifier handed out by a container, unique for its lifetime
///
/// Ids keep increasing across PDUs, so grammars and logs can correlate
/// TLVs even after their arena slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TlvId(pub u32);

impl fmt::Display for TlvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TLV#{}", self.0)
    }
}

/// One TLV being assembled or still open
///
/// # Encoding Format
/// ```text
/// [tag: 1 octet] [length: 1 or 1+N octets] [value: length octets]
/// ```
/// The tag and length are decoded octet by octet into this node, so a TLV
/// split between two reads keeps its partial length (`length_bytes_read`
/// of `length_bytes_expected`) until the next call.
///
/// # Length Budget
/// - `length`: declared value length
/// - `expected_length`: for an open constructed TLV, the value octets its
///   remaining children may still use; the root starts with its full length
/// - `parent`: the open TLV whose budget this one was charged to
///
/// Length bookkeeping is owned by the decoder; grammars only ever see a
/// shared reference.
#[derive(Debug, Clone)]
pub struct TlvNode {
    pub(crate) id: TlvId,
    pub(crate) tag: u8,
    pub(crate) length: u32,
    pub(crate) length_bytes_expected: u8,
    pub(crate) length_bytes_read: u8,
    pub(crate) expected_length: u32,
    pub(crate) value: Option<ValueBuffer>,
    pub(crate) parent: Option<TlvIndex>,
    pub(crate) enclosing: Option<TlvId>,
    pub(crate) depth: usize,
}

impl TlvNode {
    pub(crate) fn new(
        id: TlvId,
        tag: u8,
        parent: Option<TlvIndex>,
        enclosing: Option<TlvId>,
        depth: usize,
    ) -> Self {
        Self {
            id,
            tag,
            length: 0,
            length_bytes_expected: 0,
            length_bytes_read: 0,
            expected_length: 0,
            value: None,
            parent,
            enclosing,
            depth,
        }
    }

    pub fn id(&self) -> TlvId {
        self.id
    }

    /// Raw tag octet
    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn ber_tag(&self) -> BerTag {
        BerTag::from_octet(self.tag)
    }

    pub fn is_constructed(&self) -> bool {
        self.ber_tag().is_constructed()
    }

    /// Declared value length
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Octets taken by the length field (1 for short form, 1 + N for long form)
    pub fn length_bytes(&self) -> u8 {
        self.length_bytes_expected
    }

    /// Remaining value budget for the children of a constructed TLV
    pub fn expected_length(&self) -> u32 {
        self.expected_length
    }

    /// Total octets this TLV occupies inside its parent
    ///
    /// Counts the length octets as they were read, not as a minimal
    /// encoding would write them: `0x82 0x00 0x05` is a valid length of 5.
    pub fn size(&self) -> u64 {
        1 + u64::from(self.length_bytes_expected) + u64::from(self.length)
    }

    /// Value octets, once at least one has been received
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_ref().map(ValueBuffer::as_slice)
    }

    pub fn value_buffer(&self) -> Option<&ValueBuffer> {
        self.value.as_ref()
    }

    /// Id of the TLV this one was nested in when its tag was read
    pub fn enclosing(&self) -> Option<TlvId> {
        self.enclosing
    }

    /// Nesting depth, 0 for the PDU root
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn length_complete(&self) -> bool {
        self.length_bytes_read == self.length_bytes_expected
    }
}

impl fmt::Display for TlvNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 0x{:02X} L={} E={}",
            self.id, self.tag, self.length, self.expected_length
        )
    }
}
