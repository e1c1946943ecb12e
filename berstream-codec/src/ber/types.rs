//! BER encoding types (Tag, Length)

use std::fmt;

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types (LDAP operations, Kerberos messages)
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 8-7 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Constructed bit of a tag octet
pub const CONSTRUCTED_FLAG: u8 = 0x20;

/// Tag number bits of a single-octet tag
const TAG_NUMBER_MASK: u8 = 0x1F;

/// BER Tag
///
/// A single tag octet:
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
/// Where:
/// - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
/// - P = Primitive (0) or Constructed (1)
/// - TTTTT = Tag number (0-30); 11111 announces a multi-octet tag number
///
/// The decoder only reads the first tag octet, so a tag number of 31 is kept
/// as-is and carries no further meaning here.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag(u8);

impl BerTag {
    pub const BOOLEAN: BerTag = BerTag(0x01);
    pub const INTEGER: BerTag = BerTag(0x02);
    pub const BIT_STRING: BerTag = BerTag(0x03);
    pub const OCTET_STRING: BerTag = BerTag(0x04);
    pub const NULL: BerTag = BerTag(0x05);
    pub const ENUMERATED: BerTag = BerTag(0x0A);
    pub const SEQUENCE: BerTag = BerTag(0x30);
    pub const SET: BerTag = BerTag(0x31);

    /// Create a new BER tag
    ///
    /// # Arguments
    /// * `class` - Tag class
    /// * `constructed` - Whether this is a constructed type
    /// * `number` - Tag number, 0-30
    ///
    /// # Panics
    /// In debug builds, if `number` needs the multi-octet tag form (31 and
    /// above). Release builds keep only the low 5 bits.
    pub const fn new(class: BerTagClass, constructed: bool, number: u8) -> Self {
        debug_assert!(number < TAG_NUMBER_MASK, "tag number needs the multi-octet form");
        let constructed_bit = if constructed { CONSTRUCTED_FLAG } else { 0 };
        Self(((class as u8) << 6) | constructed_bit | (number & TAG_NUMBER_MASK))
    }

    /// Wrap a raw tag octet
    pub const fn from_octet(octet: u8) -> Self {
        Self(octet)
    }

    /// Create a Universal class tag
    pub const fn universal(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub const fn application(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub const fn private(constructed: bool, number: u8) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    /// Raw tag octet
    pub const fn to_octet(self) -> u8 {
        self.0
    }

    pub fn class(&self) -> BerTagClass {
        BerTagClass::from_bits(self.0)
    }

    pub const fn is_constructed(&self) -> bool {
        self.0 & CONSTRUCTED_FLAG != 0
    }

    pub const fn number(&self) -> u8 {
        self.0 & TAG_NUMBER_MASK
    }
}

impl fmt::Debug for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BerTag(0x{:02X})", self.0)
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class() {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT",
            BerTagClass::Private => "PRIVATE",
        };
        let form = if self.is_constructed() { "C" } else { "P" };
        write!(f, "[{} {}] {}", class, self.number(), form)
    }
}

impl From<u8> for BerTag {
    fn from(octet: u8) -> Self {
        Self(octet)
    }
}

/// BER Length encoding
///
/// Short form:
/// ```text
/// Byte: 0 L L L L L L L
/// ```
/// Where L = length value (0-127)
///
/// Long form:
/// ```text
/// First byte:  1 N N N N N N N  (N = number of length bytes, 1-4)
/// Following bytes: L L L L L L L L  (big-endian length value)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127, encoded with length-of-length
    Long(u32),
}

impl BerLength {
    /// Create a new BER length
    ///
    /// Automatically chooses short or long form based on the length value.
    pub fn new(length: u32) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// Get the length value
    pub fn value(&self) -> u32 {
        match self {
            BerLength::Short(l) => *l as u32,
            BerLength::Long(l) => *l,
        }
    }

    /// Number of octets the encoded length occupies
    pub fn encoded_len(&self) -> usize {
        match self {
            BerLength::Short(_) => 1,
            BerLength::Long(length) => 1 + Self::long_form_octets(*length),
        }
    }

    fn long_form_octets(length: u32) -> usize {
        (4 - length.leading_zeros() as usize / 8).max(1)
    }

    /// Encode length to bytes
    ///
    /// # Returns
    /// Encoded length bytes (1 byte for short form, 2-5 bytes for long form)
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BerLength::Short(length) => vec![*length],
            BerLength::Long(length) => {
                let num_bytes = Self::long_form_octets(*length);
                let mut result = Vec::with_capacity(1 + num_bytes);
                result.push(0x80 | num_bytes as u8);
                result.extend_from_slice(&length.to_be_bytes()[4 - num_bytes..]);
                result
            }
        }
    }
}
