//! Incremental BER/DER decoding for ASN.1 protocol PDUs
//!
//! This crate decodes Tag-Length-Value structures that arrive fragmented
//! across several network reads (LDAP, Kerberos, ...). Decoding resumes
//! exactly where the previous read stopped, and every completed TLV is
//! handed to a protocol-specific [`Grammar`](tlv::Grammar).
//!
//! - [`ber`]: tag and length types, and a reference encoder
//! - [`tlv`]: the decoding engine (container, decoder, grammars)
//!
//! # Limitations
//! - Only single-octet tags are interpreted
//! - Indefinite lengths are rejected

pub mod ber;
pub mod error;
pub mod tlv;

pub use ber::{BerEncoder, BerLength, BerTag, BerTagClass};
pub use error::{BerError, BerResult, GrammarError};
pub use tlv::{
    Asn1Container, Asn1Decoder, DecodeContext, Grammar, TlvId, TlvNode, TlvState, TlvTree,
    TreeGrammar,
};
