//! berstream - incremental BER/DER decoding for ASN.1 protocols
//!
//! Protocols such as LDAP and Kerberos send BER-encoded PDUs over streams
//! where one PDU may arrive in many reads, and one read may hold several
//! PDUs. This library decodes them byte by byte as they arrive, keeping all
//! progress between reads, and hands each completed TLV to a
//! protocol-specific grammar.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `berstream-core`: Error types and decoder configuration
//! - `berstream-codec`: BER tag/length types, reference encoder, TLV
//!   decoding engine and the tree grammar
//! - `berstream-transport`: Per-connection sessions, async stream reader
//!   and statistics
//!
//! # Usage
//!
//! ```rust
//! use berstream::codec::{Asn1Container, Asn1Decoder, TreeGrammar};
//!
//! // SEQUENCE { INTEGER 5, OCTET STRING AA }, received in two reads
//! let decoder = Asn1Decoder::new();
//! let mut container = Asn1Container::new(TreeGrammar::new());
//!
//! let mut first: &[u8] = &[0x30, 0x06, 0x02, 0x01];
//! decoder.decode(&mut first, &mut container).unwrap();
//! assert!(!container.is_pdu_decoded());
//!
//! let mut second: &[u8] = &[0x05, 0x04, 0x01, 0xAA];
//! decoder.decode(&mut second, &mut container).unwrap();
//! assert!(container.is_pdu_decoded());
//!
//! let tree = container.grammar_mut().take_tree().unwrap();
//! assert_eq!(tree.count(), 3);
//! ```

// Re-export core types
pub use berstream_core::{BerError, BerResult, DecoderConfig, GrammarError};

// Re-export the decoding engine
pub mod codec {
    pub use berstream_codec::ber::*;
    pub use berstream_codec::tlv::*;
}

// Re-export transport adapters
pub mod transport {
    pub use berstream_transport::{
        DecodeStatistics, MessageGrammar, PduReader, PduSession, ReaderSettings,
    };
}
