//! Per-connection PDU session
//!
//! A session owns one container and decodes every complete PDU that shows
//! up in the bytes it is fed. After each PDU the grammar's message is taken
//! and the container is cleaned so decoding continues with the next PDU in
//! the same buffer. A PDU split across reads stays in the container until
//! the next feed completes it.
//!
//! # Usage Example
//!
//! ```rust
//! use berstream_codec::tlv::TreeGrammar;
//! use berstream_transport::PduSession;
//!
//! let mut session = PduSession::new(TreeGrammar::new());
//! let mut messages = Vec::new();
//!
//! let mut read: &[u8] = &[0x05, 0x00, 0x04, 0x02, 0xCA];
//! session.feed(&mut read, &mut messages).unwrap();
//! assert_eq!(messages.len(), 1);
//!
//! let mut read: &[u8] = &[0xFE];
//! session.feed(&mut read, &mut messages).unwrap();
//! assert_eq!(messages.len(), 2);
//! ```

use berstream_codec::tlv::{Asn1Container, Asn1Decoder, Grammar, TlvTree, TreeGrammar};
use bytes::Buf;
use log::{debug, warn};

use crate::error::BerResult;
use crate::statistics::DecodeStatistics;

/// A grammar that assembles one message per PDU
pub trait MessageGrammar: Grammar {
    type Message;

    /// Take the message built from the PDU just decoded
    fn take_message(&mut self) -> Option<Self::Message>;
}

impl MessageGrammar for TreeGrammar {
    type Message = TlvTree;

    fn take_message(&mut self) -> Option<TlvTree> {
        self.take_tree()
    }
}

/// Decoding state of one connection
pub struct PduSession<G: MessageGrammar> {
    decoder: Asn1Decoder,
    container: Asn1Container<G>,
    statistics: DecodeStatistics,
}

impl<G: MessageGrammar> PduSession<G> {
    /// Create a session with a default decoder
    pub fn new(grammar: G) -> Self {
        Self::with_decoder(Asn1Decoder::new(), grammar)
    }

    pub fn with_decoder(decoder: Asn1Decoder, grammar: G) -> Self {
        Self {
            decoder,
            container: Asn1Container::new(grammar),
            statistics: DecodeStatistics::new(),
        }
    }

    /// Decode every complete PDU held by `buf`
    ///
    /// Messages are appended to `out` as their PDU completes; the bytes of a
    /// trailing partial PDU are consumed and kept in the container.
    ///
    /// # Returns
    /// Number of PDUs decoded by this call
    ///
    /// # Error Handling
    /// On a decode error the container is cleaned and the error returned.
    /// Messages decoded before the error are already in `out`. The
    /// connection should be closed: the stream position of the next PDU is
    /// unknown.
    pub fn feed<B, E>(&mut self, buf: &mut B, out: &mut E) -> BerResult<usize>
    where
        B: Buf,
        E: Extend<G::Message>,
    {
        let available = buf.remaining();
        let result = self.decode_all(buf, out);
        self.statistics.add_bytes_received(available - buf.remaining());

        if let Err(e) = &result {
            warn!(
                "{}: dropping PDU after {} bytes: {}",
                self.container.grammar().name(),
                self.container.context().decoded_bytes(),
                e
            );
            self.statistics.increment_pdus_rejected();
            self.container.clean();
        } else if self.has_partial_pdu() {
            self.statistics.increment_partial_feeds();
        }

        result
    }

    fn decode_all<B, E>(&mut self, buf: &mut B, out: &mut E) -> BerResult<usize>
    where
        B: Buf,
        E: Extend<G::Message>,
    {
        let mut decoded = 0;

        loop {
            self.decoder.decode(buf, &mut self.container)?;
            if !self.container.is_pdu_decoded() {
                return Ok(decoded);
            }

            debug!(
                "{}: PDU of {} bytes decoded",
                self.container.grammar().name(),
                self.container.context().decoded_bytes()
            );
            out.extend(self.container.grammar_mut().take_message());
            self.statistics.increment_pdus_decoded();
            self.container.clean();
            decoded += 1;

            if !buf.has_remaining() {
                return Ok(decoded);
            }
        }
    }

    /// Check whether part of a PDU has been consumed but not completed
    pub fn has_partial_pdu(&self) -> bool {
        self.container.context().decoded_bytes() > 0 && !self.container.is_pdu_decoded()
    }

    /// Bytes of the current partial PDU consumed so far
    pub fn buffered_bytes(&self) -> usize {
        self.container.context().decoded_bytes() as usize
    }

    /// Drop any partial PDU
    pub fn reset(&mut self) {
        self.container.clean();
    }

    pub fn container(&self) -> &Asn1Container<G> {
        &self.container
    }

    pub fn statistics(&self) -> &DecodeStatistics {
        &self.statistics
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut DecodeStatistics {
        &mut self.statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berstream_codec::ber::BerTag;
    use berstream_codec::error::BerError;
    use berstream_core::DecoderConfig;

    fn octets(value: &[u8]) -> TlvTree {
        TlvTree::primitive(BerTag::OCTET_STRING, value.to_vec())
    }

    fn message(id: i64, payload: &[u8]) -> TlvTree {
        let mut id_bytes = berstream_codec::BerEncoder::new();
        id_bytes.encode_integer(id).unwrap();
        TlvTree::constructed(
            BerTag::SEQUENCE,
            vec![
                TlvTree::primitive(BerTag::INTEGER, id_bytes.as_bytes()[2..].to_vec()),
                TlvTree::constructed(BerTag::application(true, 3), vec![octets(payload)]),
            ],
        )
    }

    #[test]
    fn test_several_pdus_in_one_feed() {
        let first = message(1, b"cn=admin");
        let second = message(2, &[0x00; 200]);
        let mut bytes = first.encode().unwrap();
        bytes.extend(second.encode().unwrap());

        let mut session = PduSession::new(TreeGrammar::new());
        let mut out = Vec::new();
        let mut input = bytes.as_slice();
        assert_eq!(session.feed(&mut input, &mut out).unwrap(), 2);

        assert_eq!(out, vec![first, second]);
        assert!(!session.has_partial_pdu());
        assert_eq!(session.statistics().pdus_decoded, 2);
        assert_eq!(session.statistics().bytes_received, bytes.len() as u64);
        assert_eq!(session.statistics().partial_feeds, 0);
    }

    #[test]
    fn test_pdu_split_across_feeds() {
        let first = message(1, b"alpha");
        let second = message(2, b"beta");
        let mut bytes = first.encode().unwrap();
        bytes.extend(second.encode().unwrap());
        let split = bytes.len() - 4;

        let mut session = PduSession::new(TreeGrammar::new());
        let mut out = Vec::new();

        let mut input = &bytes[..split];
        assert_eq!(session.feed(&mut input, &mut out).unwrap(), 1);
        assert!(input.is_empty());
        assert!(session.has_partial_pdu());
        assert_eq!(session.buffered_bytes(), split - first.encode().unwrap().len());

        let mut input = &bytes[split..];
        assert_eq!(session.feed(&mut input, &mut out).unwrap(), 1);
        assert_eq!(out, vec![first, second]);
        assert_eq!(session.statistics().partial_feeds, 1);
    }

    #[test]
    fn test_error_keeps_earlier_messages_and_resets() {
        let good = message(7, b"ok");
        let mut bytes = good.encode().unwrap();
        bytes.extend_from_slice(&[0x30, 0x02, 0x04, 0x05]);

        let mut session = PduSession::new(TreeGrammar::new());
        let mut out = Vec::new();
        let mut input = bytes.as_slice();
        let err = session.feed(&mut input, &mut out).unwrap_err();

        assert!(matches!(err, BerError::ExpectedLengthExceeded { .. }));
        assert_eq!(out, vec![good.clone()]);
        assert!(!session.has_partial_pdu());
        assert_eq!(session.statistics().pdus_rejected, 1);

        // The session is usable again once the caller resynchronises
        let bytes = good.encode().unwrap();
        let mut input = bytes.as_slice();
        assert_eq!(session.feed(&mut input, &mut out).unwrap(), 1);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_decoder_configuration_is_applied() {
        let decoder = Asn1Decoder::with_config(DecoderConfig::new().with_max_pdu_size(8)).unwrap();
        let mut session = PduSession::with_decoder(decoder, TreeGrammar::new());
        let mut out = Vec::new();

        let mut input: &[u8] = &[0x04, 0x09, 0x00];
        let err = session.feed(&mut input, &mut out).unwrap_err();
        assert!(matches!(err, BerError::PduTooLarge { length: 11, max: 8 }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_reset_drops_partial_pdu() {
        let mut session = PduSession::new(TreeGrammar::new());
        let mut out = Vec::new();
        let mut input: &[u8] = &[0x30, 0x05, 0x04];
        session.feed(&mut input, &mut out).unwrap();
        assert!(session.has_partial_pdu());

        session.reset();
        assert!(!session.has_partial_pdu());
        assert_eq!(session.buffered_bytes(), 0);
    }
}
