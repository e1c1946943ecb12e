//! Incremental TLV decoder
//!
//! The decoder is a state machine driven by [`Asn1Decoder::decode`]. Each
//! call consumes whatever the input holds and returns as soon as the input
//! runs dry or a PDU is complete; all progress is kept in the container, so
//! the next call resumes exactly where the previous one stopped.
//!
//! # Usage Example
//!
//! ```rust
//! use berstream_codec::tlv::{Asn1Container, Asn1Decoder, TreeGrammar};
//!
//! let pdu = [0x30, 0x06, 0x02, 0x01, 0x05, 0x04, 0x01, 0xAA];
//! let decoder = Asn1Decoder::new();
//! let mut container = Asn1Container::new(TreeGrammar::new());
//!
//! for chunk in pdu.chunks(3) {
//!     let mut input = chunk;
//!     decoder.decode(&mut input, &mut container).unwrap();
//! }
//! assert!(container.is_pdu_decoded());
//! ```

use bytes::Buf;
use log::{debug, log_enabled, trace, warn, Level};

use crate::error::{BerError, BerResult};
use crate::tlv::container::{Asn1Container, DecodeContext};
use crate::tlv::grammar::Grammar;
use crate::tlv::nesting;
use crate::tlv::node::TlvNode;
use crate::tlv::state::TlvState;
use crate::tlv::value::ValueBuffer;
use berstream_core::DecoderConfig;

/// Long-form marker bit of the first length octet
const LENGTH_LONG_FORM: u8 = 0x80;
/// Length-of-length bits of the first length octet
const LENGTH_SHORT_MASK: u8 = 0x7F;
/// Reserved length-of-length value
const LENGTH_EXTENSION_RESERVED: u8 = 0x7F;
/// Most length octets a 32-bit length can use
const MAX_LENGTH_OCTETS: u8 = 4;

/// Outcome of one sub-state step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep looping, the next state can act right away
    More,
    /// Out of input, or PDU finished; return to the caller
    Suspend,
}

/// Streaming BER decoder
///
/// The decoder itself is stateless apart from its configuration; one
/// instance can drive any number of containers.
#[derive(Debug, Clone, Default)]
pub struct Asn1Decoder {
    config: DecoderConfig,
}

impl Asn1Decoder {
    /// Create a decoder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with a custom configuration
    ///
    /// # Error Handling
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn with_config(config: DecoderConfig) -> BerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Feed `buf` into the container's state machine
    ///
    /// Consumes input until it is exhausted or the PDU is decoded. Calling it
    /// with an empty buffer before the PDU is complete changes nothing.
    ///
    /// # Error Handling
    /// Any error aborts the current PDU; the container must be cleaned before
    /// it is used again.
    pub fn decode<B: Buf, G: Grammar>(
        &self,
        buf: &mut B,
        container: &mut Asn1Container<G>,
    ) -> BerResult<()> {
        loop {
            let state = container.ctx.tlv_state;
            trace!("{}: {} ({} bytes available)", container.grammar.name(), state, buf.remaining());

            let flow = match state {
                TlvState::TagStart => tag_start(buf, &mut container.ctx),
                TlvState::LengthStart => length_start(buf, &mut container.ctx),
                TlvState::LengthPending => length_pending(buf, &mut container.ctx),
                TlvState::LengthEnd => self.length_end(&mut container.ctx),
                TlvState::ValueStart => value_start(buf, &mut container.ctx),
                TlvState::ValuePending => value_pending(buf, &mut container.ctx),
                TlvState::TlvDone => tlv_done(container),
                TlvState::PduDecoded => {
                    if buf.has_remaining() {
                        warn!(
                            "{}: PDU already decoded, {} trailing bytes left in the input",
                            container.grammar.name(),
                            buf.remaining()
                        );
                    }
                    Ok(Flow::Suspend)
                }
            };

            match flow {
                Ok(Flow::More) => {}
                Ok(Flow::Suspend) => return Ok(()),
                Err(e) => {
                    debug!(
                        "{}: decoding failed in {} after {} bytes: {}",
                        container.grammar.name(),
                        container.ctx.tlv_state,
                        container.ctx.decoded_bytes,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Length fully known: guard the PDU size and resolve the nesting
    fn length_end<S: Copy>(&self, ctx: &mut DecodeContext<S>) -> BerResult<Flow> {
        let current = ctx.current_index()?;

        if ctx.parent_tlv.is_none() {
            let size = ctx.node(current)?.size();
            if size > u64::from(self.config.max_pdu_size) {
                return Err(BerError::PduTooLarge {
                    length: size,
                    max: self.config.max_pdu_size,
                });
            }
        }

        nesting::resolve(ctx)?;

        ctx.tlv_state = if ctx.node(current)?.length == 0 {
            TlvState::TlvDone
        } else {
            TlvState::ValueStart
        };
        Ok(Flow::More)
    }
}

/// Read the tag octet and open a new TLV under the current parent
fn tag_start<B: Buf, S: Copy>(buf: &mut B, ctx: &mut DecodeContext<S>) -> BerResult<Flow> {
    if !buf.has_remaining() {
        return Ok(Flow::Suspend);
    }

    let tag = buf.get_u8();
    ctx.decoded_bytes += 1;

    let parent = ctx.parent_tlv;
    let (enclosing, depth) = match ctx.parent_tlv() {
        Some(node) => (Some(node.id), node.depth + 1),
        None => (None, 0),
    };
    let id = ctx.next_tlv_id();
    let index = ctx.arena.insert(TlvNode::new(id, tag, parent, enclosing, depth));

    trace!("{}: tag 0x{:02X} at depth {}", id, tag, depth);

    ctx.current_tlv = Some(index);
    ctx.grammar_end_allowed = false;
    ctx.tlv_state = TlvState::LengthStart;
    Ok(Flow::More)
}

/// Read the first length octet and pick the short or long form
fn length_start<B: Buf, S: Copy>(buf: &mut B, ctx: &mut DecodeContext<S>) -> BerResult<Flow> {
    if !buf.has_remaining() {
        return Ok(Flow::Suspend);
    }

    let octet = buf.get_u8();
    ctx.decoded_bytes += 1;
    let current = ctx.current_index()?;
    let tlv = ctx.node_mut(current)?;

    if octet & LENGTH_LONG_FORM == 0 {
        tlv.length = u32::from(octet);
        tlv.length_bytes_expected = 1;
        tlv.length_bytes_read = 1;
        ctx.tlv_state = TlvState::LengthEnd;
        return Ok(Flow::More);
    }

    let octets = octet & LENGTH_SHORT_MASK;
    // 0x80 announces the indefinite form, 0xFF is reserved
    if octets == LENGTH_EXTENSION_RESERVED || octets == 0 {
        return Err(BerError::ReservedLengthForm(octet));
    }
    if octets > MAX_LENGTH_OCTETS {
        return Err(BerError::LengthOverflow { octets });
    }

    tlv.length = 0;
    tlv.length_bytes_expected = 1 + octets;
    tlv.length_bytes_read = 1;
    ctx.tlv_state = TlvState::LengthPending;
    Ok(Flow::More)
}

/// Accumulate long-form length octets, possibly across several calls
fn length_pending<B: Buf, S: Copy>(buf: &mut B, ctx: &mut DecodeContext<S>) -> BerResult<Flow> {
    let current = ctx.current_index()?;
    let tlv = ctx.node_mut(current)?;
    let mut consumed = 0;

    while !tlv.length_complete() {
        if !buf.has_remaining() {
            ctx.decoded_bytes += consumed;
            return Ok(Flow::Suspend);
        }
        tlv.length = (tlv.length << 8) | u32::from(buf.get_u8());
        tlv.length_bytes_read += 1;
        consumed += 1;
    }

    ctx.decoded_bytes += consumed;
    ctx.tlv_state = TlvState::LengthEnd;
    Ok(Flow::More)
}

/// Start the value: constructed TLVs carry none, primitive ones get a buffer
fn value_start<B: Buf, S: Copy>(buf: &mut B, ctx: &mut DecodeContext<S>) -> BerResult<Flow> {
    let current = ctx.current_index()?;
    let tlv = ctx.node_mut(current)?;

    if tlv.is_constructed() {
        ctx.tlv_state = TlvState::TlvDone;
        return Ok(Flow::More);
    }

    if !buf.has_remaining() {
        return Ok(Flow::Suspend);
    }

    let mut value = ValueBuffer::new(tlv.length as usize);
    let consumed = value.fill_from(buf);
    let complete = value.is_complete();
    tlv.value = Some(value);

    ctx.decoded_bytes += consumed as u64;
    if complete {
        ctx.tlv_state = TlvState::TlvDone;
        Ok(Flow::More)
    } else {
        ctx.tlv_state = TlvState::ValuePending;
        Ok(Flow::Suspend)
    }
}

/// Keep filling a partially received value
fn value_pending<B: Buf, S: Copy>(buf: &mut B, ctx: &mut DecodeContext<S>) -> BerResult<Flow> {
    let current = ctx.current_index()?;
    let state = ctx.tlv_state;
    let value = ctx
        .node_mut(current)?
        .value
        .as_mut()
        .ok_or_else(|| BerError::InvalidState(format!("no value buffer in {}", state)))?;

    let consumed = value.fill_from(buf);
    let complete = value.is_complete();

    ctx.decoded_bytes += consumed as u64;
    if complete {
        ctx.tlv_state = TlvState::TlvDone;
        Ok(Flow::More)
    } else {
        Ok(Flow::Suspend)
    }
}

/// Run the grammar action, then decide whether the PDU is over
fn tlv_done<G: Grammar>(container: &mut Asn1Container<G>) -> BerResult<Flow> {
    let Asn1Container { grammar, ctx } = container;

    grammar.execute_action(ctx)?;

    if log_enabled!(Level::Debug) {
        if let Some(tlv) = ctx.current_tlv() {
            debug!("{}: decoded {}, open: {}", grammar.name(), tlv, ctx.dump_open_chain());
        }
    }

    if !ctx.is_tlv_decoded()? {
        ctx.release_completed();
        ctx.tlv_state = TlvState::TagStart;
        return Ok(Flow::More);
    }

    if ctx.grammar_state() == grammar.end_state() || ctx.grammar_end_allowed {
        debug!("{}: PDU decoded, {} bytes", grammar.name(), ctx.decoded_bytes);
        ctx.tlv_state = TlvState::PduDecoded;
        Ok(Flow::More)
    } else {
        Err(BerError::TruncatedPdu)
    }
}
