//! Decode container: persisted state of one PDU being decoded
//!
//! A container is created once per connection and reused across PDUs with
//! [`Asn1Container::clean`]. Everything the decoder needs to resume after a
//! partial read lives here: the state machine position, the TLV being
//! assembled and the chain of still-open constructed ancestors.
//!
//! # Usage Example
//!
//! ```rust
//! use berstream_codec::tlv::{Asn1Container, Asn1Decoder, TlvState, TreeGrammar};
//!
//! let decoder = Asn1Decoder::new();
//! let mut container = Asn1Container::new(TreeGrammar::new());
//!
//! let mut first: &[u8] = &[0x04, 0x03, 0x01];
//! decoder.decode(&mut first, &mut container).unwrap();
//! assert_eq!(container.state(), TlvState::ValuePending);
//!
//! let mut second: &[u8] = &[0x02, 0x03];
//! decoder.decode(&mut second, &mut container).unwrap();
//! assert!(container.is_pdu_decoded());
//! ```

use std::fmt::Write;

use crate::error::{BerError, BerResult};
use crate::tlv::arena::{TlvArena, TlvIndex};
use crate::tlv::grammar::Grammar;
use crate::tlv::node::{TlvId, TlvNode};
use crate::tlv::state::TlvState;

/// Decoder-owned state of a container, as seen by grammar actions
///
/// Grammars get mutable access to their own state, the transition marker
/// and the end-allowed flag; TLV nodes are only handed out by shared
/// reference.
#[derive(Debug)]
pub struct DecodeContext<S> {
    pub(crate) tlv_state: TlvState,
    grammar_state: S,
    transition: u32,
    pub(crate) grammar_end_allowed: bool,
    pub(crate) arena: TlvArena,
    pub(crate) current_tlv: Option<TlvIndex>,
    pub(crate) parent_tlv: Option<TlvIndex>,
    next_tlv_id: u32,
    pub(crate) decoded_bytes: u64,
}

impl<S: Copy> DecodeContext<S> {
    fn new(grammar_state: S) -> Self {
        Self {
            tlv_state: TlvState::TagStart,
            grammar_state,
            transition: 0,
            grammar_end_allowed: false,
            arena: TlvArena::new(),
            current_tlv: None,
            parent_tlv: None,
            next_tlv_id: 0,
            decoded_bytes: 0,
        }
    }

    /// Position in the TLV state machine
    pub fn tlv_state(&self) -> TlvState {
        self.tlv_state
    }

    pub fn grammar_state(&self) -> S {
        self.grammar_state
    }

    pub fn set_grammar_state(&mut self, state: S) {
        self.grammar_state = state;
    }

    /// Last grammar transition, opaque to the decoder
    pub fn transition(&self) -> u32 {
        self.transition
    }

    pub fn set_transition(&mut self, transition: u32) {
        self.transition = transition;
    }

    pub fn is_grammar_end_allowed(&self) -> bool {
        self.grammar_end_allowed
    }

    /// Let the PDU end after the current TLV
    ///
    /// Reset to `false` whenever a new tag is read.
    pub fn set_grammar_end_allowed(&mut self, allowed: bool) {
        self.grammar_end_allowed = allowed;
    }

    /// The TLV being assembled (or just completed, inside an action)
    pub fn current_tlv(&self) -> Option<&TlvNode> {
        self.current_tlv.and_then(|index| self.arena.get(index))
    }

    /// Innermost constructed TLV that still expects content
    pub fn parent_tlv(&self) -> Option<&TlvNode> {
        self.parent_tlv.and_then(|index| self.arena.get(index))
    }

    /// Ancestors of the current TLV, innermost first, following the budget links
    pub fn ancestors(&self) -> impl Iterator<Item = &TlvNode> + '_ {
        let start = self.current_tlv().and_then(|node| node.parent);
        self.arena.chain(start).map(|(_, node)| node)
    }

    /// Still-open constructed TLVs, innermost first
    pub fn open_chain(&self) -> impl Iterator<Item = &TlvNode> + '_ {
        self.arena.chain(self.parent_tlv).map(|(_, node)| node)
    }

    /// Octets consumed for the current PDU
    pub fn decoded_bytes(&self) -> u64 {
        self.decoded_bytes
    }

    /// Render the open TLV chain, innermost first
    pub fn dump_open_chain(&self) -> String {
        let mut out = String::new();
        for (i, node) in self.open_chain().enumerate() {
            if i > 0 {
                out.push_str(" <- ");
            }
            let _ = write!(out, "{}", node);
        }
        if out.is_empty() {
            out.push_str("<none>");
        }
        out
    }

    pub(crate) fn next_tlv_id(&mut self) -> TlvId {
        let id = TlvId(self.next_tlv_id);
        self.next_tlv_id = self.next_tlv_id.wrapping_add(1);
        id
    }

    pub(crate) fn current_index(&self) -> BerResult<TlvIndex> {
        self.current_tlv.ok_or_else(|| {
            BerError::InvalidState(format!("no current TLV in {}", self.tlv_state))
        })
    }

    pub(crate) fn node(&self, index: TlvIndex) -> BerResult<&TlvNode> {
        self.arena
            .get(index)
            .ok_or_else(|| BerError::InvalidState(format!("released TLV {:?}", index)))
    }

    pub(crate) fn node_mut(&mut self, index: TlvIndex) -> BerResult<&mut TlvNode> {
        self.arena
            .get_mut(index)
            .ok_or_else(|| BerError::InvalidState(format!("released TLV {:?}", index)))
    }

    /// Check whether the current TLV completes the PDU
    ///
    /// True when every ancestor's budget is exhausted and the current TLV
    /// itself is done: its value is fully buffered, or it expects nothing.
    pub(crate) fn is_tlv_decoded(&self) -> BerResult<bool> {
        let current = self.node(self.current_index()?)?;

        if self.arena.chain(current.parent).any(|(_, node)| node.expected_length != 0) {
            return Ok(false);
        }

        Ok(match current.value_buffer() {
            Some(value) => current.expected_length as usize == value.current_length(),
            None => current.expected_length == 0,
        })
    }

    /// Forget the finished TLV and every closed ancestor
    pub(crate) fn release_completed(&mut self) {
        self.current_tlv = None;
        self.arena.retain_chain(self.parent_tlv);
    }

    fn clean(&mut self, initial_state: S) {
        self.tlv_state = TlvState::TagStart;
        self.grammar_state = initial_state;
        self.transition = 0;
        self.grammar_end_allowed = false;
        self.arena.clear();
        self.current_tlv = None;
        self.parent_tlv = None;
        self.decoded_bytes = 0;
    }
}

/// A grammar plus the decode state it is driven with
pub struct Asn1Container<G: Grammar> {
    pub(crate) grammar: G,
    pub(crate) ctx: DecodeContext<G::State>,
}

impl<G: Grammar> Asn1Container<G> {
    /// Create a container starting in the grammar's initial state
    pub fn new(grammar: G) -> Self {
        let ctx = DecodeContext::new(grammar.initial_state());
        Self { grammar, ctx }
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn grammar_mut(&mut self) -> &mut G {
        &mut self.grammar
    }

    pub fn context(&self) -> &DecodeContext<G::State> {
        &self.ctx
    }

    pub fn state(&self) -> TlvState {
        self.ctx.tlv_state
    }

    pub fn is_pdu_decoded(&self) -> bool {
        self.ctx.tlv_state == TlvState::PduDecoded
    }

    /// Check whether the grammar sits in its designated end state
    pub fn is_grammar_end(&self) -> bool {
        self.ctx.grammar_state() == self.grammar.end_state()
    }

    /// Reset for the next PDU on the same connection
    ///
    /// TLV ids keep increasing across cleans.
    pub fn clean(&mut self) {
        self.ctx.clean(self.grammar.initial_state());
        self.grammar.reset();
    }

    pub fn into_grammar(self) -> G {
        self.grammar
    }
}
