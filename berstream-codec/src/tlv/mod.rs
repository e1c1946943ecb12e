//! Incremental TLV decoding engine
//!
//! PDUs arriving in arbitrary fragments are decoded without buffering the
//! whole message: the [`Asn1Container`] keeps the state machine position,
//! the TLV being assembled and the chain of open constructed TLVs with their
//! remaining byte budgets, and [`Asn1Decoder::decode`] resumes from there on
//! every call.
//!
//! ```text
//! bytes -> Asn1Decoder (tag/length/value sub-states)
//!            -> nesting resolution at each completed length
//!            -> Grammar::execute_action at each completed TLV
//!            -> PDU complete? PduDecoded : next tag
//! ```
//!
//! TLV nodes live in a per-container arena; parent links are arena indices
//! and nodes are released as soon as they are closed and consumed.

pub mod arena;
pub mod container;
pub mod decoder;
pub mod grammar;
mod nesting;
pub mod node;
pub mod state;
pub mod tree;
pub mod value;

pub use arena::TlvIndex;
pub use container::{Asn1Container, DecodeContext};
pub use decoder::Asn1Decoder;
pub use grammar::Grammar;
pub use node::{TlvId, TlvNode};
pub use state::TlvState;
pub use tree::{TlvTree, TreeGrammar, TreeState};
pub use value::ValueBuffer;
