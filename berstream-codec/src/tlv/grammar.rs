//! Grammar callback contract
//!
//! A grammar interprets the decoded TLVs of one protocol (LDAP, Kerberos,
//! ...). The decoder calls [`Grammar::execute_action`] once per completed
//! TLV, after the value is fully buffered and before it checks whether the
//! PDU is finished.

use std::fmt::Debug;

use crate::error::GrammarError;
use crate::tlv::container::DecodeContext;

pub trait Grammar {
    /// Grammar-specific state, opaque to the decoder
    type State: Copy + Eq + Debug;

    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// State a fresh or cleaned container starts in
    fn initial_state(&self) -> Self::State;

    /// State in which the grammar may legally stop
    ///
    /// When a PDU is structurally complete and the container's grammar state
    /// equals this value, the PDU is accepted.
    fn end_state(&self) -> Self::State;

    /// Interpret the TLV that was just completed
    ///
    /// The action may read the current TLV and its ancestors, update the
    /// grammar state and transition, and allow the PDU to end here. It cannot
    /// touch the length bookkeeping.
    fn execute_action(
        &mut self,
        ctx: &mut DecodeContext<Self::State>,
    ) -> Result<(), GrammarError>;

    /// Drop whatever was collected for the previous PDU
    fn reset(&mut self) {}
}
