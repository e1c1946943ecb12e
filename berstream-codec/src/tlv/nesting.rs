//! Nesting resolution, run once per completed length
//!
//! Decides where the current TLV sits in the open TLV chain: charges its
//! size to the enclosing budget, closes every ancestor that is now complete
//! and opens the TLV itself when it is constructed and non-empty.

use log::debug;

use crate::error::{BerError, BerResult};
use crate::tlv::arena::{TlvArena, TlvIndex};
use crate::tlv::container::DecodeContext;

/// How the current TLV relates to the open parent
///
/// The TLV's total size (header and value) is compared with the parent's
/// remaining `expected_length`:
///
/// ```text
/// SEQUENCE L=8       parent budget 8
///   OCTET STRING L=3 size 5 < 8  -> Underflow, budget left 3
///   INTEGER L=1      size 3 == 3 -> ExactFill, SEQUENCE closes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// First TLV of the PDU
    Root,
    /// Does not fit in what the parent still expects
    Overflow { tlv_size: u64, remaining: u32 },
    /// Uses up exactly what the parent still expects
    ExactFill { parent: TlvIndex },
    /// Leaves part of the parent's budget for later siblings
    Underflow { parent: TlvIndex, tlv_size: u32 },
}

fn place<S: Copy>(ctx: &DecodeContext<S>, current: TlvIndex) -> BerResult<Placement> {
    let Some(parent) = ctx.parent_tlv else {
        return Ok(Placement::Root);
    };

    let remaining = ctx.node(parent)?.expected_length;
    let tlv_size = ctx.node(current)?.size();

    Ok(match tlv_size.cmp(&u64::from(remaining)) {
        std::cmp::Ordering::Greater => Placement::Overflow { tlv_size, remaining },
        std::cmp::Ordering::Equal => Placement::ExactFill { parent },
        // Smaller than a u32 budget, so it fits
        std::cmp::Ordering::Less => Placement::Underflow {
            parent,
            tlv_size: tlv_size as u32,
        },
    })
}

/// Skip every ancestor whose budget is exhausted, starting at `from`
///
/// Returns the innermost TLV that still expects content, or `None` once the
/// whole chain is closed.
fn first_open_ancestor(arena: &TlvArena, from: Option<TlvIndex>) -> Option<TlvIndex> {
    arena
        .chain(from)
        .find(|(_, node)| node.expected_length != 0)
        .map(|(index, _)| index)
}

/// Resolve the nesting of the current TLV once its length is known
///
/// # Resolution
/// - Root: the TLV's own length becomes the PDU budget and it is the open
///   parent
/// - Overflow: the PDU is rejected
/// - ExactFill: the parent's budget drops to 0. A non-empty constructed TLV
///   becomes the open parent; otherwise the open parent moves up to the
///   first ancestor that still has budget, which may close several levels
///   at once (`30 06 30 04 30 02 05 00`)
/// - Underflow: the TLV's size is charged to the parent, and a non-empty
///   constructed TLV becomes the open parent
///
/// An empty constructed TLV is never opened: it has no children that could
/// close it.
///
/// # Error Handling
/// Returns `ExpectedLengthExceeded` if the TLV is larger than the remaining
/// budget of its parent.
pub(crate) fn resolve<S: Copy>(ctx: &mut DecodeContext<S>) -> BerResult<()> {
    let current = ctx.current_index()?;
    let placement = place(ctx, current)?;
    let (length, constructed) = {
        let node = ctx.node(current)?;
        (node.length, node.is_constructed())
    };

    debug!("nesting of {:?}: {:?}", current, placement);

    match placement {
        Placement::Root => {
            ctx.node_mut(current)?.expected_length = length;
            ctx.parent_tlv = Some(current);
        }
        Placement::Overflow { tlv_size, remaining } => {
            return Err(BerError::ExpectedLengthExceeded { tlv_size, remaining });
        }
        Placement::ExactFill { parent } => {
            ctx.node_mut(parent)?.expected_length = 0;
            ctx.node_mut(current)?.expected_length = length;

            if constructed && length != 0 {
                ctx.node_mut(current)?.parent = Some(parent);
                ctx.parent_tlv = Some(current);
            } else {
                let open = first_open_ancestor(&ctx.arena, Some(parent));
                if constructed {
                    ctx.node_mut(current)?.parent = open;
                }
                ctx.parent_tlv = open;
            }
        }
        Placement::Underflow { parent, tlv_size } => {
            ctx.node_mut(parent)?.expected_length -= tlv_size;
            ctx.node_mut(current)?.expected_length = length;

            // An empty constructed TLV has no children to budget
            if constructed && length != 0 {
                ctx.node_mut(current)?.parent = Some(parent);
                ctx.parent_tlv = Some(current);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::node::{TlvId, TlvNode};

    /// Build a context whose open chain is `budgets` (outermost first) and
    /// whose current TLV is a fresh child of the innermost one.
    fn context_with(budgets: &[u32], tag: u8, length: u32) -> DecodeContext<()> {
        let mut ctx = crate::tlv::Asn1Container::new(crate::tlv::tests::NoopGrammar).ctx;
        let mut parent = None;
        for (depth, budget) in budgets.iter().enumerate() {
            let id = ctx.next_tlv_id();
            let mut node = TlvNode::new(id, 0x30, parent, None, depth);
            node.length = *budget;
            node.expected_length = *budget;
            parent = Some(ctx.arena.insert(node));
        }
        ctx.parent_tlv = parent;

        let id = ctx.next_tlv_id();
        let mut node = TlvNode::new(id, tag, parent, None, budgets.len());
        node.length = length;
        node.length_bytes_expected = 1;
        node.length_bytes_read = 1;
        ctx.current_tlv = Some(ctx.arena.insert(node));
        ctx
    }

    fn budgets(ctx: &DecodeContext<()>) -> Vec<u32> {
        ctx.open_chain().map(TlvNode::expected_length).collect()
    }

    #[test]
    fn test_root_becomes_parent() {
        let mut ctx = context_with(&[], 0x30, 10);
        resolve(&mut ctx).unwrap();
        assert_eq!(ctx.parent_tlv, ctx.current_tlv);
        assert_eq!(budgets(&ctx), vec![10]);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut ctx = context_with(&[4], 0x04, 3);
        let err = resolve(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            BerError::ExpectedLengthExceeded { tlv_size: 5, remaining: 4 }
        ));
    }

    #[test]
    fn test_underflow_charges_parent() {
        let mut ctx = context_with(&[10], 0x04, 3);
        resolve(&mut ctx).unwrap();
        assert_eq!(budgets(&ctx), vec![5]);
    }

    #[test]
    fn test_underflow_constructed_opens() {
        let mut ctx = context_with(&[10], 0x30, 3);
        resolve(&mut ctx).unwrap();
        assert_eq!(ctx.parent_tlv, ctx.current_tlv);
        assert_eq!(budgets(&ctx), vec![3, 5]);
    }

    #[test]
    fn test_underflow_empty_constructed_stays_closed() {
        let mut ctx = context_with(&[10], 0x30, 0);
        let parent = ctx.parent_tlv;
        resolve(&mut ctx).unwrap();
        assert_eq!(ctx.parent_tlv, parent);
        assert_eq!(budgets(&ctx), vec![8]);
    }

    #[test]
    fn test_exact_fill_primitive_closes_ancestors() {
        // Two wrappers complete together with their last leaf
        let mut ctx = context_with(&[20, 7, 5], 0x04, 3);
        // Inner wrappers were already charged down to their last child
        let chain: Vec<TlvIndex> = ctx.arena.chain(ctx.parent_tlv).map(|(i, _)| i).collect();
        ctx.node_mut(chain[1]).unwrap().expected_length = 0;
        resolve(&mut ctx).unwrap();
        assert_eq!(ctx.parent_tlv, Some(chain[2]));
        assert_eq!(budgets(&ctx), vec![20]);
    }

    #[test]
    fn test_exact_fill_closes_whole_pdu() {
        let mut ctx = context_with(&[2], 0x30, 0);
        resolve(&mut ctx).unwrap();
        assert_eq!(ctx.parent_tlv, None);
        assert_eq!(ctx.current_tlv().unwrap().parent, None);
        assert!(ctx.is_tlv_decoded().unwrap());
    }

    #[test]
    fn test_exact_fill_constructed_becomes_parent() {
        let mut ctx = context_with(&[6], 0x30, 4);
        resolve(&mut ctx).unwrap();
        assert_eq!(ctx.parent_tlv, ctx.current_tlv);
        assert_eq!(budgets(&ctx), vec![4, 0]);
        assert_eq!(ctx.current_tlv().unwrap().id(), TlvId(1));
    }
}
