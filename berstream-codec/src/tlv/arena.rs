//! Slot arena owning the live TLV chain of a container
//!
//! Parent links are arena indices, so nodes never own each other. A node is
//! released once nothing still open refers to it; its slot is then reused.

use crate::tlv::node::TlvNode;

/// Index of a slot in a [`TlvArena`]
///
/// Only valid while the node it was returned for is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TlvIndex(usize);

#[derive(Debug, Default)]
pub struct TlvArena {
    slots: Vec<Option<TlvNode>>,
    free: Vec<usize>,
}

impl TlvArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: TlvNode) -> TlvIndex {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                TlvIndex(slot)
            }
            None => {
                self.slots.push(Some(node));
                TlvIndex(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, index: TlvIndex) -> Option<&TlvNode> {
        self.slots.get(index.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: TlvIndex) -> Option<&mut TlvNode> {
        self.slots.get_mut(index.0).and_then(Option::as_mut)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the parent links starting at `start` (inclusive)
    pub fn chain(&self, start: Option<TlvIndex>) -> Chain<'_> {
        Chain {
            arena: self,
            next: start,
        }
    }

    /// Release every node that is not on the parent chain starting at `keep`
    pub fn retain_chain(&mut self, keep: Option<TlvIndex>) {
        let mut live = vec![false; self.slots.len()];
        let mut next = keep;
        while let Some(index) = next {
            live[index.0] = true;
            next = self.get(index).and_then(|node| node.parent);
        }

        for (slot, node) in self.slots.iter_mut().enumerate() {
            if node.is_some() && !live[slot] {
                *node = None;
                self.free.push(slot);
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

/// Iterator over a node and its ancestors
pub struct Chain<'a> {
    arena: &'a TlvArena,
    next: Option<TlvIndex>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (TlvIndex, &'a TlvNode);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let node = self.arena.get(index)?;
        self.next = node.parent;
        Some((index, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::node::TlvId;

    fn node(id: u32, parent: Option<TlvIndex>) -> TlvNode {
        TlvNode::new(TlvId(id), 0x30, parent, None, 0)
    }

    #[test]
    fn test_chain_follows_parent_links() {
        let mut arena = TlvArena::new();
        let root = arena.insert(node(0, None));
        let child = arena.insert(node(1, Some(root)));
        let leaf = arena.insert(node(2, Some(child)));

        let ids: Vec<u32> = arena.chain(Some(leaf)).map(|(_, n)| n.id().0).collect();
        assert_eq!(ids, vec![2, 1, 0]);
        assert_eq!(arena.chain(None).count(), 0);
    }

    #[test]
    fn test_retain_chain_frees_and_reuses_slots() {
        let mut arena = TlvArena::new();
        let root = arena.insert(node(0, None));
        let open = arena.insert(node(1, Some(root)));
        let closed = arena.insert(node(2, Some(root)));
        assert_eq!(arena.len(), 3);

        arena.retain_chain(Some(open));
        assert_eq!(arena.len(), 2);
        assert!(arena.get(closed).is_none());
        assert!(arena.get(root).is_some());

        let reused = arena.insert(node(3, Some(open)));
        assert_eq!(reused, closed);
        assert_eq!(arena.len(), 3);

        arena.retain_chain(None);
        assert!(arena.is_empty());
    }
}
