//! Owned TLV trees and a grammar that rebuilds them
//!
//! [`TreeGrammar`] accepts any well-formed PDU and turns the stream of
//! completed TLVs back into a [`TlvTree`]. It is handy for dumping unknown
//! PDUs and for checking the decoder against the reference encoder.

use std::fmt;

use crate::ber::encoder::BerEncoder;
use crate::ber::types::BerTag;
use crate::error::{BerResult, GrammarError};
use crate::tlv::container::DecodeContext;
use crate::tlv::grammar::Grammar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvTree {
    Primitive { tag: BerTag, value: Vec<u8> },
    Constructed { tag: BerTag, children: Vec<TlvTree> },
}

impl TlvTree {
    pub fn primitive(tag: BerTag, value: impl Into<Vec<u8>>) -> Self {
        TlvTree::Primitive {
            tag,
            value: value.into(),
        }
    }

    pub fn constructed(tag: BerTag, children: Vec<TlvTree>) -> Self {
        TlvTree::Constructed { tag, children }
    }

    pub fn tag(&self) -> BerTag {
        match self {
            TlvTree::Primitive { tag, .. } | TlvTree::Constructed { tag, .. } => *tag,
        }
    }

    /// Number of TLVs in the tree, this one included
    pub fn count(&self) -> usize {
        match self {
            TlvTree::Primitive { .. } => 1,
            TlvTree::Constructed { children, .. } => {
                1 + children.iter().map(TlvTree::count).sum::<usize>()
            }
        }
    }

    /// Encode the tree with definite lengths
    pub fn encode(&self) -> BerResult<Vec<u8>> {
        let mut encoder = BerEncoder::new();
        self.encode_into(&mut encoder)?;
        Ok(encoder.into_bytes())
    }

    pub fn encode_into(&self, encoder: &mut BerEncoder) -> BerResult<()> {
        match self {
            TlvTree::Primitive { tag, value } => encoder.encode_tlv(*tag, value),
            TlvTree::Constructed { tag, children } => {
                let mut content = BerEncoder::new();
                for child in children {
                    child.encode_into(&mut content)?;
                }
                encoder.encode_constructed(*tag, content.as_bytes())
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            TlvTree::Primitive { tag, value } => {
                write!(f, "{:indent$}{} ", "", tag, indent = indent)?;
                for byte in value {
                    write!(f, "{:02X}", byte)?;
                }
                writeln!(f)
            }
            TlvTree::Constructed { tag, children } => {
                writeln!(f, "{:indent$}{}", "", tag, indent = indent)?;
                for child in children {
                    child.fmt_indented(f, indent + 2)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TlvTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    /// No TLV seen yet
    Start,
    /// At least one TLV decoded; any boundary may end the PDU
    Collecting,
}

/// Grammar collecting every TLV of a PDU into a [`TlvTree`]
#[derive(Debug, Default)]
pub struct TreeGrammar {
    /// Open constructed TLVs, one per depth level
    open: Vec<(BerTag, Vec<TlvTree>)>,
    root: Option<TlvTree>,
}

impl TreeGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the tree collected so far, closing any open TLV
    pub fn take_tree(&mut self) -> Option<TlvTree> {
        self.close_to_depth(0);
        self.root.take()
    }

    fn close_to_depth(&mut self, depth: usize) {
        while self.open.len() > depth {
            if let Some((tag, children)) = self.open.pop() {
                self.attach(TlvTree::constructed(tag, children));
            }
        }
    }

    fn attach(&mut self, tree: TlvTree) {
        match self.open.last_mut() {
            Some((_, children)) => children.push(tree),
            None => self.root = Some(tree),
        }
    }
}

impl Grammar for TreeGrammar {
    type State = TreeState;

    fn name(&self) -> &str {
        "Tree"
    }

    fn initial_state(&self) -> TreeState {
        TreeState::Start
    }

    fn end_state(&self) -> TreeState {
        TreeState::Collecting
    }

    fn execute_action(&mut self, ctx: &mut DecodeContext<TreeState>) -> Result<(), GrammarError> {
        let Some(tlv) = ctx.current_tlv() else {
            return Err(GrammarError::new(self.name(), "Collecting", "no current TLV"));
        };

        let depth = tlv.depth();
        if depth > self.open.len() {
            return Err(GrammarError::new(
                self.name(),
                "Collecting",
                format!("{} at depth {} skips a level", tlv.id(), depth),
            ));
        }
        self.close_to_depth(depth);

        let tag = tlv.ber_tag();
        if tlv.is_constructed() {
            self.open.push((tag, Vec::new()));
        } else {
            let tree = TlvTree::primitive(tag, tlv.value().unwrap_or_default());
            self.attach(tree);
        }

        ctx.set_transition(ctx.transition().wrapping_add(1));
        ctx.set_grammar_state(TreeState::Collecting);
        Ok(())
    }

    fn reset(&mut self) {
        self.open.clear();
        self.root = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::types::BerTagClass;
    use quickcheck::{Arbitrary, Gen};

    const MAX_DEPTH: usize = 4;

    /// Short and long form lengths, with the 127/128 edge picked often
    fn arbitrary_value(g: &mut Gen) -> Vec<u8> {
        let length = match u8::arbitrary(g) % 4 {
            0 => 0,
            1 => *g.choose(&[126, 127, 128, 129, 255, 256]).unwrap_or(&0),
            _ => usize::arbitrary(g) % 300,
        };
        (0..length).map(|_| u8::arbitrary(g)).collect()
    }

    fn arbitrary_tag(g: &mut Gen, constructed: bool) -> BerTag {
        let classes = [
            BerTagClass::Universal,
            BerTagClass::Application,
            BerTagClass::ContextSpecific,
            BerTagClass::Private,
        ];
        let class = *g.choose(&classes).unwrap_or(&BerTagClass::Universal);
        BerTag::new(class, constructed, u8::arbitrary(g) % 31)
    }

    fn arbitrary_tree(g: &mut Gen, depth: usize) -> TlvTree {
        if depth == MAX_DEPTH || bool::arbitrary(g) {
            return TlvTree::primitive(arbitrary_tag(g, false), arbitrary_value(g));
        }
        // Zero children gives an empty constructed TLV
        let children = (0..usize::arbitrary(g) % 4)
            .map(|_| arbitrary_tree(g, depth + 1))
            .collect();
        TlvTree::constructed(arbitrary_tag(g, true), children)
    }

    impl Arbitrary for TlvTree {
        fn arbitrary(g: &mut Gen) -> Self {
            arbitrary_tree(g, 0)
        }
    }

    #[test]
    fn test_encode_tree() {
        let tree = TlvTree::constructed(
            BerTag::SEQUENCE,
            vec![
                TlvTree::primitive(BerTag::INTEGER, vec![0x01]),
                TlvTree::constructed(BerTag::context_specific(true, 0), vec![]),
            ],
        );
        assert_eq!(tree.encode().unwrap(), vec![0x30, 0x05, 0x02, 0x01, 0x01, 0xA0, 0x00]);
        assert_eq!(tree.count(), 3);
    }

    #[test]
    fn test_display() {
        let tree = TlvTree::constructed(
            BerTag::SEQUENCE,
            vec![TlvTree::primitive(BerTag::OCTET_STRING, vec![0xCA, 0xFE])],
        );
        assert_eq!(tree.to_string(), "[UNIVERSAL 16] C\n  [UNIVERSAL 4] P CAFE\n");
    }
}
