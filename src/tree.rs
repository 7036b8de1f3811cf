//! Huffman tree construction
//!
//! Nodes are merged bottom-up from a min-heap keyed on `(frequency, sequence)`.
//! Leaves enter the heap in ascending symbol order and every merged node gets the
//! next sequence number, so ties always resolve toward the node inserted first and
//! two builds over the same [`FrequencyTable`] produce the same tree. Code lengths
//! are optimal under any tie order; the exact bit patterns depend on this rule.

use crate::error::CodecError;
use crate::frequency::FrequencyTable;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// A leaf payload: a real input symbol, or the zero-weight placeholder that pads a
/// single-symbol alphabet out to a two-leaf tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Char(char),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: Symbol,
        freq: u64,
    },
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        freq: u64,
    },
}

impl Node {
    pub fn leaf(symbol: Symbol, freq: u64) -> Self {
        Node::Leaf { symbol, freq }
    }

    pub fn merge(left: Node, right: Node) -> Self {
        let freq = left.freq() + right.freq();
        Node::Internal {
            left: Box::new(left),
            right: Box::new(right),
            freq,
        }
    }

    pub fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } | Node::Internal { freq, .. } => *freq,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct HeapEntry {
    seq: u64,
    node: Node,
}

impl Eq for HeapEntry {}
impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.node.freq() == other.node.freq() && self.seq == other.seq
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on (freq, seq)
        other
            .node
            .freq()
            .cmp(&self.node.freq())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Build the Huffman tree for `freq`.
///
/// A single distinct symbol yields `Internal(real leaf, placeholder leaf)` so the
/// symbol gets the 1-bit code `0`. Fails with [`CodecError::EmptyInput`] on an
/// empty table.
pub fn build_tree(freq: &FrequencyTable) -> Result<Node, CodecError> {
    let start = Instant::now();
    let mut leaves = freq.iter().map(|(c, n)| Node::leaf(Symbol::Char(c), n));

    let root = match freq.len() {
        0 => return Err(CodecError::EmptyInput),
        1 => {
            let only = leaves.next().ok_or(CodecError::EmptyInput)?;
            warn!("single distinct symbol, synthesizing placeholder leaf");
            Node::merge(only, Node::leaf(Symbol::Placeholder, 0))
        }
        _ => {
            // fresh queue per build
            let mut heap: BinaryHeap<HeapEntry> = leaves
                .enumerate()
                .map(|(i, node)| HeapEntry {
                    seq: i as u64,
                    node,
                })
                .collect();
            let mut next_seq = heap.len() as u64;

            loop {
                let (left, right) = match (heap.pop(), heap.pop()) {
                    (Some(left), Some(right)) => (left, right),
                    (Some(last), None) => break last.node,
                    _ => return Err(CodecError::EmptyInput),
                };
                trace!(
                    left = left.node.freq(),
                    right = right.node.freq(),
                    "merging nodes"
                );
                heap.push(HeapEntry {
                    seq: next_seq,
                    node: Node::merge(left.node, right.node),
                });
                next_seq += 1;
            }
        }
    };

    debug!(
        symbols = freq.len(),
        depth = root.depth(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "built huffman tree"
    );
    Ok(root)
}
