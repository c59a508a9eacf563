use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;

use bitvec::prelude::*;

use crate::frequency::FrequencyTable;

/// A code word, most significant (first emitted) bit first.
pub type Code = BitVec<u8, Msb0>;

#[derive(Debug, PartialEq, Eq)]
pub enum NodeType {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

/// A tree node. `freq` is the total count of every leaf beneath it.
#[derive(Debug, PartialEq, Eq)]
pub struct Node {
    node_type: NodeType,
    freq: u64,
}

impl Node {
    fn new_leaf(symbol: u8, freq: u64) -> Self {
        Node {
            node_type: NodeType::Leaf(symbol),
            freq,
        }
    }

    fn new_internal(left: Node, right: Node) -> Self {
        Node {
            freq: left.freq + right.freq,
            node_type: NodeType::Internal(Box::new(left), Box::new(right)),
        }
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn freq(&self) -> u64 {
        self.freq
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::Leaf(_))
    }

    /// Child reached by following `bit`: `false` goes left, `true` right.
    /// `None` on a leaf.
    pub fn child(&self, bit: bool) -> Option<&Node> {
        match &self.node_type {
            NodeType::Leaf(_) => None,
            NodeType::Internal(left, right) => Some(if bit { right } else { left }),
        }
    }
}

/// Merge queue entry. Ordered so that `BinaryHeap` pops the lowest weight
/// first and, among equal weights, the earliest inserted.
struct Queued {
    node: Node,
    seq: u64,
}

impl Eq for Queued {}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.node.freq == other.node.freq && self.seq == other.seq
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .node
            .freq
            .cmp(&self.node.freq)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct MergeQueue {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl MergeQueue {
    fn push(&mut self, node: Node) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued { node, seq });
    }

    fn pop(&mut self) -> Option<Node> {
        self.heap.pop().map(|queued| queued.node)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Symbol to code word mapping derived from a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    fn from_root(root: &Node) -> Self {
        let mut codes = BTreeMap::new();
        if let NodeType::Leaf(symbol) = root.node_type {
            // a lone leaf has an empty path, which could never be read back
            codes.insert(symbol, bitvec![u8, Msb0; 0]);
        } else {
            fill(root, &mut Code::new(), &mut codes);
        }

        Self { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<&BitSlice<u8, Msb0>> {
        self.codes.get(&symbol).map(|code| code.as_bitslice())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitSlice<u8, Msb0>)> + '_ {
        self.codes
            .iter()
            .map(|(&symbol, code)| (symbol, code.as_bitslice()))
    }

    /// True when no code word is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        self.codes.iter().all(|(a, code_a)| {
            self.codes
                .iter()
                .all(|(b, code_b)| a == b || !code_b.starts_with(code_a.as_bitslice()))
        })
    }
}

/// Renders a code word as a string of `0` and `1`.
pub fn code_string(code: &BitSlice<u8, Msb0>) -> String {
    code.iter().map(|bit| if *bit { '1' } else { '0' }).collect()
}

/// A built tree together with its code table, computed once at build time.
#[derive(Debug)]
pub struct HuffmanTree {
    root: Node,
    codes: CodeTable,
}

impl HuffmanTree {
    /// Builds the tree for `freqs`, or `None` when the table is empty.
    ///
    /// Leaves enter the queue in ascending symbol order. Each step removes
    /// the two lightest nodes, the first becoming the left (0) child and the
    /// second the right (1) child.
    pub fn build(freqs: &FrequencyTable) -> Option<Self> {
        let mut pqueue = MergeQueue::default();
        for (symbol, freq) in freqs.iter() {
            pqueue.push(Node::new_leaf(symbol, freq));
        }

        while pqueue.len() > 1 {
            let ln = pqueue.pop().expect("checked with while loop condition");
            let rn = pqueue.pop().expect("checked with while loop condition");
            pqueue.push(Node::new_internal(ln, rn));
        }

        let root = pqueue.pop()?;
        let codes = CodeTable::from_root(&root);
        let tree = Self { root, codes };
        log::debug!(
            "built tree: {} leaves, weight {}, depth {}",
            tree.leaf_count(),
            tree.weight(),
            tree.depth()
        );

        Some(tree)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn codes(&self) -> &CodeTable {
        &self.codes
    }

    /// Total weight, equal to the length of the input the tree was built for.
    pub fn weight(&self) -> u64 {
        self.root.freq
    }

    pub fn is_single_leaf(&self) -> bool {
        self.root.is_leaf()
    }

    pub fn leaf_count(&self) -> usize {
        self.codes.len()
    }

    /// Length of the longest code word.
    pub fn depth(&self) -> usize {
        self.codes.iter().map(|(_, code)| code.len()).max().unwrap_or(0)
    }

    /// Number of payload bits needed to encode every leaf's occurrences.
    pub fn encoded_bits(&self) -> u64 {
        if self.is_single_leaf() {
            self.root.freq
        } else {
            encoded_bits(&self.root, 0)
        }
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, code) in self.codes.iter() {
            writeln!(f, "{symbol:#04x}: {}", code_string(code))?;
        }
        Ok(())
    }
}

fn fill(node: &Node, path: &mut Code, dict: &mut BTreeMap<u8, Code>) {
    match &node.node_type {
        NodeType::Leaf(symbol) => {
            let _ = dict.insert(*symbol, path.clone());
        }
        NodeType::Internal(ln, rn) => {
            path.push(false);
            fill(ln, path, dict);
            path.pop();

            path.push(true);
            fill(rn, path, dict);
            path.pop();
        }
    }
}

fn encoded_bits(node: &Node, level: u64) -> u64 {
    match &node.node_type {
        NodeType::Leaf(_) => node.freq * level,
        NodeType::Internal(ln, rn) => encoded_bits(ln, level + 1) + encoded_bits(rn, level + 1),
    }
}
