// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity arenas for nodes, memory banks, and stored positions.
//!
//! Every buffer is sized once at construction. Allocation moves a cursor forward
//! and rewinding sets it back to zero; nothing is freed or reallocated in between.

use alloc::vec;
use alloc::vec::Vec;

use crate::geometry::Geometry;
use crate::types::NodeFlags;

/// Maximum number of memory banks a single node may hold.
pub const MAX_BANKS_PER_NODE: usize = 16;

/// Position reference stored for items when positions are not kept.
pub(crate) const NO_POSITION: usize = usize::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    pub(crate) const ROOT: Self = Self(0);

    const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }

    /// The `i`-th sibling of a contiguously allocated child block starting here.
    pub(crate) const fn offset(self, i: usize) -> Self {
        Self(self.0 + i)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct BankIdx(usize);

impl BankIdx {
    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) depth: usize,
    pub(crate) flags: NodeFlags,
    pub(crate) items: usize,
    bank_count: usize,
    banks: [BankIdx; MAX_BANKS_PER_NODE],
    pub(crate) first_child: Option<NodeIdx>,
}

impl Node {
    const fn new(depth: usize) -> Self {
        Self {
            depth,
            flags: NodeFlags::empty(),
            items: 0,
            bank_count: 0,
            banks: [BankIdx(0); MAX_BANKS_PER_NODE],
            first_child: None,
        }
    }

    pub(crate) const fn bank_count(&self) -> usize {
        self.bank_count
    }

    pub(crate) const fn capacity(&self, bank_size: usize) -> usize {
        self.bank_count * bank_size
    }

    pub(crate) fn has_bank_room(&self) -> bool {
        self.bank_count < MAX_BANKS_PER_NODE
    }

    pub(crate) fn push_bank(&mut self, bank: BankIdx) {
        debug_assert!(self.has_bank_room(), "node bank list is full");
        self.banks[self.bank_count] = bank;
        self.bank_count += 1;
    }

    /// Arena slot of the node's `i`-th item.
    #[inline]
    pub(crate) fn slot(&self, i: usize, bank_size: usize) -> usize {
        self.banks[i / bank_size].get() * bank_size + i % bank_size
    }
}

/// Node records plus their packed bounds (`2 * D` floats per node).
#[derive(Debug)]
pub(crate) struct NodeArena {
    dimension: usize,
    max_nodes: usize,
    nodes: Vec<Node>,
    bounds: Vec<f32>,
}

impl NodeArena {
    pub(crate) fn new(dimension: usize, max_nodes: usize) -> Self {
        Self {
            dimension,
            max_nodes,
            nodes: Vec::with_capacity(max_nodes),
            bounds: vec![0.0; max_nodes * 2 * dimension],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn rewind(&mut self) {
        self.nodes.clear();
    }

    /// Rewind and register a root covering `min..=max`.
    pub(crate) fn reset_root(&mut self, min: &[f32], max: &[f32]) {
        self.rewind();
        let (root_min, root_max) = self.bounds[..2 * self.dimension].split_at_mut(self.dimension);
        root_min.copy_from_slice(min);
        root_max.copy_from_slice(max);
        self.nodes.push(Node::new(0));
    }

    /// Register all `2^D` children of `parent` as one contiguous block.
    ///
    /// Returns `None`, allocating nothing, when the block does not fit.
    pub(crate) fn alloc_children(&mut self, parent: NodeIdx, geometry: Geometry) -> Option<NodeIdx> {
        let count = 1_usize << self.dimension;
        let first = self.nodes.len();
        if first + count > self.max_nodes {
            return None;
        }
        let stride = 2 * self.dimension;
        let depth = self.nodes[parent.get()].depth + 1;
        let (head, tail) = self.bounds.split_at_mut(first * stride);
        let packed = &head[parent.get() * stride..(parent.get() + 1) * stride];
        let (parent_min, parent_max) = packed.split_at(self.dimension);
        geometry.subdivide(parent_min, parent_max, &mut tail[..count * stride]);
        self.nodes
            .extend(core::iter::repeat_n(Node::new(depth), count));
        Some(NodeIdx::new(first))
    }

    #[inline]
    pub(crate) fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.get()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.get()]
    }

    /// `(min, max)` of a node.
    #[inline]
    pub(crate) fn bounds(&self, idx: NodeIdx) -> (&[f32], &[f32]) {
        let stride = 2 * self.dimension;
        self.bounds[idx.get() * stride..(idx.get() + 1) * stride].split_at(self.dimension)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeIdx, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIdx::new(i), n))
    }
}

/// Item records: one position reference and one payload per slot, handed out bank by bank.
#[derive(Debug)]
pub(crate) struct BankArena {
    bank_size: usize,
    item_size: usize,
    total_banks: usize,
    cursor: usize,
    position_refs: Vec<usize>,
    payloads: Vec<u8>,
}

impl BankArena {
    pub(crate) fn new(bank_size: usize, item_size: usize, total_banks: usize) -> Self {
        let slots = bank_size * total_banks;
        Self {
            bank_size,
            item_size,
            total_banks,
            cursor: 0,
            position_refs: vec![NO_POSITION; slots],
            payloads: vec![0; slots * item_size],
        }
    }

    pub(crate) const fn bank_size(&self) -> usize {
        self.bank_size
    }

    pub(crate) const fn allocated(&self) -> usize {
        self.cursor
    }

    pub(crate) fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn alloc(&mut self) -> Option<BankIdx> {
        if self.cursor == self.total_banks {
            return None;
        }
        let bank = BankIdx(self.cursor);
        self.cursor += 1;
        Some(bank)
    }

    pub(crate) fn write(&mut self, slot: usize, position_ref: usize, payload: &[u8]) {
        self.position_refs[slot] = position_ref;
        let start = slot * self.item_size;
        self.payloads[start..start + self.item_size].copy_from_slice(payload);
    }

    #[inline]
    pub(crate) fn position_ref(&self, slot: usize) -> usize {
        self.position_refs[slot]
    }

    #[inline]
    pub(crate) fn payload(&self, slot: usize) -> &[u8] {
        let start = slot * self.item_size;
        &self.payloads[start..start + self.item_size]
    }
}

/// Exact coordinates of inserted items, D floats each.
#[derive(Debug)]
pub(crate) struct PositionBank {
    dimension: usize,
    len: usize,
    coords: Vec<f32>,
}

impl PositionBank {
    pub(crate) fn new(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            len: 0,
            coords: vec![0.0; capacity * dimension],
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_full(&self) -> bool {
        (self.len + 1) * self.dimension > self.coords.len()
    }

    pub(crate) fn rewind(&mut self) {
        self.len = 0;
    }

    /// Append a coordinate. The caller checks [`is_full`](Self::is_full) first.
    pub(crate) fn push(&mut self, point: &[f32]) -> usize {
        let idx = self.len;
        self.coords[idx * self.dimension..(idx + 1) * self.dimension].copy_from_slice(point);
        self.len += 1;
        idx
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> &[f32] {
        &self.coords[idx * self.dimension..(idx + 1) * self.dimension]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_are_all_or_nothing() {
        // Root + one quad block fits; a second block does not.
        let mut arena = NodeArena::new(2, 7);
        arena.reset_root(&[0.0, 0.0], &[4.0, 4.0]);
        let first = arena
            .alloc_children(NodeIdx::ROOT, Geometry::Planar)
            .expect("first block fits");
        assert_eq!(first.get(), 1);
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.node(first.offset(3)).depth, 1);
        assert_eq!(arena.bounds(first.offset(3)), (&[2.0, 2.0][..], &[4.0, 4.0][..]));

        assert!(arena.alloc_children(first, Geometry::Planar).is_none());
        assert_eq!(arena.len(), 5, "a failed block leaves the arena untouched");
    }

    #[test]
    fn rewind_keeps_capacity() {
        let mut arena = NodeArena::new(3, 9);
        arena.reset_root(&[0.0; 3], &[1.0; 3]);
        let _ = arena.alloc_children(NodeIdx::ROOT, Geometry::Spatial);
        assert_eq!(arena.len(), 9);
        arena.reset_root(&[-1.0; 3], &[1.0; 3]);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.bounds(NodeIdx::ROOT).0, &[-1.0; 3]);
        assert!(arena.alloc_children(NodeIdx::ROOT, Geometry::Spatial).is_some());
    }

    #[test]
    fn bank_cursor_exhausts_and_rewinds() {
        let mut banks = BankArena::new(4, 2, 2);
        let a = banks.alloc().expect("bank 0");
        let b = banks.alloc().expect("bank 1");
        assert_ne!(a, b);
        assert!(banks.alloc().is_none());
        assert_eq!(banks.allocated(), 2);

        let mut node = Node::new(0);
        node.push_bank(b);
        node.push_bank(a);
        // Item 5 lives in the node's second bank (arena bank 0), offset 1.
        assert_eq!(node.slot(5, 4), 1);
        assert_eq!(node.slot(2, 4), 6);
        banks.write(node.slot(5, 4), 7, &[0xAB, 0xCD]);
        assert_eq!(banks.payload(1), &[0xAB, 0xCD]);
        assert_eq!(banks.position_ref(1), 7);

        banks.rewind();
        assert_eq!(banks.alloc(), Some(a));
    }

    #[test]
    fn node_bank_list_is_bounded() {
        let mut node = Node::new(3);
        for i in 0..MAX_BANKS_PER_NODE {
            assert!(node.has_bank_room());
            node.push_bank(BankIdx(i));
        }
        assert!(!node.has_bank_room());
        assert_eq!(node.capacity(8), 8 * MAX_BANKS_PER_NODE);
    }

    #[test]
    fn position_bank_fills_up() {
        let mut positions = PositionBank::new(2, 2);
        assert_eq!(positions.push(&[1.0, 2.0]), 0);
        assert!(!positions.is_full());
        assert_eq!(positions.push(&[3.0, 4.0]), 1);
        assert!(positions.is_full());
        assert_eq!(positions.get(1), &[3.0, 4.0]);
        positions.rewind();
        assert_eq!(positions.len(), 0);
        assert!(!positions.is_full());
    }
}
