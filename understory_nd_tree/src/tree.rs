// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: configuration, lifecycle, insertion, queries.

use core::ops::ControlFlow;

use crate::arena::{BankArena, MAX_BANKS_PER_NODE, NO_POSITION, NodeArena, NodeIdx, PositionBank};
use crate::geometry::Geometry;
use crate::types::{Aabb, Arena, Error, NodeFlags};

/// Largest supported dimension. A subdivided node has `2^D` children.
pub const MAX_DIMENSION: usize = 16;

/// Capacities fixed for the lifetime of an [`NdTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    /// Number of axes (1..=[`MAX_DIMENSION`]).
    pub dimension: usize,
    /// Byte size of the payload attached to every item. May be zero.
    pub item_size: usize,
    /// Ceiling for [`SubdivisionPolicy::items_per_node`]; also sizes memory banks.
    pub max_items_per_node: usize,
    /// Size of the node arena.
    pub max_nodes: usize,
    /// Item slots in the memory-bank arena, and coordinates in the position bank.
    ///
    /// Slots are handed to nodes a whole bank at a time, so a node's last bank is
    /// usually partly empty. Each node holding items can leave up to
    /// `bank_size() - 1` slots unused; size this with headroom over the item count.
    pub max_items_total: usize,
    /// Keep each item's coordinate so queries can filter exactly.
    pub store_positions: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            dimension: 2,
            item_size: 4,
            max_items_per_node: 128,
            max_nodes: 100_000,
            max_items_total: 100_000,
            store_positions: true,
        }
    }
}

impl TreeConfig {
    /// Item slots per memory bank.
    ///
    /// Chosen so that [`MAX_BANKS_PER_NODE`] banks cover `max_items_per_node`.
    pub const fn bank_size(&self) -> usize {
        self.max_items_per_node.div_ceil(MAX_BANKS_PER_NODE)
    }

    /// Number of banks in the memory-bank arena.
    pub const fn bank_count(&self) -> usize {
        self.max_items_total.div_ceil(self.bank_size())
    }

    /// Most items a single node can ever hold (reached only at maximum depth).
    pub const fn node_capacity(&self) -> usize {
        self.bank_size() * MAX_BANKS_PER_NODE
    }
}

/// Subdivision policy bound by [`NdTree::reset`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubdivisionPolicy {
    /// Items a node stores before it subdivides.
    pub items_per_node: usize,
    /// Depth at which nodes stop subdividing and overflow instead. The root is depth 0.
    pub max_depth: usize,
    /// Report every item of an overlapping node, skipping per-item coordinate checks.
    pub approximate: bool,
}

impl Default for SubdivisionPolicy {
    fn default() -> Self {
        Self {
            items_per_node: 12,
            max_depth: 6,
            approximate: false,
        }
    }
}

/// Read-only view of one node, for debugging and visualization.
#[derive(Copy, Clone, Debug)]
pub struct NodeView<'a> {
    /// Region covered by the node.
    pub bounds: Aabb<'a>,
    /// Distance from the root.
    pub depth: usize,
    /// Items stored directly in this node.
    pub items: usize,
    /// Slots currently allocated to this node.
    pub capacity: usize,
    /// Memory banks held by this node.
    pub banks: usize,
    /// Subdivision and overflow state.
    pub flags: NodeFlags,
}

/// Fixed-capacity N-dimensional partitioning tree.
///
/// Stores `(position, payload)` items. Nodes split into `2^D` equal children
/// once they hold [`SubdivisionPolicy::items_per_node`] items; items already in
/// a node when it splits stay there. All storage is allocated by [`NdTree::new`];
/// [`reset`](NdTree::reset), [`add`](NdTree::add), and the queries never allocate.
pub struct NdTree {
    config: TreeConfig,
    geometry: Geometry,
    policy: SubdivisionPolicy,
    len: usize,
    nodes: NodeArena,
    banks: BankArena,
    positions: Option<PositionBank>,
}

impl core::fmt::Debug for NdTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NdTree")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .field("policy", &self.policy)
            .field("len", &self.len)
            .field("nodes", &self.nodes.len())
            .field("banks", &self.banks.allocated())
            .finish_non_exhaustive()
    }
}

impl NdTree {
    /// Allocate a tree with the given capacities.
    ///
    /// The tree is unbound until the first successful [`reset`](Self::reset).
    pub fn new(config: TreeConfig) -> Result<Self, Error> {
        if config.dimension == 0 || config.dimension > MAX_DIMENSION {
            return Err(Error::InvalidDimension(config.dimension));
        }
        if config.max_items_per_node == 0 || config.max_nodes == 0 || config.max_items_total == 0 {
            return Err(Error::ZeroCapacity);
        }
        let positions = config
            .store_positions
            .then(|| PositionBank::new(config.dimension, config.max_items_total));
        Ok(Self {
            geometry: Geometry::for_dimension(config.dimension),
            policy: SubdivisionPolicy::default(),
            len: 0,
            nodes: NodeArena::new(config.dimension, config.max_nodes),
            banks: BankArena::new(config.bank_size(), config.item_size, config.bank_count()),
            positions,
            config,
        })
    }

    /// Positional form of [`new`](Self::new).
    pub fn create(
        dimension: usize,
        item_size: usize,
        max_items_per_node: usize,
        max_nodes: usize,
        max_items_total: usize,
        store_positions: bool,
    ) -> Result<Self, Error> {
        Self::new(TreeConfig {
            dimension,
            item_size,
            max_items_per_node,
            max_nodes,
            max_items_total,
            store_positions,
        })
    }

    /// Capacities this tree was built with.
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of axes.
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Geometry strategy selected for this tree's dimension.
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Policy bound by the last successful reset.
    pub const fn policy(&self) -> &SubdivisionPolicy {
        &self.policy
    }

    /// Whether a successful reset has bound the tree to a region.
    pub fn is_bound(&self) -> bool {
        self.nodes.len() > 0
    }

    /// The root region, if bound.
    pub fn region(&self) -> Option<Aabb<'_>> {
        self.is_bound().then(|| {
            let (min, max) = self.nodes.bounds(NodeIdx::ROOT);
            Aabb::new(min, max)
        })
    }

    /// Whether queries filter items by their exact coordinates.
    ///
    /// False when positions are not stored or the policy forces approximate mode.
    pub fn is_exact(&self) -> bool {
        self.positions.is_some() && !self.policy.approximate
    }

    /// Number of items stored since the last reset.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no items are stored.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nodes allocated since the last reset, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Memory banks handed out since the last reset.
    pub const fn bank_count(&self) -> usize {
        self.banks.allocated()
    }

    /// Coordinates held by the position bank.
    pub fn position_count(&self) -> usize {
        self.positions.as_ref().map_or(0, PositionBank::len)
    }

    /// Bind the tree to a new root region and policy, discarding all items.
    ///
    /// Returns `false`, leaving the tree untouched, if the region or policy is invalid.
    pub fn reset(&mut self, region_min: &[f32], region_max: &[f32], policy: SubdivisionPolicy) -> bool {
        self.try_reset(region_min, region_max, policy).is_ok()
    }

    /// Like [`reset`](Self::reset), reporting why the input was rejected.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "nd_tree::reset"))]
    pub fn try_reset(
        &mut self,
        region_min: &[f32],
        region_max: &[f32],
        policy: SubdivisionPolicy,
    ) -> Result<(), Error> {
        self.check_dimension(region_min)?;
        self.check_dimension(region_max)?;
        // Infinite faces would give children NaN midpoints.
        if !Aabb::new(region_min, region_max).is_valid()
            || !region_min.iter().chain(region_max).all(|v| v.is_finite())
        {
            return Err(Error::InvalidRegion);
        }
        if policy.items_per_node > self.config.max_items_per_node {
            return Err(Error::ThresholdTooLarge {
                requested: policy.items_per_node,
                ceiling: self.config.max_items_per_node,
            });
        }
        self.policy = policy;
        self.len = 0;
        self.nodes.reset_root(region_min, region_max);
        self.banks.rewind();
        if let Some(positions) = &mut self.positions {
            positions.rewind();
        }
        Ok(())
    }

    /// Insert an item at `position`. Returns `false` if it could not be stored.
    pub fn add(&mut self, position: &[f32], item: &[u8]) -> bool {
        self.try_add(position, item).is_ok()
    }

    /// Like [`add`](Self::add), reporting why the item was not stored.
    pub fn try_add(&mut self, position: &[f32], item: &[u8]) -> Result<(), Error> {
        if !self.is_bound() {
            return Err(Error::Unbound);
        }
        self.check_dimension(position)?;
        if item.len() != self.config.item_size {
            return Err(Error::PayloadSizeMismatch {
                expected: self.config.item_size,
                found: item.len(),
            });
        }
        let (root_min, root_max) = self.nodes.bounds(NodeIdx::ROOT);
        if !self.geometry.contains_point(root_min, root_max, position) {
            return Err(Error::OutOfBounds);
        }

        let mut idx = NodeIdx::ROOT;
        loop {
            let node = self.nodes.node(idx);
            if node.items < self.policy.items_per_node || node.depth >= self.policy.max_depth {
                return self.store(idx, position, item);
            }
            let first_child = node.first_child;
            let first = match first_child {
                Some(first) => first,
                None => self.subdivide(idx)?,
            };
            idx = self
                .child_containing(first, position)
                .ok_or(Error::OutOfBounds)?;
        }
    }

    /// Copy payloads of items in `region_min..=region_max` into `items_out`.
    ///
    /// Writes at most `max_items` payloads, and no more than fit in `items_out`.
    /// Returns the number written; a result equal to the limit may mean truncation.
    pub fn query_range(
        &self,
        region_min: &[f32],
        region_max: &[f32],
        items_out: &mut [u8],
        max_items: usize,
    ) -> usize {
        let item_size = self.config.item_size;
        let limit = match items_out.len().checked_div(item_size) {
            Some(fit) => max_items.min(fit),
            None => max_items,
        };
        if limit == 0 {
            return 0;
        }
        let mut written = 0;
        self.for_each_in_range(region_min, region_max, |payload| {
            items_out[written * item_size..(written + 1) * item_size].copy_from_slice(payload);
            written += 1;
            if written == limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        written
    }

    /// Number of items a query over `region_min..=region_max` would report.
    pub fn count_in_range(&self, region_min: &[f32], region_max: &[f32]) -> usize {
        let mut count = 0;
        self.for_each_in_range(region_min, region_max, |_| {
            count += 1;
            ControlFlow::Continue(())
        });
        count
    }

    /// Visit the payload of every item in `region_min..=region_max`.
    ///
    /// In approximate mode every item of a node overlapping the region is visited.
    /// Return [`ControlFlow::Break`] to stop the traversal. Regions with the wrong
    /// dimension, inverted axes, or NaN visit nothing.
    pub fn for_each_in_range<F>(&self, region_min: &[f32], region_max: &[f32], mut visit: F)
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        let d = self.config.dimension;
        if !self.is_bound()
            || region_min.len() != d
            || !Aabb::new(region_min, region_max).is_valid()
        {
            return;
        }
        self.collect(
            NodeIdx::ROOT,
            region_min,
            region_max,
            self.is_exact(),
            &mut visit,
        );
    }

    /// All nodes allocated since the last reset, root first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> + '_ {
        let bank_size = self.banks.bank_size();
        self.nodes.iter().map(move |(idx, node)| {
            let (min, max) = self.nodes.bounds(idx);
            NodeView {
                bounds: Aabb::new(min, max),
                depth: node.depth,
                items: node.items,
                capacity: node.capacity(bank_size),
                banks: node.bank_count(),
                flags: node.flags,
            }
        })
    }

    fn check_dimension(&self, coords: &[f32]) -> Result<(), Error> {
        if coords.len() == self.config.dimension {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.config.dimension,
                found: coords.len(),
            })
        }
    }

    fn subdivide(&mut self, idx: NodeIdx) -> Result<NodeIdx, Error> {
        let first = self
            .nodes
            .alloc_children(idx, self.geometry)
            .ok_or_else(|| exhausted(Arena::Nodes))?;
        let node = self.nodes.node_mut(idx);
        node.first_child = Some(first);
        node.flags |= NodeFlags::SUBDIVIDED;
        #[cfg(feature = "tracing")]
        tracing::trace!(node = idx.get(), depth = node.depth, "subdivided");
        Ok(first)
    }

    fn child_containing(&self, first: NodeIdx, position: &[f32]) -> Option<NodeIdx> {
        (0..1_usize << self.config.dimension)
            .map(|i| first.offset(i))
            .find(|&child| {
                let (min, max) = self.nodes.bounds(child);
                self.geometry.contains_point(min, max, position)
            })
    }

    fn store(&mut self, idx: NodeIdx, position: &[f32], item: &[u8]) -> Result<(), Error> {
        let record_position = !self.policy.approximate;
        if record_position && self.positions.as_ref().is_some_and(PositionBank::is_full) {
            return Err(exhausted(Arena::Positions));
        }
        let bank_size = self.banks.bank_size();
        let node = self.nodes.node(idx);
        if node.items == node.capacity(bank_size) {
            if !node.has_bank_room() {
                return Err(exhausted(Arena::NodeBanks));
            }
            let bank = self.banks.alloc().ok_or_else(|| exhausted(Arena::Banks))?;
            self.nodes.node_mut(idx).push_bank(bank);
        }
        let position_ref = match &mut self.positions {
            Some(positions) if record_position => positions.push(position),
            _ => NO_POSITION,
        };
        let node = self.nodes.node_mut(idx);
        let slot = node.slot(node.items, bank_size);
        node.items += 1;
        if node.items > self.policy.items_per_node {
            node.flags |= NodeFlags::OVERFLOW;
        }
        self.banks.write(slot, position_ref, item);
        self.len += 1;
        Ok(())
    }

    fn collect<F>(
        &self,
        idx: NodeIdx,
        min: &[f32],
        max: &[f32],
        exact: bool,
        visit: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        let (node_min, node_max) = self.nodes.bounds(idx);
        if !self.geometry.intersects(node_min, node_max, min, max) {
            return ControlFlow::Continue(());
        }
        let node = self.nodes.node(idx);
        let bank_size = self.banks.bank_size();
        for i in 0..node.items {
            let slot = node.slot(i, bank_size);
            if exact && let Some(positions) = &self.positions {
                let point = positions.get(self.banks.position_ref(slot));
                if !self.geometry.contains_point(min, max, point) {
                    continue;
                }
            }
            visit(self.banks.payload(slot))?;
        }
        if let Some(first) = node.first_child {
            for i in 0..1_usize << self.config.dimension {
                self.collect(first.offset(i), min, max, exact, visit)?;
            }
        }
        ControlFlow::Continue(())
    }
}

#[cold]
fn exhausted(arena: Arena) -> Error {
    #[cfg(feature = "tracing")]
    tracing::debug!(%arena, "nd tree capacity exhausted");
    Error::CapacityExhausted(arena)
}
