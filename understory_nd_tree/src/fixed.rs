// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed wrappers: compile-time dimension, [`Pod`] payloads, scalar-argument quad/oct trees.

use core::marker::PhantomData;
use core::ops::ControlFlow;

use bytemuck::Pod;

use crate::tree::{NdTree, SubdivisionPolicy};
use crate::types::Error;

/// An [`NdTree`] with dimension `D` and payload type `P`.
///
/// Payloads are stored as their bytes and read back unaligned, so any [`Pod`]
/// type works regardless of alignment.
pub struct FixedTree<P, const D: usize> {
    tree: NdTree,
    _p: PhantomData<P>,
}

/// Two-dimensional tree with scalar `x, y` arguments.
pub type QuadTree<P> = FixedTree<P, 2>;

/// Three-dimensional tree with scalar `x, y, z` arguments.
pub type OctTree<P> = FixedTree<P, 3>;

impl<P, const D: usize> core::fmt::Debug for FixedTree<P, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixedTree")
            .field("dimension", &D)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

impl<P: Pod, const D: usize> FixedTree<P, D> {
    /// Allocate a tree; the item size is `size_of::<P>()`.
    pub fn new(
        max_items_per_node: usize,
        max_nodes: usize,
        max_items_total: usize,
        store_positions: bool,
    ) -> Result<Self, Error> {
        let tree = NdTree::create(
            D,
            size_of::<P>(),
            max_items_per_node,
            max_nodes,
            max_items_total,
            store_positions,
        )?;
        Ok(Self {
            tree,
            _p: PhantomData,
        })
    }

    /// The untyped tree underneath.
    pub const fn as_nd_tree(&self) -> &NdTree {
        &self.tree
    }

    /// Number of items stored since the last reset.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether no items are stored.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// See [`NdTree::reset`].
    pub fn reset_region(&mut self, min: [f32; D], max: [f32; D], policy: SubdivisionPolicy) -> bool {
        self.tree.reset(&min, &max, policy)
    }

    /// See [`NdTree::add`].
    pub fn add_at(&mut self, position: [f32; D], item: P) -> bool {
        self.try_add_at(position, item).is_ok()
    }

    /// See [`NdTree::try_add`].
    pub fn try_add_at(&mut self, position: [f32; D], item: P) -> Result<(), Error> {
        self.tree.try_add(&position, bytemuck::bytes_of(&item))
    }

    /// Fill `out` with items in `min..=max`; returns how many were written.
    pub fn query_region(&self, min: [f32; D], max: [f32; D], out: &mut [P]) -> usize {
        if out.is_empty() {
            return 0;
        }
        let mut written = 0;
        self.for_each_in_region(min, max, |item| {
            out[written] = item;
            written += 1;
            if written == out.len() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        written
    }

    /// See [`NdTree::for_each_in_range`].
    pub fn for_each_in_region<F>(&self, min: [f32; D], max: [f32; D], mut visit: F)
    where
        F: FnMut(P) -> ControlFlow<()>,
    {
        self.tree
            .for_each_in_range(&min, &max, |bytes| visit(bytemuck::pod_read_unaligned(bytes)));
    }
}

impl<P: Pod> QuadTree<P> {
    /// Bind to the rectangle `(min_x, min_y)..=(max_x, max_y)`.
    pub fn reset(
        &mut self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
        policy: SubdivisionPolicy,
    ) -> bool {
        self.reset_region([min_x, min_y], [max_x, max_y], policy)
    }

    /// Insert `item` at `(x, y)`.
    pub fn add(&mut self, x: f32, y: f32, item: P) -> bool {
        self.add_at([x, y], item)
    }

    /// Items in `(min_x, min_y)..=(max_x, max_y)`, written to `out`.
    pub fn query_range(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32, out: &mut [P]) -> usize {
        self.query_region([min_x, min_y], [max_x, max_y], out)
    }
}

impl<P: Pod> OctTree<P> {
    /// Bind to the box `(min_x, min_y, min_z)..=(max_x, max_y, max_z)`.
    pub fn reset(
        &mut self,
        min_x: f32,
        min_y: f32,
        min_z: f32,
        max_x: f32,
        max_y: f32,
        max_z: f32,
        policy: SubdivisionPolicy,
    ) -> bool {
        self.reset_region([min_x, min_y, min_z], [max_x, max_y, max_z], policy)
    }

    /// Insert `item` at `(x, y, z)`.
    pub fn add(&mut self, x: f32, y: f32, z: f32, item: P) -> bool {
        self.add_at([x, y, z], item)
    }

    /// Items in `(min_x, min_y, min_z)..=(max_x, max_y, max_z)`, written to `out`.
    pub fn query_range(
        &self,
        min_x: f32,
        min_y: f32,
        min_z: f32,
        max_x: f32,
        max_y: f32,
        max_z: f32,
        out: &mut [P],
    ) -> usize {
        self.query_region([min_x, min_y, min_z], [max_x, max_y, max_z], out)
    }
}

#[cfg(feature = "kurbo")]
impl<P: Pod> QuadTree<P> {
    /// Bind to a Kurbo rectangle. Coordinates are narrowed to `f32`.
    pub fn reset_rect(&mut self, rect: kurbo::Rect, policy: SubdivisionPolicy) -> bool {
        let (min, max) = rect_corners(rect);
        self.reset_region(min, max, policy)
    }

    /// Insert `item` at a Kurbo point.
    pub fn add_point(&mut self, point: kurbo::Point, item: P) -> bool {
        self.add_at([narrow(point.x), narrow(point.y)], item)
    }

    /// Items inside a Kurbo rectangle, written to `out`.
    pub fn query_rect(&self, rect: kurbo::Rect, out: &mut [P]) -> usize {
        let (min, max) = rect_corners(rect);
        self.query_region(min, max, out)
    }
}

#[cfg(feature = "kurbo")]
fn rect_corners(rect: kurbo::Rect) -> ([f32; 2], [f32; 2]) {
    let rect = rect.abs();
    (
        [narrow(rect.x0), narrow(rect.y0)],
        [narrow(rect.x1), narrow(rect.y1)],
    )
}

#[cfg(feature = "kurbo")]
#[allow(
    clippy::cast_possible_truncation,
    reason = "Tree coordinates are f32; Kurbo inputs are narrowed on purpose."
)]
fn narrow(v: f64) -> f32 {
    v as f32
}
