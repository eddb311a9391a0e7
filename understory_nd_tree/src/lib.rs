// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_nd_tree --heading-base-level=0

//! Understory N-D Tree: a fixed-capacity spatial partitioning tree for points.
//!
//! Understory N-D Tree is a per-frame spatial index for simulations and renderers.
//!
//! - Insert points with an opaque payload; query all payloads inside an axis-aligned box.
//! - Works in any dimension: a quad-tree for 2D, an oct-tree for 3D, `2^D`-ary beyond.
//! - All storage is reserved up front. [`NdTree::reset`], [`NdTree::add`], and the
//!   queries never allocate; clearing the tree rewinds arena cursors.
//!
//! Nodes live in a flat arena and refer to their children and item banks by index.
//! A node stores items until it reaches the policy's threshold, then splits into `2^D`
//! equal children and routes every later item to the child containing it. Items that
//! were already in the node stay there. Nodes at the maximum depth never split and keep
//! accepting items up to their bank limit.
//!
//! There is no removal or update. Rebuild the tree (reset, then re-add) when points move.
//!
//! # Example
//!
//! ```rust
//! use understory_nd_tree::{NdTree, SubdivisionPolicy};
//!
//! // A 2D tree with 4-byte payloads, room for 1024 nodes and 4096 items.
//! let mut tree = NdTree::create(2, 4, 64, 1024, 4096, true).unwrap();
//! let policy = SubdivisionPolicy { items_per_node: 4, max_depth: 8, approximate: false };
//! assert!(tree.reset(&[0.0, 0.0], &[100.0, 100.0], policy));
//!
//! for i in 0..10_u32 {
//!     let v = i as f32 * 11.0;
//!     assert!(tree.add(&[v, v], &i.to_le_bytes()));
//! }
//!
//! let mut out = [0_u8; 40];
//! let n = tree.query_range(&[0.0, 0.0], &[50.0, 50.0], &mut out, 10);
//! assert_eq!(n, 5);
//! ```
//!
//! The typed wrappers take scalar coordinates and any [`bytemuck::Pod`] payload:
//!
//! ```rust
//! use understory_nd_tree::{QuadTree, SubdivisionPolicy};
//!
//! let mut tree = QuadTree::<u32>::new(128, 4096, 4096, true).unwrap();
//! assert!(tree.reset(-1.0, -1.0, 1.0, 1.0, SubdivisionPolicy::default()));
//! assert!(tree.add(0.25, 0.5, 7));
//!
//! let mut hits = [0_u32; 8];
//! let n = tree.query_range(0.0, 0.0, 1.0, 1.0, &mut hits);
//! assert_eq!(&hits[..n], &[7]);
//! ```
//!
//! ## Exact and approximate queries
//!
//! When built with `store_positions`, the tree keeps each item's coordinate and
//! queries return exactly the items inside the region. Without stored positions, or
//! with [`SubdivisionPolicy::approximate`], queries return every item of every node
//! whose box overlaps the region: never fewer items than an exact query, often more,
//! and without touching per-item coordinates.
//!
//! ## Capacities
//!
//! [`TreeConfig`] fixes the node arena size, the total number of item slots, and the
//! per-node ceiling. Items are stored in banks of [`TreeConfig::bank_size`] slots; a node
//! holds at most [`MAX_BANKS_PER_NODE`] banks. Banks are handed out whole, so every node
//! holding items may leave up to `bank_size - 1` slots unused: give `max_items_total`
//! headroom over the number of points. When an arena is full, [`NdTree::try_add`]
//! reports [`Error::CapacityExhausted`] and the item is not stored.
//!
//! Root regions must be finite; [`NdTree::reset`] rejects infinite or NaN bounds.
//!
//! ### Float semantics
//!
//! Intervals are closed. Coordinates are `f32`; NaN never lies inside any box.
//!
//! ## Features
//!
//! - `kurbo`: `Point`/`Rect` adapters on [`QuadTree`].
//! - `tracing`: spans on reset and events on subdivision and capacity exhaustion.

#![no_std]

extern crate alloc;

mod arena;
mod fixed;
mod geometry;
mod tree;
mod types;

pub use arena::MAX_BANKS_PER_NODE;
pub use fixed::{FixedTree, OctTree, QuadTree};
pub use geometry::Geometry;
pub use tree::{MAX_DIMENSION, NdTree, NodeView, SubdivisionPolicy, TreeConfig};
pub use types::{Aabb, Arena, Error, NodeFlags};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_and_oct_trees_share_the_generic_core() {
        let mut quad = QuadTree::<u8>::new(16, 64, 64, true).unwrap();
        let mut oct = OctTree::<u8>::new(16, 64, 64, true).unwrap();
        assert!(quad.reset(0.0, 0.0, 1.0, 1.0, SubdivisionPolicy::default()));
        assert!(oct.reset(0.0, 0.0, 0.0, 1.0, 1.0, 1.0, SubdivisionPolicy::default()));
        assert_eq!(quad.as_nd_tree().geometry(), Geometry::Planar);
        assert_eq!(oct.as_nd_tree().geometry(), Geometry::Spatial);

        let mut nd = NdTree::create(5, 1, 16, 64, 64, true).unwrap();
        assert_eq!(nd.geometry(), Geometry::General);
        assert!(nd.reset(&[0.0; 5], &[1.0; 5], SubdivisionPolicy::default()));
        assert!(nd.add(&[0.5; 5], &[9]));
        assert_eq!(nd.count_in_range(&[0.5; 5], &[0.5; 5]), 1);
        assert_eq!(nd.region().unwrap().dimension(), 5);
    }

    #[test]
    fn errors_report_through_try_forms() {
        let mut tree = NdTree::new(TreeConfig {
            max_nodes: 1,
            ..TreeConfig::default()
        })
        .unwrap();
        let policy = SubdivisionPolicy {
            items_per_node: 1,
            ..SubdivisionPolicy::default()
        };
        tree.try_reset(&[0.0, 0.0], &[1.0, 1.0], policy).unwrap();
        tree.try_add(&[0.5, 0.5], &[0; 4]).unwrap();
        let err = tree.try_add(&[0.5, 0.5], &[0; 4]).unwrap_err();
        assert_eq!(err, Error::CapacityExhausted(Arena::Nodes));
    }
}
