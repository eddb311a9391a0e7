// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad-tree selection.
//!
//! Scatter points in `[-1, 1]^2`, rebuild the tree every frame, and select
//! the points under a moving rectangle, in both exact and approximate mode.
//!
//! Run:
//! - `cargo run -p understory_demos --example quad_tree_selection`

use kurbo::{Point, Rect};
use understory_nd_tree::{NodeFlags, QuadTree, SubdivisionPolicy};

const POINTS: usize = 100_000;
const MAX_SELECTED: usize = 10_000;

struct Rng(u64);

impl Rng {
    fn next_unit(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn main() {
    let mut rng = Rng(0x2545_F491_4F6C_DD1D);
    let points: Vec<Point> = (0..POINTS)
        .map(|_| Point::new(rng.next_unit() * 2.0 - 1.0, rng.next_unit() * 2.0 - 1.0))
        .collect();

    // Banks go to nodes whole, so partly filled banks need slots beyond `POINTS`.
    let mut tree = QuadTree::<u32>::new(128, 100_000, POINTS + POINTS / 2, true).unwrap();
    let mut selected = vec![0_u32; MAX_SELECTED];

    for frame in 0..4_u32 {
        let approximate = frame % 2 == 1;
        let policy = SubdivisionPolicy {
            items_per_node: 12,
            max_depth: 6,
            approximate,
        };
        tree.reset_rect(Rect::new(-1.0, -1.0, 1.0, 1.0), policy);
        let mut dropped = 0;
        for (i, p) in (0_u32..).zip(&points) {
            if !tree.add_point(*p, i) {
                dropped += 1;
            }
        }

        // The selection box drifts across the field frame by frame.
        let t = f64::from(frame) * 0.25;
        let selection = Rect::new(-0.5 + t, -0.3, -0.3 + t, -0.1);
        let n = tree.query_rect(selection, &mut selected);

        let truly_inside = selected[..n]
            .iter()
            .filter(|&&i| selection.contains(points[i as usize]))
            .count();
        let nodes = tree.as_nd_tree().nodes();
        let (mut leaves, mut overflowing) = (0, 0);
        for node in nodes {
            if !node.flags.contains(NodeFlags::SUBDIVIDED) {
                leaves += 1;
            }
            if node.flags.contains(NodeFlags::OVERFLOW) {
                overflowing += 1;
            }
        }
        println!(
            "frame {frame} ({}): stored {} ({dropped} dropped), selected {n} ({truly_inside} inside), {} nodes ({leaves} leaves, {overflowing} overflowing), {} banks",
            if approximate { "approximate" } else { "exact" },
            tree.len(),
            tree.as_nd_tree().node_count(),
            tree.as_nd_tree().bank_count(),
        );
        assert_eq!(dropped, 0, "every point lies in the root and fits the arenas");
        if !approximate {
            assert_eq!(n, truly_inside, "exact queries only report items inside the box");
        }
    }
}
