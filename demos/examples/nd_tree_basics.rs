// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! N-D tree basics.
//!
//! Build a 4-dimensional tree, inspect errors from the `try_` forms, and walk
//! the node arena the way a debug visualizer would.
//!
//! Run:
//! - `cargo run -p understory_demos --example nd_tree_basics`

use std::ops::ControlFlow;

use understory_nd_tree::{Error, NdTree, SubdivisionPolicy, TreeConfig};

fn main() {
    let config = TreeConfig {
        dimension: 4,
        item_size: 2,
        max_items_per_node: 32,
        max_nodes: 512,
        max_items_total: 512,
        store_positions: true,
    };
    let mut tree = NdTree::new(config).unwrap();
    println!(
        "geometry {:?}, {} slots per bank, {} banks",
        tree.geometry(),
        config.bank_size(),
        config.bank_count()
    );

    // Nothing can be added until the tree is bound to a region.
    assert_eq!(tree.try_add(&[0.0; 4], &[0, 0]), Err(Error::Unbound));

    let policy = SubdivisionPolicy {
        items_per_node: 4,
        max_depth: 3,
        approximate: false,
    };
    tree.try_reset(&[0.0; 4], &[1.0; 4], policy).unwrap();

    let mut stored = 0_u16;
    for i in 0..300_u16 {
        let f = f32::from(i) / 300.0;
        let p = [f, 1.0 - f, (f * 3.0) % 1.0, 0.5];
        match tree.try_add(&p, &i.to_le_bytes()) {
            Ok(()) => stored += 1,
            Err(err) => {
                println!("item {i}: {err}");
                break;
            }
        }
    }
    println!("stored {stored} items in {} nodes", tree.node_count());

    let mut first = Vec::new();
    tree.for_each_in_range(&[0.0, 0.5, 0.0, 0.0], &[0.5, 1.0, 1.0, 1.0], |payload| {
        first.push(u16::from_le_bytes([payload[0], payload[1]]));
        if first.len() == 8 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    println!("first hits: {first:?}");

    for node in tree.nodes().filter(|n| n.items > 0) {
        println!(
            "depth {} items {:>3}/{:<3} banks {:>2} {:?} min {:?}",
            node.depth, node.items, node.capacity, node.banks, node.flags, node.bounds.min
        );
    }
}
