// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Oct-tree basics.
//!
//! Store `Pod` particle records in a 3D tree and query a sub-volume.
//!
//! Run:
//! - `cargo run -p understory_demos --example oct_tree_basics`

use bytemuck::{Pod, Zeroable};
use understory_nd_tree::{OctTree, SubdivisionPolicy};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Particle {
    id: u32,
    temperature: f32,
}

fn main() {
    let mut tree = OctTree::<Particle>::new(32, 4096, 4096, true).unwrap();
    let policy = SubdivisionPolicy {
        items_per_node: 8,
        max_depth: 5,
        approximate: false,
    };
    assert!(tree.reset(0.0, 0.0, 0.0, 10.0, 10.0, 10.0, policy));

    // A helix of particles climbing through the box.
    for id in 0..1000_u32 {
        let t = id as f32 / 1000.0;
        let angle = t * std::f32::consts::TAU * 4.0;
        let (x, y, z) = (5.0 + 4.0 * angle.cos(), 5.0 + 4.0 * angle.sin(), 10.0 * t);
        let particle = Particle {
            id,
            temperature: 300.0 + 50.0 * t,
        };
        if !tree.add(x, y, z, particle) {
            println!("particle {id} did not fit");
        }
    }

    let mut out = [Particle::zeroed(); 256];
    let n = tree.query_range(5.0, 0.0, 0.0, 10.0, 10.0, 2.0, &mut out);
    let mean = out[..n].iter().map(|p| p.temperature).sum::<f32>() / n.max(1) as f32;
    println!(
        "{n} particles in the lower half-slab, mean temperature {mean:.1}; tree has {} nodes",
        tree.as_nd_tree().node_count()
    );
    println!("{:?}", tree);
}
