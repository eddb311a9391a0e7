// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_nd_tree::{QuadTree, SubdivisionPolicy};

use rstar::{AABB, RTree};

fn gen_grid_points(n: usize, cell: f32) -> Vec<[f32; 2]> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push([x as f32 * cell + 0.5 * cell, y as f32 * cell + 0.5 * cell]);
        }
    }
    out
}

fn bench_rtree_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare_points");
    for &n in &[64usize, 128, 256] {
        let points = gen_grid_points(n, 10.0);
        let extent = n as f32 * 10.0;
        let (qmin, qmax) = ([100.0_f32, 100.0], [500.0_f32, 500.0]);
        group.throughput(Throughput::Elements((n * n) as u64));

        let mut tree = QuadTree::<u32>::new(128, 100_000, 2 * n * n, true).unwrap();
        let mut out = vec![0_u32; n * n];
        assert!(tree.reset(0.0, 0.0, extent, extent, SubdivisionPolicy::default()));
        for (i, p) in (0_u32..).zip(&points) {
            assert!(tree.add(p[0], p[1], i), "setup stores point {i}");
        }
        group.bench_function(format!("understory_build_query_n{}", n), |b| {
            b.iter(|| {
                let bound = tree.reset(0.0, 0.0, extent, extent, SubdivisionPolicy::default());
                debug_assert!(bound, "bench region is valid");
                for (i, p) in (0_u32..).zip(&points) {
                    let stored = tree.add(p[0], p[1], i);
                    debug_assert!(stored, "bench arenas hold every point");
                }
                let hits = tree.query_range(qmin[0], qmin[1], qmax[0], qmax[1], &mut out);
                black_box(hits);
            });
        });

        group.bench_function(format!("rstar_build_query_bulk_n{}", n), |b| {
            b.iter_batched(
                || points.clone(),
                |points| {
                    let tree = RTree::bulk_load(points);
                    let aabb = AABB::from_corners(qmin, qmax);
                    let hits: usize = tree.locate_in_envelope(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rtree_external_compare);
criterion_main!(benches);
