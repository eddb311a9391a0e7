// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_nd_tree::{NdTree, SubdivisionPolicy};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32) * 2.0 - 1.0
    }
}

fn gen_points(count: usize, dimension: usize, seed: u64) -> Vec<f32> {
    let mut rng = Rng::new(seed);
    (0..count * dimension).map(|_| rng.next_f32()).collect()
}

fn policy(approximate: bool) -> SubdivisionPolicy {
    SubdivisionPolicy {
        items_per_node: 12,
        max_depth: 6,
        approximate,
    }
}

/// One frame of the typical workload: reset, insert everything, run a batch of queries.
fn frame(tree: &mut NdTree, points: &[f32], queries: &[(Vec<f32>, Vec<f32>)], out: &mut [u8], approximate: bool) -> usize {
    let d = tree.dimension();
    let lo = vec![-1.0; d];
    let hi = vec![1.0; d];
    let bound = tree.reset(&lo, &hi, policy(approximate));
    debug_assert!(bound, "bench region is valid");
    for (i, p) in (0_u32..).zip(points.chunks_exact(d)) {
        let stored = tree.add(p, &i.to_le_bytes());
        debug_assert!(stored, "bench arenas hold every point");
    }
    queries
        .iter()
        .map(|(min, max)| tree.query_range(min, max, out, out.len() / 4))
        .sum()
}

fn gen_queries(count: usize, dimension: usize, extent: f32, seed: u64) -> Vec<(Vec<f32>, Vec<f32>)> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let min: Vec<f32> = (0..dimension).map(|_| rng.next_f32() * (1.0 - extent)).collect();
            let max = min.iter().map(|v| v + extent).collect();
            (min, max)
        })
        .collect()
}

fn bench_modes(c: &mut Criterion) {
    for dimension in [2_usize, 3] {
        let mut group = c.benchmark_group(format!("nd_tree_{dimension}d"));
        for &n in &[1_000_usize, 10_000, 50_000] {
            let points = gen_points(n, dimension, 0x9E37_79B9_7F4A_7C15);
            let queries = gen_queries(64, dimension, 0.25, 0xD1B5_4A32_D192_ED03);
            let mut out = vec![0_u8; n * 4];
            group.throughput(Throughput::Elements(n as u64));

            // Node and slot headroom covers whole-bank allocation at depth 6 in 3-D.
            let mut tree = NdTree::create(dimension, 4, 128, 300_000, 4 * n + 100_000, true).unwrap();
            group.bench_function(format!("insert_n{n}"), |b| {
                let lo = vec![-1.0; dimension];
                let hi = vec![1.0; dimension];
                b.iter(|| {
                    let bound = tree.reset(&lo, &hi, policy(false));
                    debug_assert!(bound, "bench region is valid");
                    for (i, p) in (0_u32..).zip(points.chunks_exact(dimension)) {
                        let stored = tree.add(p, &i.to_le_bytes());
                        debug_assert!(stored, "bench arenas hold every point");
                    }
                    black_box(tree.len());
                });
            });
            group.bench_function(format!("frame_exact_n{n}"), |b| {
                b.iter(|| black_box(frame(&mut tree, &points, &queries, &mut out, false)));
            });
            group.bench_function(format!("frame_approximate_n{n}"), |b| {
                b.iter(|| black_box(frame(&mut tree, &points, &queries, &mut out, true)));
            });

            // Query cost alone, on a tree built once.
            frame(&mut tree, &points, &[], &mut out, false);
            assert_eq!(tree.len(), n, "setup stored every point");
            group.bench_function(format!("count_exact_n{n}"), |b| {
                b.iter(|| {
                    let hits: usize = queries
                        .iter()
                        .map(|(min, max)| tree.count_in_range(min, max))
                        .sum();
                    black_box(hits);
                });
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_modes);
criterion_main!(benches);
