// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dimension-specialized subdivision, containment, and intersection routines.
//!
//! Bounds are passed as flat slices. A packed box is `2 * D` floats: the D
//! minimum coordinates followed by the D maximum coordinates. This is also the
//! layout of the node bounds buffer, so subdivision writes children in place.

use crate::types::{contains_n, intersects_n, le};

/// Geometry strategy, chosen once per tree from its dimension.
///
/// All strategies order children the same way: child `i` takes the upper half
/// of axis `k` when bit `k` of `i` is set, and the lower half otherwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// Two axes: closed-form quartering, unrolled tests.
    Planar,
    /// Three axes: general subdivision, unrolled tests.
    Spatial,
    /// Any number of axes.
    General,
}

impl Geometry {
    /// Pick the strategy for a dimension.
    pub const fn for_dimension(dimension: usize) -> Self {
        match dimension {
            2 => Self::Planar,
            3 => Self::Spatial,
            _ => Self::General,
        }
    }

    /// Split `min..=max` into `2^D` children, written packed into `out`.
    ///
    /// `out` must hold exactly `2^D * 2 * D` floats.
    pub(crate) fn subdivide(self, min: &[f32], max: &[f32], out: &mut [f32]) {
        debug_assert_eq!(
            out.len(),
            (1 << min.len()) * 2 * min.len(),
            "child buffer must hold 2^D packed boxes"
        );
        match self {
            Self::Planar => {
                let [x0, y0] = [min[0], min[1]];
                let [x1, y1] = [max[0], max[1]];
                let mx = midpoint(x0, x1);
                let my = midpoint(y0, y1);
                let quadrants = [
                    [x0, y0, mx, my],
                    [mx, y0, x1, my],
                    [x0, my, mx, y1],
                    [mx, my, x1, y1],
                ];
                for (packed, quadrant) in out.chunks_exact_mut(4).zip(quadrants) {
                    packed.copy_from_slice(&quadrant);
                }
            }
            Self::Spatial | Self::General => subdivide_n(min, max, out),
        }
    }

    /// Whether `point` lies in `min..=max`.
    #[inline]
    pub(crate) fn contains_point(self, min: &[f32], max: &[f32], point: &[f32]) -> bool {
        match self {
            Self::Planar => {
                le(min[0], point[0])
                    && le(point[0], max[0])
                    && le(min[1], point[1])
                    && le(point[1], max[1])
            }
            Self::Spatial => {
                le(min[0], point[0])
                    && le(point[0], max[0])
                    && le(min[1], point[1])
                    && le(point[1], max[1])
                    && le(min[2], point[2])
                    && le(point[2], max[2])
            }
            Self::General => contains_n(min, max, point),
        }
    }

    /// Whether `a_min..=a_max` and `b_min..=b_max` overlap.
    #[inline]
    pub(crate) fn intersects(self, a_min: &[f32], a_max: &[f32], b_min: &[f32], b_max: &[f32]) -> bool {
        match self {
            Self::Planar => {
                le(a_min[0], b_max[0])
                    && le(b_min[0], a_max[0])
                    && le(a_min[1], b_max[1])
                    && le(b_min[1], a_max[1])
            }
            Self::Spatial => {
                le(a_min[0], b_max[0])
                    && le(b_min[0], a_max[0])
                    && le(a_min[1], b_max[1])
                    && le(b_min[1], a_max[1])
                    && le(a_min[2], b_max[2])
                    && le(b_min[2], a_max[2])
            }
            Self::General => intersects_n(a_min, a_max, b_min, b_max),
        }
    }
}

#[inline]
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + 0.5 * (hi - lo);
    // `hi - lo` overflows for spans wider than `f32::MAX`.
    if mid.is_finite() { mid } else { 0.5 * lo + 0.5 * hi }
}

fn subdivide_n(min: &[f32], max: &[f32], out: &mut [f32]) {
    let d = min.len();
    for (child, packed) in out.chunks_exact_mut(2 * d).enumerate() {
        let (child_min, child_max) = packed.split_at_mut(d);
        for axis in 0..d {
            let mid = midpoint(min[axis], max[axis]);
            if (child >> axis) & 1 == 0 {
                child_min[axis] = min[axis];
                child_max[axis] = mid;
            } else {
                child_min[axis] = mid;
                child_max[axis] = max[axis];
            }
        }
    }
}
