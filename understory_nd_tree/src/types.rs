// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types, comparison helpers, and errors.

use core::fmt;

/// Borrowed axis-aligned bounding box in D dimensions.
///
/// Both corners are slices of length D. Intervals are closed on both ends, so a
/// point lying exactly on a face is contained, and two boxes sharing a face intersect.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb<'a> {
    /// Per-axis minimum.
    pub min: &'a [f32],
    /// Per-axis maximum.
    pub max: &'a [f32],
}

impl<'a> Aabb<'a> {
    /// Create a view from min/max corners.
    pub const fn new(min: &'a [f32], max: &'a [f32]) -> Self {
        Self { min, max }
    }

    /// Number of axes.
    pub const fn dimension(&self) -> usize {
        self.min.len()
    }

    /// Whether both corners have the same, non-zero length and `min <= max` on every axis.
    ///
    /// NaN coordinates make the box invalid.
    pub fn is_valid(&self) -> bool {
        !self.min.is_empty()
            && self.min.len() == self.max.len()
            && self.min.iter().zip(self.max).all(|(&lo, &hi)| le(lo, hi))
    }

    /// Whether this AABB contains the point (closed intervals).
    pub fn contains_point(&self, point: &[f32]) -> bool {
        point.len() == self.dimension() && contains_n(self.min, self.max, point)
    }

    /// Whether this AABB overlaps `other` (closed intervals).
    pub fn intersects(&self, other: &Aabb<'_>) -> bool {
        other.dimension() == self.dimension()
            && intersects_n(self.min, self.max, other.min, other.max)
    }
}

pub(crate) fn contains_n(min: &[f32], max: &[f32], point: &[f32]) -> bool {
    min.iter()
        .zip(max)
        .zip(point)
        .all(|((&lo, &hi), &p)| le(lo, p) && le(p, hi))
}

pub(crate) fn intersects_n(a_min: &[f32], a_max: &[f32], b_min: &[f32], b_max: &[f32]) -> bool {
    a_min
        .iter()
        .zip(a_max)
        .zip(b_min.iter().zip(b_max))
        .all(|((&a_lo, &a_hi), (&b_lo, &b_hi))| le(a_lo, b_hi) && le(b_lo, a_hi))
}

/// `a <= b`, false when either side is NaN.
#[inline]
pub(crate) fn le(a: f32, b: f32) -> bool {
    a <= b
}

bitflags::bitflags! {
    /// Node state flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node has been split; new items are routed to its children.
        const SUBDIVIDED = 0b0000_0001;
        /// The node sits at maximum depth and holds more items than the threshold.
        const OVERFLOW   = 0b0000_0010;
    }
}

/// The arena that ran out of room.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arena {
    /// The node arena (`max_nodes`) cannot hold another set of children.
    Nodes,
    /// The global memory-bank arena has no unused bank left.
    Banks,
    /// The target node already holds the maximum number of banks.
    NodeBanks,
    /// The position bank is full.
    Positions,
}

impl fmt::Display for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nodes => "node arena",
            Self::Banks => "memory-bank arena",
            Self::NodeBanks => "per-node bank list",
            Self::Positions => "position bank",
        })
    }
}

/// Errors reported by construction, reset, and insertion.
///
/// Queries never fail; they report how many results were written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The dimension is zero or larger than [`MAX_DIMENSION`](crate::MAX_DIMENSION).
    InvalidDimension(usize),
    /// One of the construction capacities is zero.
    ZeroCapacity,
    /// A coordinate slice has the wrong number of axes.
    DimensionMismatch {
        /// The tree's dimension.
        expected: usize,
        /// The slice length that was passed.
        found: usize,
    },
    /// A payload slice does not match the configured item size.
    PayloadSizeMismatch {
        /// The configured item size.
        expected: usize,
        /// The slice length that was passed.
        found: usize,
    },
    /// The region has `min > max` on some axis, or contains NaN.
    InvalidRegion,
    /// The per-node threshold exceeds the ceiling fixed at construction.
    ThresholdTooLarge {
        /// Threshold passed to reset.
        requested: usize,
        /// `max_items_per_node` from the tree's config.
        ceiling: usize,
    },
    /// The tree has not been bound to a region by a successful reset.
    Unbound,
    /// The point lies outside the root region.
    OutOfBounds,
    /// A fixed-capacity arena is full.
    CapacityExhausted(Arena),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension(d) => write!(f, "unsupported dimension {d}"),
            Self::ZeroCapacity => f.write_str("tree capacities must be non-zero"),
            Self::DimensionMismatch { expected, found } => {
                write!(f, "expected {expected} coordinates, found {found}")
            }
            Self::PayloadSizeMismatch { expected, found } => {
                write!(f, "expected a {expected}-byte payload, found {found} bytes")
            }
            Self::InvalidRegion => f.write_str("region is empty, inverted, or contains NaN"),
            Self::ThresholdTooLarge { requested, ceiling } => write!(
                f,
                "items per node {requested} exceeds the configured ceiling {ceiling}"
            ),
            Self::Unbound => f.write_str("tree has not been reset to a region"),
            Self::OutOfBounds => f.write_str("point lies outside the root region"),
            Self::CapacityExhausted(arena) => write!(f, "{arena} is full"),
        }
    }
}

impl core::error::Error for Error {}
