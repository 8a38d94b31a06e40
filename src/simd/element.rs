//! Scalar types that can fill the lanes of a [`Simd`](super::Simd).
//!
//! Each lane kernel is a trait method with a portable default. Element types
//! with native register support override the methods and hand the lanes to
//! the active [`Backend`](crate::backend::Backend) when it can take them.

use super::portable;
use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Neg, Sub};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use super::avx;

/// Lane-wise arithmetic kernel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// Lane-wise minimum.
    Min,
    /// Lane-wise maximum.
    Max,
}

/// Lane-wise comparison kernel selector. NaN lanes compare false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneCmp {
    /// `a < b`
    Lt,
    /// `a <= b`
    Le,
    /// `a > b`
    Gt,
    /// `a >= b`
    Ge,
    /// `a == b`
    Eq,
}

/// Horizontal reduction kernel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Pairwise sum.
    Sum,
    /// Pairwise minimum.
    Min,
    /// Pairwise maximum.
    Max,
}

/// A numeric scalar that can live in a SIMD lane.
pub trait SimdElement:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Additive identity, used for zero padding.
    const ZERO: Self;

    /// Applies `op` to every lane pair.
    #[must_use]
    fn lanewise<const N: usize>(op: LaneOp, a: &[Self; N], b: &[Self; N]) -> [Self; N] {
        portable::lanewise(op, a, b)
    }

    /// Compares every lane pair.
    #[must_use]
    fn compare<const N: usize>(cmp: LaneCmp, a: &[Self; N], b: &[Self; N]) -> [bool; N] {
        portable::compare(cmp, a, b)
    }

    /// Picks `a[i]` where `mask[i]`, else `b[i]`.
    #[must_use]
    fn blend<const N: usize>(mask: &[bool; N], a: &[Self; N], b: &[Self; N]) -> [Self; N] {
        portable::blend(mask, a, b)
    }

    /// Collapses all lanes into one scalar with a pairwise tree.
    #[must_use]
    fn reduce<const N: usize>(reduction: Reduction, lanes: &[Self; N]) -> Self {
        portable::reduce(reduction, lanes)
    }
}

impl SimdElement for f32 {
    const ZERO: Self = 0.0;

    fn lanewise<const N: usize>(op: LaneOp, a: &[Self; N], b: &[Self; N]) -> [Self; N] {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::lanewise_f32(op, a, b) {
                return out;
            }
        }
        portable::lanewise(op, a, b)
    }

    fn compare<const N: usize>(cmp: LaneCmp, a: &[Self; N], b: &[Self; N]) -> [bool; N] {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::compare_f32(cmp, a, b) {
                return out;
            }
        }
        portable::compare(cmp, a, b)
    }

    fn blend<const N: usize>(mask: &[bool; N], a: &[Self; N], b: &[Self; N]) -> [Self; N] {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::blend_f32(mask, a, b) {
                return out;
            }
        }
        portable::blend(mask, a, b)
    }

    fn reduce<const N: usize>(reduction: Reduction, lanes: &[Self; N]) -> Self {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::reduce_f32(reduction, lanes) {
                return out;
            }
        }
        portable::reduce(reduction, lanes)
    }
}

impl SimdElement for f64 {
    const ZERO: Self = 0.0;

    fn lanewise<const N: usize>(op: LaneOp, a: &[Self; N], b: &[Self; N]) -> [Self; N] {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::lanewise_f64(op, a, b) {
                return out;
            }
        }
        portable::lanewise(op, a, b)
    }

    fn compare<const N: usize>(cmp: LaneCmp, a: &[Self; N], b: &[Self; N]) -> [bool; N] {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::compare_f64(cmp, a, b) {
                return out;
            }
        }
        portable::compare(cmp, a, b)
    }

    fn blend<const N: usize>(mask: &[bool; N], a: &[Self; N], b: &[Self; N]) -> [Self; N] {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::blend_f64(mask, a, b) {
                return out;
            }
        }
        portable::blend(mask, a, b)
    }

    fn reduce<const N: usize>(reduction: Reduction, lanes: &[Self; N]) -> Self {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if let Some(out) = avx::reduce_f64(reduction, lanes) {
                return out;
            }
        }
        portable::reduce(reduction, lanes)
    }
}

// integer lanes stay on the portable loops
impl SimdElement for i32 {
    const ZERO: Self = 0;
}
