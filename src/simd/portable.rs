//! Scalar-loop lane kernels, valid for every element type and width.

use super::element::{LaneCmp, LaneOp, Reduction, SimdElement};
use core::array;

#[inline]
fn min<T: SimdElement>(a: T, b: T) -> T {
    // same operand order as `minps`: NaN on either side yields `b`
    if a < b { a } else { b }
}

#[inline]
fn max<T: SimdElement>(a: T, b: T) -> T {
    if a > b { a } else { b }
}

pub(crate) fn lanewise<T: SimdElement, const N: usize>(
    op: LaneOp,
    a: &[T; N],
    b: &[T; N],
) -> [T; N] {
    match op {
        LaneOp::Add => array::from_fn(|i| a[i] + b[i]),
        LaneOp::Sub => array::from_fn(|i| a[i] - b[i]),
        LaneOp::Mul => array::from_fn(|i| a[i] * b[i]),
        LaneOp::Div => array::from_fn(|i| a[i] / b[i]),
        LaneOp::Min => array::from_fn(|i| min(a[i], b[i])),
        LaneOp::Max => array::from_fn(|i| max(a[i], b[i])),
    }
}

pub(crate) fn compare<T: SimdElement, const N: usize>(
    cmp: LaneCmp,
    a: &[T; N],
    b: &[T; N],
) -> [bool; N] {
    match cmp {
        LaneCmp::Lt => array::from_fn(|i| a[i] < b[i]),
        LaneCmp::Le => array::from_fn(|i| a[i] <= b[i]),
        LaneCmp::Gt => array::from_fn(|i| a[i] > b[i]),
        LaneCmp::Ge => array::from_fn(|i| a[i] >= b[i]),
        LaneCmp::Eq => array::from_fn(|i| a[i] == b[i]),
    }
}

pub(crate) fn blend<T: SimdElement, const N: usize>(
    mask: &[bool; N],
    a: &[T; N],
    b: &[T; N],
) -> [T; N] {
    array::from_fn(|i| if mask[i] { a[i] } else { b[i] })
}

/// Pairwise tree reduction.
///
/// Each round folds the upper half onto the lower half (`lane[i] ⊕
/// lane[len - half + i]`), which for power-of-two widths is the same order the
/// AVX kernels use, so both backends agree bit for bit.
pub(crate) fn reduce<T: SimdElement, const N: usize>(reduction: Reduction, lanes: &[T; N]) -> T {
    let fold: fn(T, T) -> T = match reduction {
        Reduction::Sum => |a, b| a + b,
        Reduction::Min => min,
        Reduction::Max => max,
    };
    tree(*lanes, fold)
}

fn tree<T: SimdElement, const N: usize>(mut lanes: [T; N], fold: fn(T, T) -> T) -> T {
    if N == 0 {
        return T::ZERO;
    }
    let mut len = N;
    while len > 1 {
        let half = len / 2;
        for i in 0..half {
            lanes[i] = fold(lanes[i], lanes[len - half + i]);
        }
        // an odd middle lane stays in place for the next round
        len -= half;
    }
    lanes[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_handles_odd_widths() {
        let lanes = [3, 1, 4, 1, 5];
        assert_eq!(reduce(Reduction::Sum, &lanes), 14);
        assert_eq!(reduce(Reduction::Min, &lanes), 1);
        assert_eq!(reduce(Reduction::Max, &lanes), 5);
        assert_eq!(reduce(Reduction::Sum, &[7]), 7);
    }

    #[test]
    fn tree_sums_pairwise() {
        // 1e8 + 1 - 1e8 sequentially loses the 1 in f32; the pairwise order
        // folds lane i with lane i + 2 first
        let lanes = [1.0e8f32, 1.0, -1.0e8, 0.0];
        assert_eq!(reduce(Reduction::Sum, &lanes), 1.0);
    }

    #[test]
    fn lanewise_min_max() {
        let a = [1.0, 5.0, -2.0, 0.0];
        let b = [2.0, 3.0, -4.0, 0.0];
        assert_eq!(lanewise(LaneOp::Min, &a, &b), [1.0, 3.0, -4.0, 0.0]);
        assert_eq!(lanewise(LaneOp::Max, &a, &b), [2.0, 5.0, -2.0, 0.0]);
    }

    #[test]
    fn nan_lanes_compare_false() {
        let a = [f32::NAN, 1.0];
        let b = [0.0, f32::NAN];
        assert_eq!(compare(LaneCmp::Lt, &a, &b), [false, false]);
        assert_eq!(compare(LaneCmp::Ge, &a, &b), [false, false]);
        assert_eq!(compare(LaneCmp::Eq, &a, &a), [false, true]);
    }
}
