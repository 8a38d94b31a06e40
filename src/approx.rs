//! Utilities to approximate equality of floating point values.
//!
//! Pairwise reductions and blocked multiplies reassociate float sums, so their
//! results are compared against references with a tolerance instead of `==`.

use crate::simd::{Simd, SimdElement};
use crate::tensors::Tensor;

/// The max epsilon accepted on `f32`s.
pub const F32_MAX_ERROR: f32 = 1e-3;

/// The expected minimum epsilon accepted on `f32`s.
pub const F32_AVG_ERROR: f32 = 1e-5;

/// The best expected epsilon accepted on `f32`s.
pub const F32_MIN_ERROR: f32 = 1e-6;

/// The max epsilon accepted on `f64`s.
pub const F64_MAX_ERROR: f64 = 1e-3;

/// The expected minimum epsilon accepted on `f64`s.
pub const F64_AVG_ERROR: f64 = 1e-6;

/// The best expected epsilon accepted on `f64`s.
pub const F64_MIN_ERROR: f64 = 1e-13;

/// The approximated equality enumerated, best first.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApproxEquality {
    /// Very strong epsilon.
    Precise = 0,

    /// Good epsilon.
    Partial = 1,

    /// Acceptable epsilon.
    Relative = 2,

    /// No relative equality.
    Scarce = 3,
}

/// Checks the distance between two values against the epsilon ladder.
pub trait RelativeEq<Rhs: ?Sized = Self> {
    /// Enumerates the equality of `self` and `rhs`.
    fn approx_eq(&self, rhs: &Rhs) -> ApproxEquality;
}

macro_rules! float_relative_eq {
    ($t:ty, $min:expr, $avg:expr, $max:expr) => {
        impl RelativeEq for $t {
            fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
                // exact hits cover equal infinities, whose difference is NaN
                if self == rhs {
                    return ApproxEquality::Precise;
                }
                let dif = (self - rhs).abs();
                // scale by magnitude so large accumulations get the same
                // relative slack as small ones
                let scale = self.abs().max(rhs.abs()).max(1.0);

                if dif < $min * scale {
                    ApproxEquality::Precise
                } else if dif < $avg * scale {
                    ApproxEquality::Partial
                } else if dif < $max * scale {
                    ApproxEquality::Relative
                } else {
                    ApproxEquality::Scarce
                }
            }
        }
    };
}

float_relative_eq!(f32, F32_MIN_ERROR, F32_AVG_ERROR, F32_MAX_ERROR);
float_relative_eq!(f64, F64_MIN_ERROR, F64_AVG_ERROR, F64_MAX_ERROR);

impl RelativeEq for i32 {
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        if self == rhs {
            ApproxEquality::Precise
        } else {
            ApproxEquality::Scarce
        }
    }
}

/// Worst rating across paired elements; stops at the first `Scarce`.
fn worst<'a, T: RelativeEq + 'a>(pairs: impl Iterator<Item = (&'a T, &'a T)>) -> ApproxEquality {
    let mut eq = ApproxEquality::Precise;
    for (a, b) in pairs {
        eq = eq.max(a.approx_eq(b));
        if eq == ApproxEquality::Scarce {
            break;
        }
    }
    eq
}

impl<T: RelativeEq> RelativeEq for [T] {
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        if self.len() != rhs.len() {
            return ApproxEquality::Scarce;
        }
        worst(self.iter().zip(rhs))
    }
}

impl<const N: usize, T: RelativeEq> RelativeEq for [T; N] {
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        worst(self.iter().zip(rhs))
    }
}

impl<T: SimdElement + RelativeEq, const N: usize> RelativeEq for Simd<T, N> {
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        self.as_array().approx_eq(rhs.as_array())
    }
}

/// Compares the logical region only; padding lanes and rows are ignored.
impl<T: SimdElement + RelativeEq, const N: usize> RelativeEq for Tensor<T, N> {
    fn approx_eq(&self, rhs: &Self) -> ApproxEquality {
        if self.shape() != rhs.shape() {
            return ApproxEquality::Scarce;
        }
        self.to_vec().as_slice().approx_eq(rhs.to_vec().as_slice())
    }
}

/// Approximates equality based off the relative difference.
///
/// Only the [`ApproxEquality::Precise`] rating counts as equal.
pub fn approx_eq<A: RelativeEq<B> + ?Sized, B: ?Sized>(a: &A, b: &B) -> bool {
    a.approx_eq(b) == ApproxEquality::Precise
}

/// Like [`approx_eq`], accepting any rating up to `tolerance`.
pub fn approx_eq_within<A: RelativeEq<B> + ?Sized, B: ?Sized>(
    a: &A,
    b: &B,
    tolerance: ApproxEquality,
) -> bool {
    a.approx_eq(b) <= tolerance
}
