//! Fixed-width packed vectors.
//!
//! # Core SIMD Utilities
//!
//! [`Simd<T, N>`] holds exactly `N` scalars of one [`SimdElement`] type and is
//! the unit every tensor block is made of. It supports:
//!
//! - Construction from literal lanes, a broadcast scalar, a slice or a raw
//!   pointer (unaligned load), or zero
//! - Lane-wise `+ - * /`, `min`, `max`
//! - Lane-wise comparison into a [`Mask`] and [`select`] by mask
//! - Horizontal [`reduce_sum`] / [`reduce_min`] / `reduce_max`
//! - Checked single-lane reads and writes
//!
//! ## Design Highlights
//!
//! - `N` is a const generic; [`LANES`] (8) matches one 256-bit register of
//!   `f32`, the crate's default
//! - Every kernel goes through [`SimdElement`], which picks the active
//!   [`Backend`](crate::backend::Backend); `f32 × 8` and `f64 × 4` get AVX,
//!   everything else runs the portable loops
//! - Reductions fold pairwise, so float results can differ in the last bits
//!   from a sequential sum
//!
//! ## Example
//!
//! ```rust
//! use simd_tensor::simd::{select, F32x8};
//!
//! let x = F32x8::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
//! let y = F32x8::new([8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
//! let max = select(x.cmp_lt(&y), y, x);
//! assert_eq!(max.to_array(), [8.0, 7.0, 6.0, 5.0, 5.0, 6.0, 7.0, 8.0]);
//! ```

use crate::error::{Result, TensorError};
use core::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod avx;
mod element;
mod mask;
mod portable;

pub use self::element::{LaneCmp, LaneOp, Reduction, SimdElement};
pub use self::mask::Mask;

/// Default vector width: one 256-bit register of `f32`.
pub const LANES: usize = 8;

/// Eight `f32` lanes.
pub type F32x8 = Simd<f32, 8>;

/// Four `f64` lanes.
pub type F64x4 = Simd<f64, 4>;

/// A packed value of `N` scalars.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(32))]
pub struct Simd<T: SimdElement, const N: usize = LANES> {
    lanes: [T; N],
}

impl<T: SimdElement, const N: usize> Simd<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "a SIMD vector needs at least one lane");

    /// Creates a vector from `N` literal lanes.
    #[must_use]
    pub const fn new(lanes: [T; N]) -> Self {
        let () = Self::NON_EMPTY;
        Self { lanes }
    }

    /// Broadcasts one scalar to every lane.
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self::new([value; N])
    }

    /// All lanes zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self::splat(T::ZERO)
    }

    /// Builds each lane from its index.
    #[must_use]
    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        Self::new(core::array::from_fn(f))
    }

    /// Creates a vector from a literal list that must hold exactly `N` lanes.
    ///
    /// # Errors
    ///
    /// [`TensorError::ConstructionSizeMismatch`] if `values.len() != N`.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        let lanes: [T; N] = values
            .try_into()
            .map_err(|_| TensorError::ConstructionSizeMismatch {
                expected: N,
                actual: values.len(),
            })?;
        Ok(Self::new(lanes))
    }

    /// Loads the first `N` elements of `values`; the rest are ignored.
    ///
    /// # Errors
    ///
    /// [`TensorError::ConstructionSizeMismatch`] if fewer than `N` elements
    /// are readable. Pad short inputs before loading.
    pub fn load(values: &[T]) -> Result<Self> {
        match values.get(..N) {
            Some(head) => Self::from_slice(head),
            None => Err(TensorError::ConstructionSizeMismatch {
                expected: N,
                actual: values.len(),
            }),
        }
    }

    /// Loads `N` lanes from a raw, possibly unaligned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `N` consecutive `T`s. Reading past
    /// the end of an allocation is undefined behavior; use [`Simd::load`]
    /// when the length is not known to be sufficient.
    #[must_use]
    pub unsafe fn load_unaligned(ptr: *const T) -> Self {
        // SAFETY: upheld by the caller.
        Self::new(unsafe { ptr.cast::<[T; N]>().read_unaligned() })
    }

    /// Writes all lanes to the front of `dest`.
    ///
    /// # Errors
    ///
    /// [`TensorError::ConstructionSizeMismatch`] if `dest` is shorter than `N`.
    pub fn store(&self, dest: &mut [T]) -> Result<()> {
        let len = dest.len();
        let head = dest
            .get_mut(..N)
            .ok_or(TensorError::ConstructionSizeMismatch {
                expected: N,
                actual: len,
            })?;
        head.copy_from_slice(&self.lanes);
        Ok(())
    }

    /// Number of lanes.
    #[must_use]
    pub const fn size(&self) -> usize {
        N
    }

    /// Borrows the lanes.
    #[must_use]
    pub const fn as_array(&self) -> &[T; N] {
        &self.lanes
    }

    #[must_use]
    pub fn to_array(self) -> [T; N] {
        self.lanes
    }

    /// Iterates the lanes in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.lanes.iter().copied()
    }

    /// Reads one lane.
    ///
    /// # Errors
    ///
    /// [`TensorError::LaneOutOfRange`] if `index >= N`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.lanes
            .get(index)
            .copied()
            .ok_or(TensorError::LaneOutOfRange { index, lanes: N })
    }

    /// Replaces one lane.
    ///
    /// Extracting and reinserting a single lane of a packed register is slow;
    /// keep this out of hot loops and build whole vectors instead.
    ///
    /// # Errors
    ///
    /// [`TensorError::LaneOutOfRange`] if `index >= N`.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        let lane = self
            .lanes
            .get_mut(index)
            .ok_or(TensorError::LaneOutOfRange { index, lanes: N })?;
        *lane = value;
        Ok(())
    }

    /// Lane-wise `self < other`.
    #[must_use]
    pub fn cmp_lt(&self, other: &Self) -> Mask<N> {
        self.compare(LaneCmp::Lt, other)
    }

    /// Lane-wise `self <= other`.
    #[must_use]
    pub fn cmp_le(&self, other: &Self) -> Mask<N> {
        self.compare(LaneCmp::Le, other)
    }

    /// Lane-wise `self > other`.
    #[must_use]
    pub fn cmp_gt(&self, other: &Self) -> Mask<N> {
        self.compare(LaneCmp::Gt, other)
    }

    /// Lane-wise `self >= other`.
    #[must_use]
    pub fn cmp_ge(&self, other: &Self) -> Mask<N> {
        self.compare(LaneCmp::Ge, other)
    }

    /// Lane-wise `self == other`.
    #[must_use]
    pub fn cmp_eq(&self, other: &Self) -> Mask<N> {
        self.compare(LaneCmp::Eq, other)
    }

    fn compare(&self, cmp: LaneCmp, other: &Self) -> Mask<N> {
        Mask::from_array(T::compare(cmp, &self.lanes, &other.lanes))
    }

    /// Lane-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        self.lanewise(LaneOp::Min, other)
    }

    /// Lane-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        self.lanewise(LaneOp::Max, other)
    }

    fn lanewise(self, op: LaneOp, other: Self) -> Self {
        Self::new(T::lanewise(op, &self.lanes, &other.lanes))
    }

    /// Sum of all lanes.
    #[must_use]
    pub fn reduce_sum(&self) -> T {
        T::reduce(Reduction::Sum, &self.lanes)
    }

    /// Smallest lane.
    #[must_use]
    pub fn reduce_min(&self) -> T {
        T::reduce(Reduction::Min, &self.lanes)
    }

    /// Largest lane.
    #[must_use]
    pub fn reduce_max(&self) -> T {
        T::reduce(Reduction::Max, &self.lanes)
    }
}

/// Picks `a[i]` where `mask[i]` is set, else `b[i]`.
#[must_use]
pub fn select<T: SimdElement, const N: usize>(
    mask: Mask<N>,
    a: Simd<T, N>,
    b: Simd<T, N>,
) -> Simd<T, N> {
    Simd::new(T::blend(mask.as_array(), &a.lanes, &b.lanes))
}

/// Sum of all lanes of `v` (pairwise).
#[must_use]
pub fn reduce_sum<T: SimdElement, const N: usize>(v: &Simd<T, N>) -> T {
    v.reduce_sum()
}

/// Smallest lane of `v` (pairwise).
#[must_use]
pub fn reduce_min<T: SimdElement, const N: usize>(v: &Simd<T, N>) -> T {
    v.reduce_min()
}

impl<T: SimdElement, const N: usize> Default for Simd<T, N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: SimdElement, const N: usize> From<[T; N]> for Simd<T, N> {
    fn from(lanes: [T; N]) -> Self {
        Self::new(lanes)
    }
}

impl<T: SimdElement, const N: usize> From<Simd<T, N>> for [T; N] {
    fn from(v: Simd<T, N>) -> Self {
        v.lanes
    }
}

/// Exact lane-by-lane equality; NaN lanes never compare equal.
impl<T: SimdElement, const N: usize> PartialEq for Simd<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.lanes == other.lanes
    }
}

impl<T: SimdElement, const N: usize> Index<usize> for Simd<T, N> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= N`; use [`Simd::get`] for a checked read.
    fn index(&self, index: usize) -> &T {
        match self.lanes.get(index) {
            Some(lane) => lane,
            None => panic!("{}", TensorError::LaneOutOfRange { index, lanes: N }),
        }
    }
}

impl<T: SimdElement, const N: usize> IndexMut<usize> for Simd<T, N> {
    /// # Panics
    ///
    /// Panics if `index >= N`; use [`Simd::set`] for a checked write.
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.lanes.get_mut(index) {
            Some(lane) => lane,
            None => panic!("{}", TensorError::LaneOutOfRange { index, lanes: N }),
        }
    }
}

macro_rules! lanewise_op {
    ($trait:ident, $method:ident, $assign:ident, $assign_method:ident, $op:expr) => {
        impl<T: SimdElement, const N: usize> $trait for Simd<T, N> {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: Self) -> Self {
                self.lanewise($op, rhs)
            }
        }

        impl<T: SimdElement, const N: usize> $assign for Simd<T, N> {
            #[inline]
            fn $assign_method(&mut self, rhs: Self) {
                *self = self.lanewise($op, rhs);
            }
        }
    };
}

lanewise_op!(Add, add, AddAssign, add_assign, LaneOp::Add);
lanewise_op!(Sub, sub, SubAssign, sub_assign, LaneOp::Sub);
lanewise_op!(Mul, mul, MulAssign, mul_assign, LaneOp::Mul);
lanewise_op!(Div, div, DivAssign, div_assign, LaneOp::Div);

impl<T: SimdElement, const N: usize> Neg for Simd<T, N> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(self.lanes.map(|x| -x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approx::approx_eq;

    fn alternating() -> F32x8 {
        F32x8::new([1.0, -2.0, 3.0, -4.0, 5.0, -6.0, 7.0, -8.0])
    }

    #[test]
    fn sum_and_min_reduction() {
        let x = alternating();
        assert!(approx_eq(&x.reduce_sum(), &-4.0));
        assert!(approx_eq(&reduce_min(&x), &-8.0));
        assert!(approx_eq(&x.reduce_max(), &7.0));
        assert!(approx_eq(&reduce_sum(&x), &x.iter().sum::<f32>()));
    }

    #[test]
    fn conditional_selection_picks_lane_maximum() {
        let x = F32x8::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let y = F32x8::new([8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let out = select(x.cmp_lt(&y), y, x);
        for i in 0..x.size() {
            assert_eq!(out[i], x[i].max(y[i]));
        }
        assert_eq!(out, x.max(y));
    }

    #[test]
    fn subscript_reads_a_lane() {
        let x = F32x8::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(x[2], 3.0);
        assert_eq!(x.get(7), Ok(8.0));
    }

    #[test]
    fn lane_write_leaves_other_lanes() {
        let mut x = alternating();
        x.set(3, 42.0).unwrap();
        assert_eq!(x[3], 42.0);
        x[0] = -1.0;
        assert_eq!(
            x.to_array(),
            [-1.0, -2.0, 3.0, 42.0, 5.0, -6.0, 7.0, -8.0]
        );
    }

    #[test]
    fn lane_access_is_bounds_checked() {
        let mut x = F32x8::zero();
        let err = TensorError::LaneOutOfRange { index: 8, lanes: 8 };
        assert_eq!(x.get(8), Err(err.clone()));
        assert_eq!(x.set(8, 1.0), Err(err));
    }

    #[test]
    #[should_panic(expected = "lane 8 out of range for a 8-lane vector")]
    fn subscript_panics_out_of_range() {
        let x = F32x8::zero();
        let _ = x[8];
    }

    #[test]
    fn arithmetic_is_lanewise() {
        let a = F64x4::new([1.0, 2.0, 3.0, 4.0]);
        let b = F64x4::splat(2.0);
        assert_eq!((a + b).to_array(), [3.0, 4.0, 5.0, 6.0]);
        assert_eq!((a - b).to_array(), [-1.0, 0.0, 1.0, 2.0]);
        assert_eq!((a * b).to_array(), [2.0, 4.0, 6.0, 8.0]);
        assert_eq!((a / b).to_array(), [0.5, 1.0, 1.5, 2.0]);
        assert_eq!((-a).to_array(), [-1.0, -2.0, -3.0, -4.0]);

        let mut acc = F64x4::zero();
        acc += a;
        acc *= b;
        acc -= a;
        acc /= b;
        assert_eq!(acc.to_array(), [0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn integer_lanes_use_portable_kernels() {
        let a: Simd<i32, 3> = Simd::new([4, -9, 2]);
        let b: Simd<i32, 3> = Simd::splat(1);
        assert_eq!((a + b).to_array(), [5, -8, 3]);
        assert_eq!(a.reduce_sum(), -3);
        assert_eq!(a.reduce_min(), -9);
        assert_eq!(a.cmp_gt(&b).to_array(), [true, false, true]);
    }

    #[test]
    fn slice_construction_checks_length() {
        assert_eq!(
            F32x8::from_slice(&[1.0; 7]),
            Err(TensorError::ConstructionSizeMismatch { expected: 8, actual: 7 })
        );
        assert!(F32x8::from_slice(&[1.0; 9]).is_err());
        assert_eq!(F32x8::load(&[2.0; 12]), Ok(F32x8::splat(2.0)));
        assert!(F32x8::load(&[2.0; 3]).is_err());
    }

    #[test]
    fn unaligned_pointer_load() {
        let data: Vec<f32> = (0..9).map(|i| i as f32).collect();
        // offset by one element so the address is not 32-byte aligned
        let v = unsafe { F32x8::load_unaligned(data[1..].as_ptr()) };
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn store_round_trips() {
        let x = alternating();
        let mut out = [0.0; 10];
        x.store(&mut out).unwrap();
        assert_eq!(F32x8::load(&out), Ok(x));
        assert!(x.store(&mut [0.0; 4]).is_err());
    }

    #[test]
    fn equality_is_exact() {
        let a = alternating();
        let mut b = a;
        assert_eq!(a, b);
        b[5] += f32::EPSILON * 8.0;
        assert_ne!(a, b);
        assert_ne!(F32x8::splat(f32::NAN), F32x8::splat(f32::NAN));
    }

    #[test]
    fn comparisons_are_symmetric() {
        let x = alternating();
        let zero = F32x8::zero();
        assert_eq!(x.cmp_gt(&zero), zero.cmp_lt(&x));
        assert_eq!(x.cmp_ge(&zero), !x.cmp_lt(&zero));
        assert_eq!(x.cmp_le(&x).count(), 8);
        assert_eq!(x.cmp_eq(&zero).count(), 0);
    }
}
