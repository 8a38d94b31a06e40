//! Per-lane boolean masks produced by vector comparisons.

use super::LANES;
use crate::error::{Result, TensorError};
use core::ops::{BitAnd, BitOr, Not};

/// One boolean per lane, produced by the `cmp_*` comparisons of
/// [`Simd`](super::Simd) and consumed by [`select`](super::select).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask<const N: usize = LANES> {
    lanes: [bool; N],
}

impl<const N: usize> Mask<N> {
    pub(crate) const fn from_array(lanes: [bool; N]) -> Self {
        Self { lanes }
    }

    /// Lanes `0..n` set, the rest clear. Used to ignore padding lanes.
    pub(crate) fn first_n(n: usize) -> Self {
        Self {
            lanes: core::array::from_fn(|i| i < n),
        }
    }

    /// Reads one lane.
    ///
    /// # Errors
    ///
    /// [`TensorError::LaneOutOfRange`] if `lane >= N`.
    pub fn test(&self, lane: usize) -> Result<bool> {
        self.lanes
            .get(lane)
            .copied()
            .ok_or(TensorError::LaneOutOfRange { index: lane, lanes: N })
    }

    /// `true` if any lane is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.lanes.iter().any(|&m| m)
    }

    /// `true` if every lane is set.
    #[must_use]
    pub fn all(&self) -> bool {
        self.lanes.iter().all(|&m| m)
    }

    /// Number of set lanes.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lanes.iter().filter(|&&m| m).count()
    }

    /// Copies the lanes out.
    #[must_use]
    pub const fn to_array(self) -> [bool; N] {
        self.lanes
    }

    pub(crate) const fn as_array(&self) -> &[bool; N] {
        &self.lanes
    }
}

impl<const N: usize> Not for Mask<N> {
    type Output = Self;

    fn not(self) -> Self {
        Self {
            lanes: self.lanes.map(|m| !m),
        }
    }
}

impl<const N: usize> BitAnd for Mask<N> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self {
            lanes: core::array::from_fn(|i| self.lanes[i] & rhs.lanes[i]),
        }
    }
}

impl<const N: usize> BitOr for Mask<N> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            lanes: core::array::from_fn(|i| self.lanes[i] | rhs.lanes[i]),
        }
    }
}
