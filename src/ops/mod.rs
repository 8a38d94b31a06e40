//! # Matrix Algorithms
//!
//! Backend-agnostic entry points for the tensor algorithms. This layer checks
//! operand shapes and returns [`TensorError::DimensionMismatch`] before any
//! work starts; the parallel kernels live in [`cpu`].
//!
//! - [`multiply`]: `A × B` with both operands in the natural layout
//! - [`matmul_transposed`]: `A × Bᵀ` where the right operand is stored as `Bᵀ`
//! - [`transpose`]: block transpose of a row-aligned tensor
//!
//! All three allocate a fresh result and never write to their inputs. Lane
//! arithmetic inside the kernels runs on the active
//! [`Backend`](crate::backend::Backend).
//!
//! ## Example
//!
//! ```rust
//! use simd_tensor::ops::{multiply, transpose};
//! use simd_tensor::tensor;
//!
//! let a = tensor!([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]).unwrap();
//! let b = tensor!([1.0, 2.0], [1.0, 2.0], [1.0, 2.0]).unwrap();
//! let c = multiply(&a, &b).unwrap();
//! assert_eq!(c.to_rows(), vec![vec![6.0, 12.0], vec![15.0, 30.0]]);
//! assert_eq!(transpose(&transpose(&c).unwrap()).unwrap(), c);
//! ```

pub(crate) mod cpu;

use crate::backend::get_backend;
use crate::error::{Result, TensorError};
use crate::simd::SimdElement;
use crate::tensors::Tensor;
use log::debug;

fn require_rank2<T: SimdElement, const N: usize>(
    op: &'static str,
    operands: &[&Tensor<T, N>],
) -> Result<()> {
    if operands.iter().all(|t| t.rank() == 2) {
        Ok(())
    } else {
        Err(mismatch(op, operands))
    }
}

fn mismatch<T: SimdElement, const N: usize>(
    op: &'static str,
    operands: &[&Tensor<T, N>],
) -> TensorError {
    let shapes: Vec<&[usize]> = operands.iter().map(|t| t.shape()).collect();
    TensorError::dimension_mismatch(op, &shapes)
}

/// Multiplies `A (m × k)` by `B (k × n)`.
///
/// # Requirements
/// - Both operands are rank 2 and `A.dim(-1) == B.dim(-2)`.
///
/// # Returns
/// - A new `m × n` tensor with the same padded row count as `A`.
///
/// # Errors
/// - [`TensorError::DimensionMismatch`] carrying both shapes if the
///   requirements do not hold.
///
/// # Example
/// ```rust
/// use simd_tensor::ops::multiply;
/// use simd_tensor::tensors::Tensor;
///
/// let a = Tensor::<f32>::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
/// let id = Tensor::<f32>::from_rows(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
/// assert_eq!(multiply(&a, &id).unwrap(), a);
/// ```
pub fn multiply<T: SimdElement, const N: usize>(
    a: &Tensor<T, N>,
    b: &Tensor<T, N>,
) -> Result<Tensor<T, N>> {
    require_rank2("multiply", &[a, b])?;
    if a.cols() != b.rows() {
        return Err(mismatch("multiply", &[a, b]));
    }
    debug!(
        "multiply: {:?} x {:?} on {:?}",
        a.shape(),
        b.shape(),
        get_backend()
    );
    cpu::multiply(a, b)
}

/// Multiplies `A (m × k)` by the transpose of `Bᵗ (n × k)`.
///
/// Each output element is the dot product of one row of `A` with one row of
/// `Bᵗ`, accumulated blockwise and collapsed with a pairwise horizontal sum.
///
/// # Requirements
/// - Both operands are rank 2 and `A.dim(-1) == Bᵗ.dim(-1)`.
///
/// # Returns
/// - A new `m × n` tensor with the same padded row count as `A`.
///
/// # Errors
/// - [`TensorError::DimensionMismatch`] carrying both shapes if the
///   requirements do not hold.
pub fn matmul_transposed<T: SimdElement, const N: usize>(
    a: &Tensor<T, N>,
    bt: &Tensor<T, N>,
) -> Result<Tensor<T, N>> {
    require_rank2("matmul_transposed", &[a, bt])?;
    if a.cols() != bt.cols() {
        return Err(mismatch("matmul_transposed", &[a, bt]));
    }
    debug!(
        "matmul_transposed: {:?} x {:?}ᵀ on {:?}",
        a.shape(),
        bt.shape(),
        get_backend()
    );
    cpu::matmul_transposed(a, bt)
}

/// Transposes a rank-2 tensor.
///
/// # Requirements
/// - Rank 2 and `padded_rows() % N == 0`. Every public constructor pads rows
///   this way; results of the other algorithms inherit it.
///
/// # Returns
/// - A new `cols × rows` tensor whose padded row count is a multiple of `N`,
///   so it can be transposed again.
///
/// # Errors
/// - [`TensorError::DimensionMismatch`] if the requirements do not hold.
pub fn transpose<T: SimdElement, const N: usize>(t: &Tensor<T, N>) -> Result<Tensor<T, N>> {
    require_rank2("transpose", &[t])?;
    if t.padded_rows() % N != 0 {
        return Err(mismatch("transpose", &[t]));
    }
    debug!("transpose: {:?}", t.shape());
    cpu::transpose(t)
}
