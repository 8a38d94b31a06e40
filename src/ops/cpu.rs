//! Parallel CPU kernels for the matrix algorithms.
//!
//! Every kernel shards its output rows across [`rayon`](https://docs.rs/rayon)
//! workers with `par_chunks_mut(col_blocks)`. Each worker writes one output
//! row and only reads the inputs, so results do not depend on scheduling.
//!
//! Shapes are checked by the callers in [`ops`](super); the kernels assume
//! rank-2 operands with agreeing dimensions.

use crate::error::Result;
use crate::simd::{Simd, SimdElement, select};
use crate::tensors::Tensor;
use rayon::prelude::*;

/// `C = A × B` with `B` in the natural `k × n` layout.
///
/// Each output block accumulates `splat(A[i, k]) * B.block(k, j)` over the
/// logical shared dimension.
pub(crate) fn multiply<T: SimdElement, const N: usize>(
    a: &Tensor<T, N>,
    b: &Tensor<T, N>,
) -> Result<Tensor<T, N>> {
    let (m, k) = (a.rows(), a.cols());
    let mut out = Tensor::with_layout(vec![m, b.cols()], a.padded_rows())?;
    let col_blocks = out.col_blocks();

    out.blocks_mut()
        .par_chunks_mut(col_blocks)
        .enumerate()
        .take(m)
        .for_each(|(i, row)| {
            for (j, dst) in row.iter_mut().enumerate() {
                let mut acc = Simd::zero();
                for kk in 0..k {
                    acc += Simd::splat(a.lane(i, kk)) * b.row_slice(kk)[j];
                }
                *dst = acc;
            }
        });

    Ok(out)
}

/// `C = A × (Bᵗ)ᵀ`, i.e. `C[i, j] = dot(A row i, Bᵗ row j)`.
pub(crate) fn matmul_transposed<T: SimdElement, const N: usize>(
    a: &Tensor<T, N>,
    bt: &Tensor<T, N>,
) -> Result<Tensor<T, N>> {
    let (m, n) = (a.rows(), bt.rows());
    let mut out = Tensor::with_layout(vec![m, n], a.padded_rows())?;
    let col_blocks = out.col_blocks();
    let tail = a.tail_mask();

    let dot = |x: &[Simd<T, N>], y: &[Simd<T, N>]| -> T {
        let last = x.len() - 1;
        let mut acc = Simd::zero();
        for kb in 0..last {
            acc += x[kb] * y[kb];
        }
        // padding lanes of either operand must not leak into the sum
        acc += select(tail, x[last] * y[last], Simd::zero());
        acc.reduce_sum()
    };

    out.blocks_mut()
        .par_chunks_mut(col_blocks)
        .enumerate()
        .take(m)
        .for_each(|(i, row)| {
            let x = a.row_slice(i);
            for (jb, dst) in row.iter_mut().enumerate() {
                *dst = Simd::from_fn(|l| {
                    let j = jb * N + l;
                    if j < n { dot(x, bt.row_slice(j)) } else { T::ZERO }
                });
            }
        });

    Ok(out)
}

/// Output block `(c, rb)`, lane `l` takes source scalar `(rb * N + l, c)`.
///
/// Padding moves with the data, so transposing twice restores the storage
/// exactly. The caller guarantees `src.padded_rows() % N == 0`.
pub(crate) fn transpose<T: SimdElement, const N: usize>(src: &Tensor<T, N>) -> Result<Tensor<T, N>> {
    let mut out = Tensor::with_layout(
        vec![src.cols(), src.rows()],
        src.col_blocks() * N,
    )?;
    let col_blocks = out.col_blocks();

    out.blocks_mut()
        .par_chunks_mut(col_blocks)
        .enumerate()
        .for_each(|(c, row)| {
            for (rb, dst) in row.iter_mut().enumerate() {
                *dst = Simd::from_fn(|l| src.lane(rb * N + l, c));
            }
        });

    Ok(out)
}
