//! Core tensor data structures.
//!
//! # Core Tensor Utilities
//!
//! This module defines [`Tensor<T, N>`], a dense row-major array whose
//! fastest dimension is packed into [`Simd<T, N>`] blocks.
//!
//! It supports:
//! - Construction from a shape, from ragged scalar rows, from ragged rows of
//!   blocks, or from flat row-major data
//! - Checked block access by logical `(row, col)`, plus scalar convenience
//!   reads and writes by `(row, col)` or by a full multi-dimensional index
//! - Equality over the logical region
//! - The `tensor!` literal macro
//!
//! ## Design Highlights
//! - The logical shape (what [`Tensor::shape`] reports) and the padded storage
//!   are tracked separately. Columns are rounded up to whole blocks and rows
//!   are rounded up to a multiple of `N`, always with zeros
//! - Rank-k tensors are stored as `(product of leading extents) × shape[-1]`
//! - The block, not the scalar, is the unit of exchange; scalar access goes
//!   through one block and one lane
//!
//! ## Limitations
//! - Row-major only
//! - No broadcasting, slicing or reshaping
//! - Empty tensors (rank 0 or a zero extent) are rejected
//!
//! ## Example
//!
//! ```rust
//! use simd_tensor::tensor;
//! use simd_tensor::simd::F32x8;
//!
//! let t = tensor!([1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0], [9.0]).unwrap();
//! assert_eq!(t.shape(), &[3, 4]);
//! assert_eq!(t.padded_rows(), 8);
//! assert_eq!(t[(2, 0)], F32x8::new([9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
//! ```

use crate::error::{Result, TensorError};
use crate::simd::{LANES, Mask, Simd, SimdElement, select};
use briny::prelude::*;
use core::ops::{Index, IndexMut};

/// Borrowed shape checked before any storage is allocated.
struct ShapeSpec<'a>(&'a [usize]);

impl Validate for ShapeSpec<'_> {
    fn validate(&self) -> core::result::Result<(), ValidationError> {
        if self.0.is_empty() || self.0.contains(&0) {
            return Err(ValidationError);
        }
        // the element count must be addressable
        self.0
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .map(|_| ())
            .ok_or(ValidationError)
    }
}

fn validate_shape(shape: &[usize]) -> Result<()> {
    ShapeSpec(shape)
        .validate()
        .map_err(|_| TensorError::InvalidShape {
            shape: shape.to_vec(),
        })
}

/// A dense tensor of `T` packed in `N`-lane blocks.
///
/// - `shape` holds the logical extents, fastest dimension last.
/// - Storage is `padded_rows × col_blocks` blocks; lanes and rows outside the
///   logical shape are padding and never observed by equality or the matrix
///   algorithms.
#[derive(Debug, Clone)]
pub struct Tensor<T: SimdElement, const N: usize = LANES> {
    shape: Vec<usize>,
    padded_rows: usize,
    col_blocks: usize,
    data: Vec<Simd<T, N>>,
}

impl<T: SimdElement, const N: usize> Tensor<T, N> {
    /// Allocates zeroed storage for `shape` with exactly `padded_rows`
    /// storage rows.
    pub(crate) fn with_layout(shape: Vec<usize>, padded_rows: usize) -> Result<Self> {
        validate_shape(&shape)?;
        let rows = row_count(&shape);
        let col_blocks = shape[shape.len() - 1].div_ceil(N);
        // the allocation itself must stay within `isize::MAX` bytes
        let len = padded_rows
            .checked_mul(col_blocks)
            .filter(|_| padded_rows >= rows)
            .filter(|&len| {
                len.checked_mul(size_of::<Simd<T, N>>())
                    .is_some_and(|bytes| bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| TensorError::InvalidShape {
                shape: shape.clone(),
            })?;

        Ok(Self {
            shape,
            padded_rows,
            col_blocks,
            data: vec![Simd::zero(); len],
        })
    }

    /// Same as [`Tensor::with_layout`] with rows rounded up to a multiple of `N`.
    fn padded(shape: Vec<usize>) -> Result<Self> {
        validate_shape(&shape)?;
        let padded_rows = row_count(&shape)
            .checked_next_multiple_of(N)
            .ok_or_else(|| TensorError::InvalidShape {
                shape: shape.clone(),
            })?;
        Self::with_layout(shape, padded_rows)
    }

    /// Creates a zero tensor of the given logical shape.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidShape`] if the shape is empty, holds a zero
    /// extent, its element count overflows, or its block storage would exceed
    /// `isize::MAX` bytes.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Result<Self> {
        Self::padded(shape.into())
    }

    /// Builds a rank-2 tensor from ragged scalar rows.
    ///
    /// The column extent is the longest row; shorter rows are zero-padded on
    /// the right and the row storage is rounded up to a multiple of `N` with
    /// zero rows.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidShape`] if there are no rows or every row is
    /// empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use simd_tensor::tensors::Tensor;
    ///
    /// let t = Tensor::<f64, 4>::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0]]).unwrap();
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert_eq!(t.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 0.0, 0.0]]);
    /// ```
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        Self::fill_rows(vec![rows.len(), cols], rows.iter().map(|r| r.as_ref()))
    }

    /// Builds a rank-2 tensor from ragged rows of whole blocks.
    ///
    /// The column extent is `N` times the widest row; missing blocks are zero.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidShape`] if there are no rows or every row is
    /// empty.
    pub fn from_block_rows<R: AsRef<[Simd<T, N>]>>(rows: &[R]) -> Result<Self> {
        let widest = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        let shape = vec![rows.len(), widest.saturating_mul(N)];
        let mut out = Self::padded(shape)?;

        let col_blocks = out.col_blocks;
        for (dst, src) in out.data.chunks_mut(col_blocks).zip(rows) {
            let src = src.as_ref();
            dst[..src.len()].copy_from_slice(src);
        }
        Ok(out)
    }

    /// Builds a tensor from flat row-major scalars.
    ///
    /// # Errors
    ///
    /// - [`TensorError::InvalidShape`] for an empty or zero-extent shape.
    /// - [`TensorError::ConstructionSizeMismatch`] if `data.len()` is not the
    ///   product of `shape`.
    pub fn from_data(shape: impl Into<Vec<usize>>, data: &[T]) -> Result<Self> {
        let shape = shape.into();
        validate_shape(&shape)?;
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(TensorError::ConstructionSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let cols = shape[shape.len() - 1];
        Self::fill_rows(shape, data.chunks(cols))
    }

    fn fill_rows<'a>(shape: Vec<usize>, rows: impl Iterator<Item = &'a [T]>) -> Result<Self> {
        let mut out = Self::padded(shape)?;

        let col_blocks = out.col_blocks;
        for (dst, src) in out.data.chunks_mut(col_blocks).zip(rows) {
            for (b, block) in dst.iter_mut().enumerate() {
                *block = Simd::from_fn(|l| src.get(b * N + l).copied().unwrap_or(T::ZERO));
            }
        }
        Ok(out)
    }

    /// Logical extents, fastest dimension last.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Extent at `rank`; negative ranks count back from the fastest
    /// dimension (`-1` columns, `-2` rows).
    ///
    /// # Errors
    ///
    /// [`TensorError::RankOutOfRange`] unless `-rank() <= rank < rank()`.
    pub fn dim(&self, rank: isize) -> Result<usize> {
        let ndim = self.shape.len();
        let idx = if rank < 0 {
            ndim.checked_sub(rank.unsigned_abs())
        } else {
            Some(rank.unsigned_abs())
        };
        idx.and_then(|i| self.shape.get(i).copied())
            .ok_or(TensorError::RankOutOfRange { rank, ndim })
    }

    /// Number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Logical rows: the product of every extent but the last.
    #[must_use]
    pub fn rows(&self) -> usize {
        row_count(&self.shape)
    }

    /// Logical columns (`shape[-1]`).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape[self.shape.len() - 1]
    }

    /// Blocks per row.
    #[must_use]
    pub const fn col_blocks(&self) -> usize {
        self.col_blocks
    }

    /// Storage rows, including zero padding rows.
    #[must_use]
    pub const fn padded_rows(&self) -> usize {
        self.padded_rows
    }

    /// Storage extents as `[rows, columns]`.
    #[must_use]
    pub fn padded_shape(&self) -> [usize; 2] {
        [self.padded_rows, self.col_blocks * N]
    }

    /// All storage blocks, padding included, row-major.
    #[must_use]
    pub fn blocks(&self) -> &[Simd<T, N>] {
        &self.data
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Simd<T, N>] {
        &mut self.data
    }

    /// Storage blocks of row `row`; the caller keeps `row < padded_rows`.
    pub(crate) fn row_slice(&self, row: usize) -> &[Simd<T, N>] {
        &self.data[row * self.col_blocks..(row + 1) * self.col_blocks]
    }

    /// Scalar at `(row, col)` without the public bounds checks.
    pub(crate) fn lane(&self, row: usize, col: usize) -> T {
        self.data[row * self.col_blocks + col / N].as_array()[col % N]
    }

    /// Mask of the logical lanes in the last block of a row.
    pub(crate) fn tail_mask(&self) -> Mask<N> {
        Mask::first_n(self.cols() - (self.col_blocks - 1) * N)
    }

    /// Blocks of logical row `row`.
    ///
    /// # Errors
    ///
    /// [`TensorError::IndexOutOfBounds`] if `row >= rows()`.
    pub fn row_blocks(&self, row: usize) -> Result<&[Simd<T, N>]> {
        if row >= self.rows() {
            return Err(self.out_of_bounds(row, 0));
        }
        Ok(self.row_slice(row))
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> TensorError {
        TensorError::IndexOutOfBounds {
            index: vec![row, col],
            shape: self.shape.clone(),
        }
    }

    fn block_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows() || col >= self.cols() {
            return Err(self.out_of_bounds(row, col));
        }
        if col % N != 0 {
            return Err(TensorError::MisalignedColumn { col, lanes: N });
        }
        Ok(row * self.col_blocks + col / N)
    }

    /// Block covering logical columns `col..col + N` of `row`.
    ///
    /// # Errors
    ///
    /// - [`TensorError::IndexOutOfBounds`] if `(row, col)` is outside the
    ///   logical shape.
    /// - [`TensorError::MisalignedColumn`] if `col` is not a multiple of `N`.
    pub fn block(&self, row: usize, col: usize) -> Result<&Simd<T, N>> {
        let idx = self.block_index(row, col)?;
        Ok(&self.data[idx])
    }

    /// Mutable block covering logical columns `col..col + N` of `row`.
    ///
    /// Lanes past the logical column extent are padding; writing them is
    /// allowed and has no observable effect.
    ///
    /// # Errors
    ///
    /// Same as [`Tensor::block`].
    pub fn block_mut(&mut self, row: usize, col: usize) -> Result<&mut Simd<T, N>> {
        let idx = self.block_index(row, col)?;
        Ok(&mut self.data[idx])
    }

    /// Scalar at logical `(row, col)`.
    ///
    /// # Errors
    ///
    /// [`TensorError::IndexOutOfBounds`] outside the logical shape.
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        if row >= self.rows() || col >= self.cols() {
            return Err(self.out_of_bounds(row, col));
        }
        Ok(self.lane(row, col))
    }

    /// Overwrites the scalar at logical `(row, col)`.
    ///
    /// # Errors
    ///
    /// [`TensorError::IndexOutOfBounds`] outside the logical shape.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(self.out_of_bounds(row, col));
        }
        self.data[row * self.col_blocks + col / N].set(col % N, value)
    }

    /// Maps a full row-major index to `(row, col)` of the flattened layout.
    fn position(&self, indices: &[usize]) -> Result<(usize, usize)> {
        let ndim = self.shape.len();
        if indices.len() != ndim {
            return Err(TensorError::RankOutOfRange {
                rank: isize::try_from(indices.len()).unwrap_or(isize::MAX),
                ndim,
            });
        }
        if indices.iter().zip(&self.shape).any(|(&i, &d)| i >= d) {
            return Err(TensorError::IndexOutOfBounds {
                index: indices.to_vec(),
                shape: self.shape.clone(),
            });
        }
        let (lead, col) = indices.split_at(ndim - 1);
        let row = lead
            .iter()
            .zip(&self.shape)
            .fold(0, |row, (&i, &d)| row * d + i);
        Ok((row, col[0]))
    }

    /// Scalar at a full multi-dimensional index, e.g. `[b, r, c]` on a rank-3
    /// tensor.
    ///
    /// # Errors
    ///
    /// - [`TensorError::RankOutOfRange`] if `indices.len() != rank()`.
    /// - [`TensorError::IndexOutOfBounds`] if any index reaches its extent.
    pub fn get_at(&self, indices: &[usize]) -> Result<T> {
        let (row, col) = self.position(indices)?;
        Ok(self.lane(row, col))
    }

    /// Overwrites the scalar at a full multi-dimensional index.
    ///
    /// # Errors
    ///
    /// Same as [`Tensor::get_at`].
    pub fn set_at(&mut self, indices: &[usize], value: T) -> Result<()> {
        let (row, col) = self.position(indices)?;
        self.data[row * self.col_blocks + col / N].set(col % N, value)
    }

    /// Logical rows as scalars; the inverse of [`Tensor::from_rows`] for
    /// rectangular input.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        (0..self.rows())
            .map(|r| {
                self.row_slice(r)
                    .iter()
                    .flat_map(Simd::iter)
                    .take(self.cols())
                    .collect()
            })
            .collect()
    }

    /// Logical elements, flat and row-major.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.to_rows().into_iter().flatten().collect()
    }
}

fn row_count(shape: &[usize]) -> usize {
    shape[..shape.len().saturating_sub(1)].iter().product()
}

/// Equal when the logical shapes match and every logical lane is equal by
/// value. Padding is ignored and NaN lanes never compare equal.
impl<T: SimdElement, const N: usize> PartialEq for Tensor<T, N> {
    fn eq(&self, other: &Self) -> bool {
        if self.shape != other.shape {
            return false;
        }
        let tail = self.tail_mask();
        let zero = Simd::zero();
        (0..self.rows()).all(|r| {
            let (a, b) = (self.row_slice(r), other.row_slice(r));
            let last = self.col_blocks - 1;
            a[..last] == b[..last] && select(tail, a[last], zero) == select(tail, b[last], zero)
        })
    }
}

impl<T: SimdElement, const N: usize> Index<(usize, usize)> for Tensor<T, N> {
    type Output = Simd<T, N>;

    /// # Panics
    ///
    /// Panics on the conditions [`Tensor::block`] reports as errors.
    fn index(&self, (row, col): (usize, usize)) -> &Simd<T, N> {
        match self.block(row, col) {
            Ok(block) => block,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: SimdElement, const N: usize> IndexMut<(usize, usize)> for Tensor<T, N> {
    /// # Panics
    ///
    /// Panics on the conditions [`Tensor::block_mut`] reports as errors.
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Simd<T, N> {
        match self.block_mut(row, col) {
            Ok(block) => block,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Defines a rank-2 tensor of [`LANES`](crate::simd::LANES)-wide blocks from
/// ragged literal rows.
///
/// Expands to [`Tensor::from_rows`] and returns its `Result`.
///
/// # Example
/// ```
/// use simd_tensor::tensor;
/// let t = tensor!([1.0, 2.0], [3.0]).unwrap();
/// assert_eq!(t.shape(), &[2, 2]);
/// assert_eq!(t.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 0.0]]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($( [ $( $x:expr ),* $(,)? ] ),+ $(,)?) => {
        $crate::tensors::Tensor::<_, { $crate::simd::LANES }>::from_rows(&[
            $( &[ $( $x ),* ][..] ),+
        ])
    };
}
