//! simd_tensor: fixed-width SIMD vectors and lane-packed dense tensors.
//!
//! Every tensor stores its fastest dimension in [`Simd<T, N>`](simd::Simd)
//! blocks, and the matrix algorithms work block by block instead of scalar by
//! scalar.
//!
//! # Features
//!
//! - `Simd<T, N>` packed vectors with lane-wise arithmetic, comparison masks,
//!   selection and pairwise horizontal reductions.
//! - `Tensor<T, N>` with an explicit logical shape over zero-padded block
//!   storage.
//! - Row-parallel `multiply`, `matmul_transposed` and `transpose`.
//! - Runtime backend selection between portable loops and AVX kernels.
//!
//! # Modules
//!
//! - [`simd`]: Packed vectors, masks and lane kernels.
//! - [`tensors`]: Block-packed tensor storage and indexing.
//! - [`ops`]: Matrix algorithms over tensors.
//! - [`backend`]: Lane kernel backend detection and selection.
//! - [`error`]: Error type and coarse error kinds.
//! - [`approx`]: Tolerance-based comparison of float results.
//!
//! # Feature Flags
//!
//! - `simd` *(default)*: Compiles the AVX kernels on x86_64. They are only
//!   used when the CPU reports AVX at runtime.
//!
//! # Example
//!
//! ```rust
//! use simd_tensor::{matmul_transposed, tensor};
//!
//! let a = tensor!([1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]).unwrap();
//! let bt = tensor!([2.0f32, 2.0, 2.0]).unwrap();
//! let c = matmul_transposed(&a, &bt).unwrap();
//! assert_eq!(c.to_rows(), vec![vec![12.0], vec![30.0]]);
//! ```

pub mod approx;
pub mod backend;
pub mod error;
pub mod ops;
pub mod simd;
pub mod tensors;

pub use backend::{Backend, get_backend, set_backend};
pub use error::{ErrorKind, Result, TensorError};
pub use ops::{matmul_transposed, multiply, transpose};
pub use simd::{LANES, Mask, Simd, SimdElement, reduce_min, reduce_sum, select};
pub use tensors::Tensor;
