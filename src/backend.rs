//! Lane kernel backend selection.
//!
//! Every lane-wise kernel of [`Simd`](crate::simd::Simd) is routed through the
//! backend chosen here rather than through `cfg` attributes at the call sites.
//!
//! # Supported Backends
//!
//! - `Portable`: plain scalar loops over the lanes, correct for every element
//!   type and width (default fallback).
//! - `Avx`: x86_64 AVX intrinsics for `f32 × 8` and `f64 × 4` vectors. Other
//!   element types and widths keep using the portable loops.
//!
//! The backend is stored globally using an `AtomicU8`. It is resolved lazily
//! from the CPU's reported features on first use and can be overridden at
//! runtime with [`set_backend`], e.g. to compare both paths.

use crate::error::{Result, TensorError};
use core::sync::atomic::{AtomicU8, Ordering};
use log::debug;

/// Enumeration of supported lane kernel backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Backend {
    /// Scalar loop over the lanes (default).
    #[default]
    Portable = 0,
    /// 256-bit AVX registers.
    Avx,
}

impl TryFrom<u8> for Backend {
    type Error = ();

    fn try_from(value: u8) -> core::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Portable),
            1 => Ok(Self::Avx),
            _ => Err(()),
        }
    }
}

impl Backend {
    /// Returns the fastest backend this CPU supports.
    ///
    /// Without the `simd` feature, or off x86_64, this is always
    /// [`Backend::Portable`].
    #[must_use]
    pub fn detect() -> Self {
        if Self::Avx.is_available() {
            Self::Avx
        } else {
            Self::Portable
        }
    }

    /// Checks whether the running CPU (and the compiled feature set) can
    /// execute this backend's kernels.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Portable => true,
            Self::Avx => avx_supported(),
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn avx_supported() -> bool {
    std::arch::is_x86_feature_detected!("avx")
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
const fn avx_supported() -> bool {
    false
}

/// Marker for "not resolved yet"; never a valid [`Backend`] discriminant.
const UNRESOLVED: u8 = u8::MAX;

/// Global state for the active backend.
static ACTIVE_BACKEND: AtomicU8 = AtomicU8::new(UNRESOLVED);

/// Sets the active backend used by every lane kernel.
///
/// # Errors
///
/// Returns [`TensorError::BackendUnavailable`] if the CPU cannot run the
/// requested backend; the active backend is left untouched.
///
/// # Example
///
/// ```
/// use simd_tensor::backend::{set_backend, Backend};
/// set_backend(Backend::Portable).unwrap();
/// ```
pub fn set_backend(backend: Backend) -> Result<()> {
    if !backend.is_available() {
        return Err(TensorError::BackendUnavailable(backend));
    }
    ACTIVE_BACKEND.store(backend as u8, Ordering::Release);
    debug!("lane backend set to {backend:?}");
    Ok(())
}

/// Returns the currently active backend.
///
/// The first call resolves [`Backend::detect`] unless [`set_backend`] ran
/// before it.
///
/// # Example
///
/// ```
/// use simd_tensor::backend::get_backend;
/// let backend = get_backend();
/// assert!(backend.is_available());
/// ```
pub fn get_backend() -> Backend {
    if let Ok(backend) = Backend::try_from(ACTIVE_BACKEND.load(Ordering::Acquire)) {
        return backend;
    }

    let detected = Backend::detect();
    match ACTIVE_BACKEND.compare_exchange(
        UNRESOLVED,
        detected as u8,
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => {
            debug!("lane backend resolved to {detected:?}");
            detected
        }
        // someone else resolved or set it first
        Err(current) => Backend::try_from(current).unwrap_or(detected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_round_trip() {
        for backend in [Backend::Portable, Backend::Avx] {
            assert_eq!(Backend::try_from(backend as u8), Ok(backend));
        }
        assert_eq!(Backend::try_from(UNRESOLVED), Err(()));
        assert_eq!(Backend::try_from(2), Err(()));
    }

    #[test]
    fn portable_is_always_available() {
        assert!(Backend::Portable.is_available());
        assert_eq!(Backend::default(), Backend::Portable);
    }

    #[test]
    fn detect_returns_an_available_backend() {
        assert!(Backend::detect().is_available());
        assert!(get_backend().is_available());
    }

    #[test]
    fn unavailable_backend_is_rejected() {
        if !Backend::Avx.is_available() {
            assert_eq!(
                set_backend(Backend::Avx),
                Err(TensorError::BackendUnavailable(Backend::Avx))
            );
        }
    }
}
