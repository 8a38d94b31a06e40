//! AVX lane kernels for `f32 × 8` and `f64 × 4`.
//!
//! The public entry points return `None` when the width does not fill one
//! 256-bit register or the active backend is not [`Backend::Avx`]; the caller
//! then falls back to the portable loops.
//!
//! Each `#[target_feature]` function loads, computes and stores on its own, so
//! no `__m256`/`__m256d` value ever crosses into code compiled without AVX.

#![allow(unsafe_op_in_unsafe_fn)]

use super::element::{LaneCmp, LaneOp, Reduction};
use crate::backend::{get_backend, Backend};
use core::arch::x86_64::*;

#[inline]
fn enabled() -> bool {
    get_backend() == Backend::Avx
}

#[inline]
fn narrow<T, const W: usize, const N: usize>(lanes: &[T; N]) -> Option<&[T; W]> {
    lanes.as_slice().try_into().ok()
}

#[inline]
fn widen<T: Copy, const W: usize, const N: usize>(lanes: [T; W]) -> Option<[T; N]> {
    lanes.as_slice().try_into().ok()
}

#[inline]
fn mask_bits<const N: usize>(bits: i32) -> [bool; N] {
    core::array::from_fn(|i| (bits >> i) & 1 == 1)
}

pub(crate) fn lanewise_f32<const N: usize>(
    op: LaneOp,
    a: &[f32; N],
    b: &[f32; N],
) -> Option<[f32; N]> {
    let (a, b) = (narrow::<f32, 8, N>(a)?, narrow::<f32, 8, N>(b)?);
    if !enabled() {
        return None;
    }
    // SAFETY: the Avx backend is only selectable when the CPU reports AVX.
    widen(unsafe { lanewise_ps(op, a, b) })
}

pub(crate) fn compare_f32<const N: usize>(
    cmp: LaneCmp,
    a: &[f32; N],
    b: &[f32; N],
) -> Option<[bool; N]> {
    let (a, b) = (narrow::<f32, 8, N>(a)?, narrow::<f32, 8, N>(b)?);
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    Some(mask_bits(unsafe { compare_ps(cmp, a, b) }))
}

pub(crate) fn blend_f32<const N: usize>(
    mask: &[bool; N],
    a: &[f32; N],
    b: &[f32; N],
) -> Option<[f32; N]> {
    let mask = narrow::<bool, 8, N>(mask)?;
    let (a, b) = (narrow::<f32, 8, N>(a)?, narrow::<f32, 8, N>(b)?);
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    widen(unsafe { blend_ps(mask, a, b) })
}

pub(crate) fn reduce_f32<const N: usize>(reduction: Reduction, lanes: &[f32; N]) -> Option<f32> {
    let lanes = narrow::<f32, 8, N>(lanes)?;
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    Some(unsafe { reduce_ps(reduction, lanes) })
}

pub(crate) fn lanewise_f64<const N: usize>(
    op: LaneOp,
    a: &[f64; N],
    b: &[f64; N],
) -> Option<[f64; N]> {
    let (a, b) = (narrow::<f64, 4, N>(a)?, narrow::<f64, 4, N>(b)?);
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    widen(unsafe { lanewise_pd(op, a, b) })
}

pub(crate) fn compare_f64<const N: usize>(
    cmp: LaneCmp,
    a: &[f64; N],
    b: &[f64; N],
) -> Option<[bool; N]> {
    let (a, b) = (narrow::<f64, 4, N>(a)?, narrow::<f64, 4, N>(b)?);
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    Some(mask_bits(unsafe { compare_pd(cmp, a, b) }))
}

pub(crate) fn blend_f64<const N: usize>(
    mask: &[bool; N],
    a: &[f64; N],
    b: &[f64; N],
) -> Option<[f64; N]> {
    let mask = narrow::<bool, 4, N>(mask)?;
    let (a, b) = (narrow::<f64, 4, N>(a)?, narrow::<f64, 4, N>(b)?);
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    widen(unsafe { blend_pd(mask, a, b) })
}

pub(crate) fn reduce_f64<const N: usize>(reduction: Reduction, lanes: &[f64; N]) -> Option<f64> {
    let lanes = narrow::<f64, 4, N>(lanes)?;
    if !enabled() {
        return None;
    }
    // SAFETY: see `lanewise_f32`.
    Some(unsafe { reduce_pd(reduction, lanes) })
}

// ── f32 × 8 ──────────────────────────────────────────────────────────

#[target_feature(enable = "avx")]
unsafe fn lanewise_ps(op: LaneOp, a: &[f32; 8], b: &[f32; 8]) -> [f32; 8] {
    let x = _mm256_loadu_ps(a.as_ptr());
    let y = _mm256_loadu_ps(b.as_ptr());
    let r = match op {
        LaneOp::Add => _mm256_add_ps(x, y),
        LaneOp::Sub => _mm256_sub_ps(x, y),
        LaneOp::Mul => _mm256_mul_ps(x, y),
        LaneOp::Div => _mm256_div_ps(x, y),
        LaneOp::Min => _mm256_min_ps(x, y),
        LaneOp::Max => _mm256_max_ps(x, y),
    };
    let mut out = [0.0f32; 8];
    _mm256_storeu_ps(out.as_mut_ptr(), r);
    out
}

#[target_feature(enable = "avx")]
unsafe fn compare_ps(cmp: LaneCmp, a: &[f32; 8], b: &[f32; 8]) -> i32 {
    let x = _mm256_loadu_ps(a.as_ptr());
    let y = _mm256_loadu_ps(b.as_ptr());
    let r = match cmp {
        LaneCmp::Lt => _mm256_cmp_ps::<{ _CMP_LT_OQ }>(x, y),
        LaneCmp::Le => _mm256_cmp_ps::<{ _CMP_LE_OQ }>(x, y),
        LaneCmp::Gt => _mm256_cmp_ps::<{ _CMP_GT_OQ }>(x, y),
        LaneCmp::Ge => _mm256_cmp_ps::<{ _CMP_GE_OQ }>(x, y),
        LaneCmp::Eq => _mm256_cmp_ps::<{ _CMP_EQ_OQ }>(x, y),
    };
    _mm256_movemask_ps(r)
}

#[target_feature(enable = "avx")]
unsafe fn blend_ps(mask: &[bool; 8], a: &[f32; 8], b: &[f32; 8]) -> [f32; 8] {
    let bits: [i32; 8] = (*mask).map(|m| if m { -1 } else { 0 });
    let m = _mm256_castsi256_ps(_mm256_loadu_si256(bits.as_ptr().cast::<__m256i>()));
    let x = _mm256_loadu_ps(a.as_ptr());
    let y = _mm256_loadu_ps(b.as_ptr());
    let mut out = [0.0f32; 8];
    // blendv takes the second operand where the mask lane is set
    _mm256_storeu_ps(out.as_mut_ptr(), _mm256_blendv_ps(y, x, m));
    out
}

#[target_feature(enable = "avx")]
unsafe fn reduce_ps(reduction: Reduction, lanes: &[f32; 8]) -> f32 {
    let v = _mm256_loadu_ps(lanes.as_ptr());
    match reduction {
        Reduction::Sum => {
            let lo = _mm256_castps256_ps128(v);
            let hi = _mm256_extractf128_ps::<1>(v);
            let sum4 = _mm_add_ps(lo, hi);
            let sum2 = _mm_add_ps(sum4, _mm_movehl_ps(sum4, sum4));
            _mm_cvtss_f32(_mm_add_ss(sum2, _mm_shuffle_ps::<0x01>(sum2, sum2)))
        }
        Reduction::Min => {
            let t = _mm256_min_ps(v, _mm256_permute2f128_ps::<0x01>(v, v));
            let t = _mm256_min_ps(t, _mm256_shuffle_ps::<0x4E>(t, t));
            let t = _mm256_min_ps(t, _mm256_shuffle_ps::<0xB1>(t, t));
            _mm_cvtss_f32(_mm256_castps256_ps128(t))
        }
        Reduction::Max => {
            let t = _mm256_max_ps(v, _mm256_permute2f128_ps::<0x01>(v, v));
            let t = _mm256_max_ps(t, _mm256_shuffle_ps::<0x4E>(t, t));
            let t = _mm256_max_ps(t, _mm256_shuffle_ps::<0xB1>(t, t));
            _mm_cvtss_f32(_mm256_castps256_ps128(t))
        }
    }
}

// ── f64 × 4 ──────────────────────────────────────────────────────────

#[target_feature(enable = "avx")]
unsafe fn lanewise_pd(op: LaneOp, a: &[f64; 4], b: &[f64; 4]) -> [f64; 4] {
    let x = _mm256_loadu_pd(a.as_ptr());
    let y = _mm256_loadu_pd(b.as_ptr());
    let r = match op {
        LaneOp::Add => _mm256_add_pd(x, y),
        LaneOp::Sub => _mm256_sub_pd(x, y),
        LaneOp::Mul => _mm256_mul_pd(x, y),
        LaneOp::Div => _mm256_div_pd(x, y),
        LaneOp::Min => _mm256_min_pd(x, y),
        LaneOp::Max => _mm256_max_pd(x, y),
    };
    let mut out = [0.0f64; 4];
    _mm256_storeu_pd(out.as_mut_ptr(), r);
    out
}

#[target_feature(enable = "avx")]
unsafe fn compare_pd(cmp: LaneCmp, a: &[f64; 4], b: &[f64; 4]) -> i32 {
    let x = _mm256_loadu_pd(a.as_ptr());
    let y = _mm256_loadu_pd(b.as_ptr());
    let r = match cmp {
        LaneCmp::Lt => _mm256_cmp_pd::<{ _CMP_LT_OQ }>(x, y),
        LaneCmp::Le => _mm256_cmp_pd::<{ _CMP_LE_OQ }>(x, y),
        LaneCmp::Gt => _mm256_cmp_pd::<{ _CMP_GT_OQ }>(x, y),
        LaneCmp::Ge => _mm256_cmp_pd::<{ _CMP_GE_OQ }>(x, y),
        LaneCmp::Eq => _mm256_cmp_pd::<{ _CMP_EQ_OQ }>(x, y),
    };
    _mm256_movemask_pd(r)
}

#[target_feature(enable = "avx")]
unsafe fn blend_pd(mask: &[bool; 4], a: &[f64; 4], b: &[f64; 4]) -> [f64; 4] {
    let bits: [i64; 4] = (*mask).map(|m| if m { -1 } else { 0 });
    let m = _mm256_castsi256_pd(_mm256_loadu_si256(bits.as_ptr().cast::<__m256i>()));
    let x = _mm256_loadu_pd(a.as_ptr());
    let y = _mm256_loadu_pd(b.as_ptr());
    let mut out = [0.0f64; 4];
    _mm256_storeu_pd(out.as_mut_ptr(), _mm256_blendv_pd(y, x, m));
    out
}

#[target_feature(enable = "avx")]
unsafe fn reduce_pd(reduction: Reduction, lanes: &[f64; 4]) -> f64 {
    let v = _mm256_loadu_pd(lanes.as_ptr());
    let lo = _mm256_castpd256_pd128(v);
    let hi = _mm256_extractf128_pd::<1>(v);
    match reduction {
        Reduction::Sum => {
            let s = _mm_add_pd(lo, hi);
            _mm_cvtsd_f64(_mm_add_sd(s, _mm_unpackhi_pd(s, s)))
        }
        Reduction::Min => {
            let s = _mm_min_pd(lo, hi);
            _mm_cvtsd_f64(_mm_min_sd(s, _mm_unpackhi_pd(s, s)))
        }
        Reduction::Max => {
            let s = _mm_max_pd(lo, hi);
            _mm_cvtsd_f64(_mm_max_sd(s, _mm_unpackhi_pd(s, s)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::portable;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_lanes<const N: usize>(rng: &mut StdRng) -> [f32; N] {
        core::array::from_fn(|_| rng.random_range(-1000.0f32..1000.0))
    }

    // these call the register kernels directly so they do not depend on the
    // global backend selector
    #[test]
    fn f32_kernels_match_portable() {
        if !Backend::Avx.is_available() {
            return;
        }
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..64 {
            let a: [f32; 8] = random_lanes(&mut rng);
            let b: [f32; 8] = random_lanes(&mut rng);
            for op in [
                LaneOp::Add,
                LaneOp::Sub,
                LaneOp::Mul,
                LaneOp::Div,
                LaneOp::Min,
                LaneOp::Max,
            ] {
                let fast = unsafe { lanewise_ps(op, &a, &b) };
                assert_eq!(fast, portable::lanewise(op, &a, &b), "{op:?}");
            }
            for cmp in [LaneCmp::Lt, LaneCmp::Le, LaneCmp::Gt, LaneCmp::Ge, LaneCmp::Eq] {
                let fast: [bool; 8] = mask_bits(unsafe { compare_ps(cmp, &a, &b) });
                assert_eq!(fast, portable::compare(cmp, &a, &b), "{cmp:?}");
            }
            let mask = portable::compare(LaneCmp::Lt, &a, &b);
            assert_eq!(
                unsafe { blend_ps(&mask, &a, &b) },
                portable::blend(&mask, &a, &b)
            );
            for reduction in [Reduction::Sum, Reduction::Min, Reduction::Max] {
                let fast = unsafe { reduce_ps(reduction, &a) };
                assert_eq!(fast, portable::reduce(reduction, &a), "{reduction:?}");
            }
        }
    }

    #[test]
    fn f64_kernels_match_portable() {
        if !Backend::Avx.is_available() {
            return;
        }
        let mut rng = StdRng::seed_from_u64(0xfeed);
        for _ in 0..64 {
            let a: [f64; 4] = random_lanes::<4>(&mut rng).map(f64::from);
            let b: [f64; 4] = random_lanes::<4>(&mut rng).map(f64::from);
            for op in [LaneOp::Add, LaneOp::Sub, LaneOp::Mul, LaneOp::Div] {
                let fast = unsafe { lanewise_pd(op, &a, &b) };
                assert_eq!(fast, portable::lanewise(op, &a, &b), "{op:?}");
            }
            let fast: [bool; 4] = mask_bits(unsafe { compare_pd(LaneCmp::Ge, &a, &b) });
            assert_eq!(fast, portable::compare(LaneCmp::Ge, &a, &b));
            let mask = portable::compare(LaneCmp::Gt, &a, &b);
            assert_eq!(
                unsafe { blend_pd(&mask, &a, &b) },
                portable::blend(&mask, &a, &b)
            );
            for reduction in [Reduction::Sum, Reduction::Min, Reduction::Max] {
                let fast = unsafe { reduce_pd(reduction, &a) };
                assert_eq!(fast, portable::reduce(reduction, &a), "{reduction:?}");
            }
        }
    }

    #[test]
    fn other_widths_are_declined() {
        let a = [1.0f32; 4];
        assert_eq!(lanewise_f32(LaneOp::Add, &a, &a), None);
        assert_eq!(reduce_f32(Reduction::Sum, &a), None);
        let b = [1.0f64; 8];
        assert_eq!(reduce_f64(Reduction::Sum, &b), None);
    }
}
