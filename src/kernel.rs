//! Threshold-pruned similarity kernels.
//!
//! Both kernels walk the two vectors in blocks of [`BLOCK`] dimensions and
//! stop as soon as the running value proves the candidate cannot beat the
//! caller's threshold.
//!
//! ## Important nuance
//!
//! On early exit, [`pruned_inner_product`] returns the *partial* inner product,
//! not the exact one. The exact value is then guaranteed to be `<= threshold`,
//! which is all a top-k accumulator needs to reject the candidate. Do not feed
//! a pruned score anywhere it could be mistaken for an exact score; use
//! [`inner_product`] for that.
//!
//! Accumulation order is strictly dimension order, so with `threshold =
//! f32::INFINITY` the pruned kernel is bit-for-bit equal to [`inner_product`].

/// Number of suffix-norm resolution levels kept per vector.
///
/// Level 0 is the full norm; level `t >= 1` covers dimensions `8t..d`.
pub const NORM_K: usize = 4;

/// Dimensions processed between two bound checks.
pub const BLOCK: usize = 8;

/// Suffix-norm bounds of one vector, see [`crate::store::suffix_norms`].
pub type NormBounds = [f32; NORM_K];

#[inline]
fn dot_range(acc: f32, a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).fold(acc, |acc, (x, y)| acc + x * y)
}

/// Exact inner product, accumulated in dimension order.
#[inline]
#[must_use]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    dot_range(0.0, a, b)
}

/// Inner product with Cauchy–Schwarz early exit.
///
/// After each block ending at dimension `8t` (for `t` in `1..NORM_K`), the
/// unscanned tail contributes at most `norm1[t] * norm2[t]`. If the partial
/// product plus that bound is `<= threshold`, the partial product is returned
/// immediately. Otherwise the remaining dimensions are accumulated and the
/// exact inner product is returned.
///
/// Block ends are clamped to the vector length, so any `d` works; levels past
/// the end carry a suffix norm of 0.
#[inline]
#[must_use]
pub fn pruned_inner_product(
    threshold: f32,
    p1: &[f32],
    norm1: &NormBounds,
    p2: &[f32],
    norm2: &NormBounds,
) -> f32 {
    debug_assert_eq!(p1.len(), p2.len());
    let dim = p1.len().min(p2.len());

    let mut ip = 0.0_f32;
    let mut base = 0;
    for t in 1..NORM_K {
        let end = (base + BLOCK).min(dim);
        ip = dot_range(ip, &p1[base..end], &p2[base..end]);
        base = end;
        if ip + norm1[t] * norm2[t] <= threshold {
            return ip;
        }
    }
    dot_range(ip, &p1[base..dim], &p2[base..dim])
}

#[inline]
fn sqr_diff_sum(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).fold(0.0, |acc, (x, y)| {
        let d = x - y;
        acc + d * d
    })
}

/// Exact squared Euclidean distance, in the same chunk order as
/// [`pruned_l2_squared`].
#[inline]
#[must_use]
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    pruned_l2_squared(f32::INFINITY, a, b)
}

/// Squared Euclidean distance with early exit once the partial sum exceeds
/// `threshold`.
///
/// The `d mod 8` tail is summed first, then each full block of 8. Every chunk
/// is summed on its own and added to the running total; the threshold is
/// checked after each addition. Squared differences are non-negative, so a
/// returned value `> threshold` means the exact distance is too.
#[inline]
#[must_use]
pub fn pruned_l2_squared(threshold: f32, p1: &[f32], p2: &[f32]) -> f32 {
    debug_assert_eq!(p1.len(), p2.len());
    let dim = p1.len().min(p2.len());
    let full = dim & !(BLOCK - 1);

    let mut r = sqr_diff_sum(&p1[full..dim], &p2[full..dim]);
    if r > threshold {
        return r;
    }
    for (a, b) in p1[..full].chunks_exact(BLOCK).zip(p2[..full].chunks_exact(BLOCK)) {
        r += sqr_diff_sum(a, b);
        if r > threshold {
            return r;
        }
    }
    r
}
