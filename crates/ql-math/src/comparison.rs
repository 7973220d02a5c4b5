//! Floating-point comparisons.

use ql_core::Real;

/// Return `true` if `a` and `b` agree to within `n` ulps of the larger
/// magnitude.
#[inline]
pub fn close_enough(a: Real, b: Real, n: u32) -> bool {
    if a == b {
        return true;
    }
    let eps = a.abs().max(b.abs()) * f64::EPSILON * n as f64;
    (a - b).abs() <= eps
}
