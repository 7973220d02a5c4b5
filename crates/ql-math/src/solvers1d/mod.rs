//! 1D root-finding solvers.
//!
//! All solvers take fallible objectives (`FnMut(Real) -> Result<Real>`) so a
//! pricing error raised while evaluating a trial point propagates unchanged
//! instead of being folded into a NaN.  Failures to converge come back as
//! [`Error::NotBracketed`] or [`Error::MaxIterations`]; callers that know what
//! was being solved wrap them into their own error variants.

use ql_core::{
    errors::{Error, Result},
    Real,
};

/// Default iteration budget.
pub const MAX_ITERATIONS: u32 = 100;

/// Default absolute accuracy on the root.
pub const DEFAULT_ACCURACY: Real = 1.0e-11;

const GROWTH_FACTOR: Real = 1.6;

/// A converged root and the iterations spent finding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    /// Abscissa of the root.
    pub x: Real,
    /// Number of objective evaluations after the initial bracket.
    pub iterations: u32,
}

fn effective_accuracy(accuracy: Real) -> Real {
    if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    }
}

// ── Bracketing ────────────────────────────────────────────────────────────────

/// Grow an interval around `guess` until `f` changes sign, never leaving
/// `[x_min, x_max]`.
///
/// Returns the bracket `(lower, upper)` with `f(lower)·f(upper) <= 0`.
///
/// # Errors
/// [`Error::NotBracketed`] when `max_evaluations` growth steps (or the
/// enforced bounds) are exhausted without a sign change.
pub fn expand_bracket<F>(
    mut f: F,
    guess: Real,
    step: Real,
    x_min: Real,
    x_max: Real,
    max_evaluations: u32,
) -> Result<(Real, Real)>
where
    F: FnMut(Real) -> Result<Real>,
{
    ql_core::ensure!(x_min < x_max, "empty solver domain [{x_min}, {x_max}]");
    ql_core::ensure!(step > 0.0, "bracket step must be positive, got {step}");
    let enforce = |x: Real| x.clamp(x_min, x_max);

    let guess = enforce(guess);
    let mut lo = enforce(guess - step);
    let mut hi = enforce(guess + step);
    let mut f_lo = f(lo)?;
    let mut f_hi = f(hi)?;

    for _ in 0..max_evaluations {
        if f_lo * f_hi <= 0.0 {
            return Ok((lo, hi));
        }
        let lo_stuck = lo <= x_min;
        let hi_stuck = hi >= x_max;
        if lo_stuck && hi_stuck {
            break;
        }
        if (f_lo.abs() < f_hi.abs() && !lo_stuck) || hi_stuck {
            lo = enforce(lo + GROWTH_FACTOR * (lo - hi));
            f_lo = f(lo)?;
        } else {
            hi = enforce(hi + GROWTH_FACTOR * (hi - lo));
            f_hi = f(hi)?;
        }
    }
    if f_lo * f_hi <= 0.0 {
        return Ok((lo, hi));
    }
    Err(Error::NotBracketed {
        lower: lo,
        upper: hi,
        f_lower: f_lo,
        f_upper: f_hi,
    })
}

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method for a root of `f` in `[x_min, x_max]`.
///
/// Combines bisection, secant, and inverse quadratic interpolation; the root
/// is kept bracketed throughout, so convergence is guaranteed once the
/// endpoints straddle it.
///
/// # Errors
/// * [`Error::NotBracketed`] if `f(x_min)` and `f(x_max)` share a sign.
/// * [`Error::MaxIterations`] if `max_iterations` steps do not reach
///   `accuracy`.
pub fn brent<F>(
    mut f: F,
    x_min: Real,
    x_max: Real,
    accuracy: Real,
    max_iterations: u32,
) -> Result<Root>
where
    F: FnMut(Real) -> Result<Real>,
{
    let acc = effective_accuracy(accuracy);
    let mut a = x_min;
    let mut b = x_max;
    let mut fa = f(a)?;
    let mut fb = f(b)?;

    if !(fa * fb <= 0.0) {
        return Err(Error::NotBracketed {
            lower: x_min,
            upper: x_max,
            f_lower: fa,
            f_upper: fb,
        });
    }
    if fa == 0.0 {
        return Ok(Root { x: a, iterations: 0 });
    }
    if fb == 0.0 {
        return Ok(Root { x: b, iterations: 0 });
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=max_iterations {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * acc;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(Root { x: b, iterations: iteration });
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                let p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                (p, (q - 1.0) * (r - 1.0) * (s - 1.0))
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol {
            d
        } else if xm > 0.0 {
            tol
        } else {
            -tol
        };
        fb = f(b)?;
    }
    Err(Error::MaxIterations {
        iterations: max_iterations,
        lower: b.min(c),
        upper: b.max(c),
    })
}

// ── Newton-Raphson ────────────────────────────────────────────────────────────

/// Newton-Raphson from `guess`, confined to `[x_min, x_max]`.
///
/// `f_df` returns the objective and its derivative.  The iteration gives up
/// as soon as a step would leave the domain, the derivative vanishes, or the
/// budget runs out; [`newton_with_brent_fallback`] turns those failures into
/// a bracketed search.
///
/// # Errors
/// [`Error::NotBracketed`] when a step leaves the domain or the derivative
/// vanishes; [`Error::MaxIterations`] when the budget is exhausted.
pub fn newton<F>(
    mut f_df: F,
    guess: Real,
    x_min: Real,
    x_max: Real,
    accuracy: Real,
    max_iterations: u32,
) -> Result<Root>
where
    F: FnMut(Real) -> Result<(Real, Real)>,
{
    let acc = effective_accuracy(accuracy);
    let mut x = guess.clamp(x_min, x_max);

    for iteration in 1..=max_iterations {
        let (fx, dfx) = f_df(x)?;
        if dfx == 0.0 || !dfx.is_finite() || !fx.is_finite() {
            return Err(Error::NotBracketed {
                lower: x_min,
                upper: x_max,
                f_lower: fx,
                f_upper: fx,
            });
        }
        let dx = fx / dfx;
        x -= dx;
        if x < x_min || x > x_max {
            return Err(Error::NotBracketed {
                lower: x_min,
                upper: x_max,
                f_lower: fx,
                f_upper: fx,
            });
        }
        if dx.abs() < acc {
            return Ok(Root { x, iterations: iteration });
        }
    }
    Err(Error::MaxIterations {
        iterations: max_iterations,
        lower: x_min,
        upper: x_max,
    })
}

/// Newton-Raphson with a Brent safety net.
///
/// Runs [`newton`] from `guess`; if it fails for any solver reason the root
/// is searched for again with [`brent`] over the whole of `[x_min, x_max]`.
/// Errors raised by the objective itself are not retried.
pub fn newton_with_brent_fallback<F>(
    mut f_df: F,
    guess: Real,
    x_min: Real,
    x_max: Real,
    accuracy: Real,
    max_iterations: u32,
) -> Result<Root>
where
    F: FnMut(Real) -> Result<(Real, Real)>,
{
    match newton(&mut f_df, guess, x_min, x_max, accuracy, max_iterations) {
        Ok(root) => Ok(root),
        Err(e @ (Error::NotBracketed { .. } | Error::MaxIterations { .. })) => {
            tracing::debug!(error = %e, guess, "newton failed, falling back to brent");
            brent(
                |x| f_df(x).map(|(fx, _)| fx),
                x_min,
                x_max,
                accuracy,
                max_iterations,
            )
        }
        Err(e) => Err(e),
    }
}
