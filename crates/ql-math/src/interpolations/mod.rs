//! 1D interpolation over sorted abscissae.
//!
//! Both schemes extrapolate by extending the first or last segment, which
//! for [`LogLinearInterpolation`] on discount factors means holding the
//! boundary segment's forward rate flat.

use ql_core::{errors::Result, Real};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
pub trait Interpolation1D: std::fmt::Debug {
    /// Evaluate the interpolation at `x`.
    fn value(&self, x: Real) -> Real;

    /// First derivative at `x`.
    fn derivative(&self, x: Real) -> Real;

    /// Lower bound of the node range.
    fn x_min(&self) -> Real;

    /// Upper bound of the node range.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the node range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from strictly increasing `xs` and
    /// corresponding `ys`.
    ///
    /// # Errors
    /// Returns an error if the slices have different lengths, hold fewer than
    /// 2 points, or `xs` is not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ql_core::ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        ql_core::ensure!(
            xs.len() == ys.len(),
            "xs and ys must have the same length ({} vs {})",
            xs.len(),
            ys.len()
        );
        ql_core::ensure!(
            xs.windows(2).all(|w| w[0] < w[1]),
            "interpolation abscissae must be strictly increasing"
        );
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Known abscissae.
    pub fn xs(&self) -> &[Real] {
        &self.xs
    }

    /// Known ordinates.
    pub fn ys(&self) -> &[Real] {
        &self.ys
    }

    /// Index `i` of the segment `[x[i], x[i+1]]` used for `x`; the first or
    /// last segment outside the node range.
    fn locate(&self, x: Real) -> usize {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return 0;
        }
        if x >= self.xs[n - 1] {
            return n - 2;
        }
        // First node strictly greater than x, minus one.
        self.xs.partition_point(|&xi| xi <= x) - 1
    }

    fn slope(&self, i: usize) -> Real {
        (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i])
    }
}

impl Interpolation1D for LinearInterpolation {
    fn value(&self, x: Real) -> Real {
        let i = self.locate(x);
        self.ys[i] + (x - self.xs[i]) * self.slope(i)
    }

    fn derivative(&self, x: Real) -> Real {
        self.slope(self.locate(x))
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

// ── Log-linear ────────────────────────────────────────────────────────────────

/// Log-linear interpolation.
///
/// Interpolates `ln(y)` linearly and exponentiates the result.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLinearInterpolation {
    inner: LinearInterpolation,
}

impl LogLinearInterpolation {
    /// Construct a log-linear interpolation.
    ///
    /// # Errors
    /// As [`LinearInterpolation::new`], and if any `y` is not strictly
    /// positive.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ql_core::ensure!(
            ys.iter().all(|&y| y > 0.0 && y.is_finite()),
            "all y values must be positive and finite for log-linear interpolation"
        );
        let log_ys: Vec<Real> = ys.iter().map(|&y| y.ln()).collect();
        Ok(Self {
            inner: LinearInterpolation::new(xs, &log_ys)?,
        })
    }

    /// Known abscissae.
    pub fn xs(&self) -> &[Real] {
        self.inner.xs()
    }

    /// `d ln f / dx` at `x`: the slope of the segment holding `x`.
    pub fn log_derivative(&self, x: Real) -> Real {
        self.inner.derivative(x)
    }
}

impl Interpolation1D for LogLinearInterpolation {
    fn value(&self, x: Real) -> Real {
        self.inner.value(x).exp()
    }

    fn derivative(&self, x: Real) -> Real {
        self.value(x) * self.inner.derivative(x)
    }

    fn x_min(&self) -> Real {
        self.inner.x_min()
    }

    fn x_max(&self) -> Real {
        self.inner.x_max()
    }
}
