//! AUC via cubic-spline interpolation and adaptive Simpson quadrature.
//!
//! The ROC curve is a set of knots, not a function; the area is defined as
//! the integral over FPR in [0, 1] of a natural cubic spline through those
//! knots, evaluated with constant extension outside the knot span. The
//! quadrature subdivides until the interval-halving error estimate meets an
//! absolute tolerance.
//!
//! Simpson's rule is exact on cubics, so spline segments converge at the
//! first estimate; subdivision only does real work across the clamp
//! boundaries and interpolation kinks.

use crate::curve::RocCurve;
use std::fmt;
use tracing::debug;

/// Recursion cap for the adaptive quadrature.
const MAX_DEPTH: u32 = 32;

/// Failure to derive an area from a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationError {
    /// Fewer than two usable points; there is nothing to interpolate
    /// between.
    InsufficientData { points: usize },
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData { points } => write!(
                f,
                "curve has {} point(s), at least 2 are required to integrate",
                points
            ),
        }
    }
}

impl std::error::Error for IntegrationError {}

// =============================================================================
// NATURAL CUBIC SPLINE
// =============================================================================

/// Natural cubic spline through strictly ascending knots.
///
/// With exactly two knots the natural boundary conditions collapse the
/// spline to the straight chord between them. Evaluation outside the knot
/// span returns the boundary ordinate, so the interpolant is total on all
/// of `f64` and integrating a domain wider than the data is well defined.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // Per-segment polynomial coefficients in (x - xs[segment]).
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural spline to knots with strictly ascending x.
    pub fn fit(xs: Vec<f64>, ys: Vec<f64>) -> Result<CubicSpline, IntegrationError> {
        debug_assert_eq!(xs.len(), ys.len(), "knot vectors must match");
        debug_assert!(
            xs.windows(2).all(|w| w[0] < w[1]),
            "knot x values must be strictly ascending"
        );
        let n = xs.len();
        if n < 2 {
            return Err(IntegrationError::InsufficientData { points: n });
        }

        let segments = n - 1;
        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

        // Natural boundary: zero second derivative at both ends. Solve the
        // tridiagonal system for the quadratic coefficients.
        let mut alpha = vec![0.0; n];
        for i in 1..segments {
            alpha[i] =
                3.0 * (ys[i + 1] - ys[i]) / h[i] - 3.0 * (ys[i] - ys[i - 1]) / h[i - 1];
        }

        let mut l = vec![1.0; n];
        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];
        for i in 1..segments {
            l[i] = 2.0 * (xs[i + 1] - xs[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l[i];
            z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
        }

        let mut b = vec![0.0; segments];
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; segments];
        for j in (0..segments).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            b[j] = (ys[j + 1] - ys[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
        }
        c.truncate(segments);

        Ok(CubicSpline { xs, ys, b, c, d })
    }

    /// Evaluate at `x`, clamping into the knot span.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let segment = self.xs.partition_point(|&knot| knot <= x).saturating_sub(1);
        let dx = x - self.xs[segment];
        self.ys[segment] + dx * (self.b[segment] + dx * (self.c[segment] + dx * self.d[segment]))
    }
}

// =============================================================================
// ADAPTIVE SIMPSON QUADRATURE
// =============================================================================

#[inline]
fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

/// Integrate `f` over `[a, b]` to an absolute tolerance.
///
/// Interval-halving with the standard `|S_halves - S_whole| <= 15 tol`
/// acceptance test and Richardson correction; the tolerance is halved
/// across each subdivision. `tolerance` must be positive.
fn integrate<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, tolerance: f64) -> f64 {
    let m = 0.5 * (a + b);
    let fa = f(a);
    let fm = f(m);
    let fb = f(b);
    let whole = simpson(a, b, fa, fm, fb);
    subdivide(f, a, b, fa, fm, fb, whole, tolerance, MAX_DEPTH)
}

fn subdivide<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let left_mid = 0.5 * (a + m);
    let right_mid = 0.5 * (m + b);
    let f_left_mid = f(left_mid);
    let f_right_mid = f(right_mid);
    let left = simpson(a, m, fa, f_left_mid, fm);
    let right = simpson(m, b, fm, f_right_mid, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }
    let half = 0.5 * tolerance;
    subdivide(f, a, m, fa, f_left_mid, fm, left, half, depth - 1)
        + subdivide(f, m, b, fm, f_right_mid, fb, right, half, depth - 1)
}

// =============================================================================
// AREA DRIVER
// =============================================================================

/// Area under the ROC curve over FPR in [0, 1].
///
/// Fits a natural cubic spline to the curve's points and integrates it to
/// the given absolute tolerance. Fails when the curve has fewer than two
/// points. The result is deliberately not clamped: an area outside [0, 1]
/// is a legitimate diagnostic of a degenerate curve.
pub fn area(curve: &RocCurve, tolerance: f64) -> Result<f64, IntegrationError> {
    let (xs, ys) = curve.coordinates();
    let spline = CubicSpline::fit(xs, ys)?;
    debug!(points = curve.len(), tolerance, "integrating roc curve");
    Ok(integrate(&|x| spline.eval(x), 0.0, 1.0, tolerance))
}
