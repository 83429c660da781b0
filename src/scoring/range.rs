//! Numeric closeness comparators.
//!
//! Both comparators take the two values being compared plus a range spec
//! `(min, reference, max)` and return a score in `[0, 1]`.
//!
//! The linear form measures `|r - l|` against the upper half-width
//! `max - reference` whichever side of `l` the value `r` falls on; `min` is
//! accepted but does not take part in the computation.

/// Linear closeness: `1` for an exact match, falling linearly to `0` at a
/// distance of `max - reference`, and `0` beyond it.
#[must_use]
pub fn linear_range(l: f64, r: f64, _min: f64, reference: f64, max: f64) -> f64 {
    let dist = (r - l).abs();
    if dist == 0.0 {
        return 1.0;
    }
    let max_dist = max - reference;
    if dist > max_dist {
        0.0
    } else {
        1.0 - dist / max_dist
    }
}

/// Gaussian reshaping of [`linear_range`], rounded to three decimals.
///
/// Yields `1` for an exact match and about `0.050` when the linear score is
/// `0`, rewarding near-perfect matches more steeply than the linear form.
#[must_use]
pub fn gaussian_range(l: f64, r: f64, min: f64, reference: f64, max: f64) -> f64 {
    let linear = linear_range(l, r, min, reference, max);
    let gaussian = (-(linear - 1.0).powi(2)).exp().powi(3);
    (gaussian * 1000.0).round() / 1000.0
}
