//! Min-max rescaling of a day's factor scores.

use ndarray::Array1;

/// Rescale `values` onto `[0, 1]`.
///
/// Non-finite entries are ignored when finding the range and come back as
/// NaN. When every finite value is equal they all map to `0.5`.
#[must_use]
pub fn min_max_normalize(values: &Array1<f64>) -> Array1<f64> {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let range = hi - lo;
    values.mapv(|v| {
        if !v.is_finite() {
            f64::NAN
        } else if range > 0.0 {
            (v - lo) / range
        } else {
            0.5
        }
    })
}
