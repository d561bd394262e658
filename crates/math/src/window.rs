//! NaN-aware statistics over windows of a series.
//!
//! Missing observations are represented as `NaN` and are skipped by every
//! function in this module.

use ndarray::ArrayView1;

/// Iterate over the non-missing values of a window.
pub fn valid_values<'a>(window: &'a ArrayView1<'_, f64>) -> impl Iterator<Item = f64> + 'a {
    window.iter().copied().filter(|v| !v.is_nan())
}

/// Number of non-missing values.
#[must_use]
pub fn valid_count(window: &ArrayView1<'_, f64>) -> usize {
    valid_values(window).count()
}

/// Mean of the non-missing values, `None` when there are none.
#[must_use]
pub fn nan_mean(window: &ArrayView1<'_, f64>) -> Option<f64> {
    let (sum, count) = valid_values(window).fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}

/// Sample standard deviation (ddof = 1) of the non-missing values.
///
/// `None` when fewer than two values are present.
#[must_use]
pub fn nan_std(window: &ArrayView1<'_, f64>) -> Option<f64> {
    sample_std(&valid_values(window).collect::<Vec<_>>())
}

/// Sample standard deviation (ddof = 1) of a slice without missing values.
#[must_use]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Pearson correlation over pairwise-complete observations.
///
/// `None` when fewer than two complete pairs exist or either side has zero
/// variance.
#[must_use]
pub fn pearson_correlation(x: &ArrayView1<'_, f64>, y: &ArrayView1<'_, f64>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> =
        x.iter().zip(y.iter()).filter(|(a, b)| !a.is_nan() && !b.is_nan()).map(|(a, b)| (*a, *b)).collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom > 0.0 {
        let r = cov / denom;
        r.is_finite().then_some(r)
    } else {
        None
    }
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` must lie in `[0, 1]`. Missing values are skipped; `None` when no
/// values remain.
#[must_use]
pub fn linear_quantile(window: &ArrayView1<'_, f64>, q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = valid_values(window).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};
    use rstest::rstest;

    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn mean_skips_missing() {
        let data = array![1.0, NAN, 3.0];
        assert_relative_eq!(nan_mean(&data.view()).unwrap(), 2.0);
        assert_eq!(valid_count(&data.view()), 2);
        assert!(nan_mean(&array![NAN, NAN].view()).is_none());
    }

    #[test]
    fn std_uses_sample_denominator() {
        let data = array![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Sample variance 32 / 7
        assert_relative_eq!(nan_std(&data.view()).unwrap(), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(nan_std(&array![1.0, NAN].view()).is_none());
    }

    #[test]
    fn correlation_of_linear_series() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![2.0, 4.0, 6.0, 8.0];
        assert_relative_eq!(pearson_correlation(&x.view(), &y.view()).unwrap(), 1.0, epsilon = 1e-12);

        let neg = y.mapv(|v| -v);
        assert_relative_eq!(
            pearson_correlation(&x.view(), &neg.view()).unwrap(),
            -1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn correlation_pairwise_complete() {
        let x = array![1.0, NAN, 3.0, 4.0];
        let y = array![1.0, 5.0, 3.0, NAN];
        // Only (1,1) and (3,3) remain
        assert_relative_eq!(pearson_correlation(&x.view(), &y.view()).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn correlation_undefined_for_constant() {
        let x = array![1.0, 1.0, 1.0];
        let y = array![1.0, 2.0, 3.0];
        assert!(pearson_correlation(&x.view(), &y.view()).is_none());
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.5, 3.0)]
    #[case(0.8, 4.2)]
    #[case(1.0, 5.0)]
    fn quantile_interpolates(#[case] q: f64, #[case] expected: f64) {
        let data: Array1<f64> = array![5.0, 1.0, NAN, 3.0, 2.0, 4.0];
        assert_relative_eq!(linear_quantile(&data.view(), q).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn quantile_rejects_out_of_range() {
        assert!(linear_quantile(&array![1.0].view(), 1.5).is_none());
        assert!(linear_quantile(&array![NAN].view(), 0.5).is_none());
    }
}
