//! Data transformation trait definitions.

use copbrief_primitives::ReturnMatrix;
use ndarray::{Array1, ArrayView1};

/// Errors raised when configuring a transform.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Window or threshold out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Time-series data transformation.
///
/// Operates on one date-sorted series at a time; missing values are `NaN`.
pub trait TimeSeriesTransform: Send + Sync {
    /// Transform a single series. The output has the same length as the input.
    fn apply(&self, series: ArrayView1<'_, f64>) -> Array1<f64>;

    /// Returns the name of this transformation.
    fn name(&self) -> &str;

    /// Transform every column of a return matrix independently.
    fn apply_matrix(&self, matrix: &ReturnMatrix) -> ReturnMatrix {
        matrix.map_columns(|column| self.apply(column))
    }
}

#[cfg(test)]
mod tests {
    use copbrief_primitives::{Date, Ticker};
    use ndarray::array;

    use super::*;

    struct Negate;

    impl TimeSeriesTransform for Negate {
        fn apply(&self, series: ArrayView1<'_, f64>) -> Array1<f64> {
            series.mapv(|v| -v)
        }

        fn name(&self) -> &str {
            "negate"
        }
    }

    #[test]
    fn apply_matrix_maps_each_column() {
        let dates = vec![Date::from_ymd_opt(2024, 5, 2).unwrap()];
        let matrix =
            ReturnMatrix::new(dates, vec![Ticker::new("A"), Ticker::new("B")], array![[1.0, -2.0]]);
        let out = Negate.apply_matrix(&matrix);
        assert_eq!(out.values(), &array![[-1.0, 2.0]]);
        assert_eq!(Negate.name(), "negate");
    }

    #[test]
    fn transform_error_display() {
        let err = TransformError::InvalidParameter("bad value".to_string());
        assert_eq!(err.to_string(), "invalid parameter: bad value");
    }
}
