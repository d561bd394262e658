//! Per-horizon factor frames.

use copbrief_primitives::{Date, FactorName, Horizon, ReturnMatrix, Ticker};
use copbrief_traits::{Factor, FactorError};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::debug;

use crate::FactorsError;

/// Target series and explanatory factors of one horizon, aligned by date.
///
/// Factor values are stored row-major as `dates x factors`, in the order the
/// factors were registered. Missing values are `NaN`.
#[derive(Debug, Clone)]
pub struct FactorFrame {
    horizon: Horizon,
    dates: Vec<Date>,
    target: Array1<f64>,
    names: Vec<FactorName>,
    values: Array2<f64>,
    risk_proxy: Option<Array1<f64>>,
}

impl FactorFrame {
    /// Assemble a frame from its parts.
    ///
    /// # Errors
    /// Returns [`FactorsError::Shape`] when the parts disagree on row or
    /// factor counts.
    pub fn new(
        horizon: Horizon,
        dates: Vec<Date>,
        target: Array1<f64>,
        names: Vec<FactorName>,
        values: Array2<f64>,
        risk_proxy: Option<Array1<f64>>,
    ) -> Result<Self, FactorsError> {
        let n = dates.len();
        if target.len() != n || values.nrows() != n {
            return Err(FactorsError::Shape(format!(
                "{n} dates, {} target rows, {} factor rows",
                target.len(),
                values.nrows()
            )));
        }
        if values.ncols() != names.len() {
            return Err(FactorsError::Shape(format!(
                "{} factor names for {} factor columns",
                names.len(),
                values.ncols()
            )));
        }
        if risk_proxy.as_ref().is_some_and(|r| r.len() != n) {
            return Err(FactorsError::Shape("risk proxy length differs from dates".to_string()));
        }
        Ok(Self { horizon, dates, target, names, values, risk_proxy })
    }

    /// Horizon of the frame.
    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Row dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Number of factors.
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.names.len()
    }

    /// Check if the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Standardized target series.
    #[must_use]
    pub const fn target(&self) -> &Array1<f64> {
        &self.target
    }

    /// Factor names in column order.
    #[must_use]
    pub fn factor_names(&self) -> &[FactorName] {
        &self.names
    }

    /// Factor values (dates x factors).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Factor values on row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// A single factor series.
    #[must_use]
    pub fn factor(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.names.iter().position(|n| n.as_str() == name).map(|j| self.values.column(j))
    }

    /// Standardized risk-aversion proxy, when available.
    #[must_use]
    pub const fn risk_proxy(&self) -> Option<&Array1<f64>> {
        self.risk_proxy.as_ref()
    }
}

/// Builds [`FactorFrame`]s from standardized return matrices.
pub struct FactorFrameBuilder {
    target: Ticker,
    risk_proxy: Option<Ticker>,
    factors: Vec<Box<dyn Factor>>,
}

impl std::fmt::Debug for FactorFrameBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorFrameBuilder")
            .field("target", &self.target)
            .field("risk_proxy", &self.risk_proxy)
            .field("factors", &self.factors.iter().map(|x| x.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl FactorFrameBuilder {
    /// Create a builder explaining `target`.
    #[must_use]
    pub const fn new(target: Ticker) -> Self {
        Self { target, risk_proxy: None, factors: Vec::new() }
    }

    /// Carry the standardized `ticker` along as the risk-aversion proxy.
    #[must_use]
    pub fn with_risk_proxy(mut self, ticker: Ticker) -> Self {
        self.risk_proxy = Some(ticker);
        self
    }

    /// Register a factor. Factors become columns in registration order.
    #[must_use]
    pub fn with_factor(mut self, factor: impl Factor + 'static) -> Self {
        self.factors.push(Box::new(factor));
        self
    }

    /// Names of the factors that apply to `horizon`, in column order.
    #[must_use]
    pub fn factor_names(&self, horizon: Horizon) -> Vec<FactorName> {
        self.factors
            .iter()
            .filter(|f| f.applies_to(horizon))
            .map(|f| FactorName::new(f.name()))
            .collect()
    }

    /// Build the frame of `horizon` from its standardized matrix.
    ///
    /// # Errors
    /// Returns [`FactorError::MissingTicker`] (wrapped) if the target or a
    /// required global series is absent.
    pub fn build(
        &self,
        standardized: &ReturnMatrix,
        horizon: Horizon,
    ) -> Result<FactorFrame, FactorsError> {
        let target = standardized
            .column(self.target.as_str())
            .ok_or_else(|| FactorError::MissingTicker(self.target.to_string()))?
            .to_owned();

        let active: Vec<&dyn Factor> =
            self.factors.iter().map(|f| f.as_ref()).filter(|f| f.applies_to(horizon)).collect();

        let n = standardized.n_rows();
        let mut values = Array2::from_elem((n, active.len()), f64::NAN);
        for (j, factor) in active.iter().enumerate() {
            let series = factor.compute(standardized, horizon)?;
            if series.len() != n {
                return Err(FactorsError::Shape(format!(
                    "factor {} returned {} rows, expected {n}",
                    factor.name(),
                    series.len()
                )));
            }
            values.column_mut(j).assign(&series);
        }

        let risk_proxy = self
            .risk_proxy
            .as_ref()
            .and_then(|t| standardized.column(t.as_str()))
            .map(|c| c.to_owned());

        debug!(
            %horizon,
            rows = n,
            factors = active.len(),
            risk_proxy = risk_proxy.is_some(),
            "built factor frame"
        );

        FactorFrame::new(
            horizon,
            standardized.dates().to_vec(),
            target,
            active.iter().map(|f| FactorName::new(f.name())).collect(),
            values,
            risk_proxy,
        )
    }
}

#[cfg(test)]
mod tests {
    use copbrief_primitives::{COMMODITY_FACTOR, DOLLAR_FACTOR, LOCAL_FACTOR, REGIONAL_FACTOR};
    use ndarray::array;

    use super::*;
    use crate::{LaggedGlobalFactor, LocalRiskFactor, RegionalFxFactor};

    fn standardized() -> ReturnMatrix {
        let start = Date::from_ymd_opt(2024, 6, 3).unwrap();
        ReturnMatrix::new(
            start.iter_days().take(3).collect(),
            ["BZ=F", "COP=X", "DX-Y.NYB", "GXG", "USDMXN=X", "^VIX"]
                .into_iter()
                .map(Ticker::new)
                .collect(),
            array![
                [0.1, 1.0, 0.5, -0.2, 0.3, 1.5],
                [0.2, -1.0, 0.6, -0.1, 0.4, 1.6],
                [0.3, 0.5, 0.7, 0.0, 0.5, 1.7],
            ],
        )
    }

    fn builder() -> FactorFrameBuilder {
        FactorFrameBuilder::new(Ticker::new("COP=X"))
            .with_risk_proxy(Ticker::new("^VIX"))
            .with_factor(LaggedGlobalFactor::dollar(Ticker::new("DX-Y.NYB")))
            .with_factor(RegionalFxFactor::new())
            .with_factor(LaggedGlobalFactor::commodity(Ticker::new("BZ=F")))
            .with_factor(LocalRiskFactor::new(Ticker::new("GXG")))
    }

    #[test]
    fn factor_set_differs_by_horizon() {
        let b = builder();
        let one_day = b.build(&standardized(), Horizon::OneDay).unwrap();
        let five_day = b.build(&standardized(), Horizon::FiveDay).unwrap();

        let names = |f: &FactorFrame| f.factor_names().iter().map(|n| n.0.clone()).collect::<Vec<_>>();
        assert_eq!(names(&one_day), vec![DOLLAR_FACTOR, REGIONAL_FACTOR, COMMODITY_FACTOR]);
        assert_eq!(
            names(&five_day),
            vec![DOLLAR_FACTOR, REGIONAL_FACTOR, COMMODITY_FACTOR, LOCAL_FACTOR]
        );
        assert_eq!(b.factor_names(Horizon::OneDay).len(), 3);
    }

    #[test]
    fn one_day_frame_lags_globals() {
        let frame = builder().build(&standardized(), Horizon::OneDay).unwrap();
        let dxy = frame.factor(DOLLAR_FACTOR).unwrap();
        assert!(dxy[0].is_nan());
        assert_eq!(dxy[2], 0.6);
        assert_eq!(frame.target(), &array![1.0, -1.0, 0.5]);
        assert_eq!(frame.risk_proxy().unwrap()[2], 1.7);
        assert_eq!(frame.row(1).len(), 3);
    }

    #[test]
    fn missing_target_is_an_error() {
        let b = FactorFrameBuilder::new(Ticker::new("USDBRL=X"));
        let err = b.build(&standardized(), Horizon::OneDay).unwrap_err();
        assert!(matches!(err, FactorsError::Factor(FactorError::MissingTicker(_))));
    }

    #[test]
    fn frame_shape_is_validated() {
        let dates = vec![Date::from_ymd_opt(2024, 1, 2).unwrap()];
        let err = FactorFrame::new(
            Horizon::FiveDay,
            dates,
            array![0.1, 0.2],
            vec![],
            Array2::zeros((1, 0)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FactorsError::Shape(_)));
    }
}
