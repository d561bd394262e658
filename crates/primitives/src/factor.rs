//! Factor-related type definitions.

use serde::{Deserialize, Serialize};

/// Name of the lagged global-dollar factor.
pub const DOLLAR_FACTOR: &str = "DXY_L1";
/// Name of the regional FX average factor.
pub const REGIONAL_FACTOR: &str = "LA_USD";
/// Name of the lagged commodity factor.
pub const COMMODITY_FACTOR: &str = "BZ_lag1";
/// Name of the local-risk factor (5-day model only).
pub const LOCAL_FACTOR: &str = "Local5d";
/// Label of the residual row in result tables.
pub const RESIDUAL: &str = "residual";

/// Name of a factor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorName(pub String);

impl FactorName {
    /// Create a new factor name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the factor name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactorName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FactorName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FactorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Return horizon over which a factor model is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    /// Raw daily percentage change.
    #[serde(rename = "1d")]
    OneDay,
    /// Five-day compounded return.
    #[serde(rename = "5d")]
    FiveDay,
}

impl Horizon {
    /// Both horizons in reporting order.
    pub const ALL: [Self; 2] = [Self::OneDay, Self::FiveDay];

    /// Short label used in tables and file names.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDay => "5d",
        }
    }

    /// Whether global factors enter this horizon's model lagged by one row.
    #[must_use]
    pub const fn lags_global_factors(&self) -> bool {
        matches!(self, Self::OneDay)
    }

    /// Whether the local-risk factor is part of this horizon's model.
    #[must_use]
    pub const fn includes_local_factor(&self) -> bool {
        matches!(self, Self::FiveDay)
    }

    /// Factor names of this horizon's model, in design-matrix order.
    #[must_use]
    pub fn factor_names(&self) -> Vec<FactorName> {
        let mut names = vec![
            FactorName::from(DOLLAR_FACTOR),
            FactorName::from(REGIONAL_FACTOR),
            FactorName::from(COMMODITY_FACTOR),
        ];
        if self.includes_local_factor() {
            names.push(FactorName::from(LOCAL_FACTOR));
        }
        names
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
