#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::RelationsConfig;

mod regression;
pub use regression::{
    FallbackReason, FitOutcome, OlsEstimator, RegressionConfig, RollingModel, RollingRegressor,
};

mod contributions;
pub use contributions::{ContributionCalculator, ContributionFrame};

mod attribution;
pub use attribution::{ResultRow, ResultTable, TableConfig};

mod narrative;
pub use narrative::{NO_DATA_SUMMARY, SummaryConfig, build_summary, is_risk_on};

mod engine;
pub use engine::{HorizonRelations, RelationsEngine, RelationsReport};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use copbrief_traits::WindowEstimator;

    pub use super::{
        FitOutcome, ModelError, RelationsConfig, RelationsEngine, RelationsReport, ResultTable,
    };
}
