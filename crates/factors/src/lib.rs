#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod returns;
pub use returns::{CompoundReturns, returns_for_horizon};

mod standardize;
pub use standardize::RollingZScore;

mod local;
pub use local::{
    LocalFactorConfig, LocalRiskChoice, LocalRiskConfig, LocalRiskFactor, LocalRiskSelector,
    correlation_stability,
};

mod regional;
pub use regional::{RegionalConfig, RegionalFxFactor};

mod global;
pub use global::{GlobalFactorConfig, LaggedGlobalFactor, shift};

mod frame;
pub use frame::{FactorFrame, FactorFrameBuilder};

mod error;
pub use error::FactorsError;
