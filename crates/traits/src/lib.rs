#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod factor;
pub use factor::{ConfigurableFactor, Factor, FactorError, FactorKind};

mod transform;
pub use transform::{TimeSeriesTransform, TransformError};

mod estimator;
pub use estimator::{EstimatorError, WindowEstimator};

mod source;
pub use source::{
    NarrativeGenerator, NarrativeInput, NewsSource, Newsletter, PriceSource, Publisher,
    SourceError,
};
