#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod scale;
pub use scale::min_max_normalize;

mod window;
pub use window::{
    linear_quantile, nan_mean, nan_std, pearson_correlation, sample_std, valid_count, valid_values,
};

mod linalg;
pub use linalg::{LeastSquaresResult, ordinary_least_squares};

mod error;
pub use error::MathError;
