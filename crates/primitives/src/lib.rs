#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod ticker;
pub use ticker::Ticker;

mod factor;
pub use factor::{
    COMMODITY_FACTOR, DOLLAR_FACTOR, FactorName, Horizon, LOCAL_FACTOR, REGIONAL_FACTOR, RESIDUAL,
};

mod returns;
pub use returns::ReturnMatrix;

mod news;
pub use news::Article;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
