//! Type definitions for well log DT prediction

pub mod features;
pub mod prediction;

pub use features::{Feature, FeatureVector, FEATURE_COUNT};
pub use prediction::PredictionReport;
