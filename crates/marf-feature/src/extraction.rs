use std::fmt;

use marf_core::FeatureExtractionMethod;

use crate::FeatureExtractionError;

/// Turns a preprocessed sample into a feature vector.
///
/// An extractor is bound to its [`Preprocessing`](crate::Preprocessing) collaborator at
/// construction. [`extract_features()`](Self::extract_features) pulls the sample from that
/// collaborator, [`extract_features_from()`](Self::extract_features_from) uses a caller-supplied
/// buffer instead. Either way the result is read back through [`features()`](Self::features).
pub trait FeatureExtraction: fmt::Debug + Send {
    fn method(&self) -> FeatureExtractionMethod;

    /// Returns `false` when the extraction produced no features.
    fn extract_features(&mut self) -> Result<bool, FeatureExtractionError>;

    fn extract_features_from(&mut self, sample: &[f64]) -> Result<bool, FeatureExtractionError>;

    /// Features of the last successful extraction; empty before the first one.
    fn features(&self) -> &[f64];
}

pub type BoxedFeatureExtraction = Box<dyn FeatureExtraction>;
