//! Upstream sample collaborators of feature extraction.
//!
//! Filtering, normalization and sample loading live outside this crate. Feature extractors
//! only see the [`Preprocessing`] trait, and the aggregator asks a [`PreprocessingTemplate`]
//! for one fresh instance per module so that no two workers share mutable state.

use std::{fmt, sync::Arc};

use marf_core::PreprocessingMethod;

use crate::FeatureExtractionError;

/// Produces the preprocessed sample a feature extractor works on.
pub trait Preprocessing: fmt::Debug + Send {
    fn method(&self) -> PreprocessingMethod;

    /// Runs preprocessing (if not done yet) and returns the resulting sample.
    fn preprocess(&mut self) -> Result<&[f64], FeatureExtractionError>;
}

pub type BoxedPreprocessing = Box<dyn Preprocessing>;

/// Creates independent [`Preprocessing`] instances for the same input.
pub trait PreprocessingTemplate: fmt::Debug + Send + Sync {
    fn method(&self) -> PreprocessingMethod;
    fn instantiate(&self) -> BoxedPreprocessing;
}

pub type SharedPreprocessingTemplate = Arc<dyn PreprocessingTemplate>;

/// Passes a sample through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPreprocessing {
    sample: Vec<f64>,
}

impl RawPreprocessing {
    #[must_use]
    pub fn new(sample: Vec<f64>) -> Self {
        Self { sample }
    }

    #[must_use]
    pub fn boxed(sample: Vec<f64>) -> BoxedPreprocessing {
        Box::new(Self::new(sample))
    }
}

impl Preprocessing for RawPreprocessing {
    fn method(&self) -> PreprocessingMethod {
        PreprocessingMethod::Raw
    }

    fn preprocess(&mut self) -> Result<&[f64], FeatureExtractionError> {
        Ok(&self.sample)
    }
}

/// Template handing out [`RawPreprocessing`] copies of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSampleTemplate {
    sample: Arc<[f64]>,
}

impl RawSampleTemplate {
    #[must_use]
    pub fn new(sample: impl Into<Arc<[f64]>>) -> Self {
        Self {
            sample: sample.into(),
        }
    }

    #[must_use]
    pub fn shared(sample: impl Into<Arc<[f64]>>) -> SharedPreprocessingTemplate {
        Arc::new(Self::new(sample))
    }

    #[must_use]
    pub fn sample(&self) -> &[f64] {
        &self.sample
    }
}

impl PreprocessingTemplate for RawSampleTemplate {
    fn method(&self) -> PreprocessingMethod {
        PreprocessingMethod::Raw
    }

    fn instantiate(&self) -> BoxedPreprocessing {
        RawPreprocessing::boxed(self.sample.to_vec())
    }
}
