//! Feature extraction for the MARF pipeline.
//!
//! Feature extractors turn a preprocessed sample into the fixed-length feature vector that
//! classification trains on and scores.
//!
//! # Collaborators
//!
//! - [`Preprocessing`] - supplies the sample an extractor works on; provided by the
//!   application ([`RawPreprocessing`] passes a buffer through)
//! - [`PreprocessingTemplate`] - hands out independent [`Preprocessing`] instances, one per
//!   extractor, so concurrently running extractors never share state
//!
//! # Extractors
//!
//! - [`MinMaxAmplitudes`] - smallest and largest amplitudes of the sample
//! - [`RandomFeatureExtraction`] - Gaussian-weighted projection, a baseline
//! - [`FeatureExtractionAggregator`] - runs a configured list of extractors concurrently and
//!   concatenates their outputs
//!
//! Extractors are created through a [`FeatureExtractionRegistry`], where the application
//! registers the signal-processing extractors it provides.

pub use self::{
    aggregator::FeatureExtractionAggregator,
    error::{FeatureExtractionError, ModuleFailure},
    extraction::{BoxedFeatureExtraction, FeatureExtraction},
    min_max::MinMaxAmplitudes,
    preprocessing::{
        BoxedPreprocessing, Preprocessing, PreprocessingTemplate, RawPreprocessing,
        RawSampleTemplate, SharedPreprocessingTemplate,
    },
    random::RandomFeatureExtraction,
    registry::{FeatureExtractionConstructor, FeatureExtractionRegistry},
};

mod aggregator;
mod error;
mod extraction;
mod min_max;
mod preprocessing;
mod random;
mod registry;
