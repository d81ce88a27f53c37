//! Training and classification of feature vectors.
//!
//! This crate turns feature vectors into persisted per-subject knowledge and scores unseen
//! vectors against it.
//!
//! # Key Components
//!
//! - [`Classification`] - the trainable classifier contract shared by every algorithm
//! - [`ClusterClassification`] - mean-vector classifiers, parameterized by a [`Scorer`]
//!   ([`Euclidean`], [`Chebyshev`], [`Minkowski`], [`Mahalanobis`], [`Diff`], [`Hamming`],
//!   [`Cosine`]) and its [`BestOf`] policy
//! - [`ZipfLaw`] - rank/frequency profile comparison
//! - [`RandomClassification`] - guessing baseline
//! - [`Stochastic`] - selectable but unimplemented stochastic and Markov classifiers
//! - [`ClassificationFactory`] - method selector to classifier, with named plugins
//!
//! # Training and Classification
//!
//! ```text
//! train(vector)     restore training set ─▶ fold vector into subject mean ─▶ dump
//! classify(vector)  restore training set ─▶ score every subject ─▶ ResultSet ─▶ result()
//! ```
//!
//! Every failure inside these steps is a [`ClassificationError`] tagged with the [`Phase`]
//! it occurred in.
//!
//! # Example
//!
//! ```no_run
//! use marf_classification::ClassificationFactory;
//! use marf_core::PipelineConfig;
//!
//! # fn main() -> Result<(), marf_classification::ClassificationError> {
//! let factory = ClassificationFactory::new();
//! let mut classifier = factory.create(PipelineConfig::default(), None)?;
//! classifier.config_mut().current_subject = 3;
//! classifier.train(&[1.0, 2.0, 3.0])?;
//! classifier.classify(&[1.0, 2.0, 2.5])?;
//! assert_eq!(classifier.result().map(|r| r.subject_id()), Some(3));
//! # Ok(())
//! # }
//! ```

pub use self::{
    classification::{
        BoxedClassification, Classification, SharedFeatureExtraction, share_feature_extraction,
    },
    cluster::{ClusterClassification, score_training_set},
    distance::{Chebyshev, Diff, Euclidean, Hamming, Mahalanobis, Minkowski, diff_distance},
    error::{ClassificationError, Phase},
    factory::{ClassificationConstructor, ClassificationFactory},
    random::{RandomClassification, SubjectIds},
    scorer::{BestOf, BoxedScorer, Scorer},
    similarity::{Cosine, cosine_similarity},
    stochastic::Stochastic,
    zipf::{DEFAULT_REPORT_PAGE_SIZE, Token, ZIPF_LAW_TYPE_NAME, ZipfLaw, ZipfReport, ZipfStatistics},
};

mod classification;
mod cluster;
mod distance;
mod error;
mod factory;
mod random;
mod scorer;
mod similarity;
mod stochastic;
mod zipf;
