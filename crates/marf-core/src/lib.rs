//! Core vocabulary of the MARF recognition pipeline.
//!
//! This crate holds the types every other layer agrees on: the method selectors and their
//! numeric codes, the explicit [`PipelineConfig`] context, module parameter lists, dump modes
//! and the [`ConfigurationKey`] that names persisted training data.
//!
//! # Pipeline
//!
//! ```text
//! Preprocessing ──▶ FeatureExtraction ──▶ FeatureVector ──▶ Classification
//!                   (single or aggregated)                   │        │
//!                                                             ▼        ▼
//!                                                        TrainingSet  ResultSet
//! ```
//!
//! Nothing here performs I/O except [`PipelineConfig::from_toml_file()`].
//!
//! # Configuration Keys
//!
//! A [`ConfigurationKey`] folds every pipeline setting that changes the meaning of a stored
//! vector into the file name of the persisted training set. Identical settings always map to
//! the same file; changing any one of them maps to a different file.
//!
//! ```
//! use marf_core::{ConfigurationKey, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let key = ConfigurationKey::training_set(&config, 100);
//! assert_eq!(key.to_string(), "marf.Storage.TrainingSet.700.0.0.100.301.100.gzbin");
//! ```

pub use self::{
    config::{ClassificationParams, ConfigError, HammingMode, PipelineConfig},
    dump_mode::{DumpMode, UnsupportedDumpModeError},
    key::{ConfigurationKey, TRAINING_SET_TYPE_NAME},
    method::{
        ClassificationMethod, FeatureExtractionMethod, PreprocessingMethod, SampleFormat,
        Selector, UnknownSelectorError,
    },
    params::{ModuleParam, ModuleParams},
};

mod config;
mod dump_mode;
mod key;
mod method;
mod params;

/// Identifier of a subject (speaker, writer, category) being recognized.
pub type SubjectId = i32;

/// An ordered sequence of features; its length is fixed per configuration.
pub type FeatureVector = Vec<f64>;
