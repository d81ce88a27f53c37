use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use marf_core::{ClassificationMethod, PipelineConfig};
use marf_feature::BoxedFeatureExtraction;
use marf_storage::{ResultEntry, ResultSet};

use crate::{BestOf, ClassificationError, Phase};

/// Feature extraction collaborator shared between the pipeline and its classifier.
pub type SharedFeatureExtraction = Arc<Mutex<BoxedFeatureExtraction>>;

/// A trainable classifier.
///
/// A classifier owns its copy of the [`PipelineConfig`], the state it persists (a training
/// set or classifier-specific statistics) and the [`ResultSet`] of its last classification.
/// The feature extraction it reads from is shared with the pipeline.
///
/// # Training
///
/// [`train()`](Self::train) folds a vector into the persisted state of
/// `config().current_subject` and dumps that state when it changed. The return value is
/// `false` when nothing changed (for example a repeated sample file).
///
/// # Classification
///
/// [`classify()`](Self::classify) scores the vector against every trained subject and
/// records one [`ResultEntry`] per subject. [`result()`](Self::result) picks the best one,
/// which is the minimum outcome for distances and the maximum for similarities and
/// probabilities.
pub trait Classification: fmt::Debug + Send {
    fn method(&self) -> ClassificationMethod;

    fn config(&self) -> &PipelineConfig;

    /// Mutable access, e.g. to switch the current subject between training calls.
    fn config_mut(&mut self) -> &mut PipelineConfig;

    fn train(&mut self, vector: &[f64]) -> Result<bool, ClassificationError>;

    /// Returns `false` when there was nothing to compare against.
    fn classify(&mut self, vector: &[f64]) -> Result<bool, ClassificationError>;

    /// Writes the in-memory state to its file.
    fn dump(&mut self) -> Result<(), ClassificationError>;

    /// Replaces the in-memory state by the content of its file.
    ///
    /// Classifiers whose file depends on the vector length use the length of their last
    /// training or classification.
    fn restore(&mut self) -> Result<(), ClassificationError>;

    fn result_set(&self) -> &ResultSet;

    /// Whether the minimum or the maximum outcome is the best one.
    fn best_of(&self) -> BestOf;

    /// Best entry of the last classification.
    fn result(&self) -> Option<&ResultEntry> {
        self.best_of().select(self.result_set())
    }

    /// Second best entry of the last classification.
    fn runner_up(&self) -> Option<&ResultEntry> {
        self.best_of().runner_up(self.result_set())
    }

    fn feature_extraction(&self) -> Option<&SharedFeatureExtraction>;

    fn set_feature_extraction(&mut self, feature_extraction: Option<SharedFeatureExtraction>);

    /// Trains on the features of the attached feature extraction.
    ///
    /// Extraction runs first if it has not produced any features yet.
    fn train_extracted(&mut self) -> Result<bool, ClassificationError> {
        let features = extracted_features(self.feature_extraction(), Phase::Start)?;
        self.train(&features)
    }

    /// Classifies the features of the attached feature extraction, extracting them first
    /// if needed.
    fn classify_extracted(&mut self) -> Result<bool, ClassificationError> {
        let features = extracted_features(self.feature_extraction(), Phase::Classifying)?;
        self.classify(&features)
    }
}

pub type BoxedClassification = Box<dyn Classification>;

/// Wraps a feature extraction so it can be shared with a classifier.
#[must_use]
pub fn share_feature_extraction(feature_extraction: BoxedFeatureExtraction) -> SharedFeatureExtraction {
    Arc::new(Mutex::new(feature_extraction))
}

fn extracted_features(
    feature_extraction: Option<&SharedFeatureExtraction>,
    phase: Phase,
) -> Result<Vec<f64>, ClassificationError> {
    let feature_extraction =
        feature_extraction.ok_or(ClassificationError::NoFeatureExtraction { phase })?;
    let mut guard = feature_extraction
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if guard.features().is_empty() {
        guard
            .extract_features()
            .map_err(|source| ClassificationError::FeatureExtraction { phase, source })?;
    }
    Ok(guard.features().to_vec())
}

/// State every classifier carries besides its persisted data.
#[derive(Debug)]
pub(crate) struct ClassifierState {
    pub(crate) config: PipelineConfig,
    pub(crate) feature_extraction: Option<SharedFeatureExtraction>,
    pub(crate) results: ResultSet,
}

impl ClassifierState {
    pub(crate) fn new(
        config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
    ) -> Self {
        Self {
            config,
            feature_extraction,
            results: ResultSet::new(),
        }
    }
}
