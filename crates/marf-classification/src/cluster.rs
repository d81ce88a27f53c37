use marf_core::{ClassificationMethod, ConfigurationKey, PipelineConfig};
use marf_storage::{ResultSet, StorageManager, TrainingSet};

use crate::{
    BestOf, BoxedScorer, Classification, ClassificationError, Phase, Scorer,
    SharedFeatureExtraction, classification::ClassifierState,
};

/// Training set currently held in memory, with the key of the file it belongs to.
#[derive(Debug)]
struct LoadedTrainingSet {
    key: ConfigurationKey,
    set: TrainingSet,
    modified: bool,
}

impl LoadedTrainingSet {
    fn dump(&mut self, phase: Phase) -> Result<(), ClassificationError> {
        StorageManager::for_key(&self.key)
            .dump(&self.set)
            .map_err(ClassificationError::storage(phase))?;
        self.modified = false;
        Ok(())
    }
}

/// Classifier comparing feature vectors with per-subject mean vectors.
///
/// All distance and similarity classifiers share this type and differ only in their
/// [`Scorer`]. The training set matching the current configuration is loaded on first use
/// and kept until the configuration key changes (another vector length, other methods,
/// another prefix). Switching keys writes the previous set back first if it has unsaved
/// changes.
///
/// [`dump()`](Classification::dump) and [`restore()`](Classification::restore) act on the
/// set in memory and do nothing before one is loaded. Use
/// [`load_training_set()`](Self::load_training_set) to pick one without training or
/// classifying.
#[derive(Debug)]
pub struct ClusterClassification {
    scorer: BoxedScorer,
    state: ClassifierState,
    loaded: Option<LoadedTrainingSet>,
}

impl ClusterClassification {
    #[must_use]
    pub fn new(
        scorer: BoxedScorer,
        config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
    ) -> Self {
        Self {
            scorer,
            state: ClassifierState::new(config, feature_extraction),
            loaded: None,
        }
    }

    #[must_use]
    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    /// Training set currently in memory, if any was loaded yet.
    #[must_use]
    pub fn training_set(&self) -> Option<&TrainingSet> {
        self.loaded.as_ref().map(|loaded| &loaded.set)
    }

    #[must_use]
    pub fn training_set_key(&self) -> Option<&ConfigurationKey> {
        self.loaded.as_ref().map(|loaded| &loaded.key)
    }

    /// Loads the training set for vectors of `feature_count` elements under the current
    /// configuration.
    pub fn load_training_set(
        &mut self,
        feature_count: usize,
    ) -> Result<&TrainingSet, ClassificationError> {
        let config = &self.state.config;
        let key = ConfigurationKey::training_set(config, feature_count);
        Ok(&load(&mut self.loaded, config, key)?.set)
    }
}

impl Classification for ClusterClassification {
    fn method(&self) -> ClassificationMethod {
        self.scorer.method()
    }

    fn config(&self) -> &PipelineConfig {
        &self.state.config
    }

    fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.state.config
    }

    fn train(&mut self, vector: &[f64]) -> Result<bool, ClassificationError> {
        let config = &self.state.config;
        let key = ConfigurationKey::training_set(config, vector.len());
        let loaded = load(&mut self.loaded, config, key)?;

        if let Some(expected) = loaded.set.vector_len()
            && expected != vector.len()
        {
            return Err(ClassificationError::LengthMismatch {
                phase: Phase::AddingFeatureVector,
                subject_id: config.current_subject,
                expected,
                found: vector.len(),
            });
        }
        let added = loaded.set.add_feature_vector(
            vector,
            config.sample_file.as_deref(),
            config.current_subject,
            config.preprocessing,
            config.feature_extraction,
        );
        if !added {
            return Ok(false);
        }
        loaded.modified = true;
        loaded.dump(Phase::DumpingUpdatedTrainingSet)?;
        Ok(true)
    }

    fn classify(&mut self, vector: &[f64]) -> Result<bool, ClassificationError> {
        self.state.results.clear();
        let config = &self.state.config;
        let key = ConfigurationKey::training_set(config, vector.len());
        let loaded = load(&mut self.loaded, config, key)?;
        score_training_set(
            self.scorer.as_ref(),
            &loaded.set,
            vector,
            &mut self.state.results,
        )?;
        Ok(!self.state.results.is_empty())
    }

    fn dump(&mut self) -> Result<(), ClassificationError> {
        match &mut self.loaded {
            Some(loaded) => loaded.dump(Phase::DumpingUpdatedTrainingSet),
            None => Ok(()),
        }
    }

    fn restore(&mut self) -> Result<(), ClassificationError> {
        if let Some(loaded) = &mut self.loaded {
            loaded.set = restore_training_set(&loaded.key, &self.state.config)?;
            loaded.modified = false;
        }
        Ok(())
    }

    fn result_set(&self) -> &ResultSet {
        &self.state.results
    }

    fn best_of(&self) -> BestOf {
        self.scorer.best_of()
    }

    fn feature_extraction(&self) -> Option<&SharedFeatureExtraction> {
        self.state.feature_extraction.as_ref()
    }

    fn set_feature_extraction(&mut self, feature_extraction: Option<SharedFeatureExtraction>) {
        self.state.feature_extraction = feature_extraction;
    }
}

/// Scores `incoming` against every subject of `set`, appending one result per subject.
///
/// Fails on a subject without a mean vector or with a mean vector of another length;
/// neither is skipped, as both mean the stored data does not belong to this configuration.
pub fn score_training_set(
    scorer: &dyn Scorer,
    set: &TrainingSet,
    incoming: &[f64],
    results: &mut ResultSet,
) -> Result<(), ClassificationError> {
    for sample in set.samples() {
        let subject_id = sample.subject_id();
        let mean = sample
            .mean_vector()
            .ok_or(ClassificationError::MissingMeanVector {
                phase: Phase::Classifying,
                subject_id,
            })?;
        if mean.len() != incoming.len() {
            return Err(ClassificationError::LengthMismatch {
                phase: Phase::Classifying,
                subject_id,
                expected: mean.len(),
                found: incoming.len(),
            });
        }
        results.add_result(subject_id, scorer.score(mean, incoming)?);
    }
    Ok(())
}

fn load<'a>(
    slot: &'a mut Option<LoadedTrainingSet>,
    config: &PipelineConfig,
    key: ConfigurationKey,
) -> Result<&'a mut LoadedTrainingSet, ClassificationError> {
    if slot.as_ref().is_some_and(|loaded| loaded.key == key)
        && let Some(loaded) = slot
    {
        return Ok(loaded);
    }
    if let Some(mut previous) = slot.take()
        && previous.modified
    {
        log::debug!("switching from {} to {key}", previous.key);
        if let Err(e) = previous.dump(Phase::DumpingPreviousCluster) {
            *slot = Some(previous);
            return Err(e);
        }
    }
    let set = restore_training_set(&key, config)?;
    Ok(slot.insert(LoadedTrainingSet {
        key,
        set,
        modified: false,
    }))
}

fn restore_training_set(
    key: &ConfigurationKey,
    config: &PipelineConfig,
) -> Result<TrainingSet, ClassificationError> {
    let set = StorageManager::for_key(key)
        .dump_on_not_found(config.dump_on_not_found)
        .restore::<TrainingSet>()
        .map_err(ClassificationError::storage(Phase::RestoringTrainingSet))?;
    if !set.is_produced_by(config.preprocessing, config.feature_extraction) {
        log::warn!(
            "{key} holds vectors of other methods ({:?}, {:?}), starting from an empty training set",
            set.preprocessing(),
            set.feature_extraction()
        );
        return Ok(TrainingSet::new());
    }
    Ok(set)
}
