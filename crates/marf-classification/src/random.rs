use std::{
    io::{Read, Write},
    path::PathBuf,
};

use marf_core::{ClassificationMethod, PipelineConfig, Selector as _, SubjectId};
use marf_storage::{CsvFormatError, Persist, ResultSet, StorageManager};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{
    BestOf, Classification, ClassificationError, Phase, SharedFeatureExtraction,
    classification::ClassifierState,
};

const RANDOM_CLASSIFICATION_TYPE_NAME: &str =
    "marf.Classification.RandomClassification.RandomClassification";

/// Identifiers of every subject the random classifier was trained on, in training order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIds(Vec<SubjectId>);

impl SubjectIds {
    #[must_use]
    pub fn as_slice(&self) -> &[SubjectId] {
        &self.0
    }

    /// Adds `id` unless it is already known; returns whether it was added.
    pub fn insert(&mut self, id: SubjectId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }
}

/// One subject id per record.
impl Persist for SubjectIds {
    const TYPE_NAME: &'static str = "RandomClassification";

    fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), CsvFormatError> {
        for id in &self.0 {
            writer.write_record([id.to_string()])?;
        }
        Ok(())
    }

    fn read_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self, CsvFormatError> {
        let mut ids = Self::default();
        for record in reader.records() {
            let record = record?;
            let field = record.get(0).unwrap_or_default();
            let id = field
                .parse()
                .map_err(|_| CsvFormatError::malformed(format!("invalid subject id: {field:?}")))?;
            ids.insert(id);
        }
        Ok(ids)
    }
}

/// Baseline classifier that guesses among the known subjects.
///
/// The guess is recorded with outcome 0 and a different known subject (or, with a single
/// known subject, the next id) as the runner-up with outcome 1. Any real classifier should
/// beat it.
#[derive(Debug)]
pub struct RandomClassification {
    state: ClassifierState,
    ids: SubjectIds,
    rng: Pcg64,
}

impl RandomClassification {
    #[must_use]
    pub fn new(config: PipelineConfig, feature_extraction: Option<SharedFeatureExtraction>) -> Self {
        Self::with_rng(config, feature_extraction, Pcg64::from_os_rng())
    }

    #[must_use]
    pub fn with_rng(
        config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
        rng: Pcg64,
    ) -> Self {
        Self {
            state: ClassifierState::new(config, feature_extraction),
            ids: SubjectIds::default(),
            rng,
        }
    }

    #[must_use]
    pub fn subject_ids(&self) -> &[SubjectId] {
        self.ids.as_slice()
    }

    /// File the subject ids live in; the vector length is not part of it.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        let config = &self.state.config;
        PathBuf::from(format!(
            "{}{RANDOM_CLASSIFICATION_TYPE_NAME}.{}.{}.{}",
            config.filename_prefix,
            config.preprocessing.code(),
            config.feature_extraction.code(),
            config.dump_mode.extension()
        ))
    }

    fn storage(&self) -> StorageManager {
        StorageManager::new(self.path(), self.state.config.dump_mode)
            .dump_on_not_found(self.state.config.dump_on_not_found)
    }

    fn restore_ids(&mut self) -> Result<(), ClassificationError> {
        self.ids = self
            .storage()
            .restore()
            .map_err(ClassificationError::storage(Phase::RestoringTrainingSet))?;
        Ok(())
    }
}

impl Classification for RandomClassification {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Random
    }

    fn config(&self) -> &PipelineConfig {
        &self.state.config
    }

    fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.state.config
    }

    fn train(&mut self, _vector: &[f64]) -> Result<bool, ClassificationError> {
        self.restore_ids()?;
        let subject = self.state.config.current_subject;
        if !self.ids.insert(subject) {
            return Ok(false);
        }
        log::debug!("random classification now knows subject {subject}");
        self.storage()
            .dump(&self.ids)
            .map_err(ClassificationError::storage(Phase::DumpingUpdatedTrainingSet))?;
        Ok(true)
    }

    fn classify(&mut self, _vector: &[f64]) -> Result<bool, ClassificationError> {
        self.state.results.clear();
        self.restore_ids()?;
        let ids = self.ids.as_slice();
        if ids.is_empty() {
            self.state
                .results
                .add_result_with_description(0, 0.0, "RandomClassification out of the blue");
            return Ok(true);
        }
        let first = self.rng.random_range(0..ids.len());
        let second = if ids.len() > 1 {
            let j = self.rng.random_range(0..ids.len() - 1);
            ids[if j >= first { j + 1 } else { j }]
        } else {
            ids[first].wrapping_add(1)
        };
        self.state.results.add_result(ids[first], 0.0);
        self.state.results.add_result(second, 1.0);
        Ok(true)
    }

    fn dump(&mut self) -> Result<(), ClassificationError> {
        self.storage()
            .dump(&self.ids)
            .map_err(ClassificationError::storage(Phase::DumpingUpdatedTrainingSet))
    }

    fn restore(&mut self) -> Result<(), ClassificationError> {
        self.restore_ids()
    }

    fn result_set(&self) -> &ResultSet {
        &self.state.results
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    fn feature_extraction(&self) -> Option<&SharedFeatureExtraction> {
        self.state.feature_extraction.as_ref()
    }

    fn set_feature_extraction(&mut self, feature_extraction: Option<SharedFeatureExtraction>) {
        self.state.feature_extraction = feature_extraction;
    }
}

#[cfg(test)]
mod tests {
    use marf_core::DumpMode;
    use marf_storage::ResultEntry;
    use tempfile::TempDir;

    use super::*;

    fn classifier(dir: &TempDir, dump_mode: DumpMode, seed: u64) -> RandomClassification {
        let config = PipelineConfig {
            filename_prefix: format!("{}/", dir.path().display()),
            dump_mode,
            ..PipelineConfig::default()
        };
        RandomClassification::with_rng(config, None, Pcg64::seed_from_u64(seed))
    }

    fn train(random: &mut RandomClassification, subject: SubjectId) -> bool {
        random.config_mut().current_subject = subject;
        random.train(&[]).unwrap()
    }

    #[test]
    fn test_empty_state_answers_subject_zero() {
        let dir = tempfile::tempdir().unwrap();
        for seed in 0..5 {
            let mut random = classifier(&dir, DumpMode::Binary, seed);
            assert!(random.classify(&[1.0]).unwrap());
            let result = random.result().unwrap();
            assert_eq!((result.subject_id(), result.outcome()), (0, 0.0));
            assert_eq!(random.result_set().len(), 1);
        }
    }

    #[test]
    fn test_training_ignores_known_subjects() {
        let dir = tempfile::tempdir().unwrap();
        let mut random = classifier(&dir, DumpMode::Binary, 1);
        assert!(train(&mut random, 4));
        assert!(train(&mut random, 9));
        assert!(!train(&mut random, 4));
        assert_eq!(random.subject_ids(), [4, 9]);
    }

    #[test]
    fn test_runner_up_differs_from_guess() {
        let dir = tempfile::tempdir().unwrap();
        let mut random = classifier(&dir, DumpMode::Binary, 7);
        for subject in [1, 2, 3] {
            train(&mut random, subject);
        }
        for _ in 0..20 {
            random.classify(&[]).unwrap();
            let best = random.result().unwrap().subject_id();
            let runner_up = random.result_set().second_minimum().unwrap().subject_id();
            assert_ne!(best, runner_up);
            assert!([1, 2, 3].contains(&best));
            assert!([1, 2, 3].contains(&runner_up));
        }
    }

    #[test]
    fn test_single_subject_fabricates_runner_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut random = classifier(&dir, DumpMode::Binary, 3);
        train(&mut random, 5);
        random.classify(&[]).unwrap();
        let ids = random
            .result_set()
            .iter()
            .map(ResultEntry::subject_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, [5, 6]);
    }

    #[test]
    fn test_csv_ids_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut random = classifier(&dir, DumpMode::CsvText, 0);
        train(&mut random, 2);
        train(&mut random, 8);
        assert!(random.path().to_string_lossy().ends_with(
            "marf.Classification.RandomClassification.RandomClassification.100.301.csv"
        ));

        let mut restored = classifier(&dir, DumpMode::CsvText, 0);
        restored.restore().unwrap();
        assert_eq!(restored.subject_ids(), [2, 8]);
    }
}
