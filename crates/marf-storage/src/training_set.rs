use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use marf_core::{FeatureExtractionMethod, PreprocessingMethod, Selector as _, SubjectId};
use serde::{Deserialize, Serialize};

use crate::{CsvFormatError, Persist};

/// Running mean of every feature vector trained for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    subject_id: SubjectId,
    /// `None` only when the persisted data is damaged.
    mean_vector: Option<Vec<f64>>,
    mean_count: u64,
    sample_files: Vec<String>,
}

impl TrainingSample {
    /// Creates a sample for `subject_id` that has not seen any vector yet.
    #[must_use]
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            mean_vector: None,
            mean_count: 0,
            sample_files: Vec::new(),
        }
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn mean_vector(&self) -> Option<&[f64]> {
        self.mean_vector.as_deref()
    }

    /// Number of vectors averaged into the mean.
    #[must_use]
    pub fn mean_count(&self) -> u64 {
        self.mean_count
    }

    /// Names of the sample files this subject was trained on.
    #[must_use]
    pub fn sample_files(&self) -> &[String] {
        &self.sample_files
    }

    #[must_use]
    pub fn was_trained_on(&self, sample_file: &str) -> bool {
        self.sample_files.iter().any(|f| f == sample_file)
    }

    #[expect(clippy::cast_precision_loss)]
    fn add_feature_vector(&mut self, vector: &[f64], sample_file: Option<&str>) {
        if self.mean_count > 0
            && let Some(mean) = &mut self.mean_vector
        {
            let count = self.mean_count as f64;
            for (m, v) in mean.iter_mut().zip(vector) {
                *m = (*m * count + v) / (count + 1.0);
            }
        } else {
            self.mean_vector = Some(vector.to_vec());
        }
        self.mean_count += 1;
        if let Some(file) = sample_file {
            self.sample_files.push(file.to_owned());
        }
    }
}

/// Per-subject mean vectors produced under one preprocessing/feature-extraction pairing.
///
/// The methods are recorded by the first added vector; an empty set is compatible with any
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    preprocessing: Option<PreprocessingMethod>,
    feature_extraction: Option<FeatureExtractionMethod>,
    samples: BTreeMap<SubjectId, TrainingSample>,
}

impl TrainingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn preprocessing(&self) -> Option<PreprocessingMethod> {
        self.preprocessing
    }

    #[must_use]
    pub fn feature_extraction(&self) -> Option<FeatureExtractionMethod> {
        self.feature_extraction
    }

    /// Whether the stored vectors were produced by the given methods.
    #[must_use]
    pub fn is_produced_by(
        &self,
        preprocessing: PreprocessingMethod,
        feature_extraction: FeatureExtractionMethod,
    ) -> bool {
        self.preprocessing.is_none_or(|p| p == preprocessing)
            && self
                .feature_extraction
                .is_none_or(|fe| fe == feature_extraction)
    }

    /// Length of the stored mean vectors, if any sample has one.
    #[must_use]
    pub fn vector_len(&self) -> Option<usize> {
        self.samples
            .values()
            .find_map(|s| s.mean_vector().map(<[f64]>::len))
    }

    /// Folds `vector` into the running mean of `subject_id`.
    ///
    /// Returns `false` without touching the set when the subject was already trained on
    /// `sample_file`. Vectors without a sample file are always added. The caller is
    /// responsible for `vector` having the length of the stored vectors.
    pub fn add_feature_vector(
        &mut self,
        vector: &[f64],
        sample_file: Option<&str>,
        subject_id: SubjectId,
        preprocessing: PreprocessingMethod,
        feature_extraction: FeatureExtractionMethod,
    ) -> bool {
        let existing = self.samples.contains_key(&subject_id);
        let sample = self
            .samples
            .entry(subject_id)
            .or_insert_with(|| TrainingSample::new(subject_id));
        if let Some(file) = sample_file
            && sample.was_trained_on(file)
        {
            log::debug!(
                "subject {subject_id} was already trained on {file}, ignoring the vector"
            );
            return false;
        }
        sample.add_feature_vector(vector, sample_file);
        self.preprocessing = Some(preprocessing);
        self.feature_extraction = Some(feature_extraction);
        if existing {
            log::debug!(
                "updated mean vector for subject {subject_id} ({preprocessing}, {feature_extraction})"
            );
        } else {
            log::debug!(
                "added feature vector for subject {subject_id} ({preprocessing}, {feature_extraction})"
            );
        }
        true
    }

    /// Inserts or replaces a sample as-is.
    pub fn insert(&mut self, sample: TrainingSample) {
        self.samples.insert(sample.subject_id, sample);
    }

    #[must_use]
    pub fn get(&self, subject_id: SubjectId) -> Option<&TrainingSample> {
        self.samples.get(&subject_id)
    }

    /// Samples in ascending subject order.
    pub fn samples(&self) -> impl Iterator<Item = &TrainingSample> {
        self.samples.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Header record: preprocessing code, feature extraction code, sample count.
/// Sample records: subject, mean count, vector length, vector values, sample files.
impl Persist for TrainingSet {
    const TYPE_NAME: &'static str = "TrainingSet";

    fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), CsvFormatError> {
        let code = |c: Option<i32>| c.map(|c| c.to_string()).unwrap_or_default();
        writer.write_record([
            code(self.preprocessing.map(PreprocessingMethod::code)),
            code(self.feature_extraction.map(FeatureExtractionMethod::code)),
            self.samples.len().to_string(),
        ])?;
        for sample in self.samples.values() {
            let mean = sample.mean_vector().unwrap_or_default();
            let record = [
                sample.subject_id.to_string(),
                sample.mean_count.to_string(),
                mean.len().to_string(),
            ]
            .into_iter()
            .chain(mean.iter().map(f64::to_string))
            .chain(sample.sample_files.iter().cloned());
            writer.write_record(record)?;
        }
        Ok(())
    }

    fn read_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self, CsvFormatError> {
        let mut records = reader.records();
        let header = records
            .next()
            .ok_or_else(|| CsvFormatError::malformed("missing header record"))??;
        let mut set = TrainingSet {
            preprocessing: parse_optional_method(header.get(0))?,
            feature_extraction: parse_optional_method(header.get(1))?,
            samples: BTreeMap::new(),
        };
        let count: usize = parse_field(header.get(2), "sample count")?;

        for record in records {
            let record = record?;
            let subject_id = parse_field(record.get(0), "subject id")?;
            let mean_count = parse_field(record.get(1), "mean count")?;
            let len: usize = parse_field(record.get(2), "vector length")?;
            let values = (3..3 + len)
                .map(|i| parse_field(record.get(i), "vector value"))
                .collect::<Result<Vec<f64>, _>>()?;
            let sample_files = record
                .iter()
                .skip(3 + len)
                .map(str::to_owned)
                .collect();
            set.insert(TrainingSample {
                subject_id,
                mean_vector: (len > 0).then_some(values),
                mean_count,
                sample_files,
            });
        }

        if set.samples.len() != count {
            return Err(CsvFormatError::malformed(format!(
                "header announces {count} samples, found {}",
                set.samples.len()
            )));
        }
        Ok(set)
    }
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, what: &str) -> Result<T, CsvFormatError> {
    let field = field.ok_or_else(|| CsvFormatError::malformed(format!("missing {what}")))?;
    field
        .parse()
        .map_err(|_| CsvFormatError::malformed(format!("invalid {what}: {field:?}")))
}

fn parse_optional_method<T: marf_core::Selector>(
    field: Option<&str>,
) -> Result<Option<T>, CsvFormatError> {
    match field {
        None | Some("") => Ok(None),
        Some(code) => {
            let code = parse_field(Some(code), "method code")?;
            T::from_code(code)
                .map(Some)
                .map_err(|e| CsvFormatError::malformed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use marf_core::DumpMode;

    use super::*;
    use crate::StorageManager;

    const PREP: PreprocessingMethod = PreprocessingMethod::Raw;
    const FE: FeatureExtractionMethod = FeatureExtractionMethod::MinMaxAmplitudes;

    #[test]
    fn test_running_mean() {
        let mut set = TrainingSet::new();
        assert!(set.add_feature_vector(&[1.0, 2.0], Some("a"), 1, PREP, FE));
        assert!(set.add_feature_vector(&[3.0, 4.0], Some("b"), 1, PREP, FE));
        assert!(set.add_feature_vector(&[5.0, 9.0], Some("c"), 1, PREP, FE));
        let sample = set.get(1).unwrap();
        assert_eq!(sample.mean_vector().unwrap(), [3.0, 5.0]);
        assert_eq!(sample.mean_count(), 3);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_same_file_is_not_added_twice() {
        let mut set = TrainingSet::new();
        assert!(set.add_feature_vector(&[1.0], Some("a.wav"), 4, PREP, FE));
        assert!(!set.add_feature_vector(&[9.0], Some("a.wav"), 4, PREP, FE));
        assert!(set.add_feature_vector(&[9.0], Some("a.wav"), 5, PREP, FE));
        assert_eq!(set.get(4).unwrap().mean_vector().unwrap(), [1.0]);
        assert!(set.add_feature_vector(&[3.0], None, 4, PREP, FE));
        assert!(set.add_feature_vector(&[3.0], None, 4, PREP, FE));
        assert_eq!(set.get(4).unwrap().mean_count(), 3);
    }

    #[test]
    fn test_methods_are_recorded() {
        let mut set = TrainingSet::new();
        assert!(set.is_produced_by(PreprocessingMethod::Dummy, FeatureExtractionMethod::Fft));
        set.add_feature_vector(&[1.0], None, 1, PREP, FE);
        assert!(set.is_produced_by(PREP, FE));
        assert!(!set.is_produced_by(PreprocessingMethod::Dummy, FE));
        assert!(!set.is_produced_by(PREP, FeatureExtractionMethod::Fft));
        assert_eq!(set.vector_len(), Some(1));
    }

    #[test]
    fn test_binary_modes_keep_samples_and_methods() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = TrainingSet::new();
        set.add_feature_vector(&[1.0, 2.0, 3.0], Some("a.wav"), 1, PREP, FE);
        set.add_feature_vector(&[3.0, 2.0, 1.0], Some("b.wav"), 1, PREP, FE);
        set.add_feature_vector(&[0.0, 0.5, 0.0], None, 7, PREP, FE);
        for mode in [DumpMode::GzipBinary, DumpMode::Binary] {
            let storage = StorageManager::new(dir.path().join(mode.extension()), mode);
            storage.dump(&set).unwrap();

            let restored = storage.restore::<TrainingSet>().unwrap();
            assert_eq!(restored, set);
            assert_eq!(restored.preprocessing(), Some(PREP));
            assert_eq!(restored.feature_extraction(), Some(FE));
            assert_eq!(restored.get(1).unwrap().mean_vector().unwrap(), [2.0, 2.0, 2.0]);
        }
    }

    #[test]
    fn test_csv_keeps_samples_and_damage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("set.csv"), DumpMode::CsvText);
        let mut set = TrainingSet::new();
        set.add_feature_vector(&[0.5, -1.25], Some("one, two.wav"), 2, PREP, FE);
        set.add_feature_vector(&[1.5, 1.25], Some("three.wav"), 2, PREP, FE);
        set.insert(TrainingSample::new(9));
        storage.dump(&set).unwrap();

        let restored = storage.restore::<TrainingSet>().unwrap();
        assert_eq!(restored, set);
        assert_eq!(restored.get(9).unwrap().mean_vector(), None);
        assert!(restored.get(2).unwrap().was_trained_on("one, two.wav"));
    }

    #[test]
    fn test_csv_count_mismatch_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.csv");
        std::fs::write(&path, "107,306,2\n1,1,1,0.5\n").unwrap();
        let err = StorageManager::new(&path, DumpMode::CsvText)
            .restore::<TrainingSet>()
            .unwrap_err();
        assert!(err.to_string().contains("header announces 2 samples, found 1"));
    }
}
