use std::{fmt, io::Write};

use marf_core::{ClassificationMethod, ConfigurationKey, PipelineConfig, SubjectId};
use marf_stats::frequency::FrequencyTable;
use marf_storage::{CsvFormatError, Persist, ResultSet, StorageManager};
use serde::{Deserialize, Serialize};

use crate::{
    BestOf, Classification, ClassificationError, Phase, SharedFeatureExtraction,
    classification::ClassifierState, diff_distance,
};

/// Type name of the persisted Zipf's law statistics.
pub const ZIPF_LAW_TYPE_NAME: &str = "marf.Classification.Stochastic.ZipfLaw";

/// The statistics are not kept per subject, so the single result is reported under this id.
const ZIPF_SUBJECT_ID: SubjectId = 1;

/// Default number of report lines between column headers.
pub const DEFAULT_REPORT_PAGE_SIZE: usize = 100;

/// An observed symbol: a feature value (by bit pattern) or a word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Value(u64),
    Word(String),
}

impl Token {
    #[must_use]
    pub fn value(value: f64) -> Self {
        Self::Value(value.to_bits())
    }

    #[must_use]
    pub fn word(word: impl Into<String>) -> Self {
        Self::Word(word.into())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Word(word) => f.write_str(word),
        }
    }
}

/// Rank/frequency profile of everything observed so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZipfStatistics {
    table: FrequencyTable<Token>,
    word_lengths: Option<(usize, usize)>,
    dump_logarithm: bool,
}

impl ZipfStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(&self) -> &FrequencyTable<Token> {
        &self.table
    }

    /// Shortest and longest observed word, in characters. Feature values count as length 1.
    #[must_use]
    pub fn word_lengths(&self) -> Option<(usize, usize)> {
        self.word_lengths
    }

    #[must_use]
    pub fn dump_logarithm(&self) -> bool {
        self.dump_logarithm
    }

    /// Whether graph dumps write `log(rank),log(frequency)` instead of raw values.
    pub fn set_dump_logarithm(&mut self, dump_logarithm: bool) {
        self.dump_logarithm = dump_logarithm;
    }

    pub fn collect_values(&mut self, values: &[f64]) {
        if !values.is_empty() {
            self.track_word_length(1);
        }
        self.table.observe_all(values.iter().copied().map(Token::value));
        self.table.rank();
    }

    /// Counts the alphanumeric words of `text`.
    pub fn collect_text(&mut self, text: &str) {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            self.track_word_length(word.chars().count());
            self.table.observe(Token::word(word));
        }
        self.table.rank();
    }

    /// Relative frequencies in rank order.
    #[must_use]
    pub fn proportions(&self) -> Vec<f64> {
        self.table.proportions()
    }

    #[must_use]
    pub fn report(&self, page_size: usize) -> ZipfReport<'_> {
        ZipfReport {
            statistics: self,
            page_size: page_size.max(1),
        }
    }

    fn track_word_length(&mut self, len: usize) {
        self.word_lengths = Some(match self.word_lengths {
            Some((min, max)) => (min.min(len), max.max(len)),
            None => (len, len),
        });
    }
}

impl Persist for ZipfStatistics {
    const TYPE_NAME: &'static str = ZIPF_LAW_TYPE_NAME;

    /// Writes the rank/frequency graph. The graph cannot be read back.
    #[expect(clippy::cast_precision_loss)]
    fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), CsvFormatError> {
        if self.dump_logarithm {
            writer.write_record(["log(rank)", "log(frequency)"])?;
        } else {
            writer.write_record(["rank", "frequency"])?;
        }
        for entry in self.table.entries() {
            let (rank, frequency) = (entry.rank() as f64, entry.frequency() as f64);
            let (x, y) = if self.dump_logarithm {
                (rank.ln(), frequency.ln())
            } else {
                (rank, frequency)
            };
            writer.write_record([x.to_string(), y.to_string()])?;
        }
        Ok(())
    }
}

/// Human-readable rank/frequency table, see [`ZipfStatistics::report()`].
#[derive(Debug)]
pub struct ZipfReport<'a> {
    statistics: &'a ZipfStatistics,
    page_size: usize,
}

impl fmt::Display for ZipfReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = &self.statistics.table;
        writeln!(f, "f = Frequency, r = Rank")?;
        if let Some((min, max)) = self.statistics.word_lengths {
            writeln!(f, "Word lengths: {min}..{max}")?;
        }
        for (i, entry) in table.entries().iter().enumerate() {
            if i % self.page_size == 0 {
                writeln!(f)?;
                writeln!(f, "Columns: r, f, f*r, word")?;
            }
            let rank = entry.rank();
            let frequency = entry.frequency();
            let product = u64::try_from(rank).map_or(u64::MAX, |r| r.saturating_mul(frequency));
            writeln!(f, "{rank}\t{frequency}\t{product}\t{}", entry.key())?;
        }
        let max_frequency = table
            .entries()
            .first()
            .and_then(|e| usize::try_from(e.frequency()).ok())
            .unwrap_or(0);
        writeln!(f)?;
        writeln!(f, "Frequency of frequencies")?;
        writeln!(f, "f\tC(f,w)")?;
        for (i, count) in table
            .frequency_of_frequencies(max_frequency)
            .into_iter()
            .enumerate()
        {
            writeln!(f, "{}\t{count}", i + 1)?;
        }
        Ok(())
    }
}

/// Classification by comparing rank/frequency profiles.
///
/// Training accumulates the profile of every trained vector in one persisted
/// [`ZipfStatistics`] per configuration key. Classification profiles the incoming vector
/// alone and scores it against the trained profile with [`diff_distance()`], aligning both
/// by rank rather than by symbol.
///
/// [`dump()`](Classification::dump) and [`restore()`](Classification::restore) target the
/// statistics of the last vector length used, or the one given to
/// [`set_feature_count()`](Self::set_feature_count). Text statistics use length 0.
#[derive(Debug)]
pub struct ZipfLaw {
    state: ClassifierState,
    statistics: ZipfStatistics,
    feature_count: Option<usize>,
}

impl ZipfLaw {
    #[must_use]
    pub fn new(config: PipelineConfig, feature_extraction: Option<SharedFeatureExtraction>) -> Self {
        Self {
            state: ClassifierState::new(config, feature_extraction),
            statistics: ZipfStatistics::new(),
            feature_count: None,
        }
    }

    /// Selects which persisted statistics [`dump()`](Classification::dump) and
    /// [`restore()`](Classification::restore) act on.
    pub fn set_feature_count(&mut self, feature_count: usize) {
        self.feature_count = Some(feature_count);
    }

    /// Statistics of the last training or classification pass.
    #[must_use]
    pub fn statistics(&self) -> &ZipfStatistics {
        &self.statistics
    }

    /// Trains on the words of `text` instead of a feature vector.
    pub fn train_text(&mut self, text: &str) -> Result<bool, ClassificationError> {
        self.train_with(0, |statistics| statistics.collect_text(text))
    }

    pub fn classify_text(&mut self, text: &str) -> Result<bool, ClassificationError> {
        self.classify_with(0, |statistics| statistics.collect_text(text))
    }

    fn storage(&self, feature_count: usize) -> StorageManager {
        let config = &self.state.config;
        let key = ConfigurationKey::training_set(config, feature_count)
            .with_type_name(ZIPF_LAW_TYPE_NAME);
        StorageManager::for_key(&key).dump_on_not_found(config.dump_on_not_found)
    }

    fn train_with<F>(&mut self, feature_count: usize, collect: F) -> Result<bool, ClassificationError>
    where
        F: FnOnce(&mut ZipfStatistics),
    {
        self.feature_count = Some(feature_count);
        let storage = self.storage(feature_count);
        let mut statistics = storage
            .restore::<ZipfStatistics>()
            .map_err(ClassificationError::storage(Phase::RestoringTrainingSet))?;
        collect(&mut statistics);
        statistics.set_dump_logarithm(self.state.config.params.zipf_dump_logarithm);
        storage
            .dump(&statistics)
            .map_err(ClassificationError::storage(Phase::DumpingStatistics))?;
        log::debug!(
            "Zipf statistics now hold {} distinct symbols",
            statistics.table.len()
        );
        self.statistics = statistics;
        Ok(true)
    }

    fn classify_with<F>(
        &mut self,
        feature_count: usize,
        collect: F,
    ) -> Result<bool, ClassificationError>
    where
        F: FnOnce(&mut ZipfStatistics),
    {
        self.feature_count = Some(feature_count);
        self.state.results.clear();
        let mut unseen = ZipfStatistics::new();
        collect(&mut unseen);
        let unseen = unseen.proportions();

        self.statistics = self
            .storage(feature_count)
            .restore::<ZipfStatistics>()
            .map_err(ClassificationError::storage(Phase::RestoringTrainingSet))?;
        if self.statistics.table.is_empty() {
            log::warn!("no Zipf statistics were trained for this configuration");
            return Ok(false);
        }
        let params = &self.state.config.params;
        let distance = diff_distance(
            &self.statistics.proportions(),
            &unseen,
            params.diff_epsilon,
            params.diff_penalty,
        );
        self.state.results.add_result(ZIPF_SUBJECT_ID, distance);
        Ok(true)
    }
}

impl Classification for ZipfLaw {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::ZipfLaw
    }

    fn config(&self) -> &PipelineConfig {
        &self.state.config
    }

    fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.state.config
    }

    fn train(&mut self, vector: &[f64]) -> Result<bool, ClassificationError> {
        self.train_with(vector.len(), |statistics| statistics.collect_values(vector))
    }

    fn classify(&mut self, vector: &[f64]) -> Result<bool, ClassificationError> {
        self.classify_with(vector.len(), |statistics| statistics.collect_values(vector))
    }

    fn dump(&mut self) -> Result<(), ClassificationError> {
        let Some(feature_count) = self.feature_count else {
            return Ok(());
        };
        self.statistics.set_dump_logarithm(self.state.config.params.zipf_dump_logarithm);
        self.storage(feature_count)
            .dump(&self.statistics)
            .map_err(ClassificationError::storage(Phase::DumpingStatistics))
    }

    fn restore(&mut self) -> Result<(), ClassificationError> {
        let Some(feature_count) = self.feature_count else {
            log::debug!("no Zipf statistics selected, nothing to restore");
            return Ok(());
        };
        self.statistics = self
            .storage(feature_count)
            .restore()
            .map_err(ClassificationError::storage(Phase::RestoringTrainingSet))?;
        Ok(())
    }

    fn result_set(&self) -> &ResultSet {
        &self.state.results
    }

    fn best_of(&self) -> BestOf {
        BestOf::Maximum
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
    use tempfile::TempDir;

    use super::*;

    fn config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            filename_prefix: format!("{}/", dir.path().display()),
            dump_mode: DumpMode::Binary,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_profiles_are_aligned_by_rank() {
        let dir = tempfile::tempdir().unwrap();
        let mut zipf = ZipfLaw::new(config(&dir), None);
        assert!(zipf.train(&[1.0, 1.0, 2.0]).unwrap());

        // other symbols, same shape: only the first pair is compared and it matches
        assert!(zipf.classify(&[5.0, 6.0, 5.0]).unwrap());
        let result = zipf.result().unwrap();
        assert_eq!(result.subject_id(), 1);
        assert!((result.outcome() + 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_training_accumulates_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        ZipfLaw::new(config(&dir), None).train(&[1.0, 2.0]).unwrap();
        let mut zipf = ZipfLaw::new(config(&dir), None);
        zipf.train(&[1.0, 3.0]).unwrap();
        let table = zipf.statistics().table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&Token::value(1.0)).unwrap().frequency(), 2);
        assert_eq!(table.entries()[0].rank(), 1);
    }

    #[test]
    fn test_classify_without_training() {
        let dir = tempfile::tempdir().unwrap();
        let mut zipf = ZipfLaw::new(config(&dir), None);
        assert!(!zipf.classify(&[1.0]).unwrap());
        assert!(zipf.result().is_none());
    }

    #[test]
    fn test_text_statistics_and_report() {
        let mut statistics = ZipfStatistics::new();
        statistics.collect_text("the cat, the hat; a bat");
        assert_eq!(statistics.word_lengths(), Some((1, 3)));
        assert_eq!(statistics.table().entries()[0].key(), &Token::word("the"));

        let report = statistics.report(DEFAULT_REPORT_PAGE_SIZE).to_string();
        assert!(report.starts_with("f = Frequency, r = Rank\n"));
        assert!(report.contains("1\t2\t2\tthe\n"));
        assert!(report.contains("Frequency of frequencies\nf\tC(f,w)\n1\t4\n2\t1\n"));
    }

    #[test]
    fn test_report_pages() {
        let mut statistics = ZipfStatistics::new();
        statistics.collect_values(&[1.0, 2.0, 3.0]);
        let report = statistics.report(2).to_string();
        assert_eq!(report.matches("Columns: r, f, f*r, word").count(), 2);
    }

    #[test]
    fn test_text_training_uses_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut zipf = ZipfLaw::new(config(&dir), None);
        zipf.train_text("to be or not to be").unwrap();
        assert!(zipf.classify_text("to be").unwrap());
        assert!(!zipf.classify(&[1.0, 2.0]).unwrap());
    }

    #[test]
    fn test_logarithmic_graph_dump() {
        let mut statistics = ZipfStatistics::new();
        statistics.collect_values(&[7.0, 7.0, 8.0]);
        statistics.set_dump_logarithm(true);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        statistics.write_csv(&mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let ln2 = 2_f64.ln();
        assert_eq!(
            text,
            format!("log(rank),log(frequency)\n0,{ln2}\n{ln2},0\n")
        );
    }

    #[test]
    fn test_restore_in_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        ZipfLaw::new(config(&dir), None).train(&[1.0, 1.0, 2.0]).unwrap();

        let mut zipf = ZipfLaw::new(config(&dir), None);
        zipf.restore().unwrap();
        assert!(zipf.statistics().table().is_empty());

        zipf.set_feature_count(3);
        zipf.restore().unwrap();
        assert_eq!(zipf.statistics().table().len(), 2);

        // other lengths live in other files
        zipf.set_feature_count(4);
        zipf.restore().unwrap();
        assert!(zipf.statistics().table().is_empty());
    }

    #[test]
    fn test_dump_writes_the_current_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let mut zipf = ZipfLaw::new(config(&dir), None);
        zipf.train(&[1.0, 2.0]).unwrap();
        zipf.statistics.collect_values(&[3.0, 4.0]);
        zipf.dump().unwrap();

        let mut other = ZipfLaw::new(config(&dir), None);
        other.set_feature_count(2);
        other.restore().unwrap();
        assert_eq!(other.statistics().table().len(), 4);
    }

    #[test]
    fn test_csv_graph_cannot_be_restored() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            dump_mode: DumpMode::CsvText,
            ..config(&dir)
        };
        let mut zipf = ZipfLaw::new(config, None);
        zipf.train(&[1.0]).unwrap();
        let err = zipf.train(&[1.0]).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::RestoringTrainingSet));
    }
}
