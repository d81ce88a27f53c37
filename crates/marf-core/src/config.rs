use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    ClassificationMethod, DumpMode, FeatureExtractionMethod, ModuleParams, PreprocessingMethod,
    SampleFormat, SubjectId,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("failed to read configuration file {}: {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        source: io::Error,
    },
    #[display("failed to parse configuration: {source}")]
    Parse { source: toml::de::Error },
}

/// Comparison used by the Hamming distance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HammingMode {
    /// Positions differ unless exactly equal.
    StrictDouble,
    /// Positions differ when further apart than the configured tolerance.
    #[default]
    LenientDouble,
    /// Bit-level comparison of the IEEE representation. Not implemented.
    StrictBitwise,
}

/// Tunables of the individual classification algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationParams {
    /// Order `r` of the Minkowski distance.
    pub minkowski_r: f64,
    /// Tolerance below which the diff distance treats two values as equal.
    pub diff_epsilon: f64,
    /// Penalty added by the diff distance for each differing position.
    pub diff_penalty: f64,
    pub hamming_mode: HammingMode,
    pub hamming_epsilon: f64,
    /// Whether Zipf's law graph dumps use `log(rank),log(frequency)`.
    pub zipf_dump_logarithm: bool,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            minkowski_r: 3.0,
            diff_epsilon: 0.0001,
            diff_penalty: 1.0,
            hamming_mode: HammingMode::default(),
            hamming_epsilon: 0.01,
            zipf_dump_logarithm: true,
        }
    }
}

/// Explicit configuration context of a recognition pipeline.
///
/// Every classifier receives its own copy at construction time, and every persisted file
/// name is derived from it (see [`ConfigurationKey`](crate::ConfigurationKey)). Updating the
/// current subject between training calls is done through
/// [`with_subject()`](Self::with_subject) on the classifier's copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sample_format: SampleFormat,
    /// Identity of the application-provided loader when `sample_format` is custom.
    pub sample_loader: Option<String>,
    pub preprocessing: PreprocessingMethod,
    pub noise_removed: bool,
    pub silence_removed: bool,
    pub feature_extraction: FeatureExtractionMethod,
    /// Module list consumed by the feature extraction aggregator.
    pub feature_extraction_params: ModuleParams,
    pub classification: ClassificationMethod,
    /// Registered name resolved when `classification` is the plugin selector.
    pub classification_plugin: Option<String>,
    pub current_subject: SubjectId,
    /// Name of the sample the current vector came from; used to skip repeated training.
    pub sample_file: Option<String>,
    /// Prepended verbatim to every persisted file name (may contain a directory).
    pub filename_prefix: String,
    pub dump_mode: DumpMode,
    /// Whether restoring a missing file creates an empty one instead of failing.
    pub dump_on_not_found: bool,
    pub params: ClassificationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_format: SampleFormat::default(),
            sample_loader: None,
            preprocessing: PreprocessingMethod::default(),
            noise_removed: false,
            silence_removed: false,
            feature_extraction: FeatureExtractionMethod::default(),
            feature_extraction_params: ModuleParams::new(),
            classification: ClassificationMethod::default(),
            classification_plugin: None,
            current_subject: 0,
            sample_file: None,
            filename_prefix: String::new(),
            dump_mode: DumpMode::default(),
            dump_on_not_found: true,
            params: ClassificationParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from TOML text; absent keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// # use marf_core::{ClassificationMethod, DumpMode, PipelineConfig};
    /// let config = PipelineConfig::from_toml_str(
    ///     r#"
    ///     classification = "cosine"
    ///     dump_mode = 2
    ///     [params]
    ///     minkowski_r = 4.0
    ///     "#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.classification, ClassificationMethod::Cosine);
    /// assert_eq!(config.dump_mode, DumpMode::Binary);
    /// assert_eq!(config.params.minkowski_r, 4.0);
    /// assert_eq!(config.params.diff_penalty, 1.0);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { source })
    }

    pub fn from_toml_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns a copy targeting another subject and sample file.
    #[must_use]
    pub fn with_subject(mut self, subject: SubjectId, sample_file: Option<String>) -> Self {
        self.current_subject = subject;
        self.sample_file = sample_file;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.dump_mode, DumpMode::GzipBinary);
        assert!(config.dump_on_not_found);
        assert_eq!(config.params.minkowski_r, 3.0);
        assert_eq!(config.params.hamming_mode, HammingMode::LenientDouble);
    }

    #[test]
    fn test_selectors_accept_codes_in_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            preprocessing = 107
            feature_extraction = "min_max_amplitudes"
            classification = 504
            noise_removed = true
            feature_extraction_params = [306, [], "random", []]
            "#,
        )
        .unwrap();
        assert_eq!(config.preprocessing, PreprocessingMethod::Raw);
        assert_eq!(
            config.feature_extraction,
            FeatureExtractionMethod::MinMaxAmplitudes
        );
        assert_eq!(config.classification, ClassificationMethod::Chebyshev);
        assert!(config.noise_removed);
        assert_eq!(config.feature_extraction_params.len(), 4);
    }

    #[test]
    fn test_unknown_selector_is_a_parse_error() {
        let err = PipelineConfig::from_toml_str("classification = 42").unwrap_err();
        assert!(err.to_string().contains("Unknown classification method: 42"));
    }

    #[test]
    fn test_with_subject() {
        let config = PipelineConfig::default().with_subject(7, Some("a.wav".to_owned()));
        assert_eq!(config.current_subject, 7);
        assert_eq!(config.sample_file.as_deref(), Some("a.wav"));
    }
}
