use std::{fmt, path::PathBuf};

use crate::{
    DumpMode, FeatureExtractionMethod, PipelineConfig, PreprocessingMethod, SampleFormat,
    Selector as _,
};

/// Type name under which mean-cluster training sets are persisted.
pub const TRAINING_SET_TYPE_NAME: &str = "marf.Storage.TrainingSet";

/// Cache identity of a persisted training set.
///
/// The key renders as a file name of the form
///
/// ```text
/// {prefix}{type}.{format}[-{loader}].{noise}.{silence}.{preprocessing}.{extraction}.{length}.{ext}
/// ```
///
/// where flags render as `0`/`1` and methods as their numeric codes. The layout is a
/// compatibility surface: previously trained files must keep resolving to the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationKey {
    prefix: String,
    type_name: String,
    sample_format: SampleFormat,
    sample_loader: Option<String>,
    noise_removed: bool,
    silence_removed: bool,
    preprocessing: PreprocessingMethod,
    feature_extraction: FeatureExtractionMethod,
    feature_count: usize,
    dump_mode: DumpMode,
}

impl ConfigurationKey {
    /// Derives the training-set key for `config` and vectors of `feature_count` elements.
    #[must_use]
    pub fn training_set(config: &PipelineConfig, feature_count: usize) -> Self {
        Self {
            prefix: config.filename_prefix.clone(),
            type_name: TRAINING_SET_TYPE_NAME.to_owned(),
            sample_format: config.sample_format,
            sample_loader: config.sample_loader.clone(),
            noise_removed: config.noise_removed,
            silence_removed: config.silence_removed,
            preprocessing: config.preprocessing,
            feature_extraction: config.feature_extraction,
            feature_count,
            dump_mode: config.dump_mode,
        }
    }

    /// Replaces the persisted type name, keeping every other component.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    #[must_use]
    pub fn preprocessing(&self) -> PreprocessingMethod {
        self.preprocessing
    }

    #[must_use]
    pub fn feature_extraction(&self) -> FeatureExtractionMethod {
        self.feature_extraction
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    #[must_use]
    pub fn dump_mode(&self) -> DumpMode {
        self.dump_mode
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.file_name())
    }
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{}",
            self.prefix,
            self.type_name,
            self.sample_format.code()
        )?;
        if self.sample_format == SampleFormat::Custom
            && let Some(loader) = &self.sample_loader
        {
            write!(f, "-{loader}")?;
        }
        write!(
            f,
            ".{}.{}.{}.{}.{}.{}",
            u8::from(self.noise_removed),
            u8::from(self.silence_removed),
            self.preprocessing.code(),
            self.feature_extraction.code(),
            self.feature_count,
            self.dump_mode.extension()
        )
    }
}
