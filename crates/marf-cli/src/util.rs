use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use marf_classification::{SharedFeatureExtraction, share_feature_extraction};
use marf_core::{
    ClassificationMethod, DumpMode, FeatureExtractionMethod, PipelineConfig, PreprocessingMethod,
};
use marf_feature::{FeatureExtractionRegistry, RawSampleTemplate};

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        self.finish_line()
    }

    pub fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        write!(self, "{text}")
            .with_context(|| format!("Failed to write to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    fn finish_line(&mut self) -> anyhow::Result<()> {
        writeln!(&mut *self)
            .with_context(|| format!("Failed to write newline to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Pipeline settings shared by every subcommand.
///
/// Options given on the command line override the configuration file.
#[derive(Debug, Default, Clone, clap::Args)]
pub(crate) struct PipelineArg {
    /// TOML pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Prefix of every persisted file name (may contain a directory)
    #[arg(long)]
    prefix: Option<String>,
    /// Preprocessing method the samples went through (name or code)
    #[arg(long)]
    preprocessing: Option<PreprocessingMethod>,
    /// Feature extraction method (name or code)
    #[arg(long)]
    feature_extraction: Option<FeatureExtractionMethod>,
    /// Classification method (name or code)
    #[arg(long)]
    classification: Option<ClassificationMethod>,
    /// Storage format: gzip_binary, csv_text or binary
    #[arg(long)]
    dump_mode: Option<DumpMode>,
}

impl PipelineArg {
    pub(crate) fn load(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path).with_context(|| {
                format!("Failed to load pipeline configuration {}", path.display())
            })?,
            None => PipelineConfig::default(),
        };
        if let Some(prefix) = &self.prefix {
            config.filename_prefix.clone_from(prefix);
        }
        if let Some(preprocessing) = self.preprocessing {
            config.preprocessing = preprocessing;
        }
        if let Some(feature_extraction) = self.feature_extraction {
            config.feature_extraction = feature_extraction;
        }
        if let Some(classification) = self.classification {
            config.classification = classification;
        }
        if let Some(dump_mode) = self.dump_mode {
            config.dump_mode = dump_mode;
        }
        log::debug!("pipeline configuration: {config:?}");
        Ok(config)
    }
}

/// Reads a sample stored as numbers separated by whitespace or commas.
pub fn read_sample_file<P>(path: P) -> anyhow::Result<Vec<f64>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample file: {}", path.display()))?;
    let sample = parse_sample(&text)
        .with_context(|| format!("Failed to parse sample file: {}", path.display()))?;
    if sample.is_empty() {
        bail!("Sample file is empty: {}", path.display());
    }
    Ok(sample)
}

fn parse_sample(text: &str) -> anyhow::Result<Vec<f64>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("invalid number {token:?}"))
        })
        .collect()
}

/// Runs the configured feature extraction on `sample`.
pub fn extract_features(
    registry: &FeatureExtractionRegistry,
    config: &PipelineConfig,
    sample: Vec<f64>,
) -> anyhow::Result<SharedFeatureExtraction> {
    let template = RawSampleTemplate::shared(sample);
    let mut feature_extraction = registry
        .create(
            config.feature_extraction,
            &template,
            &config.feature_extraction_params,
        )
        .with_context(|| format!("Failed to create {} extraction", config.feature_extraction))?;
    let extracted = feature_extraction
        .extract_features()
        .with_context(|| format!("{} extraction failed", config.feature_extraction))?;
    if !extracted {
        bail!("{} extracted no features", config.feature_extraction);
    }
    Ok(share_feature_extraction(feature_extraction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample() {
        let sample = parse_sample("1, 2.5\n-3\t4e1,\n").unwrap();
        assert_eq!(sample, [1.0, 2.5, -3.0, 40.0]);
        assert!(parse_sample("1 two 3").is_err());
    }

    #[test]
    fn test_command_line_overrides_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, "classification = \"cosine\"\nfilename_prefix = \"a/\"\n").unwrap();
        let arg = PipelineArg {
            config: Some(path),
            prefix: Some("b/".to_owned()),
            feature_extraction: Some(FeatureExtractionMethod::Random),
            ..PipelineArg::default()
        };
        let config = arg.load().unwrap();
        assert_eq!(config.classification, ClassificationMethod::Cosine);
        assert_eq!(config.filename_prefix, "b/");
        assert_eq!(config.feature_extraction, FeatureExtractionMethod::Random);
    }

    #[test]
    fn test_extract_features_with_builtin() {
        let config = PipelineConfig {
            feature_extraction: FeatureExtractionMethod::MinMaxAmplitudes,
            ..PipelineConfig::default()
        };
        let registry = FeatureExtractionRegistry::with_builtins();
        let shared = extract_features(&registry, &config, vec![3.0, 1.0, 2.0]).unwrap();
        let features = shared.lock().unwrap().features().len();
        assert_eq!(features, 100);
    }
}
