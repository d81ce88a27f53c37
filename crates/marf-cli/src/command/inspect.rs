use std::path::PathBuf;

use anyhow::Context as _;
use marf_classification::{DEFAULT_REPORT_PAGE_SIZE, ZIPF_LAW_TYPE_NAME, ZipfStatistics};
use marf_core::{
    ConfigurationKey, FeatureExtractionMethod, PipelineConfig, PreprocessingMethod, SubjectId,
};
use marf_storage::{StorageManager, TrainingSet};
use serde::Serialize;

use crate::util::{Output, PipelineArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    #[clap(flatten)]
    pipeline: PipelineArg,
    /// Length of the stored feature vectors (0 for text statistics)
    #[arg(long)]
    feature_count: usize,
    /// Print the Zipf's law rank/frequency report instead of the training set
    #[arg(long)]
    zipf: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TrainingSetSummary {
    file: String,
    preprocessing: Option<PreprocessingMethod>,
    feature_extraction: Option<FeatureExtractionMethod>,
    subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Serialize)]
struct SubjectSummary {
    subject_id: SubjectId,
    mean_count: u64,
    vector_len: usize,
    sample_files: Vec<String>,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let config = arg.pipeline.load()?;
    if arg.zipf {
        inspect_zipf(&config, arg.feature_count, arg.output.clone())
    } else {
        inspect_training_set(&config, arg.feature_count, arg.output.clone())
    }
}

fn inspect_training_set(
    config: &PipelineConfig,
    feature_count: usize,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let key = ConfigurationKey::training_set(config, feature_count);
    let set = StorageManager::for_key(&key)
        .dump_on_not_found(false)
        .restore::<TrainingSet>()
        .with_context(|| format!("Failed to restore training set {key}"))?;
    let summary = TrainingSetSummary {
        file: key.file_name(),
        preprocessing: set.preprocessing(),
        feature_extraction: set.feature_extraction(),
        subjects: set
            .samples()
            .map(|sample| SubjectSummary {
                subject_id: sample.subject_id(),
                mean_count: sample.mean_count(),
                vector_len: sample.mean_vector().map_or(0, <[f64]>::len),
                sample_files: sample.sample_files().to_vec(),
            })
            .collect(),
    };
    Output::save_json(&summary, output)
}

fn inspect_zipf(
    config: &PipelineConfig,
    feature_count: usize,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let key =
        ConfigurationKey::training_set(config, feature_count).with_type_name(ZIPF_LAW_TYPE_NAME);
    let statistics = StorageManager::for_key(&key)
        .dump_on_not_found(false)
        .restore::<ZipfStatistics>()
        .with_context(|| format!("Failed to restore Zipf statistics {key}"))?;
    let report = statistics.report(DEFAULT_REPORT_PAGE_SIZE).to_string();
    Output::from_output_path(output)?.write_text(&report)
}
