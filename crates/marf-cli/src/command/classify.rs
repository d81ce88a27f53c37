use std::path::PathBuf;

use anyhow::Context as _;
use marf_classification::ClassificationFactory;
use marf_core::{ClassificationMethod, SubjectId};
use marf_feature::FeatureExtractionRegistry;
use marf_stats::descriptive::DescriptiveStats;
use marf_storage::ResultEntry;
use serde::Serialize;

use crate::util::{self, Output, PipelineArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ClassifyArg {
    #[clap(flatten)]
    pipeline: PipelineArg,
    /// Sample file of whitespace- or comma-separated numbers
    sample: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Candidate {
    subject_id: SubjectId,
    outcome: f64,
    description: String,
}

impl From<&ResultEntry> for Candidate {
    fn from(entry: &ResultEntry) -> Self {
        Self {
            subject_id: entry.subject_id(),
            outcome: entry.outcome(),
            description: entry.description().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassificationReport {
    sample: String,
    method: ClassificationMethod,
    result: Option<Candidate>,
    runner_up: Option<Candidate>,
    candidates: Vec<Candidate>,
    /// Spread of the candidate outcomes
    summary: Option<DescriptiveStats>,
}

pub(crate) fn run(arg: &ClassifyArg) -> anyhow::Result<()> {
    let ClassifyArg {
        pipeline,
        sample,
        output,
    } = arg;
    let config = pipeline.load()?;
    let registry = FeatureExtractionRegistry::with_builtins();
    let sample_name = sample.display().to_string();
    let values = util::read_sample_file(sample)?;
    let feature_extraction = util::extract_features(&registry, &config, values)?;

    let mut classifier = ClassificationFactory::new()
        .create(config, Some(feature_extraction))
        .context("Failed to create classifier")?;
    let classified = classifier
        .classify_extracted()
        .with_context(|| format!("Failed to classify {sample_name}"))?;
    if !classified {
        log::warn!("nothing is trained for this configuration");
    }

    let results = classifier.result_set();
    let report = ClassificationReport {
        sample: sample_name,
        method: classifier.method(),
        result: classifier.result().map(Candidate::from),
        runner_up: classifier.runner_up().map(Candidate::from),
        candidates: results.iter().map(Candidate::from).collect(),
        summary: DescriptiveStats::new(results.outcomes()),
    };
    Output::save_json(&report, output.clone())
}
