use std::path::PathBuf;

use anyhow::Context as _;
use marf_classification::ClassificationFactory;
use marf_core::SubjectId;
use marf_feature::FeatureExtractionRegistry;
use serde::Serialize;

use crate::util::{self, Output, PipelineArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[clap(flatten)]
    pipeline: PipelineArg,
    /// Subject the samples belong to
    #[arg(long)]
    subject: SubjectId,
    /// Sample files of whitespace- or comma-separated numbers
    #[arg(required = true)]
    samples: Vec<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TrainedSample {
    sample: String,
    subject: SubjectId,
    /// `false` when the subject was already trained on this sample
    added: bool,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        pipeline,
        subject,
        samples,
        output,
    } = arg;
    let config = pipeline.load()?;
    let registry = FeatureExtractionRegistry::with_builtins();
    let mut classifier = ClassificationFactory::new()
        .create(config.clone(), None)
        .context("Failed to create classifier")?;

    let mut trained = Vec::with_capacity(samples.len());
    for path in samples {
        let sample_name = path.display().to_string();
        let sample = util::read_sample_file(path)?;
        let feature_extraction = util::extract_features(&registry, &config, sample)?;

        let sample_config = classifier
            .config()
            .clone()
            .with_subject(*subject, Some(sample_name.clone()));
        *classifier.config_mut() = sample_config;
        classifier.set_feature_extraction(Some(feature_extraction));
        let added = classifier
            .train_extracted()
            .with_context(|| format!("Failed to train subject {subject} on {sample_name}"))?;
        if added {
            log::info!("trained subject {subject} on {sample_name}");
        } else {
            log::info!("subject {subject} was already trained on {sample_name}");
        }
        trained.push(TrainedSample {
            sample: sample_name,
            subject: *subject,
            added,
        });
    }

    Output::save_json(&trained, output.clone())
}
