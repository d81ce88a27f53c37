use std::fmt;

use marf_core::{FeatureExtractionMethod, UnknownSelectorError};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum FeatureExtractionError {
    #[display("No feature extraction modules defined for aggregation.")]
    NoModules,
    #[display(
        "Malformed module parameters collection: {message} (expected pairs of a method selector and a parameter list)"
    )]
    MalformedParams { message: String },
    #[display("{source}")]
    UnknownSelector { source: UnknownSelectorError },
    #[display("Unknown feature extraction method: {method}")]
    UnknownMethod { method: FeatureExtractionMethod },
    #[display("There were errors in one or more aggregated modules: {}", ModuleFailures(failures))]
    ModulesFailed { failures: Vec<ModuleFailure> },
    #[display("There were no features extracted!")]
    NoFeatures,
    #[display("{method} has no sample data to extract features from")]
    EmptySample { method: FeatureExtractionMethod },
    #[display("invalid parameter for {method}: {message}")]
    InvalidParam {
        method: FeatureExtractionMethod,
        message: String,
    },
    /// Failure reported by an application-provided extractor.
    #[display("{method} failed: {message}")]
    Failed {
        method: FeatureExtractionMethod,
        message: String,
    },
}

impl From<UnknownSelectorError> for FeatureExtractionError {
    fn from(source: UnknownSelectorError) -> Self {
        Self::UnknownSelector { source }
    }
}

/// A captured failure of one aggregated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    /// Position of the module in the configured list.
    pub index: usize,
    pub method: FeatureExtractionMethod,
    pub message: String,
}

impl fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.index, self.method, self.message)
    }
}

struct ModuleFailures<'a>(&'a [ModuleFailure]);

impl fmt::Display for ModuleFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        f.write_str("]")
    }
}
