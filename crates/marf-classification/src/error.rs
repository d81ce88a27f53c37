use marf_core::{SubjectId, UnknownSelectorError};
use marf_feature::FeatureExtractionError;
use marf_storage::StorageError;

/// Step of training or classification at which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Phase {
    #[display("[start]")]
    Start,
    #[display("[dumping previous cluster]")]
    DumpingPreviousCluster,
    #[display("[restoring training set]")]
    RestoringTrainingSet,
    #[display("[adding feature vector]")]
    AddingFeatureVector,
    #[display("[dumping updated training set]")]
    DumpingUpdatedTrainingSet,
    #[display("[classifying]")]
    Classifying,
    #[display("[collecting statistics]")]
    CollectingStatistics,
    #[display("[dumping statistics]")]
    DumpingStatistics,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ClassificationError {
    #[display("{phase} {source}")]
    Storage { phase: Phase, source: StorageError },
    #[display("{phase} {source}")]
    FeatureExtraction {
        phase: Phase,
        source: FeatureExtractionError,
    },
    #[display("{phase} no feature extraction is attached to the classifier")]
    NoFeatureExtraction { phase: Phase },
    #[display(
        "{phase} feature vector has length {found} but subject {subject_id} has length {expected}"
    )]
    LengthMismatch {
        phase: Phase,
        subject_id: SubjectId,
        expected: usize,
        found: usize,
    },
    #[display("{phase} mean vector of subject {subject_id} is missing")]
    MissingMeanVector { phase: Phase, subject_id: SubjectId },
    #[display("{phase} {what} is not implemented")]
    NotImplemented { phase: Phase, what: &'static str },
    #[display("{source}")]
    UnknownMethod { source: UnknownSelectorError },
    #[display("Unknown classification plugin: {name}")]
    UnknownPlugin { name: String },
    #[display("No classification plugin is configured")]
    MissingPlugin,
}

impl ClassificationError {
    /// Phase tag of the error, if it arose inside training or classification.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Storage { phase, .. }
            | Self::FeatureExtraction { phase, .. }
            | Self::NoFeatureExtraction { phase }
            | Self::LengthMismatch { phase, .. }
            | Self::MissingMeanVector { phase, .. }
            | Self::NotImplemented { phase, .. } => Some(*phase),
            Self::UnknownMethod { .. } | Self::UnknownPlugin { .. } | Self::MissingPlugin => None,
        }
    }

    pub(crate) fn storage(phase: Phase) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Storage { phase, source }
    }
}

impl From<UnknownSelectorError> for ClassificationError {
    fn from(source: UnknownSelectorError) -> Self {
        Self::UnknownMethod { source }
    }
}
