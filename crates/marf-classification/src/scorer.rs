use std::fmt;

use marf_core::ClassificationMethod;
use marf_storage::{ResultEntry, ResultSet};

use crate::ClassificationError;

/// Which outcome of a [`ResultSet`] counts as the best one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestOf {
    /// Distances: smaller is closer.
    Minimum,
    /// Similarities and probabilities: larger is closer.
    Maximum,
}

impl BestOf {
    #[must_use]
    pub fn select(self, results: &ResultSet) -> Option<&ResultEntry> {
        match self {
            Self::Minimum => results.minimum(),
            Self::Maximum => results.maximum(),
        }
    }

    #[must_use]
    pub fn runner_up(self, results: &ResultSet) -> Option<&ResultEntry> {
        match self {
            Self::Minimum => results.second_minimum(),
            Self::Maximum => results.second_maximum(),
        }
    }
}

/// Compares a stored mean vector with an incoming feature vector.
///
/// Implementations may assume both vectors have the same length; the classification loop
/// checks it before scoring.
pub trait Scorer: fmt::Debug + Send + Sync {
    fn method(&self) -> ClassificationMethod;
    fn best_of(&self) -> BestOf;
    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError>;
    fn clone_boxed(&self) -> BoxedScorer;
}

pub type BoxedScorer = Box<dyn Scorer>;

impl Clone for BoxedScorer {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}
