//! Distance scorers. The best candidate is the one with the smallest distance.
//!
//! Some formulas deviate from their textbook namesakes and are kept that way because
//! persisted result magnitudes depend on them:
//!
//! - [`Euclidean`] returns the squared distance (no square root).
//! - [`Chebyshev`] sums absolute differences, i.e. it is the city-block distance.
//! - [`Mahalanobis`] uses an identity covariance matrix, which makes it the true
//!   Euclidean distance.

use std::cmp::Ordering;

use marf_core::{ClassificationMethod, ClassificationParams, HammingMode};

use crate::{BestOf, BoxedScorer, ClassificationError, Phase, Scorer};

/// Sum of squared differences.
#[derive(Debug, Default, Clone)]
pub struct Euclidean;

impl Scorer for Euclidean {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Euclidean
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        Ok(euclidean(mean, incoming))
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

/// Sum of absolute differences.
#[derive(Debug, Default, Clone)]
pub struct Chebyshev;

impl Scorer for Chebyshev {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Chebyshev
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        Ok(mean.iter().zip(incoming).map(|(a, b)| (a - b).abs()).sum())
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

/// `(Σ|a - b|^r)^(1/r)`.
#[derive(Debug, Clone)]
pub struct Minkowski {
    r: f64,
}

impl Default for Minkowski {
    fn default() -> Self {
        Self::new(Self::DEFAULT_R)
    }
}

impl Minkowski {
    pub const DEFAULT_R: f64 = 3.0;

    #[must_use]
    pub fn new(r: f64) -> Self {
        Self { r }
    }

    #[must_use]
    pub fn from_params(params: &ClassificationParams) -> Self {
        Self::new(params.minkowski_r)
    }

    #[must_use]
    pub fn r(&self) -> f64 {
        self.r
    }
}

impl Scorer for Minkowski {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Minkowski
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        let sum = mean
            .iter()
            .zip(incoming)
            .map(|(a, b)| (a - b).abs().powf(self.r))
            .sum::<f64>();
        Ok(sum.powf(1.0 / self.r))
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

/// `sqrt((a - b)ᵀ C⁻¹ (a - b))` with `C` the identity matrix.
///
/// The covariance matrix is never estimated from the training data.
#[derive(Debug, Default, Clone)]
pub struct Mahalanobis;

impl Mahalanobis {
    /// Builds the scorer, warning that it does not estimate a covariance matrix.
    #[must_use]
    pub fn new() -> Self {
        log::warn!(
            "Mahalanobis distance uses an identity covariance matrix and equals the Euclidean distance"
        );
        Self
    }
}

impl Scorer for Mahalanobis {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Mahalanobis
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        Ok(euclidean(mean, incoming).sqrt())
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

/// Penalizing position-wise difference; see [`diff_distance()`].
#[derive(Debug, Clone)]
pub struct Diff {
    epsilon: f64,
    penalty: f64,
}

impl Default for Diff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPSILON, Self::DEFAULT_PENALTY)
    }
}

impl Diff {
    pub const DEFAULT_EPSILON: f64 = 0.0001;
    pub const DEFAULT_PENALTY: f64 = 1.0;

    #[must_use]
    pub fn new(epsilon: f64, penalty: f64) -> Self {
        Self { epsilon, penalty }
    }

    #[must_use]
    pub fn from_params(params: &ClassificationParams) -> Self {
        Self::new(params.diff_epsilon, params.diff_penalty)
    }

    #[must_use]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        diff_distance(a, b, self.epsilon, self.penalty)
    }
}

impl Scorer for Diff {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Diff
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        Ok(self.distance(mean, incoming))
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

/// Number of positions that differ.
#[derive(Debug, Clone)]
pub struct Hamming {
    mode: HammingMode,
    epsilon: f64,
}

impl Default for Hamming {
    fn default() -> Self {
        Self::new(HammingMode::default(), Self::DEFAULT_EPSILON)
    }
}

impl Hamming {
    pub const DEFAULT_EPSILON: f64 = 0.01;

    #[must_use]
    pub fn new(mode: HammingMode, epsilon: f64) -> Self {
        Self { mode, epsilon }
    }

    #[must_use]
    pub fn from_params(params: &ClassificationParams) -> Self {
        Self::new(params.hamming_mode, params.hamming_epsilon)
    }

    #[must_use]
    pub fn mode(&self) -> HammingMode {
        self.mode
    }
}

impl Scorer for Hamming {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Hamming
    }

    fn best_of(&self) -> BestOf {
        BestOf::Minimum
    }

    #[expect(clippy::cast_precision_loss)]
    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        let pairs = mean.iter().zip(incoming);
        let mismatches = match self.mode {
            HammingMode::StrictDouble => pairs
                .filter(|(a, b)| (**a).partial_cmp(*b) != Some(Ordering::Equal))
                .count(),
            HammingMode::LenientDouble => pairs
                .filter(|(a, b)| (*a - *b).abs() > self.epsilon)
                .count(),
            HammingMode::StrictBitwise => {
                return Err(ClassificationError::NotImplemented {
                    phase: Phase::Classifying,
                    what: "bitwise Hamming distance",
                });
            }
        };
        Ok(mismatches as f64)
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| (a - b).powi(2)).sum()
}

/// Walks both vectors in step, adding `|a_i - b_j| + penalty` for every pair further apart
/// than `epsilon` and subtracting `epsilon` otherwise.
///
/// Once the shorter vector is exhausted its index stays on its last element. The walk stops
/// as soon as both indices sit on their last elements, so that final pair is never compared.
/// Vectors of length one (and empty vectors) have distance 0.
#[must_use]
pub fn diff_distance(a: &[f64], b: &[f64], epsilon: f64, penalty: f64) -> f64 {
    let (Some(last_a), Some(last_b)) = (a.len().checked_sub(1), b.len().checked_sub(1)) else {
        return 0.0;
    };
    let mut distance = 0.0;
    let (mut i, mut j) = (0, 0);
    while i != last_a || j != last_b {
        let diff = (a[i] - b[j]).abs();
        if diff > epsilon {
            distance += diff + penalty;
        } else {
            distance -= epsilon;
        }
        i = (i + 1).min(last_a);
        j = (j + 1).min(last_b);
    }
    distance
}
