use marf_core::ClassificationMethod;

use crate::{BestOf, BoxedScorer, ClassificationError, Scorer};

/// Cosine of the angle between the two vectors; the best candidate is the most similar one.
///
/// A zero vector is similar to nothing: its similarity is 0.
#[derive(Debug, Default, Clone)]
pub struct Cosine;

impl Scorer for Cosine {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Cosine
    }

    fn best_of(&self) -> BestOf {
        BestOf::Maximum
    }

    fn score(&self, mean: &[f64], incoming: &[f64]) -> Result<f64, ClassificationError> {
        Ok(cosine_similarity(mean, incoming))
    }

    fn clone_boxed(&self) -> BoxedScorer {
        Box::new(self.clone())
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot = a.iter().zip(b).map(|(a, b)| a * b).sum::<f64>();
    let norm_a = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norms = norm_a * norm_b;
    if norms == 0.0 {
        log::warn!("cosine similarity of a zero vector, treating it as dissimilar");
        return 0.0;
    }
    dot / norms
}
