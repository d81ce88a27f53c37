use marf_core::{FeatureExtractionMethod, ModuleParams};
use rand::{Rng as _, SeedableRng as _};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;

use crate::{BoxedPreprocessing, FeatureExtraction, FeatureExtractionError};

/// Baseline extractor projecting the sample onto fixed Gaussian weights.
///
/// The sample is cut into [`CHUNK_SIZE`](Self::CHUNK_SIZE) chunks (the last one zero-padded)
/// and every chunk is accumulated into the feature vector, position `i` weighted by a
/// standard normal draw from an RNG seeded with `i`. The output is deterministic and
/// carries little information, which makes it a lower bound for real extractors.
#[derive(Debug)]
pub struct RandomFeatureExtraction {
    preprocessing: BoxedPreprocessing,
    features: Vec<f64>,
}

impl RandomFeatureExtraction {
    pub const CHUNK_SIZE: usize = 256;

    #[must_use]
    pub fn new(preprocessing: BoxedPreprocessing) -> Self {
        Self {
            preprocessing,
            features: vec![],
        }
    }

    /// Takes no module parameters.
    pub fn from_params(
        preprocessing: BoxedPreprocessing,
        _params: &ModuleParams,
    ) -> Result<Self, FeatureExtractionError> {
        Ok(Self::new(preprocessing))
    }
}

impl FeatureExtraction for RandomFeatureExtraction {
    fn method(&self) -> FeatureExtractionMethod {
        FeatureExtractionMethod::Random
    }

    fn extract_features(&mut self) -> Result<bool, FeatureExtractionError> {
        let sample = self.preprocessing.preprocess()?;
        self.features = project(sample);
        Ok(true)
    }

    fn extract_features_from(&mut self, sample: &[f64]) -> Result<bool, FeatureExtractionError> {
        self.features = project(sample);
        Ok(true)
    }

    fn features(&self) -> &[f64] {
        &self.features
    }
}

fn weights() -> Vec<f64> {
    (0_u64..)
        .take(RandomFeatureExtraction::CHUNK_SIZE)
        .map(|seed| Pcg64::seed_from_u64(seed).sample::<f64, _>(StandardNormal))
        .collect()
}

fn project(sample: &[f64]) -> Vec<f64> {
    let weights = weights();
    let mut features = vec![0.0; RandomFeatureExtraction::CHUNK_SIZE];
    for chunk in sample.chunks(RandomFeatureExtraction::CHUNK_SIZE) {
        for ((feature, value), weight) in features.iter_mut().zip(chunk).zip(&weights) {
            *feature += value * weight;
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use crate::RawPreprocessing;

    use super::*;

    #[test]
    fn test_output_is_deterministic() {
        let sample = (0..600).map(|i| f64::from(i % 17)).collect::<Vec<_>>();
        let mut a = RandomFeatureExtraction::new(RawPreprocessing::boxed(sample.clone()));
        let mut b = RandomFeatureExtraction::new(RawPreprocessing::boxed(vec![]));
        a.extract_features().unwrap();
        b.extract_features_from(&sample).unwrap();
        assert_eq!(a.features().len(), RandomFeatureExtraction::CHUNK_SIZE);
        assert_eq!(a.features(), b.features());
    }

    #[test]
    fn test_chunks_accumulate() {
        let mut fe = RandomFeatureExtraction::new(RawPreprocessing::boxed(vec![1.0; 512]));
        fe.extract_features().unwrap();
        let weights = weights();
        for (feature, weight) in fe.features().iter().zip(&weights) {
            assert!((feature - 2.0 * weight).abs() < 1e-12);
        }
    }

    #[test]
    fn test_partial_chunk_is_zero_padded() {
        let mut fe = RandomFeatureExtraction::new(RawPreprocessing::boxed(vec![1.0; 3]));
        fe.extract_features().unwrap();
        assert!(fe.features()[3..].iter().all(|&f| f == 0.0));
        assert_ne!(fe.features()[0], 0.0);
    }
}
