use marf_core::{FeatureExtractionMethod, ModuleParams};

use crate::{BoxedPreprocessing, FeatureExtraction, FeatureExtractionError};

/// Smallest and largest amplitudes of a sample, in ascending order.
///
/// The feature vector always has `min_count + max_count` entries. A sample shorter than
/// that fills every slot with its median amplitude and then copies its lower half into the
/// leading slots and its upper half into the trailing ones.
#[derive(Debug)]
pub struct MinMaxAmplitudes {
    preprocessing: BoxedPreprocessing,
    min_count: usize,
    max_count: usize,
    features: Vec<f64>,
}

impl MinMaxAmplitudes {
    pub const DEFAULT_MIN_AMPLITUDES: usize = 50;
    pub const DEFAULT_MAX_AMPLITUDES: usize = 50;

    #[must_use]
    pub fn new(preprocessing: BoxedPreprocessing) -> Self {
        Self::with_counts(
            preprocessing,
            Self::DEFAULT_MIN_AMPLITUDES,
            Self::DEFAULT_MAX_AMPLITUDES,
        )
    }

    #[must_use]
    pub fn with_counts(preprocessing: BoxedPreprocessing, min_count: usize, max_count: usize) -> Self {
        Self {
            preprocessing,
            min_count,
            max_count,
            features: vec![],
        }
    }

    /// Reads optional `[min_count, max_count]` module parameters.
    pub fn from_params(
        preprocessing: BoxedPreprocessing,
        params: &ModuleParams,
    ) -> Result<Self, FeatureExtractionError> {
        let count = |index: usize, default: usize| match params.get(index) {
            None => Ok(default),
            Some(_) => params
                .int(index)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| FeatureExtractionError::InvalidParam {
                    method: FeatureExtractionMethod::MinMaxAmplitudes,
                    message: format!("parameter #{index} must be a non-negative integer"),
                }),
        };
        Ok(Self::with_counts(
            preprocessing,
            count(0, Self::DEFAULT_MIN_AMPLITUDES)?,
            count(1, Self::DEFAULT_MAX_AMPLITUDES)?,
        ))
    }
}

impl FeatureExtraction for MinMaxAmplitudes {
    fn method(&self) -> FeatureExtractionMethod {
        FeatureExtractionMethod::MinMaxAmplitudes
    }

    fn extract_features(&mut self) -> Result<bool, FeatureExtractionError> {
        let sample = self.preprocessing.preprocess()?;
        self.features = min_max_amplitudes(sample, self.min_count, self.max_count)?;
        Ok(!self.features.is_empty())
    }

    fn extract_features_from(&mut self, sample: &[f64]) -> Result<bool, FeatureExtractionError> {
        self.features = min_max_amplitudes(sample, self.min_count, self.max_count)?;
        Ok(!self.features.is_empty())
    }

    fn features(&self) -> &[f64] {
        &self.features
    }
}

fn min_max_amplitudes(
    sample: &[f64],
    mut min_count: usize,
    mut max_count: usize,
) -> Result<Vec<f64>, FeatureExtractionError> {
    if sample.is_empty() {
        return Err(FeatureExtractionError::EmptySample {
            method: FeatureExtractionMethod::MinMaxAmplitudes,
        });
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    let total = min_count + max_count;
    let len = sorted.len();
    let mut features = vec![0.0; total];
    if len < total {
        features.fill(sorted[len / 2]);
        min_count = len / 2;
        max_count = len - min_count;
    }
    features[..min_count].copy_from_slice(&sorted[..min_count]);
    features[total - max_count..].copy_from_slice(&sorted[len - max_count..]);
    Ok(features)
}

#[cfg(test)]
mod tests {
    use crate::RawPreprocessing;

    use super::*;

    #[test]
    fn test_long_sample_keeps_extremes() {
        let sample = (1..=200).rev().map(f64::from).collect::<Vec<_>>();
        let mut fe = MinMaxAmplitudes::new(RawPreprocessing::boxed(sample));
        assert!(fe.extract_features().unwrap());
        let features = fe.features();
        assert_eq!(features.len(), 100);
        assert_eq!(features[0], 1.0);
        assert_eq!(features[49], 50.0);
        assert_eq!(features[50], 151.0);
        assert_eq!(features[99], 200.0);
    }

    #[test]
    fn test_short_sample_is_padded_with_median() {
        let mut fe = MinMaxAmplitudes::new(RawPreprocessing::boxed(vec![]));
        assert!(fe.extract_features_from(&[5.0, 1.0, 3.0]).unwrap());
        let features = fe.features();
        assert_eq!(features.len(), 100);
        assert_eq!(features[0], 1.0);
        assert!(features[1..98].iter().all(|&f| f == 3.0));
        assert_eq!(&features[98..], [3.0, 5.0]);
    }

    #[test]
    fn test_counts_from_params() {
        let params = ModuleParams::new().with(2).with(2);
        let mut fe =
            MinMaxAmplitudes::from_params(RawPreprocessing::boxed(vec![4.0, 1.0, 3.0, 2.0, 5.0]), &params)
                .unwrap();
        fe.extract_features().unwrap();
        assert_eq!(fe.features(), [1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_invalid_count_param() {
        let params = ModuleParams::new().with(-1);
        let err = MinMaxAmplitudes::from_params(RawPreprocessing::boxed(vec![]), &params).unwrap_err();
        assert!(matches!(err, FeatureExtractionError::InvalidParam { .. }));
    }

    #[test]
    fn test_empty_sample_fails() {
        let mut fe = MinMaxAmplitudes::new(RawPreprocessing::boxed(vec![]));
        let err = fe.extract_features().unwrap_err();
        assert_eq!(
            err.to_string(),
            "min_max_amplitudes has no sample data to extract features from"
        );
    }
}
