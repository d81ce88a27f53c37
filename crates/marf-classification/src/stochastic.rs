use marf_core::{ClassificationMethod, PipelineConfig};
use marf_storage::ResultSet;

use crate::{
    BestOf, Classification, ClassificationError, Phase, SharedFeatureExtraction,
    classification::ClassifierState,
};

/// Generic stochastic and Markov classification.
///
/// Both can be selected but neither is implemented: training and classification always fail
/// with [`ClassificationError::NotImplemented`]. Probabilistic outcomes rank by maximum.
#[derive(Debug)]
pub struct Stochastic {
    method: ClassificationMethod,
    state: ClassifierState,
}

impl Stochastic {
    #[must_use]
    pub fn new(config: PipelineConfig, feature_extraction: Option<SharedFeatureExtraction>) -> Self {
        Self {
            method: ClassificationMethod::Stochastic,
            state: ClassifierState::new(config, feature_extraction),
        }
    }

    #[must_use]
    pub fn markov(config: PipelineConfig, feature_extraction: Option<SharedFeatureExtraction>) -> Self {
        Self {
            method: ClassificationMethod::Markov,
            state: ClassifierState::new(config, feature_extraction),
        }
    }

    fn not_implemented(&self, phase: Phase) -> ClassificationError {
        let what = match self.method {
            ClassificationMethod::Markov => "Markov classification",
            _ => "stochastic classification",
        };
        ClassificationError::NotImplemented { phase, what }
    }
}

impl Classification for Stochastic {
    fn method(&self) -> ClassificationMethod {
        self.method
    }

    fn config(&self) -> &PipelineConfig {
        &self.state.config
    }

    fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.state.config
    }

    fn train(&mut self, _vector: &[f64]) -> Result<bool, ClassificationError> {
        Err(self.not_implemented(Phase::Start))
    }

    fn classify(&mut self, _vector: &[f64]) -> Result<bool, ClassificationError> {
        self.state.results.clear();
        Err(self.not_implemented(Phase::Classifying))
    }

    fn dump(&mut self) -> Result<(), ClassificationError> {
        Ok(())
    }

    fn restore(&mut self) -> Result<(), ClassificationError> {
        Ok(())
    }

    fn result_set(&self) -> &ResultSet {
        &self.state.results
    }

    fn best_of(&self) -> BestOf {
        BestOf::Maximum
    }

    fn feature_extraction(&self) -> Option<&SharedFeatureExtraction> {
        self.state.feature_extraction.as_ref()
    }

    fn set_feature_extraction(&mut self, feature_extraction: Option<SharedFeatureExtraction>) {
        self.state.feature_extraction = feature_extraction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markov_is_not_implemented() {
        let mut markov = Stochastic::markov(PipelineConfig::default(), None);
        let err = markov.classify(&[1.0]).unwrap_err();
        assert_eq!(err.to_string(), "[classifying] Markov classification is not implemented");
        let err = markov.train(&[1.0]).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Start));
        assert!(markov.result().is_none());
    }
}
