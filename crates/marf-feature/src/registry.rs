use std::{collections::HashMap, fmt, sync::Arc};

use marf_core::{FeatureExtractionMethod, ModuleParams};

use crate::{
    BoxedFeatureExtraction, BoxedPreprocessing, FeatureExtractionAggregator,
    FeatureExtractionError, MinMaxAmplitudes, RandomFeatureExtraction,
    SharedPreprocessingTemplate,
};

/// Builds an extractor bound to a fresh preprocessing instance.
pub type FeatureExtractionConstructor = Arc<
    dyn Fn(BoxedPreprocessing, &ModuleParams) -> Result<BoxedFeatureExtraction, FeatureExtractionError>
        + Send
        + Sync,
>;

/// Maps feature extraction methods to their constructors.
///
/// Only the random and min/max amplitude extractors are built in; the application registers
/// its signal-processing extractors (LPC, FFT, F0, cepstral, segmentation) and plugins at
/// startup. [`FeatureExtractionMethod::Aggregator`] is always available and resolves its
/// modules through the registry that created it.
#[derive(Clone)]
pub struct FeatureExtractionRegistry {
    constructors: HashMap<FeatureExtractionMethod, FeatureExtractionConstructor>,
}

impl fmt::Debug for FeatureExtractionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.methods();
        methods.sort_by_key(|m| marf_core::Selector::code(*m));
        f.debug_struct("FeatureExtractionRegistry")
            .field("methods", &methods)
            .finish()
    }
}

impl Default for FeatureExtractionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FeatureExtractionRegistry {
    /// Creates a registry with no constructors besides the aggregator.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry
            .register(FeatureExtractionMethod::Random, |preprocessing, params| {
                Ok(Box::new(RandomFeatureExtraction::from_params(
                    preprocessing,
                    params,
                )?))
            })
            .register(
                FeatureExtractionMethod::MinMaxAmplitudes,
                |preprocessing, params| {
                    Ok(Box::new(MinMaxAmplitudes::from_params(
                        preprocessing,
                        params,
                    )?))
                },
            );
        registry
    }

    /// Registers (or replaces) the constructor of `method`.
    pub fn register<F>(&mut self, method: FeatureExtractionMethod, constructor: F) -> &mut Self
    where
        F: Fn(
                BoxedPreprocessing,
                &ModuleParams,
            ) -> Result<BoxedFeatureExtraction, FeatureExtractionError>
            + Send
            + Sync
            + 'static,
    {
        if method == FeatureExtractionMethod::Aggregator {
            log::warn!("the aggregator cannot be replaced, ignoring its registration");
            return self;
        }
        if self.constructors.insert(method, Arc::new(constructor)).is_some() {
            log::debug!("replaced feature extraction constructor for {method}");
        }
        self
    }

    #[must_use]
    pub fn contains(&self, method: FeatureExtractionMethod) -> bool {
        method == FeatureExtractionMethod::Aggregator || self.constructors.contains_key(&method)
    }

    /// Registered methods in no particular order, excluding the aggregator.
    #[must_use]
    pub fn methods(&self) -> Vec<FeatureExtractionMethod> {
        self.constructors.keys().copied().collect()
    }

    /// Creates the extractor for `method`, bound to a new instance from `template`.
    pub fn create(
        &self,
        method: FeatureExtractionMethod,
        template: &SharedPreprocessingTemplate,
        params: &ModuleParams,
    ) -> Result<BoxedFeatureExtraction, FeatureExtractionError> {
        if method == FeatureExtractionMethod::Aggregator {
            return Ok(Box::new(FeatureExtractionAggregator::new(
                self.clone(),
                Arc::clone(template),
                params.clone(),
            )));
        }
        let constructor = self
            .constructors
            .get(&method)
            .ok_or(FeatureExtractionError::UnknownMethod { method })?;
        constructor(template.instantiate(), params)
    }
}

#[cfg(test)]
mod tests {
    use crate::RawSampleTemplate;

    use super::*;

    #[test]
    fn test_builtins() {
        let registry = FeatureExtractionRegistry::with_builtins();
        assert!(registry.contains(FeatureExtractionMethod::Random));
        assert!(registry.contains(FeatureExtractionMethod::MinMaxAmplitudes));
        assert!(registry.contains(FeatureExtractionMethod::Aggregator));
        assert!(!registry.contains(FeatureExtractionMethod::Lpc));

        let template = RawSampleTemplate::shared(vec![3.0, 1.0, 2.0]);
        let mut fe = registry
            .create(
                FeatureExtractionMethod::MinMaxAmplitudes,
                &template,
                &ModuleParams::new().with(1).with(1),
            )
            .unwrap();
        fe.extract_features().unwrap();
        assert_eq!(fe.features(), [1.0, 3.0]);
    }

    #[test]
    fn test_unregistered_method() {
        let registry = FeatureExtractionRegistry::with_builtins();
        let template = RawSampleTemplate::shared(vec![1.0]);
        let err = registry
            .create(FeatureExtractionMethod::Lpc, &template, &ModuleParams::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown feature extraction method: lpc");
    }
}
