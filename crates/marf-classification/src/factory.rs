use std::{collections::HashMap, fmt, sync::Arc};

use marf_core::{ClassificationMethod, PipelineConfig, Selector as _};

use crate::{
    BoxedClassification, BoxedScorer, Chebyshev, ClassificationError, ClusterClassification,
    Cosine, Diff, Euclidean, Hamming, Mahalanobis, Minkowski, RandomClassification,
    SharedFeatureExtraction, Stochastic, ZipfLaw,
};

/// Builds a classifier from its configuration and feature extraction.
pub type ClassificationConstructor = Arc<
    dyn Fn(
            PipelineConfig,
            Option<SharedFeatureExtraction>,
        ) -> Result<BoxedClassification, ClassificationError>
        + Send
        + Sync,
>;

/// Maps classification methods to classifier instances.
///
/// Every method except [`ClassificationMethod::Plugin`] and
/// [`ClassificationMethod::NeuralNetwork`] is built in. Plugins are registered by name and
/// selected through `PipelineConfig::classification_plugin`. The neural network lives
/// outside this crate and is looked up as the plugin named `"neural_network"`.
#[derive(Clone, Default)]
pub struct ClassificationFactory {
    plugins: HashMap<String, ClassificationConstructor>,
}

impl fmt::Debug for ClassificationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut plugins = self.plugins();
        plugins.sort_unstable();
        f.debug_struct("ClassificationFactory")
            .field("plugins", &plugins)
            .finish()
    }
}

impl ClassificationFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the plugin called `name`.
    pub fn register_plugin<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(
                PipelineConfig,
                Option<SharedFeatureExtraction>,
            ) -> Result<BoxedClassification, ClassificationError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        log::debug!("registering classification plugin {name}");
        self.plugins.insert(name, Arc::new(constructor));
        self
    }

    #[must_use]
    pub fn contains_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    #[must_use]
    pub fn plugins(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Creates the classifier selected by `config.classification`.
    pub fn create(
        &self,
        config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
    ) -> Result<BoxedClassification, ClassificationError> {
        self.create_method(config.classification, config, feature_extraction)
    }

    /// Creates the classifier for the numeric method `code`.
    pub fn create_from_code(
        &self,
        code: i64,
        config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
    ) -> Result<BoxedClassification, ClassificationError> {
        let method = ClassificationMethod::from_code(code)?;
        self.create_method(method, config, feature_extraction)
    }

    /// Creates the classifier for `method`, which overrides `config.classification`.
    pub fn create_method(
        &self,
        method: ClassificationMethod,
        mut config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
    ) -> Result<BoxedClassification, ClassificationError> {
        config.classification = method;
        let cluster = |scorer: BoxedScorer, config, feature_extraction| -> BoxedClassification {
            Box::new(ClusterClassification::new(scorer, config, feature_extraction))
        };
        let params = &config.params;
        let classification: BoxedClassification = match method {
            ClassificationMethod::Euclidean => {
                cluster(Box::new(Euclidean), config, feature_extraction)
            }
            ClassificationMethod::Chebyshev => {
                cluster(Box::new(Chebyshev), config, feature_extraction)
            }
            ClassificationMethod::Minkowski => {
                let scorer = Box::new(Minkowski::from_params(params));
                cluster(scorer, config, feature_extraction)
            }
            ClassificationMethod::Mahalanobis => {
                cluster(Box::new(Mahalanobis::new()), config, feature_extraction)
            }
            ClassificationMethod::Diff => {
                let scorer = Box::new(Diff::from_params(params));
                cluster(scorer, config, feature_extraction)
            }
            ClassificationMethod::Hamming => {
                let scorer = Box::new(Hamming::from_params(params));
                cluster(scorer, config, feature_extraction)
            }
            ClassificationMethod::Cosine => cluster(Box::new(Cosine), config, feature_extraction),
            ClassificationMethod::Stochastic => {
                Box::new(Stochastic::new(config, feature_extraction))
            }
            ClassificationMethod::Markov => Box::new(Stochastic::markov(config, feature_extraction)),
            ClassificationMethod::ZipfLaw => Box::new(ZipfLaw::new(config, feature_extraction)),
            ClassificationMethod::Random => {
                Box::new(RandomClassification::new(config, feature_extraction))
            }
            ClassificationMethod::NeuralNetwork => {
                return self.create_plugin(method.as_str(), config, feature_extraction);
            }
            ClassificationMethod::Plugin => {
                let name = config
                    .classification_plugin
                    .clone()
                    .ok_or(ClassificationError::MissingPlugin)?;
                return self.create_plugin(&name, config, feature_extraction);
            }
        };
        Ok(classification)
    }

    fn create_plugin(
        &self,
        name: &str,
        config: PipelineConfig,
        feature_extraction: Option<SharedFeatureExtraction>,
    ) -> Result<BoxedClassification, ClassificationError> {
        let constructor =
            self.plugins
                .get(name)
                .ok_or_else(|| ClassificationError::UnknownPlugin {
                    name: name.to_owned(),
                })?;
        constructor(config, feature_extraction)
    }
}
