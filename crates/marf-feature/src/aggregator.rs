use std::{any::Any, sync::Arc, thread};

use marf_core::{FeatureExtractionMethod, ModuleParam, ModuleParams, Selector as _};

use crate::{
    FeatureExtraction, FeatureExtractionError, FeatureExtractionRegistry, ModuleFailure,
    RawSampleTemplate, SharedPreprocessingTemplate,
};

/// Runs several feature extractors concurrently and concatenates their outputs.
///
/// The module list alternates a method selector (numeric code or name) with the parameter
/// list handed to that module:
///
/// ```text
/// [ 301, [],  306, [10, 10],  "random", [] ]
///   └ fft ┘   └ min/max ──┘   └ random ─┘
/// ```
///
/// Every module gets its own preprocessing instance and runs on its own thread. The
/// aggregator waits for all of them, even after a failure, so that every failure is
/// reported. Outputs are concatenated in configuration order.
///
/// There is no timeout: a module that never returns blocks the aggregation.
#[derive(Debug, Clone)]
pub struct FeatureExtractionAggregator {
    registry: FeatureExtractionRegistry,
    template: SharedPreprocessingTemplate,
    params: ModuleParams,
    features: Vec<f64>,
}

impl FeatureExtractionAggregator {
    #[must_use]
    pub fn new(
        registry: FeatureExtractionRegistry,
        template: SharedPreprocessingTemplate,
        params: ModuleParams,
    ) -> Self {
        Self {
            registry,
            template,
            params,
            features: vec![],
        }
    }

    #[must_use]
    pub fn params(&self) -> &ModuleParams {
        &self.params
    }

    /// Parses the module list into `(method, params)` pairs.
    pub fn modules(&self) -> Result<Vec<(FeatureExtractionMethod, ModuleParams)>, FeatureExtractionError> {
        parse_modules(&self.params)
    }

    fn run(&mut self, template: &SharedPreprocessingTemplate) -> Result<bool, FeatureExtractionError> {
        self.features.clear();
        let modules = self
            .modules()?
            .into_iter()
            .map(|(method, params)| -> Result<_, FeatureExtractionError> {
                let module = self.registry.create(method, template, &params)?;
                Ok((method, module))
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("aggregating {} feature extraction modules", modules.len());

        let outcomes = thread::scope(|s| {
            let handles = modules
                .into_iter()
                .map(|(method, mut module)| {
                    let handle = s.spawn(move || -> Result<Vec<f64>, FeatureExtractionError> {
                        module.extract_features()?;
                        Ok(module.features().to_vec())
                    });
                    (method, handle)
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|(method, handle)| (method, handle.join()))
                .collect::<Vec<_>>()
        });

        let mut vectors = Vec::with_capacity(outcomes.len());
        let mut failures = vec![];
        for (index, (method, outcome)) in outcomes.into_iter().enumerate() {
            let message = match outcome {
                Ok(Ok(vector)) => {
                    vectors.push(vector);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            log::warn!("aggregated module #{index} ({method}) failed: {message}");
            failures.push(ModuleFailure {
                index,
                method,
                message,
            });
        }
        if !failures.is_empty() {
            return Err(FeatureExtractionError::ModulesFailed { failures });
        }

        let features = vectors.concat();
        if features.is_empty() {
            return Err(FeatureExtractionError::NoFeatures);
        }
        self.features = features;
        Ok(true)
    }
}

impl FeatureExtraction for FeatureExtractionAggregator {
    fn method(&self) -> FeatureExtractionMethod {
        FeatureExtractionMethod::Aggregator
    }

    fn extract_features(&mut self) -> Result<bool, FeatureExtractionError> {
        let template = Arc::clone(&self.template);
        self.run(&template)
    }

    fn extract_features_from(&mut self, sample: &[f64]) -> Result<bool, FeatureExtractionError> {
        self.run(&RawSampleTemplate::shared(sample))
    }

    fn features(&self) -> &[f64] {
        &self.features
    }
}

fn parse_modules(
    params: &ModuleParams,
) -> Result<Vec<(FeatureExtractionMethod, ModuleParams)>, FeatureExtractionError> {
    if params.is_empty() {
        return Err(FeatureExtractionError::NoModules);
    }
    if params.len() % 2 == 1 {
        return Err(FeatureExtractionError::MalformedParams {
            message: format!("odd number of entries ({})", params.len()),
        });
    }
    let entries = params.iter().collect::<Vec<_>>();
    entries
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| -> Result<_, FeatureExtractionError> {
            let method = match pair[0] {
                ModuleParam::Int(code) => FeatureExtractionMethod::from_code(*code)?,
                ModuleParam::Text(name) => FeatureExtractionMethod::parse_selector(name)?,
                other => {
                    return Err(FeatureExtractionError::MalformedParams {
                        message: format!("entry #{} is not a method selector: {other:?}", 2 * i),
                    });
                }
            };
            let ModuleParam::List(module_params) = pair[1] else {
                return Err(FeatureExtractionError::MalformedParams {
                    message: format!("entry #{} is not a parameter list: {:?}", 2 * i + 1, pair[1]),
                });
            };
            Ok((method, module_params.clone()))
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "module panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        BoxedFeatureExtraction, BoxedPreprocessing, PreprocessingTemplate as _,
        RandomFeatureExtraction,
    };

    use super::*;

    /// Emits its module parameters as features, or fails when asked to.
    #[derive(Debug)]
    struct Echo {
        method: FeatureExtractionMethod,
        params: ModuleParams,
        features: Vec<f64>,
    }

    impl FeatureExtraction for Echo {
        fn method(&self) -> FeatureExtractionMethod {
            self.method
        }

        fn extract_features(&mut self) -> Result<bool, FeatureExtractionError> {
            if self.params.get(0) == Some(&ModuleParam::Text("fail".to_owned())) {
                return Err(FeatureExtractionError::Failed {
                    method: self.method,
                    message: "broken module".to_owned(),
                });
            }
            if self.params.get(0) == Some(&ModuleParam::Text("panic".to_owned())) {
                panic!("module exploded");
            }
            self.features = (0..self.params.len())
                .filter_map(|i| self.params.float(i))
                .collect();
            Ok(!self.features.is_empty())
        }

        fn extract_features_from(&mut self, _sample: &[f64]) -> Result<bool, FeatureExtractionError> {
            self.extract_features()
        }

        fn features(&self) -> &[f64] {
            &self.features
        }
    }

    fn echo(
        method: FeatureExtractionMethod,
    ) -> impl Fn(BoxedPreprocessing, &ModuleParams) -> Result<BoxedFeatureExtraction, FeatureExtractionError>
    + Send
    + Sync
    + 'static {
        move |_: BoxedPreprocessing, params: &ModuleParams| -> Result<BoxedFeatureExtraction, FeatureExtractionError> {
            Ok(Box::new(Echo {
                method,
                params: params.clone(),
                features: vec![],
            }))
        }
    }

    fn registry() -> FeatureExtractionRegistry {
        let mut registry = FeatureExtractionRegistry::with_builtins();
        registry
            .register(FeatureExtractionMethod::Lpc, echo(FeatureExtractionMethod::Lpc))
            .register(FeatureExtractionMethod::Fft, echo(FeatureExtractionMethod::Fft))
            .register(FeatureExtractionMethod::F0, echo(FeatureExtractionMethod::F0));
        registry
    }

    fn list(values: &[f64]) -> ModuleParam {
        ModuleParam::List(values.iter().copied().map(ModuleParam::Float).collect())
    }

    fn aggregator(params: ModuleParams) -> FeatureExtractionAggregator {
        FeatureExtractionAggregator::new(registry(), RawSampleTemplate::shared(vec![1.0]), params)
    }

    #[test]
    fn test_outputs_are_concatenated_in_order() {
        let params = ModuleParams::new()
            .with(300)
            .with(list(&[1.0, 2.0]))
            .with("fft")
            .with(list(&[3.0, 4.0, 5.0]));
        let mut aggr = aggregator(params);
        assert!(aggr.extract_features().unwrap());
        assert_eq!(aggr.features(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_every_failure_is_reported() {
        let params = ModuleParams::new()
            .with(300)
            .with(list(&[1.0]))
            .with(301)
            .with(ModuleParam::List(ModuleParams::new().with("fail")))
            .with(302)
            .with(list(&[2.0]));
        let mut aggr = aggregator(params);
        let err = aggr.extract_features().unwrap_err();
        let FeatureExtractionError::ModulesFailed { failures } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].method, FeatureExtractionMethod::Fft);
        assert!(err.to_string().starts_with("There were errors in one or more aggregated modules: "));
        assert!(err.to_string().contains("broken module"));
        assert!(aggr.features().is_empty());
    }

    #[test]
    fn test_panicking_module_is_a_failure() {
        let params = ModuleParams::new()
            .with(300)
            .with(ModuleParam::List(ModuleParams::new().with("panic")))
            .with(302)
            .with(ModuleParam::List(ModuleParams::new().with("fail")));
        let err = aggregator(params).extract_features().unwrap_err();
        let FeatureExtractionError::ModulesFailed { failures } = err else {
            panic!("unexpected error");
        };
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].message, "module exploded");
    }

    #[test]
    fn test_empty_or_odd_module_list() {
        let err = aggregator(ModuleParams::new()).extract_features().unwrap_err();
        assert_eq!(err.to_string(), "No feature extraction modules defined for aggregation.");

        let err = aggregator(ModuleParams::new().with(300)).extract_features().unwrap_err();
        assert!(matches!(err, FeatureExtractionError::MalformedParams { .. }));

        let err = aggregator(ModuleParams::new().with(300).with(1))
            .extract_features()
            .unwrap_err();
        assert!(matches!(err, FeatureExtractionError::MalformedParams { .. }));
    }

    #[test]
    fn test_creation_errors_stop_before_any_work() {
        static CREATED: AtomicUsize = AtomicUsize::new(0);
        let mut registry = FeatureExtractionRegistry::empty();
        registry.register(FeatureExtractionMethod::Lpc, |_, params| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            echo(FeatureExtractionMethod::Lpc)(RawSampleTemplate::new(vec![]).instantiate(), params)
        });
        let params = ModuleParams::new()
            .with(300)
            .with(list(&[1.0]))
            .with(304)
            .with(list(&[2.0]));
        let mut aggr =
            FeatureExtractionAggregator::new(registry, RawSampleTemplate::shared(vec![]), params);
        let err = aggr.extract_features().unwrap_err();
        assert_eq!(err.to_string(), "Unknown feature extraction method: cepstral");
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
        assert!(aggr.features().is_empty());
    }

    #[test]
    fn test_no_features_is_an_error() {
        let params = ModuleParams::new()
            .with(300)
            .with(list(&[]))
            .with(301)
            .with(list(&[]));
        let err = aggregator(params).extract_features().unwrap_err();
        assert_eq!(err.to_string(), "There were no features extracted!");
    }

    #[test]
    fn test_supplied_sample_reaches_every_module() {
        let params = ModuleParams::new()
            .with("min_max_amplitudes")
            .with(ModuleParam::List(ModuleParams::new().with(1).with(1)))
            .with("random")
            .with(list(&[]));
        let mut aggr = FeatureExtractionAggregator::new(
            FeatureExtractionRegistry::with_builtins(),
            RawSampleTemplate::shared(vec![]),
            params,
        );
        assert!(aggr.extract_features_from(&[2.0, 9.0, 4.0]).unwrap());
        assert_eq!(aggr.features().len(), 2 + RandomFeatureExtraction::CHUNK_SIZE);
        assert_eq!(&aggr.features()[..2], [2.0, 9.0]);
    }

    #[test]
    fn test_failure_discards_previous_features() {
        let params = ModuleParams::new()
            .with("min_max_amplitudes")
            .with(ModuleParam::List(ModuleParams::new().with(1).with(1)));
        let mut aggr = FeatureExtractionAggregator::new(
            FeatureExtractionRegistry::with_builtins(),
            RawSampleTemplate::shared(vec![]),
            params,
        );
        aggr.extract_features_from(&[2.0, 9.0, 4.0]).unwrap();
        assert_eq!(aggr.features(), [2.0, 9.0]);

        let err = aggr.extract_features_from(&[]).unwrap_err();
        assert!(matches!(err, FeatureExtractionError::ModulesFailed { .. }));
        assert!(aggr.features().is_empty());
    }

    #[test]
    fn test_nested_aggregator() {
        let inner = ModuleParams::new().with(300).with(list(&[7.0]));
        let params = ModuleParams::new()
            .with("aggregator")
            .with(ModuleParam::List(inner))
            .with(301)
            .with(list(&[8.0]));
        let mut aggr = aggregator(params);
        aggr.extract_features().unwrap();
        assert_eq!(aggr.features(), [7.0, 8.0]);
    }
}
