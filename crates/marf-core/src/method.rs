//! Method selectors for each pipeline stage.
//!
//! Every selector has a stable numeric code (the value folded into persisted file names) and
//! a snake_case name (used in configuration files and on the command line). Both forms are
//! accepted when parsing.
//!
//! Human-readable formats serialize the name; binary formats serialize the code.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Common behaviour of the numeric-coded pipeline selectors.
pub trait Selector: Copy + Sized + 'static {
    /// Human-readable kind used in error messages (e.g. `"classification"`).
    const KIND: &'static str;

    /// Every selectable value, in code order.
    const ALL: &'static [Self];

    /// Numeric code of the selector.
    fn code(self) -> i32;

    /// Canonical snake_case name of the selector.
    fn as_str(self) -> &'static str;

    /// Additional names accepted when parsing.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    /// Looks up a selector by numeric code.
    fn from_code(code: i64) -> Result<Self, UnknownSelectorError> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| i64::from(s.code()) == code)
            .ok_or_else(|| UnknownSelectorError {
                kind: Self::KIND,
                value: code.to_string(),
            })
    }

    /// Looks up a selector by name, alias or numeric code.
    fn parse_selector(s: &str) -> Result<Self, UnknownSelectorError> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        let normalized = s.replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|sel| {
                sel.as_str() == normalized || sel.aliases().iter().any(|alias| *alias == normalized)
            })
            .ok_or_else(|| UnknownSelectorError {
                kind: Self::KIND,
                value: s.to_owned(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Unknown {kind} method: {value}")]
pub struct UnknownSelectorError {
    kind: &'static str,
    value: String,
}

impl UnknownSelectorError {
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Raw form a selector takes in configuration files: a code or a name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SelectorRepr {
    Code(i64),
    Name(String),
}

impl SelectorRepr {
    pub(crate) fn resolve<T: Selector>(self) -> Result<T, UnknownSelectorError> {
        match self {
            SelectorRepr::Code(code) => T::from_code(code),
            SelectorRepr::Name(name) => T::parse_selector(&name),
        }
    }

    /// Reads a coded value: a code or a name from human-readable formats, a bare `i32` code
    /// from binary ones (which cannot guess between the two).
    pub(crate) fn deserialize_with<'de, D, T, E>(
        deserializer: D,
        resolve: impl FnOnce(Self) -> Result<T, E>,
    ) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        E: fmt::Display,
    {
        let repr = if deserializer.is_human_readable() {
            Self::deserialize(deserializer)?
        } else {
            Self::Code(i64::from(i32::deserialize(deserializer)?))
        };
        resolve(repr).map_err(de::Error::custom)
    }
}

/// Preprocessing applied to a sample before feature extraction.
///
/// Preprocessing itself is an external collaborator; the selector only identifies it so that
/// training data produced under different preprocessing never mixes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreprocessingMethod {
    #[default]
    Dummy,
    HighFrequencyBoostFftFilter,
    BandpassFftFilter,
    Endpoint,
    LowPassFftFilter,
    HighPassFftFilter,
    HighPassBoostFilter,
    Raw,
    Plugin,
    LowPassCfeFilter,
    HighPassCfeFilter,
    BandPassCfeFilter,
    BandStopCfeFilter,
    BandStopFftFilter,
    SeparableDwtFilter,
    DualDtreeDwtFilter,
    DyadicDwtFilter,
}

impl Selector for PreprocessingMethod {
    const KIND: &'static str = "preprocessing";
    const ALL: &'static [Self] = &[
        Self::Dummy,
        Self::HighFrequencyBoostFftFilter,
        Self::BandpassFftFilter,
        Self::Endpoint,
        Self::LowPassFftFilter,
        Self::HighPassFftFilter,
        Self::HighPassBoostFilter,
        Self::Raw,
        Self::Plugin,
        Self::LowPassCfeFilter,
        Self::HighPassCfeFilter,
        Self::BandPassCfeFilter,
        Self::BandStopCfeFilter,
        Self::BandStopFftFilter,
        Self::SeparableDwtFilter,
        Self::DualDtreeDwtFilter,
        Self::DyadicDwtFilter,
    ];

    fn code(self) -> i32 {
        match self {
            Self::Dummy => 100,
            Self::HighFrequencyBoostFftFilter => 101,
            Self::BandpassFftFilter => 102,
            Self::Endpoint => 103,
            Self::LowPassFftFilter => 104,
            Self::HighPassFftFilter => 105,
            Self::HighPassBoostFilter => 106,
            Self::Raw => 107,
            Self::Plugin => 108,
            Self::LowPassCfeFilter => 109,
            Self::HighPassCfeFilter => 110,
            Self::BandPassCfeFilter => 111,
            Self::BandStopCfeFilter => 112,
            Self::BandStopFftFilter => 113,
            Self::SeparableDwtFilter => 114,
            Self::DualDtreeDwtFilter => 115,
            Self::DyadicDwtFilter => 116,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::HighFrequencyBoostFftFilter => "high_frequency_boost_fft_filter",
            Self::BandpassFftFilter => "bandpass_fft_filter",
            Self::Endpoint => "endpoint",
            Self::LowPassFftFilter => "low_pass_fft_filter",
            Self::HighPassFftFilter => "high_pass_fft_filter",
            Self::HighPassBoostFilter => "high_pass_boost_filter",
            Self::Raw => "raw",
            Self::Plugin => "plugin",
            Self::LowPassCfeFilter => "low_pass_cfe_filter",
            Self::HighPassCfeFilter => "high_pass_cfe_filter",
            Self::BandPassCfeFilter => "band_pass_cfe_filter",
            Self::BandStopCfeFilter => "band_stop_cfe_filter",
            Self::BandStopFftFilter => "band_stop_fft_filter",
            Self::SeparableDwtFilter => "separable_dwt_filter",
            Self::DualDtreeDwtFilter => "dual_dtree_dwt_filter",
            Self::DyadicDwtFilter => "dyadic_dwt_filter",
        }
    }
}

/// Feature extraction algorithm producing the vectors that get classified.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureExtractionMethod {
    Lpc,
    #[default]
    Fft,
    F0,
    Segmentation,
    Cepstral,
    Random,
    MinMaxAmplitudes,
    Plugin,
    Aggregator,
}

impl Selector for FeatureExtractionMethod {
    const KIND: &'static str = "feature extraction";
    const ALL: &'static [Self] = &[
        Self::Lpc,
        Self::Fft,
        Self::F0,
        Self::Segmentation,
        Self::Cepstral,
        Self::Random,
        Self::MinMaxAmplitudes,
        Self::Plugin,
        Self::Aggregator,
    ];

    fn code(self) -> i32 {
        match self {
            Self::Lpc => 300,
            Self::Fft => 301,
            Self::F0 => 302,
            Self::Segmentation => 303,
            Self::Cepstral => 304,
            Self::Random => 305,
            Self::MinMaxAmplitudes => 306,
            Self::Plugin => 307,
            Self::Aggregator => 308,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Lpc => "lpc",
            Self::Fft => "fft",
            Self::F0 => "f0",
            Self::Segmentation => "segmentation",
            Self::Cepstral => "cepstral",
            Self::Random => "random",
            Self::MinMaxAmplitudes => "min_max_amplitudes",
            Self::Plugin => "plugin",
            Self::Aggregator => "aggregator",
        }
    }
}

/// Classification algorithm applied to feature vectors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationMethod {
    NeuralNetwork,
    Stochastic,
    Markov,
    #[default]
    Euclidean,
    /// Sum of absolute differences, historically registered as "Chebyshev".
    Chebyshev,
    Minkowski,
    Mahalanobis,
    Random,
    Diff,
    Plugin,
    ZipfLaw,
    Hamming,
    Cosine,
}

impl Selector for ClassificationMethod {
    const KIND: &'static str = "classification";
    const ALL: &'static [Self] = &[
        Self::NeuralNetwork,
        Self::Stochastic,
        Self::Markov,
        Self::Euclidean,
        Self::Chebyshev,
        Self::Minkowski,
        Self::Mahalanobis,
        Self::Random,
        Self::Diff,
        Self::Plugin,
        Self::ZipfLaw,
        Self::Hamming,
        Self::Cosine,
    ];

    fn code(self) -> i32 {
        match self {
            Self::NeuralNetwork => 500,
            Self::Stochastic => 501,
            Self::Markov => 502,
            Self::Euclidean => 503,
            Self::Chebyshev => 504,
            Self::Minkowski => 505,
            Self::Mahalanobis => 506,
            Self::Random => 507,
            Self::Diff => 508,
            Self::Plugin => 509,
            Self::ZipfLaw => 510,
            Self::Hamming => 511,
            Self::Cosine => 512,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::NeuralNetwork => "neural_network",
            Self::Stochastic => "stochastic",
            Self::Markov => "markov",
            Self::Euclidean => "euclidean",
            Self::Chebyshev => "chebyshev",
            Self::Minkowski => "minkowski",
            Self::Mahalanobis => "mahalanobis",
            Self::Random => "random",
            Self::Diff => "diff",
            Self::Plugin => "plugin",
            Self::ZipfLaw => "zipf_law",
            Self::Hamming => "hamming",
            Self::Cosine => "cosine",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Chebyshev => &["manhattan", "city_block", "cityblock"],
            Self::ZipfLaw => &["zipf", "zipfs_law"],
            _ => &[],
        }
    }
}

/// Format of the samples fed into the pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    Unknown,
    #[default]
    Wav,
    Ulaw,
    Mp3,
    Sine,
    Aiff,
    Aiffc,
    Au,
    Snd,
    Midi,
    /// Loaded by an application-provided loader; its identity joins the configuration key.
    Custom,
    Text,
}

impl Selector for SampleFormat {
    const KIND: &'static str = "sample format";
    const ALL: &'static [Self] = &[
        Self::Unknown,
        Self::Wav,
        Self::Ulaw,
        Self::Mp3,
        Self::Sine,
        Self::Aiff,
        Self::Aiffc,
        Self::Au,
        Self::Snd,
        Self::Midi,
        Self::Custom,
        Self::Text,
    ];

    fn code(self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::Wav => 700,
            Self::Ulaw => 701,
            Self::Mp3 => 702,
            Self::Sine => 703,
            Self::Aiff => 704,
            Self::Aiffc => 705,
            Self::Au => 706,
            Self::Snd => 707,
            Self::Midi => 708,
            Self::Custom => 709,
            Self::Text => 710,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Wav => "wav",
            Self::Ulaw => "ulaw",
            Self::Mp3 => "mp3",
            Self::Sine => "sine",
            Self::Aiff => "aiff",
            Self::Aiffc => "aiffc",
            Self::Au => "au",
            Self::Snd => "snd",
            Self::Midi => "midi",
            Self::Custom => "custom",
            Self::Text => "text",
        }
    }
}

macro_rules! impl_selector_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(self.as_str(), f)
                }
            }

            impl FromStr for $ty {
                type Err = UnknownSelectorError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::parse_selector(s)
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    if serializer.is_human_readable() {
                        serializer.serialize_str(self.as_str())
                    } else {
                        serializer.serialize_i32(self.code())
                    }
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    SelectorRepr::deserialize_with(deserializer, SelectorRepr::resolve::<Self>)
                }
            }
        )*
    };
}

impl_selector_traits!(
    PreprocessingMethod,
    FeatureExtractionMethod,
    ClassificationMethod,
    SampleFormat,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_round_trip() {
        for &method in ClassificationMethod::ALL {
            let code = i64::from(method.code());
            assert_eq!(ClassificationMethod::from_code(code).unwrap(), method);
        }
        for &method in FeatureExtractionMethod::ALL {
            assert_eq!(
                method.as_str().parse::<FeatureExtractionMethod>().unwrap(),
                method
            );
        }
    }

    #[test]
    fn test_parse_accepts_codes_names_and_aliases() {
        assert_eq!(
            "503".parse::<ClassificationMethod>().unwrap(),
            ClassificationMethod::Euclidean
        );
        assert_eq!(
            "Min-Max-Amplitudes".parse::<FeatureExtractionMethod>().unwrap(),
            FeatureExtractionMethod::MinMaxAmplitudes
        );
        assert_eq!(
            "manhattan".parse::<ClassificationMethod>().unwrap(),
            ClassificationMethod::Chebyshev
        );
    }

    #[test]
    fn test_unknown_code_names_the_value() {
        let err = ClassificationMethod::from_code(999).unwrap_err();
        assert_eq!(err.to_string(), "Unknown classification method: 999");
        assert_eq!(err.value(), "999");
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stored {
        preprocessing: Option<PreprocessingMethod>,
        feature_extraction: FeatureExtractionMethod,
        classification: ClassificationMethod,
        format: SampleFormat,
    }

    #[test]
    fn test_binary_form_is_the_code() {
        let stored = Stored {
            preprocessing: Some(PreprocessingMethod::Raw),
            feature_extraction: FeatureExtractionMethod::MinMaxAmplitudes,
            classification: ClassificationMethod::ZipfLaw,
            format: SampleFormat::Unknown,
        };
        let bytes = bincode::serialize(&stored).unwrap();
        assert_eq!(bincode::deserialize::<Stored>(&bytes).unwrap(), stored);

        let bytes = bincode::serialize(&ClassificationMethod::Cosine).unwrap();
        assert_eq!(bincode::deserialize::<i32>(&bytes).unwrap(), 512);

        let bytes = bincode::serialize(&999_i32).unwrap();
        assert!(bincode::deserialize::<ClassificationMethod>(&bytes).is_err());
    }

    #[test]
    fn test_text_form_is_the_name() {
        let json = serde_json::to_string(&ClassificationMethod::ZipfLaw).unwrap();
        assert_eq!(json, "\"zipf_law\"");
        assert_eq!(
            serde_json::from_str::<ClassificationMethod>("510").unwrap(),
            ClassificationMethod::ZipfLaw
        );
        assert_eq!(
            serde_json::from_str::<ClassificationMethod>("\"zipf\"").unwrap(),
            ClassificationMethod::ZipfLaw
        );
    }
}
