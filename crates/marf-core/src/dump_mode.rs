use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::method::SelectorRepr;

/// Serialization format used when persisting classifier state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpMode {
    /// Versioned binary object graph wrapped in gzip.
    #[default]
    GzipBinary,
    /// Delimited text.
    CsvText,
    /// Versioned binary object graph.
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum UnsupportedDumpModeError {
    #[display("Unsupported dump mode: {code}")]
    Code { code: i64 },
    #[display("Unsupported dump mode: {name}")]
    Name { name: String },
}

impl DumpMode {
    pub const ALL: [Self; 3] = [Self::GzipBinary, Self::CsvText, Self::Binary];

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::GzipBinary => 0,
            Self::CsvText => 1,
            Self::Binary => 2,
        }
    }

    /// File extension appended to persisted file names.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::GzipBinary => "gzbin",
            Self::CsvText => "csv",
            Self::Binary => "bin",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GzipBinary => "gzip_binary",
            Self::CsvText => "csv_text",
            Self::Binary => "binary",
        }
    }

    pub fn from_code(code: i64) -> Result<Self, UnsupportedDumpModeError> {
        Self::ALL
            .into_iter()
            .find(|mode| i64::from(mode.code()) == code)
            .ok_or(UnsupportedDumpModeError::Code { code })
    }
}

impl fmt::Display for DumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl FromStr for DumpMode {
    type Err = UnsupportedDumpModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        let normalized = s.replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized || mode.extension() == normalized)
            .ok_or_else(|| UnsupportedDumpModeError::Name { name: s.to_owned() })
    }
}

impl Serialize for DumpMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(self.as_str())
        } else {
            serializer.serialize_i32(self.code())
        }
    }
}

impl<'de> Deserialize<'de> for DumpMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SelectorRepr::deserialize_with(deserializer, |repr| match repr {
            SelectorRepr::Code(code) => Self::from_code(code),
            SelectorRepr::Name(name) => name.parse(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(DumpMode::GzipBinary.extension(), "gzbin");
        assert_eq!(DumpMode::CsvText.extension(), "csv");
        assert_eq!(DumpMode::Binary.extension(), "bin");
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = DumpMode::from_code(5).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported dump mode: 5");
    }

    #[test]
    fn test_parse_by_name_extension_or_code() {
        assert_eq!("gzip-binary".parse::<DumpMode>().unwrap(), DumpMode::GzipBinary);
        assert_eq!("csv".parse::<DumpMode>().unwrap(), DumpMode::CsvText);
        assert_eq!("2".parse::<DumpMode>().unwrap(), DumpMode::Binary);
    }

    #[test]
    fn test_serde_forms() {
        let bytes = bincode::serialize(&DumpMode::CsvText).unwrap();
        assert_eq!(bincode::deserialize::<i32>(&bytes).unwrap(), 1);
        assert_eq!(bincode::deserialize::<DumpMode>(&bytes).unwrap(), DumpMode::CsvText);

        assert_eq!(serde_json::to_string(&DumpMode::Binary).unwrap(), "\"binary\"");
        assert_eq!(serde_json::from_str::<DumpMode>("\"gzbin\"").unwrap(), DumpMode::GzipBinary);
    }
}
