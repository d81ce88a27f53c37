use std::{io, path::PathBuf};

use marf_core::{DumpMode, UnsupportedDumpModeError};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StorageError {
    #[display("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("{} not found", path.display())]
    NotFound { path: PathBuf },
    #[display("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: bincode::Error,
    },
    #[display("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: bincode::Error,
    },
    #[display("{} is not a MARF storage file", path.display())]
    BadHeader { path: PathBuf },
    #[display("{} has format version {found}, expected {expected}", path.display())]
    VersionMismatch {
        path: PathBuf,
        found: u16,
        expected: u16,
    },
    #[display("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        source: CsvFormatError,
    },
    #[display("{dump_mode} dump mode is not supported for {type_name}")]
    UnsupportedFormat {
        type_name: &'static str,
        dump_mode: DumpMode,
    },
    #[display("{source}")]
    UnsupportedDumpMode { source: UnsupportedDumpModeError },
}

impl From<UnsupportedDumpModeError> for StorageError {
    fn from(source: UnsupportedDumpModeError) -> Self {
        Self::UnsupportedDumpMode { source }
    }
}

/// Failure while converting a value to or from delimited text.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CsvFormatError {
    #[display("{source}")]
    Csv { source: csv::Error },
    #[display("{message}")]
    Malformed { message: String },
    #[display("CSV representation is not supported")]
    Unsupported,
}

impl CsvFormatError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<csv::Error> for CsvFormatError {
    fn from(source: csv::Error) -> Self {
        Self::Csv { source }
    }
}
