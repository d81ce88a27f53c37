//! Persisted state of the MARF classifiers.
//!
//! This crate provides the data sets classification reads and writes, and the storage
//! manager that moves them to and from disk.
//!
//! # Key Components
//!
//! - [`TrainingSet`] / [`TrainingSample`] - per-subject running mean vectors, tagged with
//!   the preprocessing and feature-extraction methods that produced them
//! - [`ResultSet`] / [`ResultEntry`] - scored candidates of one classification pass
//! - [`StorageManager`] - dump/restore of any [`Persist`] value in one of the three
//!   [`DumpMode`](marf_core::DumpMode)s
//!
//! # File Formats
//!
//! ```text
//! binary        "MARF" | u16 LE version | bincode(value)
//! gzip-binary   gzip("MARF" | u16 LE version | bincode(value))
//! csv-text      type-specific records (see Persist::write_csv)
//! ```
//!
//! Which file a value lives in is decided by the caller, usually from a
//! [`ConfigurationKey`](marf_core::ConfigurationKey). The storage layer only persists and
//! retrieves bytes.
//!
//! # Current Limitations
//!
//! - **No locking**: concurrent writers to the same file are not coordinated; a single
//!   writer per configuration key is assumed
//! - **Whole-file rewrites**: every dump serializes the complete value

pub use self::{
    error::{CsvFormatError, StorageError},
    manager::{FORMAT_VERSION, Persist, StorageManager},
    result_set::{ResultEntry, ResultSet},
    training_set::{TrainingSample, TrainingSet},
};

mod error;
mod manager;
mod result_set;
mod training_set;
