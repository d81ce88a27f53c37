use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use marf_core::{ConfigurationKey, DumpMode};
use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::{CsvFormatError, StorageError};

const MAGIC: [u8; 4] = *b"MARF";

/// Version of the binary object-graph layout written by [`StorageManager`].
pub const FORMAT_VERSION: u16 = 1;

/// A value that can be dumped and restored by a [`StorageManager`].
///
/// Every persisted value supports the binary modes through serde. Delimited text is
/// type-specific, so it is opt-in: the default CSV methods report
/// [`CsvFormatError::Unsupported`].
pub trait Persist: Serialize + DeserializeOwned + Default {
    /// Name used in diagnostics.
    const TYPE_NAME: &'static str;

    fn write_csv<W: Write>(&self, _writer: &mut csv::Writer<W>) -> Result<(), CsvFormatError> {
        Err(CsvFormatError::Unsupported)
    }

    fn read_csv<R: Read>(_reader: &mut csv::Reader<R>) -> Result<Self, CsvFormatError> {
        Err(CsvFormatError::Unsupported)
    }
}

/// Dumps and restores values at one path in one dump mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageManager {
    path: PathBuf,
    dump_mode: DumpMode,
    dump_on_not_found: bool,
}

impl StorageManager {
    /// Creates a manager that creates missing files on restore.
    pub fn new(path: impl Into<PathBuf>, dump_mode: DumpMode) -> Self {
        Self {
            path: path.into(),
            dump_mode,
            dump_on_not_found: true,
        }
    }

    /// Creates a manager from a numeric dump-mode code.
    pub fn with_mode_code(path: impl Into<PathBuf>, code: i64) -> Result<Self, StorageError> {
        Ok(Self::new(path, DumpMode::from_code(code)?))
    }

    /// Creates a manager for the file named by `key`.
    #[must_use]
    pub fn for_key(key: &ConfigurationKey) -> Self {
        Self::new(key.path(), key.dump_mode())
    }

    #[must_use]
    pub fn dump_on_not_found(mut self, dump_on_not_found: bool) -> Self {
        self.dump_on_not_found = dump_on_not_found;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn dump_mode(&self) -> DumpMode {
        self.dump_mode
    }

    /// Writes `value` to a temporary file next to the target and renames it into place, so a
    /// failed dump leaves the previous file untouched.
    pub fn dump<T: Persist>(&self, value: &T) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| self.io_error(source))?;
        let mut file = NamedTempFile::new_in(dir).map_err(|source| self.io_error(source))?;
        self.write(BufWriter::new(file.as_file_mut()), value)?;
        file.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        log::info!(
            "dumped {} to {} ({})",
            T::TYPE_NAME,
            self.path.display(),
            self.dump_mode
        );
        Ok(())
    }

    /// Restores a value, creating an empty file first if it is missing and allowed to.
    pub fn restore<T: Persist>(&self) -> Result<T, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !self.dump_on_not_found {
                    return Err(StorageError::NotFound {
                        path: self.path.clone(),
                    });
                }
                log::warn!(
                    "{} not found for {}, creating one now",
                    self.path.display(),
                    T::TYPE_NAME
                );
                let value = T::default();
                self.dump(&value)?;
                return Ok(value);
            }
            Err(source) => return Err(self.io_error(source)),
        };
        let mut reader = BufReader::new(file);
        let value = match self.dump_mode {
            DumpMode::Binary => self.decode(&mut reader)?,
            DumpMode::GzipBinary => self.decode(&mut GzDecoder::new(reader))?,
            DumpMode::CsvText => {
                let mut csv_reader = csv::ReaderBuilder::new()
                    .has_headers(false)
                    .flexible(true)
                    .trim(csv::Trim::All)
                    .from_reader(reader);
                T::read_csv(&mut csv_reader).map_err(|source| self.csv_error::<T>(source))?
            }
        };
        log::info!(
            "restored {} from {} ({})",
            T::TYPE_NAME,
            self.path.display(),
            self.dump_mode
        );
        Ok(value)
    }

    fn write<T: Persist, W: Write>(&self, mut writer: W, value: &T) -> Result<(), StorageError> {
        match self.dump_mode {
            DumpMode::Binary => self.encode(&mut writer, value)?,
            DumpMode::GzipBinary => {
                let mut encoder = GzEncoder::new(&mut writer, Compression::default());
                self.encode(&mut encoder, value)?;
                encoder.finish().map_err(|source| self.io_error(source))?;
            }
            DumpMode::CsvText => {
                let mut csv_writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .flexible(true)
                    .from_writer(&mut writer);
                value
                    .write_csv(&mut csv_writer)
                    .map_err(|source| self.csv_error::<T>(source))?;
                csv_writer.flush().map_err(|source| self.io_error(source))?;
            }
        }
        writer.flush().map_err(|source| self.io_error(source))
    }

    fn encode<T: Serialize, W: Write>(&self, writer: &mut W, value: &T) -> Result<(), StorageError> {
        writer
            .write_all(&MAGIC)
            .and_then(|()| writer.write_all(&FORMAT_VERSION.to_le_bytes()))
            .map_err(|source| self.io_error(source))?;
        bincode::serialize_into(writer, value).map_err(|source| StorageError::Encode {
            path: self.path.clone(),
            source,
        })
    }

    fn decode<T: DeserializeOwned, R: Read>(&self, reader: &mut R) -> Result<T, StorageError> {
        let mut header = [0; 6];
        reader
            .read_exact(&mut header)
            .map_err(|source| match source.kind() {
                io::ErrorKind::UnexpectedEof => StorageError::BadHeader {
                    path: self.path.clone(),
                },
                _ => self.io_error(source),
            })?;
        if header[..4] != MAGIC {
            return Err(StorageError::BadHeader {
                path: self.path.clone(),
            });
        }
        let found = u16::from_le_bytes([header[4], header[5]]);
        if found != FORMAT_VERSION {
            return Err(StorageError::VersionMismatch {
                path: self.path.clone(),
                found,
                expected: FORMAT_VERSION,
            });
        }
        bincode::deserialize_from(reader).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error<T: Persist>(&self, source: CsvFormatError) -> StorageError {
        match source {
            CsvFormatError::Unsupported => StorageError::UnsupportedFormat {
                type_name: T::TYPE_NAME,
                dump_mode: self.dump_mode,
            },
            source => StorageError::Csv {
                path: self.path.clone(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: Vec<u32>,
    }

    impl Persist for Counter {
        const TYPE_NAME: &'static str = "Counter";
    }

    /// Writes one row per hit and gives up at the first zero.
    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Tally {
        hits: Vec<u32>,
    }

    impl Persist for Tally {
        const TYPE_NAME: &'static str = "Tally";

        fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), CsvFormatError> {
            for hit in &self.hits {
                if *hit == 0 {
                    return Err(CsvFormatError::malformed("zero hit"));
                }
                writer.write_record([hit.to_string()])?;
            }
            Ok(())
        }

        fn read_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self, CsvFormatError> {
            let mut hits = vec![];
            for record in reader.records() {
                let record = record?;
                let hit = record.get(0).unwrap_or_default();
                hits.push(hit.parse().map_err(|_| CsvFormatError::malformed(hit))?);
            }
            Ok(Self { hits })
        }
    }

    #[test]
    fn test_binary_modes_restore_dumped_value() {
        let dir = tempfile::tempdir().unwrap();
        let value = Counter {
            hits: vec![1, 2, 3],
        };
        for mode in [DumpMode::Binary, DumpMode::GzipBinary] {
            let storage = StorageManager::new(dir.path().join(mode.extension()), mode);
            storage.dump(&value).unwrap();
            assert_eq!(storage.restore::<Counter>().unwrap(), value);
        }
    }

    #[test]
    fn test_missing_file_is_created_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("counter.bin");
        let storage = StorageManager::new(&path, DumpMode::Binary);
        assert_eq!(storage.restore::<Counter>().unwrap(), Counter::default());
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file_fails_when_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("counter.bin"), DumpMode::Binary)
            .dump_on_not_found(false);
        let err = storage.restore::<Counter>().unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_foreign_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.bin");
        fs::write(&path, b"not a marf file").unwrap();
        let err = StorageManager::new(&path, DumpMode::Binary)
            .restore::<Counter>()
            .unwrap_err();
        assert!(matches!(err, StorageError::BadHeader { .. }));
    }

    #[test]
    fn test_version_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.bin");
        fs::write(&path, [b'M', b'A', b'R', b'F', 9, 0]).unwrap();
        let err = StorageManager::new(&path, DumpMode::Binary)
            .restore::<Counter>()
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::VersionMismatch {
                found: 9,
                expected: FORMAT_VERSION,
                ..
            }
        ));
    }

    #[test]
    fn test_csv_without_representation_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("counter.csv"), DumpMode::CsvText);
        let err = storage.dump(&Counter::default()).unwrap_err();
        assert_eq!(err.to_string(), "csv_text dump mode is not supported for Counter");
    }

    #[test]
    fn test_failed_dump_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("tally.csv"), DumpMode::CsvText);
        let saved = Tally { hits: vec![4, 5] };
        storage.dump(&saved).unwrap();

        let err = storage.dump(&Tally { hits: vec![6, 0] }).unwrap_err();
        assert!(matches!(err, StorageError::Csv { .. }));
        assert_eq!(storage.restore::<Tally>().unwrap(), saved);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unsupported_dump_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.csv");
        let storage = StorageManager::new(&path, DumpMode::CsvText);
        storage.dump(&Counter::default()).unwrap_err();
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_mode_code() {
        let err = StorageManager::with_mode_code("x", 7).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported dump mode: 7");
    }
}
