use thiserror::Error;

use super::parse::FastParseError;

#[derive(Error, Debug)]
pub enum OdcError {
    #[error("file '{0}' does not exist")]
    FileNotFound(String),
    #[error("file '{0}' not fully generated")]
    NotFullyGenerated(String),
    #[error("unable to read the MetaData entries in \"{path}\": {source}")]
    MetadataReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failure reading {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failure writing {path}: {source}")]
    WriteError {
        path: String,
        source: std::io::Error,
    },
    #[error("failure parsing {path} line {line}: {source}")]
    ParseError {
        path: String,
        line: usize,
        source: FastParseError,
    },
    #[error("failure reading csv row from {0}: {1}")]
    CsvReadError(String, csv::Error),
    #[error("{axis} zone {zone} found in {path} line {line} is not below the zone capacity {capacity}")]
    ZoneOutOfRange {
        path: String,
        line: usize,
        axis: &'static str,
        zone: i64,
        capacity: usize,
    },
    #[error("zone {zone} is not below the zone capacity {capacity}")]
    ZoneBeyondCapacity { zone: usize, capacity: usize },
    #[error("record slot {slot} is outside of the record length {record_len}")]
    RecordSlotOutOfRange { slot: usize, record_len: usize },
    #[error("index of {path} is corrupt: {message}")]
    CorruptIndex { path: String, message: String },
    #[error("data section of {path} is truncated, expected {expected} bytes at offset {offset} but only {found} remain")]
    TruncatedData {
        path: String,
        offset: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid cache dimensions: {0}")]
    InvalidDimensions(String),
    #[error("invalid cache manifest: {0}")]
    ManifestError(String),
    #[error("{0}")]
    InternalError(String),
}

impl OdcError {
    pub fn read(path: &std::path::Path, source: std::io::Error) -> OdcError {
        OdcError::ReadError {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }

    /// maps a failure to open a file, reporting a missing file as such.
    pub fn open(path: &std::path::Path, source: std::io::Error) -> OdcError {
        if source.kind() == std::io::ErrorKind::NotFound {
            OdcError::FileNotFound(path.to_string_lossy().to_string())
        } else {
            OdcError::read(path, source)
        }
    }

    pub fn write(path: &std::path::Path, source: std::io::Error) -> OdcError {
        OdcError::WriteError {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }

    pub fn parse(path: &std::path::Path, line: usize, source: FastParseError) -> OdcError {
        OdcError::ParseError {
            path: path.to_string_lossy().to_string(),
            line,
            source,
        }
    }
}
