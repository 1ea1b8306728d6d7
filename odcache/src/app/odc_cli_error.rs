use crate::model::OdcError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OdcCliError {
    #[error("failure reading run configuration: {0}")]
    ConfigurationError(String),
    #[error(transparent)]
    OdcError {
        #[from]
        source: OdcError,
    },
    #[error("failure writing output: {source}")]
    StdIoError {
        #[from]
        source: std::io::Error,
    },
    #[error("failure writing csv output: {source}")]
    CsvWriteError {
        #[from]
        source: csv::Error,
    },
}
