//! command line operations of the `odcache` binary.
pub mod dump_ops;
mod import_source;
pub mod info_ops;
mod odc_cli_error;
mod odc_operation;

pub use import_source::ImportSource;
pub use odc_cli_error::OdcCliError;
pub use odc_operation::OdcOperation;
