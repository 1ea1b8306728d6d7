pub mod builder;
pub mod export;
pub mod format;
pub mod index;
mod odc_error;
pub mod parse;
pub mod reader;
pub mod zone;

pub use odc_error::OdcError;

/// zone identifiers address both axes of an OD matrix. on disk they are
/// stored as int32 values.
pub type ZoneId = usize;
