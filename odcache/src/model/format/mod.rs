//! the binary layout shared by every OD cache file: header, metadata block and the
//! constants that size the index and data sections.
pub mod metadata_ops;
pub mod odc_format;
mod odc_header;
pub mod odc_metadata;
pub mod stream_ops;

pub use odc_header::{has_commit_marker, OdcHeader};
pub use odc_metadata::OdcMetadata;
