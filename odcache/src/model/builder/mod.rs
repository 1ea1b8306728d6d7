//! assembles a sparse OD matrix from raw source files and writes it as a cache file.
mod ingest_ops;
pub mod index_ops;
mod odc_builder;
pub mod odc_writer;
mod origin_row;

pub use odc_builder::{create_odc, OdcBuilder};
pub use origin_row::OriginRow;
