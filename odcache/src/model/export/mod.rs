//! materializes every record of a cache file in memory.
mod load_request;
mod sparse_od_matrix;
pub mod store_all_ops;

pub use load_request::LoadRequest;
pub use sparse_od_matrix::SparseOdMatrix;
