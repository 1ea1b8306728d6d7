//! the per-zone analogue of the OD cache: one vector of `types` floats per zone,
//! indexed by a sorted list of zone segments.
//!
//! ```text
//! [0]  int32 highest zone
//! [4]  int32 version
//! [8]  int32 types
//! [12] int32 segment count (version 2)
//!      segment count x { int32 start; int32 end; int64 data offset }
//!      types x float32 per zone, in segment order
//! ```
mod sparse_zone_array;
mod sparse_zone_builder;
mod zone_cache;

pub use sparse_zone_array::SparseZoneArray;
pub use sparse_zone_builder::SparseZoneBuilder;
pub use zone_cache::ZoneCache;
