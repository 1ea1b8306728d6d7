/// leading marker of a file whose index and data have not been committed yet.
pub const INCOMPLETE_MARKER: i32 = 0;
/// files written before the metadata block existed.
pub const LEGACY_VERSION: i32 = 1;
/// version written by this crate, also the commit marker value.
pub const CURRENT_VERSION: i32 = 2;

/// marker, times and types.
pub const FIXED_HEADER_BYTES: u64 = 12;
pub const METADATA_LENGTH_BYTES: u64 = 4;
pub const BLOCK_COUNT_BYTES: u64 = 4;
/// `{ int32 start; int32 end; int64 offset }`, used by both index levels.
pub const INDEX_ENTRY_BYTES: u64 = 16;
pub const SUB_BLOCK_COUNT_BYTES: u64 = 4;
pub const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

/// default number of OD records retained by the point lookup cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;
