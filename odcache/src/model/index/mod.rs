mod od_block;
mod od_index;
mod zone_index;
mod zone_range;

pub use od_block::{OuterBlock, SubBlock};
pub use od_index::OdIndex;
pub use zone_index::{ZoneIndex, ZoneSegment};
pub use zone_range::{runs_of, ZoneRange};
