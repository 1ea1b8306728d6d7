use super::ZoneRange;
use crate::model::ZoneId;

/// a run of destinations inside an [`OuterBlock`]. `location` is the file offset of
/// the first record of the block's data rectangle that falls in this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubBlock {
    pub range: ZoneRange,
    pub location: u64,
}

impl SubBlock {
    pub fn new(range: ZoneRange) -> SubBlock {
        SubBlock { range, location: 0 }
    }
}

/// a run of origins that all hold at least one record, along with the destination
/// runs populated by any of those origins.
///
/// the data of a block is a dense rectangle of `range.width()` rows, one per origin,
/// each holding [`OuterBlock::total_width`] records: the records of every sub-block,
/// concatenated in sub-block order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OuterBlock {
    pub range: ZoneRange,
    pub sub_blocks: Vec<SubBlock>,
}

impl OuterBlock {
    pub fn new(range: ZoneRange) -> OuterBlock {
        OuterBlock {
            range,
            sub_blocks: vec![],
        }
    }

    /// combined width of all destination runs, the row length of the data rectangle.
    pub fn total_width(&self) -> usize {
        self.sub_blocks.iter().map(|s| s.range.width()).sum()
    }

    /// number of records stored for this block.
    pub fn record_count(&self) -> usize {
        self.range.width() * self.total_width()
    }

    /// column of `destination` within a row of the data rectangle.
    pub fn column_of(&self, destination: ZoneId) -> Option<usize> {
        let mut preceding = 0;
        for sub in self.sub_blocks.iter() {
            if sub.range.contains(destination) {
                return Some(preceding + destination - sub.range.start);
            }
            preceding += sub.range.width();
        }
        None
    }

    /// the file offset where this block's rectangle begins.
    pub fn data_location(&self) -> Option<u64> {
        self.sub_blocks.first().map(|s| s.location)
    }

    /// highest destination id covered by this block.
    pub fn last_destination(&self) -> Option<ZoneId> {
        self.sub_blocks.last().map(|s| s.range.end)
    }
}
