use super::OriginRow;
use crate::model::index::{runs_of, OuterBlock, SubBlock};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// one block per maximal run of allocated origin rows, in ascending origin order.
pub fn create_outer_blocks(rows: &[Option<OriginRow>], gap: usize) -> Vec<OuterBlock> {
    let mut blocks = Vec::with_capacity(gap);
    blocks.extend(
        runs_of(rows.iter().map(|row| row.is_some()))
            .into_iter()
            .map(OuterBlock::new),
    );
    blocks
}

/// finds, per block, the runs of destinations that any origin of the block holds data
/// for. blocks are processed in parallel and each task only writes its own block.
/// returns the total number of sub-blocks.
pub fn attach_sub_blocks(blocks: &mut [OuterBlock], rows: &[Option<OriginRow>], zones: usize) -> usize {
    let total = AtomicUsize::new(0);
    blocks.par_iter_mut().for_each(|block| {
        let origin_rows: Vec<&OriginRow> = block
            .range
            .iter()
            .filter_map(|origin| rows.get(origin).and_then(|r| r.as_ref()))
            .collect();
        let flags = (0..zones).map(|d| origin_rows.iter().any(|row| row.has_data(d)));
        block.sub_blocks = runs_of(flags).into_iter().map(SubBlock::new).collect();
        total.fetch_add(block.sub_blocks.len(), Ordering::Relaxed);
    });
    total.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::index::ZoneRange;

    fn rows() -> Vec<Option<OriginRow>> {
        let mut rows: Vec<Option<OriginRow>> = vec![None; 6];
        let mut row1 = OriginRow::new(6, 1);
        row1.set(0, 0, 1.0);
        row1.set(4, 0, 1.0);
        let mut row2 = OriginRow::new(6, 1);
        row2.set(1, 0, 1.0);
        let mut row5 = OriginRow::new(6, 1);
        row5.set(5, 0, 0.0);
        rows[1] = Some(row1);
        rows[2] = Some(row2);
        rows[5] = Some(row5);
        rows
    }

    #[test]
    fn test_outer_blocks_split_on_unallocated_origins() {
        let blocks = create_outer_blocks(&rows(), 5);
        let ranges: Vec<ZoneRange> = blocks.iter().map(|b| b.range).collect();
        assert_eq!(ranges, vec![ZoneRange::new(1, 2), ZoneRange::new(5, 5)]);
    }

    #[test]
    fn test_sub_blocks_union_destinations_of_a_block() {
        let rows = rows();
        let mut blocks = create_outer_blocks(&rows, 5);
        let total = attach_sub_blocks(&mut blocks, &rows, 6);
        assert_eq!(total, 3);
        let first: Vec<ZoneRange> = blocks[0].sub_blocks.iter().map(|s| s.range).collect();
        assert_eq!(first, vec![ZoneRange::new(0, 1), ZoneRange::new(4, 4)]);
        let second: Vec<ZoneRange> = blocks[1].sub_blocks.iter().map(|s| s.range).collect();
        assert_eq!(second, vec![ZoneRange::new(5, 5)]);
    }
}
