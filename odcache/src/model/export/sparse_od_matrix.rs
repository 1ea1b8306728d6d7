use crate::model::index::OuterBlock;
use crate::model::ZoneId;

/// every stored record of a cache, keeping the sparsity of the file's index: one
/// dense row per indexed origin covering only that origin block's destination runs.
#[derive(Clone, Debug)]
pub struct SparseOdMatrix {
    blocks: Vec<OuterBlock>,
    /// index into `rows` of the first origin of each block
    row_offsets: Vec<usize>,
    rows: Vec<Vec<f32>>,
    times: usize,
    record_len: usize,
}

impl SparseOdMatrix {
    /// `rows` holds one row per origin of each block, in block order.
    pub fn new(blocks: Vec<OuterBlock>, rows: Vec<Vec<f32>>, times: usize, record_len: usize) -> SparseOdMatrix {
        let mut row_offsets = Vec::with_capacity(blocks.len());
        let mut offset = 0;
        for block in blocks.iter() {
            row_offsets.push(offset);
            offset += block.range.width();
        }
        SparseOdMatrix {
            blocks,
            row_offsets,
            rows,
            times,
            record_len,
        }
    }

    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// number of stored records.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.record_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, origin: ZoneId, destination: ZoneId) -> Option<&[f32]> {
        let block_idx = self.blocks.partition_point(|b| b.range.end < origin);
        let block = self.blocks.get(block_idx).filter(|b| b.range.contains(origin))?;
        let column = block.column_of(destination)?;
        let row = self
            .rows
            .get(self.row_offsets[block_idx] + origin - block.range.start)?;
        row.get(column * self.record_len..(column + 1) * self.record_len)
    }

    /// a single value, 0.0 for pairs without a record.
    pub fn value(&self, origin: ZoneId, destination: ZoneId, time: usize, data_type: usize) -> f32 {
        self.get(origin, destination)
            .and_then(|r| r.get(self.times * data_type + time).copied())
            .unwrap_or(0.0)
    }

    pub fn contains_index(&self, origin: ZoneId, destination: ZoneId) -> bool {
        self.get(origin, destination).is_some()
    }

    /// origins covered by the index, ascending.
    pub fn valid_origins(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.blocks.iter().flat_map(|b| b.range.iter())
    }

    /// every stored `(origin, destination, record)`, ordered by origin then destination.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, ZoneId, &[f32])> + '_ {
        self.blocks
            .iter()
            .zip(self.row_offsets.iter())
            .flat_map(move |(block, first_row)| {
                block.range.iter().flat_map(move |origin| {
                    let row = &self.rows[first_row + origin - block.range.start];
                    block
                        .sub_blocks
                        .iter()
                        .flat_map(|s| s.range.iter())
                        .zip(row.chunks_exact(self.record_len))
                        .map(move |(destination, record)| (origin, destination, record))
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::index::{SubBlock, ZoneRange};

    fn matrix() -> SparseOdMatrix {
        let blocks = vec![
            OuterBlock {
                range: ZoneRange::new(1, 2),
                sub_blocks: vec![
                    SubBlock::new(ZoneRange::new(0, 0)),
                    SubBlock::new(ZoneRange::new(3, 3)),
                ],
            },
            OuterBlock {
                range: ZoneRange::new(4, 4),
                sub_blocks: vec![SubBlock::new(ZoneRange::new(2, 2))],
            },
        ];
        let rows = vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![9.0, 10.0],
        ];
        SparseOdMatrix::new(blocks, rows, 2, 2)
    }

    #[test]
    fn test_records_by_pair() {
        let matrix = matrix();
        assert_eq!(matrix.get(1, 3), Some(&[3.0, 4.0][..]));
        assert_eq!(matrix.get(2, 0), Some(&[5.0, 6.0][..]));
        assert_eq!(matrix.get(4, 2), Some(&[9.0, 10.0][..]));
        assert_eq!(matrix.get(3, 0), None);
        assert_eq!(matrix.get(1, 1), None);
        assert_eq!(matrix.value(2, 3, 1, 0), 8.0);
        assert_eq!(matrix.value(0, 0, 0, 0), 0.0);
        assert_eq!(matrix.len(), 5);
    }

    #[test]
    fn test_iteration_order() {
        let matrix = matrix();
        let pairs: Vec<(ZoneId, ZoneId)> = matrix.iter().map(|(o, d, _)| (o, d)).collect();
        assert_eq!(pairs, vec![(1, 0), (1, 3), (2, 0), (2, 3), (4, 2)]);
        let origins: Vec<ZoneId> = matrix.valid_origins().collect();
        assert_eq!(origins, vec![1, 2, 4]);
    }
}
