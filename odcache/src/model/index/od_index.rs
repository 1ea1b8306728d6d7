use super::{OuterBlock, SubBlock, ZoneRange};
use crate::model::format::{odc_format, stream_ops};
use crate::model::{OdcError, ZoneId};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// the two-level sparse index of an OD cache file.
///
/// ```text
/// int32 block count
/// block count x { int32 start; int32 end; int64 sub index offset }
/// at each sub index offset:
///   int32 sub-block count
///   sub-block count x { int32 start; int32 end; int64 data offset }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OdIndex {
    pub blocks: Vec<OuterBlock>,
}

impl OdIndex {
    pub fn new(blocks: Vec<OuterBlock>) -> OdIndex {
        OdIndex { blocks }
    }

    /// reads the index starting at the block count at the current reader position,
    /// following each block's sub index offset.
    pub fn read_from<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<OdIndex, OdcError> {
        let count = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| OdcError::read(path, e))?;
        let count = stream_ops::checked_table_len(
            reader,
            path,
            i64::from(count),
            odc_format::INDEX_ENTRY_BYTES,
            "origin block",
        )?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let range = ZoneRange::read_from(reader, path)?;
            let offset = read_offset(reader, path)?;
            entries.push((range, offset));
        }

        let mut blocks = Vec::with_capacity(entries.len());
        for (range, offset) in entries {
            reader
                .seek(SeekFrom::Start(offset))
                .map_err(|e| OdcError::read(path, e))?;
            let sub_count = reader
                .read_u32::<LittleEndian>()
                .map_err(|e| OdcError::read(path, e))?;
            let sub_count = stream_ops::checked_table_len(
                reader,
                path,
                i64::from(sub_count),
                odc_format::INDEX_ENTRY_BYTES,
                "destination block",
            )?;
            let mut sub_blocks = Vec::with_capacity(sub_count);
            for _ in 0..sub_count {
                let sub_range = ZoneRange::read_from(reader, path)?;
                let location = read_offset(reader, path)?;
                sub_blocks.push(SubBlock {
                    range: sub_range,
                    location,
                });
            }
            blocks.push(OuterBlock { range, sub_blocks });
        }
        let index = OdIndex { blocks };
        index.validate_order(path)?;
        Ok(index)
    }

    /// byte size of the serialized index, from the block count to the last sub-block entry.
    pub fn byte_len(&self) -> u64 {
        let sub_tables: u64 = self
            .blocks
            .iter()
            .map(|b| {
                odc_format::SUB_BLOCK_COUNT_BYTES
                    + b.sub_blocks.len() as u64 * odc_format::INDEX_ENTRY_BYTES
            })
            .sum();
        odc_format::BLOCK_COUNT_BYTES
            + self.blocks.len() as u64 * odc_format::INDEX_ENTRY_BYTES
            + sub_tables
    }

    /// assigns every sub-block its data offset, assuming the index is written at
    /// `index_offset` and the data section immediately follows it. sub-blocks are
    /// visited in block order. returns the offset of the end of the data section.
    pub fn assign_locations(&mut self, index_offset: u64, record_bytes: u64) -> u64 {
        let mut location = index_offset + self.byte_len();
        for block in self.blocks.iter_mut() {
            let height = block.range.width() as u64;
            for sub in block.sub_blocks.iter_mut() {
                sub.location = location;
                location += sub.range.width() as u64 * height * record_bytes;
            }
        }
        location
    }

    /// writes the block count, outer block table and the sub-block tables, in that order.
    /// sub tables are laid out contiguously right after the outer table.
    pub fn write_to<W: Write>(&self, writer: &mut W, index_offset: u64, path: &Path) -> Result<(), OdcError> {
        let write = |w: &mut W| -> std::io::Result<()> {
            w.write_i32::<LittleEndian>(self.blocks.len() as i32)?;
            let mut sub_index_offset = index_offset
                + odc_format::BLOCK_COUNT_BYTES
                + self.blocks.len() as u64 * odc_format::INDEX_ENTRY_BYTES;
            for block in self.blocks.iter() {
                w.write_i32::<LittleEndian>(block.range.start as i32)?;
                w.write_i32::<LittleEndian>(block.range.end as i32)?;
                w.write_i64::<LittleEndian>(sub_index_offset as i64)?;
                sub_index_offset += odc_format::SUB_BLOCK_COUNT_BYTES
                    + block.sub_blocks.len() as u64 * odc_format::INDEX_ENTRY_BYTES;
            }
            for block in self.blocks.iter() {
                w.write_u32::<LittleEndian>(block.sub_blocks.len() as u32)?;
                for sub in block.sub_blocks.iter() {
                    w.write_i32::<LittleEndian>(sub.range.start as i32)?;
                    w.write_i32::<LittleEndian>(sub.range.end as i32)?;
                    w.write_i64::<LittleEndian>(sub.location as i64)?;
                }
            }
            Ok(())
        };
        write(writer).map_err(|e| OdcError::write(path, e))
    }

    /// finds the block holding `origin`.
    pub fn block_of(&self, origin: ZoneId) -> Option<&OuterBlock> {
        let idx = self.blocks.partition_point(|b| b.range.end < origin);
        self.blocks.get(idx).filter(|b| b.range.contains(origin))
    }

    /// file offset of the record of `(origin, destination)`, or None when the pair
    /// holds no data.
    pub fn position(&self, origin: ZoneId, destination: ZoneId, record_bytes: u64) -> Option<u64> {
        let block = self.block_of(origin)?;
        let column = block.column_of(destination)?;
        let base = block.data_location()?;
        let row = (origin - block.range.start) as u64;
        Some(base + (row * block.total_width() as u64 + column as u64) * record_bytes)
    }

    pub fn contains(&self, origin: ZoneId, destination: ZoneId) -> bool {
        self.block_of(origin)
            .and_then(|b| b.column_of(destination))
            .is_some()
    }

    /// the last origin with data, None for an empty cache.
    pub fn highest_zone(&self) -> Option<ZoneId> {
        self.blocks.last().map(|b| b.range.end)
    }

    /// the last destination with data over all blocks.
    pub fn highest_destination(&self) -> Option<ZoneId> {
        self.blocks.iter().filter_map(|b| b.last_destination()).max()
    }

    pub fn sub_block_count(&self) -> usize {
        self.blocks.iter().map(|b| b.sub_blocks.len()).sum()
    }

    pub fn record_count(&self) -> usize {
        self.blocks.iter().map(|b| b.record_count()).sum()
    }

    /// file offset of the first stored record.
    pub fn data_start(&self) -> Option<u64> {
        self.blocks.iter().find_map(|b| b.data_location())
    }

    fn validate_order(&self, path: &Path) -> Result<(), OdcError> {
        for pair in self.blocks.windows(2) {
            if pair[0].range.end >= pair[1].range.start {
                return Err(corrupt(
                    path,
                    format!(
                        "origin blocks [{}, {}] and [{}, {}] are out of order",
                        pair[0].range.start, pair[0].range.end, pair[1].range.start, pair[1].range.end
                    ),
                ));
            }
        }
        for block in self.blocks.iter() {
            for pair in block.sub_blocks.windows(2) {
                if pair[0].range.end >= pair[1].range.start {
                    return Err(corrupt(
                        path,
                        format!(
                            "destination blocks of origins [{}, {}] are out of order",
                            block.range.start, block.range.end
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn read_offset<R: Read>(reader: &mut R, path: &Path) -> Result<u64, OdcError> {
    let offset = reader
        .read_i64::<LittleEndian>()
        .map_err(|e| OdcError::read(path, e))?;
    u64::try_from(offset).map_err(|_| corrupt(path, format!("negative file offset {offset}")))
}

fn corrupt(path: &Path, message: String) -> OdcError {
    OdcError::CorruptIndex {
        path: path.to_string_lossy().to_string(),
        message,
    }
}
