use super::ZoneRange;
use crate::model::format::{odc_format, stream_ops};
use crate::model::{OdcError, ZoneId};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use std::path::Path;

/// a run of zones whose values are stored contiguously starting at `location`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneSegment {
    pub range: ZoneRange,
    pub location: u64,
}

/// the single-level index of a zone cache file, sorted by zone id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneIndex {
    pub segments: Vec<ZoneSegment>,
}

impl ZoneIndex {
    /// a version 1 file has no segment table: one dense run of `[0, highest_zone]`
    /// immediately after the 12 byte header.
    pub fn dense(highest_zone: ZoneId) -> ZoneIndex {
        ZoneIndex {
            segments: vec![ZoneSegment {
                range: ZoneRange::new(0, highest_zone),
                location: odc_format::FIXED_HEADER_BYTES,
            }],
        }
    }

    /// builds an index over `ranges`, laying their values out back to back after
    /// the header and segment table.
    pub fn from_ranges(ranges: &[ZoneRange], types: usize) -> ZoneIndex {
        let mut location = odc_format::FIXED_HEADER_BYTES
            + odc_format::BLOCK_COUNT_BYTES
            + ranges.len() as u64 * odc_format::INDEX_ENTRY_BYTES;
        let segments = ranges
            .iter()
            .map(|range| {
                let segment = ZoneSegment {
                    range: *range,
                    location,
                };
                location += (range.width() * types * odc_format::FLOAT_BYTES) as u64;
                segment
            })
            .collect();
        ZoneIndex { segments }
    }

    /// reads the segment count and table at the current reader position.
    pub fn read_from<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<ZoneIndex, OdcError> {
        let corrupt = |message: String| OdcError::CorruptIndex {
            path: path.to_string_lossy().to_string(),
            message,
        };
        let count = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| OdcError::read(path, e))?;
        let count = stream_ops::checked_table_len(
            reader,
            path,
            i64::from(count),
            odc_format::INDEX_ENTRY_BYTES,
            "zone segment",
        )?;
        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            let range = ZoneRange::read_from(reader, path)?;
            let location = reader
                .read_i64::<LittleEndian>()
                .map_err(|e| OdcError::read(path, e))?;
            let location = u64::try_from(location).map_err(|_| {
                corrupt(format!(
                    "zones [{}, {}] start at negative offset {location}",
                    range.start, range.end
                ))
            })?;
            segments.push(ZoneSegment { range, location });
        }
        let sorted = segments
            .windows(2)
            .all(|pair| pair[0].range.end < pair[1].range.start);
        if !sorted {
            return Err(corrupt(String::from("zone segments are not sorted")));
        }
        Ok(ZoneIndex { segments })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, path: &Path) -> Result<(), OdcError> {
        let write = |w: &mut W| -> std::io::Result<()> {
            w.write_i32::<LittleEndian>(self.segments.len() as i32)?;
            for segment in self.segments.iter() {
                w.write_i32::<LittleEndian>(segment.range.start as i32)?;
                w.write_i32::<LittleEndian>(segment.range.end as i32)?;
                w.write_i64::<LittleEndian>(segment.location as i64)?;
            }
            Ok(())
        };
        write(writer).map_err(|e| OdcError::write(path, e))
    }

    /// binary search for the segment holding `zone`.
    pub fn find(&self, zone: ZoneId) -> Option<&ZoneSegment> {
        self.segments
            .binary_search_by(|s| {
                if s.range.end < zone {
                    std::cmp::Ordering::Less
                } else if s.range.start > zone {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
            .map(|idx| &self.segments[idx])
    }

    /// file offset of the values of `zone`.
    pub fn position(&self, zone: ZoneId, types: usize) -> Option<u64> {
        self.find(zone).map(|s| {
            s.location + ((zone - s.range.start) * types * odc_format::FLOAT_BYTES) as u64
        })
    }

    pub fn zone_count(&self) -> usize {
        self.segments.iter().map(|s| s.range.width()).sum()
    }
}
