use crate::model::{OdcError, ZoneId};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use std::path::Path;

/// an inclusive run of zone ids `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneRange {
    pub start: ZoneId,
    pub end: ZoneId,
}

impl ZoneRange {
    pub fn new(start: ZoneId, end: ZoneId) -> ZoneRange {
        ZoneRange { start, end }
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, zone: ZoneId) -> bool {
        self.start <= zone && zone <= self.end
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<ZoneId> {
        self.start..=self.end
    }

    /// reads an `{ int32 start; int32 end }` pair, rejecting negative or inverted ranges.
    pub fn read_from<R: Read>(reader: &mut R, path: &Path) -> Result<ZoneRange, OdcError> {
        let start = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| OdcError::read(path, e))?;
        let end = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| OdcError::read(path, e))?;
        if start < 0 || end < start {
            return Err(OdcError::CorruptIndex {
                path: path.to_string_lossy().to_string(),
                message: format!("invalid zone range [{start}, {end}]"),
            });
        }
        Ok(ZoneRange::new(start as ZoneId, end as ZoneId))
    }
}

/// collapses a sequence of flags into the maximal runs of `true` values.
pub fn runs_of<I>(flags: I) -> Vec<ZoneRange>
where
    I: IntoIterator<Item = bool>,
{
    let mut runs = vec![];
    let mut open: Option<ZoneId> = None;
    let mut last = 0;
    for (idx, flag) in flags.into_iter().enumerate() {
        match (flag, open) {
            (true, None) => open = Some(idx),
            (false, Some(start)) => {
                runs.push(ZoneRange::new(start, idx - 1));
                open = None;
            }
            _ => {}
        }
        last = idx;
    }
    if let Some(start) = open {
        runs.push(ZoneRange::new(start, last));
    }
    runs
}
