use crate::model::format::odc_format;
use crate::model::index::{runs_of, ZoneIndex};
use crate::model::parse::fast_parse;
use crate::model::{OdcError, ZoneId};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use kdam::tqdm;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// builds a zone cache file from `zone,v0,v1,...` rows. the zone capacity grows as
/// larger zone ids are seen.
pub struct SparseZoneBuilder {
    types: usize,
    values: Vec<f32>,
    has_data: Vec<bool>,
}

impl SparseZoneBuilder {
    /// starts with room for zones below `zone_capacity`. larger zones grow the builder.
    pub fn new(zone_capacity: usize, types: usize) -> Result<SparseZoneBuilder, OdcError> {
        if types == 0 {
            return Err(OdcError::InvalidDimensions(String::from(
                "a zone cache needs at least one data type",
            )));
        }
        Ok(SparseZoneBuilder {
            types,
            values: vec![0.0; zone_capacity * types],
            has_data: vec![false; zone_capacity],
        })
    }

    pub fn types(&self) -> usize {
        self.types
    }

    pub fn zone_capacity(&self) -> usize {
        self.has_data.len()
    }

    /// the highest zone holding data.
    pub fn highest_zone(&self) -> Option<ZoneId> {
        self.has_data.iter().rposition(|f| *f)
    }

    pub fn get(&self, zone: ZoneId) -> Option<&[f32]> {
        if self.has_data.get(zone).copied().unwrap_or(false) {
            Some(&self.values[zone * self.types..(zone + 1) * self.types])
        } else {
            None
        }
    }

    pub fn set(&mut self, zone: ZoneId, values: &[f32]) -> Result<(), OdcError> {
        if values.len() != self.types {
            return Err(OdcError::InvalidDimensions(format!(
                "zone {zone} has {} values, expected {}",
                values.len(),
                self.types
            )));
        }
        self.ensure_capacity(zone);
        self.values[zone * self.types..(zone + 1) * self.types].copy_from_slice(values);
        self.has_data[zone] = true;
        Ok(())
    }

    pub fn load_csv(&mut self, path: &Path, header: bool) -> Result<(), OdcError> {
        if !path.exists() {
            return Err(OdcError::FileNotFound(path.to_string_lossy().to_string()));
        }
        let csv_error = |e| OdcError::CsvReadError(path.to_string_lossy().to_string(), e);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(header)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let mut rows = 0;
        let record_iter = tqdm!(
            reader.records().enumerate(),
            desc = format!("load {}", path.display())
        );
        for (idx, record) in record_iter {
            let record = record.map_err(csv_error)?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 1);
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            let parse_error = |e| OdcError::parse(path, line, e);
            let zone_field = record.get(0).unwrap_or_default();
            let zone = fast_parse::parse_int(zone_field, 0, zone_field.len()).map_err(parse_error)?;
            let zone = usize::try_from(zone).map_err(|_| OdcError::ZoneOutOfRange {
                path: path.to_string_lossy().to_string(),
                line,
                axis: "zone",
                zone,
                capacity: self.zone_capacity(),
            })?;
            self.ensure_capacity(zone);
            for (slot, field) in record.iter().skip(1).enumerate() {
                if field.is_empty() {
                    break;
                }
                if slot >= self.types {
                    return Err(OdcError::RecordSlotOutOfRange {
                        slot,
                        record_len: self.types,
                    });
                }
                let value = fast_parse::parse_float(field, 0, field.len()).map_err(parse_error)?;
                self.values[zone * self.types + slot] = value;
                self.has_data[zone] = true;
            }
            rows += 1;
        }
        eprintln!();
        log::info!("loaded {rows} zone rows from {}", path.display());
        Ok(())
    }

    /// writes a version 2 zone cache with one segment per run of populated zones.
    pub fn save(&self, path: &Path) -> Result<(), OdcError> {
        let ranges = runs_of(self.has_data.iter().copied());
        let index = ZoneIndex::from_ranges(&ranges, self.types);
        let file = File::create(path).map_err(|e| OdcError::write(path, e))?;
        let mut writer = BufWriter::new(file);

        let highest_zone = self.highest_zone().unwrap_or(0);
        let write_header = |w: &mut BufWriter<File>| -> std::io::Result<()> {
            w.write_i32::<LittleEndian>(highest_zone as i32)?;
            w.write_i32::<LittleEndian>(odc_format::CURRENT_VERSION)?;
            w.write_i32::<LittleEndian>(self.types as i32)
        };
        write_header(&mut writer).map_err(|e| OdcError::write(path, e))?;
        index.write_to(&mut writer, path)?;

        let mut buffer: Vec<u8> = vec![];
        for range in ranges.iter() {
            let values = &self.values[range.start * self.types..(range.end + 1) * self.types];
            buffer.resize(values.len() * odc_format::FLOAT_BYTES, 0);
            LittleEndian::write_f32_into(values, &mut buffer);
            writer
                .write_all(&buffer)
                .map_err(|e| OdcError::write(path, e))?;
        }
        writer.flush().map_err(|e| OdcError::write(path, e))?;
        log::info!(
            "wrote {} with {} zones in {} segments",
            path.display(),
            index.zone_count(),
            index.segments.len()
        );
        Ok(())
    }

    fn ensure_capacity(&mut self, zone: ZoneId) {
        if zone < self.zone_capacity() {
            return;
        }
        let capacity = (zone + 1).max(self.zone_capacity() * 2);
        self.values.resize(capacity * self.types, 0.0);
        self.has_data.resize(capacity, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_grows_for_large_zones() {
        let mut builder = SparseZoneBuilder::new(3, 2).expect("should create builder");
        assert_eq!(builder.zone_capacity(), 3);
        builder.set(10, &[1.0, 2.0]).expect("should set zone");
        assert_eq!(builder.zone_capacity(), 11);
        builder.set(12, &[3.0, 4.0]).expect("should set zone");
        assert_eq!(builder.zone_capacity(), 22);
        assert_eq!(builder.get(10), Some(&[1.0, 2.0][..]));
        assert_eq!(builder.get(11), None);
        assert_eq!(builder.highest_zone(), Some(12));
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("zones.csv");
        std::fs::write(&path, "zone,a,b\n1,0.5,1.5\n40,2,\n").expect("should write csv");
        let mut builder = SparseZoneBuilder::new(5, 2).expect("should create builder");
        builder.load_csv(&path, true).expect("should load csv");
        assert_eq!(builder.get(1), Some(&[0.5, 1.5][..]));
        assert_eq!(builder.get(40), Some(&[2.0, 0.0][..]));
        assert_eq!(builder.get(0), None);
    }

    #[test]
    fn test_too_many_values() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("zones.csv");
        std::fs::write(&path, "1,0.5,1.5,2.5\n").expect("should write csv");
        let mut builder = SparseZoneBuilder::new(5, 2).expect("should create builder");
        assert!(matches!(
            builder.load_csv(&path, false),
            Err(OdcError::RecordSlotOutOfRange { slot: 2, .. })
        ));
    }
}
