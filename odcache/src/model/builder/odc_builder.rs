use super::{index_ops, ingest_ops, odc_writer, OriginRow};
use crate::config::{DimensionInfo, OdcBuildConfiguration, SourceFormat};
use crate::model::format::{OdcHeader, OdcMetadata};
use crate::model::index::OdIndex;
use crate::model::reader::OdCache;
use crate::model::{OdcError, ZoneId};
use std::path::Path;

/// builds a cache file from one or more sources.
///
/// each origin row is allocated the first time the origin is seen and holds one record
/// of `types * times` floats per destination. later sources may fill other slots of
/// records written by earlier ones. the rows are dropped when the builder is saved.
pub struct OdcBuilder {
    capacity: usize,
    types: usize,
    times: usize,
    rows: Vec<Option<OriginRow>>,
    manifest: OdcBuildConfiguration,
}

impl OdcBuilder {
    /// zone ids on both axes must be below `zone_capacity`. `gap` is a capacity hint for
    /// the number of origin blocks.
    pub fn new(zone_capacity: usize, types: usize, times: usize, gap: usize) -> Result<OdcBuilder, OdcError> {
        if types == 0 || times == 0 {
            return Err(OdcError::InvalidDimensions(format!(
                "a cache needs at least one type and one time period, found types={types} times={times}"
            )));
        }
        let mut rows = Vec::with_capacity(zone_capacity);
        rows.resize_with(zone_capacity, || None);
        Ok(OdcBuilder {
            capacity: zone_capacity,
            types,
            times,
            rows,
            manifest: OdcBuildConfiguration::new(zone_capacity, types, times, gap),
        })
    }

    /// creates a builder sized by `manifest` and ingests each of its files, resolved
    /// against `data_directory`, in order.
    pub fn from_manifest(manifest: &OdcBuildConfiguration, data_directory: &Path) -> Result<OdcBuilder, OdcError> {
        let mut builder = OdcBuilder::new(
            manifest.zone_capacity,
            manifest.types,
            manifest.times,
            manifest.gap,
        )?;
        for (key, value) in manifest.metadata.iter() {
            builder.set_metadata(key, value);
        }
        for info in manifest.files.iter() {
            builder.load(info, data_directory)?;
        }
        Ok(builder)
    }

    /// loads every stored record of an existing cache so it can be extended and saved
    /// again. the zone capacity covers the highest stored origin and destination.
    pub fn from_odc_file(path: &Path) -> Result<OdcBuilder, OdcError> {
        let mut cache = OdCache::open(path)?;
        let capacity = cache
            .index()
            .highest_zone()
            .into_iter()
            .chain(cache.index().highest_destination())
            .max()
            .map(|z| z + 1)
            .unwrap_or(0);
        let mut builder = OdcBuilder::new(capacity, cache.types(), cache.times(), 5)?;
        for (key, value) in cache.metadata().iter() {
            builder.set_metadata(key, value);
        }
        let matrix = cache.store_all()?;
        cache.close();
        for (origin, destination, record) in matrix.iter() {
            builder.set_record(origin, destination, record)?;
        }
        log::info!(
            "loaded {} records from {} into a builder with zone capacity {}",
            matrix.len(),
            path.display(),
            capacity
        );
        Ok(builder)
    }

    /// exclusive upper bound on zone ids.
    pub fn zone_capacity(&self) -> usize {
        self.capacity
    }

    pub fn types(&self) -> usize {
        self.types
    }

    pub fn times(&self) -> usize {
        self.times
    }

    pub fn record_len(&self) -> usize {
        self.types * self.times
    }

    /// the sources ingested so far, in call order.
    pub fn manifest(&self) -> &OdcBuildConfiguration {
        &self.manifest
    }

    pub fn metadata(&self) -> &OdcMetadata {
        &self.manifest.metadata
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> OdcBuilder {
        self.set_metadata(key, value);
        self
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.manifest.metadata.insert(key, value);
    }

    /// ingests `origin,destination,v0,v1,...` rows where the values of a row fill
    /// consecutive time periods of type `offset_type`, starting at `offset_times`.
    pub fn load_csv_times(
        &mut self,
        path: &Path,
        header: bool,
        offset_times: usize,
        offset_type: usize,
    ) -> Result<(), OdcError> {
        ingest_ops::load_csv_times(self, path, header, offset_times, offset_type)
    }

    /// ingests `origin,destination,v0,v1,...` rows where the values of a row fill
    /// consecutive data types of time period `offset_times`, starting at `offset_type`.
    pub fn load_csv_types(
        &mut self,
        path: &Path,
        header: bool,
        offset_times: usize,
        offset_type: usize,
    ) -> Result<(), OdcError> {
        ingest_ops::load_csv_types(self, path, header, offset_times, offset_type)
    }

    /// ingests a fixed-width matrix punch file into slot `(offset_times, offset_type)`.
    pub fn load_emme2(&mut self, path: &Path, offset_times: usize, offset_type: usize) -> Result<(), OdcError> {
        ingest_ops::load_emme2(self, path, offset_times, offset_type)
    }

    /// ingests one manifest entry.
    pub fn load(&mut self, info: &DimensionInfo, data_directory: &Path) -> Result<(), OdcError> {
        let path = data_directory.join(&info.file_name);
        log::debug!(
            "ingesting {} as {} into type {} time {}",
            path.display(),
            info.format,
            info.type_index,
            info.time_index
        );
        match info.format {
            SourceFormat::CsvTimes => {
                self.load_csv_times(&path, info.header, info.time_index, info.type_index)
            }
            SourceFormat::CsvTypes => {
                self.load_csv_types(&path, info.header, info.time_index, info.type_index)
            }
            SourceFormat::Emme2 => self.load_emme2(&path, info.time_index, info.type_index),
        }
    }

    pub fn set_value(
        &mut self,
        origin: ZoneId,
        destination: ZoneId,
        time: usize,
        data_type: usize,
        value: f32,
    ) -> Result<(), OdcError> {
        self.check_zone(origin)?;
        self.check_zone(destination)?;
        if time >= self.times || data_type >= self.types {
            return Err(OdcError::RecordSlotOutOfRange {
                slot: self.times * data_type + time,
                record_len: self.record_len(),
            });
        }
        let slot = self.times * data_type + time;
        self.write_slot(origin, destination, slot, value)
    }

    pub fn set_record(&mut self, origin: ZoneId, destination: ZoneId, record: &[f32]) -> Result<(), OdcError> {
        self.check_zone(origin)?;
        self.check_zone(destination)?;
        if record.len() != self.record_len() {
            return Err(OdcError::InvalidDimensions(format!(
                "record for ({origin}, {destination}) has {} values, expected {}",
                record.len(),
                self.record_len()
            )));
        }
        self.row_mut(origin).set_record(destination, record);
        Ok(())
    }

    /// the record written for a pair, None when nothing was written to it.
    pub fn record(&self, origin: ZoneId, destination: ZoneId) -> Option<&[f32]> {
        self.row(origin)
            .filter(|row| row.has_data(destination))
            .map(|row| row.record(destination))
    }

    pub fn has_data(&self, origin: ZoneId, destination: ZoneId) -> bool {
        self.row(origin).map(|r| r.has_data(destination)).unwrap_or(false)
    }

    /// whether a row was allocated for `origin`, which happens as soon as a source
    /// mentions the origin even when no value follows.
    pub fn has_origin(&self, origin: ZoneId) -> bool {
        self.row(origin).is_some()
    }

    /// computes the sparse index and writes the cache file, committing it only once
    /// everything else is on disk. with `write_manifest` the ingested sources are also
    /// written next to the cache as `<stem>.json`.
    pub fn save(self, path: &Path, write_manifest: bool) -> Result<(), OdcError> {
        if write_manifest {
            self.manifest.write_json(&path.with_extension("json"))?;
        }
        let blocks = index_ops::create_outer_blocks(&self.rows, self.manifest.gap);
        let mut index = OdIndex::new(blocks);
        let sub_blocks = index_ops::attach_sub_blocks(&mut index.blocks, &self.rows, self.capacity);
        let header = OdcHeader::new(self.times, self.types, self.manifest.metadata.clone());
        let bytes = odc_writer::write_odc(path, &header, &mut index, &self.rows)?;
        log::info!(
            "wrote {} with {} origin blocks, {} destination blocks, {} records, {} bytes",
            path.display(),
            index.blocks.len(),
            sub_blocks,
            index.record_count(),
            bytes
        );
        Ok(())
    }

    pub(super) fn add_source(&mut self, info: DimensionInfo) {
        self.manifest.add(info);
    }

    /// the row of `origin`, allocated on first use. the caller has bounds checked it.
    pub(super) fn row_mut(&mut self, origin: ZoneId) -> &mut OriginRow {
        let capacity = self.capacity;
        let record_len = self.record_len();
        self.rows[origin].get_or_insert_with(|| OriginRow::new(capacity, record_len))
    }

    pub(super) fn write_slot(
        &mut self,
        origin: ZoneId,
        destination: ZoneId,
        slot: usize,
        value: f32,
    ) -> Result<(), OdcError> {
        let record_len = self.record_len();
        if slot >= record_len {
            return Err(OdcError::RecordSlotOutOfRange { slot, record_len });
        }
        self.row_mut(origin).set(destination, slot, value);
        Ok(())
    }

    fn row(&self, origin: ZoneId) -> Option<&OriginRow> {
        self.rows.get(origin).and_then(|r| r.as_ref())
    }

    fn check_zone(&self, zone: ZoneId) -> Result<(), OdcError> {
        if zone >= self.capacity {
            Err(OdcError::ZoneBeyondCapacity {
                zone,
                capacity: self.capacity,
            })
        } else {
            Ok(())
        }
    }
}

/// regenerates a cache file from a build manifest and the raw files it lists.
pub fn create_odc(cache_file: &Path, manifest_file: &Path, data_directory: &Path) -> Result<(), OdcError> {
    let manifest = OdcBuildConfiguration::try_from(manifest_file)?;
    let builder = OdcBuilder::from_manifest(&manifest, data_directory)?;
    builder.save(cache_file, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::format::odc_metadata::DESCRIPTION;

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            OdcBuilder::new(10, 0, 1, 5),
            Err(OdcError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_set_value_uses_type_major_slots() {
        let mut builder = OdcBuilder::new(5, 2, 3, 5).expect("should create builder");
        builder
            .set_value(1, 2, 2, 1, 7.5)
            .expect("should set value");
        let record = builder.record(1, 2).expect("record should exist");
        assert_eq!(record[5], 7.5);
        assert_eq!(record.iter().filter(|v| **v != 0.0).count(), 1);
        assert!(builder.record(1, 3).is_none());
        assert!(builder.has_origin(1));
        assert!(!builder.has_origin(0));
    }

    #[test]
    fn test_out_of_capacity_values_fail() {
        let mut builder = OdcBuilder::new(5, 1, 1, 5).expect("should create builder");
        assert!(matches!(
            builder.set_value(5, 0, 0, 0, 1.0),
            Err(OdcError::ZoneBeyondCapacity { zone: 5, capacity: 5 })
        ));
        assert!(matches!(
            builder.set_value(0, 0, 1, 0, 1.0),
            Err(OdcError::RecordSlotOutOfRange { .. })
        ));
        assert!(matches!(
            builder.set_record(0, 0, &[1.0, 2.0]),
            Err(OdcError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_metadata_is_kept_in_manifest() {
        let builder = OdcBuilder::new(5, 1, 1, 5)
            .expect("should create builder")
            .with_metadata(DESCRIPTION, "test cache");
        assert_eq!(builder.metadata().description(), Some("test cache"));
        assert_eq!(builder.manifest().zone_capacity, 5);
    }
}
