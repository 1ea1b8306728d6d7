use crate::config::OdcBuildConfiguration;
use crate::model::builder::OdcBuilder;
use crate::model::export::{store_all_ops, SparseOdMatrix};
use crate::model::format::{has_commit_marker, odc_format, OdcHeader, OdcMetadata};
use crate::model::index::OdIndex;
use crate::model::{OdcError, ZoneId};
use byteorder::{ByteOrder, LittleEndian};
use lru::LruCache;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// point lookups against a cache file.
///
/// only the header and index are held in memory. records are read on demand and kept
/// in a small LRU cache keyed by OD pair. an instance owns its file handle and is
/// meant to be used from one thread; open one instance per thread for parallel reads.
pub struct OdCache {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    header: OdcHeader,
    index: OdIndex,
    record_buffer: Vec<u8>,
    cache: LruCache<(ZoneId, ZoneId), Vec<f32>>,
}

impl OdCache {
    pub fn open(path: &Path) -> Result<OdCache, OdcError> {
        OdCache::with_capacity(path, odc_format::DEFAULT_CACHE_CAPACITY)
    }

    /// opens a cache retaining up to `capacity` records in memory.
    pub fn with_capacity(path: &Path, capacity: usize) -> Result<OdCache, OdcError> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            OdcError::InvalidDimensions(String::from("record cache capacity must be positive"))
        })?;
        let (reader, header, index) = load(path)?;
        log::info!(
            "opened {} (version {}) with {} time periods, {} data types, {} origin blocks and {} destination blocks",
            path.display(),
            header.version,
            header.times,
            header.types,
            index.blocks.len(),
            index.sub_block_count()
        );
        Ok(OdCache {
            path: path.to_path_buf(),
            reader: Some(reader),
            record_buffer: vec![0u8; header.record_len() * odc_format::FLOAT_BYTES],
            header,
            index,
            cache: LruCache::new(capacity),
        })
    }

    /// true if the file exists and was committed.
    pub fn fully_loaded(path: &Path) -> bool {
        match File::open(path) {
            Ok(mut file) => has_commit_marker(&mut file),
            Err(_) => false,
        }
    }

    /// a single value, 0.0 for pairs without a record.
    pub fn get(
        &mut self,
        origin: ZoneId,
        destination: ZoneId,
        time: usize,
        data_type: usize,
    ) -> Result<f32, OdcError> {
        if time >= self.header.times || data_type >= self.header.types {
            return Err(OdcError::RecordSlotOutOfRange {
                slot: self.header.times * data_type + time,
                record_len: self.record_len(),
            });
        }
        let slot = self.header.times * data_type + time;
        let record = self.record(origin, destination)?;
        Ok(record[slot])
    }

    /// the value of the first data type at `time`.
    pub fn get_at_time(&mut self, origin: ZoneId, destination: ZoneId, time: usize) -> Result<f32, OdcError> {
        self.get(origin, destination, time, 0)
    }

    pub fn get_od(&mut self, origin: ZoneId, destination: ZoneId) -> Result<f32, OdcError> {
        self.get(origin, destination, 0, 0)
    }

    /// the full record of a pair, all zeros when the pair has no record. reopens the
    /// file if it was released.
    pub fn record(&mut self, origin: ZoneId, destination: ZoneId) -> Result<&[f32], OdcError> {
        let key = (origin, destination);
        if !self.cache.contains(&key) {
            let record = self.read_record(origin, destination)?;
            self.cache.put(key, record);
        }
        self.cache
            .get(&key)
            .map(|r| r.as_slice())
            .ok_or_else(|| OdcError::InternalError(format!("record ({origin}, {destination}) missing from cache")))
    }

    pub fn contains_index(&self, origin: ZoneId, destination: ZoneId) -> bool {
        self.index.contains(origin, destination)
    }

    /// reads every stored record into memory.
    pub fn store_all(&mut self) -> Result<SparseOdMatrix, OdcError> {
        self.ensure_open()?;
        let reader = self.reader.as_mut().ok_or_else(|| {
            OdcError::InternalError(format!("{} has no open file handle", self.path.display()))
        })?;
        store_all_ops::store_all(
            reader,
            &self.index,
            self.header.times,
            self.header.record_len(),
            &self.path,
        )
    }

    /// drops the file handle. the index and cached records are kept, and the next read
    /// reopens the same file.
    pub fn release(&mut self) {
        self.reader = None;
    }

    pub fn close(self) {}

    /// reopens the file and reloads its header and index. cached records are dropped
    /// since the file may have been rewritten.
    pub fn reload(&mut self) -> Result<(), OdcError> {
        self.reopen()?;
        self.cache.clear();
        Ok(())
    }

    fn reopen(&mut self) -> Result<(), OdcError> {
        let (reader, header, index) = load(&self.path)?;
        log::debug!("reopened {}", self.path.display());
        self.record_buffer = vec![0u8; header.record_len() * odc_format::FLOAT_BYTES];
        self.reader = Some(reader);
        self.header = header;
        self.index = index;
        Ok(())
    }

    /// rebuilds this cache from the raw sources listed in its `<stem>.json` manifest,
    /// saving the result under the same file name in `output_directory`.
    pub fn regenerate(&self, data_directory: &Path, output_directory: &Path) -> Result<(), OdcError> {
        let manifest_path = self.path.with_extension("json");
        let manifest = OdcBuildConfiguration::try_from(manifest_path.as_path())?;
        let file_name = self.path.file_name().ok_or_else(|| {
            OdcError::InternalError(format!("{} has no file name", self.path.display()))
        })?;
        let builder = OdcBuilder::from_manifest(&manifest, data_directory)?;
        builder.save(&output_directory.join(file_name), true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn times(&self) -> usize {
        self.header.times
    }

    pub fn types(&self) -> usize {
        self.header.types
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn record_len(&self) -> usize {
        self.header.record_len()
    }

    pub fn metadata(&self) -> &OdcMetadata {
        &self.header.metadata
    }

    pub fn index(&self) -> &OdIndex {
        &self.index
    }

    /// the last origin holding data, None for a cache without blocks.
    pub fn highest_zone(&self) -> Option<ZoneId> {
        self.index.highest_zone()
    }

    fn ensure_open(&mut self) -> Result<(), OdcError> {
        if self.reader.is_none() {
            self.reopen()?;
        }
        Ok(())
    }

    fn read_record(&mut self, origin: ZoneId, destination: ZoneId) -> Result<Vec<f32>, OdcError> {
        let record_len = self.record_len();
        let position = match self
            .index
            .position(origin, destination, self.record_buffer.len() as u64)
        {
            Some(p) => p,
            None => return Ok(vec![0.0; record_len]),
        };
        self.ensure_open()?;
        let reader = self.reader.as_mut().ok_or_else(|| {
            OdcError::InternalError(format!("{} has no open file handle", self.path.display()))
        })?;
        reader
            .seek(SeekFrom::Start(position))
            .map_err(|e| OdcError::read(&self.path, e))?;
        reader
            .read_exact(&mut self.record_buffer)
            .map_err(|e| OdcError::read(&self.path, e))?;
        let mut record = vec![0.0; record_len];
        LittleEndian::read_f32_into(&self.record_buffer, &mut record);
        Ok(record)
    }
}

fn load(path: &Path) -> Result<(BufReader<File>, OdcHeader, OdIndex), OdcError> {
    if !path.exists() {
        return Err(OdcError::FileNotFound(path.to_string_lossy().to_string()));
    }
    let file = File::open(path).map_err(|e| OdcError::open(path, e))?;
    let mut reader = BufReader::with_capacity(0x1000, file);
    let header = OdcHeader::read_from(&mut reader, path)?;
    if header.record_len() == 0 {
        return Err(OdcError::InvalidDimensions(format!(
            "{} stores {} time periods and {} data types",
            path.display(),
            header.times,
            header.types
        )));
    }
    let index = OdIndex::read_from(&mut reader, path)?;
    Ok((reader, header, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::format::odc_metadata::YEAR;

    fn build_cache(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("test.odc");
        let mut builder = OdcBuilder::new(6, 2, 2, 5)
            .expect("should create builder")
            .with_metadata(YEAR, "2016");
        builder
            .set_record(1, 1, &[1.0, 2.0, 3.0, 4.0])
            .expect("should set record");
        builder
            .set_record(1, 4, &[5.0, 6.0, 7.0, 8.0])
            .expect("should set record");
        builder
            .set_value(2, 2, 1, 1, 9.0)
            .expect("should set value");
        builder
            .set_value(5, 0, 0, 0, 10.0)
            .expect("should set value");
        builder.save(&path, false).expect("should save cache");
        path
    }

    #[test]
    fn test_point_lookups() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = build_cache(&dir);
        let mut cache = OdCache::open(&path).expect("should open cache");
        assert_eq!(cache.times(), 2);
        assert_eq!(cache.types(), 2);
        assert_eq!(cache.version(), 2);
        assert_eq!(cache.metadata().year(), Some("2016"));
        assert_eq!(cache.highest_zone(), Some(5));
        // slot = times * type + time
        assert_eq!(cache.get(1, 1, 1, 0).expect("should read"), 2.0);
        assert_eq!(cache.get(1, 4, 0, 1).expect("should read"), 7.0);
        assert_eq!(cache.get(2, 2, 1, 1).expect("should read"), 9.0);
        assert_eq!(cache.get_at_time(1, 4, 1).expect("should read"), 6.0);
        assert_eq!(cache.get_od(5, 0).expect("should read"), 10.0);
        assert_eq!(cache.get_od(3, 3).expect("should read"), 0.0);
        assert_eq!(cache.get_od(1, 2).expect("should read"), 0.0);
        assert!(cache.contains_index(1, 4));
        assert!(!cache.contains_index(0, 0));
    }

    #[test]
    fn test_slot_outside_record() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = build_cache(&dir);
        let mut cache = OdCache::open(&path).expect("should open cache");
        assert!(matches!(
            cache.get(1, 1, 2, 0),
            Err(OdcError::RecordSlotOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = OdCache::open(Path::new("/no/such/file.odc"));
        assert!(matches!(result, Err(OdcError::FileNotFound(_))));
        assert!(!OdCache::fully_loaded(Path::new("/no/such/file.odc")));
    }

    #[test]
    fn test_small_cache_evicts_and_rereads() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = build_cache(&dir);
        let mut cache = OdCache::with_capacity(&path, 1).expect("should open cache");
        assert_eq!(cache.get_od(1, 1).expect("should read"), 1.0);
        assert_eq!(cache.get_od(1, 4).expect("should read"), 5.0);
        assert_eq!(cache.get_od(1, 1).expect("should read"), 1.0);
        assert!(OdCache::with_capacity(&path, 0).is_err());
    }

    #[test]
    fn test_reload_drops_records_of_the_old_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = build_cache(&dir);
        let mut cache = OdCache::open(&path).expect("should open cache");
        assert_eq!(cache.get_od(1, 1).expect("should read"), 1.0);

        let mut builder = OdcBuilder::new(6, 2, 2, 5).expect("should create builder");
        builder
            .set_record(1, 1, &[11.0, 12.0, 13.0, 14.0])
            .expect("should set record");
        builder.save(&path, false).expect("should rewrite cache");

        cache.reload().expect("should reload cache");
        assert_eq!(cache.get_od(1, 1).expect("should read"), 11.0);
        assert_eq!(cache.highest_zone(), Some(1));
        assert_eq!(cache.metadata().year(), None);
    }
}
