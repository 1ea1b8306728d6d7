use super::SparseZoneArray;
use crate::model::format::odc_format;
use crate::model::index::ZoneIndex;
use crate::model::{OdcError, ZoneId};
use byteorder::{LittleEndian, ReadBytesExt};
use lru::LruCache;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

type MakeFn<T> = Box<dyn Fn(ZoneId, &[f32]) -> T + Send>;

/// lookups against a zone cache file. each zone's floats are converted with `make`
/// and the converted values are kept in an LRU cache.
pub struct ZoneCache<T> {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    highest_zone: ZoneId,
    version: i32,
    types: usize,
    file_size: u64,
    index: ZoneIndex,
    make: MakeFn<T>,
    cache: LruCache<ZoneId, T>,
}

impl ZoneCache<Vec<f32>> {
    /// a cache returning the stored floats as they are.
    pub fn open_raw(path: &Path) -> Result<ZoneCache<Vec<f32>>, OdcError> {
        ZoneCache::open(path, |_, values| values.to_vec())
    }
}

impl<T> ZoneCache<T> {
    pub fn open<F>(path: &Path, make: F) -> Result<ZoneCache<T>, OdcError>
    where
        F: Fn(ZoneId, &[f32]) -> T + Send + 'static,
    {
        ZoneCache::with_capacity(path, odc_format::DEFAULT_CACHE_CAPACITY, make)
    }

    pub fn with_capacity<F>(path: &Path, capacity: usize, make: F) -> Result<ZoneCache<T>, OdcError>
    where
        F: Fn(ZoneId, &[f32]) -> T + Send + 'static,
    {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            OdcError::InvalidDimensions(String::from("zone cache capacity must be positive"))
        })?;
        let loaded = load(path)?;
        log::info!(
            "opened {} (version {}) with {} data types over {} zones in {} segments",
            path.display(),
            loaded.version,
            loaded.types,
            loaded.index.zone_count(),
            loaded.index.segments.len()
        );
        Ok(ZoneCache {
            path: path.to_path_buf(),
            reader: Some(loaded.reader),
            highest_zone: loaded.highest_zone,
            version: loaded.version,
            types: loaded.types,
            file_size: loaded.file_size,
            index: loaded.index,
            make: Box::new(make),
            cache: LruCache::new(capacity),
        })
    }

    /// the converted values of `zone`. zones outside every segment convert a vector
    /// of zeros.
    pub fn get(&mut self, zone: ZoneId) -> Result<&T, OdcError> {
        if !self.cache.contains(&zone) {
            let values = self.read_zone(zone)?;
            let value = (self.make)(zone, &values);
            self.cache.put(zone, value);
        }
        self.cache
            .get(&zone)
            .ok_or_else(|| OdcError::InternalError(format!("zone {zone} missing from cache")))
    }

    /// reads every segment sequentially and converts each zone.
    pub fn store_all(&mut self) -> Result<SparseZoneArray<T>, OdcError> {
        if self.reader.is_none() {
            self.reload()?;
        }
        let reader = self.reader.as_mut().ok_or_else(|| {
            OdcError::InternalError(format!("{} has no open file handle", self.path.display()))
        })?;
        let mut values = Vec::with_capacity(self.index.zone_count());
        let mut buffer = vec![0.0f32; self.types];
        for segment in self.index.segments.iter() {
            reader
                .seek(SeekFrom::Start(segment.location))
                .map_err(|e| OdcError::read(&self.path, e))?;
            for zone in segment.range.iter() {
                reader
                    .read_f32_into::<LittleEndian>(&mut buffer)
                    .map_err(|e| OdcError::read(&self.path, e))?;
                values.push((self.make)(zone, &buffer));
            }
        }
        let ranges = self.index.segments.iter().map(|s| s.range).collect();
        Ok(SparseZoneArray::new(ranges, values))
    }

    /// drops the file handle, the next read reopens the file.
    pub fn release(&mut self) {
        self.reader = None;
    }

    pub fn types(&self) -> usize {
        self.types
    }

    /// the highest zone recorded in the file header.
    pub fn highest_zone(&self) -> ZoneId {
        self.highest_zone
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn index(&self) -> &ZoneIndex {
        &self.index
    }

    fn reload(&mut self) -> Result<(), OdcError> {
        let loaded = load(&self.path)?;
        log::debug!("reopened {}", self.path.display());
        self.reader = Some(loaded.reader);
        self.highest_zone = loaded.highest_zone;
        self.version = loaded.version;
        self.types = loaded.types;
        self.file_size = loaded.file_size;
        self.index = loaded.index;
        Ok(())
    }

    fn read_zone(&mut self, zone: ZoneId) -> Result<Vec<f32>, OdcError> {
        let mut values = vec![0.0f32; self.types];
        let bytes = (self.types * odc_format::FLOAT_BYTES) as u64;
        let position = match self.index.position(zone, self.types) {
            Some(p) if p + bytes <= self.file_size => p,
            _ => return Ok(values),
        };
        if self.reader.is_none() {
            self.reload()?;
        }
        let reader = self.reader.as_mut().ok_or_else(|| {
            OdcError::InternalError(format!("{} has no open file handle", self.path.display()))
        })?;
        reader
            .seek(SeekFrom::Start(position))
            .map_err(|e| OdcError::read(&self.path, e))?;
        reader
            .read_f32_into::<LittleEndian>(&mut values)
            .map_err(|e| OdcError::read(&self.path, e))?;
        Ok(values)
    }
}

struct LoadedZoneFile {
    reader: BufReader<File>,
    highest_zone: ZoneId,
    version: i32,
    types: usize,
    file_size: u64,
    index: ZoneIndex,
}

fn load(path: &Path) -> Result<LoadedZoneFile, OdcError> {
    if !path.exists() {
        return Err(OdcError::FileNotFound(path.to_string_lossy().to_string()));
    }
    let file = File::open(path).map_err(|e| OdcError::open(path, e))?;
    let file_size = file
        .metadata()
        .map_err(|e| OdcError::read(path, e))?
        .len();
    let mut reader = BufReader::with_capacity(0x5000, file);
    let mut header = [0i32; 3];
    reader
        .read_i32_into::<LittleEndian>(&mut header)
        .map_err(|e| OdcError::read(path, e))?;
    let [highest_zone, version, types] = header;
    let (highest_zone, types) = match (usize::try_from(highest_zone), usize::try_from(types)) {
        (Ok(z), Ok(t)) if t > 0 => (z, t),
        _ => {
            return Err(OdcError::InvalidDimensions(format!(
                "{} stores highest zone {highest_zone} and {types} data types",
                path.display()
            )))
        }
    };
    let index = if version >= odc_format::CURRENT_VERSION {
        ZoneIndex::read_from(&mut reader, path)?
    } else {
        ZoneIndex::dense(highest_zone)
    };
    Ok(LoadedZoneFile {
        reader,
        highest_zone,
        version,
        types,
        file_size,
        index,
    })
}

impl<T> std::fmt::Debug for ZoneCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneCache")
            .field("path", &self.path)
            .field("version", &self.version)
            .field("types", &self.types)
            .field("segments", &self.index.segments.len())
            .finish()
    }
}
