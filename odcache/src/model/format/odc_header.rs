use super::{metadata_ops, odc_format, stream_ops, OdcMetadata};
use crate::model::OdcError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Seek, Write};
use std::path::Path;

/// the leading section of an OD cache file. on disk:
///
/// ```text
/// [0]  int32 commit marker / version
/// [4]  int32 times
/// [8]  int32 types
/// [12] int32 metadata length (version 2+)
///      metadata body
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OdcHeader {
    pub version: i32,
    pub times: usize,
    pub types: usize,
    pub metadata: OdcMetadata,
}

impl OdcHeader {
    pub fn new(times: usize, types: usize, metadata: OdcMetadata) -> OdcHeader {
        OdcHeader {
            version: odc_format::CURRENT_VERSION,
            times,
            types,
            metadata,
        }
    }

    /// number of floats stored per OD pair.
    pub fn record_len(&self) -> usize {
        self.times * self.types
    }

    /// reads the header, leaving `reader` positioned at the outer block count.
    /// a file still carrying the incomplete marker is rejected.
    pub fn read_from<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<OdcHeader, OdcError> {
        let version = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| OdcError::read(path, e))?;
        if version == odc_format::INCOMPLETE_MARKER {
            return Err(OdcError::NotFullyGenerated(
                path.to_string_lossy().to_string(),
            ));
        }
        let times = read_dimension(reader, path, "times")?;
        let types = read_dimension(reader, path, "types")?;
        let metadata = if version > odc_format::LEGACY_VERSION {
            read_metadata(reader, path)?
        } else {
            OdcMetadata::default()
        };
        Ok(OdcHeader {
            version,
            times,
            types,
            metadata,
        })
    }

    /// writes the header with the incomplete marker in front. returns the number of
    /// bytes written, which is the file offset of the outer block count.
    pub fn write_incomplete<W: Write>(&self, writer: &mut W, path: &Path) -> Result<u64, OdcError> {
        let body = metadata_ops::encode_metadata(&self.metadata).map_err(|e| OdcError::write(path, e))?;
        let write = |w: &mut W| -> std::io::Result<()> {
            w.write_i32::<LittleEndian>(odc_format::INCOMPLETE_MARKER)?;
            w.write_i32::<LittleEndian>(self.times as i32)?;
            w.write_i32::<LittleEndian>(self.types as i32)?;
            w.write_i32::<LittleEndian>(body.len() as i32)?;
            w.write_all(&body)
        };
        write(writer).map_err(|e| OdcError::write(path, e))?;
        Ok(odc_format::FIXED_HEADER_BYTES + odc_format::METADATA_LENGTH_BYTES + body.len() as u64)
    }
}

/// true when the first four bytes of the file hold a non-zero commit marker.
pub fn has_commit_marker<R: Read>(reader: &mut R) -> bool {
    matches!(reader.read_i32::<LittleEndian>(), Ok(marker) if marker != odc_format::INCOMPLETE_MARKER)
}

fn read_dimension<R: Read>(reader: &mut R, path: &Path, name: &str) -> Result<usize, OdcError> {
    let value = reader
        .read_i32::<LittleEndian>()
        .map_err(|e| OdcError::read(path, e))?;
    usize::try_from(value).map_err(|_| {
        OdcError::InvalidDimensions(format!(
            "{} stores a negative {name} count of {value}",
            path.to_string_lossy()
        ))
    })
}

fn read_metadata<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<OdcMetadata, OdcError> {
    let metadata_error = |source| OdcError::MetadataReadError {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let length = reader.read_i32::<LittleEndian>().map_err(metadata_error)?;
    if length <= 0 {
        return Ok(OdcMetadata::default());
    }
    let remaining = stream_ops::remaining_bytes(reader, path)?;
    if length as u64 > remaining {
        return Err(metadata_error(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("metadata block of {length} bytes runs past the {remaining} bytes left in the file"),
        )));
    }
    let mut body = vec![0u8; length as usize];
    reader.read_exact(&mut body).map_err(metadata_error)?;
    metadata_ops::decode_metadata(&body).map_err(metadata_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::format::odc_metadata::YEAR;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let header = OdcHeader::new(3, 2, OdcMetadata::default());
        let mut bytes = Vec::new();
        let written = header
            .write_incomplete(&mut bytes, Path::new("test.odc"))
            .expect("should write header");
        assert_eq!(written, 16);
        assert_eq!(bytes, vec![0, 0, 0, 0, 3, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_incomplete_header_is_rejected() {
        let header = OdcHeader::new(1, 1, OdcMetadata::default());
        let mut bytes = Vec::new();
        header
            .write_incomplete(&mut bytes, Path::new("test.odc"))
            .expect("should write header");
        let result = OdcHeader::read_from(&mut Cursor::new(bytes), Path::new("test.odc"));
        assert!(matches!(result, Err(OdcError::NotFullyGenerated(_))));
    }

    #[test]
    fn test_committed_header_with_metadata() {
        let mut metadata = OdcMetadata::default();
        metadata.insert(YEAR, "2011");
        let header = OdcHeader::new(4, 5, metadata);
        let mut bytes = Vec::new();
        let written = header
            .write_incomplete(&mut bytes, Path::new("test.odc"))
            .expect("should write header");
        bytes[0] = odc_format::CURRENT_VERSION as u8;
        let mut cursor = Cursor::new(bytes);
        let read = OdcHeader::read_from(&mut cursor, Path::new("test.odc"))
            .expect("should read header");
        assert_eq!(read, header);
        assert_eq!(read.record_len(), 20);
        assert_eq!(cursor.position(), written);
    }

    #[test]
    fn test_version_one_has_no_metadata_length() {
        let bytes: Vec<u8> = [1i32, 2, 3]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut cursor = Cursor::new(bytes);
        let read = OdcHeader::read_from(&mut cursor, Path::new("v1.odc"))
            .expect("should read version 1 header");
        assert_eq!(read.version, 1);
        assert!(read.metadata.is_empty());
        assert_eq!(cursor.position(), 12);
    }

    #[test]
    fn test_corrupt_metadata_names_the_file() {
        let mut bytes: Vec<u8> = [2i32, 1, 1, 40]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        bytes.extend_from_slice(&[1, 0, 0, 0]);
        let result = OdcHeader::read_from(&mut Cursor::new(bytes), Path::new("broken.odc"));
        match result {
            Err(e @ OdcError::MetadataReadError { .. }) => {
                assert!(e.to_string().contains("\"broken.odc\""));
            }
            other => panic!("expected metadata error, found {other:?}"),
        }
    }

    #[test]
    fn test_metadata_length_past_end_of_file() {
        let bytes: Vec<u8> = [2i32, 1, 1, i32::MAX]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let result = OdcHeader::read_from(&mut Cursor::new(bytes), Path::new("long.odc"));
        match result {
            Err(e @ OdcError::MetadataReadError { .. }) => {
                assert!(e.to_string().contains("runs past the 0 bytes left"));
            }
            other => panic!("expected metadata error, found {other:?}"),
        }
    }
}
