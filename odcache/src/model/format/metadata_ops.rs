use super::OdcMetadata;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, ErrorKind, Read};

/// writes a string as a 7-bit encoded byte length followed by its utf-8 bytes.
pub fn write_prefixed_string(buffer: &mut Vec<u8>, value: &str) {
    let mut remaining = value.len();
    while remaining >= 0x80 {
        buffer.push((remaining as u8 & 0x7f) | 0x80);
        remaining >>= 7;
    }
    buffer.push(remaining as u8);
    buffer.extend_from_slice(value.as_bytes());
}

/// reads a string written by [`write_prefixed_string`].
pub fn read_prefixed_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut length: usize = 0;
    let mut shift = 0;
    loop {
        if shift > 28 {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                "string length prefix is longer than 5 bytes",
            ));
        }
        let byte = reader.read_u8()?;
        length |= ((byte & 0x7f) as usize) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    let mut bytes = vec![0u8; length];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
}

/// encodes the metadata block body. an empty metadata set encodes to zero bytes so
/// the stored block length is 0.
pub fn encode_metadata(metadata: &OdcMetadata) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if metadata.is_empty() {
        return Ok(buffer);
    }
    buffer.write_i32::<LittleEndian>(metadata.len() as i32)?;
    for (key, value) in metadata.iter() {
        write_prefixed_string(&mut buffer, key);
        write_prefixed_string(&mut buffer, value);
    }
    Ok(buffer)
}

pub fn decode_metadata(bytes: &[u8]) -> io::Result<OdcMetadata> {
    if bytes.is_empty() {
        return Ok(OdcMetadata::default());
    }
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_i32::<LittleEndian>()?;
    if count < 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("negative metadata entry count {count}"),
        ));
    }
    (0..count)
        .map(|_| {
            let key = read_prefixed_string(&mut cursor)?;
            let value = read_prefixed_string(&mut cursor)?;
            Ok::<_, io::Error>((key, value))
        })
        .collect()
}
