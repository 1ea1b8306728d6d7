use crate::model::OdcError;
use std::io::{Seek, SeekFrom};
use std::path::Path;

/// number of bytes between the current position and the end of the file. the
/// position is left unchanged.
pub fn remaining_bytes<R: Seek>(reader: &mut R, path: &Path) -> Result<u64, OdcError> {
    let read_error = |e| OdcError::read(path, e);
    let position = reader.stream_position().map_err(read_error)?;
    let end = reader.seek(SeekFrom::End(0)).map_err(read_error)?;
    reader
        .seek(SeekFrom::Start(position))
        .map_err(read_error)?;
    Ok(end.saturating_sub(position))
}

/// validates a table length read from a file: `count` entries of `entry_bytes` each
/// must fit in what is left of the file. the count is returned as a usize so it can
/// size an allocation.
pub fn checked_table_len<R: Seek>(
    reader: &mut R,
    path: &Path,
    count: i64,
    entry_bytes: u64,
    table: &str,
) -> Result<usize, OdcError> {
    let corrupt = |message: String| OdcError::CorruptIndex {
        path: path.to_string_lossy().to_string(),
        message,
    };
    let entries = u64::try_from(count).map_err(|_| corrupt(format!("negative {table} count {count}")))?;
    let remaining = remaining_bytes(reader, path)?;
    match entries.checked_mul(entry_bytes) {
        Some(bytes) if bytes <= remaining => usize::try_from(entries)
            .map_err(|_| corrupt(format!("{table} count {count} does not fit in memory"))),
        _ => Err(corrupt(format!(
            "{table} count {count} needs more than the {remaining} bytes left in the file"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_remaining_bytes_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 40]);
        cursor.set_position(12);
        let remaining = remaining_bytes(&mut cursor, Path::new("t.odc")).expect("should seek");
        assert_eq!(remaining, 28);
        assert_eq!(cursor.position(), 12);
    }

    #[test]
    fn test_table_must_fit_in_file() {
        let mut cursor = Cursor::new(vec![0u8; 36]);
        cursor.set_position(4);
        let path = Path::new("t.odc");
        assert_eq!(
            checked_table_len(&mut cursor, path, 2, 16, "block").expect("two entries fit"),
            2
        );
        assert!(matches!(
            checked_table_len(&mut cursor, path, 3, 16, "block"),
            Err(OdcError::CorruptIndex { .. })
        ));
        assert!(matches!(
            checked_table_len(&mut cursor, path, -1, 16, "block"),
            Err(OdcError::CorruptIndex { .. })
        ));
        assert!(matches!(
            checked_table_len(&mut cursor, path, i64::MAX, 16, "block"),
            Err(OdcError::CorruptIndex { .. })
        ));
    }
}
