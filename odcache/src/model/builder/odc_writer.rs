use super::OriginRow;
use crate::model::format::{odc_format, OdcHeader};
use crate::model::index::OdIndex;
use crate::model::OdcError;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use kdam::tqdm;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// writes a complete cache file: header with the incomplete marker, the index with
/// freshly assigned data locations, then the data of each block row by row. the
/// commit marker is written last. returns the file length.
pub fn write_odc(
    path: &Path,
    header: &OdcHeader,
    index: &mut OdIndex,
    rows: &[Option<OriginRow>],
) -> Result<u64, OdcError> {
    let record_bytes = (header.record_len() * odc_format::FLOAT_BYTES) as u64;
    let file = File::create(path).map_err(|e| OdcError::write(path, e))?;
    let mut writer = BufWriter::with_capacity(0x10000, file);

    let index_offset = header.write_incomplete(&mut writer, path)?;
    let file_length = index.assign_locations(index_offset, record_bytes);
    index.write_to(&mut writer, index_offset, path)?;
    write_data(&mut writer, index, rows, path)?;

    let mut file = writer
        .into_inner()
        .map_err(|e| OdcError::write(path, e.into_error()))?;
    commit(&mut file).map_err(|e| OdcError::write(path, e))?;
    Ok(file_length)
}

/// each origin row of a block spans the records of all of the block's sub-blocks.
fn write_data<W: Write>(
    writer: &mut W,
    index: &OdIndex,
    rows: &[Option<OriginRow>],
    path: &Path,
) -> Result<(), OdcError> {
    let mut buffer: Vec<u8> = vec![];
    let block_iter = tqdm!(
        index.blocks.iter(),
        total = index.blocks.len(),
        desc = "write origin blocks"
    );
    for block in block_iter {
        for origin in block.range.iter() {
            let row = rows.get(origin).and_then(|r| r.as_ref()).ok_or_else(|| {
                OdcError::InternalError(format!(
                    "origin {origin} is indexed but has no row of data"
                ))
            })?;
            for sub in block.sub_blocks.iter() {
                let records = row.records(sub.range.start, sub.range.end);
                buffer.resize(records.len() * odc_format::FLOAT_BYTES, 0);
                LittleEndian::write_f32_into(records, &mut buffer);
                writer
                    .write_all(&buffer)
                    .map_err(|e| OdcError::write(path, e))?;
            }
        }
    }
    eprintln!();
    Ok(())
}

fn commit(file: &mut File) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_i32::<LittleEndian>(odc_format::CURRENT_VERSION)?;
    file.sync_all()
}
