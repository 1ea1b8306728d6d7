use super::{LoadRequest, SparseOdMatrix};
use crate::model::format::odc_format;
use crate::model::index::OdIndex;
use crate::model::OdcError;
use byteorder::{ByteOrder, LittleEndian};
use crossbeam_channel::bounded;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// number of allocated blocks that may wait for the data read to finish.
pub const LOAD_QUEUE_CAPACITY: usize = 50;

/// reads every stored record.
///
/// a scoped thread allocates the origin rows of each block and queues them in disk
/// order while the calling thread reads the whole data section with one sequential
/// read. the queued rows are then filled from that buffer with a single running
/// cursor, which relies on blocks and their sub-blocks being stored back to back.
pub fn store_all<R: Read + Seek>(
    reader: &mut R,
    index: &OdIndex,
    times: usize,
    record_len: usize,
    path: &Path,
) -> Result<SparseOdMatrix, OdcError> {
    let data_start = match index.data_start() {
        Some(start) => start,
        None => {
            return Ok(SparseOdMatrix::new(
                index.blocks.clone(),
                empty_rows(index),
                times,
                record_len,
            ))
        }
    };

    let rows = std::thread::scope(|scope| -> Result<Vec<Vec<f32>>, OdcError> {
        let (sender, receiver) = bounded::<LoadRequest>(LOAD_QUEUE_CAPACITY);
        let producer = scope.spawn(move || {
            for (block_idx, block) in index.blocks.iter().enumerate() {
                let row_len = block.total_width() * record_len;
                let rows = (0..block.range.width())
                    .map(|_| vec![0.0f32; row_len])
                    .collect();
                let request = LoadRequest {
                    block: block_idx,
                    rows,
                };
                if sender.send(request).is_err() {
                    // consumer stopped early after a failed read
                    break;
                }
            }
        });

        let buffer = read_data_section(reader, data_start, path)?;
        log::debug!(
            "read {} bytes of record data from {}",
            buffer.len(),
            path.display()
        );

        let mut cursor = 0;
        let mut rows = Vec::with_capacity(index.blocks.iter().map(|b| b.range.width()).sum());
        for request in receiver.iter() {
            let expected = request.byte_len();
            if cursor + expected > buffer.len() {
                return Err(OdcError::TruncatedData {
                    path: path.to_string_lossy().to_string(),
                    offset: data_start as usize + cursor,
                    expected,
                    found: buffer.len() - cursor,
                });
            }
            for mut row in request.rows {
                let bytes = row.len() * odc_format::FLOAT_BYTES;
                LittleEndian::read_f32_into(&buffer[cursor..cursor + bytes], &mut row);
                cursor += bytes;
                rows.push(row);
            }
        }
        producer.join().map_err(|_| {
            OdcError::InternalError(String::from("block allocation thread panicked"))
        })?;
        Ok(rows)
    })?;

    let matrix = SparseOdMatrix::new(index.blocks.clone(), rows, times, record_len);
    log::info!(
        "loaded {} records from {}",
        matrix.len(),
        path.display()
    );
    Ok(matrix)
}

fn read_data_section<R: Read + Seek>(reader: &mut R, data_start: u64, path: &Path) -> Result<Vec<u8>, OdcError> {
    let file_length = reader
        .seek(SeekFrom::End(0))
        .map_err(|e| OdcError::read(path, e))?;
    reader
        .seek(SeekFrom::Start(data_start))
        .map_err(|e| OdcError::read(path, e))?;
    let mut buffer = Vec::with_capacity(file_length.saturating_sub(data_start) as usize);
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| OdcError::read(path, e))?;
    Ok(buffer)
}

/// blocks without destination runs store no data but still own their origin rows.
fn empty_rows(index: &OdIndex) -> Vec<Vec<f32>> {
    index
        .blocks
        .iter()
        .flat_map(|b| b.range.iter().map(|_| vec![]))
        .collect()
}
