use crate::model::export::SparseOdMatrix;
use crate::app::OdcCliError;
use itertools::Itertools;
use std::io::Write;

/// writes every record as `origin,destination,v0,...` rows with a header. values are
/// in record order, type-major.
pub fn write_records<W: Write>(matrix: &SparseOdMatrix, output: W) -> Result<usize, OdcCliError> {
    let mut writer = csv::WriterBuilder::new().from_writer(output);
    let header = ["origin".to_string(), "destination".to_string()]
        .into_iter()
        .chain((0..matrix.record_len()).map(|i| format!("v{i}")))
        .collect_vec();
    writer.write_record(&header)?;
    let mut rows = 0;
    for (origin, destination, record) in matrix.iter() {
        let mut row = Vec::with_capacity(record.len() + 2);
        row.push(origin.to_string());
        row.push(destination.to_string());
        row.extend(record.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}
