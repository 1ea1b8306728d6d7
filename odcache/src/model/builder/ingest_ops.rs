use super::OdcBuilder;
use crate::config::{DimensionInfo, SourceFormat};
use crate::model::parse::{fast_parse, DelimitedSpans, FastParseError};
use crate::model::{OdcError, ZoneId};
use kdam::tqdm;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// origin and destination ids in the fixed-width format are 7 characters wide.
const EMME2_ZONE_WIDTH: usize = 7;
/// a destination id, a separator and a 5 character value.
const EMME2_ENTRY_WIDTH: usize = 13;
const EMME2_SHORT_VALUE_WIDTH: usize = 5;
const EMME2_LONG_VALUE_WIDTH: usize = 9;

pub fn load_csv_times(
    builder: &mut OdcBuilder,
    path: &Path,
    header: bool,
    offset_times: usize,
    offset_type: usize,
) -> Result<(), OdcError> {
    let reader = open_lines(path)?;
    builder.add_source(DimensionInfo::new(
        path,
        offset_type,
        offset_times,
        SourceFormat::CsvTimes,
        header,
    ));
    let inject = builder.times() * offset_type + offset_times;

    let mut rows = 0;
    let line_iter = tqdm!(
        reader.lines().enumerate(),
        desc = format!("load {}", path.display())
    );
    for (idx, line) in line_iter {
        let line = line.map_err(|e| OdcError::read(path, e))?;
        let line_number = idx + 1;
        if (header && idx == 0) || line.trim().is_empty() {
            continue;
        }
        let parse_error = |e| OdcError::parse(path, line_number, e);
        let mut spans = DelimitedSpans::comma(&line).peekable();
        let (origin, destination) = read_pair(&line, &mut spans).map_err(parse_error)?;
        let (origin, destination) = check_pair(builder, origin, destination, path, line_number)?;
        builder.row_mut(origin);

        let mut entry = 0;
        while let Some((start, end)) = spans.next() {
            // trailing delimiter
            if start == end && spans.peek().is_none() {
                break;
            }
            let value = fast_parse::parse_float(&line, start, end).map_err(parse_error)?;
            builder.write_slot(origin, destination, inject + entry, value)?;
            entry += 1;
        }
        rows += 1;
    }
    eprintln!();
    log::info!("loaded {rows} rows of time periods from {}", path.display());
    Ok(())
}

pub fn load_csv_types(
    builder: &mut OdcBuilder,
    path: &Path,
    header: bool,
    offset_times: usize,
    offset_type: usize,
) -> Result<(), OdcError> {
    if !path.exists() {
        return Err(OdcError::FileNotFound(path.to_string_lossy().to_string()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| OdcError::CsvReadError(path.to_string_lossy().to_string(), e))?;
    builder.add_source(DimensionInfo::new(
        path,
        offset_type,
        offset_times,
        SourceFormat::CsvTypes,
        header,
    ));
    let times = builder.times();

    let mut rows = 0;
    let record_iter = tqdm!(
        reader.records().enumerate(),
        desc = format!("load {}", path.display())
    );
    for (idx, record) in record_iter {
        let record =
            record.map_err(|e| OdcError::CsvReadError(path.to_string_lossy().to_string(), e))?;
        let line_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let parse_error = |e| OdcError::parse(path, line_number, e);
        let origin = parse_field(record.get(0)).map_err(parse_error)?;
        let destination = parse_field(record.get(1)).map_err(parse_error)?;
        let (origin, destination) = check_pair(builder, origin, destination, path, line_number)?;
        builder.row_mut(origin);

        for (entry, field) in record.iter().skip(2).enumerate() {
            if field.is_empty() {
                break;
            }
            let value = fast_parse::parse_float(field, 0, field.len()).map_err(parse_error)?;
            let slot = times * (offset_type + entry) + offset_times;
            builder.write_slot(origin, destination, slot, value)?;
        }
        rows += 1;
    }
    eprintln!();
    log::info!("loaded {rows} rows of data types from {}", path.display());
    Ok(())
}

/// reads a fixed-width matrix punch file. everything up to and including the first
/// line starting with `a` is a preamble. each following line holds a 7 character
/// origin and any number of 13 character destination entries:
///
/// ```text
///  ooooooo ddddddd:vvvvv ddddddd:vvvvv ...
/// ```
///
/// a separator other than `:` is followed by a 9 character value. ids beyond the
/// builder's zone capacity are dropped rather than rejected.
pub fn load_emme2(
    builder: &mut OdcBuilder,
    path: &Path,
    offset_times: usize,
    offset_type: usize,
) -> Result<(), OdcError> {
    let reader = open_lines(path)?;
    builder.add_source(DimensionInfo::new(
        path,
        offset_type,
        offset_times,
        SourceFormat::Emme2,
        false,
    ));
    let inject = builder.times() * offset_type + offset_times;
    let capacity = builder.zone_capacity();

    let mut in_preamble = true;
    let mut entries = 0;
    let mut skipped = 0;
    let line_iter = tqdm!(
        reader.lines().enumerate(),
        desc = format!("load {}", path.display())
    );
    for (idx, line) in line_iter {
        let line = line.map_err(|e| OdcError::read(path, e))?;
        if in_preamble {
            in_preamble = !line.starts_with('a');
            continue;
        }
        let length = line.len();
        if length < EMME2_ZONE_WIDTH {
            continue;
        }
        let parse_error = |e| OdcError::parse(path, idx + 1, e);
        let origin = fast_parse::parse_fixed_int(&line, 0, EMME2_ZONE_WIDTH).map_err(parse_error)?;
        let origin = match within(origin, capacity) {
            Some(o) => o,
            None => {
                skipped += 1;
                continue;
            }
        };
        builder.row_mut(origin);

        let mut pos = EMME2_ZONE_WIDTH;
        while pos + EMME2_ENTRY_WIDTH <= length {
            let destination =
                fast_parse::parse_fixed_int(&line, pos, EMME2_ZONE_WIDTH).map_err(parse_error)?;
            match within(destination, capacity) {
                Some(destination) => {
                    let value_start = pos + EMME2_ZONE_WIDTH + 1;
                    let value_width = if line.as_bytes()[pos + EMME2_ZONE_WIDTH] == b':' {
                        EMME2_SHORT_VALUE_WIDTH
                    } else {
                        EMME2_LONG_VALUE_WIDTH.min(length - value_start)
                    };
                    let value = fast_parse::parse_fixed_float(&line, value_start, value_width)
                        .map_err(parse_error)?;
                    builder.write_slot(origin, destination, inject, value)?;
                    entries += 1;
                }
                None => skipped += 1,
            }
            pos += EMME2_ENTRY_WIDTH;
        }
    }
    eprintln!();
    log::info!("loaded {entries} entries from {}", path.display());
    if skipped > 0 {
        log::debug!(
            "skipped {skipped} out of range zones in {} (zone capacity {capacity})",
            path.display()
        );
    }
    Ok(())
}

fn open_lines(path: &Path) -> Result<BufReader<File>, OdcError> {
    let file = File::open(path).map_err(|e| OdcError::open(path, e))?;
    Ok(BufReader::with_capacity(0x1000, file))
}

fn read_pair<I>(line: &str, spans: &mut I) -> Result<(i64, i64), FastParseError>
where
    I: Iterator<Item = (usize, usize)>,
{
    let missing = FastParseError::EmptyField {
        start: line.len(),
        end: line.len(),
    };
    let (start, end) = spans.next().ok_or_else(|| missing.clone())?;
    let origin = fast_parse::parse_int(line, start, end)?;
    let (start, end) = spans.next().ok_or(missing)?;
    let destination = fast_parse::parse_int(line, start, end)?;
    Ok((origin, destination))
}

fn parse_field(field: Option<&str>) -> Result<i64, FastParseError> {
    let field = field.unwrap_or_default();
    fast_parse::parse_int(field, 0, field.len())
}

fn within(zone: i64, capacity: usize) -> Option<ZoneId> {
    usize::try_from(zone).ok().filter(|z| *z < capacity)
}

/// delimited sources fail on ids the builder has no room for.
fn check_pair(
    builder: &OdcBuilder,
    origin: i64,
    destination: i64,
    path: &Path,
    line: usize,
) -> Result<(ZoneId, ZoneId), OdcError> {
    let capacity = builder.zone_capacity();
    let check = |zone: i64, axis: &'static str| {
        within(zone, capacity).ok_or_else(|| OdcError::ZoneOutOfRange {
            path: path.to_string_lossy().to_string(),
            line,
            axis,
            zone,
            capacity,
        })
    };
    Ok((check(origin, "origin")?, check(destination, "destination")?))
}

#[cfg(test)]
mod tests {
    use crate::model::builder::OdcBuilder;
    use crate::model::OdcError;
    use std::path::PathBuf;

    fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("should write source file");
        path
    }

    #[test]
    fn test_csv_times_fills_consecutive_time_periods() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_source(&dir, "times.csv", "o,d,t0,t1,t2\n1,2,1.5,2.5,3.5\n3,0,4,5,\n");
        let mut builder = OdcBuilder::new(5, 2, 3, 5).expect("should create builder");
        builder
            .load_csv_times(&path, true, 0, 1)
            .expect("should load file");
        assert_eq!(
            builder.record(1, 2).expect("record should exist"),
            &[0.0, 0.0, 0.0, 1.5, 2.5, 3.5]
        );
        assert_eq!(
            builder.record(3, 0).expect("record should exist"),
            &[0.0, 0.0, 0.0, 4.0, 5.0, 0.0]
        );
        assert_eq!(builder.manifest().files.len(), 1);
        assert_eq!(builder.manifest().files[0].file_name, "times.csv");
    }

    #[test]
    fn test_csv_times_single_trailing_value_marks_data() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_source(&dir, "times.csv", "0,4,9.25\n");
        let mut builder = OdcBuilder::new(5, 1, 1, 5).expect("should create builder");
        builder
            .load_csv_times(&path, false, 0, 0)
            .expect("should load file");
        assert!(builder.has_data(0, 4));
        assert_eq!(builder.record(0, 4), Some(&[9.25][..]));
    }

    #[test]
    fn test_csv_types_fills_type_slots_at_a_time_offset() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_source(&dir, "types.csv", "1, 1, 10, 20\n\n2,0,30,,99\n");
        let mut builder = OdcBuilder::new(3, 2, 2, 5).expect("should create builder");
        builder
            .load_csv_types(&path, false, 1, 0)
            .expect("should load file");
        // slot = times * type + time
        assert_eq!(
            builder.record(1, 1).expect("record should exist"),
            &[0.0, 10.0, 0.0, 20.0]
        );
        // values after the first empty field are ignored
        assert_eq!(
            builder.record(2, 0).expect("record should exist"),
            &[0.0, 30.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_malformed_value_is_fatal() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_source(&dir, "bad.csv", "0,1,2.0\n0,2,abc\n");
        let mut builder = OdcBuilder::new(5, 1, 1, 5).expect("should create builder");
        let result = builder.load_csv_times(&path, false, 0, 0);
        match result {
            Err(OdcError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, found {other:?}"),
        }
    }

    #[test]
    fn test_too_many_values_overflow_the_record() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_source(&dir, "wide.csv", "0,1,1,2,3\n");
        let mut builder = OdcBuilder::new(5, 1, 2, 5).expect("should create builder");
        let result = builder.load_csv_times(&path, false, 0, 0);
        assert!(matches!(
            result,
            Err(OdcError::RecordSlotOutOfRange {
                slot: 2,
                record_len: 2
            })
        ));
    }

    #[test]
    fn test_missing_source_file() {
        let mut builder = OdcBuilder::new(5, 1, 1, 5).expect("should create builder");
        let result = builder.load_csv_times(std::path::Path::new("/does/not/exist.csv"), false, 0, 0);
        assert!(matches!(result, Err(OdcError::FileNotFound(_))));
        let result = builder.load_csv_types(std::path::Path::new("/does/not/exist.csv"), false, 0, 0);
        assert!(matches!(result, Err(OdcError::FileNotFound(_))));
    }

    #[test]
    fn test_emme2_entries_after_preamble() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let contents = [
            "c punch file",
            "t matrices",
            "a matrix=mf10 auto",
            "      1      2:  1.5      3:  2.0",
            "      2      1 123.45678",
            "",
        ]
        .join("\n");
        let path = write_source(&dir, "auto.311", &contents);
        let mut builder = OdcBuilder::new(5, 1, 2, 5).expect("should create builder");
        builder
            .load_emme2(&path, 1, 0)
            .expect("should load file");
        assert_eq!(builder.record(1, 2), Some(&[0.0, 1.5][..]));
        assert_eq!(builder.record(1, 3), Some(&[0.0, 2.0][..]));
        let long = builder.record(2, 1).expect("record should exist");
        assert!((long[1] - 123.45678).abs() < 1e-4);
        assert!(!builder.has_origin(0));
    }
}
