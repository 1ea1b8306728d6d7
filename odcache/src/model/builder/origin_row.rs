use crate::model::ZoneId;

/// every destination record of one origin, allocated the first time the origin is
/// written. `has_data` is the source of truth for which records get stored, a record
/// of zeros is still stored when it was written.
#[derive(Clone, Debug)]
pub struct OriginRow {
    values: Vec<f32>,
    has_data: Vec<bool>,
    record_len: usize,
}

impl OriginRow {
    pub fn new(capacity: usize, record_len: usize) -> OriginRow {
        OriginRow {
            values: vec![0.0; capacity * record_len],
            has_data: vec![false; capacity],
            record_len,
        }
    }

    pub fn has_data(&self, destination: ZoneId) -> bool {
        self.has_data.get(destination).copied().unwrap_or(false)
    }

    pub fn record(&self, destination: ZoneId) -> &[f32] {
        let start = destination * self.record_len;
        &self.values[start..start + self.record_len]
    }

    /// the records of destinations `[first, last]`, back to back.
    pub fn records(&self, first: ZoneId, last: ZoneId) -> &[f32] {
        &self.values[first * self.record_len..(last + 1) * self.record_len]
    }

    /// writes one slot and marks the destination as populated. the caller has
    /// checked `destination < capacity` and `slot < record_len`.
    pub fn set(&mut self, destination: ZoneId, slot: usize, value: f32) {
        self.values[destination * self.record_len + slot] = value;
        self.has_data[destination] = true;
    }

    pub fn set_record(&mut self, destination: ZoneId, record: &[f32]) {
        let start = destination * self.record_len;
        self.values[start..start + self.record_len].copy_from_slice(record);
        self.has_data[destination] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::OriginRow;

    #[test]
    fn test_zero_value_still_marks_data() {
        let mut row = OriginRow::new(4, 2);
        row.set(3, 1, 0.0);
        assert!(row.has_data(3));
        assert!(!row.has_data(2));
        assert!(!row.has_data(9));
        assert_eq!((0..4).filter(|d| row.has_data(*d)).count(), 1);
    }

    #[test]
    fn test_records_are_contiguous() {
        let mut row = OriginRow::new(3, 2);
        row.set_record(1, &[1.0, 2.0]);
        row.set(2, 0, 3.0);
        assert_eq!(row.record(1), &[1.0, 2.0]);
        assert_eq!(row.records(1, 2), &[1.0, 2.0, 3.0, 0.0]);
    }
}
