/// the zeroed origin rows of one block, waiting to be filled from the data section.
/// each row holds `total_width * record_len` floats.
pub struct LoadRequest {
    pub block: usize,
    pub rows: Vec<Vec<f32>>,
}

impl LoadRequest {
    pub fn byte_len(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.len() * std::mem::size_of::<f32>())
            .sum()
    }
}
