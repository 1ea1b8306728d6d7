use super::SourceFormat;
use serde::{Deserialize, Serialize};

/// one source file that contributed to a cache, and where in each record its
/// values were written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInfo {
    /// file name, relative to the data directory used for regeneration
    pub file_name: String,
    #[serde(default)]
    pub type_index: usize,
    #[serde(default)]
    pub time_index: usize,
    pub format: SourceFormat,
    #[serde(default)]
    pub header: bool,
}

impl DimensionInfo {
    /// records only the final path component so a manifest can be replayed
    /// against another data directory.
    pub fn new(
        file: &std::path::Path,
        type_index: usize,
        time_index: usize,
        format: SourceFormat,
        header: bool,
    ) -> DimensionInfo {
        let file_name = file
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string_lossy().to_string());
        DimensionInfo {
            file_name,
            type_index,
            time_index,
            format,
            header,
        }
    }
}
