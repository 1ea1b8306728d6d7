use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// the layout of a raw source file ingested into a cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// `origin,destination,v0,v1,...` where values fill consecutive time periods
    #[serde(rename = "csv_times")]
    CsvTimes,
    /// `origin,destination,v0,v1,...` where values fill consecutive data types
    #[serde(rename = "csv_types")]
    CsvTypes,
    /// fixed-width matrix punch file with 7 character zone ids
    #[serde(rename = "emme2_311")]
    Emme2,
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceFormat::CsvTimes => "csv_times",
            SourceFormat::CsvTypes => "csv_types",
            SourceFormat::Emme2 => "emme2_311",
        };
        write!(f, "{s}")
    }
}
