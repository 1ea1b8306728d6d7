use super::DimensionInfo;
use crate::model::format::OdcMetadata;
use crate::model::OdcError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// describes how a cache file is generated: its dimensions and the ordered list of
/// raw source files that populate it. written next to a cache file so the cache can
/// be regenerated from its sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OdcBuildConfiguration {
    /// exclusive upper bound on zone ids
    #[serde(alias = "highest_zone")]
    pub zone_capacity: usize,
    pub types: usize,
    pub times: usize,
    #[serde(default = "default_gap")]
    pub gap: usize,
    #[serde(default)]
    pub files: Vec<DimensionInfo>,
    #[serde(default, skip_serializing_if = "OdcMetadata::is_empty")]
    pub metadata: OdcMetadata,
}

fn default_gap() -> usize {
    5
}

impl OdcBuildConfiguration {
    pub fn new(zone_capacity: usize, types: usize, times: usize, gap: usize) -> OdcBuildConfiguration {
        OdcBuildConfiguration {
            zone_capacity,
            types,
            times,
            gap,
            files: vec![],
            metadata: OdcMetadata::default(),
        }
    }

    pub fn add(&mut self, info: DimensionInfo) {
        self.files.push(info);
    }

    /// writes this manifest as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), OdcError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            OdcError::ManifestError(format!("failure encoding manifest for {}: {e}", path.display()))
        })?;
        std::fs::write(path, json).map_err(|e| OdcError::write(path, e))
    }
}

impl TryFrom<&String> for OdcBuildConfiguration {
    type Error = OdcError;

    fn try_from(f: &String) -> Result<Self, Self::Error> {
        if f.ends_with(".toml") {
            let s = std::fs::read_to_string(f)
                .map_err(|e| OdcError::ManifestError(format!("failure reading {f}: {e}")))?;
            toml::from_str(&s)
                .map_err(|e| OdcError::ManifestError(format!("failure decoding {f}: {e}")))
        } else if f.ends_with(".json") {
            let s = std::fs::read_to_string(f)
                .map_err(|e| OdcError::ManifestError(format!("failure reading {f}: {e}")))?;
            serde_json::from_str(&s)
                .map_err(|e| OdcError::ManifestError(format!("failure decoding {f}: {e}")))
        } else {
            Err(OdcError::ManifestError(format!("unsupported file type: {f}")))
        }
    }
}

impl TryFrom<&Path> for OdcBuildConfiguration {
    type Error = OdcError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        OdcBuildConfiguration::try_from(&path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceFormat;

    #[test]
    fn test_toml_manifest() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("auto.toml");
        let toml = r#"
highest_zone = 100
types = 2
times = 3

[[files]]
file_name = "am_times.csv"
type_index = 0
format = "csv_times"
header = true

[[files]]
file_name = "am_cost.311"
type_index = 1
time_index = 2
format = "emme2_311"

[metadata]
Year = "2016"
"#;
        std::fs::write(&path, toml).expect("should write manifest");
        let manifest = OdcBuildConfiguration::try_from(&path.to_string_lossy().to_string())
            .expect("should decode manifest");
        assert_eq!(manifest.zone_capacity, 100);
        assert_eq!(manifest.gap, 5);
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.files[0].format, SourceFormat::CsvTimes);
        assert!(manifest.files[0].header);
        assert_eq!(manifest.files[1].format, SourceFormat::Emme2);
        assert_eq!(manifest.files[1].time_index, 2);
        assert!(!manifest.files[1].header);
        assert_eq!(manifest.metadata.year(), Some("2016"));
    }

    #[test]
    fn test_json_manifest_written_and_read() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("cache.json");
        let mut manifest = OdcBuildConfiguration::new(10, 1, 1, 5);
        manifest.add(DimensionInfo::new(
            Path::new("/data/raw/times.csv"),
            0,
            0,
            SourceFormat::CsvTypes,
            false,
        ));
        manifest.write_json(&path).expect("should write manifest");
        let read = OdcBuildConfiguration::try_from(path.as_path()).expect("should read manifest");
        assert_eq!(read, manifest);
        assert_eq!(read.files[0].file_name, "times.csv");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = OdcBuildConfiguration::try_from(&String::from("cache.xml"));
        assert!(matches!(result, Err(OdcError::ManifestError(_))));
    }
}
