use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const YEAR: &str = "Year";
pub const START_TIME: &str = "StartTime";
pub const END_TIME: &str = "EndTime";
pub const TYPES: &str = "Types";
pub const MODES: &str = "Modes";
pub const DESCRIPTION: &str = "Description";

/// string key/value pairs stored in the version 2 metadata block of a cache file,
/// describing what the cache holds (year, time window, type and mode labels).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OdcMetadata(BTreeMap<String, String>);

impl OdcMetadata {
    pub fn insert(&mut self, key: &str, value: &str) -> Option<String> {
        self.0.insert(key.to_string(), value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    pub fn year(&self) -> Option<&str> {
        self.get(YEAR)
    }

    pub fn description(&self) -> Option<&str> {
        self.get(DESCRIPTION)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for OdcMetadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        OdcMetadata(iter.into_iter().collect())
    }
}
