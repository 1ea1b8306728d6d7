use crate::model::reader::OdCache;
use crate::model::zone::ZoneCache;

/// a human readable description of a cache file's dimensions, index and metadata.
pub fn describe(cache: &OdCache) -> String {
    let index = cache.index();
    let highest_zone = cache
        .highest_zone()
        .map(|z| z.to_string())
        .unwrap_or_else(|| String::from("none"));
    let mut lines = vec![
        format!("file: {}", cache.path().display()),
        format!("version: {}", cache.version()),
        format!("times: {}", cache.times()),
        format!("types: {}", cache.types()),
        format!("highest zone: {highest_zone}"),
        format!("origin blocks: {}", index.blocks.len()),
        format!("destination blocks: {}", index.sub_block_count()),
        format!("stored records: {}", index.record_count()),
    ];
    if !cache.metadata().is_empty() {
        lines.push(String::from("metadata:"));
        lines.extend(
            cache
                .metadata()
                .iter()
                .map(|(key, value)| format!("  {key}: {value}")),
        );
    }
    lines.join("\n")
}

pub fn describe_zones<T>(cache: &ZoneCache<T>) -> String {
    [
        format!("version: {}", cache.version()),
        format!("types: {}", cache.types()),
        format!("highest zone: {}", cache.highest_zone()),
        format!("segments: {}", cache.index().segments.len()),
        format!("stored zones: {}", cache.index().zone_count()),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builder::OdcBuilder;
    use crate::model::format::odc_metadata::DESCRIPTION;

    #[test]
    fn test_describe() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("info.odc");
        let mut builder = OdcBuilder::new(4, 1, 2, 5)
            .expect("should create builder")
            .with_metadata(DESCRIPTION, "pm peak");
        builder
            .set_value(1, 3, 1, 0, 2.0)
            .expect("should set value");
        builder.save(&path, false).expect("should save");
        let cache = OdCache::open(&path).expect("should open");
        let text = describe(&cache);
        assert!(text.contains("times: 2"));
        assert!(text.contains("highest zone: 1"));
        assert!(text.contains("stored records: 1"));
        assert!(text.contains("  Description: pm peak"));
    }
}
