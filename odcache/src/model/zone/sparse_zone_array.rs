use crate::model::index::ZoneRange;
use crate::model::ZoneId;

/// values for the zones covered by a set of sorted, disjoint zone ranges.
#[derive(Clone, Debug)]
pub struct SparseZoneArray<T> {
    ranges: Vec<ZoneRange>,
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> SparseZoneArray<T> {
    /// `values` holds one entry per zone of each range, in range order.
    pub fn new(ranges: Vec<ZoneRange>, values: Vec<T>) -> SparseZoneArray<T> {
        let mut offsets = Vec::with_capacity(ranges.len());
        let mut offset = 0;
        for range in ranges.iter() {
            offsets.push(offset);
            offset += range.width();
        }
        SparseZoneArray {
            ranges,
            offsets,
            values,
        }
    }

    pub fn get(&self, zone: ZoneId) -> Option<&T> {
        let idx = self.ranges.partition_point(|r| r.end < zone);
        let range = self.ranges.get(idx).filter(|r| r.contains(zone))?;
        self.values.get(self.offsets[idx] + zone - range.start)
    }

    pub fn contains_index(&self, zone: ZoneId) -> bool {
        self.get(zone).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn valid_zones(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.ranges.iter().flat_map(|r| r.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &T)> + '_ {
        self.valid_zones().zip(self.values.iter())
    }
}
