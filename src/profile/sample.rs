use crate::location::Location;
use crate::records::SampleInfo;
use fnv::FnvHashMap;

/// Address samples recorded in a single function (profiles without LBR)
#[derive(Debug, Clone)]
pub struct FuncSampleData<'a> {
    pub name: &'a str,
    data: Vec<SampleInfo<'a>>,
    /// offset -> position in `data`
    index: FnvHashMap<u64, usize>,
    /// `data` is ordered by offset
    sorted: bool,
}

impl<'a> FuncSampleData<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            data: Vec::new(),
            index: FnvHashMap::default(),
            sorted: true,
        }
    }

    pub fn data(&self) -> &[SampleInfo<'a>] {
        &self.data
    }

    /// Add `hits` samples at `offset`
    pub fn record(&mut self, offset: u64, hits: i64) {
        if let Some(&pos) = self.index.get(&offset) {
            self.data[pos].hits = self.data[pos].hits.saturating_add(hits);
            return;
        }
        if let Some(last) = self.data.last() {
            self.sorted &= last.loc.offset < offset;
        }
        self.index.insert(offset, self.data.len());
        self.data
            .push(SampleInfo::new(Location::new(true, self.name, offset), hits));
    }

    pub fn bump_count(&mut self, offset: u64) {
        self.record(offset, 1);
    }

    /// Number of samples recorded in `[start, end)`
    pub fn get_samples(&self, start: u64, end: u64) -> u64 {
        let in_range = |si: &&SampleInfo<'a>| (start..end).contains(&si.loc.offset);
        let total: i64 = if self.sorted {
            let first = self.data.partition_point(|si| si.loc.offset < start);
            let last = self.data.partition_point(|si| si.loc.offset < end);
            self.data[first..last.max(first)]
                .iter()
                .map(|si| si.hits)
                .fold(0, i64::saturating_add)
        } else {
            self.data
                .iter()
                .filter(in_range)
                .map(|si| si.hits)
                .fold(0, i64::saturating_add)
        };
        u64::try_from(total).unwrap_or(0)
    }

    pub fn sort_and_reindex(&mut self) {
        self.data.sort_by_key(|si| si.loc.offset);
        self.index = self
            .data
            .iter()
            .enumerate()
            .map(|(pos, si)| (si.loc.offset, pos))
            .collect();
        self.sorted = true;
    }

    pub fn total_hits(&self) -> i64 {
        self.data.iter().map(|si| si.hits).fold(0, i64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_count() {
        let mut fsd = FuncSampleData::new("BZ2_compressBlock");
        fsd.bump_count(0x466c);
        fsd.bump_count(0x466c);
        fsd.bump_count(0x10);
        assert_eq!(fsd.data().len(), 2);
        assert_eq!(fsd.data()[0].hits, 2);
        assert_eq!(fsd.data()[0].loc, Location::new(true, "BZ2_compressBlock", 0x466c));
        assert_eq!(fsd.total_hits(), 3);
    }

    #[test]
    fn test_get_samples_half_open_range() {
        let mut fsd = FuncSampleData::new("f");
        fsd.record(0x10, 3);
        fsd.record(0x20, 5);
        fsd.record(0x30, 7);

        assert_eq!(fsd.get_samples(0x10, 0x30), 8);
        assert_eq!(fsd.get_samples(0x11, 0x31), 12);
        assert_eq!(fsd.get_samples(0x0, 0x100), 15);
        assert_eq!(fsd.get_samples(0x30, 0x30), 0);
        assert_eq!(fsd.get_samples(0x40, 0x10), 0);
    }

    #[test]
    fn test_get_samples_unsorted_insertion() {
        let mut fsd = FuncSampleData::new("f");
        fsd.record(0x30, 7);
        fsd.record(0x10, 3);
        fsd.record(0x20, 5);
        assert_eq!(fsd.get_samples(0x10, 0x21), 8);

        fsd.sort_and_reindex();
        assert_eq!(fsd.data()[0].loc.offset, 0x10);
        assert_eq!(fsd.get_samples(0x10, 0x21), 8);
        fsd.bump_count(0x20);
        assert_eq!(fsd.get_samples(0x20, 0x21), 6);
    }
}
