use crate::location::Location;
use crate::records::MemInfo;
use fnv::FnvHashMap;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Memory accesses recorded in the address space of a single function
#[derive(Debug, Clone)]
pub struct FuncMemData<'a> {
    pub name: &'a str,
    data: Vec<MemInfo<'a>>,

    /// Set by the consumer once this profile has been matched to a function
    pub used: bool,

    /// instruction offset -> accessed address -> position in `data`
    event_index: FnvHashMap<u64, HashMap<Location<'a>, usize>>,
}

impl<'a> FuncMemData<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            data: Vec::new(),
            used: false,
            event_index: FnvHashMap::default(),
        }
    }

    pub fn data(&self) -> &[MemInfo<'a>] {
        &self.data
    }

    /// Add `event`, coalescing it with a previous access of the same pc and address
    pub fn merge(&mut self, event: MemInfo<'a>) {
        let slot = self
            .event_index
            .entry(event.offset.offset)
            .or_default()
            .entry(event.addr);
        match slot {
            Entry::Occupied(pos) => {
                self.data[*pos.get()].merge_with(&event);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.data.len());
                self.data.push(event);
            }
        }
    }

    /// Count one access from `offset` to `addr`
    pub fn update(&mut self, offset: Location<'a>, addr: Location<'a>) {
        self.merge(MemInfo::new(offset, addr, 1));
    }

    /// All accesses made by the instruction at `offset`. Requires sorted data.
    pub fn get_mem_info_range(&self, offset: u64) -> &[MemInfo<'a>] {
        debug_assert!(self.data.windows(2).all(|w| w[0] <= w[1]));
        let start = self.data.partition_point(|mi| mi.offset.offset < offset);
        let end = self.data.partition_point(|mi| mi.offset.offset <= offset);
        &self.data[start..end]
    }

    pub fn sort_and_reindex(&mut self) {
        self.data.sort();
        self.event_index.clear();
        for (pos, event) in self.data.iter().enumerate() {
            self.event_index
                .entry(event.offset.offset)
                .or_default()
                .insert(event.addr, pos);
        }
    }

    pub fn total_count(&self) -> u64 {
        self.data.iter().map(|mi| mi.count).fold(0, u64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_coalesces() {
        let mut fmd = FuncMemData::new("f");
        let pc = Location::new(true, "f", 0x10);
        fmd.update(pc, Location::new(true, "table", 0x8));
        fmd.update(pc, Location::new(true, "table", 0x8));
        fmd.update(pc, Location::new(true, "table", 0x10));

        assert_eq!(fmd.data().len(), 2);
        assert_eq!(fmd.data()[0].count, 2);
        assert_eq!(fmd.data()[1].count, 1);
    }

    #[test]
    fn test_heap_addresses_coalesce() {
        let mut fmd = FuncMemData::new("f");
        let pc = Location::new(true, "f", 0x10);
        fmd.update(pc, Location::new(false, "[heap]", 0x1000));
        fmd.update(pc, Location::new(false, "[heap]", 0x7f00));
        assert_eq!(fmd.data().len(), 1);
        assert_eq!(fmd.total_count(), 2);
    }

    #[test]
    fn test_mem_info_range() {
        let mut fmd = FuncMemData::new("f");
        fmd.merge(MemInfo::new(
            Location::new(true, "f", 0x20),
            Location::new(true, "g_table", 0),
            4,
        ));
        fmd.update(Location::new(true, "f", 0x10), Location::new(true, "g_a", 0));
        fmd.update(Location::new(true, "f", 0x20), Location::new(true, "g_b", 0));
        fmd.sort_and_reindex();

        let range = fmd.get_mem_info_range(0x20);
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].addr.name, "g_b");
        assert_eq!(range[1].count, 4);
        assert_eq!(fmd.get_mem_info_range(0x10).len(), 1);
        assert!(fmd.get_mem_info_range(0x30).is_empty());

        // still coalesces after reindexing
        fmd.update(Location::new(true, "f", 0x10), Location::new(true, "g_a", 0));
        assert_eq!(fmd.get_mem_info_range(0x10)[0].count, 2);
    }
}
