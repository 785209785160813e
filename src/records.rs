//! Aggregated profile records
//!
//! Every record is keyed by its locations only; counts are payload and are
//! summed by `merge_with` when the same key is observed again.

use crate::location::Location;
use std::cmp::Ordering;
use std::fmt;

/// Branch sequence that preceded some of a record's branches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHistory<'a> {
    pub mispreds: i64,
    pub branches: i64,
    /// Edges in the order they were taken, oldest first
    pub context: Vec<(Location<'a>, Location<'a>)>,
}

/// One directed edge observed in a branch trace
#[derive(Debug, Clone)]
pub struct BranchInfo<'a> {
    pub from: Location<'a>,
    pub to: Location<'a>,
    pub mispreds: i64,
    pub branches: i64,
    /// Call-context breakdown of `branches`, empty for plain records
    pub histories: Vec<BranchHistory<'a>>,
}

impl<'a> BranchInfo<'a> {
    pub fn new(from: Location<'a>, to: Location<'a>, mispreds: i64, branches: i64) -> Self {
        Self {
            from,
            to,
            mispreds,
            branches,
            histories: Vec::new(),
        }
    }

    /// Merges branch and misprediction counts of `other` into this record
    pub fn merge_with(&mut self, other: &BranchInfo<'a>) {
        self.mispreds = self.mispreds.saturating_add(other.mispreds);
        self.branches = self.branches.saturating_add(other.branches);

        for history in &other.histories {
            match self
                .histories
                .iter_mut()
                .find(|h| h.context == history.context)
            {
                Some(existing) => {
                    existing.mispreds = existing.mispreds.saturating_add(history.mispreds);
                    existing.branches = existing.branches.saturating_add(history.branches);
                }
                None => self.histories.push(history.clone()),
            }
        }
    }
}

impl PartialEq for BranchInfo<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for BranchInfo<'_> {}

impl PartialOrd for BranchInfo<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BranchInfo<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.from
            .cmp(&other.from)
            .then_with(|| self.to.cmp(&other.to))
    }
}

impl fmt::Display for BranchInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.from.name,
            self.from.offset,
            self.to.name,
            self.to.offset,
            self.mispreds,
            self.branches
        )
    }
}

/// A memory access from an instruction offset to a data address
#[derive(Debug, Clone, Copy)]
pub struct MemInfo<'a> {
    pub offset: Location<'a>,
    pub addr: Location<'a>,
    pub count: u64,
}

impl<'a> MemInfo<'a> {
    pub fn new(offset: Location<'a>, addr: Location<'a>, count: u64) -> Self {
        Self {
            offset,
            addr,
            count,
        }
    }

    pub fn merge_with(&mut self, other: &MemInfo<'a>) {
        self.count = self.count.saturating_add(other.count);
    }
}

impl PartialEq for MemInfo<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.addr == other.addr
    }
}

impl Eq for MemInfo<'_> {}

impl PartialOrd for MemInfo<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MemInfo<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then_with(|| self.addr.cmp(&other.addr))
    }
}

impl fmt::Display for MemInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(PC: {}, M: {}, C: {})", self.offset, self.addr, self.count)
    }
}

/// Number of samples that hit one address
#[derive(Debug, Clone, Copy)]
pub struct SampleInfo<'a> {
    pub loc: Location<'a>,
    pub hits: i64,
}

impl<'a> SampleInfo<'a> {
    pub fn new(loc: Location<'a>, hits: i64) -> Self {
        Self { loc, hits }
    }

    pub fn merge_with(&mut self, other: &SampleInfo<'a>) {
        self.hits = self.hits.saturating_add(other.hits);
    }
}

impl PartialEq for SampleInfo<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.loc == other.loc
    }
}

impl Eq for SampleInfo<'_> {}

impl PartialOrd for SampleInfo<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SampleInfo<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.loc.cmp(&other.loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, offset: u64) -> Location<'_> {
        Location::new(true, name, offset)
    }

    #[test]
    fn test_branch_equality_ignores_counts() {
        let a = BranchInfo::new(sym("f", 1), sym("f", 2), 0, 10);
        let b = BranchInfo::new(sym("f", 1), sym("f", 2), 3, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_branch_merge_adds_counts() {
        let mut a = BranchInfo::new(sym("f", 1), sym("f", 2), 1, 10);
        a.merge_with(&BranchInfo::new(sym("f", 1), sym("f", 2), 2, 5));
        assert_eq!(a.mispreds, 3);
        assert_eq!(a.branches, 15);
    }

    #[test]
    fn test_branch_merge_coalesces_histories() {
        let context = vec![(sym("f", 0x18), sym("f", 0x20))];
        let mut a = BranchInfo::new(sym("f", 0x11), sym("g", 0), 0, 10);
        a.histories.push(BranchHistory {
            mispreds: 0,
            branches: 6,
            context: context.clone(),
        });

        let mut b = BranchInfo::new(sym("f", 0x11), sym("g", 0), 0, 7);
        b.histories.push(BranchHistory {
            mispreds: 1,
            branches: 4,
            context: context.clone(),
        });
        b.histories.push(BranchHistory {
            mispreds: 0,
            branches: 3,
            context: vec![(sym("f", 0x18), sym("f", 0x60))],
        });

        a.merge_with(&b);
        assert_eq!(a.branches, 17);
        assert_eq!(a.histories.len(), 2);
        assert_eq!(a.histories[0].branches, 10);
        assert_eq!(a.histories[0].mispreds, 1);
    }

    #[test]
    fn test_branch_order_by_from_then_to() {
        let a = BranchInfo::new(sym("f", 1), sym("f", 9), 0, 1);
        let b = BranchInfo::new(sym("f", 2), sym("f", 0), 0, 1);
        let c = BranchInfo::new(sym("f", 2), sym("f", 4), 0, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_mem_info_merge_and_display() {
        let mut mi = MemInfo::new(sym("f", 0x10), Location::new(false, "[heap]", 0x8), 2);
        mi.merge_with(&MemInfo::new(sym("f", 0x10), Location::new(false, "[heap]", 0x99), 3));
        assert_eq!(mi.count, 5);
        assert_eq!(mi.to_string(), "(PC: f+10, M: 8, C: 5)");
    }

    #[test]
    fn test_sample_merge() {
        let mut si = SampleInfo::new(sym("f", 0x466c), 3);
        si.merge_with(&SampleInfo::new(sym("f", 0x466c), 4));
        assert_eq!(si.hits, 7);
    }
}
