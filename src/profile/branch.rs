use crate::error::LookupError;
use crate::location::Location;
use crate::records::BranchInfo;
use fnv::FnvHashMap;
use std::collections::HashMap;

/// Branch edges recorded for a single function
///
/// `data` holds edges leaving the function (intra-function control flow and
/// calls out), `entry_data` holds edges landing in it from elsewhere.
#[derive(Debug, Clone)]
pub struct FuncBranchData<'a> {
    pub name: &'a str,
    data: Vec<BranchInfo<'a>>,
    entry_data: Vec<BranchInfo<'a>>,

    /// Total execution count for the function
    pub execution_count: i64,

    /// Set by the consumer once this profile has been matched to a function
    pub used: bool,

    /// from offset -> to offset -> position in `data`
    intra_index: FnvHashMap<u64, FnvHashMap<u64, usize>>,
    /// from offset -> target -> position in `data`
    inter_index: FnvHashMap<u64, HashMap<Location<'a>, usize>>,
    /// to offset -> source -> position in `entry_data`
    entry_index: FnvHashMap<u64, HashMap<Location<'a>, usize>>,
}

fn is_intra(function: &str, branch: &BranchInfo<'_>) -> bool {
    branch.from.is_symbol
        && branch.to.is_symbol
        && branch.from.name == function
        && branch.to.name == function
}

fn relocate<'a>(loc: &mut Location<'a>, fragment: &str, parent: &'a str, shift: u64) {
    if loc.name == fragment {
        loc.name = parent;
        // offsets are addresses modulo 2^64
        loc.offset = loc.offset.wrapping_add(shift);
    }
}

impl<'a> FuncBranchData<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            data: Vec::new(),
            entry_data: Vec::new(),
            execution_count: 0,
            used: false,
            intra_index: FnvHashMap::default(),
            inter_index: FnvHashMap::default(),
            entry_index: FnvHashMap::default(),
        }
    }

    pub fn data(&self) -> &[BranchInfo<'a>] {
        &self.data
    }

    pub fn entry_data(&self) -> &[BranchInfo<'a>] {
        &self.entry_data
    }

    fn find_branch(&self, branch: &BranchInfo<'a>) -> Option<usize> {
        if is_intra(self.name, branch) {
            self.intra_index
                .get(&branch.from.offset)?
                .get(&branch.to.offset)
                .copied()
        } else {
            self.inter_index
                .get(&branch.from.offset)?
                .get(&branch.to)
                .copied()
        }
    }

    fn index_branch(&mut self, pos: usize) {
        let branch = &self.data[pos];
        if is_intra(self.name, branch) {
            self.intra_index
                .entry(branch.from.offset)
                .or_default()
                .insert(branch.to.offset, pos);
        } else {
            self.inter_index
                .entry(branch.from.offset)
                .or_default()
                .insert(branch.to, pos);
        }
    }

    fn index_entry(&mut self, pos: usize) {
        let branch = &self.entry_data[pos];
        self.entry_index
            .entry(branch.to.offset)
            .or_default()
            .insert(branch.from, pos);
    }

    /// Add an outgoing edge, coalescing it with an existing edge of the same key
    pub fn merge_branch(&mut self, branch: BranchInfo<'a>) {
        match self.find_branch(&branch) {
            Some(pos) => self.data[pos].merge_with(&branch),
            None => {
                self.data.push(branch);
                self.index_branch(self.data.len() - 1);
            }
        }
    }

    /// Add an incoming edge, coalescing it with an existing edge of the same key
    pub fn merge_entry(&mut self, branch: BranchInfo<'a>) {
        let found = self
            .entry_index
            .get(&branch.to.offset)
            .and_then(|sources| sources.get(&branch.from))
            .copied();
        match found {
            Some(pos) => self.entry_data[pos].merge_with(&branch),
            None => {
                self.entry_data.push(branch);
                self.index_entry(self.entry_data.len() - 1);
            }
        }
    }

    /// Record one branch between two offsets of this function
    pub fn bump_branch_count(&mut self, from: u64, to: u64, mispred: bool) {
        self.merge_branch(BranchInfo::new(
            Location::new(true, self.name, from),
            Location::new(true, self.name, to),
            i64::from(mispred),
            1,
        ));
    }

    /// Record one branch from this function to another location
    pub fn bump_call_count(&mut self, from: u64, to: Location<'a>, mispred: bool) {
        self.merge_branch(BranchInfo::new(
            Location::new(true, self.name, from),
            to,
            i64::from(mispred),
            1,
        ));
    }

    /// Record one branch into this function and count it as an execution
    pub fn bump_entry_count(&mut self, from: Location<'a>, to: u64, mispred: bool) {
        self.merge_entry(BranchInfo::new(
            from,
            Location::new(true, self.name, to),
            i64::from(mispred),
            1,
        ));
        self.execution_count = self.execution_count.saturating_add(1);
    }

    pub fn get_branch(&self, from: u64, to: u64) -> Result<&BranchInfo<'a>, LookupError> {
        self.intra_index
            .get(&from)
            .and_then(|targets| targets.get(&to))
            .map(|&pos| &self.data[pos])
            .ok_or_else(|| LookupError::BranchNotFound {
                function: self.name.to_string(),
                from,
                to,
            })
    }

    /// Returns the call edge originating at `from`.
    ///
    /// For an indirect call site with several targets the earliest recorded
    /// target is returned; callers needing a specific one must check `to`.
    pub fn get_direct_call_branch(&self, from: u64) -> Result<&BranchInfo<'a>, LookupError> {
        self.inter_index
            .get(&from)
            .and_then(|targets| targets.values().min())
            .map(|&pos| &self.data[pos])
            .ok_or_else(|| LookupError::DirectCallNotFound {
                function: self.name.to_string(),
                from,
            })
    }

    /// All edges originating at `from`. Requires sorted data.
    pub fn get_branch_range(&self, from: u64) -> &[BranchInfo<'a>] {
        debug_assert!(self.data.windows(2).all(|w| w[0] <= w[1]));
        let start = self.data.partition_point(|b| b.from.offset < from);
        let end = self.data.partition_point(|b| b.from.offset <= from);
        &self.data[start..end]
    }

    /// Fold in the profile of a fragment located `offset` bytes from this
    /// function's entry.
    pub fn append_from(&mut self, fragment: &FuncBranchData<'a>, offset: u64) {
        let parent = self.name;
        let shift = |branch: &BranchInfo<'a>| {
            let mut branch = branch.clone();
            relocate(&mut branch.from, fragment.name, parent, offset);
            relocate(&mut branch.to, fragment.name, parent, offset);
            for (from, to) in branch
                .histories
                .iter_mut()
                .flat_map(|h| h.context.iter_mut())
            {
                relocate(from, fragment.name, parent, offset);
                relocate(to, fragment.name, parent, offset);
            }
            branch
        };

        for branch in &fragment.data {
            self.merge_branch(shift(branch));
        }
        for branch in &fragment.entry_data {
            self.merge_entry(shift(branch));
        }
        self.execution_count = self
            .execution_count
            .saturating_add(fragment.execution_count);
        self.sort_and_reindex();
    }

    /// Sort records by `(from, to)` and rebuild the indices
    pub fn sort_and_reindex(&mut self) {
        self.data.sort();
        self.entry_data.sort();

        self.intra_index.clear();
        self.inter_index.clear();
        self.entry_index.clear();
        for pos in 0..self.data.len() {
            self.index_branch(pos);
        }
        for pos in 0..self.entry_data.len() {
            self.index_entry(pos);
        }
    }

    pub fn total_branches(&self) -> i64 {
        self.data.iter().map(|b| b.branches).fold(0, i64::saturating_add)
    }
}
