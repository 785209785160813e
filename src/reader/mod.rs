//! Profile reader
//!
//! Parses the text profile written by the perf converter and keeps it in
//! per-function containers for the optimizer to query. The expected syntax of
//! an LBR profile is:
//!
//! ```text
//! <is symbol?> <closest elf symbol or DSO name> <relative FROM address>
//! <is symbol?> <closest elf symbol or DSO name> <relative TO address>
//! <number of mispredictions> <number of branches>
//! ```
//!
//! `<is symbol?>` is 0 for a DSO, 1 for a global symbol and 2 for a local
//! symbol, whose name may carry its file (`t2.c/func`). For example
//!
//! ```text
//! 1 main 3fb 0 /lib/ld-2.21.so 12 4 221
//! ```
//!
//! records branches from symbol main, offset 3fb, to DSO ld-2.21, offset 12,
//! with 4 mispredictions and 221 branches. A record may end with a history
//! count and be followed by that many context blocks:
//!
//! ```text
//! 2 t2.c/func 11 1 globalfunc 1d 0 1775 2
//! 0 1002 2
//! 2 t2.c/func 31 2 t2.c/func d
//! 2 t2.c/func 18 2 t2.c/func 20
//! 0 773 2
//! 2 t2.c/func 71 2 t2.c/func d
//! 2 t2.c/func 18 2 t2.c/func 60
//! ```
//!
//! Of the 1775 branches from func+11 to globalfunc+1d, 1002 were preceded by
//! branches func+18 -> func+20 then func+31 -> func+d, and 773 by
//! func+18 -> func+60 then func+71 -> func+d.
//!
//! Memory events share the file with branches and use location kinds 3, 4
//! and 5 (kinds 0, 1 and 2 plus 3):
//!
//! ```text
//! 4 main 1c 4 g_table 8 12
//! ```
//!
//! When the first line is `no_lbr`, optionally followed by the names of the
//! sampled events, every following line is a plain sample:
//!
//! ```text
//! no_lbr cycles:u
//! 1 BZ2_compressBlock 466c 3
//! 1 BZ2_hbMakeCodeLengths 29c 1
//! ```

mod cursor;
mod grammar;

use crate::config::ReaderConfig;
use crate::error::{ParseError, ReaderError, Result};
use crate::lto::LtoNameMap;
use crate::location::Location;
use crate::profile::{FuncBranchData, FuncMemData, FuncSampleData};
use crate::records::{BranchInfo, MemInfo, SampleInfo};
use cursor::Cursor;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

pub type FuncsToBranchesMap<'a> = BTreeMap<&'a str, FuncBranchData<'a>>;
pub type FuncsToMemEventsMap<'a> = BTreeMap<&'a str, FuncMemData<'a>>;
pub type FuncsToSamplesMap<'a> = BTreeMap<&'a str, FuncSampleData<'a>>;

/// Record counts gathered during parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub branch_records: usize,
    pub mem_records: usize,
    pub sample_records: usize,
    /// Records dropped because none of their locations is a symbol
    pub skipped_records: usize,
}

/// Parse session over one profile buffer
///
/// Every record borrows its names from the input, so the reader and all data
/// obtained from it are bound to the input's lifetime.
pub struct DataReader<'a> {
    input: &'a str,
    diag: Box<dyn Write + Send + Sync + 'a>,
    config: ReaderConfig,
    parsed: bool,
    /// Error of a failed parse, returned again by every later `parse`
    failure: Option<ParseError>,

    funcs_to_branches: FuncsToBranchesMap<'a>,
    funcs_to_samples: FuncsToSamplesMap<'a>,
    funcs_to_mem_events: FuncsToMemEventsMap<'a>,
    no_lbr_mode: bool,
    event_names: BTreeSet<&'a str>,
    stats: ParseStats,

    /// Common LTO names to possibly matching profiles
    lto_common_name_map: LtoNameMap<'a>,
    lto_common_name_mem_map: LtoNameMap<'a>,
    lto_maps_built: bool,
}

impl<'a> DataReader<'a> {
    /// Reader over `input` with the default configuration and diagnostics discarded
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            diag: Box::new(io::sink()),
            config: ReaderConfig::default(),
            parsed: false,
            failure: None,
            funcs_to_branches: BTreeMap::new(),
            funcs_to_samples: BTreeMap::new(),
            funcs_to_mem_events: BTreeMap::new(),
            no_lbr_mode: false,
            event_names: BTreeSet::new(),
            stats: ParseStats::default(),
            lto_common_name_map: LtoNameMap::default(),
            lto_common_name_mem_map: LtoNameMap::default(),
            lto_maps_built: false,
        }
    }

    /// Use `config`, rejecting it if it does not validate
    pub fn with_config(
        mut self,
        config: ReaderConfig,
    ) -> std::result::Result<Self, ReaderError> {
        config.validate().map_err(ReaderError::Config)?;
        self.config = config;
        Ok(self)
    }

    /// Send parse diagnostics to `diag`
    pub fn with_diagnostics<W: Write + Send + Sync + 'a>(mut self, diag: W) -> Self {
        self.diag = Box::new(diag);
        self
    }

    /// Parse the whole input
    ///
    /// Fails on the first malformed token and drops everything parsed so far;
    /// the failure is sticky and every later call returns the same error.
    /// Parsing a successfully parsed reader does nothing.
    pub fn parse(&mut self) -> Result<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.parsed {
            tracing::warn!("Profile already parsed, ignoring repeated parse");
            return Ok(());
        }
        self.parsed = true;

        let mut cursor = Cursor::new(self.input, self.config.separator_byte());
        if let Err(err) = self.parse_records(&mut cursor) {
            // the sink is best effort; the error is returned either way
            let _ = writeln!(self.diag, "{}", err);
            self.discard_records();
            self.failure = Some(err.clone());
            return Err(err);
        }

        for data in self.funcs_to_branches.values_mut() {
            data.sort_and_reindex();
        }
        for data in self.funcs_to_mem_events.values_mut() {
            data.sort_and_reindex();
        }
        for data in self.funcs_to_samples.values_mut() {
            data.sort_and_reindex();
        }
        self.build_lto_name_maps();

        tracing::debug!(
            lbr = !self.no_lbr_mode,
            branch_records = self.stats.branch_records,
            mem_records = self.stats.mem_records,
            sample_records = self.stats.sample_records,
            skipped = self.stats.skipped_records,
            "Parsed profile: {} branch, {} memory, {} sample functions",
            self.funcs_to_branches.len(),
            self.funcs_to_mem_events.len(),
            self.funcs_to_samples.len()
        );
        Ok(())
    }

    fn discard_records(&mut self) {
        self.funcs_to_branches.clear();
        self.funcs_to_mem_events.clear();
        self.funcs_to_samples.clear();
        self.event_names.clear();
        self.stats = ParseStats::default();
    }

    fn parse_records(&mut self, cursor: &mut Cursor<'a>) -> Result<()> {
        if let Some(events) = grammar::parse_no_lbr_header(cursor)? {
            self.no_lbr_mode = true;
            self.event_names.extend(events);
        }

        while let Some(first) = cursor.peek() {
            // blank lines are only allowed at the very end
            if cursor.only_newlines_left() {
                break;
            }
            if self.no_lbr_mode {
                let sample = grammar::parse_sample_info(cursor)?;
                self.add_sample(sample);
                continue;
            }
            match first {
                b'0'..=b'2' => {
                    let branch = grammar::parse_branch_info(cursor)?;
                    self.add_branch(branch);
                }
                b'3'..=b'5' => {
                    let event = grammar::parse_mem_info(cursor)?;
                    self.add_mem_event(event);
                }
                _ => return Err(cursor.error("expected branch or memory record")),
            }
        }
        Ok(())
    }

    fn skip_record(&mut self, what: &str, loc: &Location<'a>) {
        self.stats.skipped_records += 1;
        tracing::trace!("Skipping {} record without symbol at {}", what, loc);
    }

    fn branch_data_mut(&mut self, name: &'a str) -> &mut FuncBranchData<'a> {
        self.funcs_to_branches
            .entry(name)
            .or_insert_with(|| FuncBranchData::new(name))
    }

    /// Route a branch to the function it leaves and, for calls and branches
    /// to an entry point, to the function it enters.
    fn add_branch(&mut self, branch: BranchInfo<'a>) {
        self.stats.branch_records += 1;
        let (from, to) = (branch.from, branch.to);
        if !from.is_symbol && !to.is_symbol && !self.config.keep_unresolved {
            self.skip_record("branch", &from);
            return;
        }

        if to.is_symbol && (to.name != from.name || to.offset == 0) {
            self.branch_data_mut(to.name).merge_entry(branch.clone());
        }
        // tail recursion to the function start also counts as an execution
        if to.is_symbol && to.offset == 0 {
            let data = self.branch_data_mut(to.name);
            data.execution_count = data.execution_count.saturating_add(branch.branches);
        }
        self.branch_data_mut(from.name).merge_branch(branch);
    }

    fn add_mem_event(&mut self, event: MemInfo<'a>) {
        self.stats.mem_records += 1;
        if !event.offset.is_symbol && !self.config.keep_unresolved {
            self.skip_record("memory", &event.offset);
            return;
        }
        let name = event.offset.name;
        self.funcs_to_mem_events
            .entry(name)
            .or_insert_with(|| FuncMemData::new(name))
            .merge(event);
    }

    fn add_sample(&mut self, sample: SampleInfo<'a>) {
        self.stats.sample_records += 1;
        if !sample.loc.is_symbol && !self.config.keep_unresolved {
            self.skip_record("sample", &sample.loc);
            return;
        }
        let name = sample.loc.name;
        self.funcs_to_samples
            .entry(name)
            .or_insert_with(|| FuncSampleData::new(name))
            .record(sample.loc.offset, sample.hits);
    }

    /// Bucket every branch and memory profile by its common LTO name
    ///
    /// Runs once, at the end of a successful parse; later calls are ignored.
    pub fn build_lto_name_maps(&mut self) {
        if self.lto_maps_built {
            return;
        }
        self.lto_common_name_map = LtoNameMap::build(self.funcs_to_branches.keys().copied());
        self.lto_common_name_mem_map =
            LtoNameMap::build(self.funcs_to_mem_events.keys().copied());
        self.lto_maps_built = true;
    }

    /// Branch data matching the first of `names` that has a profile
    pub fn get_func_branch_data<S: AsRef<str>>(&self, names: &[S]) -> Option<&FuncBranchData<'a>> {
        names
            .iter()
            .find_map(|name| self.funcs_to_branches.get(name.as_ref()))
    }

    pub fn get_func_branch_data_mut<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Option<&mut FuncBranchData<'a>> {
        let name = names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| self.funcs_to_branches.contains_key(*name))?;
        self.funcs_to_branches.get_mut(name)
    }

    /// Memory data matching the first of `names` that has a profile
    pub fn get_func_mem_data<S: AsRef<str>>(&self, names: &[S]) -> Option<&FuncMemData<'a>> {
        names
            .iter()
            .find_map(|name| self.funcs_to_mem_events.get(name.as_ref()))
    }

    pub fn get_func_mem_data_mut<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Option<&mut FuncMemData<'a>> {
        let name = names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| self.funcs_to_mem_events.contains_key(*name))?;
        self.funcs_to_mem_events.get_mut(name)
    }

    pub fn get_func_sample_data<S: AsRef<str>>(&self, names: &[S]) -> Option<&FuncSampleData<'a>> {
        names
            .iter()
            .find_map(|name| self.funcs_to_samples.get(name.as_ref()))
    }

    /// All branch profiles sharing a common LTO name with any of `names`
    ///
    /// Choosing among several matches is left to the caller.
    pub fn get_func_branch_data_regex<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Vec<&FuncBranchData<'a>> {
        self.lto_common_name_map
            .lookup(names)
            .into_iter()
            .filter_map(|name| self.funcs_to_branches.get(name))
            .collect()
    }

    /// All memory profiles sharing a common LTO name with any of `names`
    pub fn get_func_mem_data_regex<S: AsRef<str>>(&self, names: &[S]) -> Vec<&FuncMemData<'a>> {
        self.lto_common_name_mem_map
            .lookup(names)
            .into_iter()
            .filter_map(|name| self.funcs_to_mem_events.get(name))
            .collect()
    }

    pub fn all_funcs_branch_data(&self) -> &FuncsToBranchesMap<'a> {
        &self.funcs_to_branches
    }

    pub fn all_funcs_branch_data_mut(&mut self) -> &mut FuncsToBranchesMap<'a> {
        &mut self.funcs_to_branches
    }

    pub fn all_funcs_mem_data(&self) -> &FuncsToMemEventsMap<'a> {
        &self.funcs_to_mem_events
    }

    pub fn all_funcs_mem_data_mut(&mut self) -> &mut FuncsToMemEventsMap<'a> {
        &mut self.funcs_to_mem_events
    }

    pub fn all_funcs_sample_data(&self) -> &FuncsToSamplesMap<'a> {
        &self.funcs_to_samples
    }

    /// Names of branch profiles no consumer has marked as used
    pub fn unused_branch_profiles(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.funcs_to_branches
            .values()
            .filter(|data| !data.used)
            .map(|data| data.name)
    }

    /// Whether some profiled local function carries its file name (`file.c/func`)
    pub fn has_locals_with_file_name(&self) -> bool {
        self.funcs_to_branches
            .keys()
            .chain(self.funcs_to_mem_events.keys())
            .chain(self.funcs_to_samples.keys())
            .any(|name| name.contains('/') && !name.starts_with('/'))
    }

    /// False only for profiles collected without LBR
    pub fn has_lbr(&self) -> bool {
        !self.no_lbr_mode
    }

    /// Whether an event whose name contains `name` was used to collect the profile
    pub fn uses_event(&self, name: &str) -> bool {
        self.event_names.iter().any(|event| event.contains(name))
    }

    pub fn event_names(&self) -> &BTreeSet<&'a str> {
        &self.event_names
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Write every parsed structure to `out`, for debugging only
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        for (name, data) in &self.funcs_to_branches {
            writeln!(out, "{} branches:", name)?;
            for branch in data.data() {
                writeln!(out, "{}", branch)?;
            }
            writeln!(out, "{} entry points:", name)?;
            for branch in data.entry_data() {
                writeln!(out, "{}", branch)?;
            }
        }

        for event in &self.event_names {
            writeln!(out, "Data was collected with event: {}", event)?;
        }

        for (name, data) in &self.funcs_to_samples {
            writeln!(out, "{} samples:", name)?;
            for sample in data.data() {
                writeln!(out, "{} {} {}", sample.loc.name, sample.loc.offset, sample.hits)?;
            }
        }

        for data in self.funcs_to_mem_events.values() {
            write!(out, "Memory events for {}", data.name)?;
            let mut last_offset = Location::unknown(0);
            for event in data.data() {
                if event.offset == last_offset {
                    write!(out, ", {}/{}", event.addr, event.count)?;
                } else {
                    write!(out, "\n{}: {}/{}", event.offset, event.addr, event.count)?;
                }
                last_offset = event.offset;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
