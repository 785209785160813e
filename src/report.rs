//! Summary and lookup reports for the `fdata` command
//!
//! Text for humans, JSON (`--format json`) for scripts.

use crate::reader::{DataReader, ParseStats};
use serde::Serialize;
use std::io::{self, Write};

/// Number of functions listed in a summary
pub const TOP_FUNCTIONS: usize = 10;

/// Weight of one profiled function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionWeight<'a> {
    pub name: &'a str,
    /// Branches taken from the function (LBR) or samples hitting it (no LBR)
    pub weight: i64,
    /// Times the function was entered; LBR profiles only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<i64>,
}

/// Overview of a parsed profile
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary<'a> {
    pub mode: &'static str,
    pub events: Vec<&'a str>,
    pub stats: ParseStats,
    pub branch_functions: usize,
    pub mem_functions: usize,
    pub sample_functions: usize,
    pub has_locals_with_file_name: bool,
    pub top_functions: Vec<FunctionWeight<'a>>,
}

impl<'a> ProfileSummary<'a> {
    pub fn from_reader(reader: &DataReader<'a>) -> Self {
        let mut top_functions: Vec<FunctionWeight<'a>> = if reader.has_lbr() {
            reader
                .all_funcs_branch_data()
                .values()
                .map(|data| FunctionWeight {
                    name: data.name,
                    weight: data.total_branches(),
                    execution_count: Some(data.execution_count),
                })
                .collect()
        } else {
            reader
                .all_funcs_sample_data()
                .values()
                .map(|data| FunctionWeight {
                    name: data.name,
                    weight: data.total_hits(),
                    execution_count: None,
                })
                .collect()
        };
        // heaviest first, ties by name
        top_functions.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(b.name)));
        top_functions.truncate(TOP_FUNCTIONS);

        Self {
            mode: if reader.has_lbr() { "lbr" } else { "no_lbr" },
            events: reader.event_names().iter().copied().collect(),
            stats: *reader.stats(),
            branch_functions: reader.all_funcs_branch_data().len(),
            mem_functions: reader.all_funcs_mem_data().len(),
            sample_functions: reader.all_funcs_sample_data().len(),
            has_locals_with_file_name: reader.has_locals_with_file_name(),
            top_functions,
        }
    }

    pub fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Profile mode: {}", self.mode)?;
        if !self.events.is_empty() {
            writeln!(out, "Events: {}", self.events.join(", "))?;
        }
        writeln!(
            out,
            "Records: {} branch, {} memory, {} sample ({} skipped)",
            self.stats.branch_records,
            self.stats.mem_records,
            self.stats.sample_records,
            self.stats.skipped_records
        )?;
        writeln!(
            out,
            "Functions: {} with branches, {} with memory events, {} with samples",
            self.branch_functions, self.mem_functions, self.sample_functions
        )?;

        if self.top_functions.is_empty() {
            return Ok(());
        }
        writeln!(out)?;
        writeln!(out, "{:>12} {:>12} function", "weight", "executions")?;
        writeln!(out, "------------ ------------ ----------------")?;
        for func in &self.top_functions {
            let executions = func
                .execution_count
                .map(|count| count.to_string())
                .unwrap_or_default();
            writeln!(out, "{:>12} {:>12} {}", func.weight, executions, func.name)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// How a function name was resolved against the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Lto,
}

/// One profile found for a queried name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupMatch<'a> {
    pub name: &'a str,
    pub kind: MatchKind,
    pub branches: usize,
    pub entry_points: usize,
    pub execution_count: i64,
    pub mem_events: usize,
}

/// Result of resolving one queried name
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport<'a> {
    pub query: String,
    pub matches: Vec<LookupMatch<'a>>,
}

impl<'a> LookupReport<'a> {
    /// Resolve `query` exactly, then through the LTO buckets when `fuzzy` is set
    /// and no exact profile exists
    pub fn resolve(reader: &DataReader<'a>, query: &str, fuzzy: bool) -> Self {
        let candidates = [query];
        let mem_events = |name: &str| {
            reader
                .get_func_mem_data(&[name])
                .map_or(0, |data| data.data().len())
        };

        let mut matches = Vec::new();
        if let Some(data) = reader.get_func_branch_data(&candidates) {
            matches.push(LookupMatch {
                name: data.name,
                kind: MatchKind::Exact,
                branches: data.data().len(),
                entry_points: data.entry_data().len(),
                execution_count: data.execution_count,
                mem_events: mem_events(data.name),
            });
        } else if fuzzy {
            matches.extend(reader.get_func_branch_data_regex(&candidates).into_iter().map(
                |data| LookupMatch {
                    name: data.name,
                    kind: MatchKind::Lto,
                    branches: data.data().len(),
                    entry_points: data.entry_data().len(),
                    execution_count: data.execution_count,
                    mem_events: mem_events(data.name),
                },
            ));
        }

        Self {
            query: query.to_string(),
            matches,
        }
    }

    pub fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.matches.is_empty() {
            return writeln!(out, "{}: no profile", self.query);
        }
        for m in &self.matches {
            let via = match m.kind {
                MatchKind::Exact => String::new(),
                MatchKind::Lto => format!(" (via {})", self.query),
            };
            writeln!(
                out,
                "{}{}: {} branches, {} entry points, executed {} times, {} memory events",
                m.name, via, m.branches, m.entry_points, m.execution_count, m.mem_events
            )?;
        }
        Ok(())
    }
}
