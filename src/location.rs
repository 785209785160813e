//! Canonical identity of a profiled code or data address
//!
//! A location is either a symbol (or DSO) name plus a byte offset, or an
//! unresolved address. Names borrow from the profile buffer, so no location
//! can outlive the text it was parsed from.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Pseudo-symbol for heap addresses; offsets into it are not stable across runs
pub const HEAP_NAME: &str = "[heap]";

/// Name given to locations built from a bare offset
pub const UNKNOWN_NAME: &str = "[unknown]";

#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    pub is_symbol: bool,
    pub name: &'a str,
    pub offset: u64,
}

impl<'a> Location<'a> {
    pub fn new(is_symbol: bool, name: &'a str, offset: u64) -> Self {
        Self {
            is_symbol,
            name,
            offset,
        }
    }

    /// Unresolved location: not a symbol, named `[unknown]`
    pub fn unknown(offset: u64) -> Self {
        Self::new(false, UNKNOWN_NAME, offset)
    }

    pub fn is_heap(&self) -> bool {
        self.name == HEAP_NAME
    }
}

impl PartialEq for Location<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.is_symbol == other.is_symbol
            && self.name == other.name
            && (self.is_heap() || self.offset == other.offset)
    }
}

impl Eq for Location<'_> {}

impl Hash for Location<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_symbol.hash(state);
        self.name.hash(state);
        if !self.is_heap() {
            self.offset.hash(state);
        }
    }
}

impl PartialOrd for Location<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.is_symbol
            .cmp(&other.is_symbol)
            .then_with(|| self.name.cmp(other.name))
            .then_with(|| {
                if self.is_heap() {
                    Ordering::Equal
                } else {
                    self.offset.cmp(&other.offset)
                }
            })
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_symbol {
            return write!(f, "{:x}", self.offset);
        }
        if self.offset == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}+{:x}", self.name, self.offset)
        }
    }
}
