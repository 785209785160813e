//! Error types for profile reading and querying
//!
//! Grammar errors are fatal to the whole parse; lookup errors are local and
//! recoverable by the caller (fall back to fuzzy matching, treat as zero weight).

use std::borrow::Cow;
use thiserror::Error;

/// Malformed-input error raised by the grammar engine
///
/// `line` and `col` are 1-based and point at the token that failed to match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error reading profile: line {line}, column {col}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub col: usize,
    pub message: Cow<'static, str>,
}

/// Exact-match query failures on a function's branch data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no branch from offset {from:#x} to offset {to:#x} in {function}")]
    BranchNotFound {
        function: String,
        from: u64,
        to: u64,
    },

    #[error("no direct call from offset {from:#x} in {function}")]
    DirectCallNotFound { function: String, from: u64 },
}

/// Errors loading and parsing a profile file
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profile is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid reader config: {0}")]
    Config(String),
}

/// Result type for profile parsing
pub type Result<T> = std::result::Result<T, ParseError>;
