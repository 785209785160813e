//! Owned profile text
//!
//! Every name in every parsed record borrows from a `ProfileBuffer`, so the
//! buffer has to outlive the `DataReader` built on top of it.

use crate::error::ReaderError;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ProfileBuffer {
    text: String,
}

impl ProfileBuffer {
    /// Read a whole profile file into memory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let bytes = fs::read(path.as_ref())?;
        let text = String::from_utf8(bytes)?;
        tracing::debug!(
            "Loaded profile {} ({} bytes)",
            path.as_ref().display(),
            text.len()
        );
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for ProfileBuffer {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for ProfileBuffer {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}
