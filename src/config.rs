//! Reader configuration
//!
//! Loaded from TOML or built in code; the defaults match the format written
//! by the profile converter.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a profile reader
///
/// # Example
/// ```
/// use fdata::config::ReaderConfig;
///
/// let config = ReaderConfig::default();
/// assert_eq!(config.field_separator, ' ');
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Character separating fields of a record
    ///
    /// Default: a single space
    pub field_separator: char,

    /// Keep branch, memory and sample records none of whose locations is a
    /// symbol
    ///
    /// Such records cannot be attributed to a function by the optimizer and
    /// are dropped by default.
    pub keep_unresolved: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            field_separator: ' ',
            keep_unresolved: false,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing keys take their default values.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read reader config: {}", path.as_ref().display())
        })?;
        let config: ReaderConfig =
            toml::from_str(&content).context("Failed to parse reader config TOML")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let sep = self.field_separator;
        if !sep.is_ascii() {
            return Err(format!("field_separator must be ASCII, got {:?}", sep));
        }
        if sep == '\n' || sep == '\r' {
            return Err("field_separator must not be a line terminator".to_string());
        }
        if sep.is_ascii_alphanumeric() {
            return Err(format!(
                "field_separator must not be alphanumeric, got {:?}",
                sep
            ));
        }
        Ok(())
    }

    /// Separator as the byte the tokenizer scans for
    pub(crate) fn separator_byte(&self) -> u8 {
        // validated configs only hold ASCII separators
        if self.field_separator.is_ascii() {
            self.field_separator as u8
        } else {
            b' '
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::default();
        assert_eq!(config.field_separator, ' ');
        assert!(!config.keep_unresolved);
        assert!(config.validate().is_ok());
        assert_eq!(config.separator_byte(), b' ');
    }

    #[test]
    fn test_invalid_separators() {
        for sep in ['\n', 'a', '7', 'é'] {
            let config = ReaderConfig {
                field_separator: sep,
                ..ReaderConfig::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", sep);
        }
    }

    #[test]
    fn test_from_toml_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "keep_unresolved = true").unwrap();
        file.flush().unwrap();

        let config = ReaderConfig::from_toml(file.path()).unwrap();
        assert!(config.keep_unresolved);
        assert_eq!(config.field_separator, ' ');
    }

    #[test]
    fn test_from_toml_rejects_bad_separator() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "field_separator = \"x\"").unwrap();
        file.flush().unwrap();

        let err = ReaderConfig::from_toml(file.path()).unwrap_err();
        assert!(err.to_string().contains("alphanumeric"));
    }

    #[test]
    fn test_from_toml_missing_file() {
        let err = ReaderConfig::from_toml("/nonexistent/fdata.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read reader config"));
    }
}
