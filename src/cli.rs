//! CLI argument parsing for fdata

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for summaries and lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fdata")]
#[command(version)]
#[command(about = "Reader for perf2bolt branch, memory and sample profiles", long_about = None)]
pub struct Cli {
    /// Profile to read
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Print every parsed structure instead of the summary
    #[arg(long)]
    pub dump: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Look up the profile of a function (repeatable)
    #[arg(short = 'l', long = "lookup", value_name = "NAME")]
    pub lookup: Vec<String>,

    /// Fall back to LTO common-name matching when a lookup has no exact profile
    #[arg(long)]
    pub fuzzy: bool,

    /// Reader configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_profile() {
        let cli = Cli::parse_from(["fdata", "perf.fdata"]);
        assert_eq!(cli.profile, PathBuf::from("perf.fdata"));
        assert!(!cli.dump);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.lookup.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_requires_profile() {
        assert!(Cli::try_parse_from(["fdata"]).is_err());
    }

    #[test]
    fn test_cli_repeated_lookup() {
        let cli = Cli::parse_from([
            "fdata",
            "p",
            "-l",
            "main",
            "--lookup",
            "foo.lto_priv.1",
            "--fuzzy",
        ]);
        assert_eq!(cli.lookup, vec!["main", "foo.lto_priv.1"]);
        assert!(cli.fuzzy);
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["fdata", "--format", "json", "p"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["fdata", "--format", "csv", "p"]).is_err());
    }

    #[test]
    fn test_cli_config_and_debug() {
        let cli = Cli::parse_from(["fdata", "-c", "reader.toml", "--debug", "--dump", "p"]);
        assert_eq!(cli.config, Some(PathBuf::from("reader.toml")));
        assert!(cli.debug);
        assert!(cli.dump);
    }
}
