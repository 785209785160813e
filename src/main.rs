use anyhow::{Context, Result};
use clap::Parser;
use fdata::cli::{Cli, OutputFormat};
use fdata::config::ReaderConfig;
use fdata::report::{LookupReport, ProfileSummary};
use fdata::{DataReader, ProfileBuffer};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_lookups(reader: &DataReader<'_>, args: &Cli, out: &mut dyn Write) -> Result<()> {
    let reports: Vec<_> = args
        .lookup
        .iter()
        .map(|name| LookupReport::resolve(reader, name, args.fuzzy))
        .collect();

    match args.format {
        OutputFormat::Text => {
            for report in &reports {
                report.write_text(out)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => ReaderConfig::from_toml(path)?,
        None => ReaderConfig::default(),
    };

    let buffer = ProfileBuffer::open(&args.profile)
        .with_context(|| format!("Failed to open profile: {}", args.profile.display()))?;

    // the parse error reaches stderr through the returned error only
    let mut reader = DataReader::new(buffer.as_str()).with_config(config)?;
    reader
        .parse()
        .with_context(|| format!("Failed to parse profile: {}", args.profile.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.dump {
        reader.dump(&mut out)?;
    } else if !args.lookup.is_empty() {
        print_lookups(&reader, &args, &mut out)?;
    } else {
        let summary = ProfileSummary::from_reader(&reader);
        match args.format {
            OutputFormat::Text => summary.write_text(&mut out)?,
            OutputFormat::Json => writeln!(out, "{}", summary.to_json()?)?,
        }
    }
    out.flush()?;
    Ok(())
}
