//! CLI tool for checking the structure of EDI files.
//!
//! # Usage
//!
//! ```bash
//! # Fixed-width file, format taken from the extension
//! edi_validate --input works.V21
//!
//! # Delimited file from stdin, JSON report
//! cat batch.edi | edi_validate --format delimited --output json
//!
//! # Print every group and transaction while reading
//! edi_validate -i batch.edi --list --config options.json
//! ```
//!
//! Exit code is 0 for a valid file and 1 otherwise.

use std::{
    ffi::OsStr,
    fs::File,
    io::{self, BufRead, BufReader, Write, stdin, stdout},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use edi::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Check the structure and control totals of an EDI file.
///
/// Reads the file group by group, reconciles every declared count against
/// what was actually read and reports all errors found.
#[derive(Parser, Debug)]
#[command(name = "edi_validate")]
#[command(version, about)]
struct Args {
    /// Input file path. If not specified, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Record format. Taken from the extension or the content when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JSON file with reader options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sequence number expected for the first group.
    #[arg(long)]
    first_sequence: Option<u32>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputArg::Text)]
    output: OutputArg,

    /// Print every group and transaction while reading.
    #[arg(long)]
    list: bool,
}

/// Supported record formats for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Fixed-width CWR-style columns.
    Fixed,
    /// `TAG|key=value` records.
    Delimited,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fixed => Format::FixedWidth,
            FormatArg::Delimited => Format::Delimited,
        }
    }
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    /// Human-readable summary.
    Text,
    /// Full report as JSON.
    Json,
    /// One CSV row per group.
    Csv,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut input: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(stdin().lock()),
    };

    let format = resolve_format(args.format, args.input.as_deref(), &mut input)?;
    debug!(format = format.name(), "format resolved");

    let mut out = stdout().lock();
    let report = match format {
        Format::FixedWidth => {
            let options = load_options::<FixedWidth>(&args)?;
            read_report::<_, FixedWidth, _>(input, options, args.list, &mut out)?
        }
        Format::Delimited => {
            let options = load_options::<Delimited>(&args)?;
            read_report::<_, Delimited, _>(input, options, args.list, &mut out)?
        }
    };

    match args.output {
        OutputArg::Text => render_text(&report, &mut out)?,
        OutputArg::Json => {
            serde_json::to_writer_pretty(&mut out, &report).context("Failed to write JSON report")?;
            writeln!(out)?;
        }
        OutputArg::Csv => render_csv(&report, &mut out)?,
    }
    out.flush()?;

    if !report.valid {
        bail!("{} is not valid: {} error(s)", input_name(args.input.as_deref()), report.errors.len());
    }
    Ok(())
}

fn input_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "<stdin>".to_string(), |p| format!("'{}'", p.display()))
}

/// Picks the format: explicit flag, then file extension, then content.
fn resolve_format<R: BufRead>(
    arg: Option<FormatArg>,
    path: Option<&Path>,
    input: &mut R,
) -> Result<Format> {
    if let Some(arg) = arg {
        return Ok(arg.into());
    }
    if let Some(format) = path
        .and_then(Path::extension)
        .and_then(OsStr::to_str)
        .and_then(Format::from_extension)
    {
        return Ok(format);
    }
    Format::detect(input)
        .context("Failed to read input")?
        .context("Cannot determine record format: input does not start with HDR")
}

/// Reader options: config file or the format's defaults, then CLI overrides.
fn load_options<F: RecordFormat>(args: &Args) -> Result<ReaderOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            ReaderOptions::from_json(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => F::default_options(),
    };
    if let Some(first) = args.first_sequence {
        options.first_group_sequence = first;
    }
    Ok(options)
}

/// Reads the whole file, optionally listing groups and transactions to `out`.
fn read_report<R, F, W>(input: R, options: ReaderOptions, list: bool, out: &mut W) -> Result<Report>
where
    R: BufRead,
    F: RecordFormat,
    W: Write,
{
    let mut reader =
        EdiReader::<_, F>::with_options(input, options).context("Failed to open EDI input")?;
    let mut groups = Vec::new();

    while let Some(mut group) = reader.next_group().context("Failed to read group")? {
        if list {
            writeln!(
                out,
                "group {} {} at line {}",
                group.sequence(),
                group.record_type(),
                group.line()
            )?;
            for tx in group.transactions()? {
                let tx = tx.context("Failed to read transaction")?;
                writeln!(
                    out,
                    "  transaction {} at line {}: {} record(s)",
                    tx.sequence(),
                    tx.first_line(),
                    tx.lines().len()
                )?;
                for err in tx.errors() {
                    writeln!(out, "    {err}")?;
                }
            }
        }
        group.drain().context("Failed to read group")?;
        groups.push(group.summary());
    }

    Ok(reader.into_report(groups))
}

fn render_text<W: Write>(report: &Report, out: &mut W) -> Result<()> {
    writeln!(out, "format: {}", report.format)?;
    if let Some(header) = &report.header
        && !header.sender_name.is_empty()
    {
        writeln!(out, "sender: {} ({})", header.sender_name, header.sender_id)?;
    }
    writeln!(
        out,
        "groups: {}, transactions: {}, records: {}",
        report.group_count, report.transaction_count, report.record_count
    )?;
    for group in &report.groups {
        writeln!(
            out,
            "  group {} {}: {} transaction(s), {} record(s), {}",
            group.sequence,
            group.record_type,
            group.transaction_count,
            group.record_count,
            if group.valid { "ok" } else { "invalid" }
        )?;
    }
    for err in &report.errors {
        writeln!(out, "error: {err}")?;
    }
    writeln!(out, "{}", if report.valid { "VALID" } else { "INVALID" })?;
    Ok(())
}

/// CSV row for one group.
#[derive(Debug, Serialize)]
struct GroupRow<'a> {
    sequence: u32,
    record_type: &'a str,
    line: usize,
    transactions: u32,
    records: u32,
    valid: bool,
    errors: usize,
}

fn render_csv<W: Write>(report: &Report, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for group in &report.groups {
        writer.serialize(GroupRow {
            sequence: group.sequence,
            record_type: group.record_type.as_str(),
            line: group.line,
            transactions: group.transaction_count,
            records: group.record_count,
            valid: group.valid,
            errors: group.errors.len(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
