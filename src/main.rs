// tracegrep - main.rs
//
// Application entry point: CLI argument parsing, logging initialisation,
// and wiring of Parser -> Query -> Grep -> Writer.

pub use tracegrep::core;
pub use tracegrep::util;

use clap::Parser as ClapParser;
use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use core::grep::{Grep, ProgressSink};
use core::query::Query;
use core::writer::{OutputMode, Writer};
use core::Parser as LogParser;
use util::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_CONTEXT, PROGRESS_UPDATE_INTERVAL_MS};
use util::error::{CliError, Result};

/// A correlating grep for multi-line telephony engine trace logs.
///
/// Scans `input` (or `-` for stdin) for records matching `query`
/// (`key=value`), then follows channel and address correlations to pull in
/// related records from elsewhere in the log.
#[derive(ClapParser, Debug)]
#[command(name = "tracegrep", version, about)]
struct Cli {
    /// Query in the form key=value, e.g. billid=1234.
    query: String,

    /// Input file, or - for stdin.
    input: String,

    /// Write output to PATH instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// On every correlation flush, dump the current channel/address snapshot to stderr.
    #[arg(short = 'D', long = "dump-on-flush")]
    dump_on_flush: bool,

    /// Emit XHTML fragments instead of plain text.
    #[arg(short = 'x', long = "xhtml", conflicts_with = "xhtml_document")]
    xhtml: bool,

    /// Emit a full XHTML document (prelude + postlude) instead of plain text.
    #[arg(short = 'X', long = "xhtml-document")]
    xhtml_document: bool,

    /// Show N entries of context before and after each match.
    #[arg(short = 'C', long = "context", default_value_t = DEFAULT_CONTEXT)]
    context: usize,

    /// Size of the look-back correlation window, in entries.
    #[arg(short = 'B', long = "buffer", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer: usize,

    /// Disable correlation via network addresses.
    #[arg(short = 'N', long = "no-network")]
    no_network: bool,

    /// Suppress the progress indicator.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(long = "debug")]
    debug: bool,
}

fn parse_query(raw: &str) -> std::result::Result<Vec<(String, String)>, CliError> {
    raw.split_once('=')
        .map(|(k, v)| vec![(k.to_string(), v.to_string())])
        .ok_or_else(|| CliError::MalformedQuery {
            given: raw.to_string(),
        })
}

fn open_input(path: &str) -> std::result::Result<(Box<dyn Read>, Option<u64>), CliError> {
    if path == "-" {
        return Ok((Box::new(io::stdin()), None));
    }
    let path_buf = PathBuf::from(path);
    let file = File::open(&path_buf).map_err(|source| CliError::InputNotOpenable {
        path: path_buf.clone(),
        source,
    })?;
    let len = file.metadata().ok().map(|m| m.len());
    Ok((Box::new(file), len))
}

fn open_output(path: &Option<PathBuf>) -> std::result::Result<Box<dyn Write>, CliError> {
    match path {
        Some(p) => {
            let file = File::create(p).map_err(|source| CliError::OutputNotOpenable {
                path: p.clone(),
                source,
            })?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::BufWriter::new(io::stdout()))),
    }
}

/// Drives the stderr progress indicator: filename, percentage, mark count,
/// and query correlation stats. Silent when the total length is unknown
/// (stdin), when stderr isn't a TTY, or when `-q` was given.
struct ProgressIndicator {
    label: String,
    total_bytes: Option<u64>,
    enabled: bool,
    last_report: Option<Instant>,
    last_line_len: usize,
}

impl ProgressIndicator {
    fn new(label: String, total_bytes: Option<u64>, quiet: bool) -> Self {
        let enabled = !quiet && total_bytes.is_some() && io::stderr().is_terminal();
        Self {
            label,
            total_bytes,
            enabled,
            last_report: None,
            last_line_len: 0,
        }
    }

    fn finish(&mut self) {
        if self.enabled && self.last_line_len > 0 {
            eprintln!();
        }
    }
}

impl ProgressSink for ProgressIndicator {
    fn report(&mut self, bytes_consumed: u64, marked_count: u64, query: &Query) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_report {
            if now.duration_since(last).as_millis() < PROGRESS_UPDATE_INTERVAL_MS as u128 {
                return;
            }
        }
        self.last_report = Some(now);

        let total = self.total_bytes.unwrap_or(1).max(1);
        let pct = (bytes_consumed.min(total) * 100 / total).min(100);
        let line = format!(
            "{}: {pct}% marked={marked_count} channels={} addrs={}",
            self.label,
            query.channels().len(),
            query.addrs().len(),
        );
        self.last_line_len = line.len();
        eprint!("\r{line}\r");
        let _ = io::stderr().flush();
    }
}

fn run(cli: Cli) -> Result<()> {
    util::logging::init(cli.debug);

    let params = parse_query(&cli.query)?;
    let (input, total_len) = open_input(&cli.input)?;
    let output = open_output(&cli.output)?;

    let mode = if cli.xhtml || cli.xhtml_document {
        OutputMode::Xhtml
    } else {
        OutputMode::Plain
    };

    let mut query = Query::new(params, cli.no_network, cli.dump_on_flush);
    let parser = LogParser::new(input);
    let mut writer = Writer::new(output, mode, cli.context);
    let grep = Grep::new(cli.buffer.max(1));
    let mut progress = ProgressIndicator::new(cli.input.clone(), total_len, cli.quiet);

    if cli.xhtml_document {
        // The prelude/postlude frame the whole document; Writer only knows
        // how to wrap individual entries, so the frame is written here.
        writer
            .raw_write(core::html::XHTML_PRELUDE.as_bytes())
            .map_err(util::error::GrepError::from)?;
    }

    let result = grep
        .run(parser, &mut query, &mut writer, &mut progress)
        .map_err(util::error::GrepError::from);

    progress.finish();

    result?;

    if cli.xhtml_document {
        writer
            .raw_write(core::html::XHTML_POSTLUDE.as_bytes())
            .map_err(util::error::GrepError::from)?;
    }

    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.exit_code() == 0 { 0 } else { 1 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("tracegrep: {err}");
        std::process::exit(1);
    }
}
