//! pdf2table - Reconstruct a table from one page of a PDF
//!
//! Runs poppler's `pdftohtml -xml` on the page, then groups the positioned
//! text fragments into rows and columns and prints them as tab-separated
//! text or JSON.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use pdfgrid_core::converter::{HtmlOptions, PdfToHtml, SystemRunner};
use pdfgrid_core::table::{ColumnRange, TableEntry, TableExtractionConfig, VerticalRange};
use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Output format for the reconstructed rows.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// One row per line, cells separated by tabs
    #[default]
    Text,
    /// JSON array of rows with their bounds
    Json,
}

/// Reconstruct a table from positioned text on one PDF page.
#[derive(Parser, Debug)]
#[command(name = "pdf2table")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Page to read (1-indexed)
    #[arg(short = 'p', long, default_value = "1")]
    page: u32,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// JSON file describing the table layout; overrides the layout options
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    // === Layout options ===
    /// Smallest `top` of a fragment inside the table
    #[arg(long)]
    from: Option<i32>,

    /// Largest `top` of a fragment inside the table
    #[arg(long)]
    to: Option<i32>,

    /// Comma-separated column anchors (left coordinates)
    #[arg(short = 'a', long, value_delimiter = ',', conflicts_with = "ranges")]
    anchors: Vec<i32>,

    /// Maximum distance between a fragment and its column anchor (exclusive)
    #[arg(long = "column-tolerance", default_value = "10")]
    column_tolerance: i32,

    /// Comma-separated inclusive column ranges, e.g. `50-80,190-320`
    #[arg(short = 'r', long, value_delimiter = ',', value_parser = parse_range)]
    ranges: Vec<ColumnRange>,

    /// Maximum distance below a row's first fragment that joins the row
    #[arg(long = "row-tolerance", default_value = "5")]
    row_tolerance: i32,

    /// Drop rows with fewer filled cells than this
    #[arg(long = "min-cells", default_value = "0")]
    min_cells: usize,

    // === Output options ===
    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Output format
    #[arg(short = 't', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Kill pdftohtml after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

/// Table layout as read from a `--config` file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TableLayout {
    #[serde(default)]
    from: Option<i32>,
    #[serde(default)]
    to: Option<i32>,
    #[serde(default = "default_row_tolerance")]
    row_height_tolerance: i32,
    #[serde(flatten)]
    columns: LayoutColumns,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum LayoutColumns {
    Anchored {
        anchors: Vec<i32>,
        #[serde(default = "default_column_tolerance")]
        column_tolerance: i32,
    },
    Ranges {
        ranges: Vec<ColumnRange>,
    },
}

fn default_row_tolerance() -> i32 {
    5
}

fn default_column_tolerance() -> i32 {
    10
}

impl TableLayout {
    fn from_args(args: &Args) -> Result<Self> {
        let columns = if !args.ranges.is_empty() {
            LayoutColumns::Ranges {
                ranges: args.ranges.clone(),
            }
        } else if !args.anchors.is_empty() {
            LayoutColumns::Anchored {
                anchors: args.anchors.clone(),
                column_tolerance: args.column_tolerance,
            }
        } else {
            bail!("no columns given: pass --anchors, --ranges or --config");
        };
        Ok(Self {
            from: args.from,
            to: args.to,
            row_height_tolerance: args.row_tolerance,
            columns,
        })
    }

    fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("invalid table layout in {}", path.display()))
    }

    fn into_config(self) -> TableExtractionConfig {
        let window = VerticalRange::new(
            self.from.unwrap_or(i32::MIN),
            self.to.unwrap_or(i32::MAX),
        );
        let config = match self.columns {
            LayoutColumns::Anchored {
                anchors,
                column_tolerance,
            } => TableExtractionConfig::anchored(window, anchors, column_tolerance),
            LayoutColumns::Ranges { ranges } => TableExtractionConfig::with_ranges(window, ranges),
        };
        config.with_row_height_tolerance(self.row_height_tolerance)
    }
}

/// Parse `from-to`, allowing a leading minus on either bound.
fn parse_range(s: &str) -> std::result::Result<ColumnRange, String> {
    let s = s.trim();
    let split = s
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(i, _)| i)
        .ok_or_else(|| format!("expected FROM-TO, got {s:?}"))?;
    let (from, to) = (&s[..split], &s[split + 1..]);
    let from = from
        .trim()
        .parse()
        .map_err(|_| format!("invalid range start {from:?}"))?;
    let to = to
        .trim()
        .parse()
        .map_err(|_| format!("invalid range end {to:?}"))?;
    Ok(ColumnRange::new(from, to))
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn write_text<W: Write>(writer: &mut W, rows: &[TableEntry]) -> io::Result<()> {
    for row in rows {
        let cells: Vec<&str> = row
            .content
            .iter()
            .map(|cell| cell.as_ref().map_or("", |c| c.text.trim()))
            .collect();
        writeln!(writer, "{}", cells.join("\t"))?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let layout = match &args.config {
        Some(path) => TableLayout::load(path)?,
        None => TableLayout::from_args(args)?,
    };
    debug!(?layout, "table layout");

    let mut config = layout.into_config();
    if args.min_cells > 0 {
        let min_cells = args.min_cells;
        config = config.with_row_filter(move |row| row.filled_columns() >= min_cells);
    }
    config.validate().context("invalid table layout")?;

    let runner = match args.timeout {
        Some(secs) => SystemRunner::with_timeout(Duration::from_secs(secs)),
        None => SystemRunner::default(),
    };
    let pdftohtml = PdfToHtml::with_runner(runner)?;
    let options = HtmlOptions {
        quiet: true,
        ..HtmlOptions::default().pages(args.page, args.page)
    };
    let converted = pdftohtml
        .xml(&args.file, &options)
        .with_context(|| format!("converting {}", args.file.display()))?;
    if let Some(err) = &converted.cleanup {
        warn!(error = %err, "scratch files left behind");
    }
    let doc = converted.into_inner();

    let page = doc
        .page(args.page)
        .with_context(|| format!("{} has no page {}", args.file.display(), args.page))?;
    let rows = page.extract_table(&config);
    info!(page = args.page, rows = rows.len(), "extracted table");

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = fs::File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };
    match args.format {
        OutputFormat::Text => write_text(&mut output, &rows)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut output, &rows)?;
            writeln!(output)?;
        }
    }
    output.flush()?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
