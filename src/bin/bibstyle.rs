//! bibstyle - canonicalize a BibTeX database
//!
//! Reads a `.bib` file (or standard input), applies the selected cleanups and writes the
//! result back to the same file (keeping a `.orig` copy) or to standard output.

use anyhow::{Context, Result};
use bibstyle::{
    pipeline, AuthorFormat, Database, DelimiterStyle, Diagnostics, KeyStyle, SortStyle,
    TidyOptions,
};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bibstyle")]
#[command(version)]
#[command(about = "Canonicalize and tidy BibTeX databases", long_about = None)]
#[command(after_help = "Usage: bibstyle [options] input.bib\n       \
                        bibstyle [options] < input.bib > output.bib\n\n\
                        A named input file is overwritten in place; the original is kept as \
                        <input>.orig")]
struct Cli {
    /// Input file (standard input when omitted)
    input: Option<PathBuf>,

    /// Convert outer delimiters of field values to braces or double quotes
    #[arg(long, value_enum)]
    field_delimiters: Option<DelimiterStyle>,

    /// Replace special UTF-8 symbols with the corresponding LaTeX command
    #[arg(long)]
    replace_unicode: bool,

    /// Replace a single dash with a double one in page ranges
    #[arg(long)]
    fix_pages: bool,

    /// Remove line breaks and adjust white space in prose fields
    #[arg(long)]
    fix_padding: bool,

    /// Regenerate entry keys in the given style
    #[arg(long, value_enum)]
    keys: Option<KeyStyle>,

    /// Rewrite \cite keys in this TeX file to match the regenerated keys
    #[arg(long, value_name = "FILE", requires = "keys")]
    keys_tex: Option<PathBuf>,

    /// Sort entries
    #[arg(long, value_enum)]
    sort: Option<SortStyle>,

    /// Format author names as "First Last" (space) or "Last, First" (comma)
    #[arg(long, value_enum)]
    format_author: Option<AuthorFormat>,

    /// Fill in missing fields from a record store (SQLite database, or a .json file)
    #[arg(long, value_name = "FILE")]
    sync_db: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Apply the default cleanup set
    #[arg(long)]
    default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    const fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

impl Cli {
    /// Run options: the preset when `--default` is given, then explicit flags on top
    fn options(&self) -> TidyOptions {
        let mut options = if self.default {
            TidyOptions::preset()
        } else {
            TidyOptions::new()
        };

        if let Some(style) = self.field_delimiters {
            options = options.with_delimiters(style);
        }
        options.replace_unicode |= self.replace_unicode;
        options.fix_pages |= self.fix_pages;
        options.fix_padding |= self.fix_padding;
        if let Some(style) = self.keys {
            options = options.with_keys(style);
        }
        if let Some(style) = self.sort {
            options = options.with_sort(style);
        }
        if let Some(format) = self.format_author {
            options = options.with_author_format(format);
        }
        if let Some(path) = &self.sync_db {
            options = options.with_sync_db(path);
        }
        options
    }

    fn log_level(&self) -> LogLevel {
        match self.log_level {
            Some(level) => level,
            None if self.default => LogLevel::Debug,
            None => LogLevel::Info,
        }
    }
}

fn init_logging(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.directive().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn read_input(input: Option<&Path>, diag: &mut Diagnostics) -> Result<Database> {
    let Some(path) = input else {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("cannot read standard input")?;
        return Ok(Database::parse(&content, diag)?);
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let mut db = Database::parse(&content, diag)?;
    db.set_source(path.display().to_string());
    Ok(db)
}

/// Rewrite the citations of an already loaded TeX file, keeping a `.orig` copy
fn rewrite_tex(path: &Path, tex: &str, renames: &bibstyle::KeyRenames) -> Result<()> {
    let (rewritten, count) = bibstyle::rewrite_citations(tex, renames);
    if count > 0 {
        bibstyle::backup(path)?;
        std::fs::write(path, rewritten)
            .with_context(|| format!("cannot write '{}'", path.display()))?;
    }
    tracing::info!("updated {count} citation keys in {}", path.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let mut diag = Diagnostics::new();
    let mut db = read_input(cli.input.as_deref(), &mut diag)?;

    // must be read before any output is written
    let tex = cli
        .keys_tex
        .as_deref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("cannot read '{}'", path.display()))
                .map(|content| (path, content))
        })
        .transpose()?;

    let report = pipeline::run(&mut db, &cli.options(), &mut diag);

    match &cli.input {
        Some(path) => bibstyle::write_with_backup(&db, path)
            .with_context(|| format!("cannot create output file '{}'", path.display()))?,
        None => {
            let stdout = io::stdout();
            bibstyle::Writer::new(stdout.lock())
                .write_database(&db)
                .context("cannot write to standard output")?;
        }
    }

    if let Some((path, content)) = &tex {
        rewrite_tex(path, content, &report.renames)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
