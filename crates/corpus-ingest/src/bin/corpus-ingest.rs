//! corpus-ingest command line
//!
//! Run with: cargo run -p corpus-ingest -- 'data/*.txt' --docvars-from filenames --docvar-names unit,year

use anyhow::Context;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use corpus_ingest::{
    DocvarsFrom, EncodingSpec, ErrorPolicy, FieldSelector, IngestConfig, Ingestor,
    MismatchPolicy, ResultTable,
};

/// Ingest text-bearing files into one document table
#[derive(Parser)]
#[command(name = "corpus-ingest", version, about, long_about = None)]
struct Cli {
    /// Globs, directories, files, archives or http(s) URLs
    #[arg(required = true)]
    locators: Vec<String>,

    /// TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Column, key or XML element holding the text (name or 1-based position)
    #[arg(long)]
    text_field: Option<String>,

    /// Column or key holding the document id
    #[arg(long)]
    docid_field: Option<String>,

    /// Where docvars come from
    #[arg(long, value_enum)]
    docvars_from: Option<DocvarsArg>,

    /// Docvar names for filename splitting (comma-separated)
    #[arg(long, value_delimiter = ',')]
    docvar_names: Vec<String>,

    /// Separator regex for filename splitting
    #[arg(long)]
    dvsep: Option<String>,

    /// CSV file with docvars for `--docvars-from table`
    #[arg(long)]
    docvars_table: Option<PathBuf>,

    /// Column of the docvars table holding file names (match by position if unset)
    #[arg(long)]
    docvars_key: Option<String>,

    /// Encoding label; repeat to give one per source
    #[arg(long)]
    encoding: Vec<String>,

    /// Field delimiter for delimited tables
    #[arg(long)]
    delimiter: Option<String>,

    /// Delimited tables have no header row
    #[arg(long)]
    no_header: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Report failing sources as warnings instead of aborting
    #[arg(long)]
    collect_errors: bool,

    /// Skip sources whose file names do not match the docvar names
    #[arg(long)]
    skip_mismatch: bool,

    /// Accept locators that match nothing
    #[arg(long)]
    allow_empty: bool,

    /// Maximum sources extracted in parallel
    #[arg(short = 'j', long)]
    parallelism: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DocvarsArg {
    None,
    Filenames,
    Filepaths,
    Table,
}

impl From<DocvarsArg> for DocvarsFrom {
    fn from(arg: DocvarsArg) -> Self {
        match arg {
            DocvarsArg::None => DocvarsFrom::None,
            DocvarsArg::Filenames => DocvarsFrom::Filenames,
            DocvarsArg::Filepaths => DocvarsFrom::Filepaths,
            DocvarsArg::Table => DocvarsFrom::Table,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl Cli {
    /// Config file values with flags applied on top
    fn to_config(&self) -> anyhow::Result<IngestConfig> {
        let mut config = match &self.config {
            Some(path) => IngestConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => IngestConfig::default(),
        };

        if let Some(field) = &self.text_field {
            config.text_field = Some(FieldSelector::from(field.as_str()));
        }
        if let Some(field) = &self.docid_field {
            config.docid_field = Some(FieldSelector::from(field.as_str()));
        }
        if let Some(from) = self.docvars_from {
            config.docvarsfrom = from.into();
        }
        if !self.docvar_names.is_empty() {
            config.docvarnames = self.docvar_names.clone();
        }
        if let Some(sep) = &self.dvsep {
            config.dvsep = sep.clone();
        }
        if let Some(path) = &self.docvars_table {
            config.docvars_table = Some(path.clone());
        }
        if let Some(key) = &self.docvars_key {
            config.docvars_key = Some(key.clone());
        }
        match self.encoding.as_slice() {
            [] => {}
            [single] => config.encoding = EncodingSpec::Single(single.clone()),
            many => config.encoding = EncodingSpec::List(many.to_vec()),
        }
        if let Some(delimiter) = &self.delimiter {
            config.delimiter = Some(delimiter.clone());
        }
        if self.no_header {
            config.has_header = false;
        }
        if self.recursive {
            config.recursive = true;
        }
        if self.collect_errors {
            config.on_error = ErrorPolicy::Collect;
        }
        if self.skip_mismatch {
            config.docvar_mismatch = MismatchPolicy::Skip;
        }
        if self.allow_empty {
            config.allow_empty = true;
        }
        if self.parallelism.is_some() {
            config.parallelism = self.parallelism;
        }

        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "corpus_ingest=info",
        1 => "corpus_ingest=debug",
        _ => "corpus_ingest=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn write_table(table: &ResultTable, format: OutputFormat, out: impl Write) -> anyhow::Result<()> {
    let mut out = BufWriter::new(out);
    match format {
        OutputFormat::Csv => table.write_csv(&mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &table.to_json())?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.to_config()?;
    let ingestor = Ingestor::new(config)?;

    let progress = spinner(format!("Ingesting {}", cli.locators.join(", ")));
    let result = ingestor.ingest_many(&cli.locators).await;
    progress.finish_and_clear();
    let outcome = result?;

    for warning in &outcome.warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_table(&outcome.table, cli.format, file)?;
        }
        None => write_table(&outcome.table, cli.format, io::stdout().lock())?,
    }

    eprintln!(
        "{} {} documents, {} docvar columns",
        style("done:").green().bold(),
        outcome.table.len(),
        outcome.table.docvar_columns.len()
    );
    Ok(())
}
