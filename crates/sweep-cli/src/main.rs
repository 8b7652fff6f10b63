//! CleanSweep CLI
//!
//! Command-line tool for merging, cleaning, previewing and exporting CSV files.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use sweep_core::{
    collect_csv_files, parse_csv, render_table, write_payloads, LineEnding, MergeConfig, Session,
    Table, TablePreview, TextEncoding,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cleansweep")]
#[command(about = "Merge and clean CSV files", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load CSV files, optionally merge them, preview and export the result
    Clean {
        /// CSV files or directories containing CSV files
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Merge options file (JSON); flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Merge the uploaded CSV files (needs more than one file)
        #[arg(short, long)]
        merge: bool,

        /// Keep only the header of the first file
        #[arg(long, value_enum)]
        keep_first_header: Option<Choice>,

        /// Remove duplicate rows
        #[arg(long, value_enum)]
        remove_duplicates: Option<Choice>,

        /// Remove empty rows
        #[arg(long, value_enum)]
        remove_empty: Option<Choice>,

        /// Line ending of exported files
        #[arg(long, value_enum)]
        line_ending: Option<LineEndingArg>,

        /// Encoding of the input files
        #[arg(long, value_enum, default_value = "latin1")]
        input_encoding: EncodingArg,

        /// Encoding of the exported files
        #[arg(long, value_enum, default_value = "utf8")]
        output_encoding: EncodingArg,

        /// Do not print the resulting tables
        #[arg(long)]
        no_preview: bool,

        /// Maximum number of rows to display per table
        #[arg(short, long)]
        limit: Option<usize>,

        /// Preview format
        #[arg(long, value_enum, default_value = "text")]
        format: PreviewFormat,

        /// Directory to write cleaned_data_<n>.csv files into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and display a single CSV file
    Parse {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Encoding of the file
        #[arg(long, value_enum, default_value = "latin1")]
        input_encoding: EncodingArg,
    },

    /// Create a merge options file with the default settings
    InitConfig {
        /// Output path for the options file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Choice {
    Yes,
    No,
}

impl From<Choice> for bool {
    fn from(choice: Choice) -> bool {
        matches!(choice, Choice::Yes)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LineEndingArg {
    Lf,
    Crlf,
}

impl From<LineEndingArg> for LineEnding {
    fn from(arg: LineEndingArg) -> Self {
        match arg {
            LineEndingArg::Lf => LineEnding::Lf,
            LineEndingArg::Crlf => LineEnding::Crlf,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    Latin1,
    Utf8,
}

impl From<EncodingArg> for TextEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Latin1 => TextEncoding::Latin1,
            EncodingArg::Utf8 => TextEncoding::Utf8,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PreviewFormat {
    Text,
    Json,
}

/// Flag values that override the options file
struct MergeOverrides {
    keep_first_header: Option<Choice>,
    remove_duplicates: Option<Choice>,
    remove_empty: Option<Choice>,
    line_ending: Option<LineEndingArg>,
}

impl MergeOverrides {
    fn is_empty(&self) -> bool {
        self.keep_first_header.is_none()
            && self.remove_duplicates.is_none()
            && self.remove_empty.is_none()
            && self.line_ending.is_none()
    }

    fn apply(self, mut config: MergeConfig) -> MergeConfig {
        if let Some(c) = self.keep_first_header {
            config.align_headers_to_first = c.into();
        }
        if let Some(c) = self.remove_duplicates {
            config.drop_duplicate_rows = c.into();
        }
        if let Some(c) = self.remove_empty {
            config.drop_empty_rows = c.into();
        }
        if let Some(l) = self.line_ending {
            config.line_ending = l.into();
        }
        config
    }
}

struct PreviewOptions {
    enabled: bool,
    limit: Option<usize>,
    format: PreviewFormat,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        if let Some(hint) = hint_for(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sweep_core={level},cleansweep={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Corrective guidance for errors the user can fix
fn hint_for(error: &sweep_core::Error) -> Option<&'static str> {
    match error {
        sweep_core::Error::ColumnMismatch { .. } => Some(
            "Please make sure columns match in all files. \
             If you don't want them to match, pass '--keep-first-header no'.",
        ),
        sweep_core::Error::NoInput => Some("Please upload CSV file(s)."),
        _ => None,
    }
}

fn run(command: Commands) -> sweep_core::Result<()> {
    match command {
        Commands::Clean {
            input,
            config,
            merge,
            keep_first_header,
            remove_duplicates,
            remove_empty,
            line_ending,
            input_encoding,
            output_encoding,
            no_preview,
            limit,
            format,
            output,
        } => {
            let overrides = MergeOverrides {
                keep_first_header,
                remove_duplicates,
                remove_empty,
                line_ending,
            };
            let preview = PreviewOptions {
                enabled: !no_preview,
                limit,
                format,
            };
            if !merge && (config.is_some() || !overrides.is_empty()) {
                warn!("merge options have no effect without --merge");
            }
            cmd_clean(
                &input,
                config.as_deref(),
                merge.then_some(overrides),
                input_encoding.into(),
                output_encoding.into(),
                &preview,
                output.as_deref(),
            )
        }
        Commands::Parse {
            file,
            input_encoding,
        } => cmd_parse(&file, input_encoding.into()),
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

fn load_tables(inputs: &[PathBuf], encoding: TextEncoding) -> sweep_core::Result<Vec<Table>> {
    let files = collect_csv_files(inputs)?;
    info!(files = files.len(), %encoding, "loading uploads");

    files.iter().map(|path| parse_csv(path, encoding)).collect()
}

fn cmd_clean(
    inputs: &[PathBuf],
    config_path: Option<&Path>,
    merge: Option<MergeOverrides>,
    input_encoding: TextEncoding,
    output_encoding: TextEncoding,
    preview: &PreviewOptions,
    output_dir: Option<&Path>,
) -> sweep_core::Result<()> {
    let tables = load_tables(inputs, input_encoding)?;
    clean_tables(tables, config_path, merge, output_encoding, preview, output_dir)
}

fn clean_tables(
    tables: Vec<Table>,
    config_path: Option<&Path>,
    merge: Option<MergeOverrides>,
    output_encoding: TextEncoding,
    preview: &PreviewOptions,
    output_dir: Option<&Path>,
) -> sweep_core::Result<()> {
    let mut session = Session::new(tables)?;

    if let Some(overrides) = merge {
        if session.offers_merge() {
            let base = match config_path {
                Some(path) => MergeConfig::load(path)?,
                None => MergeConfig::default(),
            };
            let config = overrides.apply(base);
            info!(?config, "merging uploads");
            session.apply(&config)?;
        } else {
            warn!("only one file loaded, nothing to merge");
        }
    }

    if preview.enabled {
        print_preview(session.table_set().tables(), preview)?;
    }

    if let Some(dir) = output_dir {
        let payloads = session.export(output_encoding)?;
        let written = write_payloads(&payloads, dir)?;

        println!("Exported {} file(s) to {}", written.len(), dir.display());
        for path in &written {
            println!("  - {}", path.display());
        }
    }

    Ok(())
}

fn print_preview(tables: &[Table], options: &PreviewOptions) -> sweep_core::Result<()> {
    match options.format {
        PreviewFormat::Text => {
            for (i, table) in tables.iter().enumerate() {
                println!("DataFrame {} ({})", i + 1, table.name);
                print!("{}", render_table(table, options.limit));
                println!();
            }
        }
        PreviewFormat::Json => {
            let previews: Vec<TablePreview> = tables
                .iter()
                .enumerate()
                .map(|(i, table)| TablePreview::new(table, i + 1, options.limit))
                .collect();
            println!("{}", serde_json::to_string_pretty(&previews)?);
        }
    }

    Ok(())
}

fn cmd_parse(file: &Path, encoding: TextEncoding) -> sweep_core::Result<()> {
    let table = parse_csv(file, encoding)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();
    print!("{}", render_table(&table, Some(10)));

    Ok(())
}

fn cmd_init_config(output: &Path) -> sweep_core::Result<()> {
    let config = MergeConfig::default();
    config.save(output)?;

    println!("Created options file: {}", output.display());
    println!();
    println!("Edit the file to change the merge options, then run:");
    println!(
        "  cleansweep clean --input <files> --merge --config {}",
        output.display()
    );

    Ok(())
}
