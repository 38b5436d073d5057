//! srcmeta - encoding, line count, content hash and change status of source files.
//!
//! Usage:
//!   srcmeta scan [PATH]      Attach metadata and print per-file status
//!   srcmeta export [PATH]    Export relative path -> hash as JSON
//!   srcmeta --help           Show help

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use srcmeta_scan::{
    BatchReport, ContentHash, Encoding, FileDiscovery, FileStatus, InMemoryBaseline, InputFileType,
    MetadataBatch, MetadataConfig, MetadataGenerator, StatusDetector,
};

#[derive(Parser)]
#[command(
    name = "srcmeta",
    version,
    about = "Encoding, line count, content hash and change status of source files",
    long_about = "srcmeta reads every file of a project once, detects its encoding, \
                  counts its lines, computes a hash that ignores encoding and line \
                  endings, and compares it with a previous analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(clap::Args)]
struct ScanArgs {
    /// Module base directory
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Module key (defaults to the directory name)
    #[arg(short, long)]
    module: Option<String>,

    /// Encoding of files without a byte-order mark
    #[arg(short, long, default_value = "US-ASCII")]
    encoding: Encoding,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Glob pattern of files to leave out (repeatable)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Include hidden files
    #[arg(long)]
    hidden: bool,

    /// Stop on the first unreadable file or baseline error instead of skipping
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Attach metadata to every file and print its status
    Scan {
        #[command(flatten)]
        args: ScanArgs,

        /// JSON file mapping relative path to hex hash from a previous run
        #[arg(short, long)]
        baseline: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export relative path -> hash as JSON, usable as a later baseline
    Export {
        #[command(flatten)]
        args: ScanArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One row of JSON scan output.
#[derive(Serialize)]
struct FileRow<'a> {
    path: &'a str,
    #[serde(rename = "type")]
    file_type: InputFileType,
    status: FileStatus,
    encoding: Encoding,
    lines: usize,
    non_blank_lines: usize,
    hash: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            args,
            baseline,
            format,
        } => run_scan(&args, baseline.as_deref(), format)?,
        Command::Export { args, output } => run_export(&args, output)?,
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Attach metadata and display per-file status.
fn run_scan(args: &ScanArgs, baseline: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = args.path.canonicalize().context("Invalid path")?;
    let config = build_config(args, &path)?;

    let detector = match baseline {
        Some(file) => {
            let baseline = load_baseline(file, &config.module_key)?;
            eprintln!("Loaded {} baseline entries", baseline.len());
            StatusDetector::new(Arc::new(baseline))
        }
        None => StatusDetector::empty(),
    };

    eprintln!("Scanning {}...", path.display());
    let report = run_batch(config, &path, detector)?;

    match format {
        OutputFormat::Text => print_report(&path, &report),
        OutputFormat::Json => {
            let files = report.registry.files();
            let rows: Vec<_> = files.iter().filter_map(|f| file_row(f)).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

/// Export relative path -> hex hash for the current tree.
fn run_export(args: &ScanArgs, output: Option<PathBuf>) -> Result<()> {
    let path = args.path.canonicalize().context("Invalid path")?;
    let config = build_config(args, &path)?;

    eprintln!("Scanning {}...", path.display());
    let report = run_batch(config, &path, StatusDetector::empty())?;

    let hashes: BTreeMap<String, String> = report
        .registry
        .files()
        .iter()
        .filter_map(|f| Some((f.relative_path().to_string(), f.metadata()?.hash.to_hex())))
        .collect();
    let json = serde_json::to_string_pretty(&hashes)?;

    match output {
        Some(output_path) => {
            fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported {} hashes to {}", hashes.len(), output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_config(args: &ScanArgs, path: &Path) -> Result<MetadataConfig> {
    let module_key = args
        .module
        .clone()
        .unwrap_or_else(|| default_module_key(path));

    MetadataConfig::builder()
        .module_key(module_key)
        .default_encoding(args.encoding)
        .threads(args.threads)
        .abort_on_unreadable(args.fail_fast)
        .abort_on_baseline_error(args.fail_fast)
        .ignore_patterns(args.ignore.clone())
        .include_hidden(args.hidden)
        .build()
        .context("Invalid configuration")
}

/// Directory name of `path`, usable as a module key.
fn default_module_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().replace(':', "_"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

/// Discover files under `path` and attach metadata to all of them.
fn run_batch(config: MetadataConfig, path: &Path, detector: StatusDetector) -> Result<BatchReport> {
    let discovered = FileDiscovery::new(&config)
        .context("Invalid file patterns")?
        .discover(path)
        .context("Discovery failed")?;

    for warning in &discovered.warnings {
        tracing::warn!("{}: {}", warning.path.display(), warning.message);
    }

    let batch = MetadataBatch::new(config, MetadataGenerator::new(detector));
    let mut progress_rx = batch.subscribe();
    let progress = thread::spawn(move || {
        loop {
            match progress_rx.blocking_recv() {
                Ok(progress) => eprint!(
                    "\r{}/{} files ({:.0} files/s)",
                    progress.files_processed,
                    progress.total_files,
                    progress.files_per_second()
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        eprintln!();
    });

    let result = batch.run(discovered.files);
    drop(batch);
    let _ = progress.join();

    result.context("Metadata generation failed")
}

/// Print a per-file table and summary.
fn print_report(path: &Path, report: &BatchReport) {
    let files = report.registry.files();
    let total_size: u64 = files
        .iter()
        .filter_map(|f| fs::metadata(f.absolute_path()).ok())
        .map(|m| m.len())
        .sum();

    println!();
    println!("{}", "─".repeat(60));
    println!(" {} - {}", path.display(), format_size(total_size));
    println!(
        " {} files: {} added, {} changed, {} same",
        report.published(),
        report.added,
        report.changed,
        report.same
    );
    println!(" Processed in {:.2}s", report.elapsed.as_secs_f64());
    println!("{}", "─".repeat(60));
    println!();

    for file in &files {
        let Some(attributes) = file.attributes() else {
            continue;
        };
        let marker = match file.file_type() {
            InputFileType::Main => ' ',
            InputFileType::Test => 'T',
        };
        println!(
            "{:>7} {} {:>6} {:<9} {}  {}",
            attributes.status,
            marker,
            attributes.metadata.lines,
            attributes.encoding.label(),
            short_hash(&attributes.metadata.hash),
            file.relative_path()
        );
    }

    if !report.has_skipped() {
        return;
    }
    println!();
    if !report.skipped.is_empty() {
        println!("{} unreadable file(s) skipped", report.skipped.len());
        for err in &report.skipped {
            println!("  {}: {}", err.path.display(), err.source);
        }
    }
    if !report.baseline_failures.is_empty() {
        println!("{} file(s) skipped on baseline errors", report.baseline_failures.len());
        for err in &report.baseline_failures {
            println!("  {}: {}", err.relative_path, err.message);
        }
    }
    if !report.duplicates.is_empty() {
        println!("{} duplicate key(s) ignored", report.duplicates.len());
        for key in &report.duplicates {
            println!("  {key}");
        }
    }
}

fn file_row(file: &srcmeta_scan::InputFile) -> Option<FileRow<'_>> {
    let attributes = file.attributes()?;
    Some(FileRow {
        path: file.relative_path(),
        file_type: file.file_type(),
        status: attributes.status,
        encoding: attributes.encoding,
        lines: attributes.metadata.lines,
        non_blank_lines: attributes.metadata.non_blank_lines,
        hash: attributes.metadata.hash.to_hex(),
    })
}

/// Read a JSON object of relative path -> hex hash into a baseline.
///
/// Entries with an empty hash count as not previously seen.
fn load_baseline(file: &Path, module_key: &str) -> Result<InMemoryBaseline> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read baseline {}", file.display()))?;
    parse_baseline(&text, module_key)
        .with_context(|| format!("Invalid baseline {}", file.display()))
}

fn parse_baseline(text: &str, module_key: &str) -> Result<InMemoryBaseline> {
    let entries: BTreeMap<String, String> = serde_json::from_str(text)?;

    let mut baseline = InMemoryBaseline::new();
    for (relative_path, hex) in entries {
        if hex.is_empty() {
            continue;
        }
        let hash = ContentHash::from_hex(&hex)
            .ok_or_else(|| eyre!("Invalid hash for '{relative_path}': {hex}"))?;
        baseline.insert(module_key, relative_path, hash);
    }
    Ok(baseline)
}

/// First 12 hex digits of a hash.
fn short_hash(hash: &ContentHash) -> String {
    let mut hex = hash.to_hex();
    hex.truncate(12);
    hex
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use srcmeta_scan::BaselineStore;

    #[test]
    fn test_parse_baseline() {
        let hex = "ab".repeat(32);
        let text = format!(r#"{{"src/a.rs": "{hex}", "src/b.rs": ""}}"#);

        let baseline = parse_baseline(&text, "m").unwrap();

        assert_eq!(baseline.len(), 1);
        assert_eq!(
            baseline.previous_hash("m", "src/a.rs").unwrap(),
            Some(ContentHash::new([0xab; 32]))
        );
        assert_eq!(baseline.previous_hash("m", "src/b.rs").unwrap(), None);
    }

    #[test]
    fn test_parse_baseline_rejects_bad_hash() {
        assert!(parse_baseline(r#"{"a.rs": "xyz"}"#, "m").is_err());
        assert!(parse_baseline("[1, 2]", "m").is_err());
    }

    #[test]
    fn test_default_module_key() {
        assert_eq!(default_module_key(Path::new("/work/struts")), "struts");
        assert_eq!(default_module_key(Path::new("/")), "root");
    }

    #[test]
    fn test_cli_parses_scan() {
        let cli = Cli::try_parse_from([
            "srcmeta", "scan", "proj", "--encoding", "utf-16le", "--fail-fast", "-f", "json",
        ])
        .unwrap();
        match cli.command {
            Command::Scan { args, format, .. } => {
                assert_eq!(args.encoding, Encoding::Utf16Le);
                assert!(args.fail_fast);
                assert!(matches!(format, OutputFormat::Json));
            }
            Command::Export { .. } => panic!("expected scan"),
        }
    }
}
