//! Main entry point for the ipameta CLI application.
//!
//! Reads an IPA archive into memory, derives its metadata and prints it, or
//! lists the archive's entries.

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ipameta::{AppMetadata, Cli, MetadataPipeline, ZipArchive, is_supported_archive_name};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.any_extension && !is_supported_archive_name(&cli.file) {
        bail!(
            "{} is not an .ipa or .app.zip file (use --any-extension to read it anyway)",
            cli.file
        );
    }

    let bytes = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("failed to read {}", cli.file))?;
    debug!(file = %cli.file, size = bytes.len(), "read archive");

    if cli.list {
        return list_files(&bytes, cli.verbose);
    }

    let pipeline = MetadataPipeline::from_config(&cli.store_config())
        .context("failed to set up store client")?;
    let metadata = pipeline
        .derive_metadata(&bytes)
        .await
        .with_context(|| format!("failed to parse IPA metadata from {}", cli.file))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        print_metadata(&metadata, &cli);
    }

    // Advisory only: identity fields are complete either way.
    if metadata.is_partial() && !cli.is_very_quiet() {
        eprintln!("warning: App Store metadata unavailable.");
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` enables debug output for this
/// crate and the default only shows warnings.
fn init_logging(cli: &Cli) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("ipameta=debug")
    } else if cli.is_very_quiet() {
        EnvFilter::new("ipameta=error")
    } else {
        EnvFilter::new("ipameta=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the metadata record, one right-aligned label per line.
fn print_metadata(metadata: &AppMetadata, cli: &Cli) {
    let unknown = "(unknown)";
    let or_unknown = |value: &str| {
        if value.is_empty() {
            unknown.to_string()
        } else {
            value.to_string()
        }
    };

    println!("{:>12}  {}", "Name", or_unknown(&metadata.name));
    println!("{:>12}  {}", "Version", or_unknown(&metadata.version));
    println!("{:>12}  {}", "Bundle ID", or_unknown(&metadata.bundle_id));

    if metadata.is_partial() {
        return;
    }

    let developer = metadata.developer.as_deref().unwrap_or_default();
    println!(
        "{:>12}  {}",
        "Developer",
        if developer.is_empty() {
            "Unknown Developer"
        } else {
            developer
        }
    );
    if metadata.rating > 0.0 {
        println!("{:>12}  {:.1}", "Rating", metadata.rating);
    }
    if let Some(genre) = metadata.genre.as_deref().filter(|g| !g.is_empty()) {
        println!("{:>12}  {}", "Genre", genre);
    }
    if let Some(price) = metadata.price.as_deref().filter(|p| !p.is_empty()) {
        println!("{:>12}  {}", "Price", price);
    }
    if let Some(size) = metadata.file_size.filter(|s| *s > 0) {
        println!("{:>12}  {}", "Size", format_size(size));
    }
    if !metadata.icon.is_empty() {
        println!("{:>12}  {}", "Icon", metadata.icon);
    }
    if !cli.is_quiet() {
        if let Some(description) = metadata.description.as_deref().filter(|d| !d.is_empty()) {
            println!();
            println!("{}", description);
        }
    }
}

const RULE_WIDTH: usize = 70;

/// Running totals for the verbose listing; directories are not counted.
#[derive(Default)]
struct Totals {
    uncompressed: u64,
    compressed: u64,
    files: usize,
}

/// `-l` prints one entry name per line; `-l -v` prints a table with sizes,
/// compression ratio and timestamps.
fn list_files(bytes: &[u8], verbose: bool) -> Result<()> {
    let archive = ZipArchive::open(bytes)?;
    let entries = archive.directory().entries();

    if !verbose {
        entries.iter().for_each(|entry| println!("{}", entry.file_name));
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:<10}  {:<5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "=".repeat(RULE_WIDTH));

    let mut totals = Totals::default();
    for entry in entries {
        let (year, month, day) = entry.modified.ymd();
        let (hour, minute, _) = entry.modified.hms();
        println!(
            "{:>10}  {:>10}  {}  {year:04}-{month:02}-{day:02}  {hour:02}:{minute:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            entry.file_name
        );

        if !entry.is_directory {
            totals.uncompressed += entry.uncompressed_size;
            totals.compressed += entry.compressed_size;
            totals.files += 1;
        }
    }

    println!("{}", "=".repeat(RULE_WIDTH));
    println!(
        "{:>10}  {:>10}  {}  {:>17}  {} files",
        totals.uncompressed,
        totals.compressed,
        ratio(totals.compressed, totals.uncompressed),
        "",
        totals.files
    );
    Ok(())
}

/// Space saved by compression as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    let saved = match uncompressed {
        0 => 0,
        total => 100u64.saturating_sub(compressed.saturating_mul(100) / total),
    };
    format!("{saved:>4}%")
}

fn format_size(size: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if size < 1024 {
        return format!("{size} bytes");
    }
    let mut value = size as f64;
    let mut unit = "bytes";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.2} {unit}")
}
