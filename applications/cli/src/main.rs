/// Tabvault - tab file scanner and importer
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabvault_cli::{AppConfig, JsonCatalog};
use tabvault_core::{FingerprintCatalog, TabMetadata, TabMetadataReader};
use tabvault_importer::{CancelToken, ScanEvent, ScanSummary, Scanner, TabImporter};
use tabvault_metadata::TabMetadataParser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tabvault")]
#[command(about = "Find, deduplicate and catalog guitar tab files", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TABVAULT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan directories and report duplicates and defects
    Scan {
        /// Directories to scan (defaults to scan.roots)
        roots: Vec<PathBuf>,
        /// File name glob, may be repeated (defaults to scan.filters)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the metadata of tab files
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Scan directories and store new tabs in the catalog
    Import {
        /// Directories to scan (defaults to scan.roots)
        roots: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct Inspection<'a> {
    path: &'a Path,
    #[serde(flatten)]
    metadata: TabMetadata,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tabvault=info,tabvault_importer=info,tabvault_metadata=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Scan {
            roots,
            filters,
            json,
        } => {
            scan(&config, roots, filters, json).await?;
        }
        Commands::Inspect { files } => {
            inspect(&files)?;
        }
        Commands::Import { roots } => {
            import(&config, roots).await?;
        }
    }

    Ok(())
}

async fn scan(
    config: &AppConfig,
    roots: Vec<PathBuf>,
    filters: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let filters = if filters.is_empty() {
        config.scan.filters.clone()
    } else {
        tabvault_importer::scanner::validate_filters(&filters).map_err(anyhow::Error::msg)?;
        filters
    };

    let scanner = Scanner::with_config(resolve_roots(config, roots)?, config.scan_config())
        .with_filters(&filters);
    let summary = run_scanner(scanner).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", summary.summary_text());
    for group in &summary.groups {
        println!(
            "\nGroup {} ({} bytes each, {} copies):",
            group.group_id,
            group.file_size,
            group.len()
        );
        for path in &group.paths {
            println!("  {}", path.display());
        }
    }
    if summary.reclaimable_bytes() > 0 {
        println!("\n{} bytes reclaimable", summary.reclaimable_bytes());
    }

    Ok(())
}

fn inspect(files: &[PathBuf]) -> anyhow::Result<()> {
    let parser = TabMetadataParser::new();
    let inspections: Vec<Inspection<'_>> = files
        .iter()
        .map(|path| Inspection {
            path,
            metadata: parser.parse_metadata(path),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&inspections)?);
    Ok(())
}

async fn import(config: &AppConfig, roots: Vec<PathBuf>) -> anyhow::Result<()> {
    let catalog = Arc::new(JsonCatalog::open(&config.catalog.path).await?);
    tracing::info!("Using catalog at {}", catalog.path().display());

    let known = catalog.known_fingerprints().await?;
    let scanner = Scanner::with_config(resolve_roots(config, roots)?, config.scan_config())
        .with_filters(&config.scan.filters)
        .with_known_fingerprints(known);
    let summary = run_scanner(scanner).await?;

    if summary.is_aborted() {
        println!("{}", summary.summary_text());
        println!("Scan was cancelled; nothing imported");
        return Ok(());
    }

    let report = TabImporter::new(catalog).import(&summary).await?;

    println!("{}", report.summary_text());
    for path in &report.rejected {
        println!("  rejected: {}", path.display());
    }
    for (path, error) in &report.errors {
        println!("  failed: {} ({})", path.display(), error);
    }

    Ok(())
}

fn resolve_roots(config: &AppConfig, roots: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    let roots = if roots.is_empty() {
        config.scan.roots.clone()
    } else {
        roots
    };

    if roots.is_empty() {
        anyhow::bail!("No directories to scan (pass ROOTS or set scan.roots)");
    }
    Ok(roots)
}

/// Run a scan on the worker, logging batches until it finishes
async fn run_scanner(scanner: Scanner) -> anyhow::Result<ScanSummary> {
    cancel_on_ctrl_c(scanner.cancel_token());

    let (mut events, handle) = scanner.spawn();
    let mut seen = 0;
    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::Batch(records) => {
                seen += records.len();
                tracing::info!("Scanned {} files", seen);
            }
            ScanEvent::Finished { stats, outcome } => {
                tracing::debug!("Scan {:?}: {:?}", outcome, stats);
            }
        }
    }

    Ok(handle.join().await?)
}

fn cancel_on_ctrl_c(token: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping scan");
            token.cancel();
        }
    });
}
