//! contacts-export: dump a CardDAV address book into one .vcf file
//!
//! Usage:
//!   contacts-export                    - Export using contacts-export.toml / environment
//!   contacts-export --config <path>    - Export using an explicit config file
//!   contacts-export --output <path>    - Override the combined output file
//!   contacts-export --help             - Show help
//!
//! Exit status is 0 when the run completes (skipped contacts included) and
//! non-zero when configuration, the listing request or the output file fails.

use anyhow::Context;
use ce_contacts::{ContactsClient, ContactsConfig, ExportSummary, export_contacts};
use ce_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Options for an export run
#[derive(Debug, Default, PartialEq)]
struct ExportOptions {
    config_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Export the address book
    Export(ExportOptions),
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = match parse_args(std::env::args().skip(1))? {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("contacts-export {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Export(options) => options,
    };

    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = load_config(&options)?;

    tracing::info!("Starting contacts export...");
    let summary = run(&config).await?;

    tracing::info!(
        "Export complete: {} listed, {} saved, {} skipped -> {}",
        summary.listed,
        summary.saved,
        summary.skipped,
        summary.path.display()
    );
    Ok(())
}

/// Parse command line arguments (program name already stripped)
fn parse_args<I>(args: I) -> anyhow::Result<RunMode>
where
    I: IntoIterator<Item = String>,
{
    let mut options = ExportOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-V" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args.next().context("--config requires a path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--output" | "-o" => {
                let path = args.next().context("--output requires a path")?;
                options.output_path = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Export(options))
}

/// Print help message
fn print_help() {
    println!("contacts-export - export a CardDAV address book to a single .vcf file");
    println!();
    println!("Usage:");
    println!("  contacts-export                  Export using contacts-export.toml or environment");
    println!("  contacts-export -c, --config F   Read settings from TOML file F");
    println!("  contacts-export -o, --output F   Write the combined vCards to F");
    println!("  contacts-export -h, --help       Show this help message");
    println!("  contacts-export -V, --version    Show version");
    println!();
    println!("Environment Variables:");
    println!("  CARDDAV_URL          Address book collection URL (required)");
    println!("  CARDDAV_USERNAME     Username (required)");
    println!("  CARDDAV_PASSWORD     Password or app password (required)");
    println!("  CARDDAV_HOST         Prefix for contact hrefs (default: origin of CARDDAV_URL)");
    println!("  OUTPUT_DIR           Output directory (default: .)");
    println!("  OUTPUT_FILE          Output file name (default: contacts_combined.vcf)");
    println!("  HTTP_TIMEOUT_SECS    Per-request timeout (default: 30)");
    println!("  RUST_LOG             Log filter, e.g. ce_contacts=debug");
}

fn load_config(options: &ExportOptions) -> anyhow::Result<Config> {
    let config = match &options.config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            Config::from_toml_file(path)
        }
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    Ok(match &options.output_path {
        Some(path) => config.with_output_path(path),
        None => config,
    })
}

/// List the address book and write the combined file
async fn run(config: &Config) -> anyhow::Result<ExportSummary> {
    let contacts_config = ContactsConfig::from_config(config)?;
    let client = ContactsClient::new(contacts_config)
        .map_err(|e| anyhow::anyhow!("Failed to create CardDAV client: {}", e))?;

    let path = config.combined_path();
    export_contacts(&client, &path)
        .await
        .with_context(|| format!("Failed to export contacts to {}", path.display()))
}
