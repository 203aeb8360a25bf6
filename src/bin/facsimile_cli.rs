//! Facsimile CLI - Batch Download-Eligibility Report
//!
//! Reads archives.xml and document_metadata.js[on], resolves every page
//! image against its archive's policy, writes one CSV row per image.
//! Returns non-zero only when the shared configuration cannot be loaded.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use facsimile_core::{find_allowed_facsimile, write_report, AllowanceRow, RuleStore};

#[derive(Parser)]
#[command(name = "facsimile-cli")]
#[command(about = "Resolve which facsimile variant each archive allows for download")]
struct Cli {
    /// Path to archives.xml with per-repository download rules
    #[arg(short, long, value_name = "XML")]
    archives: PathBuf,

    /// Path to document_metadata.js[on]
    #[arg(short = 'd', long, value_name = "JSON")]
    document_metadata: PathBuf,

    /// Root folder for the scaled (jpg) facsimiles
    #[arg(short = 'i', long, value_name = "PATH")]
    image_root: PathBuf,

    /// Output CSV file (stdout if omitted)
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let rules = match RuleStore::from_archives_file(&cli.archives) {
        Ok(rules) => rules,
        Err(e) => {
            error!("Failed to load archive rules: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(archives = rules.len(), "Loaded download rules");

    let pages = match facsimile_core::metadata::load_pages(&cli.document_metadata) {
        Ok(pages) => pages,
        Err(e) => {
            error!("Failed to load document metadata: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(pages = pages.len(), "Analyzing images");

    // Per-page failures land in the row's reason column, never abort the run.
    let rows: Vec<AllowanceRow> = pages
        .iter()
        .map(|page| {
            let rule = rules.get(&page.repo);
            let allowance = find_allowed_facsimile(&cli.image_root, &page.img, &rule);
            AllowanceRow::new(page, allowance)
        })
        .collect();

    let allowed = rows.iter().filter(|r| r.download.is_some()).count();
    info!(allowed, denied = rows.len() - allowed, "Resolution finished");

    let result = match &cli.output {
        Some(path) => match File::create(path) {
            Ok(file) => write_report(file, &rows),
            Err(e) => {
                error!("Failed to create {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => write_report(io::stdout().lock(), &rows),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to write report: {e}");
            ExitCode::FAILURE
        }
    }
}
