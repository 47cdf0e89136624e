// bbb-rebuild - rebuild the Bookbinders account table and verify it

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bbb_rebuild::{RebuildConfig, RebuildError};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use exit_codes::{rebuild_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "bbb-rebuild")]
#[command(about = "Rebuild the BBB account table from raw sources and verify it against a reference")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  bbb-rebuild
  bbb-rebuild --config bbb.toml
  bbb-rebuild --reference data/bbb.bbt --describe
  RUST_LOG=debug bbb-rebuild")]
struct Cli {
    /// TOML config; relative paths in it resolve against its directory
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reference table location (URL or path), overriding the config
    #[arg(long, value_name = "URL|PATH")]
    reference: Option<String>,

    /// Print a summary of the rebuilt table before verifying it
    #[arg(long)]
    describe: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn long_version() -> &'static str {
    concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--quiet`.
fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (mut config, base) = match &cli.config {
        Some(path) => {
            let config = RebuildConfig::from_file(path)
                .map_err(|e| CliError::rebuild(e, &RebuildConfig::default()))?;
            (config, config_dir(path))
        }
        None => (RebuildConfig::default(), PathBuf::from(".")),
    };

    if let Some(location) = &cli.reference {
        config.reference.set_location(&from_cwd(location));
    }
    tracing::debug!(base = %base.display(), reference = %config.reference.source(), "resolved configuration");

    let table = bbb_rebuild::build(&config, &base).map_err(|e| CliError::rebuild(e, &config))?;
    if cli.describe {
        println!("{}", bbb_frame::describe(&table));
    }

    let outcome =
        bbb_rebuild::publish(&config, &base, table).map_err(|e| CliError::rebuild(e, &config))?;

    println!("Well done! Both tests passed!");
    println!("output:  {}", outcome.output.display());
    println!("blake3:  {}", outcome.fingerprint);
    Ok(())
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A relative `--reference` path is relative to the working directory, not
/// to the config file.
fn from_cwd(location: &str) -> String {
    let source = bbb_io::ReferenceSource::parse(location);
    match source {
        bbb_io::ReferenceSource::Path(p) if p.is_relative() => std::env::current_dir()
            .map(|cwd| cwd.join(&p).display().to_string())
            .unwrap_or_else(|_| location.to_string()),
        _ => location.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Create error from a pipeline error with the proper exit code.
    pub fn rebuild(err: RebuildError, config: &RebuildConfig) -> Self {
        let code = rebuild_exit_code(&err);
        let hint = match &err {
            RebuildError::FrameMismatch(_) => Some(
                "compare the rebuilt and reference dtypes above, then fix columns with value mismatches"
                    .to_string(),
            ),
            RebuildError::DescriptionMismatch(_) => Some(format!(
                "read {} and attach its text to the rebuilt table",
                config.sources.description
            )),
            RebuildError::Load { .. } => {
                Some("check the [sources] paths (defaults live under data/)".to_string())
            }
            RebuildError::NonNumericColumn { .. } => {
                Some("replace text cells with numbers; leave a cell empty for no value".to_string())
            }
            RebuildError::Reference(_) => {
                Some("pin a local copy with --reference <PATH> or [reference] path".to_string())
            }
            RebuildError::ConfigParse(_) | RebuildError::ConfigValidation(_) => {
                Some("see the [sources], [reference], [dates] and [output] tables".to_string())
            }
            _ => None,
        };
        let message = match err.mismatch_report() {
            Some(report) => format!("{err}\n{report}"),
            None => err.to_string(),
        };
        Self { code, message, hint }
    }
}
