// data-sentinel CLI - reconcile one table between a source and a target store

mod compare;
mod exit_codes;
mod report;
mod seed;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use sentinel_io::SourceError;
use sentinel_recon::config::DEFAULT_MAX_DETAILS;
use sentinel_recon::{DuplicatePolicy, ReconError};

use exit_codes::{recon_exit_code, source_exit_code, EXIT_REPORT_WRITE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Find missing and mismatched rows between a source and a target table")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug logging on stderr (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare one table between two stores
    #[command(after_help = "\
Examples:
  sentinel compare --source-db sqlite:///source.db --target-db sqlite:///target.db --table employees
  sentinel compare --source-db a.db --target-db b.db --table employees --pk id --save-report
  sentinel compare --source-db a.db --target-db b.db --table sales --composite-keys region,month
  sentinel compare --source-db a.db --target-db export.csv --table employees --pk id --json")]
    Compare {
        /// Source location (sqlite:///path, .db/.sqlite file, or .csv file)
        #[arg(long, env = "SENTINEL_SOURCE_DB")]
        source_db: String,

        /// Target location
        #[arg(long, env = "SENTINEL_TARGET_DB")]
        target_db: String,

        /// Table to compare
        #[arg(long)]
        table: String,

        /// Primary-key column (auto-detected from the source when no keys are given)
        #[arg(long)]
        pk: Option<String>,

        /// Comma-separated composite key columns
        #[arg(long, value_delimiter = ',', value_name = "COLS")]
        composite_keys: Vec<String>,

        /// SQL filter applied to both sides (SQLite only)
        #[arg(long, value_name = "EXPR")]
        r#where: Option<String>,

        /// What to do when a key occurs more than once on one side
        #[arg(long, value_enum, default_value_t = OnDuplicate::KeepLast)]
        on_duplicate: OnDuplicate,

        /// Save the JSON report (default path: report.json)
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "report.json")]
        save_report: Option<PathBuf>,

        /// Print the JSON report to stdout instead of the summary
        #[arg(long)]
        json: bool,

        /// Detail rows shown per section
        #[arg(long, default_value_t = DEFAULT_MAX_DETAILS)]
        max_details: usize,

        /// Suppress progress lines on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Run a comparison job from a TOML file
    #[command(after_help = "\
Examples:
  sentinel run employees.toml
  sentinel run employees.toml --json
  sentinel run employees.toml --save-report out/report.json")]
    Run {
        /// Path to the job file
        config: PathBuf,

        /// Print the JSON report to stdout instead of the summary
        #[arg(long)]
        json: bool,

        /// Save the JSON report (overrides report.json in the job file)
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "report.json")]
        save_report: Option<PathBuf>,

        /// Suppress progress lines on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a job file without running it
    Validate {
        /// Path to the job file
        config: PathBuf,
    },

    /// Write demo source.db / target.db with known differences
    Seed {
        /// Output directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OnDuplicate {
    KeepLast,
    KeepFirst,
    Reject,
}

impl From<OnDuplicate> for DuplicatePolicy {
    fn from(value: OnDuplicate) -> Self {
        match value {
            OnDuplicate::KeepLast => DuplicatePolicy::KeepLast,
            OnDuplicate::KeepFirst => DuplicatePolicy::KeepFirst,
            OnDuplicate::Reject => DuplicatePolicy::Reject,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  sentinel-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  sentinel-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Install the stderr subscriber; `log` records from the library crates are
/// bridged into it.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Fails only if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare {
            source_db,
            target_db,
            table,
            pk,
            composite_keys,
            r#where: where_clause,
            on_duplicate,
            save_report,
            json,
            max_details,
            quiet,
        } => {
            if max_details == 0 {
                Err(CliError::args("--max-details must be at least 1"))
            } else {
                compare::cmd_compare(
                    compare::CompareArgs {
                        source_db,
                        target_db,
                        table,
                        pk,
                        composite_keys,
                        where_clause,
                        on_duplicate: on_duplicate.into(),
                    },
                    compare::Output { json, save_report, max_details, quiet },
                )
            }
        }
        Commands::Run { config, json, save_report, quiet } => {
            compare::cmd_run(config, json, save_report, quiet)
        }
        Commands::Validate { config } => compare::cmd_validate(config),
        Commands::Seed { dir } => cmd_seed(dir),
    };

    match result {
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

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn report(msg: impl Into<String>) -> Self {
        Self { code: EXIT_REPORT_WRITE, message: msg.into(), hint: None }
    }

    pub fn recon(err: &ReconError) -> Self {
        let hint = match err {
            ReconError::ConflictingKeySpec { .. } => {
                Some("pass either --pk or --composite-keys, not both".to_string())
            }
            ReconError::DuplicateKey { .. } => {
                Some("use --on-duplicate keep-last or keep-first to collapse duplicates".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(err), message: err.to_string(), hint }
    }

    pub fn source(err: &SourceError) -> Self {
        Self { code: source_exit_code(err), message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// seed
// ============================================================================

fn cmd_seed(dir: PathBuf) -> Result<(), CliError> {
    seed::write_demo(&dir).map_err(|e| {
        CliError::args(e).with_hint("check that the directory is writable")
    })?;

    eprintln!("wrote {}", dir.join("source.db").display());
    eprintln!("wrote {}", dir.join("target.db").display());
    eprintln!("differences in table '{}':", seed::TABLE);
    eprintln!("  id=1 Alice: salary 50000 -> 55000");
    eprintln!("  id=3 Charlie: department HR -> Marketing");
    eprintln!("  id=4 Diana: missing in target");
    eprintln!("  id=6 Frank: missing in source");
    Ok(())
}
