//! `sentinel compare` / `run` / `validate`: fetch both tables, reconcile,
//! report.

use std::io::Write;
use std::path::{Path, PathBuf};

use sentinel_io::{Location, RowSource};
use sentinel_recon::{
    reconcile_with_observer, DuplicatePolicy, JobConfig, ReconEvent, ReconObserver, ReconOptions,
};

use crate::exit_codes::{EXIT_DIFFS, EXIT_INVALID_CONFIG, EXIT_USAGE};
use crate::report::Report;
use crate::CliError;

/// Everything needed to run one comparison.
pub struct Job {
    pub table: String,
    pub where_clause: Option<String>,
    pub source: Location,
    pub target: Location,
    pub options: ReconOptions,
}

/// Where and how results are shown.
pub struct Output {
    pub json: bool,
    pub save_report: Option<PathBuf>,
    pub max_details: usize,
    pub quiet: bool,
}

// ============================================================================
// compare
// ============================================================================

pub struct CompareArgs {
    pub source_db: String,
    pub target_db: String,
    pub table: String,
    pub pk: Option<String>,
    pub composite_keys: Vec<String>,
    pub where_clause: Option<String>,
    pub on_duplicate: DuplicatePolicy,
}

pub fn cmd_compare(args: CompareArgs, output: Output) -> Result<(), CliError> {
    if args.table.trim().is_empty() {
        return Err(CliError::args("--table must not be empty"));
    }

    let composite: Vec<String> = args
        .composite_keys
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let options = ReconOptions {
        pk_column: args.pk.filter(|pk| !pk.trim().is_empty()),
        composite_keys: (!composite.is_empty()).then_some(composite),
        on_duplicate: args.on_duplicate,
    };

    let job = Job {
        table: args.table,
        where_clause: args.where_clause,
        source: parse_location(&args.source_db, EXIT_USAGE)?,
        target: parse_location(&args.target_db, EXIT_USAGE)?,
        options,
    };

    execute(job, output)
}

// ============================================================================
// run / validate
// ============================================================================

fn load_job_config(config_path: &Path) -> Result<JobConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::args(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    JobConfig::from_toml(&config_str).map_err(|e| CliError::recon(&e))
}

pub fn cmd_run(
    config_path: PathBuf,
    json: bool,
    save_report: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let config = load_job_config(&config_path)?;

    // Resolve locations relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let job = Job {
        table: config.table.clone(),
        where_clause: config.where_clause.clone(),
        source: parse_location(&config.source.location, EXIT_INVALID_CONFIG)?.relative_to(base_dir),
        target: parse_location(&config.target.location, EXIT_INVALID_CONFIG)?.relative_to(base_dir),
        options: config.options(),
    };

    let save_report = save_report.or_else(|| config.report.json.as_ref().map(|p| base_dir.join(p)));

    if !quiet {
        eprintln!("job '{}'", config.display_name());
    }

    execute(
        job,
        Output { json, save_report, max_details: config.report.max_details, quiet },
    )
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_job_config(&config_path)?;
    parse_location(&config.source.location, EXIT_INVALID_CONFIG)?;
    parse_location(&config.target.location, EXIT_INVALID_CONFIG)?;

    let keys = if !config.has_keys() {
        "keys auto-detected".to_string()
    } else if let Some(pk) = &config.keys.pk {
        format!("primary key '{pk}'")
    } else {
        format!("composite key [{}]", config.keys.composite.as_deref().unwrap_or_default().join(", "))
    };
    eprintln!(
        "valid: job '{}' on table '{}', {keys}, on_duplicate = {}",
        config.display_name(),
        config.table,
        config.on_duplicate.as_str(),
    );
    Ok(())
}

// ============================================================================
// Shared run path
// ============================================================================

fn parse_location(location: &str, code: u8) -> Result<Location, CliError> {
    Location::parse(location).map_err(|e| CliError {
        code,
        message: e.to_string(),
        hint: Some("use sqlite:///path/to.db, a .db/.sqlite file, or a .csv file".to_string()),
    })
}

pub fn execute(mut job: Job, output: Output) -> Result<(), CliError> {
    // Fail on conflicting keys before touching any source
    job.options.key_spec().map_err(|e| CliError::recon(&e))?;

    let mut progress = Progress::new(output.quiet);

    let source = sentinel_io::open(&job.source, "source").map_err(|e| CliError::source(&e))?;
    let target = sentinel_io::open(&job.target, "target").map_err(|e| CliError::source(&e))?;

    if job.options.pk_column.is_none() && job.options.composite_keys.is_none() {
        job.options = detect_keys(source.as_ref(), &job.table, job.options.on_duplicate)?;
        progress.note(&match (&job.options.pk_column, &job.options.composite_keys) {
            (Some(pk), _) => format!("auto-detected primary key '{pk}'"),
            (None, Some(cols)) => format!("auto-detected composite key [{}]", cols.join(", ")),
            (None, None) => "no primary key detected, falling back to row fingerprints".to_string(),
        });
    }

    let filter = job.where_clause.as_deref();
    progress.note(&format!("fetching {} from source ({})", job.table, job.source.path().display()));
    let source_rows = source.fetch_table(&job.table, filter).map_err(|e| CliError::source(&e))?;
    progress.note(&format!("fetching {} from target ({})", job.table, job.target.path().display()));
    let target_rows = target.fetch_table(&job.table, filter).map_err(|e| CliError::source(&e))?;

    let result = reconcile_with_observer(&source_rows, &target_rows, &job.options, &mut progress)
        .map_err(|e| CliError::recon(&e))?;

    let report = Report::new(&job.table, &result, output.max_details);

    if output.json {
        let json = report
            .to_json_string()
            .map_err(|e| CliError::report(format!("JSON serialization error: {e}")))?;
        println!("{json}");
        if !output.quiet {
            report
                .write_summary(&mut std::io::stderr())
                .map_err(|e| CliError::report(format!("cannot write summary: {e}")))?;
        }
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        report
            .write_summary(&mut handle)
            .and_then(|()| handle.flush())
            .map_err(|e| CliError::report(format!("cannot write summary: {e}")))?;
    }

    if let Some(ref path) = output.save_report {
        report
            .save(path)
            .map_err(|e| CliError::report(format!("cannot write report {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if result.is_identical() {
        Ok(())
    } else {
        // Verdict already printed; exit status carries the rest
        Err(CliError { code: EXIT_DIFFS, message: String::new(), hint: None })
    }
}

/// Pick a key strategy from the source table's declared primary key.
fn detect_keys(
    source: &dyn RowSource,
    table: &str,
    on_duplicate: DuplicatePolicy,
) -> Result<ReconOptions, CliError> {
    let mut pk = source.primary_key(table).map_err(|e| CliError::source(&e))?;
    let options = match pk.len() {
        0 => ReconOptions::fingerprint(),
        1 => ReconOptions::primary_key(pk.remove(0)),
        _ => ReconOptions::composite(pk),
    };
    Ok(options.with_duplicate_policy(on_duplicate))
}

// ============================================================================
// Progress observer
// ============================================================================

/// Prints engine progress to stderr unless quiet.
struct Progress {
    quiet: bool,
    duplicates: usize,
}

impl Progress {
    fn new(quiet: bool) -> Self {
        Self { quiet, duplicates: 0 }
    }

    fn note(&self, line: &str) {
        if !self.quiet {
            eprintln!("{line}");
        }
    }
}

impl ReconObserver for Progress {
    fn on_event(&mut self, event: &ReconEvent) {
        match event {
            ReconEvent::StrategySelected { strategy, key_column } => {
                self.note(&format!("strategy: {strategy} on {key_column}"));
            }
            ReconEvent::RowsReceived { source, target } => {
                self.note(&format!("rows: {source} source, {target} target"));
            }
            ReconEvent::DuplicateKey { .. } | ReconEvent::DuplicateFingerprint { .. } => {
                self.duplicates += 1;
            }
            ReconEvent::Completed { summary } => {
                if self.duplicates > 0 {
                    self.note(&format!("{} duplicate row(s) collapsed", self.duplicates));
                }
                self.note(&format!(
                    "compared: {} missing in target, {} missing in source, {} mismatched",
                    summary.missing_in_target, summary.missing_in_source, summary.mismatched_rows,
                ));
            }
        }
    }
}
