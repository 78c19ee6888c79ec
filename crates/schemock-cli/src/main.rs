mod config;
mod logging;
mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use schemock_ingest::detect::scan_signatures;
use schemock_ingest::{FormatId, IngestError, ParserRegistry, detect_format};
use schemock_resolve::{DependencyResolver, ResolveError};
use thiserror::Error;
use tracing::{info, warn};

use config::{Settings, load_settings};
use logging::init_logging;
use report::{ResolveReport, write_json};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("schema is invalid: {}", path.display())]
    InvalidSchema { path: PathBuf },
    #[error("no schema could be resolved")]
    NothingResolved,
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "schemock", version, about = "Schema ingestion and dependency ordering")]
struct Cli {
    /// Config file; defaults to ./schemock.toml when present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Emit JSON log lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List formats with a registered parser.
    Formats,
    /// Print the detected format of a schema source.
    Detect(DetectArgs),
    /// List schema sources under a directory.
    Scan(ScanArgs),
    /// Parse a schema source and report structural problems.
    Validate(ValidateArgs),
    /// Infer relations, resolve cycles and print a generation order.
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
struct DetectArgs {
    path: PathBuf,
    /// Ignore the extension and match content signatures only.
    #[arg(long, default_value_t = false)]
    content_only: bool,
}

#[derive(Args, Debug)]
struct ScanArgs {
    dir: PathBuf,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    path: PathBuf,
    /// Skip detection and parse as this format.
    #[arg(long, value_name = "FORMAT")]
    format: Option<FormatId>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Skip detection and parse every path as this format.
    #[arg(long, value_name = "FORMAT")]
    format: Option<FormatId>,
    /// Resolution strategy (smart-break, lazy-loading, partial-references).
    #[arg(long)]
    strategy: Option<String>,
    /// Minimum confidence for an inferred relation to enter the graph.
    #[arg(long)]
    threshold: Option<f64>,
    /// Write the reports here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    let cwd = std::env::current_dir()?;
    let (settings, source) = load_settings(cli.config.as_deref(), &cwd)?;
    if let Some(source) = &source {
        info!(event = "config_loaded", path = %source.display());
    }

    match cli.command {
        Command::Formats => run_formats(&settings),
        Command::Detect(args) => run_detect(args),
        Command::Scan(args) => run_scan(args, &settings),
        Command::Validate(args) => run_validate(args, &settings),
        Command::Resolve(args) => run_resolve(args, settings),
    }
}

fn run_formats(settings: &Settings) -> CliResult<()> {
    let registry = ParserRegistry::with_options(settings.ingest_options());
    for format in registry.supported_formats() {
        println!("{format}");
    }
    Ok(())
}

fn run_detect(args: DetectArgs) -> CliResult<()> {
    let detected = if args.content_only {
        scan_signatures(&std::fs::read_to_string(&args.path)?)
    } else {
        if !args.path.exists() {
            return Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", args.path.display()),
            ))
            .into());
        }
        detect_format(&args.path, None)
    };

    let format = detected.ok_or_else(|| IngestError::FormatDetectionFailed {
        path: args.path.clone(),
    })?;
    println!("{format}");
    Ok(())
}

fn run_scan(args: ScanArgs, settings: &Settings) -> CliResult<()> {
    let registry = ParserRegistry::with_options(settings.ingest_options());
    for path in registry.find_schema_files(&args.dir)? {
        match registry.detect_schema_type(&path, None) {
            Some(format) => println!("{}\t{format}", path.display()),
            None => println!("{}", path.display()),
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs, settings: &Settings) -> CliResult<()> {
    let registry = ParserRegistry::with_options(settings.ingest_options());
    let validation = registry.validate(&args.path, args.format)?;
    println!("{}", serde_json::to_string_pretty(&validation)?);

    if validation.valid {
        Ok(())
    } else {
        Err(CliError::InvalidSchema { path: args.path })
    }
}

fn run_resolve(args: ResolveArgs, mut settings: Settings) -> CliResult<()> {
    if let Some(strategy) = args.strategy {
        settings.resolve.strategy = strategy;
    }
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CliError::InvalidConfig(format!(
                "--threshold must be within [0, 1], got {threshold}"
            )));
        }
        settings.resolve.confidence_threshold = threshold;
    }

    let registry = ParserRegistry::with_options(settings.ingest_options());
    let resolver = DependencyResolver::with_options(settings.resolve_options())?;

    let timer = Instant::now();
    let mut reports = Vec::with_capacity(args.paths.len());
    let mut failed = 0usize;
    for path in &args.paths {
        match resolve_one(&registry, &resolver, path, args.format) {
            Ok(report) => reports.push(report),
            Err(CliError::Ingest(err @ IngestError::SchemaParse { .. })) => {
                warn!(event = "schema_skipped", path = %path.display(), error = %err);
                failed += 1;
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        event = "resolve_finished",
        resolved = reports.len(),
        failed,
        duration_ms = timer.elapsed().as_millis()
    );

    if reports.is_empty() {
        return Err(CliError::NothingResolved);
    }

    match &args.out {
        Some(out) => {
            write_json(out, &reports)?;
            info!(event = "report_written", path = %out.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&reports)?),
    }
    Ok(())
}

fn resolve_one(
    registry: &ParserRegistry,
    resolver: &DependencyResolver,
    path: &Path,
    format: Option<FormatId>,
) -> CliResult<ResolveReport> {
    let format = match format {
        Some(format) => format,
        None => registry
            .detect_schema_type(path, None)
            .ok_or_else(|| IngestError::FormatDetectionFailed {
                path: path.to_path_buf(),
            })?,
    };
    let entities = registry.parse(path, Some(format))?;
    let output = resolver.resolve_dependencies(&entities);

    for warning in &output.warnings {
        warn!(event = "resolution_warning", path = %path.display(), %warning);
    }
    info!(
        event = "schema_resolved",
        path = %path.display(),
        format = %format,
        entities = output.summary.nodes,
        cycles = output.cycles.len()
    );

    Ok(ResolveReport::new(path, format, output))
}
