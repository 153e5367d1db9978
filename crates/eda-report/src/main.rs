//! CLI entry point for the cleaning and report pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use eda_report::{
    Pipeline, PipelineConfig, PipelineResult, ReportEngineKind, Upload, stage_upload,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// CLI-compatible report engine enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEngine {
    /// Single-table profile with per-variable sections
    Profiling,
    /// Side-by-side comparison of the raw and cleaned tables
    Comparison,
    /// Skip the HTML report
    None,
}

impl From<CliEngine> for ReportEngineKind {
    fn from(cli: CliEngine) -> Self {
        match cli {
            CliEngine::Profiling => ReportEngineKind::Profiling,
            CliEngine::Comparison => ReportEngineKind::Comparison,
            CliEngine::None => ReportEngineKind::None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean an uploaded table and generate an exploratory report",
    long_about = "Loads a .csv or .xlsx file, imputes missing values, removes duplicate rows,\n\
                  clips outliers and writes summary statistics, plots and an HTML report\n\
                  into a fresh run directory.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  EDA_OUTPUT_DIR    Default output root (overridden by --output)\n  \
                  EDA_UPLOAD_DIR    Default upload staging folder (overridden by --upload-dir)\n\n\
                  EXAMPLES:\n  \
                  eda-report -i people.csv\n  \
                  eda-report -i sales.xlsx -o reports/ --engine comparison\n  \
                  eda-report -i people.csv --keep-going --emit-manifest --json"
)]
struct Args {
    /// Path to the .csv or .xlsx file to process
    #[arg(short, long)]
    input: PathBuf,

    /// Output root; each run gets its own subdirectory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Folder the upload is staged in before processing
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Automated report engine
    #[arg(long, value_enum, default_value = "profiling")]
    engine: CliEngine,

    /// IQR multiplier for outlier clipping fences
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Significance level for the normality tests
    #[arg(long, default_value = "0.05")]
    alpha: f64,

    /// Do not write the before/after clipping boxplots
    #[arg(long)]
    no_diagnostics: bool,

    /// Record failed report steps and continue instead of aborting the run
    #[arg(long)]
    keep_going: bool,

    /// Also write manifest.json into the run directory
    #[arg(long)]
    emit_manifest: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final result is printed.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file
    dotenv().ok();

    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = build_config(&args)?;
    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(|update| {
            info!(
                "[{:>3.0}%] {}",
                update.progress * 100.0,
                update.message
            );
        })
        .build()?;

    let upload = Upload::from_path(&args.input)?;
    let staged = stage_upload(&pipeline.config().upload_dir, &upload)?;
    info!("Staged upload at {}", staged.display());

    match pipeline.process_path(&staged) {
        Ok(result) => handle_pipeline_output(&result, &args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::from_env()
        .report_engine(args.engine.into())
        .iqr_multiplier(args.iqr_multiplier)
        .normality_alpha(args.alpha)
        .emit_diagnostics(!args.no_diagnostics)
        .fail_fast(!args.keep_going)
        .emit_manifest(args.emit_manifest);

    if let Some(ref output) = args.output {
        builder = builder.output_root(output);
    }
    if let Some(ref upload_dir) = args.upload_dir {
        builder = builder.upload_dir(upload_dir);
    }

    Ok(builder.build()?)
}

/// Print the result as JSON or as a human-readable listing.
fn handle_pipeline_output(result: &PipelineResult, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for failure in &result.failures {
        warn!("Step '{}' failed: {}", failure.step, failure.message);
    }

    print_human_readable_summary(result);
    Ok(())
}

/// Note: uses `println!` on purpose; this is the primary output of the CLI
/// and must be visible regardless of log level.
fn print_human_readable_summary(result: &PipelineResult) {
    println!();
    println!("{}", "=".repeat(80));
    println!("REPORT COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input:   {}", result.source);
    println!("Run:     {}", result.run_id);
    println!("Output:  {}", result.run_dir.display());
    println!(
        "Rows:    {} -> {} ({} columns)",
        result.rows_before, result.rows_after, result.columns
    );
    println!("Duration: {}ms", result.duration_ms);
    println!();

    if !result.cleaning_actions.is_empty() {
        println!("Cleaning:");
        for action in &result.cleaning_actions {
            println!("  - {}", action);
        }
        println!();
    }

    println!("Artifacts:");
    for artifact in &result.artifacts {
        println!(
            "  {:<28} {}",
            artifact.kind.display_name(),
            artifact.relative_to(&result.run_dir).display()
        );
    }
    println!();

    if !result.failures.is_empty() {
        println!("Failed steps:");
        for failure in &result.failures {
            println!("  ! {}: {}", failure.step, failure.message);
        }
        println!();
    }

    if let Some(index) = result.index() {
        println!("Open {} to browse the results", index.path.display());
    }
    println!("{}", "=".repeat(80));
}
