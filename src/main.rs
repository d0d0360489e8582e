//! payequity - pay-equity report generator
//!
//! A CLI tool that reads a payroll export, aggregates female/male pay
//! statistics per occupation and writes an Excel (or JSON) report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (invalid arguments, unreadable input, missing columns, write failure)

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use payequity::cli::{Args, OutputFormat};
use payequity::config::{Config, CONFIG_FILE};
use payequity::models::Classification;
use payequity::{aggregate, generate_json_report, load_input, render};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so its `verbose` setting applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(args.effective_log_level(config.general.verbose));

    info!("payequity v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run_report(&args, &config) {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .payequity.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize company name, k_min and colors.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn spinner(args: &Args, message: &str) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Load, aggregate and write the report.
fn run_report(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let input = args
        .input
        .as_deref()
        .context("An input file is required (--input)")?;
    let output = config.output_path(args.format);

    // Step 1: Load the payroll table
    println!("📥 Loading payroll data: {}", input.display());
    let dataset = load_input(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    println!(
        "   {} rows, {} columns",
        dataset.len(),
        dataset.columns().len()
    );

    // Step 2: Aggregate
    println!("\n🔬 Aggregating by occupation (k_min = {})...", config.analysis.k_min);
    let bundle = aggregate(&dataset, config.analysis.k_min)?;

    // Step 3: Write the report
    println!("\n📝 Generating report...");
    let progress = spinner(args, "Writing report");

    let written = match args.format {
        OutputFormat::Xlsx => render(&dataset, &bundle, &output, &config.report_style())
            .with_context(|| format!("Failed to write report to {}", output.display())),
        OutputFormat::Json => generate_json_report(&bundle)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                std::fs::write(&output, json)
                    .with_context(|| format!("Failed to write report to {}", output.display()))
            }),
    };

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    written?;

    // Print summary
    let counts = &bundle.classification_counts;
    println!("\n📊 Pay Equity Summary ({}):", config.report.company_name);
    println!("   Occupations: {}", bundle.occupations.len());
    println!(
        "   - {} {}: {} | {} {}: {} | {} {}: {} | {} {}: {}",
        Classification::Green.emoji(),
        Classification::Green,
        counts.green,
        Classification::Amber.emoji(),
        Classification::Amber,
        counts.amber,
        Classification::Red.emoji(),
        Classification::Red,
        counts.red,
        Classification::Insufficient.emoji(),
        Classification::Insufficient,
        counts.insufficient
    );
    if let Some(ratio) = bundle.mean_ratio_median {
        println!("   Mean F/M median ratio: {:.4}", ratio);
    }
    if !bundle.remediation_plan.is_empty() {
        println!(
            "   Occupations needing action: {}",
            bundle.remediation_plan.len()
        );
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Report saved to: {}", output.display());

    Ok(())
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Unreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(e))),
    }
}
