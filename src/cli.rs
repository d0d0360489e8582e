//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Options that can also come from the config file
//! are optional here so that only explicit flags override it.

use clap::Parser;
use std::path::PathBuf;

/// payequity - pay-equity report generator
///
/// Reads a payroll export (CSV or Excel), compares female and male pay per
/// occupation (CBO) and writes a multi-sheet Excel report with charts.
///
/// Examples:
///   payequity --input folha.csv
///   payequity --input folha.xlsx --company "ACME Ltda" --k-min 5
///   payequity --input folha.csv --format json --output indicadores.json
///   payequity --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Payroll file to analyze (.csv, .xlsx or .xlsm)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to relatorio_<Company_Name>.xlsx (or .json)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Company name shown in the report
    #[arg(long, value_name = "NAME", env = "PAYEQUITY_COMPANY")]
    pub company: Option<String>,

    /// Minimum distinct workers per sex for a sufficient classification
    #[arg(short, long, value_name = "N")]
    pub k_min: Option<usize>,

    /// Primary report color (#RRGGBB)
    #[arg(long, value_name = "HEX")]
    pub primary_color: Option<String>,

    /// Accent report color (#RRGGBB)
    #[arg(long, value_name = "HEX")]
    pub accent_color: Option<String>,

    /// Output format (xlsx, json)
    #[arg(long, default_value = "xlsx", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .payequity.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .payequity.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook with charts (default)
    #[default]
    Xlsx,
    /// Aggregated tables as JSON
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            None => return Err("An input file is required (--input)".to_string()),
            _ => {}
        }

        if self.k_min == Some(0) {
            return Err("k-min must be at least 1".to_string());
        }

        if let Some(ref company) = self.company {
            if company.trim().is_empty() {
                return Err("Company name cannot be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        self.effective_log_level(false)
    }

    /// Log level once the config file's `verbose` setting is known.
    /// `--quiet` still wins.
    pub fn effective_log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(input: PathBuf) -> Args {
        Args {
            input: Some(input),
            output: None,
            company: None,
            k_min: None,
            primary_color: None,
            accent_color: None,
            format: OutputFormat::Xlsx,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_accepts_existing_input() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(PathBuf::from("/nonexistent/folha.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_k_min() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.k_min = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args(PathBuf::from("/nonexistent/folha.csv"));
        args.input = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "payequity",
            "--input",
            "folha.csv",
            "--k-min",
            "5",
            "--format",
            "json",
            "--primary-color",
            "#112233",
        ])
        .unwrap();

        assert_eq!(args.k_min, Some(5));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.primary_color.as_deref(), Some("#112233"));
        assert_eq!(args.format.extension(), "json");
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(PathBuf::from("folha.csv"));
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let mut args = make_args(PathBuf::from("folha.csv"));
        assert_eq!(args.effective_log_level(true), tracing::Level::DEBUG);
        assert_eq!(args.effective_log_level(false), tracing::Level::INFO);

        args.quiet = true;
        assert_eq!(args.effective_log_level(true), tracing::Level::ERROR);
    }
}
