//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.payequity.toml` files.

use crate::analysis::DEFAULT_K_MIN;
use crate::cli::{Args, OutputFormat};
use crate::report::ReportStyle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".payequity.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. Derived from the company name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum distinct workers per sex before an occupation is classified.
    #[serde(default = "default_k_min")]
    pub k_min: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            k_min: default_k_min(),
        }
    }
}

fn default_k_min() -> usize {
    DEFAULT_K_MIN
}

/// Report presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Company name shown in the report and the default file name.
    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// Header and first-series color.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    /// Second-series color.
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            primary_color: default_primary_color(),
            accent_color: default_accent_color(),
        }
    }
}

fn default_company_name() -> String {
    "Empresa Demo".to_string()
}

fn default_primary_color() -> String {
    "#0F6CBD".to_string()
}

fn default_accent_color() -> String {
    "#585858".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if let Some(k_min) = args.k_min {
            self.analysis.k_min = k_min;
        }
        if let Some(ref company) = args.company {
            self.report.company_name = company.clone();
        }
        if let Some(ref color) = args.primary_color {
            self.report.primary_color = color.clone();
        }
        if let Some(ref color) = args.accent_color {
            self.report.accent_color = color.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that may have come from the file without CLI validation.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.k_min == 0 {
            anyhow::bail!("k_min must be at least 1 (found 0 in [analysis])");
        }
        if self.report.company_name.trim().is_empty() {
            anyhow::bail!("company_name cannot be empty");
        }
        Ok(())
    }

    /// Where the report is written: the configured path, or
    /// `relatorio_<Company_Name>.<ext>`.
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        match self.general.output {
            Some(ref output) => PathBuf::from(output),
            None => {
                let company: String = self
                    .report
                    .company_name
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("_");
                PathBuf::from(format!("relatorio_{}.{}", company, format.extension()))
            }
        }
    }

    /// Presentation settings for the renderer.
    pub fn report_style(&self) -> ReportStyle {
        ReportStyle::new(
            &self.report.primary_color,
            &self.report.accent_color,
            &self.report.company_name,
        )
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::HexColor;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.k_min, 3);
        assert_eq!(config.report.company_name, "Empresa Demo");
        assert_eq!(config.report.primary_color, "#0F6CBD");
        assert!(config.general.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r##"
[general]
output = "saida.xlsx"
verbose = true

[analysis]
k_min = 5

[report]
company_name = "ACME Ltda"
primary_color = "#AA0000"
"##;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("saida.xlsx"));
        assert!(config.general.verbose);
        assert_eq!(config.analysis.k_min, 5);
        assert_eq!(config.report.company_name, "ACME Ltda");
        assert_eq!(config.report.accent_color, "#585858");
    }

    #[test]
    fn test_merge_only_explicit_args() {
        let mut config: Config = toml::from_str("[analysis]\nk_min = 7\n").unwrap();
        let mut args = Args {
            input: Some(PathBuf::from("folha.csv")),
            output: None,
            company: Some("ACME".to_string()),
            k_min: None,
            primary_color: None,
            accent_color: Some("#00AA00".to_string()),
            format: OutputFormat::Xlsx,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        };

        config.merge_with_args(&args);
        assert_eq!(config.analysis.k_min, 7);
        assert_eq!(config.report.company_name, "ACME");
        assert_eq!(config.report.accent_color, "#00AA00");

        args.k_min = Some(4);
        config.merge_with_args(&args);
        assert_eq!(config.analysis.k_min, 4);
    }

    #[test]
    fn test_validate_rejects_zero_k_min_from_file() {
        let config: Config = toml::from_str("[analysis]\nk_min = 0\n").unwrap();
        assert_eq!(config.analysis.k_min, 0);
        assert!(config.validate().is_err());

        let mut fixed = config.clone();
        fixed.analysis.k_min = 1;
        assert!(fixed.validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_output_path_from_company() {
        let mut config = Config::default();
        config.report.company_name = "ACME  Ltda".to_string();
        assert_eq!(
            config.output_path(OutputFormat::Xlsx),
            PathBuf::from("relatorio_ACME_Ltda.xlsx")
        );
        assert_eq!(
            config.output_path(OutputFormat::Json),
            PathBuf::from("relatorio_ACME_Ltda.json")
        );

        config.general.output = Some("custom.xlsx".to_string());
        assert_eq!(
            config.output_path(OutputFormat::Xlsx),
            PathBuf::from("custom.xlsx")
        );
    }

    #[test]
    fn test_report_style_falls_back_on_bad_color() {
        let mut config = Config::default();
        config.report.primary_color = "purple".to_string();
        let style = config.report_style();
        assert_eq!(style.primary, HexColor::DEFAULT_PRIMARY);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));
    }
}
