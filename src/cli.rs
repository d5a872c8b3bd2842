//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::{Path, PathBuf};

/// vendorscope - filing agent dependency and opportunity report
///
/// Measures how dependent each filer (or fund family) is on one filing
/// agent vendor and ranks them by revenue potential and switch risk.
///
/// Examples:
///   vendorscope --input filings.csv
///   vendorscope --input exports/ --vendor "Quality Edgar Solutions" --format json
///   vendorscope --input ncen.json --variant family --output families.md
///   vendorscope --input filings.csv --dry-run
///   vendorscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Filing records to analyze
    ///
    /// A .json or .csv file, or a directory searched recursively for them.
    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present = "init_config"
    )]
    pub input: Option<PathBuf>,

    /// Filing agent vendor to measure dependency on
    ///
    /// Matched case-insensitively after trimming. Defaults to the config
    /// file value.
    #[arg(long, value_name = "NAME", env = "VENDORSCOPE_VENDOR")]
    pub vendor: Option<String>,

    /// Report variant
    #[arg(long, default_value = "company", value_name = "VARIANT")]
    pub variant: Variant,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path for the flat CSV export
    ///
    /// Defaults to the report path with a .csv extension.
    #[arg(long, value_name = "FILE", conflicts_with = "no_csv")]
    pub csv: Option<PathBuf>,

    /// Skip the flat CSV export
    #[arg(long)]
    pub no_csv: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vendorscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of most frequent vendor form types to list per entity
    #[arg(long, value_name = "K")]
    pub top_forms: Option<usize>,

    /// Profile entities on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load and validate records without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .vendorscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Which report to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// One row per filer (default)
    #[default]
    Company,
    /// Funds grouped by fund family
    Family,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the input path, empty if not set (should be validated first).
    pub fn input_path(&self) -> &Path {
        self.input.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            None => return Err("An --input path is required".to_string()),
            Some(ref input) if !input.exists() => {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
            Some(_) => {}
        }

        if let Some(ref vendor) = self.vendor {
            if vendor.trim().is_empty() {
                return Err("Vendor name must not be blank".to_string());
            }
        }

        if self.top_forms == Some(0) {
            return Err("--top-forms must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Where the flat CSV export goes, given the final report path.
    pub fn csv_path(&self, report_path: &Path) -> PathBuf {
        self.csv
            .clone()
            .unwrap_or_else(|| report_path.with_extension("csv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(std::env::temp_dir()),
            vendor: None,
            variant: Variant::Company,
            output: None,
            format: OutputFormat::Markdown,
            csv: None,
            no_csv: false,
            config: None,
            top_forms: None,
            sequential: false,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.csv"));
        assert!(args.validate().is_err());

        args.input = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_blank_vendor() {
        let mut args = make_args();
        args.vendor = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_top_forms() {
        let mut args = make_args();
        args.top_forms = Some(0);
        assert!(args.validate().is_err());

        args.top_forms = Some(5);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_csv_path_defaults_next_to_report() {
        let mut args = make_args();
        assert_eq!(
            args.csv_path(Path::new("out/report.md")),
            PathBuf::from("out/report.csv")
        );

        args.csv = Some(PathBuf::from("flat.csv"));
        assert_eq!(args.csv_path(Path::new("out/report.md")), PathBuf::from("flat.csv"));
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "vendorscope",
            "--input",
            "filings.csv",
            "--variant",
            "family",
            "--format",
            "json",
            "--top-forms",
            "5",
        ])
        .unwrap();

        assert_eq!(args.variant, Variant::Family);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.top_forms, Some(5));
        assert!(!args.no_csv);
    }

    #[test]
    fn test_input_required_without_init_config() {
        assert!(Args::try_parse_from(["vendorscope"]).is_err());
        assert!(Args::try_parse_from(["vendorscope", "--init-config"]).is_ok());
    }
}
