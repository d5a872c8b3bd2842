//! vendorscope - filing agent vendor dependency report
//!
//! A CLI tool that measures how dependent each filer, or each fund
//! family, is on one filing agent vendor and classifies it into
//! revenue and switch-likelihood tiers for sales prioritization.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad input, config, unreadable records, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod scoring;
mod source;
#[cfg(test)]
mod test_support;

use analysis::normalize::AgentName;
use analysis::{Aggregator, EntityKey};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat, Variant};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::{FilingRecord, Report, ReportBody, ReportMetadata, TierSummary};
use scoring::{FamilyClassifier, OpportunityClassifier};
use source::{RecordSource, SanitizeStats};
use std::path::{Path, PathBuf};
use std::time::Instant;
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

    // Initialize logging
    init_logging(&args);

    info!("vendorscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_report(args) {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .vendorscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change the vendor, scoring thresholds and tiers.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete load, aggregate, score and render workflow.
fn run_report(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let vendor = config.vendor.name.trim().to_string();
    let input = args.input_path().to_path_buf();

    // Step 1: Load the filing records
    if !args.quiet {
        println!("📥 Loading filing records from {}", input.display());
    }
    let records = RecordSource::new(input.clone(), !args.quiet).load()?;
    let records_loaded = records.len();

    let (records, stats) = source::sanitize(records);

    // Handle --dry-run: report what was loaded and exit
    if args.dry_run {
        handle_dry_run(&records, &stats, &vendor);
        return Ok(());
    }

    // Step 2: Aggregate and score
    if !args.quiet {
        println!("🔬 Measuring dependency on {}...", vendor);
    }
    let body = match args.variant {
        Variant::Company => {
            let profiles =
                Aggregator::from_config(&config).profile_all(&records, EntityKey::Company);
            let classifier = OpportunityClassifier::new(config.scoring.clone(), &vendor);
            ReportBody::Companies(classifier.classify_all(profiles))
        }
        Variant::Family => {
            let funds =
                analysis::rollup(&records, &vendor, config.aggregation.top_form_types);
            let classifier = FamilyClassifier::new(config.family.clone(), &vendor);
            ReportBody::Families(classifier.classify_all(funds))
        }
    };

    let summary = match &body {
        ReportBody::Companies(entities) => TierSummary::from_entities(entities),
        ReportBody::Families(families) => TierSummary::from_families(families),
    };

    // Step 3: Build the report
    let metadata = ReportMetadata {
        vendor: vendor.clone(),
        input: input.display().to_string(),
        generated_at: Utc::now(),
        records_loaded,
        records_dropped: stats.dropped(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        summary,
        body,
    };

    // Step 4: Generate and save the report
    let output_path = report_path(&args, &config);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
    info!("Report written to {}", output_path.display());

    let csv_path = if config.general.csv_export {
        let path = args.csv_path(&output_path);
        report::export_csv(&report.body, &path)?;
        Some(path)
    } else {
        None
    };

    if !args.quiet {
        print_summary(&report, &output_path, csv_path.as_deref(), start_time);
    }

    Ok(())
}

/// The report path from config, with a .json extension for JSON output
/// unless a path was given explicitly.
fn report_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none() && args.format == OutputFormat::Json {
        path.with_extension("json")
    } else {
        path
    }
}

/// Print the tier breakdown to stdout.
fn print_summary(report: &Report, output: &Path, csv: Option<&Path>, start_time: Instant) {
    let summary = &report.summary;
    let unit = match report.body {
        ReportBody::Companies(_) => "Entities",
        ReportBody::Families(_) => "Families",
    };

    println!("\n📊 Summary:");
    println!("   Records loaded: {}", report.metadata.records_loaded);
    if report.metadata.records_dropped > 0 {
        println!("   Records dropped: {}", report.metadata.records_dropped);
    }
    println!("   {} scored: {}", unit, summary.total);
    for (tier, count) in summary.by_money.iter().rev() {
        println!("   - {}: {}", tier, count);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Report saved to: {}", output.display());
    if let Some(csv) = csv {
        println!("   Flat export: {}", csv.display());
    }
}

/// Handle --dry-run: print record counts without scoring.
fn handle_dry_run(records: &[FilingRecord], stats: &SanitizeStats, vendor: &str) {
    println!("\n🔍 Dry run: records loaded, no report written.\n");

    let vendor = AgentName::new(vendor);
    let vendor_records = records
        .iter()
        .filter(|r| r.agent_group.as_deref().is_some_and(|a| vendor.matches(a)))
        .count();
    let entities = analysis::aggregator::group_records(records, EntityKey::Company).len();

    println!("   Usable records: {}", records.len());
    println!(
        "   Dropped records: {} ({} without entity name, {} without agent group)",
        stats.dropped(),
        stats.missing_entity_name,
        stats.missing_agent_group
    );
    println!("   Distinct entities: {}", entities);
    println!(
        "   Records filed by {}: {}",
        vendor.raw.trim(),
        vendor_records
    );

    println!("\n✅ Dry run complete.");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
