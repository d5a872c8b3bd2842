//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.vendorscope.toml` files. Scoring policy lives here as data so
//! thresholds can change without touching the aggregation code.

use crate::models::{MoneyTier, OpennessTier, SwitchTier};
use crate::scoring::tiers::{AtLeast, Below, TierCutoff};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".vendorscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Target vendor.
    #[serde(default)]
    pub vendor: VendorConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Entity opportunity scoring.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Family opportunity scoring.
    #[serde(default)]
    pub family: FamilyScoringConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Write the flat CSV export next to the report.
    #[serde(default = "default_true")]
    pub csv_export: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            csv_export: true,
        }
    }
}

fn default_output() -> String {
    "vendor_report.md".to_string()
}

fn default_true() -> bool {
    true
}

/// The filing agent whose dependency is measured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Vendor name; compared after trimming and upper-casing.
    #[serde(default = "default_vendor")]
    pub name: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            name: default_vendor(),
        }
    }
}

fn default_vendor() -> String {
    "QUALITY EDGAR SOLUTIONS".to_string()
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// How many vendor form types to list per entity.
    #[serde(default = "default_top_form_types")]
    pub top_form_types: usize,

    /// Profile entity groups on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            top_form_types: default_top_form_types(),
            parallel: true,
        }
    }
}

fn default_top_form_types() -> usize {
    3
}

/// Entity-level money and switch tier tables.
///
/// Shares are fractions in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Form types that earn the bonus when they appear in the last vendor form.
    #[serde(default = "default_high_value_forms")]
    pub high_value_forms: Vec<String>,

    #[serde(default = "default_high_value_bonus")]
    pub high_value_bonus: u32,

    /// Points not awarded to a vendor-dominant entity.
    #[serde(default = "default_not_dominant_points")]
    pub not_dominant_points: u32,

    /// Vendor share above which switching is capped at `Very Low`.
    #[serde(default = "default_dominance_cap")]
    pub dominance_cap: f64,

    /// Total filings → volume points.
    #[serde(default = "default_volume")]
    pub volume: Vec<AtLeast<u64>>,

    /// Vendor share → money points.
    #[serde(default = "default_share")]
    pub share: Vec<AtLeast<f64>>,

    #[serde(default = "default_money_tiers")]
    pub money_tiers: Vec<TierCutoff<MoneyTier>>,

    /// Vendor share → switch points (lower share scores higher).
    #[serde(default = "default_switch_share")]
    pub switch_share: Vec<Below>,

    /// Other agent count → switch points.
    #[serde(default = "default_switch_other_agents")]
    pub switch_other_agents: Vec<AtLeast<usize>>,

    #[serde(default = "default_switch_tiers")]
    pub switch_tiers: Vec<TierCutoff<SwitchTier>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_value_forms: default_high_value_forms(),
            high_value_bonus: default_high_value_bonus(),
            not_dominant_points: default_not_dominant_points(),
            dominance_cap: default_dominance_cap(),
            volume: default_volume(),
            share: default_share(),
            money_tiers: default_money_tiers(),
            switch_share: default_switch_share(),
            switch_other_agents: default_switch_other_agents(),
            switch_tiers: default_switch_tiers(),
        }
    }
}

fn default_high_value_forms() -> Vec<String> {
    vec!["S-1", "S-3", "10-K", "10-Q", "8-K", "DEF 14A", "424B"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_high_value_bonus() -> u32 {
    1
}

fn default_not_dominant_points() -> u32 {
    1
}

fn default_dominance_cap() -> f64 {
    0.85
}

fn default_volume() -> Vec<AtLeast<u64>> {
    vec![AtLeast::new(80, 3), AtLeast::new(40, 2), AtLeast::new(15, 1)]
}

fn default_share() -> Vec<AtLeast<f64>> {
    vec![AtLeast::new(0.70, 2), AtLeast::new(0.35, 1)]
}

fn default_money_tiers() -> Vec<TierCutoff<MoneyTier>> {
    vec![
        TierCutoff::new(6, MoneyTier::Four),
        TierCutoff::new(4, MoneyTier::Three),
        TierCutoff::new(2, MoneyTier::Two),
    ]
}

fn default_switch_share() -> Vec<Below> {
    vec![Below::new(0.20, 3), Below::new(0.40, 2), Below::new(0.55, 1)]
}

fn default_switch_other_agents() -> Vec<AtLeast<usize>> {
    vec![AtLeast::new(3, 2), AtLeast::new(1, 1)]
}

fn default_switch_tiers() -> Vec<TierCutoff<SwitchTier>> {
    vec![
        TierCutoff::new(6, SwitchTier::VeryLikely),
        TierCutoff::new(4, SwitchTier::Likely),
        TierCutoff::new(3, SwitchTier::Possible),
        TierCutoff::new(2, SwitchTier::Low),
    ]
}

/// Family-level value and openness tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyScoringConfig {
    /// Family window filings → value points.
    #[serde(default = "default_window_filings")]
    pub window_filings: Vec<AtLeast<u64>>,

    /// Funds in family → value points.
    #[serde(default = "default_fund_count")]
    pub fund_count: Vec<AtLeast<usize>>,

    #[serde(default = "default_value_tiers")]
    pub value_tiers: Vec<TierCutoff<MoneyTier>>,

    /// Family vendor share → openness points.
    #[serde(default = "default_family_share")]
    pub share: Vec<Below>,

    /// Average agent groups per fund → openness points.
    #[serde(default = "default_avg_agent_groups")]
    pub avg_agent_groups: Vec<AtLeast<f64>>,

    #[serde(default = "default_openness_tiers")]
    pub openness_tiers: Vec<TierCutoff<OpennessTier>>,

    /// Conversation opener printed on every family page.
    #[serde(default = "default_conversation_script")]
    pub conversation_script: String,
}

impl Default for FamilyScoringConfig {
    fn default() -> Self {
        Self {
            window_filings: default_window_filings(),
            fund_count: default_fund_count(),
            value_tiers: default_value_tiers(),
            share: default_family_share(),
            avg_agent_groups: default_avg_agent_groups(),
            openness_tiers: default_openness_tiers(),
            conversation_script: default_conversation_script(),
        }
    }
}

fn default_window_filings() -> Vec<AtLeast<u64>> {
    vec![
        AtLeast::new(1000, 3),
        AtLeast::new(300, 2),
        AtLeast::new(100, 1),
    ]
}

fn default_fund_count() -> Vec<AtLeast<usize>> {
    vec![AtLeast::new(10, 2), AtLeast::new(4, 1)]
}

fn default_value_tiers() -> Vec<TierCutoff<MoneyTier>> {
    vec![
        TierCutoff::new(5, MoneyTier::Four),
        TierCutoff::new(3, MoneyTier::Three),
        TierCutoff::new(2, MoneyTier::Two),
    ]
}

fn default_family_share() -> Vec<Below> {
    vec![Below::new(0.25, 3), Below::new(0.50, 2), Below::new(0.70, 1)]
}

fn default_avg_agent_groups() -> Vec<AtLeast<f64>> {
    vec![AtLeast::new(4.0, 2), AtLeast::new(2.0, 1)]
}

fn default_openness_tiers() -> Vec<TierCutoff<OpennessTier>> {
    vec![
        TierCutoff::new(5, OpennessTier::VeryHigh),
        TierCutoff::new(4, OpennessTier::High),
        TierCutoff::new(3, OpennessTier::Medium),
        TierCutoff::new(2, OpennessTier::Low),
    ]
}

fn default_conversation_script() -> String {
    "We support multi-fund filing operations with predictable execution, \
     tight turnaround, and clean regulator-ready output. Could we review one \
     recent high-volume filing cycle and identify where we can reduce touches \
     and improve filing reliability across your funds?"
        .to_string()
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
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref vendor) = args.vendor {
            self.vendor.name = vendor.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(top_forms) = args.top_forms {
            self.aggregation.top_form_types = top_forms;
        }

        if args.sequential {
            self.aggregation.parallel = false;
        }

        if args.no_csv {
            self.general.csv_export = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.vendor.name.trim().is_empty() {
            bail!("Vendor name must not be blank");
        }
        if self.aggregation.top_form_types == 0 {
            bail!("top_form_types must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.scoring.dominance_cap) {
            bail!(
                "dominance_cap must be a fraction between 0 and 1, got {}",
                self.scoring.dominance_cap
            );
        }
        let shares = self
            .scoring
            .share
            .iter()
            .map(|row| row.min)
            .chain(self.scoring.switch_share.iter().map(|row| row.below))
            .chain(self.family.share.iter().map(|row| row.below));
        for share in shares {
            if !(0.0..=1.0).contains(&share) {
                bail!("Share thresholds are fractions between 0 and 1, got {}", share);
            }
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
