//! Data models for the vendor dependency report.
//!
//! This module contains the core data structures used throughout
//! the application: raw filing records, per-entity dependency profiles,
//! family fund snapshots, classifier tiers and the report envelope.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One filing event as supplied by the record source.
///
/// Field names accept both snake_case and the warehouse column names so
/// that exported query results load without a mapping step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Filer (company or fund) name.
    #[serde(default, alias = "companyName", alias = "entityName")]
    pub entity_name: Option<String>,
    /// Filer identifier (CIK), kept as text to preserve leading zeros.
    #[serde(
        default,
        alias = "companyCIK",
        alias = "companyCik",
        alias = "entityId"
    )]
    pub entity_id: Option<String>,
    /// SEC form type, e.g. `10-K`.
    #[serde(default, alias = "formType")]
    pub form_type: Option<String>,
    /// Filing agent group exactly as recorded.
    #[serde(default, alias = "agentGroup", alias = "agent_group_raw")]
    pub agent_group: Option<String>,
    /// Date the filing was made.
    #[serde(alias = "filingDate")]
    pub filing_date: NaiveDate,
    /// Date of the index file the record was loaded from.
    #[serde(default, alias = "indexDate")]
    pub index_date: Option<NaiveDate>,
    /// Warehouse load time.
    #[serde(
        default,
        alias = "loadTimestamp",
        deserialize_with = "lenient_timestamp"
    )]
    pub load_timestamp: Option<DateTime<Utc>>,

    /// Fund family the filer belongs to.
    #[serde(
        default,
        alias = "familyName",
        alias = "ncen_family_investment_company_name"
    )]
    pub family_name: Option<String>,
    #[serde(default, alias = "ncen_investment_company_type")]
    pub investment_company_type: Option<String>,
    #[serde(
        default,
        alias = "ncen_total_series",
        deserialize_with = "lenient_u64"
    )]
    pub total_series: Option<u64>,
    #[serde(
        default,
        alias = "ncen_accession_rows",
        deserialize_with = "lenient_u64"
    )]
    pub accession_rows: Option<u64>,
    #[serde(default, alias = "ncen_admin_names")]
    pub admin_names: Option<String>,
    #[serde(default, alias = "ncen_adviser_names")]
    pub adviser_names: Option<String>,
    #[serde(default, alias = "ncen_adviser_types")]
    pub adviser_types: Option<String>,

    /// Pre-aggregated window counters, carried by family snapshots.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_filings_in_window: Option<u64>,
    #[serde(
        default,
        alias = "qes_filings_in_window",
        deserialize_with = "lenient_u64"
    )]
    pub vendor_filings_in_window: Option<u64>,
    #[serde(
        default,
        alias = "qes_pct_of_company_filings_in_window",
        deserialize_with = "lenient_f64"
    )]
    pub vendor_pct_in_window: Option<f64>,
    #[serde(
        default,
        alias = "total_agent_groups_used_in_window",
        deserialize_with = "lenient_u64"
    )]
    pub total_agent_groups_in_window: Option<u64>,
    #[serde(default, alias = "agent_groups_used_in_window")]
    pub agent_groups_in_window: Option<String>,
}

/// Warehouse exports stringify numbers; accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(u64),
    Float(f64),
    Text(String),
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Lenient> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Int(n)) => Some(n),
        Some(Lenient::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Lenient> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Lenient::Int(n)) => Some(n as f64),
        Some(Lenient::Float(f)) => Some(f),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = value else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let naive = raw.trim_end_matches(" UTC");
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(Some(ts.and_utc()));
        }
    }

    Err(serde::de::Error::custom(format!(
        "invalid load timestamp: {}",
        raw
    )))
}

/// One row of an entity's agent breakout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTally {
    /// Normalized comparison key.
    pub key: String,
    /// Most frequent raw spelling, used for display.
    pub display: String,
    /// Filings attributed to this agent.
    pub filings: u64,
}

/// Dependency profile of one entity on the target vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProfile {
    pub entity_name: String,
    /// Latest known non-null identifier, empty when none was ever recorded.
    pub entity_id: String,
    /// Family name, populated when grouping by fund.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    pub total_filings: u64,
    pub vendor_filings: u64,
    /// Fraction in `[0, 1]`.
    pub vendor_share: f64,
    pub other_agent_count: usize,
    pub top_agent_by_volume: String,
    pub top_agent_filing_count: u64,
    pub is_vendor_dominant: bool,
    pub vendor_first_date: NaiveDate,
    pub vendor_last_date: NaiveDate,
    pub vendor_last_form_type: String,
    pub vendor_top_form_types: String,
    pub service_months: u32,
    pub service_years: f64,
    pub service_length_label: String,
    /// Full ranked breakout, vendor included.
    pub agent_breakout: Vec<AgentTally>,
}

impl EntityProfile {
    /// Vendor share as a percentage, for display.
    pub fn vendor_share_pct(&self) -> f64 {
        self.vendor_share * 100.0
    }
}

/// Revenue potential bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoneyTier {
    #[serde(rename = "$")]
    One,
    #[serde(rename = "$$")]
    Two,
    #[serde(rename = "$$$")]
    Three,
    #[serde(rename = "$$$$")]
    Four,
}

impl MoneyTier {
    pub const ALL: [MoneyTier; 4] = [
        MoneyTier::Four,
        MoneyTier::Three,
        MoneyTier::Two,
        MoneyTier::One,
    ];
}

impl fmt::Display for MoneyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyTier::One => write!(f, "$"),
            MoneyTier::Two => write!(f, "$$"),
            MoneyTier::Three => write!(f, "$$$"),
            MoneyTier::Four => write!(f, "$$$$"),
        }
    }
}

/// Likelihood that an entity moves work away from the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SwitchTier {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Possible,
    Likely,
    #[serde(rename = "Very Likely")]
    VeryLikely,
}

impl SwitchTier {
    pub const ALL: [SwitchTier; 5] = [
        SwitchTier::VeryLikely,
        SwitchTier::Likely,
        SwitchTier::Possible,
        SwitchTier::Low,
        SwitchTier::VeryLow,
    ];
}

impl fmt::Display for SwitchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchTier::VeryLow => write!(f, "Very Low"),
            SwitchTier::Low => write!(f, "Low"),
            SwitchTier::Possible => write!(f, "Possible"),
            SwitchTier::Likely => write!(f, "Likely"),
            SwitchTier::VeryLikely => write!(f, "Very Likely"),
        }
    }
}

/// Family-level openness to changing filing agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OpennessTier {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl OpennessTier {
    pub const ALL: [OpennessTier; 5] = [
        OpennessTier::VeryHigh,
        OpennessTier::High,
        OpennessTier::Medium,
        OpennessTier::Low,
        OpennessTier::VeryLow,
    ];
}

impl fmt::Display for OpennessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpennessTier::VeryLow => write!(f, "Very Low"),
            OpennessTier::Low => write!(f, "Low"),
            OpennessTier::Medium => write!(f, "Medium"),
            OpennessTier::High => write!(f, "High"),
            OpennessTier::VeryHigh => write!(f, "Very High"),
        }
    }
}

/// Classifier output for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub money_tier: MoneyTier,
    pub switch_tier: SwitchTier,
    pub rationale: String,
}

/// An entity profile paired with its score, in report order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEntity {
    pub profile: EntityProfile,
    pub score: ScoreResult,
}

/// Latest snapshot of one fund within a family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRecord {
    pub family_name: String,
    pub fund_name: String,
    pub fund_id: String,
    pub snapshot_date: NaiveDate,
    pub investment_company_type: Option<String>,
    pub total_series: Option<u64>,
    pub accession_rows: Option<u64>,
    pub admin_names: Option<String>,
    pub adviser_names: Option<String>,
    pub adviser_types: Option<String>,
    pub total_filings_in_window: Option<u64>,
    pub vendor_filings_in_window: Option<u64>,
    pub vendor_pct_in_window: Option<f64>,
    pub total_agent_groups_in_window: Option<u64>,
    pub agent_groups_in_window: Option<String>,
    /// Top vendor-filed form types for this fund, most frequent first.
    pub vendor_form_types: String,
}

/// Classifier output for one fund family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyScoreResult {
    pub potential_value: MoneyTier,
    pub openness: OpennessTier,
    pub conversation_script: String,
    pub rationale: String,
}

/// All funds of one family with the family score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyGroup {
    pub family_name: String,
    pub funds: Vec<FundRecord>,
    pub score: FamilyScoreResult,
}

/// Counts of scored rows per tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierSummary {
    /// Number of scored rows (entities or families).
    pub total: usize,
    pub by_money: BTreeMap<String, usize>,
    pub by_switch: BTreeMap<String, usize>,
}

impl TierSummary {
    /// Creates a summary from scored entities.
    pub fn from_entities(entities: &[ScoredEntity]) -> Self {
        let mut summary = Self {
            total: entities.len(),
            ..Self::default()
        };

        for entity in entities {
            *summary
                .by_money
                .entry(entity.score.money_tier.to_string())
                .or_insert(0) += 1;
            *summary
                .by_switch
                .entry(entity.score.switch_tier.to_string())
                .or_insert(0) += 1;
        }

        summary
    }

    /// Creates a summary from scored families.
    pub fn from_families(families: &[FamilyGroup]) -> Self {
        let mut summary = Self {
            total: families.len(),
            ..Self::default()
        };

        for family in families {
            *summary
                .by_money
                .entry(family.score.potential_value.to_string())
                .or_insert(0) += 1;
            *summary
                .by_switch
                .entry(family.score.openness.to_string())
                .or_insert(0) += 1;
        }

        summary
    }
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Target vendor as configured.
    pub vendor: String,
    /// Input file or directory.
    pub input: String,
    pub generated_at: DateTime<Utc>,
    /// Records read from the source.
    pub records_loaded: usize,
    /// Records dropped for a missing entity name or agent group.
    pub records_dropped: usize,
    pub duration_seconds: f64,
}

/// Report content for either variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", content = "rows", rename_all = "snake_case")]
pub enum ReportBody {
    Companies(Vec<ScoredEntity>),
    Families(Vec<FamilyGroup>),
}

/// The complete vendor dependency report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: TierSummary,
    pub body: ReportBody,
}
