//! Flat CSV export.
//!
//! One row per scored entity, or one row per fund with its family score
//! appended. The header row is always written so an empty result still
//! produces a usable file.

use crate::models::{FamilyGroup, ReportBody, ScoredEntity};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

const COMPANY_HEADERS: [&str; 20] = [
    "entity_name",
    "entity_id",
    "family_name",
    "total_filings",
    "vendor_filings",
    "vendor_share_pct",
    "is_vendor_dominant",
    "other_agent_count",
    "top_agent_by_volume",
    "top_agent_filing_count",
    "vendor_first_date",
    "vendor_last_date",
    "vendor_last_form_type",
    "vendor_top_form_types",
    "service_months",
    "service_years",
    "service_length_label",
    "money_tier",
    "switch_tier",
    "rationale",
];

const FUND_HEADERS: [&str; 20] = [
    "family_name",
    "fund_name",
    "fund_id",
    "snapshot_date",
    "investment_company_type",
    "total_series",
    "accession_rows",
    "admin_names",
    "adviser_names",
    "adviser_types",
    "total_filings_in_window",
    "vendor_filings_in_window",
    "vendor_pct_in_window",
    "total_agent_groups_in_window",
    "agent_groups_in_window",
    "vendor_form_types",
    "family_potential_value",
    "family_openness_to_switch",
    "family_conversation_script",
    "family_rationale",
];

// Field order must match COMPANY_HEADERS.
#[derive(Serialize)]
struct CompanyRow<'a> {
    entity_name: &'a str,
    entity_id: &'a str,
    family_name: Option<&'a str>,
    total_filings: u64,
    vendor_filings: u64,
    vendor_share_pct: f64,
    is_vendor_dominant: bool,
    other_agent_count: usize,
    top_agent_by_volume: &'a str,
    top_agent_filing_count: u64,
    vendor_first_date: String,
    vendor_last_date: String,
    vendor_last_form_type: &'a str,
    vendor_top_form_types: &'a str,
    service_months: u32,
    service_years: f64,
    service_length_label: &'a str,
    money_tier: String,
    switch_tier: String,
    rationale: &'a str,
}

impl<'a> From<&'a ScoredEntity> for CompanyRow<'a> {
    fn from(entity: &'a ScoredEntity) -> Self {
        let p = &entity.profile;
        Self {
            entity_name: &p.entity_name,
            entity_id: &p.entity_id,
            family_name: p.family_name.as_deref(),
            total_filings: p.total_filings,
            vendor_filings: p.vendor_filings,
            vendor_share_pct: round2(p.vendor_share_pct()),
            is_vendor_dominant: p.is_vendor_dominant,
            other_agent_count: p.other_agent_count,
            top_agent_by_volume: &p.top_agent_by_volume,
            top_agent_filing_count: p.top_agent_filing_count,
            vendor_first_date: p.vendor_first_date.to_string(),
            vendor_last_date: p.vendor_last_date.to_string(),
            vendor_last_form_type: &p.vendor_last_form_type,
            vendor_top_form_types: &p.vendor_top_form_types,
            service_months: p.service_months,
            service_years: p.service_years,
            service_length_label: &p.service_length_label,
            money_tier: entity.score.money_tier.to_string(),
            switch_tier: entity.score.switch_tier.to_string(),
            rationale: &entity.score.rationale,
        }
    }
}

// Field order must match FUND_HEADERS.
#[derive(Serialize)]
struct FundRow<'a> {
    family_name: &'a str,
    fund_name: &'a str,
    fund_id: &'a str,
    snapshot_date: String,
    investment_company_type: Option<&'a str>,
    total_series: Option<u64>,
    accession_rows: Option<u64>,
    admin_names: Option<&'a str>,
    adviser_names: Option<&'a str>,
    adviser_types: Option<&'a str>,
    total_filings_in_window: Option<u64>,
    vendor_filings_in_window: Option<u64>,
    vendor_pct_in_window: Option<f64>,
    total_agent_groups_in_window: Option<u64>,
    agent_groups_in_window: Option<&'a str>,
    vendor_form_types: &'a str,
    family_potential_value: String,
    family_openness_to_switch: String,
    family_conversation_script: &'a str,
    family_rationale: &'a str,
}

fn fund_rows(family: &FamilyGroup) -> impl Iterator<Item = FundRow<'_>> {
    let score = &family.score;
    family.funds.iter().map(move |fund| FundRow {
        family_name: &fund.family_name,
        fund_name: &fund.fund_name,
        fund_id: &fund.fund_id,
        snapshot_date: fund.snapshot_date.to_string(),
        investment_company_type: fund.investment_company_type.as_deref(),
        total_series: fund.total_series,
        accession_rows: fund.accession_rows,
        admin_names: fund.admin_names.as_deref(),
        adviser_names: fund.adviser_names.as_deref(),
        adviser_types: fund.adviser_types.as_deref(),
        total_filings_in_window: fund.total_filings_in_window,
        vendor_filings_in_window: fund.vendor_filings_in_window,
        vendor_pct_in_window: fund.vendor_pct_in_window,
        total_agent_groups_in_window: fund.total_agent_groups_in_window,
        agent_groups_in_window: fund.agent_groups_in_window.as_deref(),
        vendor_form_types: &fund.vendor_form_types,
        family_potential_value: score.potential_value.to_string(),
        family_openness_to_switch: score.openness.to_string(),
        family_conversation_script: &score.conversation_script,
        family_rationale: &score.rationale,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write the flat export of a report body to any writer.
///
/// Returns the number of data rows written.
pub fn write_csv<W: io::Write>(body: &ReportBody, writer: W) -> Result<usize> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    let mut rows = 0;

    match body {
        ReportBody::Companies(entities) => {
            csv.write_record(COMPANY_HEADERS)?;
            for entity in entities {
                csv.serialize(CompanyRow::from(entity))?;
                rows += 1;
            }
        }
        ReportBody::Families(families) => {
            csv.write_record(FUND_HEADERS)?;
            for row in families.iter().flat_map(fund_rows) {
                csv.serialize(row)?;
                rows += 1;
            }
        }
    }

    csv.flush()?;
    Ok(rows)
}

/// Write the flat export to a file.
pub fn export_csv(body: &ReportBody, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV export {}", path.display()))?;
    let rows = write_csv(body, io::BufWriter::new(file))
        .with_context(|| format!("Failed to write CSV export {}", path.display()))?;

    info!("Wrote {} CSV rows to {}", rows, path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EntityProfile, FamilyScoreResult, FundRecord, MoneyTier, OpennessTier, ScoreResult,
        SwitchTier,
    };
    use crate::test_support::date;

    fn entity(name: &str) -> ScoredEntity {
        ScoredEntity {
            profile: EntityProfile {
                entity_name: name.to_string(),
                entity_id: "0000456".to_string(),
                family_name: None,
                total_filings: 10,
                vendor_filings: 3,
                vendor_share: 0.3,
                other_agent_count: 2,
                top_agent_by_volume: "OTHER, INC".to_string(),
                top_agent_filing_count: 5,
                is_vendor_dominant: false,
                vendor_first_date: date("2021-03-01"),
                vendor_last_date: date("2021-09-15"),
                vendor_last_form_type: "8-K".to_string(),
                vendor_top_form_types: "8-K".to_string(),
                service_months: 6,
                service_years: 0.5,
                service_length_label: "0y 6m".to_string(),
                agent_breakout: Vec::new(),
            },
            score: ScoreResult {
                money_tier: MoneyTier::Two,
                switch_tier: SwitchTier::Likely,
                rationale: "Total filings=10.".to_string(),
            },
        }
    }

    fn to_string(body: &ReportBody) -> (usize, String) {
        let mut buffer = Vec::new();
        let rows = write_csv(body, &mut buffer).unwrap();
        (rows, String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_company_rows() {
        let body = ReportBody::Companies(vec![entity("Acme"), entity("Beta")]);
        let (rows, text) = to_string(&body);

        assert_eq!(rows, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("entity_name,entity_id,family_name,total_filings"));
        assert!(lines[1].starts_with("Acme,0000456,,10,3,30.0,false,2,\"OTHER, INC\",5,2021-03-01"));
        assert!(lines[1].ends_with("$$,Likely,Total filings=10."));
        assert!(lines[2].starts_with("Beta,"));
    }

    #[test]
    fn test_row_width_matches_header() {
        let body = ReportBody::Companies(vec![entity("Acme")]);
        let (_, text) = to_string(&body);

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), COMPANY_HEADERS.len());
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), headers.len());
        }
    }

    #[test]
    fn test_empty_result_writes_header_only() {
        let (rows, text) = to_string(&ReportBody::Companies(Vec::new()));
        assert_eq!(rows, 0);
        assert_eq!(text, format!("{}\n", COMPANY_HEADERS.join(",")));

        let (rows, text) = to_string(&ReportBody::Families(Vec::new()));
        assert_eq!(rows, 0);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("family_name,fund_name,fund_id"));
    }

    #[test]
    fn test_fund_rows_carry_family_score() {
        let fund = |name: &str| FundRecord {
            family_name: "Big Family".to_string(),
            fund_name: name.to_string(),
            fund_id: "S1".to_string(),
            snapshot_date: date("2024-01-01"),
            investment_company_type: None,
            total_series: Some(3),
            accession_rows: None,
            admin_names: None,
            adviser_names: None,
            adviser_types: None,
            total_filings_in_window: Some(40),
            vendor_filings_in_window: Some(10),
            vendor_pct_in_window: Some(25.0),
            total_agent_groups_in_window: Some(2),
            agent_groups_in_window: None,
            vendor_form_types: "485BPOS".to_string(),
        };
        let body = ReportBody::Families(vec![FamilyGroup {
            family_name: "Big Family".to_string(),
            funds: vec![fund("Alpha Fund"), fund("Beta Fund")],
            score: FamilyScoreResult {
                potential_value: MoneyTier::Three,
                openness: OpennessTier::High,
                conversation_script: "Hello.".to_string(),
                rationale: "Funds=2.".to_string(),
            },
        }]);

        let (rows, text) = to_string(&body);
        assert_eq!(rows, 2);

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[0][1], "Alpha Fund");
        assert_eq!(&records[1][1], "Beta Fund");
        assert_eq!(&records[1][16], "$$$");
        assert_eq!(&records[1][17], "High");
        assert_eq!(&records[1][19], "Funds=2.");
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let rows = export_csv(&ReportBody::Companies(vec![entity("Acme")]), &path).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
