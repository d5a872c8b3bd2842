//! Fund family rollup.
//!
//! Keeps the most recent snapshot of each fund within each named family
//! and attaches the fund's vendor-filed form types.

use crate::analysis::aggregator::{join_form_types, top_form_types, EntityKey, GroupKey};
use crate::analysis::normalize::{is_blank, AgentName};
use crate::analysis::recency::latest;
use crate::models::{FilingRecord, FundRecord};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Latest snapshot per (family, fund), ordered by family name then fund name.
///
/// Records without a family name are skipped. Funds are identified by
/// entity id, falling back to the fund name when no id was recorded.
pub fn rollup(records: &[FilingRecord], vendor: &str, top_forms: usize) -> Vec<FundRecord> {
    let vendor = AgentName::new(vendor);
    let mut grouped: BTreeMap<GroupKey, Vec<&FilingRecord>> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        if is_blank(record.family_name.as_deref()) || is_blank(record.entity_name.as_deref()) {
            skipped += 1;
            continue;
        }
        if let Some(key) = EntityKey::Fund.key_for(record) {
            grouped.entry(key).or_default().push(record);
        }
    }

    if skipped > 0 {
        debug!("Skipped {} records without a family or fund name", skipped);
    }

    let mut funds: Vec<FundRecord> = grouped
        .into_iter()
        .filter_map(|(key, members)| {
            let snapshot = latest(members.iter().copied())?;
            let vendor_records = members.iter().copied().filter(|record| {
                record
                    .agent_group
                    .as_deref()
                    .is_some_and(|agent| vendor.matches(agent))
            });
            let forms = join_form_types(&top_form_types(vendor_records, top_forms));
            Some(snapshot_to_fund(&key, snapshot, forms))
        })
        .collect();

    funds.sort_by(|a, b| {
        a.family_name
            .cmp(&b.family_name)
            .then_with(|| a.fund_name.cmp(&b.fund_name))
            .then_with(|| a.fund_id.cmp(&b.fund_id))
    });

    info!(
        "Rolled up {} funds across {} families",
        funds.len(),
        count_families(&funds)
    );

    funds
}

fn snapshot_to_fund(key: &GroupKey, snapshot: &FilingRecord, vendor_form_types: String) -> FundRecord {
    FundRecord {
        family_name: key.family.clone(),
        fund_name: snapshot
            .entity_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        fund_id: snapshot
            .entity_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        snapshot_date: snapshot.filing_date,
        investment_company_type: snapshot.investment_company_type.clone(),
        total_series: snapshot.total_series,
        accession_rows: snapshot.accession_rows,
        admin_names: snapshot.admin_names.clone(),
        adviser_names: snapshot.adviser_names.clone(),
        adviser_types: snapshot.adviser_types.clone(),
        total_filings_in_window: snapshot.total_filings_in_window,
        vendor_filings_in_window: snapshot.vendor_filings_in_window,
        vendor_pct_in_window: snapshot.vendor_pct_in_window,
        total_agent_groups_in_window: snapshot.total_agent_groups_in_window,
        agent_groups_in_window: snapshot.agent_groups_in_window.clone(),
        vendor_form_types,
    }
}

fn count_families(funds: &[FundRecord]) -> usize {
    let mut families: Vec<&str> = funds.iter().map(|f| f.family_name.as_str()).collect();
    families.dedup();
    families.len()
}

/// Split sorted funds into families, preserving order.
pub fn group_by_family(funds: Vec<FundRecord>) -> Vec<(String, Vec<FundRecord>)> {
    let mut families: Vec<(String, Vec<FundRecord>)> = Vec::new();

    for fund in funds {
        match families.last_mut() {
            Some((name, members)) if *name == fund.family_name => members.push(fund),
            _ => families.push((fund.family_name.clone(), vec![fund])),
        }
    }

    families
}
