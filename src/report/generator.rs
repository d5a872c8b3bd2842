//! Markdown and JSON report generation.
//!
//! This module renders the scored profiles into a human-readable
//! Markdown document or a JSON document. It performs no scoring and
//! keeps the row order it is given.

use crate::models::{
    FamilyGroup, FundRecord, MoneyTier, OpennessTier, Report, ReportBody, ReportMetadata,
    ScoredEntity, SwitchTier, TierSummary,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# {} Client Opportunity Report\n\n",
        report.metadata.vendor.trim()
    ));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(&report.summary, &report.body));

    match &report.body {
        ReportBody::Companies(entities) => {
            output.push_str(&generate_entities_section(entities, &report.metadata.vendor))
        }
        ReportBody::Families(families) => {
            output.push_str(&generate_families_section(families, &report.metadata.vendor))
        }
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Vendor:** {}\n", metadata.vendor.trim()));
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records Loaded:** {}\n",
        metadata.records_loaded
    ));
    if metadata.records_dropped > 0 {
        section.push_str(&format!(
            "- **Records Dropped:** {} (missing entity name or agent group)\n",
            metadata.records_dropped
        ));
    }
    section.push_str(&format!(
        "- **Run Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");

    match &report.body {
        ReportBody::Companies(_) => toc.push_str("- [Entities](#entities)\n"),
        ReportBody::Families(families) => {
            toc.push_str("- [Families](#families)\n");
            for family in families {
                toc.push_str(&format!(
                    "  - [{}](#{})\n",
                    family.family_name,
                    anchor(&family.family_name)
                ));
            }
        }
    }

    toc.push('\n');

    toc
}

fn anchor(name: &str) -> String {
    name.replace(['/', '.', ' ', '&', ','], "-").to_lowercase()
}

/// Generate the tier distribution tables.
fn generate_summary_section(summary: &TierSummary, body: &ReportBody) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    let (unit, money_label, switch_label) = match body {
        ReportBody::Companies(_) => ("Entities", "Revenue Rank", "Switch Likelihood"),
        ReportBody::Families(_) => ("Families", "Potential Value", "Openness to Switch"),
    };

    section.push_str(&format!("**{} scored:** {}\n\n", unit, summary.total));

    if summary.total == 0 {
        section.push_str("No entities with vendor filings were found.\n\n");
        return section;
    }

    section.push_str(&format!("### {}\n\n", money_label));
    section.push_str("| Tier | Count |\n");
    section.push_str("|:---|:---:|\n");
    for tier in MoneyTier::ALL {
        let label = tier.to_string();
        let count = summary.by_money.get(&label).copied().unwrap_or(0);
        section.push_str(&format!("| {} | {} |\n", label, count));
    }
    section.push('\n');

    section.push_str(&format!("### {}\n\n", switch_label));
    section.push_str("| Tier | Count |\n");
    section.push_str("|:---|:---:|\n");
    match body {
        ReportBody::Companies(_) => {
            for tier in SwitchTier::ALL {
                let label = tier.to_string();
                let count = summary.by_switch.get(&label).copied().unwrap_or(0);
                section.push_str(&format!("| {} | {} |\n", label, count));
            }
        }
        ReportBody::Families(_) => {
            for tier in OpennessTier::ALL {
                let label = tier.to_string();
                let count = summary.by_switch.get(&label).copied().unwrap_or(0);
                section.push_str(&format!("| {} | {} |\n", label, count));
            }
        }
    }
    section.push('\n');

    section
}

/// Escape a value for a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn opt_cell<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| cell(&v.to_string()))
        .unwrap_or_default()
}

/// Generate the one-row-per-entity table.
fn generate_entities_section(entities: &[ScoredEntity], vendor: &str) -> String {
    let mut section = String::new();

    section.push_str("## Entities\n\n");

    if entities.is_empty() {
        section.push_str("No entity filed through this vendor.\n\n");
        return section;
    }

    let show_family = entities.iter().any(|e| e.profile.family_name.is_some());
    let vendor = cell(vendor.trim());

    let mut header = vec!["Company".to_string()];
    if show_family {
        header.push("Family".to_string());
    }
    header.push("CIK".to_string());
    header.push("Total Filings".to_string());
    header.push(format!("{} Filings", vendor));
    header.push(format!("{} %", vendor));
    header.extend(
        [
            "Dominant Filer?",
            "Other Agents",
            "Top Agent",
            "Vendor Since",
            "Last Filing Date",
            "Last Form",
            "Top Forms",
            "Service",
            "Revenue Rank",
            "Switch Likelihood",
            "Notes",
        ]
        .iter()
        .map(|h| h.to_string()),
    );

    section.push_str(&format!("| {} |\n", header.join(" | ")));
    section.push_str(&format!("|{}\n", ":---|".repeat(header.len())));

    for entity in entities {
        let p = &entity.profile;
        let mut row = vec![cell(&p.entity_name)];
        if show_family {
            row.push(opt_cell(&p.family_name));
        }
        row.extend([
            cell(&p.entity_id),
            p.total_filings.to_string(),
            p.vendor_filings.to_string(),
            format!("{:.2}%", p.vendor_share_pct()),
            if p.is_vendor_dominant { "Yes" } else { "No" }.to_string(),
            p.other_agent_count.to_string(),
            format!(
                "{} ({})",
                cell(&p.top_agent_by_volume),
                p.top_agent_filing_count
            ),
            p.vendor_first_date.to_string(),
            p.vendor_last_date.to_string(),
            cell(&p.vendor_last_form_type),
            cell(&p.vendor_top_form_types),
            p.service_length_label.clone(),
            entity.score.money_tier.to_string(),
            entity.score.switch_tier.to_string(),
            cell(&entity.score.rationale),
        ]);
        section.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate one section per fund family.
fn generate_families_section(families: &[FamilyGroup], vendor: &str) -> String {
    let mut section = String::new();

    section.push_str("## Families\n\n");

    if families.is_empty() {
        section.push_str("No fund families were found in the input.\n\n");
        return section;
    }

    for family in families {
        section.push_str(&generate_family_block(family, vendor));
    }

    section
}

/// Generate the executive summary and fund table for one family.
fn generate_family_block(family: &FamilyGroup, vendor: &str) -> String {
    let mut block = String::new();
    let score = &family.score;

    block.push_str(&format!("### {}\n\n", family.family_name));

    block.push_str("#### Executive Summary\n\n");
    block.push_str(&format!("- **Openness to Switch:** {}\n", score.openness));
    block.push_str(&format!(
        "- **Potential Value:** {}\n",
        score.potential_value
    ));
    block.push_str(&format!(
        "- **Conversation Starter:** {}\n",
        score.conversation_script
    ));
    block.push_str(&format!("- **Reasoning:** {}\n\n", score.rationale));

    block.push_str("#### Funds in Family\n\n");
    let vendor = cell(vendor.trim());
    block.push_str(&format!(
        "| Fund | CIK | Investment Type | Total Series | Accession Rows | Admin Names | \
         Adviser Names | Adviser Types | Total Filings | {v} Filings | {v} % | \
         Total Agent Groups | Agent Groups Used | {v} Forms |\n",
        v = vendor
    ));
    block.push_str(&format!("|{}\n", ":---|".repeat(14)));

    for fund in &family.funds {
        block.push_str(&format!("| {} |\n", fund_row(fund).join(" | ")));
    }
    block.push_str("\n---\n\n");

    block
}

fn fund_row(fund: &FundRecord) -> Vec<String> {
    vec![
        cell(&fund.fund_name),
        cell(&fund.fund_id),
        opt_cell(&fund.investment_company_type),
        opt_cell(&fund.total_series),
        opt_cell(&fund.accession_rows),
        opt_cell(&fund.admin_names),
        opt_cell(&fund.adviser_names),
        opt_cell(&fund.adviser_types),
        opt_cell(&fund.total_filings_in_window),
        opt_cell(&fund.vendor_filings_in_window),
        fund.vendor_pct_in_window
            .map(|pct| format!("{:.2}%", pct))
            .unwrap_or_default(),
        opt_cell(&fund.total_agent_groups_in_window),
        opt_cell(&fund.agent_groups_in_window),
        cell(&fund.vendor_form_types),
    ]
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by vendorscope v{}. Tiers are rule-based and reproducible.*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
