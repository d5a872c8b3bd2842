//! Per-entity vendor dependency aggregation.
//!
//! Groups filing records by entity, keeps only entities with at least one
//! vendor filing, and computes the dependency profile of each. All
//! grouping goes through ordered maps so output never depends on hash
//! iteration order.

use crate::analysis::normalize::{is_blank, normalize_agent, AgentName};
use crate::analysis::recency::latest_with;
use crate::models::{AgentTally, EntityProfile, FilingRecord};
use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How records are grouped into entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey {
    /// One entity per company name.
    Company,
    /// One entity per fund within a fund family.
    Fund,
}

/// Grouping key produced by an [`EntityKey`] selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    /// Family name; empty for company grouping.
    pub family: String,
    /// Company name, or fund id (falling back to fund name).
    pub entity: String,
}

impl EntityKey {
    /// Key for a record, or `None` if the record cannot be grouped.
    pub fn key_for(&self, record: &FilingRecord) -> Option<GroupKey> {
        let name = record.entity_name.as_deref()?;
        match self {
            EntityKey::Company => Some(GroupKey {
                family: String::new(),
                entity: name.to_string(),
            }),
            EntityKey::Fund => {
                let family = record.family_name.as_deref().unwrap_or("").trim();
                let entity = match record.entity_id.as_deref() {
                    Some(id) if !id.trim().is_empty() => id.trim(),
                    _ => name,
                };
                Some(GroupKey {
                    family: family.to_string(),
                    entity: entity.to_string(),
                })
            }
        }
    }
}

/// Group attributable records by entity, in key order.
pub fn group_records(
    records: &[FilingRecord],
    key: EntityKey,
) -> BTreeMap<GroupKey, Vec<&FilingRecord>> {
    let mut grouped: BTreeMap<GroupKey, Vec<&FilingRecord>> = BTreeMap::new();

    for record in records {
        if is_blank(record.entity_name.as_deref()) || is_blank(record.agent_group.as_deref()) {
            continue;
        }
        if let Some(group) = key.key_for(record) {
            grouped.entry(group).or_default().push(record);
        }
    }

    grouped
}

/// Rank one entity's agents by filing count, highest first.
///
/// Equal counts are ordered by normalized name ascending. Each row shows
/// the agent's most frequent raw spelling (ties: smallest spelling).
pub fn rank_agents(records: &[&FilingRecord]) -> Vec<AgentTally> {
    let mut by_agent: BTreeMap<String, BTreeMap<&str, u64>> = BTreeMap::new();

    for record in records {
        let raw = record.agent_group.as_deref().unwrap_or("");
        *by_agent
            .entry(normalize_agent(raw))
            .or_default()
            .entry(raw)
            .or_insert(0) += 1;
    }

    let mut ranked: Vec<AgentTally> = by_agent
        .into_iter()
        .map(|(key, spellings)| {
            let filings = spellings.values().sum();
            let mut display = "";
            let mut best = 0;
            for (raw, count) in spellings {
                if count > best {
                    best = count;
                    display = raw;
                }
            }
            AgentTally {
                display: display.trim().to_string(),
                key,
                filings,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.filings.cmp(&a.filings).then_with(|| a.key.cmp(&b.key)));
    ranked
}

/// Most frequent form types, highest count first, ties by name ascending.
///
/// Records without a form type are ignored.
pub fn top_form_types<'a, I>(records: I, k: usize) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = &'a FilingRecord>,
{
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        if let Some(form) = record.form_type.as_deref().map(str::trim) {
            if !form.is_empty() {
                *counts.entry(form).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(form, count)| (form.to_string(), count))
        .collect();
    ranked.sort_by_key(|(form, count)| (Reverse(*count), form.clone()));
    ranked.truncate(k);
    ranked
}

/// Display string for ranked form types.
pub fn join_form_types(ranked: &[(String, u64)]) -> String {
    ranked
        .iter()
        .map(|(form, _)| form.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Calendar months between two dates, counting month boundaries crossed
/// and ignoring the day of month. Never negative.
pub fn month_diff(first: NaiveDate, last: NaiveDate) -> u32 {
    let months = (last.year() - first.year()) * 12 + last.month() as i32 - first.month() as i32;
    months.max(0) as u32
}

/// Service length as (months, years to 2 dp, `"{y}y {m}m"` label).
pub fn service_length(first: NaiveDate, last: NaiveDate) -> (u32, f64, String) {
    let months = month_diff(first, last);
    let years = (f64::from(months) / 12.0 * 100.0).round() / 100.0;
    let label = format!("{}y {}m", months / 12, months % 12);
    (months, years, label)
}

/// Computes dependency profiles for one vendor.
#[derive(Debug, Clone)]
pub struct Aggregator {
    vendor: AgentName,
    top_forms: usize,
    parallel: bool,
}

impl Aggregator {
    /// Create an aggregator for `vendor`, listing `top_forms` form types.
    pub fn new(vendor: &str, top_forms: usize) -> Self {
        Self {
            vendor: AgentName::new(vendor),
            top_forms,
            parallel: false,
        }
    }

    /// Build from the loaded configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(&config.vendor.name, config.aggregation.top_form_types)
            .with_parallel(config.aggregation.parallel)
    }

    /// Profile entity groups on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Normalized vendor key.
    pub fn vendor_key(&self) -> &str {
        &self.vendor.key
    }

    fn is_vendor(&self, record: &FilingRecord) -> bool {
        record
            .agent_group
            .as_deref()
            .is_some_and(|agent| self.vendor.matches(agent))
    }

    /// Profile every entity with at least one vendor filing, in report order.
    pub fn profile_all(&self, records: &[FilingRecord], key: EntityKey) -> Vec<EntityProfile> {
        let groups: Vec<(GroupKey, Vec<&FilingRecord>)> =
            group_records(records, key).into_iter().collect();
        let group_count = groups.len();

        let build = |(group, members): &(GroupKey, Vec<&FilingRecord>)| {
            self.profile_entity(group, members)
        };

        let mut profiles: Vec<EntityProfile> = if self.parallel {
            groups.par_iter().filter_map(build).collect()
        } else {
            groups.iter().filter_map(build).collect()
        };

        sort_profiles(&mut profiles);

        info!(
            "Profiled {} of {} entities with {} filings",
            profiles.len(),
            group_count,
            self.vendor.raw.trim()
        );

        profiles
    }

    /// Profile a single entity, or `None` if it has no vendor filings.
    pub fn profile_entity(
        &self,
        group: &GroupKey,
        records: &[&FilingRecord],
    ) -> Option<EntityProfile> {
        let vendor_records: Vec<&FilingRecord> = records
            .iter()
            .copied()
            .filter(|record| self.is_vendor(record))
            .collect();

        if vendor_records.is_empty() {
            return None;
        }

        let total_filings = records.len() as u64;
        let vendor_filings = vendor_records.len() as u64;
        let vendor_share = if total_filings == 0 {
            0.0
        } else {
            vendor_filings as f64 / total_filings as f64
        };

        let breakout = rank_agents(records);
        let vendor_count = breakout
            .iter()
            .find(|tally| tally.key == self.vendor.key)
            .map_or(0, |tally| tally.filings);
        let max_other = breakout
            .iter()
            .filter(|tally| tally.key != self.vendor.key)
            .map(|tally| tally.filings)
            .max()
            .unwrap_or(0);
        let other_agent_count = breakout
            .iter()
            .filter(|tally| tally.key != self.vendor.key)
            .count();
        let (top_agent_by_volume, top_agent_filing_count) = breakout
            .first()
            .map(|tally| (tally.display.clone(), tally.filings))
            .unwrap_or_default();

        // Latest record carrying an id; equal dates resolve to the smaller id.
        let entity_id = latest_with(
            records
                .iter()
                .copied()
                .filter(|record| !is_blank(record.entity_id.as_deref())),
            |a, b| b.entity_id.cmp(&a.entity_id),
        )
        .and_then(|record| record.entity_id.as_deref())
        .map(|id| id.trim().to_string())
        .unwrap_or_default();

        // Funds are keyed by id; show the name from their latest filing.
        let entity_name = if group.family.is_empty() {
            group.entity.clone()
        } else {
            latest_with(records.iter().copied(), |a, b| b.entity_name.cmp(&a.entity_name))
                .and_then(|record| record.entity_name.clone())
                .unwrap_or_else(|| group.entity.clone())
        };

        let vendor_first_date = vendor_records.iter().map(|r| r.filing_date).min()?;
        let vendor_last_date = vendor_records.iter().map(|r| r.filing_date).max()?;
        let vendor_last_form_type = latest_with(vendor_records.iter().copied(), |a, b| {
            cmp_form_desc(a, b)
        })
        .and_then(|record| record.form_type.as_deref())
        .map(|form| form.trim().to_string())
        .unwrap_or_default();

        let vendor_top_form_types = join_form_types(&top_form_types(
            vendor_records.iter().copied(),
            self.top_forms,
        ));

        let (service_months, service_years, service_length_label) =
            service_length(vendor_first_date, vendor_last_date);

        debug!(
            "{}: {}/{} vendor filings, {} other agents, top agent {}",
            entity_name, vendor_filings, total_filings, other_agent_count, top_agent_by_volume
        );

        Some(EntityProfile {
            entity_name,
            entity_id,
            family_name: (!group.family.is_empty()).then(|| group.family.clone()),
            total_filings,
            vendor_filings,
            vendor_share,
            other_agent_count,
            top_agent_by_volume,
            top_agent_filing_count,
            is_vendor_dominant: vendor_count > max_other,
            vendor_first_date,
            vendor_last_date,
            vendor_last_form_type,
            vendor_top_form_types,
            service_months,
            service_years,
            service_length_label,
            agent_breakout: breakout,
        })
    }
}

/// Equal-recency vendor records resolve to the smallest form type,
/// with a missing form type losing to any present one.
fn cmp_form_desc(a: &FilingRecord, b: &FilingRecord) -> Ordering {
    match (a.form_type.as_deref(), b.form_type.as_deref()) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Report order: vendor share descending, vendor filings descending,
/// entity name ascending. Remaining ties fall back to id then family.
pub fn sort_profiles(profiles: &mut [EntityProfile]) {
    profiles.sort_by(|a, b| {
        b.vendor_share
            .total_cmp(&a.vendor_share)
            .then_with(|| b.vendor_filings.cmp(&a.vendor_filings))
            .then_with(|| a.entity_name.cmp(&b.entity_name))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
            .then_with(|| a.family_name.cmp(&b.family_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, record, repeat, with_form, with_id};

    const VENDOR: &str = "QUALITY EDGAR SOLUTIONS";

    fn aggregator() -> Aggregator {
        Aggregator::new(VENDOR, 3)
    }

    fn acme_records() -> Vec<FilingRecord> {
        let mut records = Vec::new();
        for (i, mut r) in repeat("Acme Corp", "  quality edgar solutions ", "2020-01-15", 80)
            .into_iter()
            .enumerate()
        {
            r.form_type = Some(if i % 4 == 0 { "8-K" } else { "10-Q" }.to_string());
            records.push(r);
        }
        records.push(with_form(
            record("Acme Corp", "Quality Edgar Solutions", "2023-06-30"),
            "10-K",
        ));
        // Keep the vendor at 80 filings in total.
        records.remove(0);
        records.extend(repeat("Acme Corp", "Donnelley", "2021-01-01", 20));
        records
    }

    fn profile_of(records: &[FilingRecord], name: &str) -> EntityProfile {
        aggregator()
            .profile_all(records, EntityKey::Company)
            .into_iter()
            .find(|p| p.entity_name == name)
            .unwrap()
    }

    #[test]
    fn test_acme_scenario() {
        let records = acme_records();
        let profile = profile_of(&records, "Acme Corp");

        assert_eq!(profile.total_filings, 100);
        assert_eq!(profile.vendor_filings, 80);
        assert!((profile.vendor_share - 0.80).abs() < 1e-12);
        assert!(profile.is_vendor_dominant);
        assert_eq!(profile.other_agent_count, 1);
        assert_eq!(profile.vendor_last_form_type, "10-K");
        assert_eq!(profile.vendor_last_date, date("2023-06-30"));
        assert_eq!(normalize_agent(&profile.top_agent_by_volume), VENDOR);
        assert_eq!(profile.top_agent_filing_count, 80);
    }

    #[test]
    fn test_only_vendor_filings() {
        let records = repeat("Solo Inc", "Quality Edgar Solutions", "2024-01-01", 5);
        let profile = profile_of(&records, "Solo Inc");

        assert_eq!(profile.total_filings, 5);
        assert_eq!(profile.vendor_filings, 5);
        assert_eq!(profile.other_agent_count, 0);
        assert_eq!(profile.top_agent_by_volume, "Quality Edgar Solutions");
        assert!(profile.is_vendor_dominant);
        assert_eq!(profile.vendor_share, 1.0);
    }

    #[test]
    fn test_inclusion_requires_vendor_record() {
        let mut records = repeat("Never Used", "Donnelley", "2024-01-01", 10);
        records.push(record("Used Once", "quality edgar solutions", "2024-01-01"));
        records.push(record("Used Once", "Toppan Merrill", "2024-01-02"));
        // Close but not equal after normalization.
        records.push(record("Near Miss", "Quality Edgar Solutions LLC", "2024-01-01"));

        let profiles = aggregator().profile_all(&records, EntityKey::Company);
        let names: Vec<_> = profiles.iter().map(|p| p.entity_name.as_str()).collect();
        assert_eq!(names, vec!["Used Once"]);
    }

    #[test]
    fn test_share_and_count_bounds() {
        let mut records = acme_records();
        records.extend(repeat("Beta", "Other", "2024-01-01", 7));
        records.push(record("Beta", VENDOR, "2024-03-01"));

        for profile in aggregator().profile_all(&records, EntityKey::Company) {
            assert!(profile.vendor_filings <= profile.total_filings);
            assert!((0.0..=1.0).contains(&profile.vendor_share));
        }
    }

    #[test]
    fn test_dominance_flips_when_other_agent_overtakes() {
        let mut records = repeat("Gamma", VENDOR, "2024-01-01", 4);
        records.extend(repeat("Gamma", "Agent A", "2024-01-01", 3));
        records.extend(repeat("Gamma", "Agent B", "2024-01-01", 3));
        records.extend(repeat("Gamma", "Agent C", "2024-01-01", 3));

        let profile = profile_of(&records, "Gamma");
        // Dominant below 50% share: every other agent is smaller.
        assert!(profile.vendor_share < 0.5);
        assert!(profile.is_vendor_dominant);

        records.extend(repeat("Gamma", "Agent A", "2024-02-01", 2));
        let profile = profile_of(&records, "Gamma");
        assert!(!profile.is_vendor_dominant);
    }

    #[test]
    fn test_equal_counts_are_not_dominant() {
        let mut records = repeat("Delta", VENDOR, "2024-01-01", 3);
        records.extend(repeat("Delta", "Other", "2024-01-01", 3));
        assert!(!profile_of(&records, "Delta").is_vendor_dominant);
    }

    #[test]
    fn test_top_agent_tie_break_is_lexicographic() {
        let mut records = repeat("Echo", "Zeta Filings", "2024-01-01", 3);
        records.extend(repeat("Echo", "Alpha Filings", "2024-01-01", 3));
        records.push(record("Echo", VENDOR, "2024-01-01"));

        let first = profile_of(&records, "Echo");
        assert_eq!(first.top_agent_by_volume, "Alpha Filings");

        records.reverse();
        let second = profile_of(&records, "Echo");
        assert_eq!(second.top_agent_by_volume, "Alpha Filings");
        assert_eq!(first.agent_breakout, second.agent_breakout);
    }

    #[test]
    fn test_rank_agents_merges_spellings() {
        let records = vec![
            record("X", " donnelley ", "2024-01-01"),
            record("X", "DONNELLEY", "2024-01-02"),
            record("X", "DONNELLEY", "2024-01-03"),
            record("X", "Workiva", "2024-01-04"),
        ];
        let refs: Vec<&FilingRecord> = records.iter().collect();

        let ranked = rank_agents(&refs);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].key, "DONNELLEY");
        assert_eq!(ranked[0].display, "DONNELLEY");
        assert_eq!(ranked[0].filings, 3);
        assert_eq!(ranked[1].key, "WORKIVA");
    }

    #[test]
    fn test_entity_id_comes_from_latest_non_null() {
        let records = vec![
            with_id(record("Foxtrot", VENDOR, "2020-01-01"), "0000111"),
            with_id(record("Foxtrot", VENDOR, "2022-01-01"), "0000222"),
            record("Foxtrot", VENDOR, "2024-01-01"),
        ];
        assert_eq!(profile_of(&records, "Foxtrot").entity_id, "0000222");

        let no_ids = vec![record("Golf", VENDOR, "2024-01-01")];
        assert_eq!(profile_of(&no_ids, "Golf").entity_id, "");
    }

    #[test]
    fn test_top_form_types() {
        let records = vec![
            with_form(record("H", VENDOR, "2024-01-01"), "8-K"),
            with_form(record("H", VENDOR, "2024-01-02"), "10-Q"),
            with_form(record("H", VENDOR, "2024-01-03"), "10-Q"),
            with_form(record("H", VENDOR, "2024-01-04"), "8-K"),
            with_form(record("H", VENDOR, "2024-01-05"), "S-1"),
            with_form(record("H", VENDOR, "2024-01-06"), "10-K"),
            record("H", VENDOR, "2024-01-07"),
        ];

        let ranked = top_form_types(&records, 3);
        assert_eq!(
            ranked,
            vec![
                ("10-Q".to_string(), 2),
                ("8-K".to_string(), 2),
                ("10-K".to_string(), 1)
            ]
        );
        assert_eq!(join_form_types(&ranked), "10-Q, 8-K, 10-K");
        // The undated form type is still the latest vendor record.
        assert_eq!(profile_of(&records, "H").vendor_last_form_type, "");
    }

    #[test]
    fn test_month_diff_is_calendar_based() {
        assert_eq!(month_diff(date("2024-01-31"), date("2024-02-01")), 1);
        assert_eq!(month_diff(date("2024-01-01"), date("2024-01-31")), 0);
        assert_eq!(month_diff(date("2019-11-15"), date("2024-02-10")), 51);
        assert_eq!(month_diff(date("2024-05-01"), date("2024-01-01")), 0);
    }

    #[test]
    fn test_service_length_label_round_trips() {
        for months in [0u32, 1, 11, 12, 13, 51, 120, 239] {
            let first = date("2000-01-10");
            let last = first + chrono::Months::new(months);
            let (total, years, label) = service_length(first, last);
            assert_eq!(total, months);

            let (y, m) = label.trim_end_matches('m').split_once("y ").unwrap();
            let rebuilt = y.parse::<u32>().unwrap() * 12 + m.parse::<u32>().unwrap();
            assert_eq!(rebuilt, months);
            assert!(m.parse::<u32>().unwrap() < 12);
            assert_eq!(years, (f64::from(months) / 12.0 * 100.0).round() / 100.0);
        }

        let (_, years, label) = service_length(date("2019-11-15"), date("2024-02-10"));
        assert_eq!(label, "4y 3m");
        assert_eq!(years, 4.25);
    }

    #[test]
    fn test_output_order() {
        let mut records = Vec::new();
        // Share 1.0, 2 filings.
        records.extend(repeat("Bravo", VENDOR, "2024-01-01", 2));
        // Share 1.0, 2 filings; name sorts first.
        records.extend(repeat("Alpha", VENDOR, "2024-01-01", 2));
        // Share 1.0, 5 filings.
        records.extend(repeat("Charlie", VENDOR, "2024-01-01", 5));
        // Share 0.5.
        records.extend(repeat("Able", VENDOR, "2024-01-01", 1));
        records.push(record("Able", "Other", "2024-01-01"));

        let names: Vec<_> = aggregator()
            .profile_all(&records, EntityKey::Company)
            .into_iter()
            .map(|p| p.entity_name)
            .collect();
        assert_eq!(names, vec!["Charlie", "Alpha", "Bravo", "Able"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut records = acme_records();
        for i in 0..50 {
            let name = format!("Entity {:02}", i);
            records.extend(repeat(&name, VENDOR, "2023-01-01", i % 7 + 1));
            records.extend(repeat(&name, "Other", "2023-01-01", i % 5));
        }

        let sequential = aggregator().profile_all(&records, EntityKey::Company);
        let parallel = aggregator()
            .with_parallel(true)
            .profile_all(&records, EntityKey::Company);

        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.entity_name, b.entity_name);
            assert_eq!(a.vendor_filings, b.vendor_filings);
            assert_eq!(a.agent_breakout, b.agent_breakout);
        }
    }

    #[test]
    fn test_fund_key_groups_within_family() {
        let mut a = with_id(record("Fund A", VENDOR, "2024-01-01"), "S1");
        a.family_name = Some(" Big Family ".into());
        let mut renamed = with_id(record("Fund A (renamed)", "Other", "2024-02-01"), "S1");
        renamed.family_name = Some("Big Family".into());
        let mut b = with_id(record("Fund B", VENDOR, "2024-01-01"), "S2");
        b.family_name = Some("Big Family".into());

        let profiles = aggregator().profile_all(&[a, renamed, b], EntityKey::Fund);
        assert_eq!(profiles.len(), 2);

        let fund_a = profiles.iter().find(|p| p.entity_id == "S1").unwrap();
        assert_eq!(fund_a.entity_name, "Fund A (renamed)");
        assert_eq!(fund_a.family_name.as_deref(), Some("Big Family"));
        assert_eq!(fund_a.total_filings, 2);
    }
}
