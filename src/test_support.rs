//! Record builders shared by unit tests.

use crate::models::FilingRecord;
use chrono::NaiveDate;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A minimal filing by `entity` through `agent` on `filed`.
pub fn record(entity: &str, agent: &str, filed: &str) -> FilingRecord {
    FilingRecord {
        entity_name: Some(entity.to_string()),
        agent_group: Some(agent.to_string()),
        filing_date: date(filed),
        ..FilingRecord::default()
    }
}

pub fn with_form(mut r: FilingRecord, form: &str) -> FilingRecord {
    r.form_type = Some(form.to_string());
    r
}

pub fn with_id(mut r: FilingRecord, id: &str) -> FilingRecord {
    r.entity_id = Some(id.to_string());
    r
}

/// `count` filings through `agent`, one per day from `start`.
pub fn repeat(entity: &str, agent: &str, start: &str, count: usize) -> Vec<FilingRecord> {
    let first = date(start);
    (0..count)
        .map(|i| {
            let mut r = record(entity, agent, start);
            r.filing_date = first + chrono::Duration::days(i as i64);
            r
        })
        .collect()
}
