//! "Most recent wins" ordering over filing records.

use crate::models::FilingRecord;
use std::cmp::Ordering;

/// Orders records oldest to newest by filing date, then index date,
/// then load timestamp. Missing optional values sort as oldest.
pub fn cmp_recency(a: &FilingRecord, b: &FilingRecord) -> Ordering {
    a.filing_date
        .cmp(&b.filing_date)
        .then_with(|| a.index_date.cmp(&b.index_date))
        .then_with(|| a.load_timestamp.cmp(&b.load_timestamp))
}

/// Most recent record of the iterator.
///
/// Exact ties keep the later element in iteration order.
pub fn latest<'a, I>(records: I) -> Option<&'a FilingRecord>
where
    I: IntoIterator<Item = &'a FilingRecord>,
{
    records.into_iter().max_by(|a, b| cmp_recency(a, b))
}

/// Most recent record, with `tie` ordering records whose dates and
/// timestamps are all equal. The greater record under `tie` wins.
pub fn latest_with<'a, I, F>(records: I, tie: F) -> Option<&'a FilingRecord>
where
    I: IntoIterator<Item = &'a FilingRecord>,
    F: Fn(&FilingRecord, &FilingRecord) -> Ordering,
{
    records
        .into_iter()
        .max_by(|a, b| cmp_recency(a, b).then_with(|| tie(a, b)))
}
