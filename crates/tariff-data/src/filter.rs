//! Filter engine: selects the records matching a [`FilterSpec`].

use tariff_core::models::{FilterSpec, TariffRecord};

/// Whether `record` satisfies every clause of `spec`.
///
/// Free-function form of [`FilterSpec::matches`], convenient as an iterator
/// predicate.
pub fn matches(spec: &FilterSpec, record: &TariffRecord) -> bool {
    spec.matches(record)
}

/// Order-preserving subsequence of `records` matching `spec`.
///
/// An empty result is a valid answer, not an error.
pub fn filter(records: &[TariffRecord], spec: &FilterSpec) -> Vec<TariffRecord> {
    records
        .iter()
        .filter(|r| matches(spec, r))
        .cloned()
        .collect()
}

/// Borrowing variant of [`filter`].
pub fn filter_refs<'a>(records: &'a [TariffRecord], spec: &FilterSpec) -> Vec<&'a TariffRecord> {
    records.iter().filter(|r| matches(spec, r)).collect()
}
