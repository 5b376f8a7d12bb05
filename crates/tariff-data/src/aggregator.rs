//! Time-bucketed aggregation for charting.
//!
//! Records are bucketed by calendar day and averaged per bucket, either into a
//! single aggregated `"World"` series or one series per key (usually the
//! exporter). Every series is aligned to the same date-sorted label axis.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariff_core::formatting::finite_or_zero;
use tariff_core::models::{FilterSpec, TariffRecord, WORLD};
use tariff_core::time_utils::date_label;

// ── TimeSeries ────────────────────────────────────────────────────────────────

/// Chart-ready series sharing one label axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// `M/D/YYYY` labels in ascending date order.
    pub labels: Vec<String>,
    /// The dates behind `labels`, index for index.
    pub dates: Vec<NaiveDate>,
    /// Per-date means keyed by series name; `None` marks a gap that must not
    /// be bridged when drawn.
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

impl TimeSeries {
    /// `true` when there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.series.is_empty()
    }

    /// Values of one series, if present.
    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(Vec::as_slice)
    }
}

// ── Running mean ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: u32,
}

impl MeanAccumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// `None` for an empty bucket; an overflowing sum reads as `0`.
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(finite_or_zero(self.sum / f64::from(self.count)))
        }
    }
}

// ── build_series ──────────────────────────────────────────────────────────────

/// Bucket `records` by calendar day and average `value_fn` per bucket.
///
/// When `series_key_fn` yields `None` for every dated record the output is a
/// single `"World"` series covering all records. Otherwise records are
/// partitioned by key and each partition is averaged separately; days with no
/// data for a partition are `None`. In a mixed input, records without a key
/// still contribute their day to the label axis but to no series.
///
/// Records without a date are ignored. Empty input gives an empty
/// [`TimeSeries`].
///
/// # Examples
///
/// ```
/// # use std::collections::BTreeMap;
/// # use chrono::NaiveDate;
/// # use tariff_core::models::TariffRecord;
/// use tariff_data::aggregator::build_series;
///
/// # fn rec(d: u32, v: f64) -> TariffRecord {
/// #     TariffRecord {
/// #         importer: String::new(), exporter: String::new(),
/// #         classification_code: String::new(),
/// #         date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0),
/// #         tariff_rate: v, trade_value_usd: 0.0, affected_trade_value_usd: 0.0,
/// #         affected_trade_share: 0.0, affected_line_share: 0.0,
/// #         metadata: BTreeMap::new(),
/// #     }
/// # }
/// let records = vec![rec(1, 10.0), rec(1, 20.0), rec(2, 5.0)];
/// let ts = build_series(&records, |_| None, |r| r.tariff_rate);
///
/// assert_eq!(ts.labels, vec!["1/1/2024", "1/2/2024"]);
/// assert_eq!(ts.series["World"], vec![Some(15.0), Some(5.0)]);
/// ```
pub fn build_series<'a, I, K, V>(records: I, series_key_fn: K, value_fn: V) -> TimeSeries
where
    I: IntoIterator<Item = &'a TariffRecord>,
    K: Fn(&TariffRecord) -> Option<String>,
    V: Fn(&TariffRecord) -> f64,
{
    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut world: HashMap<NaiveDate, MeanAccumulator> = HashMap::new();
    let mut keyed: BTreeMap<String, HashMap<NaiveDate, MeanAccumulator>> = BTreeMap::new();

    for record in records {
        let Some(day) = record.day() else {
            continue;
        };
        days.insert(day);

        let value = value_fn(record);
        world.entry(day).or_default().add(value);
        if let Some(key) = series_key_fn(record) {
            keyed.entry(key).or_default().entry(day).or_default().add(value);
        }
    }

    if days.is_empty() {
        return TimeSeries::default();
    }

    // BTreeSet iteration is already ascending by date, not by label text.
    let dates: Vec<NaiveDate> = days.into_iter().collect();
    let labels: Vec<String> = dates.iter().copied().map(date_label).collect();

    let align = |buckets: &HashMap<NaiveDate, MeanAccumulator>| -> Vec<Option<f64>> {
        dates
            .iter()
            .map(|d| buckets.get(d).and_then(MeanAccumulator::mean))
            .collect()
    };

    let mut series = BTreeMap::new();
    if keyed.is_empty() {
        series.insert(WORLD.to_string(), align(&world));
    } else {
        for (key, buckets) in &keyed {
            series.insert(key.clone(), align(buckets));
        }
    }

    TimeSeries {
        labels,
        dates,
        series,
    }
}

/// Tariff-rate series for a filter selection.
///
/// World mode (no exporters selected) aggregates every record into one
/// series; otherwise there is one series per exporter present in `records`.
pub fn series_for_filter<'a, I>(records: I, spec: &FilterSpec) -> TimeSeries
where
    I: IntoIterator<Item = &'a TariffRecord>,
{
    if spec.is_world_mode() {
        build_series(records, |_| None, |r| r.tariff_rate)
    } else {
        build_series(records, |r| Some(r.exporter.clone()), |r| r.tariff_rate)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
