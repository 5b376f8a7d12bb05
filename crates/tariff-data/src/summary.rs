//! Grouped summary statistics per `(exporter, day)`.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariff_core::formatting::{finite_or_zero, format_percent, to_fixed_safe};
use tariff_core::models::{ShareMode, TariffRecord};
use tariff_core::normalizer::normalize_fraction;
use tariff_core::time_utils::date_label;

// ── SummaryRow ────────────────────────────────────────────────────────────────

/// One summary-table row for an exporter on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub exporter: String,
    /// `M/D/YYYY` form of `date`.
    pub date_label: String,
    pub date: NaiveDate,
    /// Unweighted mean tariff, percent.
    pub simple_average_tariff: f64,
    /// Trade-value-weighted mean tariff, percent; `0` without trade value.
    pub weighted_average_tariff: f64,
    /// Sum of affected trade value, US dollars.
    pub affected_trade_value_total: f64,
    /// Trade-value-weighted affected share, `0..=100`.
    pub weighted_affected_share_percent: f64,
    /// Mean affected tariff-line share, `0..=100`.
    pub average_line_share_percent: f64,
    /// Number of records folded into this row.
    pub record_count: usize,
}

impl SummaryRow {
    /// Display strings in column order: exporter, date, simple average,
    /// weighted average, affected value, weighted share, line share.
    ///
    /// ```
    /// # use chrono::NaiveDate;
    /// use tariff_data::summary::SummaryRow;
    ///
    /// let row = SummaryRow {
    ///     exporter: "China".into(),
    ///     date_label: "4/9/2025".into(),
    ///     date: NaiveDate::from_ymd_opt(2025, 4, 9).unwrap(),
    ///     simple_average_tariff: 6.0,
    ///     weighted_average_tariff: 8.0,
    ///     affected_trade_value_total: 1234.4,
    ///     weighted_affected_share_percent: 25.0,
    ///     average_line_share_percent: f64::NAN,
    ///     record_count: 2,
    /// };
    /// assert_eq!(
    ///     row.to_display(),
    ///     ["China", "4/9/2025", "6.00", "8.00", "1234", "25.00%", "0.00%"]
    /// );
    /// ```
    pub fn to_display(&self) -> [String; 7] {
        [
            self.exporter.clone(),
            self.date_label.clone(),
            to_fixed_safe(self.simple_average_tariff, 2),
            to_fixed_safe(self.weighted_average_tariff, 2),
            to_fixed_safe(self.affected_trade_value_total, 0),
            format_percent(self.weighted_affected_share_percent, 2),
            format_percent(self.average_line_share_percent, 2),
        ]
    }
}

/// Column headers matching [`SummaryRow::to_display`].
pub const SUMMARY_HEADERS: [&str; 7] = [
    "Exporter",
    "Date",
    "Avg Tariff (%)",
    "Weighted Avg Tariff (%)",
    "Affected Trade Value (USD)",
    "Affected Trade Share (%)",
    "Affected Tariff Line Share (%)",
];

// ── Accumulation ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GroupTotals {
    count: usize,
    tariff_sum: f64,
    trade_value_sum: f64,
    weighted_tariff_sum: f64,
    affected_value_sum: f64,
    weighted_share_sum: f64,
    line_share_sum: f64,
}

impl GroupTotals {
    fn add(&mut self, record: &TariffRecord) {
        let tv = record.trade_value_usd;
        self.count += 1;
        self.tariff_sum += record.tariff_rate;
        self.trade_value_sum += tv;
        self.weighted_tariff_sum += record.tariff_rate * tv;
        self.affected_value_sum += record.affected_trade_value_usd;
        self.weighted_share_sum += normalize_fraction(record.affected_trade_share) * tv;
        self.line_share_sum += normalize_fraction(record.affected_line_share);
    }

    fn weighted(&self, numerator: f64) -> f64 {
        if self.trade_value_sum == 0.0 {
            0.0
        } else {
            numerator / self.trade_value_sum
        }
    }

    fn into_row(self, exporter: String, date: NaiveDate, share_mode: ShareMode) -> SummaryRow {
        let n = self.count as f64;
        let (weighted_share, line_share) = match share_mode {
            ShareMode::Computed => (
                100.0 * self.weighted(self.weighted_share_sum),
                100.0 * self.line_share_sum / n,
            ),
            ShareMode::FixedFull => (100.0, 100.0),
        };

        SummaryRow {
            exporter,
            date_label: date_label(date),
            date,
            simple_average_tariff: finite_or_zero(self.tariff_sum / n),
            weighted_average_tariff: finite_or_zero(self.weighted(self.weighted_tariff_sum)),
            affected_trade_value_total: finite_or_zero(self.affected_value_sum),
            weighted_affected_share_percent: finite_or_zero(weighted_share),
            average_line_share_percent: finite_or_zero(line_share),
            record_count: self.count,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Group `records` by `(exporter, day)` and compute the summary statistics.
///
/// Rows come out in the order each group was first seen. Records without a
/// date are skipped. With [`ShareMode::FixedFull`] both share columns are the
/// literal `100.0`.
pub fn summarize<'a, I>(records: I, share_mode: ShareMode) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a TariffRecord>,
{
    let mut order: Vec<(String, NaiveDate)> = Vec::new();
    let mut groups: HashMap<(String, NaiveDate), GroupTotals> = HashMap::new();

    for record in records {
        let Some(day) = record.day() else {
            continue;
        };
        let key = (record.exporter.clone(), day);
        groups
            .entry(key)
            .or_insert_with_key(|k| {
                order.push(k.clone());
                GroupTotals::default()
            })
            .add(record);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let totals = groups.remove(&key)?;
            let (exporter, day) = key;
            Some(totals.into_row(exporter, day, share_mode))
        })
        .collect()
}

/// Stable re-sort of summary rows by date.
pub fn sort_by_date(rows: &mut [SummaryRow]) {
    rows.sort_by_key(|r| r.date);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
