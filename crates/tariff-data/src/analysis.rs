//! Top-level analysis pipeline.
//!
//! Runs filter → series → summary → exposure over one dataset and returns a
//! [`DashboardView`] ready for any render sink.

use serde::{Deserialize, Serialize};
use tariff_core::models::{Classification, FilterSpec, TariffRecord, WORLD};
use tariff_core::time_utils::date_label;
use tracing::debug;

use crate::aggregator::{series_for_filter, TimeSeries};
use crate::filter::filter_refs;
use crate::summary::{sort_by_date, summarize, SummaryRow};

// ── Chart title ───────────────────────────────────────────────────────────────

/// Title for the tariff chart.
///
/// ```
/// use tariff_core::models::Classification;
/// use tariff_data::analysis::chart_title;
///
/// assert_eq!(chart_title(Classification::Hs6, Some("850440")), "HS6 Tariff Line 850440");
/// assert_eq!(chart_title(Classification::Isic, None), "ISIC4 2 Digit Tariff Line");
/// ```
pub fn chart_title(classification: Classification, code: Option<&str>) -> String {
    match code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => format!("{} {}", classification.line_label(), code),
        None => classification.line_label().to_string(),
    }
}

// ── ExposureReport ────────────────────────────────────────────────────────────

/// Overview of affected trade for one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureReport {
    pub importer: String,
    /// `"World"`, the single exporter, or `"N exporters"`.
    pub exporter_label: String,
    /// e.g. `"HS6 850440"` or `"ISIC All"`.
    pub classification_label: String,
    /// `"All Dates"` or `"<from> → <to>"` with `…` for an open end.
    pub date_range_label: String,
    /// Records carrying a positive affected trade value.
    pub affected_actions: usize,
}

impl ExposureReport {
    /// Build the report for already-filtered `records`.
    ///
    /// Every record counts, dated or not. Without date bounds in `spec`,
    /// records whose date failed to parse are included in the report and in
    /// `affected_actions`; any bound excludes them upstream in the filter.
    ///
    /// Returns `None` when there are no records to report on.
    pub fn build<'a, I>(records: I, spec: &FilterSpec, classification: Classification) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TariffRecord>,
    {
        let mut total = 0usize;
        let mut affected = 0usize;
        for record in records {
            total += 1;
            if record.is_affected() {
                affected += 1;
            }
        }
        if total == 0 {
            return None;
        }

        let exporter_label = match spec.exporters.len() {
            0 => WORLD.to_string(),
            1 => spec.exporters.iter().next().cloned().unwrap_or_default(),
            n => format!("{n} exporters"),
        };

        let classification_label = format!(
            "{} {}",
            classification.short_label(),
            spec.classification_code.as_deref().unwrap_or("All")
        );

        let date_range_label = if spec.has_date_bounds() {
            let open = || "…".to_string();
            format!(
                "{} → {}",
                spec.date_from.map(date_label).unwrap_or_else(open),
                spec.date_to.map(date_label).unwrap_or_else(open)
            )
        } else {
            "All Dates".to_string()
        };

        Some(Self {
            importer: spec.importer.clone(),
            exporter_label,
            classification_label,
            date_range_label,
            affected_actions: affected,
        })
    }
}

// ── DashboardView ─────────────────────────────────────────────────────────────

/// Everything a render sink needs for one filter selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub spec: FilterSpec,
    pub classification: Classification,
    pub title: String,
    pub chart: TimeSeries,
    pub summary: Vec<SummaryRow>,
    /// `None` when nothing matched the selection.
    pub exposure: Option<ExposureReport>,
    /// Number of records that matched the selection, including undated
    /// records when the selection has no date bounds.
    pub record_count: usize,
}

impl DashboardView {
    /// `true` when the selection matched no records.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

/// Run the full pipeline for one selection over one dataset.
///
/// `records` must be the dataset of `classification`; the share columns of
/// the summary follow [`Classification::share_mode`]. Summary rows are
/// ordered by date, ties keeping first-occurrence order.
pub fn analyze(
    records: &[TariffRecord],
    spec: &FilterSpec,
    classification: Classification,
) -> DashboardView {
    let matched = filter_refs(records, spec);
    debug!(
        "Selection matched {} of {} {} records",
        matched.len(),
        records.len(),
        classification
    );

    let chart = series_for_filter(matched.iter().copied(), spec);
    let mut summary = summarize(matched.iter().copied(), classification.share_mode());
    sort_by_date(&mut summary);
    let exposure = ExposureReport::build(matched.iter().copied(), spec, classification);

    DashboardView {
        spec: spec.clone(),
        classification,
        title: chart_title(classification, spec.classification_code.as_deref()),
        chart,
        summary,
        exposure,
        record_count: matched.len(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn rec(exporter: &str, code: &str, date: NaiveDate, tariff: f64, affected: f64) -> TariffRecord {
        TariffRecord {
            importer: "United States".to_string(),
            exporter: exporter.to_string(),
            classification_code: code.to_string(),
            date: date.and_hms_opt(0, 0, 0),
            tariff_rate: tariff,
            trade_value_usd: 1_000.0,
            affected_trade_value_usd: affected,
            affected_trade_share: 0.5,
            affected_line_share: 0.5,
            metadata: Default::default(),
        }
    }

    fn sample() -> Vec<TariffRecord> {
        vec![
            rec("China", "850440", day(4, 5), 10.0, 0.0),
            rec("China", "850440", day(4, 9), 34.0, 5_000.0),
            rec("Mexico", "850440", day(4, 9), 0.0, 0.0),
            rec("Mexico", "870323", day(4, 9), 25.0, 2_000.0),
        ]
    }

    // ── chart_title ───────────────────────────────────────────────────────────

    #[test]
    fn test_chart_title_variants() {
        assert_eq!(chart_title(Classification::Isic, Some("26")), "ISIC4 2 Digit Tariff Line 26");
        assert_eq!(chart_title(Classification::Hs6, None), "HS6 Tariff Line");
        assert_eq!(chart_title(Classification::Hs6, Some("  ")), "HS6 Tariff Line");
    }

    // ── ExposureReport ────────────────────────────────────────────────────────

    #[test]
    fn test_exposure_report_world_all() {
        let records = sample();
        let report = ExposureReport::build(&records, &FilterSpec::world(), Classification::Hs6).unwrap();
        assert_eq!(report.importer, "World");
        assert_eq!(report.exporter_label, "World");
        assert_eq!(report.classification_label, "HS6 All");
        assert_eq!(report.date_range_label, "All Dates");
        assert_eq!(report.affected_actions, 2);
    }

    #[test]
    fn test_exposure_report_labels() {
        let records = sample();
        let spec = FilterSpec::world()
            .with_importer("United States")
            .with_code(Some("26"))
            .with_exporters(["China", "Mexico"])
            .with_date_range(Some(day(4, 1)), None);
        let report = ExposureReport::build(&records, &spec, Classification::Isic).unwrap();
        assert_eq!(report.importer, "United States");
        assert_eq!(report.exporter_label, "2 exporters");
        assert_eq!(report.classification_label, "ISIC 26");
        assert_eq!(report.date_range_label, "4/1/2025 → …");
    }

    #[test]
    fn test_exposure_report_single_exporter() {
        let records = sample();
        let spec = FilterSpec::world().with_exporters(["Mexico"]);
        let report = ExposureReport::build(&records, &spec, Classification::Hs6).unwrap();
        assert_eq!(report.exporter_label, "Mexico");
    }

    #[test]
    fn test_exposure_report_counts_undated_without_bounds() {
        let mut undated = rec("China", "850440", day(4, 9), 5.0, 1_000.0);
        undated.date = None;
        let records = vec![undated, rec("China", "850440", day(4, 9), 5.0, 0.0)];

        let view = analyze(&records, &FilterSpec::world(), Classification::Hs6);
        assert_eq!(view.record_count, 2);
        assert_eq!(view.exposure.unwrap().affected_actions, 1);
        assert_eq!(view.summary.len(), 1);

        let bounded = FilterSpec::world().with_date_range(Some(day(4, 1)), None);
        let view = analyze(&records, &bounded, Classification::Hs6);
        assert_eq!(view.record_count, 1);
        assert_eq!(view.exposure.unwrap().affected_actions, 0);
    }

    #[test]
    fn test_exposure_report_empty_is_none() {
        let none: Vec<TariffRecord> = Vec::new();
        assert!(ExposureReport::build(&none, &FilterSpec::world(), Classification::Hs6).is_none());
    }

    // ── analyze ───────────────────────────────────────────────────────────────

    #[test]
    fn test_analyze_world_mode() {
        let records = sample();
        let spec = FilterSpec::world().with_code(Some("850440"));
        let view = analyze(&records, &spec, Classification::Hs6);

        assert_eq!(view.record_count, 3);
        assert_eq!(view.title, "HS6 Tariff Line 850440");
        assert_eq!(view.chart.labels, vec!["4/5/2025", "4/9/2025"]);
        assert_eq!(view.chart.series["World"], vec![Some(10.0), Some(17.0)]);
        assert_eq!(view.summary.len(), 3);
        assert!(view.summary.iter().all(|r| r.weighted_affected_share_percent == 100.0));
        assert_eq!(view.exposure.unwrap().affected_actions, 1);
    }

    #[test]
    fn test_analyze_per_exporter_computed_shares() {
        let records = sample();
        let spec = FilterSpec::world().with_exporters(["China", "Mexico"]);
        let view = analyze(&records, &spec, Classification::Isic);

        assert_eq!(view.chart.series.len(), 2);
        assert_eq!(view.chart.series["China"], vec![Some(10.0), Some(34.0)]);
        assert_eq!(view.chart.series["Mexico"], vec![None, Some(12.5)]);
        assert!(view
            .summary
            .iter()
            .all(|r| (r.weighted_affected_share_percent - 50.0).abs() < 1e-9));
    }

    #[test]
    fn test_analyze_summary_sorted_by_date() {
        let records = vec![
            rec("China", "850440", day(4, 9), 1.0, 0.0),
            rec("Mexico", "850440", day(4, 5), 1.0, 0.0),
            rec("China", "850440", day(4, 5), 1.0, 0.0),
        ];
        let view = analyze(&records, &FilterSpec::world(), Classification::Hs6);
        let keys: Vec<(&str, &str)> = view
            .summary
            .iter()
            .map(|r| (r.exporter.as_str(), r.date_label.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("Mexico", "4/5/2025"), ("China", "4/5/2025"), ("China", "4/9/2025")]
        );
    }

    #[test]
    fn test_analyze_no_match() {
        let records = sample();
        let view = analyze(&records, &FilterSpec::world().with_importer("Canada"), Classification::Hs6);
        assert!(view.is_empty());
        assert!(view.chart.is_empty());
        assert!(view.summary.is_empty());
        assert!(view.exposure.is_none());
    }
}
