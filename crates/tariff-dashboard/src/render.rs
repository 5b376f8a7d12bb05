//! Plain-text and JSON output for a [`DashboardView`].

use std::io::{self, Write};

use tariff_core::formatting::{format_number, format_usd};
use tariff_data::analysis::DashboardView;
use tariff_data::summary::SUMMARY_HEADERS;

/// Output formats accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

pub fn render<W: Write>(view: &DashboardView, format: OutputFormat, out: &mut W) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, view)?;
            writeln!(out)?;
        }
        OutputFormat::Table => render_table(view, out)?,
    }
    Ok(())
}

// ── Text ──────────────────────────────────────────────────────────────────────

fn render_table<W: Write>(view: &DashboardView, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", view.title)?;
    writeln!(out, "{}", "=".repeat(view.title.chars().count()))?;
    writeln!(out)?;

    if view.is_empty() {
        writeln!(out, "No data for this selection.")?;
        writeln!(out)?;
        writeln!(out, "No EO-related data")?;
        return Ok(());
    }

    render_chart(view, out)?;
    writeln!(out)?;
    render_summary(view, out)?;
    writeln!(out)?;
    render_exposure(view, out)
}

fn render_chart<W: Write>(view: &DashboardView, out: &mut W) -> io::Result<()> {
    writeln!(out, "Tariff rate by date (%)")?;
    if view.chart.is_empty() {
        return writeln!(out, "  (no dated records)");
    }

    let mut header = vec!["Date".to_string()];
    header.extend(view.chart.series.keys().cloned());

    let rows: Vec<Vec<String>> = view
        .chart
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mut row = vec![label.clone()];
            row.extend(view.chart.series.values().map(|values| match values[i] {
                Some(v) => format_number(v, 2),
                None => "-".to_string(),
            }));
            row
        })
        .collect();

    write_grid(out, &header, &rows)
}

fn render_summary<W: Write>(view: &DashboardView, out: &mut W) -> io::Result<()> {
    writeln!(out, "Summary")?;
    let header: Vec<String> = SUMMARY_HEADERS.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = view
        .summary
        .iter()
        .map(|r| r.to_display().into_iter().collect())
        .collect();
    write_grid(out, &header, &rows)
}

fn render_exposure<W: Write>(view: &DashboardView, out: &mut W) -> io::Result<()> {
    writeln!(out, "Executive-order exposure")?;
    let Some(eo) = &view.exposure else {
        return writeln!(out, "No EO-related data");
    };
    let affected_total: f64 = view
        .summary
        .iter()
        .map(|r| r.affected_trade_value_total)
        .sum();

    writeln!(out, "  Importer:        {}", eo.importer)?;
    writeln!(out, "  Exporters:       {}", eo.exporter_label)?;
    writeln!(out, "  Classification:  {}", eo.classification_label)?;
    writeln!(out, "  Dates:           {}", eo.date_range_label)?;
    writeln!(out, "  Affected flows:  {}", eo.affected_actions)?;
    writeln!(out, "  Affected value:  {}", format_usd(affected_total))
}

/// Left-aligned columns padded to the widest cell.
fn write_grid<W: Write>(out: &mut W, header: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(header))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("  "))?;
    for row in rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tariff_core::models::{Classification, FilterSpec, TariffRecord};
    use tariff_data::analysis::analyze;

    fn rec(exporter: &str, d: u32, tariff: f64) -> TariffRecord {
        TariffRecord {
            importer: "United States".to_string(),
            exporter: exporter.to_string(),
            classification_code: "850440".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, d).and_then(|x| x.and_hms_opt(0, 0, 0)),
            tariff_rate: tariff,
            trade_value_usd: 1_000.0,
            affected_trade_value_usd: 2_500.0,
            affected_trade_share: 0.0,
            affected_line_share: 0.0,
            metadata: Default::default(),
        }
    }

    fn render_to_string(view: &DashboardView, format: OutputFormat) -> String {
        let mut buf = Vec::new();
        render(view, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_table_contains_sections() {
        let records = vec![rec("China", 1, 10.0), rec("Mexico", 2, 20.0)];
        let spec = FilterSpec::world().with_exporters(["China", "Mexico"]);
        let view = analyze(&records, &spec, Classification::Hs6);
        let text = render_to_string(&view, OutputFormat::Table);

        assert!(text.starts_with("HS6 Tariff Line\n"));
        assert!(text.contains("Date      China  Mexico"));
        assert!(text.contains("4/1/2025  10.00  -"));
        assert!(text.contains("Weighted Avg Tariff"));
        assert!(text.contains("100.00%"));
        assert!(text.contains("Exporters:       2 exporters"));
        assert!(text.contains("Affected value:  $5,000"));
    }

    #[test]
    fn test_table_empty_view() {
        let view = analyze(&[], &FilterSpec::world(), Classification::Isic);
        let text = render_to_string(&view, OutputFormat::Table);
        assert!(text.contains("No data for this selection."));
        assert!(text.contains("No EO-related data"));
    }

    #[test]
    fn test_json_is_parseable() {
        let records = vec![rec("China", 1, 10.0)];
        let view = analyze(&records, &FilterSpec::world(), Classification::Hs6);
        let text = render_to_string(&view, OutputFormat::Json);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["title"], "HS6 Tariff Line");
        assert_eq!(value["chart"]["labels"][0], "4/1/2025");
        assert_eq!(value["chart"]["series"]["World"][0], 10.0);
        assert_eq!(value["classification"], "hs6");
    }

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_name("table"), OutputFormat::Table);
    }
}
