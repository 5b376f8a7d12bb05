use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CodeMode, RawRow, TariffRecord};
use crate::time_utils::parse_date;

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Source column names for each [`TariffRecord`] field.
///
/// Defaults match the published ISIC/HS6 tariff files; only the code column
/// differs between the two (see [`ColumnMap::for_code_column`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub importer: String,
    pub exporter: String,
    pub date: String,
    pub code: String,
    pub tariff_rate: String,
    pub trade_value: String,
    /// When set, `trade_value` is expressed in thousands of USD.
    pub trade_value_in_thousands: bool,
    pub affected_trade_value: String,
    pub affected_trade_share: String,
    pub affected_line_share: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            importer: "importer".to_string(),
            exporter: "exporter".to_string(),
            date: "date_eff".to_string(),
            code: "hs6".to_string(),
            tariff_rate: "tariffs".to_string(),
            trade_value: "importsvaluein1000usd".to_string(),
            trade_value_in_thousands: true,
            affected_trade_value: "affected_trade_value".to_string(),
            affected_trade_share: "affected_trade_share".to_string(),
            affected_line_share: "affected_hs6tariff_line_share".to_string(),
        }
    }
}

impl ColumnMap {
    /// Default mapping with a different classification-code column.
    pub fn for_code_column(code: &str) -> Self {
        Self {
            code: code.to_string(),
            ..Self::default()
        }
    }

    fn is_mapped(&self, column: &str) -> bool {
        [
            &self.importer,
            &self.exporter,
            &self.date,
            &self.code,
            &self.tariff_rate,
            &self.trade_value,
            &self.affected_trade_value,
            &self.affected_trade_share,
            &self.affected_line_share,
        ]
        .iter()
        .any(|c| c.as_str() == column)
    }
}

// ── RowNormalizer ─────────────────────────────────────────────────────────────

/// Turns raw CSV rows into [`TariffRecord`]s.
///
/// Never fails: malformed cells resolve to `""`, `0` or a `None` date so one
/// bad row cannot discard a dataset.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    columns: ColumnMap,
    code_mode: CodeMode,
}

impl RowNormalizer {
    pub fn new(columns: ColumnMap, code_mode: CodeMode) -> Self {
        Self { columns, code_mode }
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn code_mode(&self) -> CodeMode {
        self.code_mode
    }

    /// Normalise a single row.
    pub fn normalize(&self, raw: &RawRow) -> TariffRecord {
        let cols = &self.columns;

        let raw_date = field(raw, &cols.date);
        let date = parse_date(&raw_date);
        if date.is_none() && !raw_date.is_empty() {
            debug!("RowNormalizer: unparseable date \"{}\"", raw_date);
        }

        let raw_code = field(raw, &cols.code);
        let classification_code = match self.code_mode {
            CodeMode::Full => raw_code,
            CodeMode::Prefix2 => normalize_code(&raw_code),
        };

        let mut trade_value_usd = parse_number(raw.get(&cols.trade_value).map(String::as_str));
        if cols.trade_value_in_thousands {
            trade_value_usd *= 1000.0;
        }

        let metadata: BTreeMap<String, String> = raw
            .iter()
            .filter(|(k, _)| !cols.is_mapped(k))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        TariffRecord {
            importer: field(raw, &cols.importer),
            exporter: field(raw, &cols.exporter),
            classification_code,
            date,
            tariff_rate: parse_number(raw.get(&cols.tariff_rate).map(String::as_str)),
            trade_value_usd,
            affected_trade_value_usd: parse_number(
                raw.get(&cols.affected_trade_value).map(String::as_str),
            ),
            affected_trade_share: parse_number(
                raw.get(&cols.affected_trade_share).map(String::as_str),
            ),
            affected_line_share: parse_number(
                raw.get(&cols.affected_line_share).map(String::as_str),
            ),
            metadata,
        }
    }

    /// Normalise a batch of rows, preserving order.
    pub fn normalize_all(&self, rows: &[RawRow]) -> Vec<TariffRecord> {
        rows.iter().map(|row| self.normalize(row)).collect()
    }
}

/// Normalise `raw` with the default [`ColumnMap`] and the given code mode.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tariff_core::models::CodeMode;
/// use tariff_core::normalizer::normalize;
///
/// let mut row = HashMap::new();
/// row.insert("hs6".to_string(), "4100".to_string());
/// row.insert("tariffs".to_string(), "abc".to_string());
///
/// let rec = normalize(&row, CodeMode::Prefix2);
/// assert_eq!(rec.classification_code, "41");
/// assert_eq!(rec.tariff_rate, 0.0);
/// assert!(rec.date.is_none());
/// ```
pub fn normalize(raw: &RawRow, code_mode: CodeMode) -> TariffRecord {
    RowNormalizer::new(ColumnMap::default(), code_mode).normalize(raw)
}

// ── Field helpers ─────────────────────────────────────────────────────────────

/// Trimmed value of `key`, or `""` when missing.
fn field(raw: &RawRow, key: &str) -> String {
    raw.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn leading_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("regex is valid")
    })
}

/// Coerce a numeric cell, falling back to `0.0`.
///
/// Missing, blank, non-numeric, NaN and infinite inputs all yield `0.0`.
/// A leading numeric prefix is honoured, so `"12.5%"` reads as `12.5`.
///
/// ```
/// use tariff_core::normalizer::parse_number;
///
/// assert_eq!(parse_number(Some(" 7.5 ")), 7.5);
/// assert_eq!(parse_number(Some("abc")), 0.0);
/// assert_eq!(parse_number(None), 0.0);
/// ```
pub fn parse_number(raw: Option<&str>) -> f64 {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0.0;
    };

    let parsed = s.parse::<f64>().ok().or_else(|| {
        leading_number_regex()
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    });

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Collapse a hierarchical code to its 2-digit prefix.
///
/// Non-digits are stripped first; a single remaining digit is left-padded
/// with `0`; no digits at all yields `""`.
///
/// ```
/// use tariff_core::normalizer::normalize_code;
///
/// assert_eq!(normalize_code("4100"), "41");
/// assert_eq!(normalize_code("5"), "05");
/// assert_eq!(normalize_code("ab12cd"), "12");
/// assert_eq!(normalize_code(""), "");
/// ```
pub fn normalize_code(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        0 => String::new(),
        1 => format!("0{}", digits),
        _ => digits[..2].to_string(),
    }
}

/// Read a share that may be a 0–1 fraction or a 0–100 percent as a fraction.
///
/// Anything above `1` is taken to be a percent. A genuine fraction above 1
/// would be mis-scaled; upstream data has not been seen to contain one.
///
/// ```
/// use tariff_core::normalizer::normalize_fraction;
///
/// assert_eq!(normalize_fraction(50.0), 0.5);
/// assert_eq!(normalize_fraction(0.5), 0.5);
/// ```
pub fn normalize_fraction(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
