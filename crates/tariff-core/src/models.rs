use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::TariffError;

/// Importer value meaning "no importer filter", and the name of the single
/// aggregated series when no exporters are selected.
pub const WORLD: &str = "World";

/// One CSV row keyed by header name, before any typing or trimming.
pub type RawRow = HashMap<String, String>;

/// How the classification-code column is normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeMode {
    /// Keep the trimmed code as-is (e.g. 6-digit tariff lines).
    Full,
    /// Collapse to a zero-padded 2-digit prefix (e.g. ISIC groupings).
    Prefix2,
}

/// How the two share columns of a summary row are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareMode {
    /// Compute the weighted trade share and average line share.
    Computed,
    /// Report both shares as exactly 100%: each row already is one tariff line.
    FixedFull,
}

/// Product classification scheme of a tariff dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// ISIC rev. 4, 2-digit industry groupings.
    Isic,
    /// Harmonized System 6-digit tariff lines.
    Hs6,
}

impl Classification {
    /// Both schemes, in display order.
    pub const ALL: [Classification; 2] = [Classification::Isic, Classification::Hs6];

    /// Code normalisation applied when loading this scheme's dataset.
    pub fn code_mode(self) -> CodeMode {
        match self {
            Classification::Isic => CodeMode::Prefix2,
            Classification::Hs6 => CodeMode::Full,
        }
    }

    /// Share columns are computed for ISIC and fixed for HS6.
    pub fn share_mode(self) -> ShareMode {
        match self {
            Classification::Isic => ShareMode::Computed,
            Classification::Hs6 => ShareMode::FixedFull,
        }
    }

    /// Header of the code column in this scheme's tariff file.
    pub fn code_column(self) -> &'static str {
        match self {
            Classification::Isic => "isic4_2",
            Classification::Hs6 => "hs6",
        }
    }

    /// Short prefix used in report labels.
    pub fn short_label(self) -> &'static str {
        match self {
            Classification::Isic => "ISIC",
            Classification::Hs6 => "HS6",
        }
    }

    /// Normalise a user-supplied code the way this scheme's dataset codes are
    /// normalised on load, so `"2610"` selects ISIC group `"26"`.
    pub fn normalize_code(self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.code_mode() {
            CodeMode::Full => trimmed.to_string(),
            CodeMode::Prefix2 => crate::normalizer::normalize_code(trimmed),
        }
    }

    /// Chart-title stem for this scheme.
    pub fn line_label(self) -> &'static str {
        match self {
            Classification::Isic => "ISIC4 2 Digit Tariff Line",
            Classification::Hs6 => "HS6 Tariff Line",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Isic => write!(f, "isic"),
            Classification::Hs6 => write!(f, "hs6"),
        }
    }
}

impl FromStr for Classification {
    type Err = TariffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "isic" => Ok(Classification::Isic),
            "hs6" => Ok(Classification::Hs6),
            other => Err(TariffError::InvalidClassification(other.to_string())),
        }
    }
}

/// A normalised tariff observation: one importer/exporter/product flow on one
/// effective date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffRecord {
    /// Importing party; `""` when absent.
    pub importer: String,
    /// Exporting party; `""` when absent.
    pub exporter: String,
    /// Normalised product/industry code; `""` when absent.
    pub classification_code: String,
    /// Effective date, `None` when the source cell could not be parsed.
    pub date: Option<NaiveDateTime>,
    /// Applied tariff in percent.
    pub tariff_rate: f64,
    /// Trade value in US dollars (already scaled from thousands).
    pub trade_value_usd: f64,
    /// Portion of the trade value covered by the measure, in US dollars.
    pub affected_trade_value_usd: f64,
    /// Affected trade share as found in the source: a 0–1 fraction or 0–100 percent.
    pub affected_trade_share: f64,
    /// Affected tariff-line share, same unit ambiguity as `affected_trade_share`.
    pub affected_line_share: f64,
    /// Remaining source columns, carried through for display.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TariffRecord {
    /// Calendar day of the effective date; time of day is discarded.
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.map(|dt| dt.date())
    }

    /// Whether any trade under this record is flagged as affected.
    pub fn is_affected(&self) -> bool {
        self.affected_trade_value_usd > 0.0
    }
}

/// One filter selection over a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Importer to match, or [`WORLD`] for every importer.
    pub importer: String,
    /// Classification code to match; `None` matches every code.
    pub classification_code: Option<String>,
    /// Exporters to keep. Empty selects world mode: every exporter, aggregated.
    pub exporters: BTreeSet<String>,
    /// Inclusive lower bound on the record's calendar day.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the record's calendar day.
    pub date_to: Option<NaiveDate>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::world()
    }
}

impl FilterSpec {
    /// The unfiltered selection: every importer, code, exporter and date.
    pub fn world() -> Self {
        Self {
            importer: WORLD.to_string(),
            classification_code: None,
            exporters: BTreeSet::new(),
            date_from: None,
            date_to: None,
        }
    }

    /// Set the importer. Blank input selects [`WORLD`].
    pub fn with_importer(mut self, importer: &str) -> Self {
        let trimmed = importer.trim();
        self.importer = if trimmed.is_empty() {
            WORLD.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    /// Set the classification code. Blank input clears it.
    pub fn with_code(mut self, code: Option<&str>) -> Self {
        self.classification_code = code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self
    }

    /// Replace the exporter selection. Blank names are ignored.
    pub fn with_exporters<I, S>(mut self, exporters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exporters = exporters
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Set the inclusive date range.
    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// `true` when no importer filter applies.
    pub fn is_world_importer(&self) -> bool {
        self.importer == WORLD
    }

    /// `true` when exporters are aggregated into one series.
    pub fn is_world_mode(&self) -> bool {
        self.exporters.is_empty()
    }

    /// `true` when either date bound is set.
    pub fn has_date_bounds(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Whether `record` satisfies every clause of this selection.
    ///
    /// A record without a parseable date fails any date bound that is set.
    pub fn matches(&self, record: &TariffRecord) -> bool {
        if !self.is_world_importer() && record.importer != self.importer {
            return false;
        }

        if let Some(code) = self.classification_code.as_deref() {
            if !code.is_empty() && record.classification_code != code {
                return false;
            }
        }

        if !self.is_world_mode() && !self.exporters.contains(&record.exporter) {
            return false;
        }

        if self.has_date_bounds() {
            let Some(day) = record.day() else {
                return false;
            };
            if self.date_from.is_some_and(|from| day < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| day > to) {
                return false;
            }
        }

        true
    }
}
