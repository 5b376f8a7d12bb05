//! Reference lists and per-importer option lists.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tariff_core::error::Result;
use tariff_core::models::{TariffRecord, WORLD};
use tariff_core::normalizer::normalize_code;
use tracing::{info, warn};

use crate::reader::read_column_values;

pub const EXPORTERS_FILE: &str = "exporters.csv";
pub const ISIC_CODES_FILE: &str = "isic4_2_product_name.csv";
pub const HS6_CODES_FILE: &str = "hs6code.csv";

// ── ReferenceLists ────────────────────────────────────────────────────────────

/// Exporter names and code lists shipped alongside the tariff datasets.
///
/// Every list is trimmed, free of blanks, deduplicated and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLists {
    pub exporters: Vec<String>,
    /// ISIC codes collapsed to their 2-digit prefix.
    pub isic_codes: Vec<String>,
    pub hs6_codes: Vec<String>,
}

impl ReferenceLists {
    /// Load the three reference files from `dir`.
    ///
    /// A missing file yields an empty list and a warning; a file that exists
    /// but cannot be parsed is an error.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let exporters = load_optional_list(&dir.join(EXPORTERS_FILE), "exporter")?;
        let isic_raw = load_optional_list(&dir.join(ISIC_CODES_FILE), "isic4_2")?;
        let hs6_codes = load_optional_list(&dir.join(HS6_CODES_FILE), "hs6code")?;

        let lists = Self {
            exporters: sorted_unique(exporters),
            isic_codes: sorted_unique(
                isic_raw
                    .iter()
                    .map(|c| normalize_code(c))
                    .filter(|c| !c.is_empty()),
            ),
            hs6_codes: sorted_unique(hs6_codes),
        };

        info!(
            "Reference lists: {} exporters, {} ISIC codes, {} HS6 codes",
            lists.exporters.len(),
            lists.isic_codes.len(),
            lists.hs6_codes.len()
        );
        Ok(lists)
    }
}

fn load_optional_list(path: &Path, column: &str) -> Result<Vec<String>> {
    if !path.exists() {
        warn!("Reference list not found, using empty list: {}", path.display());
        return Ok(Vec::new());
    }
    read_column_values(path, column)
}

fn sorted_unique<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .filter(|v: &String| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ── Option lists ──────────────────────────────────────────────────────────────

fn for_importer<'a>(
    records: &'a [TariffRecord],
    importer: &'a str,
) -> impl Iterator<Item = &'a TariffRecord> + 'a {
    let world = importer.trim().is_empty() || importer == WORLD;
    records
        .iter()
        .filter(move |r| world || r.importer == importer)
}

/// Distinct classification codes present for `importer`, sorted.
/// [`WORLD`] (or a blank importer) considers every record.
pub fn available_codes(records: &[TariffRecord], importer: &str) -> Vec<String> {
    sorted_unique(for_importer(records, importer).map(|r| r.classification_code.clone()))
}

/// Distinct exporters trading with `importer`, sorted.
pub fn available_exporters(records: &[TariffRecord], importer: &str) -> Vec<String> {
    sorted_unique(for_importer(records, importer).map(|r| r.exporter.clone()))
}

/// Display text for an exporter selection.
///
/// ```
/// use std::collections::BTreeSet;
/// use tariff_data::catalog::exporter_selection_label;
///
/// assert_eq!(exporter_selection_label(&BTreeSet::new()), "World (All Exporters)");
/// let two: BTreeSet<String> = ["China", "Mexico"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(exporter_selection_label(&two), "2 exporters selected");
/// ```
pub fn exporter_selection_label(selected: &BTreeSet<String>) -> String {
    let mut iter = selected.iter();
    match (iter.next(), selected.len()) {
        (None, _) => "World (All Exporters)".to_string(),
        (Some(only), 1) => only.clone(),
        (_, n) => format!("{n} exporters selected"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
