//! Interactive selection state over a shared [`Datasets`] handle.
//!
//! A [`DashboardSession`] holds the current importer, classification, code,
//! exporter and date selection and applies the same state transitions an
//! interactive front end needs: changing the importer or classification
//! resets the code and exporter choices, and [`DashboardSession::apply`]
//! refuses to run without a classification.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tariff_core::error::{Result, TariffError};
use tariff_core::models::{Classification, FilterSpec, WORLD};
use tariff_data::analysis::{analyze, DashboardView};
use tariff_data::catalog::{available_codes, available_exporters, exporter_selection_label};

use crate::data_manager::Datasets;

#[derive(Debug, Clone)]
pub struct DashboardSession {
    datasets: Arc<Datasets>,
    importer: String,
    classification: Option<Classification>,
    code: Option<String>,
    exporters: BTreeSet<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl DashboardSession {
    /// Start at the initial view: every importer, HS6 tariff lines.
    pub fn new(datasets: Arc<Datasets>) -> Self {
        Self {
            datasets,
            importer: WORLD.to_string(),
            classification: Some(Classification::Hs6),
            code: None,
            exporters: BTreeSet::new(),
            date_from: None,
            date_to: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn datasets(&self) -> &Arc<Datasets> {
        &self.datasets
    }

    pub fn importer(&self) -> &str {
        &self.importer
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn exporters(&self) -> &BTreeSet<String> {
        &self.exporters
    }

    /// Display text for the current exporter selection.
    pub fn exporter_label(&self) -> String {
        exporter_selection_label(&self.exporters)
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Switch importer. Clears the code and exporter selection.
    ///
    /// Choosing [`WORLD`] while unclassified falls back to HS6; any other
    /// importer keeps the classification as it is, possibly unset.
    pub fn set_importer(&mut self, importer: &str) {
        let trimmed = importer.trim();
        self.importer = if trimmed.is_empty() {
            WORLD.to_string()
        } else {
            trimmed.to_string()
        };
        self.code = None;
        self.exporters.clear();

        if self.importer == WORLD && self.classification.is_none() {
            self.classification = Some(Classification::Hs6);
        }
        tracing::debug!(importer = %self.importer, classification = ?self.classification, "importer changed");
    }

    /// Switch classification scheme. Clears the code and exporter selection.
    pub fn set_classification(&mut self, classification: Option<Classification>) {
        self.classification = classification;
        self.code = None;
        self.exporters.clear();
        tracing::debug!(classification = ?classification, "classification changed");
    }

    /// Select one classification code; blank or `None` selects all codes.
    /// The code is normalised for the current classification.
    pub fn set_code(&mut self, code: Option<&str>) {
        self.code = code
            .map(|c| match self.classification {
                Some(cls) => cls.normalize_code(c),
                None => c.trim().to_string(),
            })
            .filter(|c| !c.is_empty());
    }

    /// Replace the exporter selection. Empty means all exporters aggregated.
    pub fn set_exporters<I, S>(&mut self, exporters: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exporters = exporters
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
    }

    /// Add `exporter` to the selection, or remove it if already selected.
    /// Returns `true` when the exporter is selected afterwards.
    pub fn toggle_exporter(&mut self, exporter: &str) -> bool {
        let exporter = exporter.trim();
        if exporter.is_empty() {
            return false;
        }
        if self.exporters.remove(exporter) {
            false
        } else {
            self.exporters.insert(exporter.to_string());
            true
        }
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.date_from = from;
        self.date_to = to;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The [`FilterSpec`] described by the current selection.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::world()
            .with_importer(&self.importer)
            .with_code(self.code.as_deref())
            .with_exporters(&self.exporters)
            .with_date_range(self.date_from, self.date_to)
    }

    /// Run the pipeline for the current selection.
    ///
    /// Fails with [`TariffError::MissingClassification`] when no scheme is
    /// selected.
    pub fn apply(&self) -> Result<DashboardView> {
        let classification = self
            .classification
            .ok_or(TariffError::MissingClassification)?;
        let spec = self.filter_spec();
        let view = analyze(self.datasets.records(classification), &spec, classification);

        tracing::info!(
            importer = %spec.importer,
            classification = %classification,
            records = view.record_count,
            summary_rows = view.summary.len(),
            "selection applied"
        );
        Ok(view)
    }

    /// Codes available for the current importer and classification.
    pub fn code_options(&self) -> Vec<String> {
        match self.classification {
            Some(c) => available_codes(self.datasets.records(c), &self.importer),
            None => Vec::new(),
        }
    }

    /// Exporters available for the current importer and classification.
    pub fn exporter_options(&self) -> Vec<String> {
        match self.classification {
            Some(c) => available_exporters(self.datasets.records(c), &self.importer),
            None => Vec::new(),
        }
    }

    /// Importers present in either dataset, with [`WORLD`] first.
    pub fn importer_options(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .datasets
            .isic
            .iter()
            .chain(self.datasets.hs6.iter())
            .map(|r| r.importer.as_str())
            .filter(|i| !i.is_empty() && *i != WORLD)
            .collect();
        std::iter::once(WORLD.to_string())
            .chain(names.into_iter().map(str::to_string))
            .collect()
    }

    /// `false` when the selected importer occurs in neither dataset.
    pub fn importer_is_known(&self) -> bool {
        self.importer_options().iter().any(|i| *i == self.importer)
    }

    /// `false` when a code is selected and the reference list for the
    /// current scheme is loaded but does not contain it.
    pub fn code_in_reference(&self) -> bool {
        let (Some(classification), Some(code)) = (self.classification, self.code.as_deref()) else {
            return true;
        };
        let reference = self.datasets.reference_codes(classification);
        reference.is_empty() || reference.iter().any(|c| c == code)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
