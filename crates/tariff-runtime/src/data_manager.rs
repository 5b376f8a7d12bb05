//! One-shot asynchronous dataset loading.
//!
//! [`DatasetLoader::load`] reads both tariff datasets and the reference lists
//! from a data directory on tokio's blocking pool and returns an immutable
//! [`Datasets`] handle that sessions share through an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tariff_core::error::{Result, TariffError};
use tariff_core::models::{Classification, TariffRecord};
use tariff_data::catalog::ReferenceLists;
use tariff_data::reader::load_tariff_dataset;

/// ISIC 2-digit tariff dataset file name.
pub const ISIC_TARIFF_FILE: &str = "isic2tariff.csv";

/// HS6 tariff-line dataset file name.
pub const HS6_TARIFF_FILE: &str = "hs6tariff.csv";

// ── Datasets ──────────────────────────────────────────────────────────────────

/// Every dataset the dashboard works from, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub isic: Arc<[TariffRecord]>,
    pub hs6: Arc<[TariffRecord]>,
    pub reference: ReferenceLists,
}

impl Datasets {
    /// Assemble from already-normalised records.
    pub fn new(isic: Vec<TariffRecord>, hs6: Vec<TariffRecord>, reference: ReferenceLists) -> Self {
        Self {
            isic: isic.into(),
            hs6: hs6.into(),
            reference,
        }
    }

    /// Records of the given classification scheme.
    pub fn records(&self, classification: Classification) -> &[TariffRecord] {
        match classification {
            Classification::Isic => &self.isic,
            Classification::Hs6 => &self.hs6,
        }
    }

    /// Reference code list for the given scheme.
    pub fn reference_codes(&self, classification: Classification) -> &[String] {
        match classification {
            Classification::Isic => &self.reference.isic_codes,
            Classification::Hs6 => &self.reference.hs6_codes,
        }
    }
}

// ── DatasetLoader ─────────────────────────────────────────────────────────────

/// Loads [`Datasets`] from a directory.
///
/// # Example
/// ```no_run
/// use tariff_runtime::data_manager::DatasetLoader;
///
/// # async fn run() -> tariff_core::Result<()> {
/// let datasets = DatasetLoader::new("./data").load().await?;
/// println!("{} HS6 records", datasets.hs6.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
}

impl DatasetLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read every dataset on the blocking pool.
    ///
    /// Fails when the directory or either tariff file is missing, or a file
    /// cannot be parsed at all. Missing reference lists only log a warning.
    pub async fn load(&self) -> Result<Datasets> {
        let dir = self.data_dir.clone();
        tokio::task::spawn_blocking(move || Self::load_blocking(&dir))
            .await
            .map_err(|e| TariffError::Other(anyhow_from_join(e)))?
    }

    /// Synchronous body of [`load`](Self::load).
    pub fn load_blocking(dir: &Path) -> Result<Datasets> {
        if !dir.is_dir() {
            return Err(TariffError::DataPathNotFound(dir.to_path_buf()));
        }

        let started = Instant::now();
        let isic = load_tariff_dataset(&dir.join(ISIC_TARIFF_FILE), Classification::Isic)?;
        let hs6 = load_tariff_dataset(&dir.join(HS6_TARIFF_FILE), Classification::Hs6)?;
        let reference = ReferenceLists::load_from_dir(dir)?;

        tracing::info!(
            isic = isic.len(),
            hs6 = hs6.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "datasets loaded"
        );

        Ok(Datasets::new(isic, hs6, reference))
    }
}

fn anyhow_from_join(err: tokio::task::JoinError) -> anyhow::Error {
    anyhow::anyhow!("dataset load task failed: {err}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
