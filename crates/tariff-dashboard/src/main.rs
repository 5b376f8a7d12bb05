mod bootstrap;
mod render;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tariff_core::settings::Settings;
use tariff_runtime::data_manager::DatasetLoader;
use tariff_runtime::session::DashboardSession;

use crate::render::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Tariff Dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let classification = settings.classification()?;
    let spec = settings.filter_spec()?;

    let data_dir = bootstrap::discover_data_dir(settings.data_dir.as_deref()).context(
        "no data directory found; pass --data-dir, set TARIFF_DATA_DIR, or create ./data",
    )?;
    tracing::info!("Using data directory {}", data_dir.display());

    let datasets = DatasetLoader::new(&data_dir)
        .load()
        .await
        .with_context(|| format!("loading datasets from {}", data_dir.display()))?;

    let mut session = DashboardSession::new(Arc::new(datasets));
    session.set_classification(Some(classification));
    session.set_importer(&spec.importer);
    session.set_code(spec.classification_code.as_deref());
    session.set_exporters(&spec.exporters);
    session.set_date_range(spec.date_from, spec.date_to);

    if !session.importer_is_known() {
        tracing::warn!("Importer {} does not occur in either dataset", session.importer());
    }
    if !session.code_in_reference() {
        tracing::warn!(
            "Code {} is not in the {} reference list",
            session.code().unwrap_or_default(),
            classification
        );
    }
    if let Some(code) = session.code() {
        if !session.code_options().iter().any(|c| c == code) {
            tracing::warn!("Code {} does not occur for importer {}", code, session.importer());
        }
    }

    let view = session.apply()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render::render(&view, OutputFormat::from_name(&settings.format), &mut out)?;
    out.flush()?;

    Ok(())
}
