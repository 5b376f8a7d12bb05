use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const APP_DIR: &str = ".tariff-dashboard";

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.tariff-dashboard/` and its `logs/` and `data/` subdirectories exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    ensure_directories_in(&home())
}

fn ensure_directories_in(base: &Path) -> anyhow::Result<()> {
    let app_dir = base.join(APP_DIR);
    std::fs::create_dir_all(app_dir.join("logs"))?;
    std::fs::create_dir_all(app_dir.join("data"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `DEBUG`/`INFO`/`WARNING`/`ERROR`/`CRITICAL` level name to an
/// [`EnvFilter`] directive.
fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, and additionally to `log_file` (appended, without
/// ANSI colours) when one is given. Unknown levels fall back to `info`.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Data-dir discovery ─────────────────────────────────────────────────────────

/// Locate the dataset directory.
///
/// Returns the first existing directory of:
/// 1. `explicit` (from `--data-dir` / `TARIFF_DATA_DIR`, or last used)
/// 2. `./data`
/// 3. `~/.tariff-dashboard/data`
pub fn discover_data_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_data_dir_in(explicit, &cwd, &home())
}

fn discover_data_dir_in(explicit: Option<&Path>, cwd: &Path, home: &Path) -> Option<PathBuf> {
    let candidates = [
        explicit.map(Path::to_path_buf),
        Some(cwd.join("data")),
        Some(home.join(APP_DIR).join("data")),
    ];
    candidates.into_iter().flatten().find(|p| p.is_dir())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_in() {
        let tmp = TempDir::new().expect("tempdir");
        ensure_directories_in(tmp.path()).expect("ensure_directories should succeed");

        let app_dir = tmp.path().join(APP_DIR);
        assert!(app_dir.join("logs").is_dir());
        assert!(app_dir.join("data").is_dir());
    }

    #[test]
    fn test_filter_directive_mapping() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("warning"), "warn");
        assert_eq!(filter_directive("CRITICAL"), "error");
        assert_eq!(filter_directive("trace"), "trace");
    }

    #[test]
    fn test_discover_prefers_explicit() {
        let tmp = TempDir::new().expect("tempdir");
        let explicit = tmp.path().join("mine");
        std::fs::create_dir_all(&explicit).unwrap();
        std::fs::create_dir_all(tmp.path().join("data")).unwrap();

        let found = discover_data_dir_in(Some(&explicit), tmp.path(), tmp.path());
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn test_discover_skips_missing_explicit() {
        let tmp = TempDir::new().expect("tempdir");
        let local = tmp.path().join("data");
        std::fs::create_dir_all(&local).unwrap();

        let found = discover_data_dir_in(Some(&tmp.path().join("absent")), tmp.path(), tmp.path());
        assert_eq!(found, Some(local));
    }

    #[test]
    fn test_discover_falls_back_to_home() {
        let cwd = TempDir::new().expect("tempdir");
        let home = TempDir::new().expect("tempdir");
        let data = home.path().join(APP_DIR).join("data");
        std::fs::create_dir_all(&data).unwrap();

        assert_eq!(discover_data_dir_in(None, cwd.path(), home.path()), Some(data));
    }

    #[test]
    fn test_discover_none_when_absent() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(discover_data_dir_in(None, tmp.path(), tmp.path()).is_none());
    }
}
