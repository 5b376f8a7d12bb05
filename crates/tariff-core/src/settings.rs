use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{Classification, FilterSpec, WORLD};
use crate::time_utils::parse_date_bound;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Tariff and trade exposure dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tariff-dashboard",
    about = "Filter tariff datasets and summarise tariff rates and affected trade",
    version
)]
pub struct Settings {
    /// Directory holding the tariff and reference CSV files
    #[arg(long, env = "TARIFF_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Importer to filter on ("World" for all importers)
    #[arg(long, default_value = WORLD)]
    pub importer: String,

    /// Product classification
    #[arg(long, default_value = "hs6", value_parser = ["isic", "hs6"])]
    pub classification: String,

    /// Classification code (ISIC 2-digit or HS6 line); all codes when omitted
    #[arg(long)]
    pub code: Option<String>,

    /// Exporter to include; repeat for several. None means all exporters aggregated
    #[arg(long = "exporter")]
    pub exporters: Vec<String>,

    /// Earliest effective date to include
    #[arg(long)]
    pub date_from: Option<String>,

    /// Latest effective date to include
    #[arg(long)]
    pub date_to: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.tariff-dashboard/last_used.json`.
///
/// Only session-independent preferences are kept; filter selections are not.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".tariff-dashboard").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path.
    pub fn save(&self) -> std::result::Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> std::result::Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug_flag(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }
        if !is_arg_explicitly_set(&matches, "classification") {
            if let Some(v) = last.classification {
                settings.classification = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::apply_debug_flag(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    fn apply_debug_flag(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The selected classification scheme.
    pub fn classification(&self) -> Result<Classification> {
        self.classification.parse()
    }

    /// Build the [`FilterSpec`] described by the command line.
    ///
    /// The code is normalised for the selected classification. Fails when a
    /// date bound cannot be parsed.
    pub fn filter_spec(&self) -> Result<FilterSpec> {
        let date_from = self
            .date_from
            .as_deref()
            .map(parse_date_bound)
            .transpose()?;
        let date_to = self.date_to.as_deref().map(parse_date_bound).transpose()?;
        let code = self
            .code
            .as_deref()
            .map(|c| self.classification().map(|cls| cls.normalize_code(c)))
            .transpose()?;

        Ok(FilterSpec::world()
            .with_importer(&self.importer)
            .with_code(code.as_deref())
            .with_exporters(&self.exporters)
            .with_date_range(date_from, date_to))
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: s.data_dir.clone(),
            classification: Some(s.classification.clone()),
            format: Some(s.format.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            data_dir: Some(PathBuf::from("/srv/tariffs")),
            classification: Some("isic".to_string()),
            format: Some("json".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/srv/tariffs")));
        assert_eq!(loaded.classification, Some("isic".to_string()));
        assert_eq!(loaded.format, Some("json".to_string()));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).classification.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).format.is_none());
    }

    // ── Settings parsing ──────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["tariff-dashboard"]);
        assert_eq!(settings.importer, "World");
        assert_eq!(settings.classification, "hs6");
        assert!(settings.code.is_none());
        assert!(settings.exporters.is_empty());
        assert_eq!(settings.format, "table");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_repeated_exporters() {
        let settings = Settings::parse_from([
            "tariff-dashboard",
            "--exporter",
            "China",
            "--exporter",
            "Mexico",
        ]);
        assert_eq!(settings.exporters, vec!["China", "Mexico"]);
    }

    #[test]
    fn test_settings_filter_spec() {
        let settings = Settings::parse_from([
            "tariff-dashboard",
            "--importer",
            "United States",
            "--classification",
            "isic",
            "--code",
            "26",
            "--exporter",
            "China",
            "--date-from",
            "2025-01-01",
            "--date-to",
            "6/30/2025",
        ]);
        assert_eq!(settings.classification().unwrap(), Classification::Isic);

        let spec = settings.filter_spec().unwrap();
        assert_eq!(spec.importer, "United States");
        assert_eq!(spec.classification_code.as_deref(), Some("26"));
        assert!(spec.exporters.contains("China"));
        assert_eq!(spec.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(spec.date_to, NaiveDate::from_ymd_opt(2025, 6, 30));
    }

    #[test]
    fn test_settings_filter_spec_normalizes_isic_code() {
        let settings = Settings::parse_from([
            "tariff-dashboard",
            "--classification",
            "isic",
            "--code",
            "2610",
        ]);
        let spec = settings.filter_spec().unwrap();
        assert_eq!(spec.classification_code.as_deref(), Some("26"));
    }

    #[test]
    fn test_settings_filter_spec_keeps_hs6_code() {
        let settings = Settings::parse_from(["tariff-dashboard", "--code", "020130"]);
        let spec = settings.filter_spec().unwrap();
        assert_eq!(spec.classification_code.as_deref(), Some("020130"));
    }

    #[test]
    fn test_settings_filter_spec_bad_date() {
        let settings = Settings::parse_from(["tariff-dashboard", "--date-from", "soon"]);
        assert!(settings.filter_spec().is_err());
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_format() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            classification: Some("isic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["tariff-dashboard".into()], &config_path);
        assert_eq!(settings.format, "json");
        assert_eq!(settings.classification, "isic");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["tariff-dashboard".into(), "--format".into(), "table".into()],
            &config_path,
        );
        assert_eq!(settings.format, "table");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["tariff-dashboard".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists());
        assert_eq!(settings.format, "table");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["tariff-dashboard".into(), "--debug".into()],
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "tariff-dashboard".into(),
                "--classification".into(),
                "isic".into(),
            ],
            &config_path,
        );

        assert!(config_path.exists());
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.classification, Some("isic".to_string()));
    }
}
