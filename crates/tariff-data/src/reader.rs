//! CSV loading for the tariff and reference-list datasets.
//!
//! Rows are read with header-named columns into [`RawRow`] maps and then
//! batch-normalised. A malformed row is logged and skipped; only failures
//! that affect the whole file (missing file, unreadable header) are errors.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tariff_core::error::{Result, TariffError};
use tariff_core::models::{Classification, RawRow, TariffRecord};
use tariff_core::normalizer::{ColumnMap, RowNormalizer};
use tracing::{debug, info};

// ── Public API ────────────────────────────────────────────────────────────────

/// Read header-keyed rows from any CSV source.
///
/// Header names are trimmed (and a leading byte-order mark dropped). Rows
/// whose cells are all blank are skipped, as are rows the CSV parser rejects.
pub fn read_rows<R: Read>(source: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(source);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed CSV row {}: {}", index + 1, e);
                skipped += 1;
                continue;
            }
        };

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }

    if skipped > 0 {
        debug!("{} malformed CSV rows skipped", skipped);
    }

    Ok(rows)
}

/// Read header-keyed rows from a file on disk.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).map_err(|source| TariffError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(std::io::BufReader::new(file))
}

/// Normalise already-read rows as a dataset of the given classification.
pub fn normalize_dataset(rows: &[RawRow], classification: Classification) -> Vec<TariffRecord> {
    let normalizer = RowNormalizer::new(
        ColumnMap::for_code_column(classification.code_column()),
        classification.code_mode(),
    );
    normalizer.normalize_all(rows)
}

/// Load and normalise one tariff dataset file.
pub fn load_tariff_dataset(path: &Path, classification: Classification) -> Result<Vec<TariffRecord>> {
    if !path.exists() {
        return Err(TariffError::DataFileNotFound(path.to_path_buf()));
    }

    let rows = read_rows_from_path(path)?;
    let records = normalize_dataset(&rows, classification);

    let undated = records.iter().filter(|r| r.date.is_none()).count();
    info!(
        "Loaded {} {} records from {} ({} without a parseable date)",
        records.len(),
        classification,
        path.display(),
        undated
    );

    Ok(records)
}

/// Collect the trimmed, non-empty values of `column` from a CSV file.
///
/// Order follows the file; deduplication and sorting are left to callers.
pub fn read_column_values(path: &Path, column: &str) -> Result<Vec<String>> {
    let rows = read_rows_from_path(path)?;
    Ok(rows
        .iter()
        .filter_map(|row| row.get(column))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HS6_HEADER: &str = "importer,exporter,date_eff,hs6,tariffs,importsvaluein1000usd,affected_trade_value,affected_trade_share,affected_hs6tariff_line_share";

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    // ── read_rows ─────────────────────────────────────────────────────────────

    #[test]
    fn test_read_rows_keys_by_header() {
        let data = "a,b\n1,2\n3,4\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[1]["b"], "4");
    }

    #[test]
    fn test_read_rows_skips_blank_lines() {
        let data = "a,b\n1,2\n,\n \n3,4\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_read_rows_short_row_keeps_present_cells() {
        let data = "a,b,c\n1,2\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b"], "2");
        assert!(!rows[0].contains_key("c"));
    }

    #[test]
    fn test_read_rows_strips_bom_and_trims_headers() {
        let data = "\u{feff} exporter ,x\nChina,1\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0]["exporter"], "China");
    }

    #[test]
    fn test_read_rows_header_only() {
        let rows = read_rows("a,b\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    // ── load_tariff_dataset ───────────────────────────────────────────────────

    #[test]
    fn test_load_tariff_dataset_hs6() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "hs6tariff.csv",
            &[
                HS6_HEADER,
                "United States,China,2025-04-09,850440,34,10,5000,0.5,1",
                "United States,Mexico,not-a-date,020130,0,2,0,0,0",
            ],
        );

        let records = load_tariff_dataset(&path, Classification::Hs6).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].classification_code, "850440");
        assert!((records[0].trade_value_usd - 10_000.0).abs() < 1e-9);
        // Unparseable dates are kept with `None`, not dropped.
        assert!(records[1].date.is_none());
        assert_eq!(records[1].exporter, "Mexico");
    }

    #[test]
    fn test_load_tariff_dataset_isic_prefix() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "isic2tariff.csv",
            &[
                "importer,exporter,date_eff,isic4_2,tariffs,importsvaluein1000usd",
                "United States,China,1/1/2025,2610,10,1",
                "United States,China,1/1/2025,5,10,1",
            ],
        );

        let records = load_tariff_dataset(&path, Classification::Isic).unwrap();
        assert_eq!(records[0].classification_code, "26");
        assert_eq!(records[1].classification_code, "05");
    }

    #[test]
    fn test_load_tariff_dataset_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_tariff_dataset(&dir.path().join("absent.csv"), Classification::Hs6)
            .unwrap_err();
        assert!(matches!(err, TariffError::DataFileNotFound(_)));
    }

    // ── read_column_values ────────────────────────────────────────────────────

    #[test]
    fn test_read_column_values() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "exporters.csv",
            &["exporter,region", " China ,Asia", ",Nowhere", "Mexico,Americas"],
        );

        let values = read_column_values(&path, "exporter").unwrap();
        assert_eq!(values, vec!["China", "Mexico"]);
    }

    #[test]
    fn test_read_rows_from_path_missing_is_file_read_error() {
        let err = read_rows_from_path(Path::new("/tmp/does-not-exist-tariff-xyz.csv")).unwrap_err();
        assert!(matches!(err, TariffError::FileRead { .. }));
    }
}
