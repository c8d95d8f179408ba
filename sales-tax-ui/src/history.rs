//! Session log of calculator results and its JSON export.
//!
//! The export file is named `historial_impuestos_<YYYYMMDD_HHMMSS>.json` and
//! holds `{exported_at, count, calculations}`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use sales_tax_core::TaxBreakdown;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const EXPORT_PREFIX: &str = "historial_impuestos_";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No calculations to export")]
    Empty,

    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub result: TaxBreakdown,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryExport {
    pub exported_at: DateTime<Local>,
    pub count: usize,
    pub calculations: Vec<HistoryEntry>,
}

/// Calculator results in the order they were produced.
#[derive(Debug, Clone, Default)]
pub struct CalculationHistory {
    entries: Vec<HistoryEntry>,
}

impl CalculationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        result: TaxBreakdown,
    ) {
        self.record_at(result, Local::now());
    }

    pub fn record_at(
        &mut self,
        result: TaxBreakdown,
        timestamp: DateTime<Local>,
    ) {
        self.entries.push(HistoryEntry { timestamp, result });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Writes the history into `dir` and returns the path of the new file.
    pub fn export_to_dir(
        &self,
        dir: &Path,
    ) -> Result<PathBuf, HistoryError> {
        self.export_at(dir, Local::now())
    }

    pub fn export_at(
        &self,
        dir: &Path,
        now: DateTime<Local>,
    ) -> Result<PathBuf, HistoryError> {
        if self.entries.is_empty() {
            return Err(HistoryError::Empty);
        }

        let document = HistoryExport {
            exported_at: now,
            count: self.entries.len(),
            calculations: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let path = dir.join(export_file_name(now));
        fs::write(&path, json).map_err(|source| HistoryError::Write {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), count = document.count, "history exported");
        Ok(path)
    }
}

pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("{EXPORT_PREFIX}{}.json", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sales_tax_core::ProductCategory;
    use sales_tax_core::calculations::compute_tax;

    use super::*;

    fn at(
        h: u32,
        m: u32,
        s: u32,
    ) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 3, 14, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("sales-tax-history-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn file_name_uses_compact_timestamp() {
        assert_eq!(export_file_name(at(9, 5, 7)), "historial_impuestos_20250314_090507.json");
    }

    #[test]
    fn records_in_order() {
        let mut history = CalculationHistory::new();
        let food = compute_tax(dec!(1000), ProductCategory::BasicFood).unwrap();
        let liquor = compute_tax(dec!(2000), ProductCategory::Liquors).unwrap();
        history.record_at(food, at(10, 0, 0));
        history.record_at(liquor, at(10, 0, 1));

        let totals: Vec<_> = history.entries().iter().map(|e| e.result.total_value).collect();
        assert_eq!(totals, vec![dec!(1050), dec!(2880)]);
        assert_eq!(history.len(), 2);

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn empty_history_cannot_be_exported() {
        let dir = scratch_dir("empty");

        let result = CalculationHistory::new().export_at(&dir, at(11, 0, 0));

        assert!(matches!(result, Err(HistoryError::Empty)));
        assert!(!dir.join(export_file_name(at(11, 0, 0))).exists());
    }

    #[test]
    fn export_writes_count_and_calculations() {
        let dir = scratch_dir("export");
        let mut history = CalculationHistory::new();
        history.record_at(compute_tax(dec!(12000), ProductCategory::Fuels).unwrap(), at(12, 0, 0));

        let path = history.export_at(&dir, at(12, 30, 0)).expect("export should succeed");

        let text = fs::read_to_string(&path).expect("read export");
        let document: HistoryExport = serde_json::from_str(&text).expect("valid export JSON");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("historial_impuestos_20250314_123000.json")
        );
        assert_eq!(document.count, 1);
        assert_eq!(document.exported_at, at(12, 30, 0));
        assert_eq!(document.calculations, history.entries().to_vec());
        assert_eq!(document.calculations[0].result.total_tax, dec!(3240));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let mut history = CalculationHistory::new();
        history.record_at(compute_tax(dec!(10), ProductCategory::Other).unwrap(), at(13, 0, 0));

        let result = history.export_at(Path::new("/nonexistent-dir/for/sure"), at(13, 0, 0));

        assert!(matches!(result, Err(HistoryError::Write { .. })));
    }
}
