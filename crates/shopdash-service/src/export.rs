//! CSV export of table snapshots.

use chrono::NaiveDateTime;

use shopdash_core::error::{AppError, ErrorKind};
use shopdash_core::result::AppResult;
use shopdash_database::TableSnapshot;

/// A rendered CSV download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// `<table>_<YYYYMMDD_HHMMSS>.csv`.
    pub filename: String,
    /// UTF-8 CSV with a header row.
    pub content: Vec<u8>,
}

/// Download name for `table` exported at `at`.
pub fn export_filename(table: &str, at: NaiveDateTime) -> String {
    format!("{table}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Writes a snapshot as CSV. `NULL` cells are written as empty fields.
pub fn to_csv(table: &str, snapshot: &TableSnapshot, at: NaiveDateTime) -> AppResult<CsvExport> {
    let csv_error =
        |e: csv::Error| AppError::with_source(ErrorKind::Internal, format!("CSV export failed: {e}"), e);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&snapshot.columns).map_err(csv_error)?;
    for row in &snapshot.rows {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(csv_error)?;
    }
    let content = writer.into_inner().map_err(|e| {
        AppError::internal(format!("CSV export failed: {}", e.error()))
    })?;

    Ok(CsvExport {
        filename: export_filename(table, at),
        content,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shopdash_core::types::CellValue;

    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_filename_carries_timestamp() {
        assert_eq!(export_filename("orders", at()), "orders_20250307_140509.csv");
    }

    #[test]
    fn test_csv_has_header_and_quotes() {
        let snapshot = TableSnapshot {
            columns: vec!["CustomerID".into(), "Street".into(), "DOB".into()],
            rows: vec![vec![
                CellValue::Integer(1),
                CellValue::Text("12 Main St, Apt 3".into()),
                CellValue::Null,
            ]],
        };
        let export = to_csv("customer", &snapshot, at()).unwrap();
        let text = String::from_utf8(export.content).unwrap();
        assert_eq!(text, "CustomerID,Street,DOB\n1,\"12 Main St, Apt 3\",\n");
    }
}
