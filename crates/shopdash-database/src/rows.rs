//! Dynamically typed result sets.

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

use shopdash_core::types::CellValue;

/// A fully materialized query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row values, each aligned with `columns`.
    pub rows: Vec<Vec<CellValue>>,
}

impl TableSnapshot {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// A row by display index.
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// One cell by row index and column name.
    pub fn value(&self, index: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(index).and_then(|row| row.get(col))
    }

    /// Every value of one column.
    pub fn column_values(&self, column: &str) -> Vec<CellValue> {
        match self.column_index(column) {
            Some(col) => self
                .rows
                .iter()
                .filter_map(|row| row.get(col).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Selector label for a row: `Row N: {col: value, …}`.
    pub fn row_label(&self, index: usize) -> Option<String> {
        let row = self.rows.get(index)?;
        let fields: Vec<String> = self
            .columns
            .iter()
            .zip(row.iter())
            .map(|(column, value)| match value {
                CellValue::Text(s) => format!("'{column}': '{s}'"),
                CellValue::Null => format!("'{column}': None"),
                other => format!("'{column}': {other}"),
            })
            .collect();
        Some(format!("Row {index}: {{{}}}", fields.join(", ")))
    }

    /// Index of the first row whose `column` equals `value`.
    pub fn find_row(&self, column: &str, value: &CellValue) -> Option<usize> {
        let col = self.column_index(column)?;
        self.rows
            .iter()
            .position(|row| row.get(col).is_some_and(|v| cells_match(v, value)))
    }
}

/// Loose equality used when matching submitted keys against stored values.
pub fn cells_match(stored: &CellValue, submitted: &CellValue) -> bool {
    if stored == submitted {
        return true;
    }
    match (stored.as_i64(), submitted.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => match (stored.as_text(), submitted.as_text()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Decodes one SQLite row by inspecting each value's storage class.
pub(crate) fn decode_sqlite_row(row: &SqliteRow) -> Vec<CellValue> {
    (0..row.len())
        .map(|i| {
            let Ok(raw) = row.try_get_raw(i) else {
                return CellValue::Null;
            };
            if raw.is_null() {
                return CellValue::Null;
            }
            let class = raw.type_info().name().to_uppercase();
            match class.as_str() {
                "INTEGER" | "BOOLEAN" => row
                    .try_get_unchecked::<i64, _>(i)
                    .map(CellValue::Integer)
                    .unwrap_or(CellValue::Null),
                "REAL" => row
                    .try_get_unchecked::<f64, _>(i)
                    .map(CellValue::Real)
                    .unwrap_or(CellValue::Null),
                "BLOB" => row
                    .try_get_unchecked::<Vec<u8>, _>(i)
                    .map(CellValue::Blob)
                    .unwrap_or(CellValue::Null),
                _ => row
                    .try_get_unchecked::<String, _>(i)
                    .map(CellValue::Text)
                    .unwrap_or(CellValue::Null),
            }
        })
        .collect()
}

/// Decodes one MySQL row using the column type reported by the server.
pub(crate) fn decode_mysql_row(row: &MySqlRow) -> Vec<CellValue> {
    (0..row.len()).map(|i| decode_mysql_value(row, i)).collect()
}

fn decode_mysql_value(row: &MySqlRow, i: usize) -> CellValue {
    let Ok(raw) = row.try_get_raw(i) else {
        return CellValue::Null;
    };
    if raw.is_null() {
        return CellValue::Null;
    }
    let type_name = raw.type_info().name().to_uppercase();

    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get_unchecked::<bool, _>(i).map(CellValue::Bool).ok(),
        t if t.ends_with("INT UNSIGNED") => row
            .try_get_unchecked::<u64, _>(i)
            .ok()
            .map(|v| match i64::try_from(v) {
                Ok(v) => CellValue::Integer(v),
                Err(_) => CellValue::Real(v as f64),
            }),
        t if t.ends_with("INT") || t == "YEAR" => {
            row.try_get_unchecked::<i64, _>(i).map(CellValue::Integer).ok()
        }
        "FLOAT" => row
            .try_get_unchecked::<f32, _>(i)
            .map(|v| CellValue::Real(f64::from(v)))
            .ok(),
        "DOUBLE" => row.try_get_unchecked::<f64, _>(i).map(CellValue::Real).ok(),
        "DECIMAL" => row
            .try_get_unchecked::<String, _>(i)
            .ok()
            .map(|s| match s.parse::<f64>() {
                Ok(v) => CellValue::Real(v),
                Err(_) => CellValue::Text(s),
            }),
        "DATE" => row
            .try_get_unchecked::<chrono::NaiveDate, _>(i)
            .map(|d| CellValue::Text(d.format("%Y-%m-%d").to_string()))
            .ok(),
        "DATETIME" => row
            .try_get_unchecked::<chrono::NaiveDateTime, _>(i)
            .map(|d| CellValue::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .ok(),
        "TIMESTAMP" => row
            .try_get_unchecked::<chrono::DateTime<chrono::Utc>, _>(i)
            .map(|d| CellValue::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .ok(),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get_unchecked::<Vec<u8>, _>(i)
            .ok()
            .map(|bytes| match String::from_utf8(bytes) {
                Ok(s) => CellValue::Text(s),
                Err(e) => CellValue::Blob(e.into_bytes()),
            }),
        _ => None,
    };

    decoded
        .or_else(|| row.try_get_unchecked::<String, _>(i).map(CellValue::Text).ok())
        .or_else(|| {
            row.try_get_unchecked::<Vec<u8>, _>(i)
                .map(|bytes| CellValue::Text(String::from_utf8_lossy(&bytes).into_owned()))
                .ok()
        })
        .unwrap_or(CellValue::Null)
}
