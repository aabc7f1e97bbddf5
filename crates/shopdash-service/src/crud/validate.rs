//! Submitted-value validation and coercion.
//!
//! Browser submissions arrive as JSON. Each value is checked against the
//! control its column renders as and converted into the [`CellValue`] that
//! gets bound to the statement.

use chrono::NaiveDate;

use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_core::types::CellValue;
use shopdash_database::{ColumnInfo, NumericClass};

use super::form::Control;

/// Checks a strict `YYYY-MM-DD` calendar date.
pub fn validate_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Null or whitespace-only input.
pub(crate) fn is_blank(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn text_of(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts one submitted value for `column` rendered as `control`.
///
/// Blank input becomes `NULL`, or a validation error naming the field when
/// the column requires a value.
pub fn coerce_value(
    column: &ColumnInfo,
    control: &Control,
    raw: &serde_json::Value,
) -> AppResult<CellValue> {
    let name = &column.name;

    if is_blank(raw) {
        if column.is_required() {
            return Err(AppError::validation(format!("Field '{name}' is required")));
        }
        return Ok(CellValue::Null);
    }

    match control {
        Control::Choice { options } => {
            let value = text_of(raw);
            if options.iter().any(|o| o == &value) {
                Ok(CellValue::Text(value))
            } else {
                let allowed: Vec<&str> = options
                    .iter()
                    .map(String::as_str)
                    .filter(|o| !o.is_empty())
                    .collect();
                Err(AppError::validation(format!(
                    "Field '{name}' must be one of: {}",
                    allowed.join(", ")
                )))
            }
        }
        Control::Date => {
            let value = text_of(raw);
            if validate_date(value.trim()) {
                Ok(CellValue::Text(value.trim().to_string()))
            } else {
                Err(AppError::validation(format!(
                    "Invalid date format for {name}. Use yyyy-mm-dd"
                )))
            }
        }
        Control::Number { .. } => coerce_number(column, raw),
        Control::Text => Ok(CellValue::Text(text_of(raw))),
    }
}

fn coerce_number(column: &ColumnInfo, raw: &serde_json::Value) -> AppResult<CellValue> {
    let name = &column.name;
    let value = CellValue::from_json(raw);

    match column.numeric_class() {
        Some(NumericClass::Integral) => {
            let parsed = match &value {
                CellValue::Real(f) if f.fract() != 0.0 => None,
                other => other.as_i64(),
            };
            parsed.map(CellValue::Integer).ok_or_else(|| {
                AppError::validation(format!("Field '{name}' must be a whole number"))
            })
        }
        _ => value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(CellValue::Real)
            .ok_or_else(|| AppError::validation(format!("Field '{name}' must be a number"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn column(name: &str, data_type: &str, nullable: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            autoincrement: false,
            has_default: false,
        }
    }

    #[test]
    fn test_date_validation() {
        assert!(!validate_date("2024-02-30"));
        assert!(validate_date("2024-02-29"));
        assert!(!validate_date("2024/02/29"));
        assert!(!validate_date("2023-02-29"));
        assert!(!validate_date("2024-2-29"));
        assert!(!validate_date("+2024-02-2"));
        assert!(!validate_date(""));
    }

    #[test]
    fn test_blank_nullable_becomes_null() {
        let col = column("Notes", "TEXT", true);
        assert_eq!(coerce_value(&col, &Control::Text, &json!("")).unwrap(), CellValue::Null);
    }

    #[test]
    fn test_blank_required_names_field() {
        let col = column("FirstName", "TEXT", false);
        let err = coerce_value(&col, &Control::Text, &json!("  ")).unwrap_err();
        assert!(err.message.contains("FirstName"));
    }

    #[test]
    fn test_numeric_strings_become_numbers() {
        let qty = column("Quantity", "INTEGER", false);
        let int_control = Control::Number { step: 1.0 };
        assert_eq!(
            coerce_value(&qty, &int_control, &json!("12")).unwrap(),
            CellValue::Integer(12)
        );
        assert!(coerce_value(&qty, &int_control, &json!("1.5")).is_err());
        let err = coerce_value(&qty, &int_control, &json!(1e20)).unwrap_err();
        assert!(err.message.contains("whole number"));

        let price = column("Price", "REAL", false);
        assert_eq!(
            coerce_value(&price, &Control::Number { step: 0.01 }, &json!("19.99")).unwrap(),
            CellValue::Real(19.99)
        );
    }

    #[test]
    fn test_bad_date_names_field() {
        let col = column("OrderDate", "DATE", true);
        let err = coerce_value(&col, &Control::Date, &json!("2024/01/05")).unwrap_err();
        assert!(err.message.contains("OrderDate"));
    }

    #[test]
    fn test_choice_must_be_listed() {
        let col = column("Gender", "TEXT", true);
        let control = Control::Choice {
            options: vec![String::new(), "Male".into(), "Female".into()],
        };
        assert_eq!(
            coerce_value(&col, &control, &json!("Female")).unwrap(),
            CellValue::Text("Female".into())
        );
        let err = coerce_value(&col, &control, &json!("Other")).unwrap_err();
        assert!(err.message.contains("Male, Female"));
    }
}
