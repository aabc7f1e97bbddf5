//! Form derivation from table metadata.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use shopdash_core::types::{CellValue, Operation};
use shopdash_database::{ColumnInfo, NumericClass, TableSchema};

use super::validate::validate_date;

/// Column-name fragments that mark a date input.
const DATE_KEYWORDS: [&str; 4] = ["date", "dob", "time", "timestamp"];

/// Whether a column name suggests a date value.
pub fn is_date_like(column: &str) -> bool {
    let lowered = column.to_lowercase();
    DATE_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Input control a field renders as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    /// Closed choice between enumerated values.
    Choice {
        /// Options in display order.
        options: Vec<String>,
    },
    /// Date picker producing `YYYY-MM-DD`.
    Date,
    /// Numeric input.
    Number {
        /// `1` for whole numbers, `0.01` otherwise.
        step: f64,
    },
    /// Free text.
    Text,
}

/// Picks the control for a column.
///
/// Precedence: enumerated values, then a date-like name, then a numeric
/// type, then free text.
pub fn control_for(column: &ColumnInfo, enumeration: Option<&Vec<String>>) -> Control {
    if let Some(values) = enumeration.filter(|v| !v.is_empty()) {
        return Control::Choice {
            options: values.clone(),
        };
    }
    if is_date_like(&column.name) {
        return Control::Date;
    }
    match column.numeric_class() {
        Some(NumericClass::Integral) => Control::Number { step: 1.0 },
        Some(NumericClass::Fractional) => Control::Number { step: 0.01 },
        None => Control::Text,
    }
}

/// One rendered input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Column name.
    pub name: String,
    /// Declared column type.
    pub data_type: String,
    /// Control and its options.
    #[serde(flatten)]
    pub control: Control,
    /// A value must be supplied.
    pub required: bool,
    /// Shown but not editable.
    pub read_only: bool,
    /// Pre-filled value.
    pub value: Option<CellValue>,
}

/// The engine-assigned key value shown read-only on create forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextId {
    /// Key column.
    pub column: String,
    /// `max + 1`, or `1` for an empty table.
    pub value: i64,
}

/// Next key value after the stored maximum.
pub fn next_id_after(max: &CellValue) -> i64 {
    max.as_i64().map_or(1, |m| m.saturating_add(1))
}

/// A form to render for one table and operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescription {
    /// Table or view.
    pub table: String,
    /// Operation the form submits.
    pub operation: Operation,
    /// Inputs in column order.
    pub fields: Vec<FormField>,
    /// Auto-assigned key shown read-only (create only).
    pub next_id: Option<NextId>,
    /// Selected row (update only).
    pub row_index: Option<usize>,
    /// Selector labels for every row (update only).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub row_labels: Vec<String>,
    /// Original key of the selected row (update only).
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub key: BTreeMap<String, CellValue>,
}

impl FormDescription {
    /// Looks up a field by column name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Fields for a create form: every column except an engine-numbered key.
pub fn create_fields(schema: &TableSchema, enums: &HashMap<String, Vec<String>>) -> Vec<FormField> {
    let auto_key = schema.auto_increment_key().map(|c| c.name.as_str());

    schema
        .columns
        .iter()
        .filter(|c| Some(c.name.as_str()) != auto_key)
        .map(|column| {
            let control = match control_for(column, enums.get(&column.name)) {
                Control::Choice { options } => Control::Choice {
                    options: std::iter::once(String::new()).chain(options).collect(),
                },
                other => other,
            };
            FormField {
                name: column.name.clone(),
                data_type: column.data_type.clone(),
                control,
                required: column.is_required(),
                read_only: false,
                value: None,
            }
        })
        .collect()
}

/// Fields for an update form pre-populated from `row`.
///
/// Key columns come back read-only and are never part of the SET clause.
pub fn update_fields(
    schema: &TableSchema,
    enums: &HashMap<String, Vec<String>>,
    row: &BTreeMap<String, CellValue>,
) -> Vec<FormField> {
    schema
        .columns
        .iter()
        .map(|column| {
            let current = row.get(&column.name).cloned().unwrap_or(CellValue::Null);

            if schema.is_key(&column.name) {
                return FormField {
                    name: column.name.clone(),
                    data_type: column.data_type.clone(),
                    control: Control::Text,
                    required: false,
                    read_only: true,
                    value: Some(current),
                };
            }

            let control = control_for(column, enums.get(&column.name));
            let (control, value) = match control {
                Control::Choice { options } => {
                    let text = current.as_text().unwrap_or_default();
                    if options.contains(&text) {
                        (Control::Choice { options }, Some(CellValue::Text(text)))
                    } else {
                        let options = std::iter::once(String::new()).chain(options).collect();
                        (Control::Choice { options }, Some(CellValue::Text(String::new())))
                    }
                }
                Control::Date => {
                    let value = current
                        .as_text()
                        .filter(|s| validate_date(s))
                        .map(CellValue::Text);
                    (Control::Date, value)
                }
                other => (other, (!current.is_null()).then_some(current)),
            };

            FormField {
                name: column.name.clone(),
                data_type: column.data_type.clone(),
                control,
                required: column.is_required(),
                read_only: false,
                value,
            }
        })
        .collect()
}
