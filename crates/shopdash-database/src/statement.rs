//! Parameterized statement builders.
//!
//! Data values are always carried as named bound parameters; the only text
//! ever interpolated into SQL is a quoted identifier. Both supported engines
//! bind positionally, so each named parameter is rendered as `?` and bound in
//! declaration order.

use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_core::types::CellValue;

use crate::dialect::Dialect;

/// A named value bound to one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    /// Placeholder name (column name, or `pk_<column>` for key predicates).
    pub name: String,
    /// Bound value.
    pub value: CellValue,
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with positional placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<BoundParam>,
}

impl Statement {
    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter.
    pub fn bind(mut self, name: impl Into<String>, value: CellValue) -> Self {
        self.params.push(BoundParam {
            name: name.into(),
            value,
        });
        self
    }

    /// Parameter names in order, for logging without values.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// `SELECT * FROM <table>`.
    pub fn select_all(dialect: Dialect, table: &str) -> Self {
        Self::raw(format!("SELECT * FROM {}", dialect.quote_ident(table)))
    }

    /// `SELECT MAX(<column>) FROM <table>`.
    pub fn max_of(dialect: Dialect, table: &str, column: &str) -> Self {
        Self::raw(format!(
            "SELECT MAX({}) AS max_id FROM {}",
            dialect.quote_ident(column),
            dialect.quote_ident(table)
        ))
    }

    /// `INSERT INTO <table> (<cols>) VALUES (?, …)`.
    pub fn insert(dialect: Dialect, table: &str, values: &[(String, CellValue)]) -> AppResult<Self> {
        if values.is_empty() {
            return Err(AppError::validation(format!(
                "No fields were provided for a new record in '{table}'"
            )));
        }

        let columns: Vec<String> = values
            .iter()
            .map(|(column, _)| dialect.quote_ident(column))
            .collect();
        let placeholders = vec!["?"; values.len()].join(", ");

        let mut stmt = Self::raw(format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            dialect.quote_ident(table),
            columns.join(", ")
        ));
        for (column, value) in values {
            stmt = stmt.bind(column.clone(), value.clone());
        }
        Ok(stmt)
    }

    /// `UPDATE <table> SET <col> = ?, … WHERE <pk> = ? AND …`.
    ///
    /// Key columns are never written: any that slipped into `values` are
    /// dropped from the SET clause.
    pub fn update(
        dialect: Dialect,
        table: &str,
        values: &[(String, CellValue)],
        key: &[(String, CellValue)],
    ) -> AppResult<Self> {
        if key.is_empty() {
            return Err(AppError::validation(format!(
                "Refusing to update '{table}' without a primary key"
            )));
        }

        let assignments: Vec<&(String, CellValue)> = values
            .iter()
            .filter(|(column, _)| !key.iter().any(|(k, _)| k == column))
            .collect();
        if assignments.is_empty() {
            return Err(AppError::validation(format!(
                "No editable fields were provided for '{table}'"
            )));
        }

        let set_clause: Vec<String> = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", dialect.quote_ident(column)))
            .collect();

        let mut stmt = Self::raw(format!(
            "UPDATE {} SET {} WHERE {}",
            dialect.quote_ident(table),
            set_clause.join(", "),
            key_predicate(dialect, key)
        ));
        for (column, value) in assignments {
            stmt = stmt.bind(column.clone(), value.clone());
        }
        for (column, value) in key {
            stmt = stmt.bind(format!("pk_{column}"), value.clone());
        }
        Ok(stmt)
    }

    /// `DELETE FROM <table> WHERE <pk> = ? AND …`.
    pub fn delete(dialect: Dialect, table: &str, key: &[(String, CellValue)]) -> AppResult<Self> {
        if key.is_empty() {
            return Err(AppError::validation(format!(
                "Refusing to delete from '{table}' without a primary key"
            )));
        }

        let mut stmt = Self::raw(format!(
            "DELETE FROM {} WHERE {}",
            dialect.quote_ident(table),
            key_predicate(dialect, key)
        ));
        for (column, value) in key {
            stmt = stmt.bind(format!("pk_{column}"), value.clone());
        }
        Ok(stmt)
    }
}

fn key_predicate(dialect: Dialect, key: &[(String, CellValue)]) -> String {
    key.iter()
        .map(|(column, _)| format!("{} = ?", dialect.quote_ident(column)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(column: &str, value: CellValue) -> (String, CellValue) {
        (column.to_string(), value)
    }

    #[test]
    fn test_insert_binds_every_value() {
        let stmt = Statement::insert(
            Dialect::Sqlite,
            "customer",
            &[
                pair("FirstName", CellValue::Text("Ana".into())),
                pair("Gender", CellValue::Text("Female".into())),
            ],
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT INTO \"customer\" (\"FirstName\", \"Gender\") VALUES (?, ?)"
        );
        assert_eq!(stmt.param_names(), vec!["FirstName", "Gender"]);
        assert!(!stmt.sql.contains("Ana"));
    }

    #[test]
    fn test_update_never_sets_key_columns() {
        let stmt = Statement::update(
            Dialect::Mysql,
            "orders",
            &[
                pair("OrderID", CellValue::Integer(99)),
                pair("TotalAmount", CellValue::Real(10.5)),
            ],
            &[pair("OrderID", CellValue::Integer(7))],
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE `orders` SET `TotalAmount` = ? WHERE `OrderID` = ?"
        );
        assert_eq!(stmt.param_names(), vec!["TotalAmount", "pk_OrderID"]);
        assert_eq!(stmt.params[1].value, CellValue::Integer(7));
    }

    #[test]
    fn test_update_with_only_key_columns_is_rejected() {
        let err = Statement::update(
            Dialect::Sqlite,
            "orders",
            &[pair("OrderID", CellValue::Integer(1))],
            &[pair("OrderID", CellValue::Integer(1))],
        )
        .unwrap_err();
        assert_eq!(err.kind, shopdash_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_delete_uses_full_composite_key() {
        let stmt = Statement::delete(
            Dialect::Sqlite,
            "productDiscount",
            &[
                pair("ProductID", CellValue::Integer(3)),
                pair("DiscountID", CellValue::Integer(5)),
            ],
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "DELETE FROM \"productDiscount\" WHERE \"ProductID\" = ? AND \"DiscountID\" = ?"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_delete_without_key_is_rejected() {
        assert!(Statement::delete(Dialect::Mysql, "orders", &[]).is_err());
    }
}
