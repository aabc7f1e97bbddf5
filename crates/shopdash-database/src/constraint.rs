//! Enumerated-value discovery from stored table definitions.
//!
//! A column restricted by `CHECK (col IN ('a', 'b'))`, or declared as a
//! MySQL `ENUM('a', 'b')`, is rendered as a closed choice. Nothing here
//! ever fails: an unreadable definition is treated as "no enumeration".

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use shopdash_core::types::Credentials;

use crate::introspect::SchemaIntrospector;

/// One single-quoted SQL literal, with an optional charset introducer
/// (`_utf8mb4'x'`) as emitted by `SHOW CREATE TABLE`.
const LITERAL: &str = r"(?:_\w+)?'(?:[^']|'')*'";

static LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'((?:[^']|'')*)'").expect("literal pattern is valid"));

/// Reads enumerations through the schema introspector.
#[derive(Clone)]
pub struct ConstraintExtractor {
    introspector: Arc<dyn SchemaIntrospector>,
}

impl std::fmt::Debug for ConstraintExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintExtractor").finish_non_exhaustive()
    }
}

impl ConstraintExtractor {
    /// Creates an extractor.
    pub fn new(introspector: Arc<dyn SchemaIntrospector>) -> Self {
        Self { introspector }
    }

    /// Legal values of `table.column`, in written order.
    pub async fn enumerated_values(
        &self,
        credentials: &Credentials,
        table: &str,
        column: &str,
    ) -> Option<Vec<String>> {
        let definition = self.definition(credentials, table).await?;
        parse_enumerated_values(&definition, column)
    }

    /// Enumerations for several columns of one table from a single
    /// definition read. Columns without one are absent from the map.
    pub async fn enumerations_for(
        &self,
        credentials: &Credentials,
        table: &str,
        columns: &[String],
    ) -> HashMap<String, Vec<String>> {
        let Some(definition) = self.definition(credentials, table).await else {
            return HashMap::new();
        };
        columns
            .iter()
            .filter_map(|column| {
                parse_enumerated_values(&definition, column).map(|values| (column.clone(), values))
            })
            .collect()
    }

    async fn definition(&self, credentials: &Credentials, table: &str) -> Option<String> {
        match self.introspector.table_definition(credentials, table).await {
            Ok(definition) => definition,
            Err(e) => {
                debug!(table = %table, error = %e, "Table definition unavailable");
                None
            }
        }
    }
}

/// Finds the enumeration for `column` in a stored definition.
///
/// Returns `None` when no `IN (...)` list or `ENUM(...)` type follows the
/// column name, or when the list holds no non-empty literal.
pub fn parse_enumerated_values(definition: &str, column: &str) -> Option<Vec<String>> {
    if column.is_empty() {
        return None;
    }
    let name = regex::escape(column);
    let list = format!(r"\(\s*((?:{LITERAL}\s*,\s*)*{LITERAL})\s*\)");

    let membership = format!(r#"(?:^|[^\w])[`"\[]?{name}[`"\]]?\s+IN\s*{list}"#);
    let enum_type = format!(r#"(?:^|[^\w])[`"\[]?{name}[`"\]]?\s+ENUM\s*{list}"#);

    [membership, enum_type].iter().find_map(|pattern| {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .ok()?;
        let literals = re.captures(definition)?.get(1)?.as_str();
        let values: Vec<String> = LITERAL_RE
            .captures_iter(literals)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().replace("''", "'"))
            .filter(|v| !v.is_empty())
            .collect();
        (!values.is_empty()).then_some(values)
    })
}
