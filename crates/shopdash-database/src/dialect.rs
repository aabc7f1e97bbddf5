//! SQL dialect differences that matter to statement assembly.

use shopdash_core::config::DatabaseEngine;

/// Identifier quoting rules for the configured engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `"double quoted"` identifiers.
    Sqlite,
    /// `` `backtick quoted` `` identifiers.
    Mysql,
}

impl Dialect {
    /// Quotes a table or column name.
    ///
    /// Callers only pass names already confirmed by the introspector; the
    /// quoting keeps mixed-case and reserved-word names intact.
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            Self::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Self::Mysql => format!("`{}`", name.replace('`', "``")),
        }
    }
}

impl From<DatabaseEngine> for Dialect {
    fn from(engine: DatabaseEngine) -> Self {
        match engine {
            DatabaseEngine::Sqlite => Self::Sqlite,
            DatabaseEngine::Mysql => Self::Mysql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(Dialect::Sqlite.quote_ident("orders"), "\"orders\"");
        assert_eq!(Dialect::Mysql.quote_ident("order"), "`order`");
        assert_eq!(Dialect::Sqlite.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Mysql.quote_ident("a`b"), "`a``b`");
    }
}
