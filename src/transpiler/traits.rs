//! Dialect hooks used by the rewriter and the emitter.

use chrono::NaiveDateTime;

use crate::ast::AggregateFunc;

/// Trait for dialect-specific SQL generation.
pub trait SqlGenerator {
    /// Quote an identifier (table, alias or column name).
    fn quote_identifier(&self, name: &str) -> String;

    /// Generate the placeholder for a named parameter slot.
    fn placeholder(&self, name: &str) -> String;

    /// Render a string literal.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Get the boolean literal.
    fn bool_literal(&self, val: bool) -> String {
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn datetime_literal(&self, value: &NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%dT%H:%M:%S%.3f"))
    }

    /// String concatenation operator.
    fn concat_operator(&self) -> &str {
        "||"
    }

    /// Constant ORDER BY target for a ranking window over unordered rows.
    fn vacuous_order_key(&self) -> &str;

    /// Whether `SELECT TOP(n)` is available.
    fn supports_top(&self) -> bool {
        false
    }

    /// The bounded top-N clause placed after SELECT [DISTINCT].
    fn top_clause(&self, _bound: &str) -> Option<String> {
        None
    }

    /// Counting aggregate function name.
    fn count_function(&self, func: AggregateFunc) -> &str {
        match func {
            AggregateFunc::Count | AggregateFunc::LongCount => "COUNT",
        }
    }

    /// Alias suffix after a table or derived table (` AS [t]`).
    fn table_alias(&self, quoted_alias: &str) -> String {
        format!(" AS {}", quoted_alias)
    }

    /// Table a scalar select has to read from, if the dialect needs one.
    fn scalar_from(&self) -> Option<&str> {
        None
    }
}
