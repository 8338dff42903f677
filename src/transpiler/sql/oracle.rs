use chrono::NaiveDateTime;

use super::super::traits::SqlGenerator;

/// Oracle before 12c: no OFFSET/FETCH and no TOP, every bound goes through ROW_NUMBER().
pub struct OracleGenerator;

impl SqlGenerator for OracleGenerator {
    fn quote_identifier(&self, id: &str) -> String {
        format!("\"{}\"", id.replace('"', "\"\""))
    }

    fn placeholder(&self, name: &str) -> String {
        // Bind names must start with a letter.
        format!(":{}", name.trim_start_matches('_'))
    }

    fn datetime_literal(&self, value: &NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", value.format("%Y-%m-%d %H:%M:%S%.3f"))
    }

    fn vacuous_order_key(&self) -> &str {
        "(SELECT 1 FROM DUAL)"
    }

    fn table_alias(&self, quoted_alias: &str) -> String {
        format!(" {}", quoted_alias)
    }

    fn scalar_from(&self) -> Option<&str> {
        Some("DUAL")
    }
}
