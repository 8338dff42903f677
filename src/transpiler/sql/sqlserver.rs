use chrono::NaiveDateTime;

use super::super::traits::SqlGenerator;
use crate::ast::AggregateFunc;

/// SQL Server before 2012: no OFFSET/FETCH, paging through ROW_NUMBER().
pub struct SqlServerGenerator;

impl SqlGenerator for SqlServerGenerator {
    fn quote_identifier(&self, id: &str) -> String {
        format!("[{}]", id.replace(']', "]]"))
    }

    fn placeholder(&self, name: &str) -> String {
        format!("@{}", name)
    }

    fn string_literal(&self, value: &str) -> String {
        format!("N'{}'", value.replace('\'', "''"))
    }

    fn bool_literal(&self, val: bool) -> String {
        if val {
            "CAST(1 AS BIT)".to_string()
        } else {
            "CAST(0 AS BIT)".to_string()
        }
    }

    fn datetime_literal(&self, value: &NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%dT%H:%M:%S%.3f"))
    }

    fn concat_operator(&self) -> &str {
        "+"
    }

    fn vacuous_order_key(&self) -> &str {
        "@@RowCount"
    }

    fn supports_top(&self) -> bool {
        true
    }

    fn top_clause(&self, bound: &str) -> Option<String> {
        Some(format!("TOP({})", bound))
    }

    fn count_function(&self, func: AggregateFunc) -> &str {
        match func {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::LongCount => "COUNT_BIG",
        }
    }
}
