//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: plain selects, parameters, configuration and errors
//! - `paging`: single-level skip/take windows
//! - `nesting`: paging of paging, distinct and joins around a page
//! - `quantifiers`: COUNT, LONG COUNT, ANY, ALL over pages
//! - `dialects`: Oracle rendering
//! - `laws`: row-count and composition laws checked on an in-memory evaluator

mod eval;
mod laws;

use crate::ast::Plan;
use crate::config::TranslatorConfig;
use crate::transpiler::ToSql;

/// Full log-style rendering (parameters, blank line, SQL) with default settings.
fn render(plan: &Plan) -> String {
    plan.to_sql().unwrap().to_string()
}

fn render_with(plan: &Plan, config: &TranslatorConfig) -> String {
    plan.to_sql_with(config).unwrap().to_string()
}
