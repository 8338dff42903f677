//! Row-number paging transpiler.
//!
//! Rewrites a logical plan into nested selects that page with
//! `ROW_NUMBER()` windows and `TOP`, then renders them for a dialect.

pub mod compose;
pub mod dialect;
pub mod emit;
pub mod ordering;
pub mod paging;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use crate::ast::Plan;
use crate::config::{PagingStrategy, TranslatorConfig};
use crate::error::{RowPageError, RowPageResult};

pub use dialect::Dialect;
pub use emit::{EmitOptions, Translation};
pub use paging::Rewriter;
pub use traits::SqlGenerator;

/// Translates plans under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Produce one statement for `plan`, or an error before any SQL exists.
    pub fn translate(&self, plan: &Plan) -> RowPageResult<Translation> {
        if self.config.paging != PagingStrategy::RowNumber {
            return Err(RowPageError::UnsupportedStrategy(self.config.paging.to_string()));
        }
        let generator = self.config.dialect.generator();
        let select = Rewriter::new(&self.config, generator.as_ref(), plan).rewrite(plan)?;
        compose::validate(&select, &self.config.ranking_column)?;
        tracing::debug!(dialect = %self.config.dialect, "plan rewritten");
        emit::emit(&select, generator.as_ref(), &EmitOptions::from(&self.config))
    }
}

/// Trait for converting plans to SQL.
pub trait ToSql {
    /// Translate with the default configuration (SQL Server, pretty layout).
    fn to_sql(&self) -> RowPageResult<Translation> {
        self.to_sql_with(&TranslatorConfig::default())
    }

    /// Translate with an explicit configuration.
    fn to_sql_with(&self, config: &TranslatorConfig) -> RowPageResult<Translation>;

    /// Translate for a dialect with otherwise default settings.
    fn to_sql_with_dialect(&self, dialect: Dialect) -> RowPageResult<Translation> {
        self.to_sql_with(&TranslatorConfig::for_dialect(dialect))
    }
}

impl ToSql for Plan {
    fn to_sql_with(&self, config: &TranslatorConfig) -> RowPageResult<Translation> {
        Translator::new(config.clone()).translate(self)
    }
}
