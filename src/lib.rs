//! # rowpage
//!
//! Skip/take paging for SQL dialects without OFFSET/FETCH.
//!
//! A logical plan is rewritten into nested derived tables that number rows
//! with `ROW_NUMBER() OVER(ORDER BY ...)` and keep a contiguous range of
//! them, using `TOP(n)` where a plain take suffices.
//!
//! ## Quick Example
//!
//! ```
//! use rowpage::prelude::*;
//!
//! let plan = Plan::scan("Customers", "c", &["CustomerID", "City"])
//!     .order_by([asc(col("c", "CustomerID"))])
//!     .skip(5u64);
//!
//! let translation = plan.to_sql().unwrap();
//! assert!(translation.sql.contains("ROW_NUMBER() OVER(ORDER BY [c].[CustomerID])"));
//! assert!(translation.sql.contains("WHERE [t].[__RowNumber__] > 5"));
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::config::{Layout, PagingStrategy, TranslatorConfig};
    pub use crate::error::*;
    pub use crate::transpiler::{Dialect, ToSql, Translation, Translator};
}

/// Translate a plan with the given configuration.
///
/// # Example
///
/// ```
/// use rowpage::prelude::*;
///
/// let plan = Plan::scan("Customers", "c", &["CustomerID"]).take(10u64);
/// let out = rowpage::translate(&plan, &TranslatorConfig::default()).unwrap();
/// assert_eq!(out.sql, "SELECT TOP(10) [c].[CustomerID]\nFROM [Customers] AS [c]");
/// ```
pub fn translate(
    plan: &ast::Plan,
    config: &config::TranslatorConfig,
) -> Result<transpiler::Translation, error::RowPageError> {
    transpiler::Translator::new(config.clone()).translate(plan)
}
