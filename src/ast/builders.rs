//! Ergonomic builder functions for plan expressions.
//!
//! ```
//! use rowpage::ast::builders::*;
//! use rowpage::ast::Plan;
//!
//! let plan = Plan::scan("Customers", "c", &["CustomerID", "City"])
//!     .filter(col("c", "CustomerID").ne(text("VAFFE")))
//!     .order_by([asc(col("c", "City")), asc(col("c", "CustomerID"))])
//!     .skip(param("__p_0", 40))
//!     .take(param("__p_1", 5));
//! assert!(matches!(plan, Plan::Page { .. }));
//! ```

use crate::ast::{Expr, Ordering, Parameter, Projection, Value};

/// Column reference `[table].[name]`.
pub fn col(table: &str, name: &str) -> Expr {
    Expr::column(table, name)
}

/// Integer literal.
pub fn int(n: i64) -> Expr {
    Expr::Literal(Value::Int(n))
}

/// String literal.
pub fn text(s: &str) -> Expr {
    Expr::Literal(Value::String(s.to_string()))
}

/// Any literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Parameter slot usable both as an expression and as a paging bound.
pub fn param(name: &str, value: impl Into<Value>) -> Parameter {
    Parameter::new(name, value)
}

/// Parameter slot as an expression.
pub fn bind(name: &str, value: impl Into<Value>) -> Expr {
    Expr::Param(Parameter::new(name, value))
}

/// Function call.
pub fn func(name: &str, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Function {
        name: name.to_string(),
        args: args.into_iter().collect(),
    }
}

/// `COALESCE(a, b, ...)`
pub fn coalesce(args: impl IntoIterator<Item = Expr>) -> Expr {
    func("COALESCE", args)
}

pub fn asc(expr: Expr) -> Ordering {
    Ordering::asc(expr)
}

pub fn desc(expr: Expr) -> Ordering {
    Ordering::desc(expr)
}

/// Projected expression keeping its natural name.
pub fn proj(expr: Expr) -> Projection {
    Projection { expr, alias: None }
}

/// Projected expression under an explicit name.
pub fn proj_as(expr: Expr, alias: &str) -> Projection {
    Projection {
        expr,
        alias: Some(alias.to_string()),
    }
}
