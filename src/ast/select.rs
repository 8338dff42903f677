//! SQL-shaped relations produced by the rewriter.

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, JoinKind, Ordering};

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    /// Expression in the scope of the owning select
    pub expr: Expr,
    /// `AS` alias
    #[serde(default)]
    pub alias: Option<String>,
    /// Plan-space expression this item stands for
    pub origin: Expr,
    /// Carried only so an enclosing select can order by it
    #[serde(default)]
    pub hidden: bool,
}

impl SelectItem {
    /// An item that is its own origin.
    pub fn new(expr: Expr, alias: Option<String>) -> Self {
        Self {
            origin: expr.clone(),
            expr,
            alias,
            hidden: false,
        }
    }

    /// Name of the column this item produces.
    pub fn output_name(&self) -> &str {
        self.alias
            .as_deref()
            .or_else(|| self.expr.default_name())
            .unwrap_or(COMPUTED_COLUMN)
    }
}

/// Name given to computed items without an alias.
pub const COMPUTED_COLUMN: &str = "c";

/// Renders the first `width` items as `[alias].*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wildcard {
    pub alias: String,
    pub width: usize,
}

/// A FROM or JOIN source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRef {
    Table { name: String, alias: String },
    Derived { select: Box<Select>, alias: String },
}

impl TableRef {
    pub fn alias(&self) -> &str {
        match self {
            TableRef::Table { alias, .. } | TableRef::Derived { alias, .. } => alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Expr,
}

/// A single SELECT statement, possibly nested inside another as a derived table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Select {
    #[serde(default)]
    pub distinct: bool,
    /// Bounded top-N clause
    #[serde(default)]
    pub top: Option<Expr>,
    pub items: Vec<SelectItem>,
    #[serde(default)]
    pub wildcard: Option<Wildcard>,
    /// `None` for a scalar select
    #[serde(default)]
    pub from: Option<TableRef>,
    #[serde(default)]
    pub joins: Vec<JoinClause>,
    #[serde(default)]
    pub filter: Option<Expr>,
    #[serde(default)]
    pub order_by: Vec<Ordering>,
    /// Ordering the rows already satisfy but that this level did not request
    #[serde(default)]
    pub order_implicit: bool,
    /// Filtered on the ranking column of its derived source
    #[serde(default)]
    pub row_bound: bool,
    /// Select list is a counting aggregate
    #[serde(default)]
    pub aggregate: bool,
}

impl Select {
    /// Whether the row set is already cut by TOP or a ranking bound.
    pub fn is_limited(&self) -> bool {
        self.top.is_some() || self.row_bound
    }

    /// Whether any further row operator has to wrap this select first.
    pub fn is_composite(&self) -> bool {
        self.is_limited() || self.distinct || self.aggregate
    }

    /// Items an enclosing select can see.
    pub fn visible_items(&self) -> impl Iterator<Item = &SelectItem> {
        self.items.iter().filter(|item| !item.hidden)
    }

    /// Names of the visible output columns.
    pub fn output_names(&self) -> Vec<&str> {
        self.visible_items().map(SelectItem::output_name).collect()
    }

    /// Aliases the expressions of this select may reference.
    pub fn scope(&self) -> Vec<&str> {
        self.from
            .iter()
            .map(TableRef::alias)
            .chain(self.joins.iter().map(|j| j.table.alias()))
            .collect()
    }

    /// AND a predicate onto the WHERE clause.
    pub fn add_filter(&mut self, predicate: Expr) {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }

    /// Whether the select reads one table unchanged.
    pub fn is_bare_table(&self) -> bool {
        matches!(self.from, Some(TableRef::Table { .. }))
            && self.joins.is_empty()
            && self.filter.is_none()
            && self.order_by.is_empty()
            && !self.is_composite()
            && self.items.iter().all(|item| {
                item.alias.is_none() && !item.hidden && matches!(item.expr, Expr::Column { .. })
            })
    }
}
