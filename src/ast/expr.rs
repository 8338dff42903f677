use serde::{Deserialize, Serialize};

use crate::ast::{AggregateFunc, BinaryOp, Parameter, Select, SortOrder, Value};

/// A scalar expression, shared by the logical plan and the rewritten select tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Qualified column reference (`[table].[name]`). An empty qualifier
    /// renders the bare name.
    Column { table: String, name: String },
    /// Inline literal
    Literal(Value),
    /// Named parameter slot
    Param(Parameter),
    /// Binary expression (left op right)
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Logical negation
    Not(Box<Expr>),
    /// Function call (COALESCE, LEN, ...)
    Function { name: String, args: Vec<Expr> },
    /// `ROW_NUMBER() OVER(ORDER BY ...)`
    RowNumber(OrderKey),
    /// `COUNT(*)` / `COUNT_BIG(*)`
    Count(AggregateFunc),
    /// `[NOT] EXISTS (subquery)`
    Exists { select: Box<Select>, negated: bool },
    /// Predicate turned into a boolean value (`CASE WHEN p THEN 1 ELSE 0 END`)
    Truth(Box<Expr>),
}

impl Expr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn int(n: i64) -> Self {
        Expr::Literal(Value::Int(n))
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Eq, other)
    }

    pub fn ne(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Ne, other)
    }

    pub fn gt(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Gt, other)
    }

    pub fn ge(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Ge, other)
    }

    pub fn lt(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Lt, other)
    }

    pub fn le(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Le, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::And, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Or, other)
    }

    pub fn concat(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOp::Concat, other)
    }

    /// Addition that folds two integer literals.
    pub fn plus(self, other: Expr) -> Self {
        match (&self, &other) {
            (Expr::Literal(Value::Int(a)), Expr::Literal(Value::Int(b))) => match a.checked_add(*b) {
                Some(sum) => Expr::int(sum),
                None => Expr::binary(self, BinaryOp::Add, other),
            },
            _ => Expr::binary(self, BinaryOp::Add, other),
        }
    }

    /// Logical negation, flipping comparisons instead of wrapping them.
    pub fn negate(self) -> Self {
        match self {
            Expr::Not(inner) => *inner,
            Expr::Binary { left, op, right } => match op.inverse() {
                Some(inverse) => Expr::Binary {
                    left,
                    op: inverse,
                    right,
                },
                None => Expr::Not(Box::new(Expr::Binary { left, op, right })),
            },
            Expr::Exists { select, negated } => Expr::Exists {
                select,
                negated: !negated,
            },
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Output name this expression gets in a select list when it has no alias.
    pub fn default_name(&self) -> Option<&str> {
        match self {
            Expr::Column { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Visit every column reference outside nested subqueries.
    pub fn for_each_column<'a>(&'a self, f: &mut dyn FnMut(&'a str, &'a str)) {
        match self {
            Expr::Column { table, name } => f(table, name),
            Expr::Binary { left, right, .. } => {
                left.for_each_column(f);
                right.for_each_column(f);
            }
            Expr::Not(inner) | Expr::Truth(inner) => inner.for_each_column(f),
            Expr::Function { args, .. } => args.iter().for_each(|a| a.for_each_column(f)),
            Expr::RowNumber(OrderKey::Explicit(keys)) => {
                keys.iter().for_each(|k| k.expr.for_each_column(f))
            }
            Expr::RowNumber(OrderKey::Unspecified)
            | Expr::Literal(_)
            | Expr::Param(_)
            | Expr::Count(_)
            | Expr::Exists { .. } => {}
        }
    }

    /// Rebuild the expression bottom-up, letting `f` replace any node first.
    pub fn rewrite(&self, f: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
        if let Some(replaced) = f(self) {
            return replaced;
        }
        match self {
            Expr::Binary { left, op, right } => Expr::Binary {
                left: Box::new(left.rewrite(f)),
                op: *op,
                right: Box::new(right.rewrite(f)),
            },
            Expr::Not(inner) => Expr::Not(Box::new(inner.rewrite(f))),
            Expr::Truth(inner) => Expr::Truth(Box::new(inner.rewrite(f))),
            Expr::Function { name, args } => Expr::Function {
                name: name.clone(),
                args: args.iter().map(|a| a.rewrite(f)).collect(),
            },
            Expr::RowNumber(OrderKey::Explicit(keys)) => Expr::RowNumber(OrderKey::Explicit(
                keys.iter()
                    .map(|k| Ordering {
                        expr: k.expr.rewrite(f),
                        order: k.order,
                    })
                    .collect(),
            )),
            other => other.clone(),
        }
    }
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub expr: Expr,
    #[serde(default)]
    pub order: SortOrder,
}

impl Ordering {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Desc,
        }
    }
}

/// The ordering a ranking window numbers rows by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    /// Keys taken from the relation being paged
    Explicit(Vec<Ordering>),
    /// No order requested: stable for one evaluation, otherwise unspecified.
    /// Rendered as the dialect's vacuous key.
    Unspecified,
}
