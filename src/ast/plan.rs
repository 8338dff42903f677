use serde::{Deserialize, Serialize};

use crate::ast::{AggregateFunc, Expr, JoinKind, Ordering, Parameter};

/// A skip or take count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Literal(u64),
    Param(Parameter),
}

impl Bound {
    /// Whether the bound is the literal zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Bound::Literal(0))
    }

    /// The row count the bound stands for, if its value is one.
    pub fn count(&self) -> Option<u64> {
        match self {
            Bound::Literal(n) => Some(*n),
            Bound::Param(p) => p.value.as_count(),
        }
    }
}

impl From<u64> for Bound {
    fn from(n: u64) -> Self {
        Bound::Literal(n)
    }
}

impl From<Parameter> for Bound {
    fn from(p: Parameter) -> Self {
        Bound::Param(p)
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Literal(n) => write!(f, "{}", n),
            Bound::Param(p) => write!(f, "@{}={}", p.name, p.value),
        }
    }
}

/// A projected expression with an optional output name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub expr: Expr,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Logical operator tree handed over by the upstream planner.
///
/// Expressions anywhere in the tree reference columns by the alias of the
/// scan that produced them; the rewriter re-targets them at whatever derived
/// table holds the column by the time the operator is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Plan {
    Scan {
        table: String,
        alias: String,
        columns: Vec<String>,
    },
    Filter {
        input: Box<Plan>,
        predicate: Expr,
    },
    Project {
        input: Box<Plan>,
        columns: Vec<Projection>,
    },
    Order {
        input: Box<Plan>,
        keys: Vec<Ordering>,
    },
    Page {
        input: Box<Plan>,
        #[serde(default)]
        skip: Option<Bound>,
        #[serde(default)]
        take: Option<Bound>,
    },
    Distinct {
        input: Box<Plan>,
    },
    Join {
        left: Box<Plan>,
        right: Box<Plan>,
        kind: JoinKind,
        on: Expr,
    },
    Count {
        input: Box<Plan>,
        func: AggregateFunc,
    },
    Any {
        input: Box<Plan>,
        #[serde(default)]
        predicate: Option<Expr>,
    },
    All {
        input: Box<Plan>,
        predicate: Expr,
    },
}

impl Plan {
    /// Scan a table under an alias.
    pub fn scan(table: &str, alias: &str, columns: &[&str]) -> Self {
        Plan::Scan {
            table: table.to_string(),
            alias: alias.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn filter(self, predicate: Expr) -> Self {
        Plan::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project(self, columns: impl IntoIterator<Item = Projection>) -> Self {
        Plan::Project {
            input: Box::new(self),
            columns: columns.into_iter().collect(),
        }
    }

    pub fn order_by(self, keys: impl IntoIterator<Item = Ordering>) -> Self {
        Plan::Order {
            input: Box::new(self),
            keys: keys.into_iter().collect(),
        }
    }

    pub fn skip(self, count: impl Into<Bound>) -> Self {
        Plan::Page {
            input: Box::new(self),
            skip: Some(count.into()),
            take: None,
        }
    }

    /// Keep the next `count` rows. A take directly after a skip joins the
    /// same page (drop-then-keep).
    pub fn take(self, count: impl Into<Bound>) -> Self {
        match self {
            Plan::Page {
                input,
                skip: Some(skip),
                take: None,
            } => Plan::Page {
                input,
                skip: Some(skip),
                take: Some(count.into()),
            },
            other => Plan::Page {
                input: Box::new(other),
                skip: None,
                take: Some(count.into()),
            },
        }
    }

    pub fn distinct(self) -> Self {
        Plan::Distinct {
            input: Box::new(self),
        }
    }

    pub fn join(self, right: Plan, kind: JoinKind, on: Expr) -> Self {
        Plan::Join {
            left: Box::new(self),
            right: Box::new(right),
            kind,
            on,
        }
    }

    pub fn count(self) -> Self {
        Plan::Count {
            input: Box::new(self),
            func: AggregateFunc::Count,
        }
    }

    pub fn long_count(self) -> Self {
        Plan::Count {
            input: Box::new(self),
            func: AggregateFunc::LongCount,
        }
    }

    pub fn any(self) -> Self {
        Plan::Any {
            input: Box::new(self),
            predicate: None,
        }
    }

    pub fn any_where(self, predicate: Expr) -> Self {
        Plan::Any {
            input: Box::new(self),
            predicate: Some(predicate),
        }
    }

    pub fn all(self, predicate: Expr) -> Self {
        Plan::All {
            input: Box::new(self),
            predicate,
        }
    }

    /// Every table name and alias the plan mentions.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_table_names(&mut names);
        names
    }

    fn collect_table_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Plan::Scan { table, alias, .. } => {
                names.push(table);
                names.push(alias);
            }
            Plan::Join { left, right, .. } => {
                left.collect_table_names(names);
                right.collect_table_names(names);
            }
            Plan::Filter { input, .. }
            | Plan::Project { input, .. }
            | Plan::Order { input, .. }
            | Plan::Page { input, .. }
            | Plan::Distinct { input }
            | Plan::Count { input, .. }
            | Plan::Any { input, .. }
            | Plan::All { input, .. } => input.collect_table_names(names),
        }
    }

    fn write_tree(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Plan::Scan { table, alias, columns } => {
                return writeln!(f, "{}Scan {} AS {} ({} columns)", pad, table, alias, columns.len());
            }
            Plan::Filter { .. } => writeln!(f, "{}Filter", pad)?,
            Plan::Project { columns, .. } => writeln!(f, "{}Project ({} columns)", pad, columns.len())?,
            Plan::Order { keys, .. } => writeln!(f, "{}Order ({} keys)", pad, keys.len())?,
            Plan::Page { skip, take, .. } => {
                write!(f, "{}Page", pad)?;
                if let Some(skip) = skip {
                    write!(f, " skip={}", skip)?;
                }
                if let Some(take) = take {
                    write!(f, " take={}", take)?;
                }
                writeln!(f)?;
            }
            Plan::Distinct { .. } => writeln!(f, "{}Distinct", pad)?,
            Plan::Join { left, right, kind, .. } => {
                writeln!(f, "{}{}", pad, kind)?;
                left.write_tree(f, depth + 1)?;
                return right.write_tree(f, depth + 1);
            }
            Plan::Count { func, .. } => writeln!(f, "{}{}", pad, func)?,
            Plan::Any { predicate, .. } => {
                writeln!(f, "{}Any{}", pad, if predicate.is_some() { " (predicate)" } else { "" })?
            }
            Plan::All { .. } => writeln!(f, "{}All (predicate)", pad)?,
        }
        match self {
            Plan::Filter { input, .. }
            | Plan::Project { input, .. }
            | Plan::Order { input, .. }
            | Plan::Page { input, .. }
            | Plan::Distinct { input }
            | Plan::Count { input, .. }
            | Plan::Any { input, .. }
            | Plan::All { input, .. } => input.write_tree(f, depth + 1),
            Plan::Scan { .. } | Plan::Join { .. } => Ok(()),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_tree(f, 0)
    }
}
