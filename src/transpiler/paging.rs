//! Paging rewriter: turns a logical plan into a tree of selects where
//! skip/take are expressed with `ROW_NUMBER()` windows and `TOP`.

use crate::ast::*;
use crate::config::TranslatorConfig;
use crate::error::{RowPageError, RowPageResult};
use crate::transpiler::compose::{self, AliasGenerator, OuterOp};
use crate::transpiler::ordering;
use crate::transpiler::traits::SqlGenerator;

/// Rows a ranking window keeps, bounds already converted to expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum RowRange {
    /// `rn > skip`
    From(Expr),
    /// `rn <= take`
    UpTo(Expr),
    /// `(rn > skip) AND (rn <= skip + take)`
    Between(Expr, Expr),
}

impl RowRange {
    /// The row-bound predicate over the ranking column, lower bound first.
    pub fn predicate(self, row_number: Expr) -> Expr {
        match self {
            RowRange::From(skip) => row_number.gt(skip),
            RowRange::UpTo(take) => row_number.le(take),
            RowRange::Between(skip, take) => {
                let upper = skip.clone().plus(take);
                row_number.clone().gt(skip).and(row_number.le(upper))
            }
        }
    }
}

/// Rewrites one plan. Holds the alias generator for the statement.
pub struct Rewriter<'a> {
    config: &'a TranslatorConfig,
    generator: &'a dyn SqlGenerator,
    aliases: AliasGenerator,
}

impl<'a> Rewriter<'a> {
    pub fn new(config: &'a TranslatorConfig, generator: &'a dyn SqlGenerator, plan: &Plan) -> Self {
        Self {
            config,
            generator,
            aliases: AliasGenerator::new(&config.alias_prefix, plan.table_names()),
        }
    }

    /// Rewrite the plan root. Scalar operators are only accepted here.
    pub fn rewrite(&mut self, plan: &Plan) -> RowPageResult<Select> {
        match plan {
            Plan::Count { input, func } => {
                let select = self.relation(input)?;
                tracing::debug!(func = %func, "counting rows");
                Ok(compose::compose_over(select, OuterOp::Count(*func), &mut self.aliases))
            }
            Plan::Any { input, predicate } => {
                let mut select = self.relation(input)?;
                if let Some(predicate) = predicate {
                    select = self.filter(select, predicate)?;
                }
                Ok(compose::compose_over(
                    select,
                    OuterOp::Exists { negated: false },
                    &mut self.aliases,
                ))
            }
            Plan::All { input, predicate } => {
                let select = self.relation(input)?;
                // rows of the page failing the predicate; the page itself is cut first
                let select = self.filter(select, &predicate.clone().negate())?;
                Ok(compose::compose_over(
                    select,
                    OuterOp::Exists { negated: true },
                    &mut self.aliases,
                ))
            }
            other => self.relation(other),
        }
    }

    fn relation(&mut self, plan: &Plan) -> RowPageResult<Select> {
        match plan {
            Plan::Scan { table, alias, columns } => scan(table, alias, columns),
            Plan::Filter { input, predicate } => {
                let select = self.relation(input)?;
                self.filter(select, predicate)
            }
            Plan::Project { input, columns } => {
                let select = self.relation(input)?;
                self.project(select, columns)
            }
            Plan::Order { input, keys } => {
                let select = self.relation(input)?;
                self.order(select, keys)
            }
            Plan::Page { input, skip, take } => {
                let select = self.relation(input)?;
                self.page(select, skip.as_ref(), take.as_ref())
            }
            Plan::Distinct { input } => {
                let select = self.relation(input)?;
                Ok(compose::compose_over(select, OuterOp::Distinct, &mut self.aliases))
            }
            Plan::Join { left, right, kind, on } => self.join(left, right, *kind, on),
            Plan::Count { .. } | Plan::Any { .. } | Plan::All { .. } => Err(RowPageError::unsupported(
                "COUNT, ANY and ALL must be the outermost operator of a plan",
            )),
        }
    }

    fn push_down(&mut self, select: Select, pass_through: bool) -> Select {
        compose::push_down(select, &mut self.aliases, pass_through)
    }

    fn filter(&mut self, select: Select, predicate: &Expr) -> RowPageResult<Select> {
        let mut select = if select.is_composite() {
            self.push_down(select, true)
        } else {
            select
        };
        let predicate = compose::resolve(predicate, &select);
        compose::check_scope(&predicate, &select)?;
        select.add_filter(predicate);
        Ok(select)
    }

    fn project(&mut self, select: Select, columns: &[Projection]) -> RowPageResult<Select> {
        if columns.is_empty() {
            return Err(RowPageError::unsupported("projection without columns"));
        }
        let mut select = if select.distinct || select.aggregate {
            self.push_down(select, false)
        } else {
            select
        };
        let mut items = Vec::with_capacity(columns.len());
        for column in columns {
            let expr = compose::resolve(&column.expr, &select);
            compose::check_scope(&expr, &select)?;
            let alias = match &column.alias {
                Some(alias) if expr.default_name() == Some(alias.as_str()) => None,
                Some(alias) => Some(alias.clone()),
                None if expr.default_name().is_none() => Some(COMPUTED_COLUMN.to_string()),
                None => None,
            };
            items.push(SelectItem {
                expr,
                alias,
                origin: column.expr.clone(),
                hidden: false,
            });
        }
        select.items = items;
        select.wildcard = None;
        Ok(select)
    }

    fn order(&mut self, select: Select, keys: &[Ordering]) -> RowPageResult<Select> {
        let mut select = if select.is_composite() {
            self.push_down(select, true)
        } else {
            select
        };
        let mut order_by = Vec::with_capacity(keys.len());
        for key in keys {
            let expr = compose::resolve(&key.expr, &select);
            compose::check_scope(&expr, &select)?;
            order_by.push(Ordering { expr, order: key.order });
        }
        select.order_by = order_by;
        select.order_implicit = false;
        Ok(select)
    }

    fn page(&mut self, select: Select, skip: Option<&Bound>, take: Option<&Bound>) -> RowPageResult<Select> {
        let skip = skip.filter(|b| !b.is_zero());
        if let (Some(skip), Some(take)) = (skip, take) {
            check_upper_bound(skip, take)?;
        }
        let skip = skip.map(bound_expr).transpose()?;
        let take = take.map(bound_expr).transpose()?;
        match (skip, take) {
            (None, None) => Ok(select),
            (None, Some(take)) if self.generator.supports_top() && self.config.prefer_top => {
                Ok(self.top(select, take))
            }
            (None, Some(take)) => self.window(select, RowRange::UpTo(take)),
            (Some(skip), None) => self.window(select, RowRange::From(skip)),
            (Some(skip), Some(take)) => self.window(select, RowRange::Between(skip, take)),
        }
    }

    fn top(&mut self, select: Select, take: Expr) -> Select {
        let mut select = if select.is_limited() || select.aggregate {
            self.push_down(select, true)
        } else {
            select
        };
        tracing::debug!("take applied as TOP");
        select.top = Some(take);
        select
    }

    /// Number the rows of `select` and keep those in `range`.
    fn window(&mut self, select: Select, range: RowRange) -> RowPageResult<Select> {
        let mut select = if select.is_composite() {
            self.push_down(select, true)
        } else {
            select
        };
        let ranking = self.config.ranking_column.clone();
        if select
            .items
            .iter()
            .any(|item| item.output_name().eq_ignore_ascii_case(&ranking))
        {
            return Err(RowPageError::unsupported(format!(
                "column '{}' collides with the ranking column",
                ranking
            )));
        }

        let key = ordering::resolve(&select);
        select
            .items
            .push(SelectItem::new(Expr::RowNumber(key), Some(ranking.clone())));

        let alias = self.aliases.next_alias();
        tracing::debug!(alias = %alias, range = ?range, "paging through ranking window");
        let derived = compose::derive(select, &alias);
        let items = derived
            .items
            .into_iter()
            .filter(|item| item.output_name() != ranking)
            .collect();

        Ok(Select {
            items,
            from: Some(derived.table),
            filter: Some(range.predicate(Expr::column(alias, ranking))),
            order_by: derived.order_by,
            order_implicit: true,
            row_bound: true,
            ..Select::default()
        })
    }

    fn join(&mut self, left: &Plan, right: &Plan, kind: JoinKind, on: &Expr) -> RowPageResult<Select> {
        let left = self.relation(left)?;
        let right = self.relation(right)?;
        let mut select = if left.is_composite() {
            self.push_down(left, false)
        } else {
            left
        };
        let (table, items) = self.join_source(right);
        select.wildcard = None;
        select.items.extend(items);

        let on = compose::resolve(on, &select);
        select.joins.push(JoinClause {
            kind,
            table,
            on: on.clone(),
        });
        compose::check_scope(&on, &select)?;
        Ok(select)
    }

    /// A join operand as a table reference plus the columns it contributes.
    fn join_source(&mut self, mut select: Select) -> (TableRef, Vec<SelectItem>) {
        if select.is_bare_table() {
            if let Some(table) = select.from.take() {
                return (table, select.items);
            }
        }
        let alias = self.aliases.next_alias();
        tracing::debug!(alias = %alias, "join operand derived");
        let derived = compose::derive(select, &alias);
        (derived.table, derived.items)
    }
}

fn scan(table: &str, alias: &str, columns: &[String]) -> RowPageResult<Select> {
    if columns.is_empty() {
        return Err(RowPageError::unsupported(format!(
            "scan of '{}' selects no columns",
            table
        )));
    }
    Ok(Select {
        items: columns
            .iter()
            .map(|column| SelectItem::new(Expr::column(alias, column.as_str()), None))
            .collect(),
        from: Some(TableRef::Table {
            name: table.to_string(),
            alias: alias.to_string(),
        }),
        ..Select::default()
    })
}

/// A skip or take bound as an expression, checked to be a row count.
fn bound_expr(bound: &Bound) -> RowPageResult<Expr> {
    match bound {
        Bound::Literal(n) => i64::try_from(*n)
            .map(Expr::int)
            .map_err(|_| RowPageError::bound(n.to_string(), "literal exceeds the integer range")),
        Bound::Param(p) => match p.value.as_count() {
            Some(_) => Ok(Expr::Param(p.clone())),
            None => Err(RowPageError::bound(
                p.name.clone(),
                format!("expected a non-negative integer, got {}", p.value),
            )),
        },
    }
}

/// `skip + take` is the window's upper row bound and has to stay an integer.
/// Both counts are checked first so a bad bound reports under its own name.
fn check_upper_bound(skip: &Bound, take: &Bound) -> RowPageResult<()> {
    bound_expr(skip)?;
    bound_expr(take)?;
    let (Some(s), Some(t)) = (skip.count(), take.count()) else {
        return Ok(());
    };
    match s.checked_add(t).map(i64::try_from) {
        Some(Ok(_)) => Ok(()),
        _ => Err(RowPageError::bound(
            format!("{} + {}", skip, take),
            "skip + take exceeds the integer range",
        )),
    }
}
