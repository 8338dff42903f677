//! Derived-table composition: alias allocation, column propagation and the
//! wrapping rule for operators layered on top of a paged select.

use std::collections::HashSet;

use crate::ast::*;
use crate::error::{RowPageError, RowPageResult};

/// Hands out derived-table aliases (`t`, `t0`, `t1`, ...) for one statement.
///
/// Every table name and alias of the plan is reserved up front, so a derived
/// alias never shadows a user-visible name. Comparison is case-insensitive.
#[derive(Debug)]
pub struct AliasGenerator {
    prefix: String,
    counter: Option<usize>,
    taken: HashSet<String>,
}

impl AliasGenerator {
    pub fn new<'a>(prefix: &str, reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: None,
            taken: reserved.into_iter().map(str::to_lowercase).collect(),
        }
    }

    pub fn next_alias(&mut self) -> String {
        loop {
            let candidate = match self.counter {
                None => self.prefix.clone(),
                Some(n) => format!("{}{}", self.prefix, n),
            };
            self.counter = Some(self.counter.map_or(0, |n| n + 1));
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
        }
    }
}

/// Operators that consume the surviving columns of a (possibly paged) select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterOp {
    Distinct,
    Count(AggregateFunc),
    Exists { negated: bool },
}

/// A select turned into a derived table, with references to it from outside.
#[derive(Debug)]
pub struct Derived {
    pub table: TableRef,
    /// Visible columns, addressed through the derived alias
    pub items: Vec<SelectItem>,
    /// Ordering of the inner rows, addressed through the derived alias
    pub order_by: Vec<Ordering>,
    pub order_implicit: bool,
    /// Hidden columns exist, so `[alias].*` would expose them
    pub opaque: bool,
}

/// Turn `inner` into a derived table named `alias`.
///
/// Duplicate output names are renamed, the ordering is re-expressed against
/// the alias (projecting hidden columns for keys that are not selected), and
/// the inner `ORDER BY` survives only under `TOP`.
pub fn derive(mut inner: Select, alias: &str) -> Derived {
    uniquify(&mut inner);

    let mut order_by = Vec::with_capacity(inner.order_by.len());
    let keys = inner.order_by.clone();
    for ordering in keys {
        let name = match inner.items.iter().find(|item| item.expr == ordering.expr) {
            Some(item) => item.output_name().to_string(),
            None => {
                let name = fresh_name(&inner);
                inner.items.push(SelectItem {
                    expr: ordering.expr.clone(),
                    alias: Some(name.clone()),
                    origin: ordering.expr.clone(),
                    hidden: true,
                });
                name
            }
        };
        order_by.push(Ordering {
            expr: Expr::column(alias, name),
            order: ordering.order,
        });
    }

    let order_implicit = inner.top.is_some() || inner.order_implicit;
    if inner.top.is_none() {
        inner.order_by.clear();
        inner.order_implicit = false;
    }

    let opaque = inner.items.iter().any(|item| item.hidden);
    let items = inner
        .visible_items()
        .map(|item| SelectItem {
            expr: Expr::column(alias, item.output_name()),
            alias: None,
            origin: item.origin.clone(),
            hidden: false,
        })
        .collect();

    Derived {
        table: TableRef::Derived {
            select: Box::new(inner),
            alias: alias.to_string(),
        },
        items,
        order_by,
        order_implicit,
        opaque,
    }
}

/// Wrap `select` in `SELECT ... FROM (select) AS [alias]`.
///
/// With `pass_through` the outer list renders as `[alias].*` when that is
/// exactly the visible column set.
pub fn push_down(select: Select, aliases: &mut AliasGenerator, pass_through: bool) -> Select {
    let alias = aliases.next_alias();
    let derived = derive(select, &alias);
    let wildcard = (pass_through && !derived.opaque && !derived.items.is_empty()).then(|| Wildcard {
        alias: alias.clone(),
        width: derived.items.len(),
    });
    tracing::debug!(alias = %alias, columns = derived.items.len(), "pushed select down");
    Select {
        items: derived.items,
        wildcard,
        from: Some(derived.table),
        order_by: derived.order_by,
        order_implicit: derived.order_implicit,
        ..Select::default()
    }
}

/// Re-express a plan-space expression in the scope of `select`.
pub fn resolve(expr: &Expr, select: &Select) -> Expr {
    expr.rewrite(&|node| {
        select
            .visible_items()
            .find(|item| &item.origin == node)
            .map(|item| item.expr.clone())
    })
}

/// Fail when `expr` references a table alias the select cannot see.
pub fn check_scope(expr: &Expr, select: &Select) -> RowPageResult<()> {
    let scope = select.scope();
    let mut missing: Option<(String, String)> = None;
    expr.for_each_column(&mut |table, name| {
        if missing.is_none() && !table.is_empty() && !scope.iter().any(|s| s.eq_ignore_ascii_case(table)) {
            missing = Some((table.to_string(), name.to_string()));
        }
    });
    match missing {
        Some((table, column)) => Err(RowPageError::ColumnOutOfScope { table, column }),
        None => Ok(()),
    }
}

fn marker() -> SelectItem {
    SelectItem::new(Expr::int(1), Some(COMPUTED_COLUMN.to_string()))
}

/// Reduce `select` to a constant marker column when only row existence matters.
///
/// For a ranking-bound select the marker goes into the windowed source so the
/// full column list is never materialized. Distinct selects keep their columns.
pub fn narrow(mut select: Select) -> Select {
    if select.top.is_none() {
        select.order_by.clear();
        select.order_implicit = false;
    }
    if select.distinct || select.aggregate {
        return select;
    }
    if select.row_bound {
        if let Some(TableRef::Derived { select: inner, alias }) = select.from.as_mut() {
            let ranking = inner
                .items
                .iter()
                .position(|item| matches!(item.expr, Expr::RowNumber(_)));
            if let Some(position) = ranking {
                let ranking_item = inner.items.swap_remove(position);
                inner.items = vec![marker(), ranking_item];
                inner.wildcard = None;
                select.items = vec![SelectItem::new(Expr::column(alias.as_str(), COMPUTED_COLUMN), None)];
                select.wildcard = None;
                select.order_by.clear();
                select.order_implicit = false;
                return select;
            }
        }
    }
    select.items = vec![marker()];
    select.wildcard = None;
    select
}

/// Apply an outer operator to `select`, wrapping it first when it is paged,
/// distinct or aggregated. The outer operator only ever sees surviving
/// columns; the ranking column stays inside the window subquery.
pub fn compose_over(select: Select, op: OuterOp, aliases: &mut AliasGenerator) -> Select {
    match op {
        OuterOp::Distinct => {
            let mut outer = if select.is_limited() || select.aggregate {
                push_down(select, aliases, true)
            } else {
                select
            };
            outer.distinct = true;
            retain_projected_order(&mut outer);
            outer
        }
        OuterOp::Count(func) => {
            // no ordering survives a count, so the page is wrapped without carrying it
            let mut outer = if select.is_composite() {
                let mut inner = narrow(select);
                uniquify(&mut inner);
                Select {
                    from: Some(TableRef::Derived {
                        select: Box::new(inner),
                        alias: aliases.next_alias(),
                    }),
                    ..Select::default()
                }
            } else {
                select
            };
            outer.items = vec![SelectItem::new(Expr::Count(func), None)];
            outer.wildcard = None;
            outer.order_by.clear();
            outer.order_implicit = false;
            outer.aggregate = true;
            outer
        }
        OuterOp::Exists { negated } => {
            let probe = narrow(select);
            Select {
                items: vec![SelectItem::new(
                    Expr::Truth(Box::new(Expr::Exists {
                        select: Box::new(probe),
                        negated,
                    })),
                    None,
                )],
                aggregate: true,
                ..Select::default()
            }
        }
    }
}

/// DISTINCT may only order by selected expressions.
fn retain_projected_order(select: &mut Select) {
    let projected = select
        .order_by
        .iter()
        .all(|ordering| select.visible_items().any(|item| item.expr == ordering.expr));
    if !projected {
        select.order_by.clear();
        select.order_implicit = false;
    }
}

/// Give every item a distinct output name (`c0`, `c1`, ... for repeats).
fn uniquify(select: &mut Select) {
    let claimed: HashSet<String> = select
        .items
        .iter()
        .map(|item| item.output_name().to_lowercase())
        .collect();
    let mut seen = HashSet::new();
    let mut counter = 0;
    let mut renamed_wildcard = false;
    let width = select.wildcard.as_ref().map_or(0, |w| w.width);

    for (index, item) in select.items.iter_mut().enumerate() {
        if seen.insert(item.output_name().to_lowercase()) {
            continue;
        }
        let fresh = loop {
            let candidate = format!("{}{}", COMPUTED_COLUMN, counter);
            counter += 1;
            if !claimed.contains(&candidate) && !seen.contains(&candidate) {
                break candidate;
            }
        };
        seen.insert(fresh.clone());
        item.alias = Some(fresh);
        renamed_wildcard |= index < width;
    }
    if renamed_wildcard {
        select.wildcard = None;
    }
}

fn fresh_name(select: &Select) -> String {
    let names: HashSet<String> = select
        .items
        .iter()
        .map(|item| item.output_name().to_lowercase())
        .collect();
    (0..)
        .map(|n| format!("{}{}", COMPUTED_COLUMN, n))
        .find(|candidate| !names.contains(candidate))
        .unwrap_or_else(|| COMPUTED_COLUMN.to_string())
}

/// Check statement-wide invariants before any text is produced.
pub fn validate(root: &Select, ranking_column: &str) -> RowPageResult<()> {
    if root
        .output_names()
        .iter()
        .any(|name| name.eq_ignore_ascii_case(ranking_column))
    {
        return Err(RowPageError::invariant(format!(
            "ranking column '{}' is visible in the final select list",
            ranking_column
        )));
    }
    let mut aliases = HashSet::new();
    validate_select(root, &mut aliases)
}

fn validate_select(select: &Select, aliases: &mut HashSet<String>) -> RowPageResult<()> {
    if select.items.is_empty() {
        return Err(RowPageError::invariant("select list is empty"));
    }
    let tables = select.from.iter().chain(select.joins.iter().map(|j| &j.table));
    for table in tables {
        if !aliases.insert(table.alias().to_lowercase()) {
            return Err(RowPageError::invariant(format!(
                "alias '{}' is used more than once",
                table.alias()
            )));
        }
        if let TableRef::Derived { select: inner, .. } = table {
            validate_select(inner, aliases)?;
        }
    }
    let exprs = select
        .items
        .iter()
        .map(|item| &item.expr)
        .chain(select.filter.iter())
        .chain(select.joins.iter().map(|j| &j.on));
    for expr in exprs {
        validate_expr(expr, aliases)?;
    }
    Ok(())
}

fn validate_expr(expr: &Expr, aliases: &mut HashSet<String>) -> RowPageResult<()> {
    match expr {
        Expr::RowNumber(OrderKey::Explicit(keys)) if keys.is_empty() => {
            Err(RowPageError::invariant("ranking window with an empty explicit order key"))
        }
        Expr::Exists { select, .. } => validate_select(select, aliases),
        Expr::Truth(inner) | Expr::Not(inner) => validate_expr(inner, aliases),
        Expr::Binary { left, right, .. } => {
            validate_expr(left, aliases)?;
            validate_expr(right, aliases)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;

    fn customers() -> Select {
        Select {
            items: ["CustomerID", "City"]
                .iter()
                .map(|c| SelectItem::new(col("c", c), None))
                .collect(),
            from: Some(TableRef::Table {
                name: "Customers".into(),
                alias: "c".into(),
            }),
            ..Select::default()
        }
    }

    #[test]
    fn test_alias_generator_skips_reserved() {
        let mut aliases = AliasGenerator::new("t", ["Customers", "c", "T0"]);
        assert_eq!(aliases.next_alias(), "t");
        assert_eq!(aliases.next_alias(), "t1");
        assert_eq!(aliases.next_alias(), "t2");
    }

    #[test]
    fn test_alias_generator_reserves_prefix() {
        let mut aliases = AliasGenerator::new("t", ["t"]);
        assert_eq!(aliases.next_alias(), "t0");
    }

    #[test]
    fn test_push_down_carries_order_and_origin() {
        let mut select = customers();
        select.order_by = vec![asc(col("c", "City"))];
        let mut aliases = AliasGenerator::new("t", ["c"]);
        let outer = push_down(select, &mut aliases, true);

        assert_eq!(outer.order_by, vec![asc(col("t", "City"))]);
        assert!(!outer.order_implicit);
        assert_eq!(outer.wildcard, Some(Wildcard { alias: "t".into(), width: 2 }));
        assert_eq!(outer.items[1].origin, col("c", "City"));
        match outer.from {
            Some(TableRef::Derived { select, .. }) => assert!(select.order_by.is_empty()),
            other => panic!("expected derived table, got {:?}", other),
        }
    }

    #[test]
    fn test_push_down_keeps_order_under_top() {
        let mut select = customers();
        select.top = Some(int(10));
        select.order_by = vec![asc(col("c", "City"))];
        let mut aliases = AliasGenerator::new("t", ["c"]);
        let outer = push_down(select, &mut aliases, true);

        assert!(outer.order_implicit);
        match outer.from {
            Some(TableRef::Derived { select, .. }) => {
                assert_eq!(select.order_by, vec![asc(col("c", "City"))])
            }
            other => panic!("expected derived table, got {:?}", other),
        }
    }

    #[test]
    fn test_unprojected_order_key_becomes_hidden() {
        let mut select = customers();
        select.items.truncate(1);
        select.order_by = vec![desc(col("c", "City"))];
        let mut aliases = AliasGenerator::new("t", ["c"]);
        let outer = push_down(select, &mut aliases, true);

        assert_eq!(outer.wildcard, None);
        assert_eq!(outer.output_names(), vec!["CustomerID"]);
        assert_eq!(outer.order_by, vec![desc(col("t", "c0"))]);
    }

    #[test]
    fn test_duplicate_names_are_renamed() {
        let mut select = customers();
        select.items = vec![
            SelectItem::new(col("ca", "CustomerID"), None),
            SelectItem::new(col("cb", "CustomerID"), None),
            SelectItem::new(col("ca", "ContactName"), None),
            SelectItem::new(col("cb", "ContactName"), None),
        ];
        let derived = derive(select, "t");
        let names: Vec<_> = derived.items.iter().map(|i| i.output_name().to_string()).collect();
        assert_eq!(names, vec!["CustomerID", "c0", "ContactName", "c1"]);
    }

    #[test]
    fn test_resolve_follows_origin() {
        let mut aliases = AliasGenerator::new("t", ["c"]);
        let outer = push_down(customers(), &mut aliases, true);
        let predicate = col("c", "City").eq(text("London"));
        assert_eq!(resolve(&predicate, &outer), col("t", "City").eq(text("London")));
    }

    #[test]
    fn test_check_scope_reports_missing_alias() {
        let select = customers();
        assert!(check_scope(&col("c", "City"), &select).is_ok());
        let err = check_scope(&col("o", "OrderID"), &select).unwrap_err();
        assert!(matches!(err, RowPageError::ColumnOutOfScope { ref table, .. } if table == "o"));
    }

    #[test]
    fn test_validate_rejects_duplicate_alias() {
        let mut select = customers();
        select.joins.push(JoinClause {
            kind: JoinKind::Inner,
            table: TableRef::Table {
                name: "Orders".into(),
                alias: "C".into(),
            },
            on: col("c", "CustomerID").eq(col("C", "CustomerID")),
        });
        assert!(matches!(
            validate(&select, "__RowNumber__"),
            Err(RowPageError::Invariant(_))
        ));
    }

    #[test]
    fn test_validate_rejects_visible_ranking_column() {
        let mut select = customers();
        select.items.push(SelectItem::new(
            Expr::RowNumber(OrderKey::Unspecified),
            Some("__RowNumber__".into()),
        ));
        assert!(matches!(
            validate(&select, "__RowNumber__"),
            Err(RowPageError::Invariant(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_explicit_key() {
        let mut select = customers();
        select.items.push(SelectItem::new(
            Expr::RowNumber(OrderKey::Explicit(vec![])),
            Some("rn".into()),
        ));
        assert!(validate(&select, "__RowNumber__").is_err());
    }

    #[test]
    fn test_count_over_plain_select_is_in_place() {
        let mut aliases = AliasGenerator::new("t", ["c"]);
        let counted = compose_over(customers(), OuterOp::Count(AggregateFunc::Count), &mut aliases);
        assert!(matches!(counted.from, Some(TableRef::Table { .. })));
        assert_eq!(counted.items.len(), 1);
        assert!(counted.aggregate);
    }

    #[test]
    fn test_distinct_drops_unprojected_order() {
        let mut select = customers();
        select.items.truncate(1);
        select.order_by = vec![asc(col("c", "City"))];
        let mut aliases = AliasGenerator::new("t", ["c"]);
        let distinct = compose_over(select, OuterOp::Distinct, &mut aliases);
        assert!(distinct.distinct);
        assert!(distinct.order_by.is_empty());
    }
}
