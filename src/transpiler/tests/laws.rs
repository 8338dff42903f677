//! Row-count, composition and leak-freedom laws, checked by evaluating the
//! rewritten select tree against in-memory tables.

use pretty_assertions::assert_eq;

use super::eval::{Database, Row};
use crate::ast::builders::*;
use crate::ast::*;
use crate::config::TranslatorConfig;
use crate::transpiler::compose;
use crate::transpiler::paging::Rewriter;
use crate::transpiler::Dialect;

fn rewrite_with(plan: &Plan, config: &TranslatorConfig) -> Select {
    let generator = config.dialect.generator();
    let select = Rewriter::new(config, generator.as_ref(), plan).rewrite(plan).unwrap();
    compose::validate(&select, &config.ranking_column).unwrap();
    select
}

fn rewrite(plan: &Plan) -> Select {
    rewrite_with(plan, &TranslatorConfig::default())
}

fn numbers() -> Plan {
    Plan::scan("Numbers", "n", &["Id", "Name"])
}

fn ids(rows: &[Row]) -> Vec<i64> {
    let mut ids: Vec<i64> = rows
        .iter()
        .filter_map(|row| match row.iter().find(|(name, _)| name == "Id") {
            Some((_, Value::Int(id))) => Some(*id),
            _ => None,
        })
        .collect();
    ids.sort();
    ids
}

fn scalar(rows: &[Row]) -> Value {
    assert_eq!(rows.len(), 1);
    rows[0][0].1.clone()
}

#[test]
fn test_row_count_law() {
    for size in [0i64, 3, 10] {
        let db = Database::numbers(size);
        for skip in [0u64, 1, 3, 10, 12] {
            for take in [None, Some(0u64), Some(2), Some(5), Some(20)] {
                let mut plan = numbers().order_by([asc(col("n", "Id"))]).skip(skip);
                if let Some(take) = take {
                    plan = plan.take(take);
                }
                let rows = db.run(&rewrite(&plan));

                let remaining = (size - skip as i64).max(0);
                let expected = take.map_or(remaining, |t| remaining.min(t as i64));
                assert_eq!(
                    rows.len() as i64,
                    expected,
                    "size={} skip={} take={:?}",
                    size,
                    skip,
                    take
                );
                let first = skip as i64 + 1;
                assert_eq!(ids(&rows), (first..first + expected).collect::<Vec<_>>());
            }
        }
    }
}

#[test]
fn test_row_count_law_without_order() {
    let db = Database::numbers(10);
    let plan = numbers().skip(4u64).take(3u64);
    assert_eq!(db.run(&rewrite(&plan)).len(), 3);
}

#[test]
fn test_row_count_law_with_parameters() {
    let db = Database::numbers(10);
    let plan = numbers()
        .order_by([asc(col("n", "Id"))])
        .skip(param("__p_0", 6))
        .take(param("__p_1", 10));
    assert_eq!(ids(&db.run(&rewrite(&plan))), vec![7, 8, 9, 10]);
}

#[test]
fn test_take_then_skip_composes() {
    let db = Database::numbers(20);
    let plan = numbers()
        .order_by([asc(col("n", "Id"))])
        .take(10u64)
        .skip(5u64);
    assert_eq!(ids(&db.run(&rewrite(&plan))), vec![6, 7, 8, 9, 10]);
}

#[test]
fn test_nested_pages_compose() {
    let db = Database::numbers(20);
    let plan = numbers()
        .order_by([desc(col("n", "Id"))])
        .skip(2u64)
        .take(8u64)
        .skip(1u64)
        .take(3u64);
    // 20..1 -> drop 2 -> 18..11 -> drop 1 -> 17, 16, 15
    assert_eq!(ids(&db.run(&rewrite(&plan))), vec![15, 16, 17]);
}

#[test]
fn test_top_levels_keep_page_order() {
    let db = Database::numbers(20);
    let plan = numbers()
        .order_by([desc(col("n", "Id"))])
        .skip(5u64)
        .take(15u64)
        .take(10u64)
        .take(8u64)
        .take(5u64);
    assert_eq!(ids(&db.run(&rewrite(&plan))), vec![11, 12, 13, 14, 15]);
}

#[test]
fn test_window_fallback_matches_top() {
    let db = Database::numbers(10);
    let plan = numbers().order_by([asc(col("n", "Id"))]).take(4u64).skip(1u64);
    let config = TranslatorConfig {
        prefer_top: false,
        ..TranslatorConfig::default()
    };
    let with_top = ids(&db.run(&rewrite(&plan)));
    let with_window = ids(&db.run(&rewrite_with(&plan, &config)));
    assert_eq!(with_top, vec![2, 3, 4]);
    assert_eq!(with_window, with_top);
}

#[test]
fn test_oracle_pages_through_windows_only() {
    let db = Database::numbers(10);
    let plan = numbers().order_by([asc(col("n", "Id"))]).take(4u64).skip(1u64);
    let select = rewrite_with(&plan, &TranslatorConfig::for_dialect(Dialect::Oracle));
    assert!(select.top.is_none());
    assert_eq!(ids(&db.run(&select)), vec![2, 3, 4]);
}

#[test]
fn test_ranking_column_never_leaks() {
    let db = Database::numbers(10);
    let plans = [
        numbers().skip(3u64),
        numbers().skip(3u64).take(2u64),
        numbers().take(5u64).skip(1u64),
        numbers().skip(3u64).distinct(),
        numbers().skip(1u64).take(5u64).take(2u64),
        numbers()
            .skip(2u64)
            .project([proj(col("n", "Name"))])
            .filter(col("n", "Name").ne(text("n1"))),
    ];
    for plan in &plans {
        let select = rewrite(plan);
        assert!(!select.output_names().contains(&"__RowNumber__"), "{}", plan);
        for row in db.run(&select) {
            assert!(row.iter().all(|(name, _)| name != "__RowNumber__"), "{}", plan);
        }
    }
}

#[test]
fn test_distinct_over_page_keeps_page_rows() {
    let rows = (1..=6)
        .map(|i| vec![Value::Int(i), Value::String(if i % 2 == 0 { "even" } else { "odd" }.into())])
        .collect();
    let db = Database::default().with_table("Numbers", &["Id", "Kind"], rows);
    let plan = Plan::scan("Numbers", "n", &["Id", "Kind"])
        .order_by([asc(col("n", "Id"))])
        .skip(2u64)
        .take(1u64)
        .project([proj(col("n", "Kind"))])
        .distinct();
    let out = db.run(&rewrite(&plan));
    assert_eq!(out, vec![vec![("Kind".to_string(), Value::from("odd"))]]);
}

#[test]
fn test_count_over_page() {
    let db = Database::numbers(10);
    for (skip, expected) in [(7u64, 3i64), (0, 10), (10, 0), (15, 0)] {
        let plan = numbers().skip(skip).count();
        assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Int(expected));
    }
    let plan = numbers().skip(2u64).take(5u64).long_count();
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Int(5));
}

#[test]
fn test_any_over_empty_page_is_false() {
    let db = Database::numbers(5);
    let plan = numbers().skip(5u64).any();
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(false));

    let plan = numbers().skip(4u64).any();
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(true));
}

#[test]
fn test_all_over_empty_page_is_true() {
    let db = Database::numbers(5);
    let plan = numbers().skip(5u64).all(col("n", "Id").gt(int(100)));
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(true));
}

#[test]
fn test_all_checks_only_page_rows() {
    let db = Database::numbers(10);
    // rows 6..=8 of the ordering
    let page = || numbers().order_by([asc(col("n", "Id"))]).skip(5u64).take(3u64);

    let plan = page().all(col("n", "Id").gt(int(5)));
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(true));

    let plan = page().all(col("n", "Id").lt(int(8)));
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(false));
}

#[test]
fn test_any_predicate_checks_only_page_rows() {
    let db = Database::numbers(10);
    let page = || numbers().order_by([asc(col("n", "Id"))]).skip(5u64).take(3u64);

    let plan = page().any_where(col("n", "Id").eq(int(2)));
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(false));

    let plan = page().any_where(col("n", "Id").eq(int(7)));
    assert_eq!(scalar(&db.run(&rewrite(&plan))), Value::Bool(true));
}

#[test]
fn test_join_sees_page_of_right_side() {
    let customers = (1..=6)
        .map(|i| vec![Value::Int(i), Value::String(format!("city{}", 7 - i))])
        .collect();
    let orders = (1..=6).map(|i| vec![Value::Int(100 + i), Value::Int(i)]).collect();
    let db = Database::default()
        .with_table("Customers", &["CustomerID", "City"], customers)
        .with_table("Orders", &["OrderID", "CustomerID"], orders);

    let page = Plan::scan("Customers", "c", &["CustomerID", "City"])
        .order_by([asc(col("c", "City"))])
        .skip(1u64)
        .take(2u64);
    let plan = Plan::scan("Orders", "o", &["OrderID", "CustomerID"])
        .join(page, JoinKind::Inner, col("o", "CustomerID").eq(col("c", "CustomerID")))
        .order_by([asc(col("c", "City"))])
        .project([proj(col("o", "OrderID"))]);

    // cities ascending: city1 (id 6), city2 (id 5), city3 (id 4), ...
    let out = db.run(&rewrite(&plan));
    let order_ids: Vec<Value> = out.into_iter().map(|row| row[0].1.clone()).collect();
    assert_eq!(order_ids, vec![Value::Int(105), Value::Int(104)]);
}
