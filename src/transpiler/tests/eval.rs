//! In-memory evaluator for rewritten select trees, enough to check paging
//! semantics without a database.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;

use crate::ast::*;

pub type Row = Vec<(String, Value)>;
type Env = HashMap<String, HashMap<String, Value>>;

#[derive(Default)]
pub struct Database {
    tables: HashMap<String, Vec<Row>>,
}

impl Database {
    pub fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|values| {
                columns
                    .iter()
                    .map(|c| c.to_string())
                    .zip(values)
                    .collect()
            })
            .collect();
        self.tables.insert(name.to_string(), rows);
        self
    }

    /// `Numbers(Id, Name)` with ids `1..=n` in reverse physical order.
    pub fn numbers(n: i64) -> Self {
        let rows = (1..=n)
            .rev()
            .map(|i| vec![Value::Int(i), Value::String(format!("n{}", i))])
            .collect();
        Database::default().with_table("Numbers", &["Id", "Name"], rows)
    }

    pub fn run(&self, select: &Select) -> Vec<Row> {
        self.select(select)
    }

    fn select(&self, select: &Select) -> Vec<Row> {
        let mut envs: Vec<Env> = match &select.from {
            Some(table) => self.source(table),
            None => vec![Env::new()],
        };
        for join in &select.joins {
            let right = self.source(&join.table);
            let mut joined = Vec::new();
            for left in &envs {
                let mut matched = false;
                for r in &right {
                    let mut env = left.clone();
                    env.extend(r.clone());
                    if truthy(&self.eval(&join.on, &env)) {
                        joined.push(env);
                        matched = true;
                    }
                }
                if !matched && join.kind == JoinKind::Left {
                    let mut env = left.clone();
                    env.insert(join.table.alias().to_string(), HashMap::new());
                    joined.push(env);
                }
            }
            envs = joined;
        }
        if let Some(filter) = &select.filter {
            envs.retain(|env| truthy(&self.eval(filter, env)));
        }

        if let Some(item) = select.items.iter().find(|i| matches!(i.expr, Expr::Count(_))) {
            return vec![vec![(item.output_name().to_string(), Value::Int(envs.len() as i64))]];
        }

        let numbers: Vec<Option<Vec<i64>>> = select
            .items
            .iter()
            .map(|item| match &item.expr {
                Expr::RowNumber(key) => Some(self.row_numbers(key, &envs)),
                _ => None,
            })
            .collect();

        let mut rows: Vec<(Env, Row)> = envs
            .into_iter()
            .enumerate()
            .map(|(i, env)| {
                let row = select
                    .items
                    .iter()
                    .zip(&numbers)
                    .map(|(item, n)| {
                        let value = match n {
                            Some(numbers) => Value::Int(numbers[i]),
                            None => self.eval(&item.expr, &env),
                        };
                        (item.output_name().to_string(), value)
                    })
                    .collect();
                (env, row)
            })
            .collect();

        if !select.order_by.is_empty() {
            rows.sort_by(|a, b| self.compare(&select.order_by, &a.0, &b.0));
        }
        let mut out: Vec<Row> = rows.into_iter().map(|(_, row)| row).collect();
        if select.distinct {
            let mut unique: Vec<Row> = Vec::new();
            for row in out {
                if !unique.contains(&row) {
                    unique.push(row);
                }
            }
            out = unique;
        }
        if let Some(top) = &select.top {
            let n = self.eval(top, &Env::new()).as_count().unwrap() as usize;
            out.truncate(n);
        }
        out
    }

    fn source(&self, table: &TableRef) -> Vec<Env> {
        let (alias, rows) = match table {
            TableRef::Table { name, alias } => (alias, self.tables.get(name).cloned().unwrap_or_default()),
            TableRef::Derived { select, alias } => (alias, self.select(select)),
        };
        rows.into_iter()
            .map(|row| {
                let mut env = Env::new();
                env.insert(alias.clone(), row.into_iter().collect());
                env
            })
            .collect()
    }

    fn row_numbers(&self, key: &OrderKey, envs: &[Env]) -> Vec<i64> {
        let mut index: Vec<usize> = (0..envs.len()).collect();
        if let OrderKey::Explicit(keys) = key {
            index.sort_by(|&a, &b| self.compare(keys, &envs[a], &envs[b]));
        }
        let mut numbers = vec![0; envs.len()];
        for (rank, &i) in index.iter().enumerate() {
            numbers[i] = rank as i64 + 1;
        }
        numbers
    }

    fn compare(&self, keys: &[Ordering], a: &Env, b: &Env) -> CmpOrdering {
        for key in keys {
            let ord = compare_values(&self.eval(&key.expr, a), &self.eval(&key.expr, b));
            let ord = match key.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != CmpOrdering::Equal {
                return ord;
            }
        }
        CmpOrdering::Equal
    }

    fn eval(&self, expr: &Expr, env: &Env) -> Value {
        match expr {
            Expr::Column { table, name } => env
                .get(table)
                .and_then(|columns| columns.get(name))
                .cloned()
                .unwrap_or(Value::Null),
            Expr::Literal(value) => value.clone(),
            Expr::Param(p) => p.value.clone(),
            Expr::Binary { left, op, right } => {
                binary(*op, self.eval(left, env), self.eval(right, env))
            }
            Expr::Not(inner) => Value::Bool(!truthy(&self.eval(inner, env))),
            Expr::Function { name, args } => {
                let values: Vec<Value> = args.iter().map(|a| self.eval(a, env)).collect();
                match name.as_str() {
                    "LEN" => match values.first() {
                        Some(Value::String(s)) => Value::Int(s.chars().count() as i64),
                        _ => Value::Null,
                    },
                    "COALESCE" => values
                        .into_iter()
                        .find(|v| *v != Value::Null)
                        .unwrap_or(Value::Null),
                    _ => Value::Null,
                }
            }
            Expr::Truth(predicate) => Value::Bool(truthy(&self.eval(predicate, env))),
            Expr::Exists { select, negated } => Value::Bool(self.select(select).is_empty() == *negated),
            Expr::RowNumber(_) | Expr::Count(_) => Value::Null,
        }
    }
}

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => CmpOrdering::Equal,
        (Value::Null, _) => CmpOrdering::Less,
        (_, Value::Null) => CmpOrdering::Greater,
        _ => CmpOrdering::Equal,
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Value {
    match op {
        BinaryOp::And => Value::Bool(truthy(&left) && truthy(&right)),
        BinaryOp::Or => Value::Bool(truthy(&left) || truthy(&right)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => match (left, right) {
            (Value::Int(x), Value::Int(y)) => Value::Int(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                _ => x / y,
            }),
            _ => Value::Null,
        },
        BinaryOp::Concat => match (left, right) {
            (Value::String(x), Value::String(y)) => Value::String(x + &y),
            _ => Value::Null,
        },
        comparison => {
            if left == Value::Null || right == Value::Null {
                return Value::Null;
            }
            let ord = compare_values(&left, &right);
            Value::Bool(match comparison {
                BinaryOp::Eq => ord == CmpOrdering::Equal,
                BinaryOp::Ne => ord != CmpOrdering::Equal,
                BinaryOp::Lt => ord == CmpOrdering::Less,
                BinaryOp::Le => ord != CmpOrdering::Greater,
                BinaryOp::Gt => ord == CmpOrdering::Greater,
                _ => ord != CmpOrdering::Less,
            })
        }
    }
}
