//! SQL text emission for rewritten select trees.

use serde::Serialize;

use crate::ast::*;
use crate::config::{Layout, TranslatorConfig};
use crate::error::{RowPageError, RowPageResult};
use crate::transpiler::traits::SqlGenerator;

/// Rendering switches taken from the translator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitOptions {
    pub layout: Layout,
    /// Render ordering a root select only carries
    pub preserve_order: bool,
}

impl From<&TranslatorConfig> for EmitOptions {
    fn from(config: &TranslatorConfig) -> Self {
        Self {
            layout: config.layout,
            preserve_order: config.preserve_order,
        }
    }
}

/// One emitted statement and the parameters it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub sql: String,
    /// In order of first reference in `sql`
    pub parameters: Vec<Parameter>,
    /// Placeholder text of each parameter, parallel to `parameters`
    pub placeholders: Vec<String>,
}

impl Translation {
    /// Parameters paired with the placeholder that stands for them in `sql`.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.placeholders.iter().map(String::as_str).zip(&self.parameters)
    }
}

impl std::fmt::Display for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (placeholder, parameter) in self.bindings() {
            writeln!(f, "{}", parameter.describe(placeholder))?;
        }
        if !self.parameters.is_empty() {
            writeln!(f)?;
        }
        write!(f, "{}", self.sql)
    }
}

/// Parameters referenced so far, deduplicated by rendered placeholder.
#[derive(Debug, Default)]
pub struct ParamContext {
    params: Vec<Parameter>,
    placeholders: Vec<String>,
}

impl ParamContext {
    /// Record a reference to `param` rendered as `placeholder`.
    ///
    /// Two slots may only share a placeholder when they are the same slot.
    pub fn reference(&mut self, param: &Parameter, placeholder: &str) -> RowPageResult<()> {
        let Some(index) = self.placeholders.iter().position(|p| p == placeholder) else {
            self.params.push(param.clone());
            self.placeholders.push(placeholder.to_string());
            return Ok(());
        };
        let existing = &self.params[index];
        if existing.name != param.name {
            return Err(RowPageError::invariant(format!(
                "parameters '{}' and '{}' both render as {}",
                existing.name, param.name, placeholder
            )));
        }
        if existing.value != param.value {
            return Err(RowPageError::invariant(format!(
                "parameter '{}' is bound to both {} and {}",
                param.name, existing.value, param.value
            )));
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.params.len()
    }
}

/// Render `root` as one statement.
pub fn emit(root: &Select, generator: &dyn SqlGenerator, options: &EmitOptions) -> RowPageResult<Translation> {
    let mut emitter = Emitter {
        generator,
        options,
        params: ParamContext::default(),
        sql: String::new(),
    };
    emitter.select(root, 0, true)?;
    tracing::trace!(parameters = emitter.params.len(), "statement emitted");
    Ok(Translation {
        sql: emitter.sql,
        parameters: emitter.params.params,
        placeholders: emitter.params.placeholders,
    })
}

struct Emitter<'a> {
    generator: &'a dyn SqlGenerator,
    options: &'a EmitOptions,
    params: ParamContext,
    sql: String,
}

impl Emitter<'_> {
    fn newline(&mut self, depth: usize) {
        match self.options.layout {
            Layout::Pretty => {
                self.sql.push('\n');
                self.sql.push_str(&"    ".repeat(depth));
            }
            Layout::Compact => self.sql.push(' '),
        }
    }

    /// Line break that compact layout drops entirely.
    fn soft_newline(&mut self, depth: usize) {
        if self.options.layout == Layout::Pretty {
            self.newline(depth);
        }
    }

    fn quote(&self, name: &str) -> String {
        self.generator.quote_identifier(name)
    }

    fn select(&mut self, select: &Select, depth: usize, root: bool) -> RowPageResult<()> {
        self.sql.push_str("SELECT ");
        if select.distinct {
            self.sql.push_str("DISTINCT ");
        }
        if let Some(top) = &select.top {
            let start = self.sql.len();
            self.expr(top, depth)?;
            let bound = self.sql.split_off(start);
            let clause = self
                .generator
                .top_clause(&bound)
                .ok_or_else(|| RowPageError::invariant("dialect has no bounded top-N clause"))?;
            self.sql.push_str(&clause);
            self.sql.push(' ');
        }
        self.projection(select, depth)?;

        match &select.from {
            Some(table) => {
                self.newline(depth);
                self.sql.push_str("FROM ");
                self.table_ref(table, depth)?;
            }
            None => {
                if let Some(dual) = self.generator.scalar_from() {
                    self.newline(depth);
                    self.sql.push_str("FROM ");
                    self.sql.push_str(dual);
                }
            }
        }

        for join in &select.joins {
            self.newline(depth);
            self.sql.push_str(&join.kind.to_string());
            self.sql.push(' ');
            self.table_ref(&join.table, depth)?;
            self.sql.push_str(" ON ");
            self.expr(&join.on, depth)?;
        }

        if let Some(filter) = &select.filter {
            self.newline(depth);
            self.sql.push_str("WHERE ");
            self.expr(filter, depth)?;
        }

        let requested = root && (!select.order_implicit || self.options.preserve_order);
        if !select.order_by.is_empty() && (select.top.is_some() || requested) {
            self.newline(depth);
            self.sql.push_str("ORDER BY ");
            self.orderings(&select.order_by, depth)?;
        }
        Ok(())
    }

    fn projection(&mut self, select: &Select, depth: usize) -> RowPageResult<()> {
        let width = match &select.wildcard {
            Some(wildcard) if wildcard.width > select.items.len() => {
                return Err(RowPageError::invariant(format!(
                    "wildcard over {} columns, select has {}",
                    wildcard.width,
                    select.items.len()
                )));
            }
            Some(wildcard) => {
                let quoted = self.quote(&wildcard.alias);
                self.sql.push_str(&quoted);
                self.sql.push_str(".*");
                wildcard.width
            }
            None => 0,
        };
        let mut first = width == 0;
        if first && select.items.is_empty() {
            return Err(RowPageError::invariant("select list is empty"));
        }
        for item in select.items.iter().skip(width) {
            if !first {
                self.sql.push_str(", ");
            }
            first = false;
            self.expr(&item.expr, depth)?;
            if let Some(alias) = &item.alias {
                if item.expr.default_name() != Some(alias.as_str()) {
                    self.sql.push_str(" AS ");
                    let quoted = self.quote(alias);
                    self.sql.push_str(&quoted);
                }
            }
        }
        Ok(())
    }

    fn table_ref(&mut self, table: &TableRef, depth: usize) -> RowPageResult<()> {
        match table {
            TableRef::Table { name, alias } => {
                let quoted = self.quote(name);
                self.sql.push_str(&quoted);
                let alias = self.generator.table_alias(&self.quote(alias));
                self.sql.push_str(&alias);
            }
            TableRef::Derived { select, alias } => {
                self.sql.push('(');
                self.soft_newline(depth + 1);
                self.select(select, depth + 1, false)?;
                self.soft_newline(depth);
                self.sql.push(')');
                let alias = self.generator.table_alias(&self.quote(alias));
                self.sql.push_str(&alias);
            }
        }
        Ok(())
    }

    fn orderings(&mut self, orderings: &[Ordering], depth: usize) -> RowPageResult<()> {
        for (i, ordering) in orderings.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.expr(&ordering.expr, depth)?;
            if ordering.order == SortOrder::Desc {
                self.sql.push_str(" DESC");
            }
        }
        Ok(())
    }

    fn operand(&mut self, expr: &Expr, depth: usize) -> RowPageResult<()> {
        if matches!(expr, Expr::Binary { .. }) {
            self.sql.push('(');
            self.expr(expr, depth)?;
            self.sql.push(')');
            Ok(())
        } else {
            self.expr(expr, depth)
        }
    }

    fn expr(&mut self, expr: &Expr, depth: usize) -> RowPageResult<()> {
        match expr {
            Expr::Column { table, name } => {
                if !table.is_empty() {
                    let quoted = self.quote(table);
                    self.sql.push_str(&quoted);
                    self.sql.push('.');
                }
                let quoted = self.quote(name);
                self.sql.push_str(&quoted);
            }
            Expr::Literal(value) => self.literal(value),
            Expr::Param(param) => {
                let placeholder = self.generator.placeholder(&param.name);
                self.params.reference(param, &placeholder)?;
                self.sql.push_str(&placeholder);
            }
            Expr::Binary { left, op, right } => {
                self.operand(left, depth)?;
                self.sql.push(' ');
                match op {
                    BinaryOp::Concat => {
                        let concat = self.generator.concat_operator().to_string();
                        self.sql.push_str(&concat);
                    }
                    other => self.sql.push_str(&other.to_string()),
                }
                self.sql.push(' ');
                self.operand(right, depth)?;
            }
            Expr::Not(inner) => {
                self.sql.push_str("NOT (");
                self.expr(inner, depth)?;
                self.sql.push(')');
            }
            Expr::Function { name, args } => {
                self.sql.push_str(name);
                self.sql.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.expr(arg, depth)?;
                }
                self.sql.push(')');
            }
            Expr::RowNumber(key) => {
                self.sql.push_str("ROW_NUMBER() OVER(ORDER BY ");
                match key {
                    OrderKey::Explicit(keys) if keys.is_empty() => {
                        return Err(RowPageError::invariant(
                            "ranking window with an empty explicit order key",
                        ));
                    }
                    OrderKey::Explicit(keys) => self.orderings(keys, depth)?,
                    OrderKey::Unspecified => {
                        let vacuous = self.generator.vacuous_order_key().to_string();
                        self.sql.push_str(&vacuous);
                    }
                }
                self.sql.push(')');
            }
            Expr::Count(func) => {
                let count = self.generator.count_function(*func).to_string();
                self.sql.push_str(&count);
                self.sql.push_str("(*)");
            }
            Expr::Exists { select, negated } => {
                if *negated {
                    self.sql.push_str("NOT ");
                }
                self.sql.push_str("EXISTS (");
                self.soft_newline(depth + 1);
                self.select(select, depth + 1, false)?;
                self.sql.push(')');
            }
            Expr::Truth(predicate) => {
                self.sql.push_str("CASE");
                self.newline(depth + 1);
                self.sql.push_str("WHEN ");
                self.expr(predicate, depth + 1)?;
                self.newline(depth + 1);
                self.sql.push_str("THEN ");
                let yes = self.generator.bool_literal(true);
                self.sql.push_str(&yes);
                self.sql.push_str(" ELSE ");
                let no = self.generator.bool_literal(false);
                self.sql.push_str(&no);
                self.newline(depth);
                self.sql.push_str("END");
            }
        }
        Ok(())
    }

    fn literal(&mut self, value: &Value) {
        let text = match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.generator.bool_literal(*b),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::String(s) => self.generator.string_literal(s),
            Value::DateTime(dt) => self.generator.datetime_literal(dt),
        };
        self.sql.push_str(&text);
    }
}
