//! Render SQL AST to string.

use std::cell::RefCell;
use std::fmt;

use indexmap::IndexMap;

use crate::expr::{ColumnRef, Expr};
use crate::stmt::*;
use crate::{escape_string, ColumnName, Ident, ParamName, RenderedSql};

/// Mutable parameter tracking state.
struct ParamState {
    /// Named parameters -> their assigned index
    params: IndexMap<ParamName, usize>,
    /// Next parameter index to assign
    next_param_idx: usize,
}

impl ParamState {
    fn new() -> Self {
        Self {
            params: IndexMap::new(),
            next_param_idx: 1,
        }
    }

    /// Get or create a parameter index.
    fn get_or_insert(&mut self, name: &ParamName) -> usize {
        *self.params.entry(name.clone()).or_insert_with(|| {
            let idx = self.next_param_idx;
            self.next_param_idx += 1;
            idx
        })
    }
}

/// Rendering context that tracks parameters.
pub struct RenderContext {
    params: RefCell<ParamState>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            params: RefCell::new(ParamState::new()),
        }
    }

    /// Get or create a parameter placeholder index.
    fn param_idx(&self, name: &ParamName) -> usize {
        self.params.borrow_mut().get_or_insert(name)
    }

    /// Finish rendering and return the collected params.
    fn into_params(self) -> Vec<ParamName> {
        self.params.into_inner().params.into_keys().collect()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper for rendering a value via Display.
pub struct Fmt<'a, T: Render>(&'a RenderContext, &'a T);

impl<T: Render> fmt::Display for Fmt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.1.render(self.0, f)
    }
}

// ============================================================================
// Render implementations
// ============================================================================

/// Trait for types that can be rendered to SQL.
pub trait Render {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Render for Expr {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param(name) => {
                let idx = ctx.param_idx(name);
                write!(f, "${idx}")
            }
            Expr::Column(col) => col.render(ctx, f),
            Expr::String(s) => {
                let escaped = escape_string(s);
                write!(f, "{escaped}")
            }
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Expr::Null => write!(f, "NULL"),
            Expr::Now => write!(f, "NOW()"),
            Expr::Default => write!(f, "DEFAULT"),
            Expr::BinOp { left, op, right } => {
                let left = Fmt(ctx, left.as_ref());
                let right = Fmt(ctx, right.as_ref());
                let op = op.as_str();
                write!(f, "{left} {op} {right}")
            }
            Expr::IsNull { expr, negated } => {
                let expr = Fmt(ctx, expr.as_ref());
                let suffix = if *negated { " IS NOT NULL" } else { " IS NULL" };
                write!(f, "{expr}{suffix}")
            }
            Expr::Like { expr, pattern } => {
                let expr = Fmt(ctx, expr.as_ref());
                let pattern = Fmt(ctx, pattern.as_ref());
                write!(f, "{expr} LIKE {pattern}")
            }
            Expr::ILike { expr, pattern } => {
                let expr = Fmt(ctx, expr.as_ref());
                let pattern = Fmt(ctx, pattern.as_ref());
                write!(f, "{expr} ILIKE {pattern}")
            }
            Expr::Any { expr, array } => {
                let expr = Fmt(ctx, expr.as_ref());
                let array = Fmt(ctx, array.as_ref());
                write!(f, "{expr} = ANY({array})")
            }
            Expr::JsonGet { expr, key } => {
                let expr = Fmt(ctx, expr.as_ref());
                let key = Fmt(ctx, key.as_ref());
                write!(f, "{expr} -> {key}")
            }
            Expr::JsonGetText { expr, key } => {
                let expr = Fmt(ctx, expr.as_ref());
                let key = Fmt(ctx, key.as_ref());
                write!(f, "{expr} ->> {key}")
            }
            Expr::Contains { expr, value } => {
                let expr = Fmt(ctx, expr.as_ref());
                let value = Fmt(ctx, value.as_ref());
                write!(f, "{expr} @> {value}")
            }
            Expr::KeyExists { expr, key } => {
                let expr = Fmt(ctx, expr.as_ref());
                let key = Fmt(ctx, key.as_ref());
                write!(f, "{expr} ? {key}")
            }
            Expr::Overlaps { left, right } => {
                let left = Fmt(ctx, left.as_ref());
                let right = Fmt(ctx, right.as_ref());
                write!(f, "{left} && {right}")
            }
            Expr::JsonPathGet { expr, path, as_text } => {
                let expr = Fmt(ctx, expr.as_ref());
                let path = Fmt(ctx, path.as_ref());
                let op = if *as_text { "#>>" } else { "#>" };
                write!(f, "{expr} {op} {path}")
            }
            Expr::Not(inner) => {
                let inner = Fmt(ctx, inner.as_ref());
                write!(f, "NOT ({inner})")
            }
            Expr::Exists { subquery, negated } => {
                let prefix = if *negated { "NOT EXISTS " } else { "EXISTS " };
                write!(f, "{prefix}(")?;
                subquery.render(ctx, f)?;
                write!(f, ")")
            }
            Expr::Cast { expr, pg_type } => {
                let expr = Fmt(ctx, expr.as_ref());
                write!(f, "{expr}::{pg_type}")
            }
            Expr::Excluded(column) => {
                let column = Ident(column.as_str());
                write!(f, "EXCLUDED.{column}")
            }
            Expr::Subquery(stmt) => {
                write!(f, "(")?;
                stmt.render(ctx, f)?;
                write!(f, ")")
            }
            Expr::FnCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Fmt(ctx, arg))?;
                }
                write!(f, ")")
            }
            Expr::Count { table } => {
                let table = Ident(table.as_str());
                write!(f, "COUNT({table}.*)")
            }
            Expr::Raw(s) => write!(f, "{s}"),
        }
    }
}

impl Render for ColumnRef {
    fn render(&self, _ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            let table = Ident(table.as_str());
            write!(f, "{table}.")?;
        }
        let column = Ident(self.column.as_str());
        write!(f, "{column}")
    }
}

impl Render for SelectStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT")?;

        if !self.distinct_on.is_empty() {
            write!(f, " DISTINCT ON (")?;
            for (i, expr) in self.distinct_on.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", Fmt(ctx, expr))?;
            }
            write!(f, ")")?;
        } else if self.distinct {
            write!(f, " DISTINCT")?;
        }

        // Columns
        if self.columns.is_empty() {
            write!(f, " *")?;
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {}", Fmt(ctx, col))?;
            }
        }

        // FROM
        if let Some(from) = &self.from {
            match from {
                FromClause::Table { table, alias } => {
                    let table = Ident(table.as_str());
                    write!(f, "\nFROM {table}")?;
                    if let Some(alias) = alias {
                        let alias = Ident(alias.as_str());
                        write!(f, " {alias}")?;
                    }
                }
                FromClause::Subquery { stmt, alias } => {
                    write!(f, "\nFROM (")?;
                    stmt.render(ctx, f)?;
                    write!(f, ") {}", Ident(alias.as_str()))?;
                }
            }
        }

        // JOINs
        for join in &self.joins {
            let kind = join.kind.as_str();
            let table = Ident(join.table.as_str());
            write!(f, "\n{kind} {table}")?;
            if let Some(alias) = &join.alias {
                let alias = Ident(alias.as_str());
                write!(f, " {alias}")?;
            }
            let on = Fmt(ctx, &join.on);
            write!(f, " ON {on}")?;
        }

        // WHERE
        if let Some(where_) = &self.where_ {
            let where_ = Fmt(ctx, where_);
            write!(f, "\nWHERE {where_}")?;
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            write!(f, "\nGROUP BY ")?;
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", Fmt(ctx, expr))?;
            }
        }

        // HAVING
        if let Some(having) = &self.having {
            let having = Fmt(ctx, having);
            write!(f, "\nHAVING {having}")?;
        }

        // ORDER BY
        if !self.order_by.is_empty() {
            write!(f, "\nORDER BY ")?;
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let expr = Fmt(ctx, &order.expr);
                let dir = if order.desc { " DESC" } else { " ASC" };
                write!(f, "{expr}{dir}")?;
                if let Some(nulls) = &order.nulls {
                    write!(
                        f,
                        "{}",
                        match nulls {
                            NullsOrder::First => " NULLS FIRST",
                            NullsOrder::Last => " NULLS LAST",
                        }
                    )?;
                }
            }
        }

        // LIMIT
        if let Some(limit) = &self.limit {
            let limit = Fmt(ctx, limit);
            write!(f, "\nLIMIT {limit}")?;
        }

        // OFFSET
        if let Some(offset) = &self.offset {
            let offset = Fmt(ctx, offset);
            write!(f, "\nOFFSET {offset}")?;
        }

        Ok(())
    }
}

impl Render for SelectColumn {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectColumn::Expr { expr, alias } => {
                let expr = Fmt(ctx, expr);
                write!(f, "{expr}")?;
                if let Some(alias) = alias {
                    let alias = Ident(alias.as_str());
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
            SelectColumn::AllFrom(table) => {
                let table = Ident(table.as_str());
                write!(f, "{table}.*")
            }
        }
    }
}

impl Render for InsertStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(self.table.as_str());
        write!(f, "INSERT INTO {table} (")?;

        // Columns
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let col = Ident(col.as_str());
            write!(f, "{col}")?;
        }
        write!(f, ")")?;

        // VALUES
        write!(f, "\nVALUES (")?;
        for (i, val) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Fmt(ctx, val))?;
        }
        write!(f, ")")?;

        render_on_conflict(&self.on_conflict, ctx, f)?;
        render_returning(&self.returning, f)?;

        Ok(())
    }
}

impl Render for Unnest {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UNNEST(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let expr = Expr::param(param.name.as_str().into());
            write!(f, "{}::{}", Fmt(ctx, &expr), param.pg_type)?;
        }
        write!(f, ") AS {}(", Ident(self.alias.as_str()))?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Ident(param.name.as_str()))?;
        }
        write!(f, ")")
    }
}

impl Render for InsertSelectStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(self.table.as_str());
        write!(f, "INSERT INTO {table} (")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Ident(col.as_str()))?;
        }
        write!(f, ")\nSELECT ")?;
        for (i, expr) in self.select_exprs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Fmt(ctx, expr))?;
        }
        write!(f, "\nFROM {}", Fmt(ctx, &self.unnest))?;

        render_on_conflict(&self.on_conflict, ctx, f)?;
        render_returning(&self.returning, f)?;

        Ok(())
    }
}

fn render_on_conflict(on_conflict: &Option<OnConflict>, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(conflict) = on_conflict else { return Ok(()) };

    match &conflict.target {
        ConflictTarget::Columns(cols) => {
            write!(f, "\nON CONFLICT (")?;
            for (i, col) in cols.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let col = Ident(col.as_str());
                write!(f, "{col}")?;
            }
            write!(f, ")")?;
        }
        ConflictTarget::Constraint(name) => {
            write!(f, "\nON CONFLICT ON CONSTRAINT {}", Ident(name))?;
        }
        ConflictTarget::Any => {
            write!(f, "\nON CONFLICT")?;
        }
    }

    match &conflict.action {
        ConflictAction::DoNothing => {
            write!(f, " DO NOTHING")?;
        }
        ConflictAction::DoUpdate { assignments, where_ } => {
            write!(f, " DO UPDATE SET ")?;
            for (i, assign) in assignments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let col = Ident(assign.column.as_str());
                let val = Fmt(ctx, &assign.value);
                write!(f, "{col} = {val}")?;
            }
            if let Some(where_) = where_ {
                write!(f, " WHERE {}", Fmt(ctx, where_))?;
            }
        }
    }

    Ok(())
}

fn render_returning(returning: &[ColumnName], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if returning.is_empty() {
        return Ok(());
    }
    write!(f, "\nRETURNING ")?;
    for (i, col) in returning.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        let col = Ident(col.as_str());
        write!(f, "{col}")?;
    }
    Ok(())
}

impl Render for UpdateStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(self.table.as_str());
        write!(f, "UPDATE {table}")?;

        // SET
        write!(f, "\nSET ")?;
        for (i, assign) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let col = Ident(assign.column.as_str());
            let val = Fmt(ctx, &assign.value);
            write!(f, "{col} = {val}")?;
        }

        // WHERE
        if let Some(where_) = &self.where_ {
            let where_ = Fmt(ctx, where_);
            write!(f, "\nWHERE {where_}")?;
        }

        render_returning(&self.returning, f)?;

        Ok(())
    }
}

impl Render for DeleteStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(self.table.as_str());
        write!(f, "DELETE FROM {table}")?;

        // WHERE
        if let Some(where_) = &self.where_ {
            let where_ = Fmt(ctx, where_);
            write!(f, "\nWHERE {where_}")?;
        }

        render_returning(&self.returning, f)?;

        Ok(())
    }
}

impl Render for Stmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Select(s) => s.render(ctx, f),
            Stmt::Insert(s) => s.render(ctx, f),
            Stmt::InsertSelect(s) => s.render(ctx, f),
            Stmt::Update(s) => s.render(ctx, f),
            Stmt::Delete(s) => s.render(ctx, f),
        }
    }
}

// ============================================================================
// Convenience methods
// ============================================================================

/// Render a statement to SQL.
pub fn render(stmt: &impl Render) -> RenderedSql {
    let ctx = RenderContext::new();
    let sql = format!("{}", Fmt(&ctx, stmt));
    RenderedSql {
        sql,
        params: ctx.into_params().into_iter().map(|p| p.as_str().to_string()).collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn test_param_deduplication() {
        // Build: INSERT INTO t (a, b) VALUES ($a, $b) ON CONFLICT (a) DO UPDATE SET b = $b
        let stmt = InsertStmt::new("products".into())
            .column("handle".into(), Expr::param("handle".into()))
            .column("status".into(), Expr::param("status".into()))
            .on_conflict(OnConflict {
                target: ConflictTarget::Columns(vec!["handle".into()]),
                action: ConflictAction::DoUpdate {
                    assignments: vec![UpdateAssignment::new(
                        "status".into(),
                        Expr::param("status".into()), // same param, should be $2 not $3
                    )],
                    where_: None,
                },
            })
            .returning(["id".into(), "handle".into(), "status".into()]);

        let result = render(&stmt);

        // Key assertion: params should only have 2 entries
        assert_eq!(result.params, vec!["handle", "status"]);

        // SQL should reuse $2 for both VALUES and UPDATE SET
        assert!(result.sql.contains("VALUES ($1, $2)"));
        assert!(result.sql.contains("\"status\" = $2"));
    }

    #[test]
    fn test_simple_select() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("id".into())), SelectColumn::expr(Expr::column("name".into()))])
            .from(FromClause::table("users".into()));

        let result = render(&stmt);
        assert_eq!(result.sql, "SELECT \"id\", \"name\"\nFROM \"users\"");
    }

    #[test]
    fn test_select_with_where() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("id".into()))])
            .from(FromClause::table("users".into()))
            .where_(Expr::column("id".into()).eq(Expr::param("id".into())));

        let result = render(&stmt);
        assert_eq!(result.sql, "SELECT \"id\"\nFROM \"users\"\nWHERE \"id\" = $1");
        assert_eq!(result.params, vec!["id"]);
    }

    #[test]
    fn test_insert() {
        let stmt = InsertStmt::new("products".into())
            .column("handle".into(), Expr::param("handle".into()))
            .column("status".into(), Expr::param("status".into()))
            .returning(["id".into(), "handle".into(), "status".into()]);

        let result = render(&stmt);
        assert_eq!(
            result.sql,
            "INSERT INTO \"products\" (\"handle\", \"status\")\nVALUES ($1, $2)\nRETURNING \"id\", \"handle\", \"status\""
        );
        assert_eq!(result.params, vec!["handle", "status"]);
    }

    #[test]
    fn test_insert_with_literals() {
        let stmt = InsertStmt::new("products".into())
            .column("handle".into(), Expr::param("handle".into()))
            .column("status".into(), Expr::Default)
            .column("created_at".into(), Expr::Now);

        let result = render(&stmt);
        assert!(result.sql.contains("VALUES ($1, DEFAULT, NOW())"));
        assert_eq!(result.params, vec!["handle"]);
    }

    #[test]
    fn test_update() {
        let stmt = UpdateStmt::new("products".into())
            .set("status".into(), Expr::param("status".into()))
            .where_(Expr::column("handle".into()).eq(Expr::param("handle".into())))
            .returning(["id".into(), "handle".into(), "status".into()]);

        let result = render(&stmt);
        assert_eq!(
            result.sql,
            "UPDATE \"products\"\nSET \"status\" = $1\nWHERE \"handle\" = $2\nRETURNING \"id\", \"handle\", \"status\""
        );
        assert_eq!(result.params, vec!["status", "handle"]);
    }

    #[test]
    fn test_delete() {
        let stmt = DeleteStmt::new("products".into())
            .where_(Expr::column("id".into()).eq(Expr::param("id".into())))
            .returning(["id".into(), "handle".into()]);

        let result = render(&stmt);
        assert_eq!(result.sql, "DELETE FROM \"products\"\nWHERE \"id\" = $1\nRETURNING \"id\", \"handle\"");
        assert_eq!(result.params, vec!["id"]);
    }

    #[test]
    fn test_qualified_columns() {
        let stmt = SelectStmt::new()
            .columns([
                SelectColumn::expr(Expr::qualified_column("t0".into(), "id".into())),
                SelectColumn::expr(Expr::qualified_column("t1".into(), "name".into())),
            ])
            .from(FromClause::aliased("users".into(), "t0".into()))
            .join(Join {
                kind: JoinKind::Left,
                table: "profiles".into(),
                alias: Some("t1".into()),
                on: Expr::qualified_column("t1".into(), "user_id".into())
                    .eq(Expr::qualified_column("t0".into(), "id".into())),
            });

        let result = render(&stmt);
        assert!(result.sql.contains("\"t0\".\"id\""));
        assert!(result.sql.contains("\"t1\".\"name\""));
        assert!(result.sql.contains("LEFT JOIN \"profiles\" \"t1\" ON"));
    }

    #[test]
    fn test_is_null() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("id".into()))])
            .from(FromClause::table("users".into()))
            .where_(Expr::column("deleted_at".into()).is_null());

        let result = render(&stmt);
        assert!(result.sql.contains("\"deleted_at\" IS NULL"));
    }

    #[test]
    fn test_ilike() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("id".into()))])
            .from(FromClause::table("users".into()))
            .where_(Expr::column("name".into()).ilike(Expr::param("pattern".into())));

        let result = render(&stmt);
        assert!(result.sql.contains("\"name\" ILIKE $1"));
        assert_eq!(result.params, vec!["pattern"]);
    }

    #[test]
    fn test_distinct_on() {
        let stmt = SelectStmt::new()
            .distinct_on([Expr::column("author_id".into())])
            .columns([SelectColumn::expr(Expr::column("id".into()))])
            .from(FromClause::table("posts".into()))
            .order_by(OrderBy::asc(Expr::column("author_id".into())));

        let result = render(&stmt);
        assert!(result.sql.starts_with("SELECT DISTINCT ON (\"author_id\")"));
    }

    #[test]
    fn test_cast_and_excluded() {
        let stmt = InsertStmt::new("products".into())
            .column("id".into(), Expr::param("id".into()).cast(crate::PgType::BigInt))
            .on_conflict(OnConflict {
                target: ConflictTarget::Columns(vec!["id".into()]),
                action: ConflictAction::DoUpdate {
                    assignments: vec![UpdateAssignment::new(
                        "status".into(),
                        Expr::excluded("status".into()),
                    )],
                    where_: None,
                },
            });

        let result = render(&stmt);
        assert!(result.sql.contains("$1::BIGINT"));
        assert!(result.sql.contains("\"status\" = EXCLUDED.\"status\""));
    }

    #[test]
    fn test_any_and_jsonb_operators() {
        let where_ = Expr::column("id".into())
            .any(Expr::param("ids".into()))
            .and(Expr::column("meta".into()).json_get_text(Expr::string("key")).eq(Expr::string("value")))
            .and(Expr::column("meta".into()).contains(Expr::param("filter".into())))
            .and(Expr::column("meta".into()).key_exists(Expr::string("flag")));

        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("id".into()))])
            .from(FromClause::table("posts".into()))
            .where_(where_);

        let result = render(&stmt);
        assert!(result.sql.contains("\"id\" = ANY($1)"));
        assert!(result.sql.contains("->>"));
        assert!(result.sql.contains("@>"));
        assert!(result.sql.contains(" ? "));
    }

    #[test]
    fn test_group_by_and_having() {
        let stmt = SelectStmt::new()
            .columns([
                SelectColumn::expr(Expr::column("author_id".into())),
                SelectColumn::aliased(Expr::Count { table: "posts".into() }, "_count_id".into()),
            ])
            .from(FromClause::table("posts".into()))
            .group_by([Expr::column("author_id".into())])
            .having(Expr::Count { table: "posts".into() }.any(Expr::param("min".into())));

        let result = render(&stmt);
        assert!(result.sql.contains("\nGROUP BY \"author_id\""));
        assert!(result.sql.contains("\nHAVING COUNT(\"posts\".*) = ANY($1)"));
    }

    #[test]
    fn test_subquery_shares_outer_param_numbering() {
        let inner = SelectStmt::new()
            .columns([SelectColumn::all_from("posts".into())])
            .from(FromClause::aliased("posts".into(), "t1".into()))
            .where_(
                Expr::qualified_column("t1".into(), "author_id".into())
                    .eq(Expr::qualified_column("t0".into(), "id".into()))
                    .and(Expr::qualified_column("t1".into(), "status".into()).eq(Expr::param("status".into()))),
            );

        let outer = SelectStmt::new()
            .columns([
                SelectColumn::expr(Expr::qualified_column("t0".into(), "id".into())),
                SelectColumn::aliased(Expr::subquery(inner), "posts".into()),
            ])
            .from(FromClause::aliased("users".into(), "t0".into()))
            .where_(Expr::qualified_column("t0".into(), "name".into()).eq(Expr::param("name".into())));

        let result = render(&outer);
        // Columns (including the nested subquery) render before the outer
        // WHERE clause, so "status" is encountered first in document order.
        assert_eq!(result.params, vec!["status", "name"]);
        assert!(result.sql.contains("\"t1\".\"status\" = $1"));
        assert!(result.sql.contains("WHERE \"t0\".\"name\" = $2"));
    }

    #[test]
    fn test_from_subquery() {
        let inner = SelectStmt::new()
            .columns([SelectColumn::all_from("posts".into())])
            .from(FromClause::table("posts".into()))
            .where_(Expr::column("published".into()).eq(Expr::param("published".into())));

        let outer = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::Raw("coalesce(json_agg(row_to_json(t)), '[]'::json)".into()))])
            .from(FromClause::subquery(inner, "t".into()));

        let result = render(&outer);
        assert!(result.sql.contains("FROM (SELECT \"posts\".*\nFROM \"posts\"\nWHERE \"published\" = $1) \"t\""));
        assert_eq!(result.params, vec!["published"]);
    }

    #[test]
    fn test_insert_select_unnest() {
        let unnest = Unnest::new("t".into())
            .param("handle".into(), crate::PgType::Text)
            .param("status".into(), crate::PgType::Text);
        let stmt = InsertSelectStmt::new("products".into(), unnest)
            .column("handle".into(), Expr::qualified_column("t".into(), "handle".into()))
            .column("status".into(), Expr::qualified_column("t".into(), "status".into()))
            .returning(["id".into()]);

        let result = render(&stmt);
        assert!(result.sql.contains("FROM UNNEST($1::TEXT, $2::TEXT) AS \"t\"(\"handle\", \"status\")"));
        assert_eq!(result.params, vec!["handle", "status"]);
    }
}
