//! Typed SQL expressions.
//!
//! [`SqlExpr<T>`] is a typed wrapper over a closed node enum: constructors
//! keep the types honest, rendering exhaustively matches the nodes.
//! Literal values are always bound as placeholders through the shared
//! parameter counter, in left-to-right render order — never inlined into
//! the SQL text.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_postgres::types::ToSql;

use crate::error::DslResult;
use crate::fragment::Fragment;
use crate::param::{Param, ParamCounter};
use crate::path::Path;
use crate::render::RenderCtx;

/// Renders a membership subquery inline with the caller's counter, so
/// placeholder numbering stays globally unique across the statement.
pub(crate) type SubqueryFn =
    Arc<dyn Fn(&RenderCtx, &mut ParamCounter) -> DslResult<Fragment> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ExprNode {
    Field {
        path: Path,
        column: String,
    },
    Value(Param),
    Binary {
        left: Box<ExprNode>,
        op: &'static str,
        right: Box<ExprNode>,
    },
    Not(Box<ExprNode>),
    Tuple(Vec<ExprNode>),
    InRows {
        lhs: Box<ExprNode>,
        rows: Vec<Vec<Param>>,
    },
    InSubquery {
        lhs: Box<ExprNode>,
        subquery: SubqueryFn,
    },
    ConstBool(bool),
}

impl fmt::Debug for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Field { path, column } => f
                .debug_struct("Field")
                .field("path", path)
                .field("column", column)
                .finish(),
            ExprNode::Value(_) => f.write_str("Value"),
            ExprNode::Binary { left, op, right } => f
                .debug_struct("Binary")
                .field("left", left)
                .field("op", op)
                .field("right", right)
                .finish(),
            ExprNode::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            ExprNode::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            ExprNode::InRows { lhs, rows } => f
                .debug_struct("InRows")
                .field("lhs", lhs)
                .field("rows", &rows.len())
                .finish(),
            ExprNode::InSubquery { lhs, .. } => {
                f.debug_struct("InSubquery").field("lhs", lhs).finish()
            }
            ExprNode::ConstBool(b) => f.debug_tuple("ConstBool").field(b).finish(),
        }
    }
}

impl ExprNode {
    pub(crate) fn render(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Fragment> {
        match self {
            ExprNode::Field { path, column } => {
                let quoted = ctx.dialect().quote_ident(column);
                let text = if ctx.is_qualified() {
                    let alias = ctx.require_alias(path)?;
                    ctx.dialect().column_ref(alias, &quoted)
                } else {
                    quoted
                };
                Ok(Fragment::lit(text))
            }
            ExprNode::Value(param) => {
                Ok(Fragment::placeholder(counter.next_index(), param.clone()))
            }
            ExprNode::Binary { left, op, right } => {
                let left = left.render(ctx, counter)?;
                let right = right.render(ctx, counter)?;
                Ok(Fragment::lit("(")
                    .append(left)
                    .append(Fragment::lit(format!(" {op} ")))
                    .append(right)
                    .append(Fragment::lit(")")))
            }
            ExprNode::Not(inner) => Ok(Fragment::lit("not (")
                .append(inner.render(ctx, counter)?)
                .append(Fragment::lit(")"))),
            ExprNode::Tuple(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(item.render(ctx, counter)?);
                }
                Ok(Fragment::lit("(")
                    .append(Fragment::comma(parts))
                    .append(Fragment::lit(")")))
            }
            ExprNode::InRows { lhs, rows } => {
                if rows.is_empty() {
                    // Defined zero-result semantic: no comparison is issued.
                    return Ok(Fragment::lit("1=0"));
                }
                if let ExprNode::Tuple(items) = lhs.as_ref() {
                    let mut cols = Vec::with_capacity(items.len());
                    for item in items {
                        cols.push(item.render(ctx, counter)?);
                    }
                    return Ok(ctx.dialect().render_tuple_in(&cols, rows, counter));
                }
                let lhs = lhs.render(ctx, counter)?;
                let placeholders = rows
                    .iter()
                    .map(|row| Fragment::placeholder(counter.next_index(), row[0].clone()))
                    .collect::<Vec<_>>();
                Ok(lhs
                    .append(Fragment::lit(" in ("))
                    .append(Fragment::comma(placeholders))
                    .append(Fragment::lit(")")))
            }
            ExprNode::InSubquery { lhs, subquery } => {
                if let ExprNode::Tuple(items) = lhs.as_ref() {
                    let mut cols = Vec::with_capacity(items.len());
                    for item in items {
                        cols.push(item.render(ctx, counter)?);
                    }
                    let sub = (subquery)(ctx, counter)?;
                    return Ok(ctx.dialect().render_tuple_in_subquery(&cols, sub));
                }
                let lhs = lhs.render(ctx, counter)?;
                let sub = (subquery)(ctx, counter)?;
                Ok(lhs
                    .append(Fragment::lit(" in ("))
                    .append(sub)
                    .append(Fragment::lit(")")))
            }
            ExprNode::ConstBool(value) => {
                Ok(Fragment::lit(if *value { "1=1" } else { "1=0" }))
            }
        }
    }
}

/// A typed SQL expression yielding `T`.
pub struct SqlExpr<T> {
    pub(crate) node: ExprNode,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SqlExpr<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SqlExpr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SqlExpr").field(&self.node).finish()
    }
}

impl<T> SqlExpr<T> {
    pub(crate) fn from_node(node: ExprNode) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub(crate) fn render(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Fragment> {
        self.node.render(ctx, counter)
    }

    /// A literal value, rendered as a bound placeholder.
    pub fn value(value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Self::from_node(ExprNode::Value(Param::new(value)))
    }

    fn compare(self, op: &'static str, other: SqlExpr<T>) -> SqlExpr<bool> {
        SqlExpr::from_node(ExprNode::Binary {
            left: Box::new(self.node),
            op,
            right: Box::new(other.node),
        })
    }

    pub fn eq(self, other: SqlExpr<T>) -> SqlExpr<bool> {
        self.compare("=", other)
    }

    pub fn ne(self, other: SqlExpr<T>) -> SqlExpr<bool> {
        self.compare("<>", other)
    }

    pub fn lt(self, other: SqlExpr<T>) -> SqlExpr<bool> {
        self.compare("<", other)
    }

    pub fn lte(self, other: SqlExpr<T>) -> SqlExpr<bool> {
        self.compare("<=", other)
    }

    pub fn gt(self, other: SqlExpr<T>) -> SqlExpr<bool> {
        self.compare(">", other)
    }

    pub fn gte(self, other: SqlExpr<T>) -> SqlExpr<bool> {
        self.compare(">=", other)
    }

    /// Compose with another expression into a row-valued pair, for
    /// multi-column membership tests.
    pub fn tuple_with<U>(self, other: SqlExpr<U>) -> SqlExpr<(T, U)> {
        SqlExpr::from_node(ExprNode::Tuple(vec![self.node, other.node]))
    }

    /// Compose with two other expressions into a row-valued triple.
    pub fn tuple_with2<U, V>(self, second: SqlExpr<U>, third: SqlExpr<V>) -> SqlExpr<(T, U, V)> {
        SqlExpr::from_node(ExprNode::Tuple(vec![self.node, second.node, third.node]))
    }

    /// Membership in a literal list.
    ///
    /// An empty list renders the constant-false predicate `1=0`, binds
    /// nothing, and therefore matches zero rows. Tuple membership compares
    /// with plain equality; NULL-aware row comparison is not modeled.
    pub fn among(self, values: impl IntoIterator<Item = T>) -> SqlExpr<bool>
    where
        T: AmongRow,
    {
        let rows = values
            .into_iter()
            .map(AmongRow::into_params)
            .collect::<Vec<_>>();
        SqlExpr::from_node(ExprNode::InRows {
            lhs: Box::new(self.node),
            rows,
        })
    }
}

impl SqlExpr<bool> {
    pub fn and(self, other: SqlExpr<bool>) -> SqlExpr<bool> {
        self.compare("and", other)
    }

    pub fn or(self, other: SqlExpr<bool>) -> SqlExpr<bool> {
        self.compare("or", other)
    }

    pub fn not(self) -> SqlExpr<bool> {
        SqlExpr::from_node(ExprNode::Not(Box::new(self.node)))
    }
}

impl SqlExpr<String> {
    /// SQL `like` pattern match.
    pub fn like(self, pattern: &str) -> SqlExpr<bool> {
        SqlExpr::from_node(ExprNode::Binary {
            left: Box::new(self.node),
            op: "like",
            right: Box::new(ExprNode::Value(Param::new(pattern.to_string()))),
        })
    }
}

/// Combine boolean expressions with `and`, folding from the first.
/// An empty input is the constant-true predicate.
pub fn all(exprs: impl IntoIterator<Item = SqlExpr<bool>>) -> SqlExpr<bool> {
    let mut iter = exprs.into_iter();
    match iter.next() {
        None => SqlExpr::from_node(ExprNode::ConstBool(true)),
        Some(first) => iter.fold(first, |acc, expr| acc.and(expr)),
    }
}

/// One literal row of a membership test: a scalar binds one parameter, a
/// tuple binds one parameter per component.
pub trait AmongRow {
    fn into_params(self) -> Vec<Param>;
}

macro_rules! scalar_among_row {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl AmongRow for $ty {
                fn into_params(self) -> Vec<Param> {
                    vec![Param::new(self)]
                }
            }
        )+
    };
}

scalar_among_row!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    String,
    &'static str,
    Vec<u8>,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    serde_json::Value,
);

impl<A, B> AmongRow for (A, B)
where
    A: ToSql + Send + Sync + 'static,
    B: ToSql + Send + Sync + 'static,
{
    fn into_params(self) -> Vec<Param> {
        vec![Param::new(self.0), Param::new(self.1)]
    }
}

impl<A, B, C> AmongRow for (A, B, C)
where
    A: ToSql + Send + Sync + 'static,
    B: ToSql + Send + Sync + 'static,
    C: ToSql + Send + Sync + 'static,
{
    fn into_params(self) -> Vec<Param> {
        vec![Param::new(self.0), Param::new(self.1), Param::new(self.2)]
    }
}

/// Ordering term for `order_by`.
#[derive(Clone, Debug)]
pub struct SortOrder {
    pub(crate) node: ExprNode,
    pub(crate) descending: bool,
}

impl SortOrder {
    pub(crate) fn render(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Fragment> {
        let frag = self.node.render(ctx, counter)?;
        Ok(if self.descending {
            frag.append(Fragment::lit(" desc"))
        } else {
            frag
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{AnsiDialect, Dialect, PgDialect};
    use crate::render::{AliasSeed, RenderCtx};
    use std::sync::Arc;

    fn ctx() -> RenderCtx {
        RenderCtx::from_seeds(
            vec![AliasSeed::relation(Path::named("t"), "t")],
            Arc::new(PgDialect),
        )
    }

    fn field(column: &str) -> SqlExpr<i64> {
        SqlExpr::from_node(ExprNode::Field {
            path: Path::named("t"),
            column: column.to_string(),
        })
    }

    fn render(expr: &SqlExpr<bool>, ctx: &RenderCtx) -> Fragment {
        let mut counter = ParamCounter::new();
        expr.render(ctx, &mut counter).unwrap()
    }

    #[test]
    fn comparison_binds_a_placeholder() {
        let expr = field("age").gt(SqlExpr::value(18_i64));
        let frag = render(&expr, &ctx());
        assert_eq!(frag.sql(), "((t0).\"age\" > $1)");
        assert_eq!(frag.param_count(), 1);
    }

    #[test]
    fn boolean_combinators_nest() {
        let expr = field("a")
            .eq(SqlExpr::value(1_i64))
            .and(field("b").eq(SqlExpr::value(2_i64)).not());
        let frag = render(&expr, &ctx());
        assert_eq!(
            frag.sql(),
            "(((t0).\"a\" = $1) and not (((t0).\"b\" = $2)))"
        );
        assert_eq!(frag.param_count(), 2);
    }

    #[test]
    fn placeholders_number_left_to_right() {
        let expr = field("a")
            .eq(SqlExpr::value(1_i64))
            .and(field("b").eq(SqlExpr::value(2_i64)))
            .and(field("c").eq(SqlExpr::value(3_i64)));
        let frag = render(&expr, &ctx());
        let first = frag.sql().find("$1").unwrap();
        let second = frag.sql().find("$2").unwrap();
        let third = frag.sql().find("$3").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn among_renders_scalar_in_list() {
        let expr = field("id").among(vec![1_i64, 2, 3]);
        let frag = render(&expr, &ctx());
        assert_eq!(frag.sql(), "(t0).\"id\" in ($1, $2, $3)");
        assert_eq!(frag.param_count(), 3);
    }

    #[test]
    fn among_empty_is_constant_false_with_no_params() {
        let expr = field("id").among(Vec::<i64>::new());
        let frag = render(&expr, &ctx());
        assert_eq!(frag.sql(), "1=0");
        assert_eq!(frag.param_count(), 0);
    }

    #[test]
    fn tuple_among_uses_native_row_values_on_postgres() {
        let expr = field("a")
            .tuple_with(field("b"))
            .among(vec![(1_i64, 2_i64), (3, 4)]);
        let frag = render(&expr, &ctx());
        assert_eq!(
            frag.sql(),
            "((t0).\"a\", (t0).\"b\") in (($1, $2), ($3, $4))"
        );
        assert_eq!(frag.param_count(), 4);
    }

    #[test]
    fn tuple_among_uses_exists_emulation_on_ansi() {
        let ansi_ctx = RenderCtx::from_seeds(
            vec![AliasSeed::relation(Path::named("t"), "t")],
            Arc::new(AnsiDialect) as Arc<dyn Dialect>,
        );
        let expr = field("a").tuple_with(field("b")).among(vec![(1_i64, 2_i64)]);
        let frag = render(&expr, &ansi_ctx);
        assert_eq!(
            frag.sql(),
            "exists (select 1 from (values ($1, $2)) as v(c1, c2) where t0.\"a\" = v.c1 and t0.\"b\" = v.c2)"
        );
        assert_eq!(frag.param_count(), 2);
    }

    #[test]
    fn all_of_nothing_is_constant_true() {
        let frag = render(&all(Vec::new()), &ctx());
        assert_eq!(frag.sql(), "1=1");
    }

    #[test]
    fn all_folds_with_and() {
        let expr = all(vec![
            field("a").eq(SqlExpr::value(1_i64)),
            field("b").eq(SqlExpr::value(2_i64)),
        ]);
        let frag = render(&expr, &ctx());
        assert_eq!(frag.sql(), "(((t0).\"a\" = $1) and ((t0).\"b\" = $2))");
    }

    #[test]
    fn like_binds_the_pattern() {
        let name = SqlExpr::<String>::from_node(ExprNode::Field {
            path: Path::named("t"),
            column: "name".to_string(),
        });
        let frag = render(&name.like("al%"), &ctx());
        assert_eq!(frag.sql(), "((t0).\"name\" like $1)");
        assert_eq!(frag.param_count(), 1);
    }

    #[test]
    fn unresolved_field_fails_loudly() {
        let stray = SqlExpr::<i64>::from_node(ExprNode::Field {
            path: Path::named("elsewhere"),
            column: "id".to_string(),
        });
        let mut counter = ParamCounter::new();
        let err = stray
            .eq(SqlExpr::value(1_i64))
            .render(&ctx(), &mut counter)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::DslError::UnresolvableAlias { .. }
        ));
    }
}
