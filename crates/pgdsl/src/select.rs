//! The select algebra and its compiler.
//!
//! A query is a binary tree of [`Relation`], [`Join`] and [`LeftJoin`]
//! nodes. Compiling walks the tree three times: once to collect alias
//! seeds, once to assign aliases ([`RenderCtx`]), and once bottom-up
//! (`instantiate`) to lower every node into a named CTE while composing
//! the row parser offset-by-offset, in step with emitted column order.
//! Parameter placeholders are numbered in render order by a single counter
//! per top-level compile.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::client::GenericClient;
use crate::dialect::{Dialect, PgDialect};
use crate::error::DslResult;
use crate::expr::{ExprNode, SortOrder, SqlExpr, SubqueryFn};
use crate::fragment::Fragment;
use crate::param::ParamCounter;
use crate::path::{Path, PathSegment};
use crate::render::{AliasSeed, RenderCtx};
use crate::row::{ParserAt, RowParser};
use crate::structure::{Column, Structure};

pub(crate) type PredFn<F> = Arc<dyn Fn(&F) -> SqlExpr<bool> + Send + Sync>;
type SortFn<F> = Arc<dyn Fn(&F) -> SortOrder + Send + Sync>;
type JoinPredFn<F1, F2> = Arc<dyn Fn(&(F1, F2)) -> SqlExpr<bool> + Send + Sync>;

/// Filter/sort/pagination parameters accumulated on one builder node.
///
/// Appended through the builder methods, rendered once per compile: the
/// predicate list is AND-folded from the first element, and with no
/// predicates the WHERE clause is omitted entirely.
pub struct SelectParams<F> {
    wheres: Vec<PredFn<F>>,
    order_by: Vec<SortFn<F>>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<F> Default for SelectParams<F> {
    fn default() -> Self {
        Self {
            wheres: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl<F> Clone for SelectParams<F> {
    fn clone(&self) -> Self {
        Self {
            wheres: self.wheres.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl<F> SelectParams<F> {
    fn and_where(mut self, pred: PredFn<F>) -> Self {
        self.wheres.push(pred);
        self
    }

    fn and_order(mut self, term: SortFn<F>) -> Self {
        self.order_by.push(term);
        self
    }

    fn with_limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    fn with_offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    fn render(
        &self,
        fields: &F,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Option<Fragment>> {
        let mut pieces = Vec::new();

        if !self.wheres.is_empty() {
            let mut combined = (self.wheres[0])(fields);
            for pred in &self.wheres[1..] {
                combined = combined.and((pred)(fields));
            }
            pieces.push(Fragment::lit("where ").append(combined.render(ctx, counter)?));
        }

        if !self.order_by.is_empty() {
            let mut terms = Vec::with_capacity(self.order_by.len());
            for term in &self.order_by {
                terms.push((term)(fields).render(ctx, counter)?);
            }
            pieces.push(Fragment::lit("order by ").append(Fragment::comma(terms)));
        }

        if let Some(n) = self.offset {
            pieces.push(Fragment::lit(ctx.dialect().offset_clause(n)));
        }
        if let Some(n) = self.limit {
            pieces.push(Fragment::lit(ctx.dialect().limit_clause(n)));
        }

        if pieces.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Fragment::join(pieces, " ")))
        }
    }
}

/// A named CTE produced while lowering the tree.
#[derive(Clone, Debug)]
pub(crate) struct Cte {
    name: String,
    sql: Fragment,
    is_join: bool,
}

/// An output column together with the leaf alias that owns it.
#[derive(Clone, Debug)]
pub struct TaggedColumn {
    pub alias: String,
    pub column: Column,
}

/// The result of lowering one builder node: its alias, its output columns
/// (tagged with their owning leaf alias), the fragment defining it as a
/// named sub-query, the CTEs it depends on, and the
/// offset-parameterized row parser factory. Created fresh on every
/// `instantiate` call.
pub struct Instantiated<F, R> {
    pub(crate) alias: String,
    pub(crate) is_join: bool,
    pub(crate) columns: Vec<TaggedColumn>,
    pub(crate) sql: Fragment,
    pub(crate) upstream: Vec<Cte>,
    pub(crate) structure: Structure<F, R>,
    pub(crate) row_parser: ParserAt<R>,
}

impl<F, R> Instantiated<F, R> {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn columns(&self) -> &[TaggedColumn] {
        &self.columns
    }

    /// All CTEs this node depends on, children before the node itself.
    fn as_ctes(&self) -> Vec<Cte> {
        let mut out = self.upstream.clone();
        out.push(Cte {
            name: self.alias.clone(),
            sql: self.sql.clone(),
            is_join: self.is_join,
        });
        out
    }
}

fn cte_clause(ctes: &[Cte]) -> Fragment {
    Fragment::comma(ctes.iter().map(|cte| {
        Fragment::lit(format!("{} as (\n  ", cte.name))
            .append(cte.sql.clone())
            .append(Fragment::lit("\n)"))
    }))
}

mod sealed {
    pub trait Sealed {}
}

/// A SQL-backed select builder node.
///
/// The node set is closed: [`Relation`], [`Join`] and [`LeftJoin`] are the
/// only implementations, and the compiler exhaustively handles exactly
/// those shapes. Builders are immutable: every modifier returns a new
/// node, so trees are safe to share and re-compile concurrently.
pub trait SelectBuilder: sealed::Sealed + Clone + Send + Sync + Sized + 'static {
    /// The fields view handed to predicate and projection closures.
    type Fields: 'static;
    /// The decoded row shape.
    type Row: 'static;

    fn structure(&self) -> Structure<Self::Fields, Self::Row>;

    /// Copy of this builder relabeled under a new leading path segment.
    fn with_path(&self, segment: PathSegment) -> Self;

    #[doc(hidden)]
    fn map_params(
        self,
        f: impl FnOnce(SelectParams<Self::Fields>) -> SelectParams<Self::Fields>,
    ) -> Self;

    /// Record `(path, base name)` seeds for alias assignment.
    fn alias_seeds(&self, out: &mut Vec<AliasSeed>);

    /// Lower this node into a named CTE.
    fn instantiate(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Instantiated<Self::Fields, Self::Row>>;

    // ---- algebra ----

    /// Append a filter predicate. All predicates on a node are combined
    /// with `and` at render time; zero predicates emit no WHERE clause.
    fn filter(
        self,
        pred: impl Fn(&Self::Fields) -> SqlExpr<bool> + Send + Sync + 'static,
    ) -> Self {
        self.map_params(|params| params.and_where(Arc::new(pred)))
    }

    /// Append an ordering term.
    fn order_by(
        self,
        term: impl Fn(&Self::Fields) -> SortOrder + Send + Sync + 'static,
    ) -> Self {
        self.map_params(|params| params.and_order(Arc::new(term)))
    }

    fn limit(self, n: u64) -> Self {
        self.map_params(|params| params.with_limit(n))
    }

    fn offset(self, n: u64) -> Self {
        self.map_params(|params| params.with_offset(n))
    }

    /// Inner join on a predicate over the paired fields.
    fn join_on<Other: SelectBuilder>(
        self,
        other: Other,
        pred: impl Fn(&(Self::Fields, Other::Fields)) -> SqlExpr<bool> + Send + Sync + 'static,
    ) -> Join<Self, Other> {
        Join {
            left: self.with_path(PathSegment::LeftOperand),
            right: other.with_path(PathSegment::RightOperand),
            pred: Arc::new(pred),
            params: SelectParams::default(),
        }
    }

    /// Left join on a predicate over the paired fields; the right row
    /// decodes as `None` when unmatched.
    fn left_join_on<Other: SelectBuilder>(
        self,
        other: Other,
        pred: impl Fn(&(Self::Fields, Other::Fields)) -> SqlExpr<bool> + Send + Sync + 'static,
    ) -> LeftJoin<Self, Other> {
        LeftJoin {
            left: self.with_path(PathSegment::LeftOperand),
            right: other.with_path(PathSegment::RightOperand),
            pred: Arc::new(pred),
            params: SelectParams::default(),
        }
    }

    /// Project one expression out of this builder, for membership
    /// subqueries.
    fn project<T>(
        self,
        expr: impl Fn(&Self::Fields) -> SqlExpr<T> + Send + Sync + 'static,
    ) -> Projection<Self, T> {
        Projection {
            builder: self,
            expr: Arc::new(expr),
            _marker: PhantomData,
        }
    }

    // ---- compilation ----

    /// Compile with the default PostgreSQL dialect.
    fn compile(&self) -> DslResult<Compiled<Self::Row>> {
        self.compile_with(&(Arc::new(PgDialect) as Arc<dyn Dialect>))
    }

    /// Compile against a specific dialect, producing the final statement
    /// and the row parser matching its emitted column order.
    fn compile_with(&self, dialect: &Arc<dyn Dialect>) -> DslResult<Compiled<Self::Row>> {
        let mut seeds = Vec::new();
        self.alias_seeds(&mut seeds);
        let ctx = RenderCtx::from_seeds(seeds, dialect.clone());
        let mut counter = ParamCounter::new();
        let instance = self.instantiate(&ctx, &mut counter)?;

        let mut cols = Vec::with_capacity(instance.columns.len());
        for tagged in &instance.columns {
            let quoted = dialect.quote_ident(tagged.column.name());
            let base = Fragment::lit(dialect.column_ref(&tagged.alias, &quoted));
            cols.push(match tagged.column.read_cast() {
                Some(cast) => dialect.type_cast(base, cast),
                None => base,
            });
        }

        let ctes = instance.as_ctes();
        let outermost = ctes
            .last()
            .expect("instantiate yields at least one CTE")
            .name
            .clone();
        let sql = Fragment::lit("with \n")
            .append(cte_clause(&ctes))
            .append(Fragment::lit("\nselect "))
            .append(Fragment::join(cols, ","))
            .append(Fragment::lit(format!(" from {outermost}")));

        Ok(Compiled {
            sql,
            parser: (instance.row_parser)(0),
        })
    }

    // ---- execution ----

    /// Compile, execute, and decode every row.
    fn to_list(
        &self,
        client: &impl GenericClient,
    ) -> impl std::future::Future<Output = DslResult<Vec<Self::Row>>> + Send
    where
        Self::Row: Send,
    {
        async move {
            let compiled = self.compile()?;
            compiled.to_list(client).await
        }
    }

    /// Compile and execute as `select count(*)`.
    fn count(
        &self,
        client: &impl GenericClient,
    ) -> impl std::future::Future<Output = DslResult<i64>> + Send {
        async move {
            let compiled = self.compile()?;
            compiled.count(client).await
        }
    }
}

/// A leaf relation: one table with its structure and row parser.
pub struct Relation<F, R> {
    table: String,
    structure: Structure<F, R>,
    parser_at: ParserAt<R>,
    params: SelectParams<F>,
}

impl<F, R> Clone for Relation<F, R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            structure: self.structure.clone(),
            parser_at: self.parser_at.clone(),
            params: self.params.clone(),
        }
    }
}

impl<F: 'static, R: 'static> Relation<F, R> {
    pub fn new(
        table: &str,
        fields: impl Fn(&Path) -> F + Send + Sync + 'static,
        columns: Vec<Column>,
        parser_at: impl Fn(usize) -> RowParser<R> + Send + Sync + 'static,
    ) -> Self {
        Self {
            table: table.to_string(),
            structure: Structure::new(table, fields, columns),
            parser_at: Arc::new(parser_at),
            params: SelectParams::default(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// A DELETE builder over the same table, structure and parser.
    pub fn delete(&self) -> crate::delete::DeleteBuilder<F, R> {
        crate::delete::DeleteBuilder::from_parts(
            self.table.clone(),
            self.structure.clone(),
            self.parser_at.clone(),
        )
    }
}

impl<F, R> sealed::Sealed for Relation<F, R> {}

impl<F: 'static, R: 'static> SelectBuilder for Relation<F, R> {
    type Fields = F;
    type Row = R;

    fn structure(&self) -> Structure<F, R> {
        self.structure.clone()
    }

    fn with_path(&self, segment: PathSegment) -> Self {
        Self {
            table: self.table.clone(),
            structure: self.structure.with_path_prefix(segment),
            parser_at: self.parser_at.clone(),
            params: self.params.clone(),
        }
    }

    fn map_params(mut self, f: impl FnOnce(SelectParams<F>) -> SelectParams<F>) -> Self {
        self.params = f(self.params);
        self
    }

    fn alias_seeds(&self, out: &mut Vec<AliasSeed>) {
        out.push(AliasSeed::relation(
            self.structure.path().clone(),
            &self.table,
        ));
    }

    fn instantiate(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Instantiated<F, R>> {
        let alias = ctx.require_alias(self.structure.path())?.to_string();
        let fields = self.structure.fields();
        let clauses = self.params.render(&fields, ctx, counter)?;

        let mut sql = Fragment::lit(format!(
            "(select {alias} from {} {alias}",
            ctx.dialect().quote_table(&self.table)
        ));
        if let Some(clauses) = clauses {
            sql = sql.append(Fragment::lit(" ")).append(clauses);
        }
        let sql = sql.append(Fragment::lit(")"));

        let columns = self
            .structure
            .columns()
            .iter()
            .map(|column| TaggedColumn {
                alias: alias.clone(),
                column: column.clone(),
            })
            .collect();

        Ok(Instantiated {
            alias,
            is_join: false,
            columns,
            sql,
            upstream: Vec::new(),
            structure: self.structure.clone(),
            row_parser: self.parser_at.clone(),
        })
    }
}

/// Inner join of two builders on a predicate.
pub struct Join<L: SelectBuilder, Rt: SelectBuilder> {
    left: L,
    right: Rt,
    pred: JoinPredFn<L::Fields, Rt::Fields>,
    params: SelectParams<(L::Fields, Rt::Fields)>,
}

impl<L: SelectBuilder, Rt: SelectBuilder> Clone for Join<L, Rt> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
            pred: self.pred.clone(),
            params: self.params.clone(),
        }
    }
}

impl<L: SelectBuilder, Rt: SelectBuilder> sealed::Sealed for Join<L, Rt> {}

impl<L: SelectBuilder, Rt: SelectBuilder> SelectBuilder for Join<L, Rt> {
    type Fields = (L::Fields, Rt::Fields);
    type Row = (L::Row, Rt::Row);

    fn structure(&self) -> Structure<Self::Fields, Self::Row> {
        self.left.structure().join(&self.right.structure())
    }

    fn with_path(&self, segment: PathSegment) -> Self {
        Self {
            left: self.left.with_path(segment.clone()),
            right: self.right.with_path(segment),
            pred: self.pred.clone(),
            params: self.params.clone(),
        }
    }

    fn map_params(
        mut self,
        f: impl FnOnce(SelectParams<Self::Fields>) -> SelectParams<Self::Fields>,
    ) -> Self {
        self.params = f(self.params);
        self
    }

    fn alias_seeds(&self, out: &mut Vec<AliasSeed>) {
        out.push(AliasSeed::join(self.structure().path().clone()));
        self.left.alias_seeds(out);
        self.right.alias_seeds(out);
    }

    fn instantiate(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Instantiated<Self::Fields, Self::Row>> {
        let alias = ctx.require_alias(self.structure().path())?.to_string();
        let left = self.left.instantiate(ctx, counter)?;
        let right = self.right.instantiate(ctx, counter)?;
        let structure = left.structure.join(&right.structure);
        let fields = structure.fields();

        let mut ctes = left.as_ctes();
        ctes.extend(right.as_ctes());
        let leaf_names = ctes
            .iter()
            .filter(|cte| !cte.is_join)
            .map(|cte| cte.name.as_str())
            .collect::<Vec<_>>();

        let mut sql = Fragment::lit(format!("select {}", leaf_names.join(", ")))
            .append(Fragment::lit(format!(
                "\n  from {}\n  join {}\n  on ",
                left.alias, right.alias
            )))
            .append((self.pred)(&fields).render(ctx, counter)?);
        if let Some(clauses) = self.params.render(&fields, ctx, counter)? {
            sql = sql.append(Fragment::lit("\n  ")).append(clauses);
        }

        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());

        let left_width = left.columns.len();
        let left_parser = left.row_parser.clone();
        let right_parser = right.row_parser.clone();
        let row_parser: ParserAt<Self::Row> = Arc::new(move |offset| {
            (left_parser)(offset).joined(&(right_parser)(offset + left_width))
        });

        Ok(Instantiated {
            alias,
            is_join: true,
            columns,
            sql,
            upstream: ctes,
            structure,
            row_parser,
        })
    }
}

/// Left join of two builders on a predicate. The right row decodes as
/// `None` when no match was found; absence detection is the row-parser's
/// all-NULL check over the right-hand column range.
pub struct LeftJoin<L: SelectBuilder, Rt: SelectBuilder> {
    left: L,
    right: Rt,
    pred: JoinPredFn<L::Fields, Rt::Fields>,
    params: SelectParams<(L::Fields, Rt::Fields)>,
}

impl<L: SelectBuilder, Rt: SelectBuilder> Clone for LeftJoin<L, Rt> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
            pred: self.pred.clone(),
            params: self.params.clone(),
        }
    }
}

impl<L: SelectBuilder, Rt: SelectBuilder> sealed::Sealed for LeftJoin<L, Rt> {}

impl<L: SelectBuilder, Rt: SelectBuilder> SelectBuilder for LeftJoin<L, Rt> {
    type Fields = (L::Fields, Rt::Fields);
    type Row = (L::Row, Option<Rt::Row>);

    fn structure(&self) -> Structure<Self::Fields, Self::Row> {
        self.left.structure().left_join(&self.right.structure())
    }

    fn with_path(&self, segment: PathSegment) -> Self {
        Self {
            left: self.left.with_path(segment.clone()),
            right: self.right.with_path(segment),
            pred: self.pred.clone(),
            params: self.params.clone(),
        }
    }

    fn map_params(
        mut self,
        f: impl FnOnce(SelectParams<Self::Fields>) -> SelectParams<Self::Fields>,
    ) -> Self {
        self.params = f(self.params);
        self
    }

    fn alias_seeds(&self, out: &mut Vec<AliasSeed>) {
        out.push(AliasSeed::left_join(self.structure().path().clone()));
        self.left.alias_seeds(out);
        self.right.alias_seeds(out);
    }

    fn instantiate(
        &self,
        ctx: &RenderCtx,
        counter: &mut ParamCounter,
    ) -> DslResult<Instantiated<Self::Fields, Self::Row>> {
        let alias = ctx.require_alias(self.structure().path())?.to_string();
        let left = self.left.instantiate(ctx, counter)?;
        let right = self.right.instantiate(ctx, counter)?;
        let structure = left.structure.left_join(&right.structure);
        let fields = structure.fields();

        let mut ctes = left.as_ctes();
        ctes.extend(right.as_ctes());
        let leaf_names = ctes
            .iter()
            .filter(|cte| !cte.is_join)
            .map(|cte| cte.name.as_str())
            .collect::<Vec<_>>();

        let mut sql = Fragment::lit(format!("select {}", leaf_names.join(", ")))
            .append(Fragment::lit(format!(
                "\n  from {}\n  left join {}\n  on ",
                left.alias, right.alias
            )))
            .append((self.pred)(&fields).render(ctx, counter)?);
        if let Some(clauses) = self.params.render(&fields, ctx, counter)? {
            sql = sql.append(Fragment::lit("\n  ")).append(clauses);
        }

        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());

        let left_width = left.columns.len();
        let left_parser = left.row_parser.clone();
        let right_parser = right.row_parser.clone();
        let row_parser: ParserAt<Self::Row> = Arc::new(move |offset| {
            (left_parser)(offset).left_joined(&(right_parser)(offset + left_width))
        });

        Ok(Instantiated {
            alias,
            is_join: true,
            columns,
            sql,
            upstream: ctes,
            structure,
            row_parser,
        })
    }
}

/// One projected expression over a builder, used as a membership subquery.
pub struct Projection<B: SelectBuilder, T> {
    builder: B,
    expr: Arc<dyn Fn(&B::Fields) -> SqlExpr<T> + Send + Sync>,
    _marker: PhantomData<fn() -> T>,
}

impl<B: SelectBuilder, T> Clone for Projection<B, T> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            expr: self.expr.clone(),
            _marker: PhantomData,
        }
    }
}

impl<B: SelectBuilder, T> Projection<B, T> {
    /// Render `with ... select <expr> from <outermost>` using the caller's
    /// counter, so placeholder numbering stays globally unique across the
    /// whole statement. The subquery gets its own alias map.
    fn render(&self, ctx: &RenderCtx, counter: &mut ParamCounter) -> DslResult<Fragment> {
        let mut seeds = Vec::new();
        self.builder.alias_seeds(&mut seeds);
        let inner = RenderCtx::from_seeds(seeds, ctx.dialect().clone());
        let instance = self.builder.instantiate(&inner, counter)?;
        let fields = instance.structure.fields();
        let ctes = instance.as_ctes();
        let outermost = ctes
            .last()
            .expect("instantiate yields at least one CTE")
            .name
            .clone();
        let projected = (self.expr)(&fields).render(&inner, counter)?;
        Ok(Fragment::lit("with \n")
            .append(cte_clause(&ctes))
            .append(Fragment::lit("\nselect "))
            .append(projected)
            .append(Fragment::lit(format!(" from {outermost}"))))
    }
}

impl<T: 'static> SqlExpr<T> {
    /// Membership in the rows of a projected sub-builder. The subquery is
    /// rendered inline, sharing the outer statement's parameter counter.
    pub fn among_query<B: SelectBuilder>(self, projection: Projection<B, T>) -> SqlExpr<bool> {
        let subquery: SubqueryFn =
            Arc::new(move |ctx, counter| projection.render(ctx, counter));
        SqlExpr::from_node(ExprNode::InSubquery {
            lhs: Box::new(self.node),
            subquery,
        })
    }
}

/// A compiled query: the final statement plus the row parser whose column
/// list matches the emitted select list exactly, in the same order.
#[must_use]
pub struct Compiled<R> {
    sql: Fragment,
    parser: RowParser<R>,
}

impl<R> std::fmt::Debug for Compiled<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiled")
            .field("sql", &self.sql.sql())
            .field("parser", &self.parser)
            .finish()
    }
}

impl<R> Compiled<R> {
    pub fn sql(&self) -> &Fragment {
        &self.sql
    }

    pub fn parser(&self) -> &RowParser<R> {
        &self.parser
    }

    /// Execute and decode every row.
    pub async fn to_list(&self, client: &impl GenericClient) -> DslResult<Vec<R>> {
        let text = self.sql.sql();
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %text, params = self.sql.param_count(), "executing select");
        let rows = client
            .query(text, &self.sql.params_ref())
            .await
            .map_err(|e| e.with_sql(text))?;
        decode_rows(&self.parser, &rows)
    }

    /// Execute `select count(*)` over this query.
    pub async fn count(&self, client: &impl GenericClient) -> DslResult<i64> {
        let sql = Fragment::lit("select count(*) from (")
            .append(self.sql.clone())
            .append(Fragment::lit(") rows"));
        let text = sql.sql();
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %text, params = sql.param_count(), "executing count");
        let row = client
            .query_one(text, &sql.params_ref())
            .await
            .map_err(|e| e.with_sql(text))?;
        row.try_get(0).map_err(crate::error::DslError::Query)
    }
}

/// Fetch each emitted column positionally and decode through the parser.
/// Row layout mismatches surface as decode errors, never as silently
/// shifted values.
pub(crate) fn decode_rows<R>(
    parser: &RowParser<R>,
    rows: &[tokio_postgres::Row],
) -> DslResult<Vec<R>> {
    let columns = parser.columns();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            values.push(column.fetch(row, index)?);
        }
        out.push(parser.decode(&values)?);
    }
    Ok(out)
}
