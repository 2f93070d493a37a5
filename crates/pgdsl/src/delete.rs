//! DELETE statements over a single relation.

use std::sync::Arc;

use crate::client::GenericClient;
use crate::dialect::{Dialect, PgDialect};
use crate::error::DslResult;
use crate::expr::SqlExpr;
use crate::fragment::Fragment;
use crate::param::ParamCounter;
use crate::render::RenderCtx;
use crate::row::ParserAt;
use crate::select::{PredFn, decode_rows};
use crate::structure::Structure;

/// DELETE builder with the same predicate closures as selects.
///
/// Field references render unqualified (bare quoted columns), since a
/// DELETE addresses exactly one table.
///
/// # Safety
/// By default, a DELETE without predicates renders `where 1=0` (no-op).
/// Use `allow_delete_all(true)` to allow deleting all rows.
pub struct DeleteBuilder<F, R> {
    table: String,
    structure: Structure<F, R>,
    parser_at: ParserAt<R>,
    wheres: Vec<PredFn<F>>,
    allow_delete_all: bool,
}

impl<F, R> Clone for DeleteBuilder<F, R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            structure: self.structure.clone(),
            parser_at: self.parser_at.clone(),
            wheres: self.wheres.clone(),
            allow_delete_all: self.allow_delete_all,
        }
    }
}

impl<F: 'static, R> DeleteBuilder<F, R> {
    pub(crate) fn from_parts(
        table: String,
        structure: Structure<F, R>,
        parser_at: ParserAt<R>,
    ) -> Self {
        Self {
            table,
            structure,
            parser_at,
            wheres: Vec::new(),
            allow_delete_all: false,
        }
    }

    /// Append a filter predicate; predicates are combined with `and`.
    pub fn filter(mut self, pred: impl Fn(&F) -> SqlExpr<bool> + Send + Sync + 'static) -> Self {
        self.wheres.push(Arc::new(pred));
        self
    }

    /// Allow DELETE without predicates (dangerous!).
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
        self
    }

    /// Render the DELETE statement with the default PostgreSQL dialect.
    pub fn sql(&self) -> DslResult<Fragment> {
        self.sql_with(&(Arc::new(PgDialect) as Arc<dyn Dialect>))
    }

    /// Render the DELETE statement against a specific dialect.
    pub fn sql_with(&self, dialect: &Arc<dyn Dialect>) -> DslResult<Fragment> {
        let ctx = RenderCtx::single_table(dialect.clone());
        let mut counter = ParamCounter::new();

        let mut sql = Fragment::lit(format!("delete from {}", dialect.quote_table(&self.table)));
        if self.wheres.is_empty() {
            if !self.allow_delete_all {
                sql = sql.append(Fragment::lit(" where 1=0"));
            }
        } else {
            let fields = self.structure.fields();
            let mut combined = (self.wheres[0])(&fields);
            for pred in &self.wheres[1..] {
                combined = combined.and((pred)(&fields));
            }
            sql = sql
                .append(Fragment::lit(" where "))
                .append(combined.render(&ctx, &mut counter)?);
        }
        Ok(sql)
    }

    /// Execute, returning the number of deleted rows.
    pub async fn execute(&self, client: &impl GenericClient) -> DslResult<u64> {
        let sql = self.sql()?;
        let text = sql.sql();
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %text, params = sql.param_count(), "executing delete");
        client
            .execute(text, &sql.params_ref())
            .await
            .map_err(|e| e.with_sql(text))
    }

    /// Execute with `returning *`, decoding full rows through the
    /// relation's parser.
    pub async fn execute_returning(&self, client: &impl GenericClient) -> DslResult<Vec<R>> {
        let sql = self.sql()?.append(Fragment::lit(" returning *"));
        let text = sql.sql();
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %text, params = sql.param_count(), "executing delete returning");
        let rows = client
            .query(text, &sql.params_ref())
            .await
            .map_err(|e| e.with_sql(text))?;
        decode_rows(&(self.parser_at)(0), &rows)
    }
}
