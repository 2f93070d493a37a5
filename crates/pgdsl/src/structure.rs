//! Table structure: column descriptors, typed field handles, and the
//! compile-time pairing of a fields view with a row shape.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_postgres::types::ToSql;

use crate::codec::{FetchFn, PgCodec};
use crate::error::DslResult;
use crate::expr::{AmongRow, ExprNode, SortOrder, SqlExpr};
use crate::path::{Path, PathSegment};
use crate::value::DbValue;

/// One emitted column: name, optional read-time cast, and the opaque fetch
/// function supplied by its scalar codec.
#[derive(Clone)]
pub struct Column {
    name: String,
    read_cast: Option<String>,
    fetch: FetchFn,
}

impl Column {
    pub fn new<T>(name: &str, codec: &PgCodec<T>) -> Self {
        Self {
            name: name.to_string(),
            read_cast: None,
            fetch: codec.fetch_fn(),
        }
    }

    /// Apply a read-time cast in the outer select list, e.g. `::text`.
    pub fn with_read_cast(mut self, cast: &str) -> Self {
        self.read_cast = Some(cast.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_cast(&self) -> Option<&str> {
        self.read_cast.as_deref()
    }

    pub(crate) fn fetch(&self, row: &tokio_postgres::Row, index: usize) -> DslResult<DbValue> {
        (self.fetch)(row, index)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("read_cast", &self.read_cast)
            .finish_non_exhaustive()
    }
}

/// A typed handle to one column of a builder, usable inside predicate and
/// projection closures.
pub struct Field<T> {
    path: Path,
    column: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            column: self.column.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path)
            .field("column", &self.column)
            .finish()
    }
}

impl<T> Field<T> {
    pub fn new(path: &Path, column: &str) -> Self {
        Self {
            path: path.clone(),
            column: column.to_string(),
            _marker: PhantomData,
        }
    }

    pub fn expr(&self) -> SqlExpr<T> {
        SqlExpr::from_node(self.node())
    }

    fn node(&self) -> ExprNode {
        ExprNode::Field {
            path: self.path.clone(),
            column: self.column.clone(),
        }
    }

    /// Compare against another field of the same type.
    pub fn eq_field(&self, other: &Field<T>) -> SqlExpr<bool> {
        self.expr().eq(other.expr())
    }

    /// Pair with another field for a multi-column membership test.
    pub fn tuple_with<U>(&self, other: &Field<U>) -> SqlExpr<(T, U)> {
        self.expr().tuple_with(other.expr())
    }

    pub fn asc(&self) -> SortOrder {
        SortOrder {
            node: self.node(),
            descending: false,
        }
    }

    pub fn desc(&self) -> SortOrder {
        SortOrder {
            node: self.node(),
            descending: true,
        }
    }
}

impl<T: ToSql + Send + Sync + 'static> Field<T> {
    pub fn eq(&self, value: T) -> SqlExpr<bool> {
        self.expr().eq(SqlExpr::value(value))
    }

    pub fn ne(&self, value: T) -> SqlExpr<bool> {
        self.expr().ne(SqlExpr::value(value))
    }

    pub fn lt(&self, value: T) -> SqlExpr<bool> {
        self.expr().lt(SqlExpr::value(value))
    }

    pub fn lte(&self, value: T) -> SqlExpr<bool> {
        self.expr().lte(SqlExpr::value(value))
    }

    pub fn gt(&self, value: T) -> SqlExpr<bool> {
        self.expr().gt(SqlExpr::value(value))
    }

    pub fn gte(&self, value: T) -> SqlExpr<bool> {
        self.expr().gte(SqlExpr::value(value))
    }
}

impl<T: AmongRow> Field<T> {
    /// Membership in a literal list; an empty list matches zero rows.
    pub fn among(&self, values: impl IntoIterator<Item = T>) -> SqlExpr<bool> {
        self.expr().among(values)
    }
}

impl Field<String> {
    /// SQL `like` pattern match.
    pub fn like(&self, pattern: &str) -> SqlExpr<bool> {
        self.expr().like(pattern)
    }
}

/// Compile-time pairing of a fields view (used to build predicates and
/// projections) with a row shape (the materialized value) for one node.
///
/// Never mutated after construction; relabeling returns a copy.
pub struct Structure<F, R> {
    path: Path,
    fields: Arc<dyn Fn(&Path) -> F + Send + Sync>,
    columns: Vec<Column>,
    _marker: PhantomData<fn() -> R>,
}

impl<F, R> Clone for Structure<F, R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            fields: self.fields.clone(),
            columns: self.columns.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, R> fmt::Debug for Structure<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("path", &self.path)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl<F: 'static, R> Structure<F, R> {
    /// Structure of a leaf relation, rooted at `[Named(table)]`.
    pub fn new(
        table: &str,
        fields: impl Fn(&Path) -> F + Send + Sync + 'static,
        columns: Vec<Column>,
    ) -> Self {
        Self {
            path: Path::named(table),
            fields: Arc::new(fields),
            columns,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The fields view at this node's current path.
    pub fn fields(&self) -> F {
        (self.fields)(&self.path)
    }

    /// Copy relabeled under a new leading segment. Builders relabel their
    /// children recursively; composed structures are recomputed from their
    /// operands rather than relabeled in place.
    pub(crate) fn with_path_prefix(&self, segment: PathSegment) -> Self {
        Self {
            path: self.path.prefixed(segment),
            fields: self.fields.clone(),
            columns: self.columns.clone(),
            _marker: PhantomData,
        }
    }

    /// Pair with another structure for an inner join.
    pub fn join<F2: 'static, R2>(&self, other: &Structure<F2, R2>) -> Structure<(F, F2), (R, R2)> {
        let left_fields = self.fields.clone();
        let left_path = self.path.clone();
        let right_fields = other.fields.clone();
        let right_path = other.path.clone();
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Structure {
            path: self.path.concat(&other.path),
            fields: Arc::new(move |_| ((left_fields)(&left_path), (right_fields)(&right_path))),
            columns,
            _marker: PhantomData,
        }
    }

    /// Pair with another structure for a left join: same fields view, the
    /// right row becomes optional.
    pub fn left_join<F2: 'static, R2>(
        &self,
        other: &Structure<F2, R2>,
    ) -> Structure<(F, F2), (R, Option<R2>)> {
        let left_fields = self.fields.clone();
        let left_path = self.path.clone();
        let right_fields = other.fields.clone();
        let right_path = other.path.clone();
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Structure {
            path: self.path.concat(&other.path),
            fields: Arc::new(move |_| ((left_fields)(&left_path), (right_fields)(&right_path))),
            columns,
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    struct TFields {
        id: Field<i64>,
    }

    fn structure() -> Structure<TFields, i64> {
        Structure::new(
            "t",
            |path: &Path| TFields {
                id: Field::new(path, "id"),
            },
            vec![Column::new("id", &codec::int8())],
        )
    }

    #[test]
    fn leaf_path_is_named_table() {
        assert_eq!(structure().path(), &Path::named("t"));
    }

    #[test]
    fn relabeling_moves_the_fields_view() {
        let relabeled = structure().with_path_prefix(PathSegment::LeftOperand);
        let fields = relabeled.fields();
        let expected = Path::named("t").prefixed(PathSegment::LeftOperand);
        assert_eq!(relabeled.path(), &expected);
        assert_eq!(fields.id.path, expected);
    }

    #[test]
    fn join_concatenates_paths_and_columns() {
        let left = structure().with_path_prefix(PathSegment::LeftOperand);
        let right = structure().with_path_prefix(PathSegment::RightOperand);
        let joined = left.join(&right);
        assert_eq!(joined.columns().len(), 2);
        assert_eq!(joined.path(), &left.path().concat(right.path()));
        // Each side's fields stay rooted at their own path.
        let (l, r) = joined.fields();
        assert_eq!(l.id.path, *left.path());
        assert_eq!(r.id.path, *right.path());
    }
}
