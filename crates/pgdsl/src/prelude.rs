//! Convenient imports for typical `pgdsl` usage.
//!
//! ```ignore
//! use pgdsl::prelude::*;
//! ```

pub use crate::{
    AnsiDialect, Column, Compiled, DbValue, DeleteBuilder, Dialect, DslError, DslResult, Field,
    Fragment, GenericClient, Join, LeftJoin, Param, ParamCounter, Path, PathSegment, PgCodec,
    PgDialect, Projection, Relation, RenderCtx, RowParser, SelectBuilder, SortOrder, SqlExpr,
    Structure, all, codec,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
