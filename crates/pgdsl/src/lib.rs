//! # pgdsl
//!
//! A typed, composable SQL query builder and row decoder for PostgreSQL.
//!
//! Queries are built from typed table relations, joined into trees, and
//! compiled in one pass into nested-CTE SQL plus a positional row parser
//! that tracks the emitted column order exactly.
//!
//! ## Features
//!
//! - **Typed algebra**: relations carry a fields view for predicates and a
//!   row shape for results; joins pair both
//! - **Deterministic aliases**: aliases are a pure function of tree shape,
//!   so self-joins and reassembled trees render identically
//! - **No string placeholders**: literal values always bind as `$n`
//!   parameters, numbered left to right by one counter per compile
//! - **Synchronized decoding**: the row parser is composed together with
//!   the column list, offset by offset, so decode can never drift from the
//!   emitted SQL
//! - **Pluggable dialect**: engine-specific rendering (identifier quoting,
//!   tuple membership) goes through a strategy trait
//!
//! ## Example
//!
//! ```ignore
//! use pgdsl::prelude::*;
//!
//! let query = orders()
//!     .join_on(customers(), |(o, c)| o.customer_id.eq_field(&c.id))
//!     .filter(|(o, _)| o.total.gt(100.0));
//!
//! let rows: Vec<(OrderRow, CustomerRow)> = query.to_list(&client).await?;
//! let total = query.count(&client).await?;
//! ```

pub mod client;
pub mod codec;
pub mod delete;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod param;
pub mod path;
pub mod prelude;
pub mod render;
pub mod row;
pub mod select;
pub mod structure;
pub mod value;

pub use client::GenericClient;
pub use codec::PgCodec;
pub use delete::DeleteBuilder;
pub use dialect::{AnsiDialect, Dialect, PgDialect};
pub use error::{DslError, DslResult};
pub use expr::{AmongRow, SortOrder, SqlExpr, all};
pub use fragment::Fragment;
pub use param::{Param, ParamCounter};
pub use path::{Path, PathSegment};
pub use render::{AliasSeed, RenderCtx};
pub use row::RowParser;
pub use select::{
    Compiled, Instantiated, Join, LeftJoin, Projection, Relation, SelectBuilder, SelectParams,
    TaggedColumn,
};
pub use structure::{Column, Field, Structure};
pub use value::DbValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
