//! Scalar codec collaborators.
//!
//! A [`PgCodec`] describes how one column's value moves between its typed
//! Rust form, the dynamic [`DbValue`] slot in a decoded row vector, and a
//! raw `tokio_postgres::Row` column. The query compiler treats codecs as
//! opaque functions and never inspects their internals.

use std::sync::Arc;

use tokio_postgres::Row;

use crate::error::{DslError, DslResult};
use crate::value::DbValue;

type ReadFn<T> = Arc<dyn Fn(&DbValue) -> DslResult<T> + Send + Sync>;
type WriteFn<T> = Arc<dyn Fn(&T) -> DbValue + Send + Sync>;

/// Extracts one raw column value out of a result row at a 0-based index.
pub(crate) type FetchFn = Arc<dyn Fn(&Row, usize) -> DslResult<DbValue> + Send + Sync>;

/// Encode/decode pair for one scalar column type.
pub struct PgCodec<T> {
    read: ReadFn<T>,
    write: WriteFn<T>,
    fetch: FetchFn,
}

impl<T> Clone for PgCodec<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            write: self.write.clone(),
            fetch: self.fetch.clone(),
        }
    }
}

impl<T> PgCodec<T> {
    pub fn new(
        read: impl Fn(&DbValue) -> DslResult<T> + Send + Sync + 'static,
        write: impl Fn(&T) -> DbValue + Send + Sync + 'static,
        fetch: impl Fn(&Row, usize) -> DslResult<DbValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            read: Arc::new(read),
            write: Arc::new(write),
            fetch: Arc::new(fetch),
        }
    }

    /// Decode one raw value into the typed form.
    pub fn read(&self, value: &DbValue) -> DslResult<T> {
        (self.read)(value)
    }

    /// Encode a typed value into its raw form.
    pub fn write(&self, value: &T) -> DbValue {
        (self.write)(value)
    }

    pub(crate) fn fetch_fn(&self) -> FetchFn {
        self.fetch.clone()
    }
}

impl<T: 'static> PgCodec<T> {
    /// Adapter for nullable columns: `NULL` decodes to `None`.
    pub fn opt(&self) -> PgCodec<Option<T>> {
        let read = self.read.clone();
        let write = self.write.clone();
        PgCodec {
            read: Arc::new(move |value| {
                if value.is_null() {
                    Ok(None)
                } else {
                    (read)(value).map(Some)
                }
            }),
            write: Arc::new(move |value| match value {
                Some(inner) => (write)(inner),
                None => DbValue::Null,
            }),
            fetch: self.fetch.clone(),
        }
    }
}

macro_rules! scalar_codec {
    ($(#[$meta:meta])* $fname:ident, $ty:ty, $variant:ident, $sqlname:literal) => {
        $(#[$meta])*
        pub fn $fname() -> PgCodec<$ty> {
            PgCodec::new(
                |value| match value {
                    DbValue::$variant(inner) => Ok(inner.clone()),
                    DbValue::Null => Err(DslError::decode($sqlname, "unexpected NULL")),
                    other => Err(DslError::decode(
                        $sqlname,
                        format!("expected {}, got {}", $sqlname, other.kind()),
                    )),
                },
                |value: &$ty| DbValue::$variant(value.clone()),
                |row, index| {
                    let fetched: Option<$ty> = row
                        .try_get(index)
                        .map_err(|e| DslError::decode(format!("#{index}"), e.to_string()))?;
                    Ok(match fetched {
                        Some(inner) => DbValue::$variant(inner),
                        None => DbValue::Null,
                    })
                },
            )
        }
    };
}

scalar_codec!(
    /// Codec for `boolean` columns.
    boolean, bool, Bool, "boolean"
);
scalar_codec!(
    /// Codec for `smallint` columns.
    int2, i16, Int2, "smallint"
);
scalar_codec!(
    /// Codec for `integer` columns.
    int4, i32, Int4, "integer"
);
scalar_codec!(
    /// Codec for `bigint` columns.
    int8, i64, Int8, "bigint"
);
scalar_codec!(
    /// Codec for `real` columns.
    float4, f32, Float4, "real"
);
scalar_codec!(
    /// Codec for `double precision` columns.
    float8, f64, Float8, "double precision"
);
scalar_codec!(
    /// Codec for `text` / `varchar` columns.
    text, String, Text, "text"
);
scalar_codec!(
    /// Codec for `bytea` columns.
    bytea, Vec<u8>, Bytes, "bytea"
);
scalar_codec!(
    /// Codec for `uuid` columns.
    uuid, uuid::Uuid, Uuid, "uuid"
);
scalar_codec!(
    /// Codec for `date` columns.
    date, chrono::NaiveDate, Date, "date"
);
scalar_codec!(
    /// Codec for `timestamp` columns.
    timestamp, chrono::NaiveDateTime, Timestamp, "timestamp"
);
scalar_codec!(
    /// Codec for `timestamptz` columns.
    timestamptz, chrono::DateTime<chrono::Utc>, TimestampTz, "timestamptz"
);
scalar_codec!(
    /// Codec for `json` / `jsonb` columns.
    json, serde_json::Value, Json, "jsonb"
);
