//! Dynamic scalar values: the elements of a decoded flat row vector.

use bytes::BytesMut;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// One raw column value as handed back by the database.
///
/// The row-parser layer works on flat `&[DbValue]` vectors; scalar codecs
/// translate between these and typed values. Binding a `DbValue` as a
/// statement parameter delegates to the wrapped value's own encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Date(chrono::NaiveDate),
    Timestamp(chrono::NaiveDateTime),
    TimestampTz(chrono::DateTime<chrono::Utc>),
    Json(serde_json::Value),
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    /// Short variant name, for decode error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DbValue::Null => "null",
            DbValue::Bool(_) => "boolean",
            DbValue::Int2(_) => "smallint",
            DbValue::Int4(_) => "integer",
            DbValue::Int8(_) => "bigint",
            DbValue::Float4(_) => "real",
            DbValue::Float8(_) => "double precision",
            DbValue::Text(_) => "text",
            DbValue::Bytes(_) => "bytea",
            DbValue::Uuid(_) => "uuid",
            DbValue::Date(_) => "date",
            DbValue::Timestamp(_) => "timestamp",
            DbValue::TimestampTz(_) => "timestamptz",
            DbValue::Json(_) => "jsonb",
        }
    }
}

impl ToSql for DbValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            DbValue::Null => Ok(IsNull::Yes),
            DbValue::Bool(v) => v.to_sql(ty, out),
            DbValue::Int2(v) => v.to_sql(ty, out),
            DbValue::Int4(v) => v.to_sql(ty, out),
            DbValue::Int8(v) => v.to_sql(ty, out),
            DbValue::Float4(v) => v.to_sql(ty, out),
            DbValue::Float8(v) => v.to_sql(ty, out),
            DbValue::Text(v) => v.to_sql(ty, out),
            DbValue::Bytes(v) => v.to_sql(ty, out),
            DbValue::Uuid(v) => v.to_sql(ty, out),
            DbValue::Date(v) => v.to_sql(ty, out),
            DbValue::Timestamp(v) => v.to_sql(ty, out),
            DbValue::TimestampTz(v) => v.to_sql(ty, out),
            DbValue::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The wrapped value decides at bind time; type errors surface from
        // the server on mismatch.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_detection() {
        assert!(DbValue::Null.is_null());
        assert!(!DbValue::Int8(1).is_null());
    }

    #[test]
    fn kind_names() {
        assert_eq!(DbValue::Int8(1).kind(), "bigint");
        assert_eq!(DbValue::Text("x".into()).kind(), "text");
    }
}
