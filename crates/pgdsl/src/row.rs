//! Positional row decoding.
//!
//! A [`RowParser`] decodes a contiguous range of a flat row vector into a
//! typed row (and encodes back). Joins compose parsers pairwise: columns
//! concatenate, and the right-hand parser must start exactly where the
//! left-hand one ends. Because n-ary joins are left-leaning binary trees,
//! composition is associative in practice: any bracketing decodes the same
//! logical values as long as projection order is preserved.

use std::fmt;
use std::sync::Arc;

use crate::error::{DslError, DslResult};
use crate::structure::Column;
use crate::value::DbValue;

type DecodeFn<R> = Arc<dyn Fn(&[DbValue]) -> DslResult<R> + Send + Sync>;
type EncodeFn<R> = Arc<dyn Fn(&R) -> Vec<DbValue> + Send + Sync>;

/// Offset-parameterized parser factory carried by instantiated builder
/// nodes.
pub(crate) type ParserAt<R> = Arc<dyn Fn(usize) -> RowParser<R> + Send + Sync>;

/// Decode/encode pair over a flat column vector, spanning `width()` slots
/// starting at `offset()`.
pub struct RowParser<R> {
    offset: usize,
    columns: Vec<Column>,
    decode: DecodeFn<R>,
    encode: EncodeFn<R>,
}

impl<R> Clone for RowParser<R> {
    fn clone(&self) -> Self {
        Self {
            offset: self.offset,
            columns: self.columns.clone(),
            decode: self.decode.clone(),
            encode: self.encode.clone(),
        }
    }
}

impl<R> fmt::Debug for RowParser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowParser")
            .field("offset", &self.offset)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl<R> RowParser<R> {
    pub fn new(
        offset: usize,
        columns: Vec<Column>,
        decode: impl Fn(&[DbValue]) -> DslResult<R> + Send + Sync + 'static,
        encode: impl Fn(&R) -> Vec<DbValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            offset,
            columns,
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Decode from the full flat row vector (indices are absolute).
    pub fn decode(&self, values: &[DbValue]) -> DslResult<R> {
        if values.len() < self.offset + self.width() {
            return Err(DslError::decode(
                "row",
                format!(
                    "row has {} values, parser needs {}..{}",
                    values.len(),
                    self.offset,
                    self.offset + self.width()
                ),
            ));
        }
        (self.decode)(values)
    }

    /// Encode back into this parser's slice of the flat vector.
    pub fn encode(&self, row: &R) -> Vec<DbValue> {
        (self.encode)(row)
    }
}

impl<R: 'static> RowParser<R> {
    /// Pairwise composition for an inner join. `other` must start exactly
    /// where this parser's columns end.
    pub fn joined<R2: 'static>(&self, other: &RowParser<R2>) -> RowParser<(R, R2)> {
        debug_assert_eq!(other.offset, self.offset + self.width());
        let left_decode = self.decode.clone();
        let right_decode = other.decode.clone();
        let left_encode = self.encode.clone();
        let right_encode = other.encode.clone();
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        RowParser {
            offset: self.offset,
            columns,
            decode: Arc::new(move |values| {
                Ok(((left_decode)(values)?, (right_decode)(values)?))
            }),
            encode: Arc::new(move |(left, right)| {
                let mut out = (left_encode)(left);
                out.extend((right_encode)(right));
                out
            }),
        }
    }

    /// Left-join composition: an all-NULL right-hand range decodes to
    /// `None`.
    pub fn left_joined<R2: 'static>(&self, other: &RowParser<R2>) -> RowParser<(R, Option<R2>)> {
        debug_assert_eq!(other.offset, self.offset + self.width());
        let left_decode = self.decode.clone();
        let right_decode = other.decode.clone();
        let left_encode = self.encode.clone();
        let right_encode = other.encode.clone();
        let right_offset = other.offset;
        let right_width = other.width();
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        RowParser {
            offset: self.offset,
            columns,
            decode: Arc::new(move |values| {
                let left = (left_decode)(values)?;
                let range = &values[right_offset..right_offset + right_width];
                let right = if range.iter().all(DbValue::is_null) {
                    None
                } else {
                    Some((right_decode)(values)?)
                };
                Ok((left, right))
            }),
            encode: Arc::new(move |(left, right)| {
                let mut out = (left_encode)(left);
                match right {
                    Some(inner) => out.extend((right_encode)(inner)),
                    None => out.extend(vec![DbValue::Null; right_width]),
                }
                out
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    fn pair_parser(offset: usize) -> RowParser<(i64, String)> {
        RowParser::new(
            offset,
            vec![
                Column::new("id", &codec::int8()),
                Column::new("name", &codec::text()),
            ],
            move |values| {
                Ok((
                    codec::int8().read(&values[offset])?,
                    codec::text().read(&values[offset + 1])?,
                ))
            },
            |row| vec![DbValue::Int8(row.0), DbValue::Text(row.1.clone())],
        )
    }

    fn row(values: &[(i64, &str)]) -> Vec<DbValue> {
        values
            .iter()
            .flat_map(|(id, name)| {
                [DbValue::Int8(*id), DbValue::Text((*name).to_string())]
            })
            .collect()
    }

    #[test]
    fn decode_then_encode_round_trips() {
        let parser = pair_parser(0);
        let flat = row(&[(7, "alice")]);
        let decoded = parser.decode(&flat).unwrap();
        assert_eq!(decoded, (7, "alice".to_string()));
        assert_eq!(parser.encode(&decoded), flat);
    }

    #[test]
    fn joined_splits_at_left_width() {
        let joined = pair_parser(0).joined(&pair_parser(2));
        assert_eq!(joined.width(), 4);
        let flat = row(&[(1, "a"), (2, "b")]);
        let decoded = joined.decode(&flat).unwrap();
        assert_eq!(decoded, ((1, "a".to_string()), (2, "b".to_string())));
        assert_eq!(joined.encode(&decoded), flat);
    }

    #[test]
    fn width_matches_flat_vector_length() {
        let joined = pair_parser(0).joined(&pair_parser(2));
        let decoded = joined.decode(&row(&[(1, "a"), (2, "b")])).unwrap();
        assert_eq!(joined.encode(&decoded).len(), joined.width());
    }

    #[test]
    fn left_joined_decodes_null_range_as_none() {
        let parser = pair_parser(0).left_joined(&pair_parser(2));
        let mut flat = row(&[(1, "a")]);
        flat.extend([DbValue::Null, DbValue::Null]);
        let decoded = parser.decode(&flat).unwrap();
        assert_eq!(decoded, ((1, "a".to_string()), None));
        // Encoding the absent side reproduces the NULL slots.
        assert_eq!(parser.encode(&decoded), flat);
    }

    #[test]
    fn left_joined_decodes_present_rows() {
        let parser = pair_parser(0).left_joined(&pair_parser(2));
        let flat = row(&[(1, "a"), (2, "b")]);
        let decoded = parser.decode(&flat).unwrap();
        assert_eq!(decoded, ((1, "a".to_string()), Some((2, "b".to_string()))));
    }

    #[test]
    fn three_way_join_is_associative_in_value() {
        // ((A ⋈ B) ⋈ C)
        let left_leaning = pair_parser(0).joined(&pair_parser(2)).joined(&pair_parser(4));
        // (A ⋈ (B ⋈ C))
        let right_leaning = {
            let bc = pair_parser(2).joined(&pair_parser(4));
            pair_parser(0).joined(&bc)
        };
        let flat = row(&[(1, "a"), (2, "b"), (3, "c")]);
        let ((a1, b1), c1) = left_leaning.decode(&flat).unwrap();
        let (a2, (b2, c2)) = right_leaning.decode(&flat).unwrap();
        assert_eq!((a1, b1, c1), (a2, b2, c2));
    }

    #[test]
    fn truncated_row_is_an_error() {
        let parser = pair_parser(0);
        assert!(parser.decode(&[DbValue::Int8(1)]).is_err());
    }
}
