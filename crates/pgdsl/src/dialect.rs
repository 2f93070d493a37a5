//! Database dialect rendering strategies.
//!
//! The query algebra is database-agnostic; everything engine-specific —
//! identifier quoting, column references, casts, and how multi-column
//! membership tests are expressed — goes through a [`Dialect`].

use std::fmt;

use crate::fragment::Fragment;
use crate::param::{Param, ParamCounter};

pub trait Dialect: Send + Sync + fmt::Debug {
    /// Quote a single identifier.
    fn quote_ident(&self, name: &str) -> String;

    /// Reference a column through a table or CTE alias.
    fn column_ref(&self, alias: &str, quoted_column: &str) -> String;

    /// Wrap a rendered value with a read-time type cast.
    fn type_cast(&self, value: Fragment, type_name: &str) -> Fragment;

    fn limit_clause(&self, n: u64) -> String {
        format!("limit {n}")
    }

    fn offset_clause(&self, n: u64) -> String {
        format!("offset {n}")
    }

    /// Whether the engine supports native row-value membership,
    /// `(a, b) in ((1, 2), ...)`.
    fn supports_tuple_in(&self) -> bool {
        true
    }

    /// Quote a possibly schema-qualified table name, quoting only the
    /// parts that need it.
    fn quote_table(&self, table: &str) -> String {
        table
            .split('.')
            .map(|part| {
                if needs_quoting(part) {
                    self.quote_ident(part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Render tuple membership against literal rows.
    ///
    /// Placeholders are minted from `counter` in emission order. Comparison
    /// is plain equality: NULL-aware row comparison is not modeled.
    fn render_tuple_in(
        &self,
        lhs: &[Fragment],
        rows: &[Vec<Param>],
        counter: &mut ParamCounter,
    ) -> Fragment {
        if rows.is_empty() {
            return Fragment::lit("1=0");
        }
        if !self.supports_tuple_in() {
            return self.render_tuple_in_exists(lhs, rows, counter);
        }
        let lhs_frag = Fragment::lit("(")
            .append(Fragment::comma(lhs.iter().cloned()))
            .append(Fragment::lit(")"));
        let row_frags = rows.iter().map(|row| {
            let values = row
                .iter()
                .map(|param| Fragment::placeholder(counter.next_index(), param.clone()))
                .collect::<Vec<_>>();
            Fragment::lit("(")
                .append(Fragment::comma(values))
                .append(Fragment::lit(")"))
        });
        lhs_frag
            .append(Fragment::lit(" in ("))
            .append(Fragment::comma(row_frags))
            .append(Fragment::lit(")"))
    }

    /// `exists (select 1 from (values ...) as v(c1, ...) where ...)`
    /// fallback for engines without native row-value membership.
    fn render_tuple_in_exists(
        &self,
        lhs: &[Fragment],
        rows: &[Vec<Param>],
        counter: &mut ParamCounter,
    ) -> Fragment {
        let width = lhs.len();
        let value_rows = rows.iter().map(|row| {
            let values = row
                .iter()
                .map(|param| Fragment::placeholder(counter.next_index(), param.clone()))
                .collect::<Vec<_>>();
            Fragment::lit("(")
                .append(Fragment::comma(values))
                .append(Fragment::lit(")"))
        });
        let values_clause = Fragment::lit("values ").append(Fragment::comma(value_rows));
        let col_aliases = (1..=width)
            .map(|i| format!("c{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let conditions = lhs.iter().enumerate().map(|(i, col)| {
            col.clone().append(Fragment::lit(format!(" = v.c{}", i + 1)))
        });
        Fragment::lit("exists (select 1 from (")
            .append(values_clause)
            .append(Fragment::lit(format!(") as v({col_aliases}) where ")))
            .append(Fragment::join(conditions, " and "))
            .append(Fragment::lit(")"))
    }

    /// Render tuple membership against a subquery.
    fn render_tuple_in_subquery(&self, lhs: &[Fragment], subquery: Fragment) -> Fragment {
        let width = lhs.len();
        if self.supports_tuple_in() {
            return Fragment::lit("(")
                .append(Fragment::comma(lhs.iter().cloned()))
                .append(Fragment::lit(") in ("))
                .append(subquery)
                .append(Fragment::lit(")"));
        }
        let col_aliases = (1..=width)
            .map(|i| format!("c{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let conditions = lhs.iter().enumerate().map(|(i, col)| {
            col.clone().append(Fragment::lit(format!(" = sq.c{}", i + 1)))
        });
        Fragment::lit("exists (select 1 from (")
            .append(subquery)
            .append(Fragment::lit(format!(") as sq({col_aliases}) where ")))
            .append(Fragment::join(conditions, " and "))
            .append(Fragment::lit(")"))
    }
}

/// Does an identifier part contain anything beyond alphanumerics and
/// underscores?
fn needs_quoting(part: &str) -> bool {
    part.chars().any(|c| !c.is_alphanumeric() && c != '_')
}

/// PostgreSQL: double-quoted identifiers, `(alias)."col"` references,
/// `::type` casts, native row-value membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDialect;

impl Dialect for PgDialect {
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn column_ref(&self, alias: &str, quoted_column: &str) -> String {
        format!("({alias}).{quoted_column}")
    }

    fn type_cast(&self, value: Fragment, type_name: &str) -> Fragment {
        if type_name.is_empty() {
            return value;
        }
        value.append(Fragment::lit(format!("::{type_name}")))
    }
}

/// Conservative strategy for engines without PostgreSQL's row-value
/// membership or `::` casts: `alias."col"` references, `cast(... as ...)`,
/// and the EXISTS/VALUES emulation for tuple membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn column_ref(&self, alias: &str, quoted_column: &str) -> String {
        format!("{alias}.{quoted_column}")
    }

    fn type_cast(&self, value: Fragment, type_name: &str) -> Fragment {
        if type_name.is_empty() {
            return value;
        }
        Fragment::lit("cast(")
            .append(value)
            .append(Fragment::lit(format!(" as {type_name})")))
    }

    fn supports_tuple_in(&self) -> bool {
        false
    }
}
