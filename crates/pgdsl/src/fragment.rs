//! Rendered SQL text plus its bound parameters.
//!
//! A [`Fragment`] pairs emitted text with the values bound to the
//! placeholders inside it. A placeholder is always minted together with its
//! value (see [`Fragment::placeholder`]), so the number of placeholders in
//! the text equals the number of bound values by construction. Every
//! parameter remembers its placeholder index, and binding follows `$n`
//! numbering even when later assembly places fragments out of mint order.

use crate::param::Param;
use tokio_postgres::types::ToSql;

#[derive(Clone, Debug, Default)]
pub struct Fragment {
    sql: String,
    params: Vec<(usize, Param)>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Literal text with no parameters.
    pub fn lit(text: impl Into<String>) -> Self {
        Self {
            sql: text.into(),
            params: Vec::new(),
        }
    }

    /// Mint placeholder `$index` bound to `param`.
    pub fn placeholder(index: usize, param: Param) -> Self {
        Self {
            sql: format!("${index}"),
            params: vec![(index, param)],
        }
    }

    /// Concatenate, preserving both text and parameters.
    pub fn append(mut self, other: Fragment) -> Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
        self
    }

    /// Join fragments with a separator.
    pub fn join(fragments: impl IntoIterator<Item = Fragment>, separator: &str) -> Self {
        let mut out = Fragment::empty();
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                out.sql.push_str(separator);
            }
            out = out.append(fragment);
        }
        out
    }

    /// Join fragments with `", "`.
    pub fn comma(fragments: impl IntoIterator<Item = Fragment>) -> Self {
        Self::join(fragments, ", ")
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Parameters ordered by placeholder index, ready for positional
    /// binding (`params_ref()[0]` binds `$1`).
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        let mut ordered: Vec<&(usize, Param)> = self.params.iter().collect();
        ordered.sort_by_key(|entry| entry.0);
        ordered.into_iter().map(|entry| entry.1.as_sql()).collect()
    }
}
