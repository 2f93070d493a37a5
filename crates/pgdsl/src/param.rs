//! Parameter storage and placeholder numbering.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound parameter.
///
/// Builders, expressions and fragments are all cloneable; wrapping values
/// in `Arc` lets them share parameters without copying.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Param").field(&"<dyn ToSql>").finish()
    }
}

/// Placeholder counter for one top-level compile pass.
///
/// The only mutable state threaded through a compile. One counter per
/// top-level render; never reuse a counter across concurrent compiles.
#[derive(Debug, Default)]
pub struct ParamCounter {
    issued: usize,
}

impl ParamCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next 1-based placeholder index.
    pub fn next_index(&mut self) -> usize {
        self.issued += 1;
        self.issued
    }

    /// Number of placeholders issued so far.
    pub fn count(&self) -> usize {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_one_based_and_sequential() {
        let mut counter = ParamCounter::new();
        assert_eq!(counter.next_index(), 1);
        assert_eq!(counter.next_index(), 2);
        assert_eq!(counter.count(), 2);
    }
}
