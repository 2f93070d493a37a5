//! Alias resolution.
//!
//! Computes a deterministic mapping from each node's [`Path`] to a short
//! alias for one top-level query. Grouping by sanitized base name keeps the
//! generated SQL human-diffable; sorting group members by path shape makes
//! the mapping a pure function of tree shape, independent of assembly
//! order, which is what keeps self-join aliases stable.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{DslError, DslResult};
use crate::path::Path;

/// A `(path, base name)` pair recorded while walking a builder tree.
#[derive(Debug, Clone)]
pub struct AliasSeed {
    pub path: Path,
    pub base: String,
}

impl AliasSeed {
    pub fn relation(path: Path, table: &str) -> Self {
        Self {
            path,
            base: sanitize(table),
        }
    }

    pub fn join(path: Path) -> Self {
        Self {
            path,
            base: "join_cte".to_string(),
        }
    }

    pub fn left_join(path: Path) -> Self {
        Self {
            path,
            base: "left_join_cte".to_string(),
        }
    }
}

/// Immutable path-to-alias mapping for one top-level render.
#[derive(Debug, Clone)]
pub struct RenderCtx {
    aliases: HashMap<Path, String>,
    dialect: Arc<dyn Dialect>,
    qualified: bool,
}

impl RenderCtx {
    /// Build the alias map from the seeds recorded over a full tree walk.
    ///
    /// Seeds are grouped by base name in first-appearance order; within a
    /// group, paths are sorted and assigned `base + index` (0-based).
    pub fn from_seeds(seeds: Vec<AliasSeed>, dialect: Arc<dyn Dialect>) -> Self {
        let mut groups: Vec<(String, Vec<Path>)> = Vec::new();
        for seed in seeds {
            match groups.iter().position(|(base, _)| *base == seed.base) {
                Some(index) => groups[index].1.push(seed.path),
                None => groups.push((seed.base, vec![seed.path])),
            }
        }

        let mut aliases = HashMap::new();
        for (base, mut paths) in groups {
            paths.sort();
            for (index, path) in paths.into_iter().enumerate() {
                aliases.insert(path, format!("{base}{index}"));
            }
        }

        Self {
            aliases,
            dialect,
            qualified: true,
        }
    }

    /// Context for single-table statements (DELETE): no aliases, field
    /// references render as bare quoted columns.
    pub fn single_table(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            aliases: HashMap::new(),
            dialect,
            qualified: false,
        }
    }

    pub fn alias(&self, path: &Path) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    /// Alias lookup that must succeed. A miss means a field is used outside
    /// the scope of any builder that declared it; that is a programming
    /// error and never degrades into silently wrong SQL.
    pub fn require_alias(&self, path: &Path) -> DslResult<&str> {
        self.alias(path)
            .ok_or_else(|| DslError::unresolvable_alias(path))
    }

    /// Whether field references are qualified through aliases.
    pub fn is_qualified(&self) -> bool {
        self.qualified
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }
}

/// Strip a table name down to alphanumerics for use as an alias base.
fn sanitize(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PgDialect;
    use crate::path::{Path, PathSegment};

    fn dialect() -> Arc<dyn Dialect> {
        Arc::new(PgDialect)
    }

    #[test]
    fn sanitize_strips_punctuation() {
        assert_eq!(sanitize("public.users"), "publicusers");
        assert_eq!(sanitize("order_items"), "orderitems");
    }

    #[test]
    fn groups_assign_indexed_aliases() {
        let left = Path::named("orders").prefixed(PathSegment::LeftOperand);
        let right = Path::named("customers").prefixed(PathSegment::RightOperand);
        let ctx = RenderCtx::from_seeds(
            vec![
                AliasSeed::relation(left.clone(), "orders"),
                AliasSeed::relation(right.clone(), "customers"),
            ],
            dialect(),
        );
        assert_eq!(ctx.alias(&left), Some("orders0"));
        assert_eq!(ctx.alias(&right), Some("customers0"));
    }

    #[test]
    fn self_join_paths_get_distinct_aliases() {
        let left = Path::named("orders").prefixed(PathSegment::LeftOperand);
        let right = Path::named("orders").prefixed(PathSegment::RightOperand);
        // Insertion order reversed on purpose: sorting by path shape wins.
        let ctx = RenderCtx::from_seeds(
            vec![
                AliasSeed::relation(right.clone(), "orders"),
                AliasSeed::relation(left.clone(), "orders"),
            ],
            dialect(),
        );
        assert_eq!(ctx.alias(&left), Some("orders0"));
        assert_eq!(ctx.alias(&right), Some("orders1"));
    }

    #[test]
    fn alias_maps_are_deterministic() {
        let seeds = || {
            vec![
                AliasSeed::join(Path::named("a").concat(&Path::named("b"))),
                AliasSeed::relation(Path::named("a"), "a"),
                AliasSeed::relation(Path::named("b"), "b"),
            ]
        };
        let first = RenderCtx::from_seeds(seeds(), dialect());
        let second = RenderCtx::from_seeds(seeds(), dialect());
        for path in [
            Path::named("a"),
            Path::named("b"),
            Path::named("a").concat(&Path::named("b")),
        ] {
            assert_eq!(first.alias(&path), second.alias(&path));
        }
    }

    #[test]
    fn missing_path_is_a_loud_error() {
        let ctx = RenderCtx::from_seeds(Vec::new(), dialect());
        let err = ctx.require_alias(&Path::named("ghost")).unwrap_err();
        assert!(matches!(err, DslError::UnresolvableAlias { .. }));
    }

    #[test]
    fn single_table_ctx_is_unqualified() {
        let ctx = RenderCtx::single_table(dialect());
        assert!(!ctx.is_qualified());
        assert_eq!(ctx.alias(&Path::named("t")), None);
    }
}
