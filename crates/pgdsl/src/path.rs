//! Structural addresses for nodes in a join tree.
//!
//! A [`Path`] identifies where a builder node sits inside a join tree and is
//! the key the alias resolver works with. Join combinators relabel their
//! operands by prefixing [`PathSegment::LeftOperand`] /
//! [`PathSegment::RightOperand`]; a leaf relation starts at
//! `[Named(table)]`. Because a path is a pure function of tree shape, the
//! alias a node receives does not depend on how the tree was assembled.

use std::fmt;

/// One step of a [`Path`].
///
/// Variant order matters: the derived `Ord` yields exactly the ordering
/// alias assignment sorts by (`LeftOperand < Named(_) < RightOperand`, with
/// `Named` ties broken by the table name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Left operand of a join node.
    LeftOperand,
    /// A named leaf relation.
    Named(String),
    /// Right operand of a join node.
    RightOperand,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::LeftOperand => f.write_str("left"),
            PathSegment::Named(name) => f.write_str(name),
            PathSegment::RightOperand => f.write_str("right"),
        }
    }
}

/// Ordered sequence of segments addressing one node.
///
/// Paths compare element-wise; a shorter path sorts before any longer path
/// that extends it. Structural equality and hashing let a `Path` key alias
/// maps directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The path of a leaf relation: `[Named(table)]`.
    pub fn named(table: &str) -> Self {
        Self {
            segments: vec![PathSegment::Named(table.to_string())],
        }
    }

    /// A copy with `segment` prefixed, as done when a node becomes an
    /// operand of a join.
    pub fn prefixed(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment);
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// The path of a join node: its children's paths concatenated.
    pub fn concat(&self, other: &Path) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + other.segments.len());
        segments.extend(self.segments.iter().cloned());
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
