//! Edge types for the job dependency graph.
//!
//! Edges are directed dependency relations between jobs: source and
//! target node IDs plus a dependency kind controlling rendering style and
//! hierarchy inference.

use std::fmt;

/// Kind of a dependency edge.
///
/// The kind drives both rendering (parent edges draw solid, cross and
/// condition edges draw dashed) and hierarchy inference: only `Parent`
/// edges count when deciding which nodes are roots and when building the
/// tree for the radial layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Hierarchy edge: source is the parent job of target.
    Parent,
    /// Non-tree dependency between unrelated jobs.
    Cross,
    /// Conditional trigger.
    Condition,
}

impl DependencyKind {
    /// Parse a kind string. Unknown kinds become `Cross` with a warning
    /// so they never distort root inference.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "parent" => Self::Parent,
            "cross" => Self::Cross,
            "condition" => Self::Condition,
            other => {
                log::warn!("unknown dependency kind {other:?}, treating as cross");
                Self::Cross
            }
        }
    }

    /// Whether this edge participates in hierarchy-root inference.
    #[inline]
    pub fn is_hierarchy(self) -> bool {
        matches!(self, Self::Parent)
    }

    /// Rendering hint: dashed (`Cross`, `Condition`) vs solid (`Parent`).
    #[inline]
    pub fn is_dashed(self) -> bool {
        !matches!(self, Self::Parent)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Cross => "cross",
            Self::Condition => "condition",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency edge as held by the graph model, with both endpoints
/// already resolved to node slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Source node (the dependency / parent side).
    pub source: super::NodeId,
    /// Target node (the dependent / child side).
    pub target: super::NodeId,
    /// Edge kind.
    pub kind: DependencyKind,
    /// True for edges synthesized from the virtual root. Synthetic edges
    /// shape the hierarchy but are excluded from link forces so they never
    /// double-count against real dependencies.
    pub synthetic: bool,
}
