//! Graph data structures and operations.
//!
//! This module provides the normalized job dependency graph: raw record
//! ingestion, string-id interning to stable slots, petgraph topology with
//! SoA position buffers, hierarchy-root inference and neighbor queries.

mod edge;
mod model;
mod node;
mod record;

pub use edge::{DependencyEdge, DependencyKind};
pub use model::{BuildReport, GraphModel, TimelineInterval, VIRTUAL_ROOT_ID};
pub use node::{JobKind, JobNode, JobStatus, NodeId, NodeState};
pub use record::{IngestError, JobRecord, NormalizedDependency, RawDependency};
