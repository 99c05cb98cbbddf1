//! Spatial indexing for O(log n) pointer hit testing.
//!
//! This module provides an R-tree based spatial index used to resolve
//! click and right-click coordinates to graph nodes.

mod rtree;

pub use rtree::SpatialIndex;
