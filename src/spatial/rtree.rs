//! R-tree based spatial index using the rstar crate.
//!
//! Backs pointer hit testing for the interaction layer: click and
//! right-click coordinates (already transformed to world space) resolve
//! to the nearest job node within the hit radius in O(log n).
//!
//! Positions move every simulation tick, so the index is rebuilt by bulk
//! load from the model rather than maintained incrementally.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::graph::{GraphModel, NodeId};

/// A node position in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    /// The node identifier.
    pub id: NodeId,
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space.
    pub y: f32,
}

impl NodePoint {
    /// Create a new NodePoint.
    pub fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        (self.x - point[0]).abs() < f32::EPSILON && (self.y - point[1]).abs() < f32::EPSILON
    }
}

/// Spatial index over the model's node positions.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load the index from the model's current positions.
    pub fn from_model(model: &GraphModel) -> Self {
        let points: Vec<NodePoint> = model
            .node_ids()
            .filter_map(|id| {
                let (x, y) = model.position(id)?;
                Some(NodePoint::new(id, x, y))
            })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Insert a single node.
    pub fn insert(&mut self, id: NodeId, x: f32, y: f32) {
        self.tree.insert(NodePoint::new(id, x, y));
    }

    /// Find the nearest node to a point.
    pub fn nearest(&self, x: f32, y: f32) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[x, y]).map(|point| point.id)
    }

    /// Find the nearest node within a maximum distance — the hit test for
    /// pointer events. Returns `None` when nothing is close enough.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.id)
    }

    /// Replace the index contents from the model's current positions.
    pub fn rebuild(&mut self, model: &GraphModel) {
        *self = Self::from_model(model);
    }

    /// Clear all nodes from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::JobRecord;

    #[test]
    fn test_insert_and_nearest() {
        let mut index = SpatialIndex::new();
        index.insert(NodeId(0), 0.0, 0.0);
        index.insert(NodeId(1), 10.0, 10.0);
        index.insert(NodeId(2), 5.0, 5.0);

        assert_eq!(index.nearest(0.0, 0.0), Some(NodeId(0)));
        assert_eq!(index.nearest(6.0, 6.0), Some(NodeId(2)));
        assert_eq!(index.nearest(11.0, 11.0), Some(NodeId(1)));
    }

    #[test]
    fn test_nearest_within_hit_radius() {
        let mut index = SpatialIndex::new();
        index.insert(NodeId(0), 0.0, 0.0);
        index.insert(NodeId(1), 10.0, 10.0);

        assert_eq!(index.nearest_within(0.0, 0.0, 5.0), Some(NodeId(0)));
        // A click in the empty middle misses both nodes.
        assert_eq!(index.nearest_within(5.0, 5.0, 1.0), None);
        assert_eq!(index.nearest_within(5.0, 5.0, 8.0), Some(NodeId(0)));
    }

    #[test]
    fn test_from_model_covers_all_nodes() {
        let model = GraphModel::build(&[
            JobRecord::new("a", "A"),
            JobRecord::new("b", "B").with_parent("a"),
        ]);
        let index = SpatialIndex::from_model(&model);
        assert_eq!(index.len(), model.node_count());

        let a = model.node_by_job_id("a").unwrap();
        let (x, y) = model.position(a).unwrap();
        assert_eq!(index.nearest(x, y), Some(a));
    }

    #[test]
    fn test_rebuild_tracks_moved_positions() {
        let model = GraphModel::build(&[JobRecord::new("a", "A")]);
        let mut index = SpatialIndex::from_model(&model);
        assert_eq!(index.len(), 1);

        index.clear();
        assert!(index.is_empty());

        index.rebuild(&model);
        assert_eq!(index.len(), 1);
    }
}
