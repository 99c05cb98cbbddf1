//! Deterministic radial tree layout.
//!
//! Places a rooted hierarchy at polar coordinates in a single pass (no
//! iteration): leaves are spaced around the full circle in DFS order with
//! separation-weighted gaps, internal nodes sit at the leaf-count-weighted
//! mean angle of their descendants, and radius grows with depth up to a
//! cap derived from the canvas size.
//!
//! Separation follows the classic tree-layout rule: siblings sharing a
//! parent are 1 unit apart, leaves from unrelated subtrees 2 units, both
//! divided by the leaf's depth so deep trees still compress reasonably.
//! The gap between the last and first leaf closes the circle, which is
//! what makes n same-depth leaves land exactly 2π/n apart.

use std::collections::HashSet;

use serde::Serialize;

use crate::graph::{GraphModel, NodeId};

/// Configuration for the radial tree layout.
#[derive(Debug, Clone)]
pub struct RadialTreeConfig {
    /// Canvas width in pixels (default: 960).
    pub width: f32,
    /// Canvas height in pixels (default: 800).
    pub height: f32,
    /// Margin kept free around the outermost ring (default: 100).
    pub margin: f32,
}

impl Default for RadialTreeConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 800.0,
            margin: 100.0,
        }
    }
}

impl RadialTreeConfig {
    /// Radius of the outermost ring.
    pub fn max_radius(&self) -> f32 {
        (self.width.min(self.height) / 2.0 - self.margin).max(0.0)
    }
}

/// Which side of a node its label anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    /// Anchor at the label start, text running outward (right half).
    Start,
    /// Anchor at the label end, flipped 180° to stay upright (left half).
    End,
}

/// Label placement for an angle: anchor side and whether the label is
/// rotated half a turn. Flips at angle π so text on the left half of the
/// circle reads upright.
pub fn label_side(angle: f32) -> (LabelSide, bool) {
    if angle < std::f32::consts::PI {
        (LabelSide::Start, false)
    } else {
        (LabelSide::End, true)
    }
}

/// Polar and Cartesian placement of one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadialPlacement {
    /// Angle in radians, in [0, 2π).
    pub angle: f32,
    /// Distance from the canvas center.
    pub radius: f32,
    /// Cartesian x (`radius · cos(angle)`).
    pub x: f32,
    /// Cartesian y (`radius · sin(angle)`).
    pub y: f32,
}

/// Result of a radial layout pass.
pub struct RadialTreeResult {
    /// Placement per model slot; `None` for nodes outside the hierarchy.
    pub placements: Vec<Option<RadialPlacement>>,
    /// Number of nodes placed.
    pub node_count: usize,
}

impl RadialTreeResult {
    /// Placement of a node, if it was part of the hierarchy.
    pub fn placement(&self, id: NodeId) -> Option<RadialPlacement> {
        self.placements.get(id.slot()).copied().flatten()
    }
}

/// Node data collected during the hierarchy walk.
struct TreeNode {
    id: NodeId,
    depth: u32,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Sum of descendant-leaf angles and leaf count, for the weighted
    /// mean computed bottom-up.
    angle_sum: f64,
    leaf_count: u32,
}

/// The radial tree layout engine.
pub struct RadialTreeLayout {
    config: RadialTreeConfig,
}

impl RadialTreeLayout {
    /// Create a layout with the given configuration.
    pub fn new(config: RadialTreeConfig) -> Self {
        Self { config }
    }

    /// Create a layout with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RadialTreeConfig::default())
    }

    /// Compute placements for the model's hierarchy.
    ///
    /// Empty model → empty result; a lone root sits at the origin. Nodes
    /// unreachable from the root over parent edges (for example members of
    /// a parent-edge cycle hanging off a real root) are left unplaced with
    /// a warning.
    pub fn compute(&self, model: &GraphModel) -> RadialTreeResult {
        let mut result = RadialTreeResult {
            placements: vec![None; model.node_count()],
            node_count: 0,
        };
        let Some(root) = model.root() else {
            return result;
        };

        // DFS from the root, cycle-safe, recording depth and parent links.
        let mut tree: Vec<TreeNode> = Vec::with_capacity(model.node_count());
        let mut visited: HashSet<NodeId> = HashSet::new();
        Self::build_tree(model, root, None, 0, &mut tree, &mut visited);

        if tree.len() < model.node_count() {
            log::warn!(
                "radial layout: {} of {} nodes unreachable from the root",
                model.node_count() - tree.len(),
                model.node_count()
            );
        }

        // Lone root: place at the origin.
        if tree.len() == 1 {
            result.placements[root.slot()] = Some(RadialPlacement {
                angle: 0.0,
                radius: 0.0,
                x: 0.0,
                y: 0.0,
            });
            result.node_count = 1;
            return result;
        }

        // Leaves in DFS order with separation-weighted cumulative
        // positions, closing the circle between last and first.
        let leaves: Vec<usize> = (0..tree.len())
            .filter(|&index| tree[index].children.is_empty())
            .collect();

        let mut positions: Vec<f64> = Vec::with_capacity(leaves.len());
        let mut cursor = 0.0_f64;
        positions.push(0.0);
        for pair in leaves.windows(2) {
            cursor += Self::separation(&tree, pair[0], pair[1]);
            positions.push(cursor);
        }
        let total = cursor
            + if leaves.len() > 1 {
                Self::separation(&tree, leaves[leaves.len() - 1], leaves[0])
            } else {
                1.0
            };

        let tau = std::f64::consts::TAU;
        for (&leaf, &position) in leaves.iter().zip(positions.iter()) {
            let angle = position / total * tau;
            tree[leaf].angle_sum = angle;
            tree[leaf].leaf_count = 1;
        }

        // Bottom-up: internal nodes at the leaf-count-weighted mean angle
        // of their descendants. DFS order guarantees children come after
        // their parent, so a reverse scan accumulates correctly.
        for index in (1..tree.len()).rev() {
            let (angle_sum, leaf_count) = (tree[index].angle_sum, tree[index].leaf_count);
            if let Some(parent) = tree[index].parent {
                tree[parent].angle_sum += angle_sum;
                tree[parent].leaf_count += leaf_count;
            }
        }

        let max_depth = tree.iter().map(|node| node.depth).max().unwrap_or(0);
        let ring_step = if max_depth > 0 {
            self.config.max_radius() / max_depth as f32
        } else {
            0.0
        };

        for node in &tree {
            let angle = (node.angle_sum / node.leaf_count.max(1) as f64) as f32;
            let radius = node.depth as f32 * ring_step;
            result.placements[node.id.slot()] = Some(RadialPlacement {
                angle,
                radius,
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            });
            result.node_count += 1;
        }
        result
    }

    fn build_tree(
        model: &GraphModel,
        id: NodeId,
        parent: Option<usize>,
        depth: u32,
        tree: &mut Vec<TreeNode>,
        visited: &mut HashSet<NodeId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let index = tree.len();
        tree.push(TreeNode {
            id,
            depth,
            parent,
            children: Vec::new(),
            angle_sum: 0.0,
            leaf_count: 0,
        });

        for child in model.children_of(id) {
            let before = tree.len();
            Self::build_tree(model, child, Some(index), depth + 1, tree, visited);
            if tree.len() > before {
                tree[index].children.push(before);
            }
        }
    }

    /// Gap between two consecutive leaves: 1 for siblings, 2 for leaves
    /// from unrelated subtrees, divided by the later leaf's depth.
    fn separation(tree: &[TreeNode], previous: usize, current: usize) -> f64 {
        let base = if tree[previous].parent == tree[current].parent {
            1.0
        } else {
            2.0
        };
        base / tree[current].depth.max(1) as f64
    }
}
