//! Declarative highlight styling.
//!
//! A pure mapping from `{selection, graph}` to per-node and per-edge
//! render styles. The renderer recomputes these wholesale after every
//! selection change instead of patching individual node styles, so the
//! visible emphasis can never drift out of sync with the model.

use crate::graph::{GraphModel, NodeId};

/// Opacity applied to everything outside the selected neighborhood.
pub const DIMMED_OPACITY: f32 = 0.3;

/// Render emphasis for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEmphasis {
    /// Opacity in [0, 1].
    pub opacity: f32,
    /// True for the selected node and its neighborhood; drives the
    /// emphasis color.
    pub emphasized: bool,
}

/// Render style for one edge, in [`GraphModel::edges`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    /// Opacity in [0, 1].
    pub opacity: f32,
    /// Dashed stroke for cross/condition edges, solid for parent edges.
    pub dashed: bool,
}

/// Per-node emphasis for the current selection, in slot order.
///
/// No selection means everything renders at full opacity without
/// emphasis. With a selection, the selected node and its neighbors keep
/// full opacity and the emphasis color; everything else dims.
pub fn node_styles(model: &GraphModel, selected: Option<NodeId>) -> Vec<NodeEmphasis> {
    match selected {
        None => vec![
            NodeEmphasis {
                opacity: 1.0,
                emphasized: false,
            };
            model.node_count()
        ],
        Some(selected) => {
            let neighborhood = model.neighbors_of(selected);
            model
                .node_ids()
                .map(|id| {
                    let lit = id == selected || neighborhood.contains(&id);
                    NodeEmphasis {
                        opacity: if lit { 1.0 } else { DIMMED_OPACITY },
                        emphasized: lit,
                    }
                })
                .collect()
        }
    }
}

/// Per-edge styles for the current selection, in [`GraphModel::edges`]
/// order. Edges incident to the selected node stay at full opacity.
pub fn edge_styles(model: &GraphModel, selected: Option<NodeId>) -> Vec<EdgeStyle> {
    model
        .edges()
        .into_iter()
        .map(|edge| {
            let opacity = match selected {
                None => 1.0,
                Some(selected) if edge.source == selected || edge.target == selected => 1.0,
                Some(_) => DIMMED_OPACITY,
            };
            EdgeStyle {
                opacity,
                dashed: edge.kind.is_dashed(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::JobRecord;

    fn model() -> GraphModel {
        GraphModel::build(&[
            JobRecord::new("a", "A"),
            JobRecord::new("b", "B").with_parent("a"),
            JobRecord::new("c", "C").with_parent("b"),
            JobRecord::new("d", "D").with_cross("a"),
        ])
    }

    #[test]
    fn test_no_selection_everything_full_opacity() {
        let model = model();
        for style in node_styles(&model, None) {
            assert_eq!(style.opacity, 1.0);
            assert!(!style.emphasized);
        }
        for style in edge_styles(&model, None) {
            assert_eq!(style.opacity, 1.0);
        }
    }

    #[test]
    fn test_selection_lights_neighborhood_dims_rest() {
        let model = model();
        let b = model.node_by_job_id("b").unwrap();
        let styles = node_styles(&model, Some(b));

        let style_of = |job: &str| styles[model.node_by_job_id(job).unwrap().slot()];
        // b and its neighbors a, c are lit.
        assert!(style_of("b").emphasized);
        assert_eq!(style_of("a").opacity, 1.0);
        assert_eq!(style_of("c").opacity, 1.0);
        // d is outside the neighborhood.
        assert_eq!(style_of("d").opacity, DIMMED_OPACITY);
        assert!(!style_of("d").emphasized);
    }

    #[test]
    fn test_edges_incident_to_selection_stay_lit() {
        let model = model();
        let a = model.node_by_job_id("a").unwrap();
        let edges = model.edges();
        let styles = edge_styles(&model, Some(a));

        for (edge, style) in edges.iter().zip(styles.iter()) {
            let incident = edge.source == a || edge.target == a;
            assert_eq!(style.opacity == 1.0, incident);
        }
    }

    #[test]
    fn test_dashes_follow_edge_kind() {
        let model = model();
        let edges = model.edges();
        let styles = edge_styles(&model, None);
        for (edge, style) in edges.iter().zip(styles.iter()) {
            assert_eq!(style.dashed, edge.kind.is_dashed());
        }
    }
}
