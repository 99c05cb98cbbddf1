//! Interaction layer: pointer events, selection, overlay and view state.
//!
//! The controller owns the model and simulation lifetimes; highlight
//! styling is a pure function over `{selection, graph}` recomputed per
//! render instead of patched imperatively.

mod controller;
mod highlight;

pub use controller::{
    ActiveTab, GraphEvent, InteractionController, OverlayState, ViewTransform, MAX_SCALE,
    MIN_SCALE,
};
pub use highlight::{edge_styles, node_styles, EdgeStyle, NodeEmphasis, DIMMED_OPACITY};
