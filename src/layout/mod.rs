//! Layout engines for the dependency graph.
//!
//! Two complementary engines produce positions for the same model: the
//! iterative force simulation for the free-form canvas, and the
//! deterministic radial tree layout for the hierarchy view. Both read the
//! graph model and own their outputs; positions only reach the model via
//! an explicit hand-off.

pub mod force;
pub mod radial;

pub use force::{ForceConfig, ForceSimulation, RadialForce};
pub use radial::{LabelSide, RadialPlacement, RadialTreeConfig, RadialTreeLayout, RadialTreeResult, label_side};
