//! InteractionController - pointer events to model operations.
//!
//! Owns the graph model, the running simulations and the view state, and
//! translates pointer gestures into state transitions:
//!
//! - click → selection + neighborhood highlight
//! - drag → gesture pin through the main simulation, with reheat
//! - right-click → isolated detail overlay over the induced neighborhood
//! - wheel/drag-pan → view transform (scale clamped, coordinates intact)
//! - data refresh → full rebuild with every stale simulation stopped first
//!
//! Everything runs on the single UI thread; ticks are bounded units of
//! work the host schedules between rendering frames. The controller is
//! the only owner of the simulations, which is what enforces the
//! no-overlapping-ownership rule: a rebuilt model can never be touched by
//! a stale simulation because the stale instance is stopped and dropped
//! before the new one exists.

use std::collections::{HashMap, VecDeque};

use crate::graph::{GraphModel, JobRecord, NodeId};
use crate::layout::{ForceConfig, ForceSimulation};
use crate::spatial::SpatialIndex;

/// Pointer hit radius in world units, sized to the rendered node circles.
const HIT_RADIUS: f32 = 12.0;

/// Alpha target while a drag gesture is active.
const DRAG_ALPHA_TARGET: f32 = 0.3;

/// Minimum zoom scale.
pub const MIN_SCALE: f32 = 0.1;

/// Maximum zoom scale.
pub const MAX_SCALE: f32 = 10.0;

/// Events emitted toward the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node was click-selected.
    NodeSelected(NodeId),
    /// A real (non-virtual) node was activated for drill-down navigation.
    NodeNavigate(NodeId),
    /// The detail overlay opened for a node.
    OverlayOpened(NodeId),
    /// The detail overlay closed.
    OverlayClosed,
}

/// Side panel tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    /// Job metadata.
    #[default]
    Info,
    /// Run-history trend chart.
    History,
}

/// Continuous zoom/pan transform applied to the rendered scene.
///
/// Node coordinates are never mutated by zooming; the transform maps
/// between world space (simulation coordinates) and screen space.
#[derive(Debug, Clone, Copy)]
pub struct ViewTransform {
    /// Scale factor, clamped to [`MIN_SCALE`, `MAX_SCALE`].
    pub scale: f32,
    /// Screen-space translation.
    pub translate: (f32, f32),
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: (0.0, 0.0),
        }
    }
}

impl ViewTransform {
    /// Map a screen point to world coordinates.
    pub fn world_from_screen(&self, sx: f32, sy: f32) -> (f32, f32) {
        (
            (sx - self.translate.0) / self.scale,
            (sy - self.translate.1) / self.scale,
        )
    }

    /// Map a world point to screen coordinates.
    pub fn screen_from_world(&self, wx: f32, wy: f32) -> (f32, f32) {
        (
            wx * self.scale + self.translate.0,
            wy * self.scale + self.translate.1,
        )
    }

    /// Zoom by a factor keeping the given screen point fixed.
    pub fn zoom_at(&mut self, factor: f32, sx: f32, sy: f32) {
        let (wx, wy) = self.world_from_screen(sx, sy);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = (sx - wx * self.scale, sy - wy * self.scale);
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.translate.0 += dx;
        self.translate.1 += dy;
    }
}

/// The detail overlay: a node with its immediate neighbors in an
/// isolated, re-seeded simulation.
pub struct OverlayState {
    /// The node the overlay was opened for.
    pub node: NodeId,
    /// Overlay members (the node plus its neighborhood).
    pub members: Vec<NodeId>,
    /// The isolated simulation; owns its own subgraph copy.
    pub sim: ForceSimulation,
}

/// Translates pointer events into model operations and owns all
/// layout-simulation lifetimes.
pub struct InteractionController {
    model: GraphModel,
    main_sim: Option<ForceSimulation>,
    overlay: Option<OverlayState>,
    hit_index: SpatialIndex,
    hit_dirty: bool,
    selected: Option<NodeId>,
    dragging: Option<NodeId>,
    active_tab: ActiveTab,
    transform: ViewTransform,
    events: VecDeque<GraphEvent>,
}

impl InteractionController {
    /// Create a controller over an empty graph.
    pub fn new() -> Self {
        Self {
            model: GraphModel::build(&[]),
            main_sim: None,
            overlay: None,
            hit_index: SpatialIndex::new(),
            hit_dirty: false,
            selected: None,
            dragging: None,
            active_tab: ActiveTab::default(),
            transform: ViewTransform::default(),
            events: VecDeque::new(),
        }
    }

    // =========================================================================
    // Data lifecycle
    // =========================================================================

    /// Replace the job set (full rebuild).
    ///
    /// Stops every running simulation before the new model exists, then
    /// clears selection, gesture pins and any open overlay. Interaction
    /// state never survives a rebuild.
    pub fn set_jobs(&mut self, records: &[JobRecord]) {
        self.set_jobs_inner(records, &HashMap::new());
    }

    /// Replace the job set, carrying explicitly pinned positions forward
    /// by job id. Gesture state is still cleared.
    pub fn set_jobs_keep_pinned(&mut self, records: &[JobRecord]) {
        let pinned = self.model.pinned_positions();
        self.set_jobs_inner(records, &pinned);
    }

    fn set_jobs_inner(&mut self, records: &[JobRecord], pinned: &HashMap<String, (f32, f32)>) {
        // Stale simulations must never tick against the new node set.
        if let Some(sim) = self.main_sim.as_mut() {
            sim.stop();
        }
        self.main_sim = None;
        if self.overlay.is_some() {
            self.close_overlay();
        }
        self.selected = None;
        self.dragging = None;

        self.model = GraphModel::build_with_pins(records, pinned);
        if !self.model.is_empty() {
            self.main_sim = Some(ForceSimulation::from_model(
                &self.model,
                ForceConfig::default(),
            ));
        }
        self.hit_dirty = true;
    }

    /// Advance both simulations one tick and hand the main simulation's
    /// positions back to the model. Returns true while anything is still
    /// moving.
    pub fn tick(&mut self) -> bool {
        let mut moving = false;
        if let Some(sim) = self.main_sim.as_mut() {
            if sim.tick() {
                moving = true;
                self.model
                    .apply_positions(sim.positions_x(), sim.positions_y());
                self.hit_dirty = true;
            }
        }
        if let Some(overlay) = self.overlay.as_mut() {
            moving |= overlay.sim.tick();
        }
        moving
    }

    // =========================================================================
    // Selection and navigation
    // =========================================================================

    /// Handle a primary click at screen coordinates. A hit on a real node
    /// selects it and emits [`GraphEvent::NodeSelected`]; a miss (or the
    /// virtual root) clears the selection.
    pub fn click(&mut self, sx: f32, sy: f32) -> Option<NodeId> {
        let hit = self.hit_test(sx, sy).filter(|&id| !self.model.is_virtual(id));
        match hit {
            Some(id) => self.select(id),
            None => self.clear_selection(),
        }
        hit
    }

    /// Select a node directly (the virtual root is not selectable).
    pub fn select(&mut self, id: NodeId) {
        if self.model.is_virtual(id) || self.model.node(id).is_none() {
            return;
        }
        if let Some(previous) = self.selected {
            if let Some(state) = self.model.state_mut(previous) {
                state.set_selected(false);
            }
        }
        if let Some(state) = self.model.state_mut(id) {
            state.set_selected(true);
        }
        self.selected = Some(id);
        self.events.push_back(GraphEvent::NodeSelected(id));
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        if let Some(previous) = self.selected.take() {
            if let Some(state) = self.model.state_mut(previous) {
                state.set_selected(false);
            }
        }
    }

    /// Activate a node for drill-down. Emits [`GraphEvent::NodeNavigate`]
    /// for real nodes; the virtual root never navigates.
    pub fn activate(&mut self, id: NodeId) {
        if self.model.node(id).is_some() && !self.model.is_virtual(id) {
            self.events.push_back(GraphEvent::NodeNavigate(id));
        }
    }

    // =========================================================================
    // Drag gestures
    // =========================================================================

    /// Begin a drag at screen coordinates. A hit pins the node and
    /// reheats the simulation so the neighborhood keeps resettling.
    pub fn drag_start(&mut self, sx: f32, sy: f32) -> Option<NodeId> {
        let id = self.hit_test(sx, sy)?;
        let (wx, wy) = self.transform.world_from_screen(sx, sy);
        self.dragging = Some(id);
        if let Some(state) = self.model.state_mut(id) {
            state.set_pinned(true);
        }
        if let Some(sim) = self.main_sim.as_mut() {
            sim.set_alpha_target(DRAG_ALPHA_TARGET);
            sim.pin(id, wx, wy);
        }
        Some(id)
    }

    /// Continue an active drag.
    pub fn drag_to(&mut self, sx: f32, sy: f32) {
        let Some(id) = self.dragging else {
            return;
        };
        let (wx, wy) = self.transform.world_from_screen(sx, sy);
        if let Some(sim) = self.main_sim.as_mut() {
            sim.pin(id, wx, wy);
        }
    }

    /// End the drag: release the pin and restore the alpha target so the
    /// simulation cools back down.
    pub fn drag_end(&mut self) {
        let Some(id) = self.dragging.take() else {
            return;
        };
        if let Some(state) = self.model.state_mut(id) {
            state.set_pinned(false);
        }
        if let Some(sim) = self.main_sim.as_mut() {
            sim.unpin(id);
            sim.set_alpha_target(0.0);
        }
    }

    // =========================================================================
    // Detail overlay
    // =========================================================================

    /// Handle a secondary (right) click: open the detail overlay for the
    /// hit node. The virtual root has no overlay.
    pub fn secondary_click(&mut self, sx: f32, sy: f32) -> Option<NodeId> {
        let id = self
            .hit_test(sx, sy)
            .filter(|&id| !self.model.is_virtual(id))?;
        self.open_overlay(id);
        Some(id)
    }

    /// Open the detail overlay: the node plus its immediate neighbors in
    /// a fresh, isolated simulation with detail-view forces. Replaces any
    /// overlay already open.
    pub fn open_overlay(&mut self, id: NodeId) {
        if self.model.node(id).is_none() || self.model.is_virtual(id) {
            return;
        }
        if self.overlay.is_some() {
            self.close_overlay();
        }

        let mut members = vec![id];
        let mut neighbors: Vec<NodeId> = self
            .model
            .neighbors_of(id)
            .into_iter()
            .filter(|&n| !self.model.is_virtual(n))
            .collect();
        neighbors.sort_by_key(|n| n.raw());
        members.extend(neighbors);

        let sim = ForceSimulation::from_subgraph(&self.model, &members, ForceConfig::detail_view());
        self.overlay = Some(OverlayState {
            node: id,
            members,
            sim,
        });
        self.events.push_back(GraphEvent::OverlayOpened(id));
    }

    /// Close the overlay, stopping and discarding its simulation so
    /// nothing keeps ticking in the background.
    pub fn close_overlay(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.sim.stop();
            self.events.push_back(GraphEvent::OverlayClosed);
        }
    }

    /// The open overlay, if any.
    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    // =========================================================================
    // Tabs, zoom, pan
    // =========================================================================

    /// Switch the side-panel tab. Switching to History with a selection
    /// returns the node whose run history should be aggregated; cached
    /// results for other nodes stay valid.
    pub fn set_active_tab(&mut self, tab: ActiveTab) -> Option<NodeId> {
        self.active_tab = tab;
        match tab {
            ActiveTab::History => self.selected,
            ActiveTab::Info => None,
        }
    }

    /// Current tab.
    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    /// Zoom by a factor keeping the given screen point fixed.
    pub fn zoom_at(&mut self, factor: f32, sx: f32, sy: f32) {
        self.transform.zoom_at(factor, sx, sy);
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.transform.pan_by(dx, dy);
    }

    /// Current view transform.
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    // =========================================================================
    // State access
    // =========================================================================

    /// The underlying model.
    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// Currently selected node.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Node currently being dragged.
    pub fn dragging(&self) -> Option<NodeId> {
        self.dragging
    }

    /// Whether the main simulation is still active.
    pub fn simulation_active(&self) -> bool {
        self.main_sim
            .as_ref()
            .map(ForceSimulation::is_active)
            .unwrap_or(false)
    }

    /// Drain all pending events in emission order.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.events.drain(..).collect()
    }

    fn hit_test(&mut self, sx: f32, sy: f32) -> Option<NodeId> {
        if self.hit_dirty {
            self.hit_index.rebuild(&self.model);
            self.hit_dirty = false;
        }
        let (wx, wy) = self.transform.world_from_screen(sx, sy);
        self.hit_index.nearest_within(wx, wy, HIT_RADIUS)
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::JobRecord;

    fn records() -> Vec<JobRecord> {
        vec![
            JobRecord::new("a", "A"),
            JobRecord::new("b", "B").with_parent("a"),
            JobRecord::new("c", "C").with_parent("a"),
        ]
    }

    fn forest_records() -> Vec<JobRecord> {
        vec![
            JobRecord::new("a1", "A1"),
            JobRecord::new("a2", "A2").with_parent("a1"),
            JobRecord::new("b1", "B1"),
            JobRecord::new("b2", "B2").with_parent("b1"),
        ]
    }

    fn screen_pos(controller: &InteractionController, id: NodeId) -> (f32, f32) {
        let (wx, wy) = controller.model().position(id).unwrap();
        controller.transform().screen_from_world(wx, wy)
    }

    #[test]
    fn test_click_selects_and_emits() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let b = controller.model().node_by_job_id("b").unwrap();

        let (sx, sy) = screen_pos(&controller, b);
        assert_eq!(controller.click(sx, sy), Some(b));
        assert_eq!(controller.selected(), Some(b));
        assert!(controller.model().state(b).is_selected());
        assert_eq!(
            controller.drain_events(),
            vec![GraphEvent::NodeSelected(b)]
        );
    }

    #[test]
    fn test_click_miss_clears_selection() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let b = controller.model().node_by_job_id("b").unwrap();
        controller.select(b);

        assert_eq!(controller.click(5000.0, 5000.0), None);
        assert_eq!(controller.selected(), None);
        assert!(!controller.model().state(b).is_selected());
    }

    #[test]
    fn test_virtual_root_never_selectable_or_navigable() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&forest_records());
        let root = controller.model().root().unwrap();
        assert!(controller.model().is_virtual(root));

        controller.select(root);
        assert_eq!(controller.selected(), None);

        controller.activate(root);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn test_activate_emits_navigate_for_real_node() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let c = controller.model().node_by_job_id("c").unwrap();

        controller.activate(c);
        assert_eq!(controller.drain_events(), vec![GraphEvent::NodeNavigate(c)]);
    }

    #[test]
    fn test_drag_pins_for_gesture_duration() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let a = controller.model().node_by_job_id("a").unwrap();

        let (sx, sy) = screen_pos(&controller, a);
        assert_eq!(controller.drag_start(sx, sy), Some(a));
        controller.drag_to(sx + 80.0, sy - 40.0);
        for _ in 0..10 {
            controller.tick();
        }

        // Pinned at the drag point while the gesture lasts.
        let (wx, wy) = controller
            .transform()
            .world_from_screen(sx + 80.0, sy - 40.0);
        let (px, py) = controller.model().position(a).unwrap();
        assert!((px - wx).abs() < 1e-3 && (py - wy).abs() < 1e-3);

        controller.drag_end();
        assert_eq!(controller.dragging(), None);
        assert!(!controller.model().state(a).is_pinned());

        // Released: ticks move the node off the drag point again.
        for _ in 0..30 {
            controller.tick();
        }
        let after = controller.model().position(a).unwrap();
        assert_ne!(after, (wx, wy));
    }

    #[test]
    fn test_overlay_lifecycle() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let a = controller.model().node_by_job_id("a").unwrap();

        controller.open_overlay(a);
        let overlay = controller.overlay().unwrap();
        // a plus its neighbors b and c.
        assert_eq!(overlay.node, a);
        assert_eq!(overlay.members.len(), 3);
        assert_eq!(
            controller.drain_events(),
            vec![GraphEvent::OverlayOpened(a)]
        );

        controller.close_overlay();
        assert!(controller.overlay().is_none());
        assert_eq!(controller.drain_events(), vec![GraphEvent::OverlayClosed]);
    }

    #[test]
    fn test_rebuild_clears_interaction_state() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let a = controller.model().node_by_job_id("a").unwrap();
        controller.select(a);
        controller.open_overlay(a);
        controller.drain_events();

        controller.set_jobs(&forest_records());
        assert_eq!(controller.selected(), None);
        assert!(controller.overlay().is_none());
        assert_eq!(controller.drain_events(), vec![GraphEvent::OverlayClosed]);
    }

    #[test]
    fn test_history_tab_requests_aggregation_for_selection() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let b = controller.model().node_by_job_id("b").unwrap();

        assert_eq!(controller.set_active_tab(ActiveTab::History), None);
        controller.select(b);
        assert_eq!(controller.set_active_tab(ActiveTab::History), Some(b));
        assert_eq!(controller.set_active_tab(ActiveTab::Info), None);
        assert_eq!(controller.active_tab(), ActiveTab::Info);
    }

    #[test]
    fn test_zoom_clamped_and_coordinates_untouched() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&records());
        let before: Vec<f32> = controller.model().positions_x().to_vec();

        for _ in 0..100 {
            controller.zoom_at(1.5, 10.0, 10.0);
        }
        assert_eq!(controller.transform().scale, MAX_SCALE);

        for _ in 0..200 {
            controller.zoom_at(0.5, 10.0, 10.0);
        }
        assert_eq!(controller.transform().scale, MIN_SCALE);

        // Zooming is a view transform only.
        assert_eq!(controller.model().positions_x(), before.as_slice());
    }

    #[test]
    fn test_zoom_keeps_anchor_point_fixed() {
        let mut transform = ViewTransform::default();
        let anchor_world = transform.world_from_screen(120.0, 90.0);
        transform.zoom_at(2.0, 120.0, 90.0);
        let after = transform.world_from_screen(120.0, 90.0);

        assert!((anchor_world.0 - after.0).abs() < 1e-3);
        assert!((anchor_world.1 - after.1).abs() < 1e-3);
    }

    #[test]
    fn test_empty_graph_is_inert() {
        let mut controller = InteractionController::new();
        controller.set_jobs(&[]);

        assert!(!controller.tick());
        assert_eq!(controller.click(0.0, 0.0), None);
        assert!(!controller.simulation_active());
        assert!(controller.drain_events().is_empty());
    }
}
