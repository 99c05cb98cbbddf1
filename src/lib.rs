//! JobGraph - WASM Module
//!
//! The algorithmic core of the JobGraph dashboard: it turns a flat list
//! of job records into a navigable dependency graph, lays it out with a
//! force simulation or a radial tree, and drives selection, highlighting,
//! drill-down overlays and run-history trends. It is compiled to
//! WebAssembly and exposes a JavaScript-friendly API via wasm-bindgen;
//! fetching, rendering and routing stay on the JS side.
//!
//! # Architecture
//!
//! - `graph`: record ingestion + the normalized dependency graph model
//! - `layout`: force simulation and radial tree layout engines
//! - `spatial`: R-tree spatial indexing for pointer hit testing
//! - `interact`: pointer-event handling, selection, overlay and view state
//! - `history`: run-history aggregation (completion time-of-day trend)
//! - `demo`: seeded dataset generators for demos and tests

use chrono::NaiveDate;
use js_sys::Float32Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod demo;
pub mod graph;
pub mod history;
pub mod interact;
pub mod layout;
pub mod spatial;

use graph::{IngestError, JobRecord, NodeId};
use history::{synthetic_history, RunHistoryStore, RunRecord, SyntheticHistoryConfig, DEFAULT_WINDOW_DAYS};
use interact::{ActiveTab, GraphEvent, InteractionController};
use layout::{RadialTreeConfig, RadialTreeLayout};

/// Sentinel position marking "not part of the laid-out hierarchy"; the
/// renderer skips slots carrying it.
const LAYOUT_SENTINEL: f32 = 3.402_823e+38;

/// Initialize the WASM module: panic reporting and the console logger.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeInfoView {
    id: String,
    name: String,
    status: String,
    kind: String,
    is_virtual: bool,
    start_time: Option<String>,
    end_time: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeView {
    source: u32,
    target: u32,
    kind: String,
    dashed: bool,
    synthetic: bool,
    opacity: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView {
    kind: &'static str,
    job_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineView {
    job_id: String,
    start: String,
    end: String,
    status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformView {
    scale: f32,
    translate_x: f32,
    translate_y: f32,
}

/// Main entry point for the graph engine.
///
/// Wraps the interaction controller (which owns the model and all layout
/// simulations) and the run-history store, exposing the public API to
/// JavaScript.
#[wasm_bindgen]
pub struct JobGraphWasm {
    controller: InteractionController,
    history: RunHistoryStore,
}

#[wasm_bindgen]
impl JobGraphWasm {
    /// Create an engine over an empty graph.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            controller: InteractionController::new(),
            history: RunHistoryStore::new(),
        }
    }

    // =========================================================================
    // Data lifecycle
    // =========================================================================

    /// Replace the job set from a JS array of job records (full rebuild;
    /// selection, pins and overlays are cleared). Returns the node count.
    #[wasm_bindgen(js_name = loadJobs)]
    pub fn load_jobs(&mut self, records: JsValue) -> Result<u32, JsValue> {
        let records = Self::parse_records(records)?;
        self.controller.set_jobs(&records);
        Ok(self.controller.model().node_count() as u32)
    }

    /// Replace the job set, carrying explicitly pinned positions forward
    /// by job id.
    #[wasm_bindgen(js_name = loadJobsKeepPinned)]
    pub fn load_jobs_keep_pinned(&mut self, records: JsValue) -> Result<u32, JsValue> {
        let records = Self::parse_records(records)?;
        self.controller.set_jobs_keep_pinned(&records);
        Ok(self.controller.model().node_count() as u32)
    }

    fn parse_records(records: JsValue) -> Result<Vec<JobRecord>, JsValue> {
        serde_wasm_bindgen::from_value(records)
            .map_err(|err| IngestError::Deserialize(err.to_string()))
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Load a seeded demo dataset (balanced tree with cross edges).
    /// Returns the node count.
    #[wasm_bindgen(js_name = loadDemoJobs)]
    pub fn load_demo_jobs(&mut self, count: u32, seed: u32) -> u32 {
        let records = demo::balanced_dataset(count as usize, seed as u64);
        self.controller.set_jobs(&records);
        self.controller.model().node_count() as u32
    }

    /// Advance the layout simulations one tick. Returns true while
    /// anything is still moving; hosts typically call this once per
    /// animation frame until it settles.
    pub fn tick(&mut self) -> bool {
        self.controller.tick()
    }

    /// Whether the main simulation would still advance on the next tick.
    #[wasm_bindgen(js_name = isSimulationActive)]
    pub fn is_simulation_active(&self) -> bool {
        self.controller.simulation_active()
    }

    /// Diagnostics of the last build: nodes/edges added and dropped.
    #[wasm_bindgen(js_name = buildReport)]
    pub fn build_report(&self) -> Result<JsValue, JsValue> {
        to_js(&self.controller.model().report())
    }

    // =========================================================================
    // Graph access
    // =========================================================================

    /// Number of nodes, including a virtual root if one was synthesized.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.controller.model().node_count() as u32
    }

    /// Number of edges, including synthetic virtual-root edges.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.controller.model().edge_count() as u32
    }

    /// Upstream job ids in slot order.
    #[wasm_bindgen(js_name = jobIds)]
    pub fn job_ids(&self) -> Vec<String> {
        let model = self.controller.model();
        model
            .node_ids()
            .filter_map(|id| model.node(id).map(|node| node.id.clone()))
            .collect()
    }

    /// Resolve an upstream job id to its slot.
    #[wasm_bindgen(js_name = nodeSlot)]
    pub fn node_slot(&self, job_id: &str) -> Option<u32> {
        self.controller.model().node_by_job_id(job_id).map(NodeId::raw)
    }

    /// Metadata of one node.
    #[wasm_bindgen(js_name = nodeInfo)]
    pub fn node_info(&self, slot: u32) -> Result<JsValue, JsValue> {
        let model = self.controller.model();
        let id = NodeId(slot);
        match model.node(id) {
            None => Ok(JsValue::NULL),
            Some(node) => to_js(&NodeInfoView {
                id: node.id.clone(),
                name: node.name.clone(),
                status: node.status.to_string(),
                kind: node.kind.to_string(),
                is_virtual: model.is_virtual(id),
                start_time: node.start_time.map(|ts| ts.to_rfc3339()),
                end_time: node.end_time.map(|ts| ts.to_rfc3339()),
            }),
        }
    }

    /// Edge list with per-edge render style for the current selection.
    #[wasm_bindgen(js_name = getEdges)]
    pub fn get_edges(&self) -> Result<JsValue, JsValue> {
        let model = self.controller.model();
        let selected = self.controller.selected();
        let styles = interact::edge_styles(model, selected);
        let views: Vec<EdgeView> = model
            .edges()
            .into_iter()
            .zip(styles)
            .map(|(edge, style)| EdgeView {
                source: edge.source.raw(),
                target: edge.target.raw(),
                kind: edge.kind.to_string(),
                dashed: style.dashed,
                synthetic: edge.synthetic,
                opacity: style.opacity,
            })
            .collect();
        to_js(&views)
    }

    /// Per-node `{opacity, emphasized}` styles for the current selection,
    /// in slot order.
    #[wasm_bindgen(js_name = nodeStyles)]
    pub fn node_styles(&self) -> Result<JsValue, JsValue> {
        let model = self.controller.model();
        let styles = interact::node_styles(model, self.controller.selected());
        to_js(&styles.iter().map(|s| (s.opacity, s.emphasized)).collect::<Vec<_>>())
    }

    /// Zero-copy view of X positions (slot order).
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for rendering, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.controller.model().positions_x()) }
    }

    /// Zero-copy view of Y positions (slot order).
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for rendering, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.controller.model().positions_y()) }
    }

    /// Slots of nodes within `max_depth` of the hierarchy root.
    #[wasm_bindgen(js_name = visibleAtDepth)]
    pub fn visible_at_depth(&self, max_depth: u32) -> Vec<u32> {
        let (nodes, _) = self.controller.model().filter_to_depth(max_depth);
        nodes.into_iter().map(NodeId::raw).collect()
    }

    /// Ancestor chain of a node up to the root (the node first).
    #[wasm_bindgen(js_name = pathToRoot)]
    pub fn path_to_root(&self, slot: u32) -> Vec<u32> {
        self.controller
            .model()
            .path_to_root(NodeId(slot))
            .into_iter()
            .map(NodeId::raw)
            .collect()
    }

    /// Run intervals (jobs with both timestamps) ordered by start, for
    /// the timeline chart.
    #[wasm_bindgen(js_name = timelineIntervals)]
    pub fn timeline_intervals(&self) -> Result<JsValue, JsValue> {
        let model = self.controller.model();
        let views: Vec<TimelineView> = model
            .timeline_intervals()
            .into_iter()
            .filter_map(|interval| {
                let node = model.node(interval.node)?;
                Some(TimelineView {
                    job_id: node.id.clone(),
                    start: interval.start.to_rfc3339(),
                    end: interval.end.to_rfc3339(),
                    status: interval.status.to_string(),
                })
            })
            .collect();
        to_js(&views)
    }

    // =========================================================================
    // Pointer interaction
    // =========================================================================

    /// Primary click at screen coordinates: selects the hit node (if any)
    /// and recomputes highlight styles. Returns the hit slot.
    pub fn click(&mut self, x: f32, y: f32) -> Option<u32> {
        self.controller.click(x, y).map(NodeId::raw)
    }

    /// Secondary (right) click: opens the detail overlay for the hit
    /// node. Returns the hit slot.
    #[wasm_bindgen(js_name = secondaryClick)]
    pub fn secondary_click(&mut self, x: f32, y: f32) -> Option<u32> {
        self.controller.secondary_click(x, y).map(NodeId::raw)
    }

    /// Activate a node (for example on double click) to request
    /// drill-down navigation. The virtual root never navigates.
    #[wasm_bindgen(js_name = activateNode)]
    pub fn activate_node(&mut self, slot: u32) {
        self.controller.activate(NodeId(slot));
    }

    /// Begin a drag gesture. Returns the grabbed slot.
    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, x: f32, y: f32) -> Option<u32> {
        self.controller.drag_start(x, y).map(NodeId::raw)
    }

    /// Continue the active drag gesture.
    #[wasm_bindgen(js_name = dragTo)]
    pub fn drag_to(&mut self, x: f32, y: f32) {
        self.controller.drag_to(x, y);
    }

    /// End the active drag gesture, releasing the pin.
    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self) {
        self.controller.drag_end();
    }

    /// Zoom by a factor keeping the given screen point fixed. Scale is
    /// clamped to [0.1, 10].
    #[wasm_bindgen(js_name = zoomAt)]
    pub fn zoom_at(&mut self, factor: f32, x: f32, y: f32) {
        self.controller.zoom_at(factor, x, y);
    }

    /// Pan by a screen-space delta.
    #[wasm_bindgen(js_name = panBy)]
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.controller.pan_by(dx, dy);
    }

    /// Current view transform as `{scale, translateX, translateY}`.
    #[wasm_bindgen(js_name = viewTransform)]
    pub fn view_transform(&self) -> Result<JsValue, JsValue> {
        let transform = self.controller.transform();
        to_js(&TransformView {
            scale: transform.scale,
            translate_x: transform.translate.0,
            translate_y: transform.translate.1,
        })
    }

    /// Currently selected job id.
    #[wasm_bindgen(js_name = selectedJobId)]
    pub fn selected_job_id(&self) -> Option<String> {
        let model = self.controller.model();
        self.controller
            .selected()
            .and_then(|id| model.node(id))
            .map(|node| node.id.clone())
    }

    /// Drain pending interaction events as
    /// `[{kind, jobId}]` in emission order.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        let events = self.controller.drain_events();
        let model = self.controller.model();
        let job_id = |id: NodeId| model.node(id).map(|node| node.id.clone());
        let views: Vec<EventView> = events
            .into_iter()
            .map(|event| match event {
                GraphEvent::NodeSelected(id) => EventView {
                    kind: "nodeSelected",
                    job_id: job_id(id),
                },
                GraphEvent::NodeNavigate(id) => EventView {
                    kind: "nodeNavigate",
                    job_id: job_id(id),
                },
                GraphEvent::OverlayOpened(id) => EventView {
                    kind: "overlayOpened",
                    job_id: job_id(id),
                },
                GraphEvent::OverlayClosed => EventView {
                    kind: "overlayClosed",
                    job_id: None,
                },
            })
            .collect();
        to_js(&views)
    }

    // =========================================================================
    // Detail overlay
    // =========================================================================

    /// Slots shown in the open overlay (the node first, then neighbors);
    /// empty when no overlay is open.
    #[wasm_bindgen(js_name = overlayMembers)]
    pub fn overlay_members(&self) -> Vec<u32> {
        self.controller
            .overlay()
            .map(|overlay| overlay.members.iter().map(|id| id.raw()).collect())
            .unwrap_or_default()
    }

    /// Overlay positions interleaved `[x0, y0, x1, y1, ...]`, one pair
    /// per overlay member. Copied, since the overlay simulation owns its
    /// own buffers.
    #[wasm_bindgen(js_name = overlayPositions)]
    pub fn overlay_positions(&self) -> Float32Array {
        let Some(overlay) = self.controller.overlay() else {
            return Float32Array::new_with_length(0);
        };
        let xs = overlay.sim.positions_x();
        let ys = overlay.sim.positions_y();
        let mut interleaved = Vec::with_capacity(xs.len() * 2);
        for (x, y) in xs.iter().zip(ys.iter()) {
            interleaved.push(*x);
            interleaved.push(*y);
        }
        Float32Array::from(&interleaved[..])
    }

    /// Close the overlay, stopping its simulation.
    #[wasm_bindgen(js_name = closeOverlay)]
    pub fn close_overlay(&mut self) {
        self.controller.close_overlay();
    }

    // =========================================================================
    // Tabs and history
    // =========================================================================

    /// Switch the side-panel tab (`"info"` or `"history"`). Switching to
    /// history with a selection returns that job's trend points; null
    /// otherwise.
    #[wasm_bindgen(js_name = setActiveTab)]
    pub fn set_active_tab(&mut self, tab: &str) -> Result<JsValue, JsValue> {
        let tab = match tab {
            "history" => ActiveTab::History,
            _ => ActiveTab::Info,
        };
        let Some(selected) = self.controller.set_active_tab(tab) else {
            return Ok(JsValue::NULL);
        };
        let model = self.controller.model();
        let Some(node) = model.node(selected) else {
            return Ok(JsValue::NULL);
        };
        to_js(&self.history.trend_for(&node.id, DEFAULT_WINDOW_DAYS))
    }

    /// Replace the run-history store from a JS array of run records.
    /// Returns the number of runs loaded.
    #[wasm_bindgen(js_name = loadHistory)]
    pub fn load_history(&mut self, records: JsValue) -> Result<u32, JsValue> {
        let records: Vec<RunRecord> = serde_wasm_bindgen::from_value(records)
            .map_err(|err| IngestError::Deserialize(err.to_string()))
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let count = records.len() as u32;
        self.history.load(records);
        Ok(count)
    }

    /// All runs of a job, sorted ascending by start time.
    #[wasm_bindgen(js_name = historyFor)]
    pub fn history_for(&self, job_id: &str) -> Result<JsValue, JsValue> {
        to_js(&self.history.history_for(job_id))
    }

    /// Windowed completion-time trend of a job.
    #[wasm_bindgen(js_name = trendFor)]
    pub fn trend_for(&self, job_id: &str, window_days: usize) -> Result<JsValue, JsValue> {
        to_js(&self.history.trend_for(job_id, window_days))
    }

    /// Fill the history store with a deterministic synthetic run series
    /// for a job (demo use only; `last_day` is `YYYY-MM-DD`). Returns the
    /// number of runs generated.
    #[wasm_bindgen(js_name = generateDemoHistory)]
    pub fn generate_demo_history(
        &mut self,
        job_id: &str,
        seed: u32,
        last_day: &str,
    ) -> Result<u32, JsValue> {
        let last_day: NaiveDate = last_day
            .parse()
            .map_err(|err| JsValue::from_str(&format!("invalid last_day: {err}")))?;
        let runs = synthetic_history(
            job_id,
            seed as u64,
            last_day,
            &SyntheticHistoryConfig::default(),
        );
        let count = runs.len() as u32;
        for run in runs {
            self.history.insert(run);
        }
        Ok(count)
    }

    // =========================================================================
    // Radial tree layout
    // =========================================================================

    /// Compute the deterministic radial tree layout for the current
    /// hierarchy. Returns positions interleaved `[x0, y0, x1, y1, ...]`
    /// with one pair per slot; slots outside the hierarchy carry the
    /// sentinel value the renderer skips.
    #[wasm_bindgen(js_name = computeRadialLayout)]
    pub fn compute_radial_layout(&self, width: f32, height: f32) -> Float32Array {
        let model = self.controller.model();
        let layout = RadialTreeLayout::new(RadialTreeConfig {
            width,
            height,
            ..RadialTreeConfig::default()
        });
        let result = layout.compute(model);

        let mut interleaved = vec![LAYOUT_SENTINEL; model.node_count() * 2];
        for (slot, placement) in result.placements.iter().enumerate() {
            if let Some(placement) = placement {
                interleaved[slot * 2] = placement.x;
                interleaved[slot * 2 + 1] = placement.y;
            }
        }
        Float32Array::from(&interleaved[..])
    }

    /// Radial placements with polar coordinates, serialized per slot
    /// (null for nodes outside the hierarchy). Useful for label layout,
    /// which flips anchors at angle π.
    #[wasm_bindgen(js_name = radialPlacements)]
    pub fn radial_placements(&self, width: f32, height: f32) -> Result<JsValue, JsValue> {
        let layout = RadialTreeLayout::new(RadialTreeConfig {
            width,
            height,
            ..RadialTreeConfig::default()
        });
        let result = layout.compute(self.controller.model());
        to_js(&result.placements)
    }
}

impl Default for JobGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::graph::GraphModel;
    use crate::layout::{ForceConfig, ForceSimulation};

    /// Full pipeline over a generated dataset: build, simulate, lay out
    /// radially, highlight. No wasm_bindgen JS types involved.
    #[test]
    fn test_dataset_to_layouts_pipeline() {
        let records = demo::balanced_dataset(300, 42);
        let mut controller = InteractionController::new();
        controller.set_jobs(&records);

        for _ in 0..120 {
            controller.tick();
        }
        let model = controller.model();
        for id in model.node_ids() {
            let (x, y) = model.position(id).unwrap();
            assert!(x.is_finite() && y.is_finite());
        }

        let radial = RadialTreeLayout::with_defaults().compute(model);
        assert_eq!(radial.node_count, model.node_count());

        let b = model.node_by_job_id("job-5").unwrap();
        controller.select(b);
        let styles = interact::node_styles(controller.model(), controller.selected());
        assert_eq!(styles.len(), controller.model().node_count());
        assert!(styles.iter().any(|s| s.opacity < 1.0));
    }

    /// Two disjoint chains produce exactly one virtual root, its children
    /// are the chain roots, and it never navigates.
    #[test]
    fn test_forest_virtual_root_end_to_end() {
        let records = vec![
            JobRecord::new("x1", "X1"),
            JobRecord::new("x2", "X2").with_parent("x1"),
            JobRecord::new("y1", "Y1"),
            JobRecord::new("y2", "Y2").with_parent("y1"),
        ];
        let mut controller = InteractionController::new();
        controller.set_jobs(&records);

        let model = controller.model();
        let root = model.root().unwrap();
        assert_eq!(model.virtual_root(), Some(root));

        let children: Vec<String> = model
            .children_of(root)
            .into_iter()
            .map(|id| model.node(id).unwrap().id.clone())
            .collect();
        assert_eq!(children, vec!["x1".to_owned(), "y1".to_owned()]);

        // Only one virtual root exists.
        let virtual_count = model
            .node_ids()
            .filter(|&id| model.is_virtual(id))
            .count();
        assert_eq!(virtual_count, 1);

        // Activating it never emits a navigation event.
        controller.activate(root);
        controller.select(root);
        assert!(controller.drain_events().is_empty());
    }

    /// Rebuild cancellation: a simulation created before a rebuild can
    /// keep ticking (it owns its buffers) without moving a single node of
    /// the new model.
    #[test]
    fn test_stale_simulation_cannot_touch_rebuilt_model() {
        let old_records = demo::balanced_dataset(40, 1);
        let old_model = GraphModel::build(&old_records);
        let mut stale_sim = ForceSimulation::from_model(&old_model, ForceConfig::default());

        let new_records = demo::balanced_dataset(60, 2);
        let new_model = GraphModel::build(&new_records);
        let sentinel_x = new_model.positions_x().to_vec();
        let sentinel_y = new_model.positions_y().to_vec();

        for _ in 0..200 {
            stale_sim.tick();
        }

        assert_eq!(new_model.positions_x(), sentinel_x.as_slice());
        assert_eq!(new_model.positions_y(), sentinel_y.as_slice());

        // And an explicitly stopped simulation does nothing ever again.
        stale_sim.stop();
        assert!(!stale_sim.tick());
    }

    /// History tab flow: select, switch to history, aggregate the trend.
    #[test]
    fn test_history_tab_flow() {
        let records = vec![
            JobRecord::new("etl", "Nightly ETL"),
            JobRecord::new("report", "Report").with_parent("etl"),
        ];
        let mut controller = InteractionController::new();
        controller.set_jobs(&records);

        let etl = controller.model().node_by_job_id("etl").unwrap();
        controller.select(etl);
        let to_aggregate = controller.set_active_tab(interact::ActiveTab::History);
        assert_eq!(to_aggregate, Some(etl));

        let mut store = RunHistoryStore::new();
        let last_day = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let runs = synthetic_history("etl", 9, last_day, &SyntheticHistoryConfig::default());
        store.load(runs);

        let trend = store.trend_for("etl", DEFAULT_WINDOW_DAYS);
        assert!(trend.len() > 20, "a month of runs should yield a trend");
        for pair in trend.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    /// Overlay simulations are bounded: they exhaust their tick budget
    /// even if nothing ever closes them.
    #[test]
    fn test_overlay_simulation_self_terminates() {
        let records = demo::balanced_dataset(50, 3);
        let mut controller = InteractionController::new();
        controller.set_jobs(&records);

        let hub = controller.model().node_by_job_id("job-0").unwrap();
        controller.open_overlay(hub);

        let mut ticks = 0u32;
        while controller.tick() {
            ticks += 1;
            assert!(ticks <= 4000, "overlay simulation failed to terminate");
        }
        assert!(controller.overlay().is_some());
    }

    /// Radial layout and depth filter agree on the hierarchy.
    #[test]
    fn test_depth_filter_matches_radial_depths() {
        let records = demo::structured_dataset(3, 4, 120, 5);
        let model = GraphModel::build(&records);

        let (visible, _) = model.filter_to_depth(1);
        let depths = model.hierarchy_depths();
        for id in &visible {
            assert!(matches!(depths[id.slot()], Some(d) if d <= 1));
        }

        let radial = RadialTreeLayout::with_defaults().compute(&model);
        // Depth-1 nodes sit on the first ring: strictly inside depth-2.
        let ring = |slot: usize| {
            let placement = radial.placements[slot].unwrap();
            placement.radius
        };
        let max_depth1: f32 = visible
            .iter()
            .filter(|id| depths[id.slot()] == Some(1))
            .map(|id| ring(id.slot()))
            .fold(0.0, f32::max);
        let min_depth2 = model
            .node_ids()
            .filter(|id| depths[id.slot()] == Some(2))
            .map(|id| ring(id.slot()))
            .fold(f32::INFINITY, f32::min);
        if min_depth2.is_finite() {
            assert!(max_depth1 < min_depth2);
        }
    }
}
