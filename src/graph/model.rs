//! GraphModel - normalized job dependency graph.
//!
//! The model is built in one pass from a flat list of raw job records and
//! is immutable in topology afterwards: upstream data changes rebuild the
//! whole model (full replace, never incremental patch). It maintains:
//! - Graph topology via petgraph's StableGraph
//! - String-id interning to stable `NodeId` slots
//! - SoA position buffers written by layout engines
//! - Node state flags (pinned, selected, virtual)
//! - Hierarchy root inference, with a synthetic virtual root when the
//!   record set is a forest

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};

use chrono::{DateTime, Utc};

use super::edge::{DependencyEdge, DependencyKind};
use super::node::{JobKind, JobNode, JobStatus, NodeId, NodeState};
use super::record::JobRecord;

/// Reserved id of the synthetic virtual root.
pub const VIRTUAL_ROOT_ID: &str = "root";

/// Golden-angle increment for the phyllotaxis initial placement.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Spacing factor for the phyllotaxis initial placement.
const INITIAL_RADIUS_STEP: f32 = 10.0;

/// Edge payload stored in the petgraph structure.
#[derive(Debug, Clone, Copy)]
struct EdgeWeight {
    kind: DependencyKind,
    synthetic: bool,
}

/// Counters from a model build, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Nodes added to the graph (excluding the virtual root).
    pub nodes_added: usize,
    /// Records dropped (duplicate or reserved ids).
    pub records_dropped: usize,
    /// Edges resolved and added.
    pub edges_added: usize,
    /// Edges dropped (dangling endpoint, malformed, self-loop).
    pub edges_dropped: usize,
}

/// A `(start, end)` run interval row for the timeline chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineInterval {
    /// The job node.
    pub node: NodeId,
    /// Run start.
    pub start: DateTime<Utc>,
    /// Run end.
    pub end: DateTime<Utc>,
    /// Status at the time of the snapshot.
    pub status: JobStatus,
}

/// The normalized job dependency graph.
pub struct GraphModel {
    /// Topology. Node weights are stable ids, edge weights carry the kind.
    graph: StableGraph<NodeId, EdgeWeight, Directed>,

    /// Map from stable NodeId to petgraph NodeIndex.
    node_id_to_index: HashMap<NodeId, NodeIndex>,

    /// Map from upstream string id to stable NodeId.
    job_id_to_node: HashMap<String, NodeId>,

    /// Job data per slot.
    nodes: Vec<JobNode>,

    /// State flags per slot.
    states: Vec<NodeState>,

    /// X positions (SoA layout). Derived state, owned by whichever layout
    /// engine is active and handed back via [`GraphModel::apply_positions`].
    pos_x: Vec<f32>,

    /// Y positions (SoA layout).
    pos_y: Vec<f32>,

    /// The hierarchy root (inferred or virtual).
    root: Option<NodeId>,

    /// Set when the root was synthesized rather than inferred.
    virtual_root: Option<NodeId>,

    /// Build diagnostics.
    report: BuildReport,
}

impl GraphModel {
    /// Build a model from raw records.
    ///
    /// Never fails: duplicate/reserved records and dangling or malformed
    /// edges are dropped with logged warnings and counted in the
    /// [`BuildReport`]. An empty record list produces an empty model.
    pub fn build(records: &[JobRecord]) -> Self {
        Self::build_with_pins(records, &HashMap::new())
    }

    /// Build a model, re-seeding positions for previously pinned jobs.
    ///
    /// `pinned` maps upstream job ids to carried-forward positions; matching
    /// nodes start at that position and keep their pinned flag. All other
    /// position state from earlier models is discarded.
    pub fn build_with_pins(records: &[JobRecord], pinned: &HashMap<String, (f32, f32)>) -> Self {
        let mut model = Self {
            graph: StableGraph::with_capacity(records.len(), records.len()),
            node_id_to_index: HashMap::with_capacity(records.len()),
            job_id_to_node: HashMap::with_capacity(records.len()),
            nodes: Vec::with_capacity(records.len()),
            states: Vec::with_capacity(records.len()),
            pos_x: Vec::with_capacity(records.len()),
            pos_y: Vec::with_capacity(records.len()),
            root: None,
            virtual_root: None,
            report: BuildReport::default(),
        };

        // Pass 1: intern nodes, first record per id wins.
        for record in records {
            if record.id == VIRTUAL_ROOT_ID {
                log::warn!("dropping job record with reserved id {VIRTUAL_ROOT_ID:?}");
                model.report.records_dropped += 1;
                continue;
            }
            if model.job_id_to_node.contains_key(&record.id) {
                log::warn!("dropping duplicate job record {:?}", record.id);
                model.report.records_dropped += 1;
                continue;
            }
            model.insert_node(record.to_node(), false);
            model.report.nodes_added += 1;
        }

        // Pass 2: resolve edges now that every id is interned.
        for record in records {
            let (deps, malformed) = record.normalized_dependencies();
            model.report.edges_dropped += malformed;

            for dep in deps {
                let source = model.job_id_to_node.get(&dep.source).copied();
                let target = model.job_id_to_node.get(&dep.target).copied();
                match (source, target) {
                    (Some(source), Some(target)) if source != target => {
                        model.add_edge(source, target, dep.kind, false);
                        model.report.edges_added += 1;
                    }
                    (Some(_), Some(_)) => {
                        log::warn!("dropping self-dependency on job {:?}", dep.source);
                        model.report.edges_dropped += 1;
                    }
                    _ => {
                        log::warn!(
                            "dropping dependency {:?} -> {:?}: unknown job id",
                            dep.source,
                            dep.target
                        );
                        model.report.edges_dropped += 1;
                    }
                }
            }
        }

        model.infer_root();
        model.seed_positions(pinned);
        model
    }

    fn insert_node(&mut self, node: JobNode, virtual_root: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let index = self.graph.add_node(id);
        self.node_id_to_index.insert(id, index);
        self.job_id_to_node.insert(node.id.clone(), id);
        self.nodes.push(node);
        let mut state = NodeState::new();
        state.set_virtual(virtual_root);
        self.states.push(state);
        self.pos_x.push(0.0);
        self.pos_y.push(0.0);
        id
    }

    fn add_edge(&mut self, source: NodeId, target: NodeId, kind: DependencyKind, synthetic: bool) {
        let source_index = self.node_id_to_index[&source];
        let target_index = self.node_id_to_index[&target];
        self.graph
            .add_edge(source_index, target_index, EdgeWeight { kind, synthetic });
    }

    /// Infer the hierarchy root: a node is a root candidate iff it is not
    /// the target of any parent-kind edge. Exactly one candidate becomes
    /// the root; zero or several get a synthetic virtual root as common
    /// ancestor (over all nodes when no candidate exists at all).
    fn infer_root(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        let mut candidates: Vec<NodeId> = Vec::new();
        for (&id, &index) in &self.node_id_to_index {
            let has_parent = self
                .graph
                .edges_directed(index, Direction::Incoming)
                .any(|edge| edge.weight().kind.is_hierarchy());
            if !has_parent {
                candidates.push(id);
            }
        }
        candidates.sort_by_key(|id| id.raw());

        if candidates.len() == 1 {
            self.root = Some(candidates[0]);
            return;
        }

        // Forest (or all-cyclic) input: synthesize a common ancestor.
        let children = if candidates.is_empty() {
            (0..self.nodes.len() as u32).map(NodeId).collect()
        } else {
            candidates
        };

        let virtual_root = self.insert_node(
            JobNode {
                id: VIRTUAL_ROOT_ID.to_owned(),
                name: "All Jobs".to_owned(),
                status: JobStatus::Completed,
                kind: JobKind::Box,
                start_time: None,
                end_time: None,
            },
            true,
        );
        for child in children {
            self.add_edge(virtual_root, child, DependencyKind::Parent, true);
        }
        self.root = Some(virtual_root);
        self.virtual_root = Some(virtual_root);
    }

    /// Phyllotaxis initial placement so no two nodes ever start at the
    /// same coordinate, with pinned positions carried forward by job id.
    fn seed_positions(&mut self, pinned: &HashMap<String, (f32, f32)>) {
        for slot in 0..self.nodes.len() {
            if let Some(&(x, y)) = pinned.get(self.nodes[slot].id.as_str()) {
                self.pos_x[slot] = x;
                self.pos_y[slot] = y;
                self.states[slot].set_pinned(true);
            } else {
                let radius = INITIAL_RADIUS_STEP * (slot as f32).sqrt();
                let angle = slot as f32 * GOLDEN_ANGLE;
                self.pos_x[slot] = radius * angle.cos();
                self.pos_y[slot] = radius * angle.sin();
            }
        }
    }

    // =========================================================================
    // Topology queries
    // =========================================================================

    /// Number of nodes, including the virtual root if present.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the model holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges, including synthetic virtual-root edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The hierarchy root, if the model is non-empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The virtual root, if one was synthesized.
    pub fn virtual_root(&self) -> Option<NodeId> {
        self.virtual_root
    }

    /// Build diagnostics from the last build.
    pub fn report(&self) -> BuildReport {
        self.report
    }

    /// Look up a node's data by slot id.
    pub fn node(&self, id: NodeId) -> Option<&JobNode> {
        self.nodes.get(id.slot())
    }

    /// Resolve an upstream job id to its slot.
    pub fn node_by_job_id(&self, job_id: &str) -> Option<NodeId> {
        self.job_id_to_node.get(job_id).copied()
    }

    /// State flags for a node.
    pub fn state(&self, id: NodeId) -> NodeState {
        self.states.get(id.slot()).copied().unwrap_or_default()
    }

    /// Mutably access a node's state flags.
    pub fn state_mut(&mut self, id: NodeId) -> Option<&mut NodeState> {
        self.states.get_mut(id.slot())
    }

    /// True for the synthetic virtual root.
    pub fn is_virtual(&self, id: NodeId) -> bool {
        self.state(id).is_virtual()
    }

    /// Iterate all node ids in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// All edges, endpoints as slot ids.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edge_references()
            .map(|edge| DependencyEdge {
                source: self.graph[edge.source()],
                target: self.graph[edge.target()],
                kind: edge.weight().kind,
                synthetic: edge.weight().synthetic,
            })
            .collect()
    }

    /// Undirected neighbor set of a node, excluding the node itself.
    pub fn neighbors_of(&self, id: NodeId) -> HashSet<NodeId> {
        let Some(&index) = self.node_id_to_index.get(&id) else {
            return HashSet::new();
        };
        self.graph
            .neighbors_undirected(index)
            .map(|n| self.graph[n])
            .filter(|&n| n != id)
            .collect()
    }

    /// Children via parent-kind edges (virtual-root edges included), used
    /// by the radial tree layout.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&index) = self.node_id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeId> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .filter(|edge| edge.weight().kind.is_hierarchy())
            .map(|edge| self.graph[edge.target()])
            .collect();
        children.sort_by_key(|id| id.raw());
        children.dedup();
        children
    }

    /// Parents via parent-kind edges.
    pub fn parents_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&index) = self.node_id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut parents: Vec<NodeId> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .filter(|edge| edge.weight().kind.is_hierarchy())
            .map(|edge| self.graph[edge.source()])
            .collect();
        parents.sort_by_key(|id| id.raw());
        parents.dedup();
        parents
    }

    // =========================================================================
    // Hierarchy queries
    // =========================================================================

    /// BFS depth of every node from the root over parent-kind edges.
    /// Unreachable nodes get `None`.
    pub fn hierarchy_depths(&self) -> Vec<Option<u32>> {
        let mut depths = vec![None; self.nodes.len()];
        let Some(root) = self.root else {
            return depths;
        };

        let mut queue = VecDeque::from([(root, 0u32)]);
        depths[root.slot()] = Some(0);
        while let Some((id, depth)) = queue.pop_front() {
            for child in self.children_of(id) {
                if depths[child.slot()].is_none() {
                    depths[child.slot()] = Some(depth + 1);
                    queue.push_back((child, depth + 1));
                }
            }
        }
        depths
    }

    /// Restrict the graph to nodes whose hierarchy depth is at most
    /// `max_depth`, with edges between surviving endpoints only.
    pub fn filter_to_depth(&self, max_depth: u32) -> (Vec<NodeId>, Vec<DependencyEdge>) {
        let depths = self.hierarchy_depths();
        let keep: HashSet<NodeId> = self
            .node_ids()
            .filter(|id| matches!(depths[id.slot()], Some(d) if d <= max_depth))
            .collect();

        let edges = self
            .edges()
            .into_iter()
            .filter(|edge| keep.contains(&edge.source) && keep.contains(&edge.target))
            .collect();

        let mut nodes: Vec<NodeId> = keep.into_iter().collect();
        nodes.sort_by_key(|id| id.raw());
        (nodes, edges)
    }

    /// Chain of parent-edge ancestors from `id` up to the root, root last.
    /// Cycle-safe; stops at the first node without parents.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(node) = current {
            if !visited.insert(node) {
                break;
            }
            path.push(node);
            current = self.parents_of(node).first().copied();
        }
        path
    }

    /// Run intervals for every job carrying both timestamps, ordered by
    /// start time, for the Gantt-style timeline chart.
    pub fn timeline_intervals(&self) -> Vec<TimelineInterval> {
        let mut intervals: Vec<TimelineInterval> = self
            .node_ids()
            .filter_map(|id| {
                let node = &self.nodes[id.slot()];
                match (node.start_time, node.end_time) {
                    (Some(start), Some(end)) => Some(TimelineInterval {
                        node: id,
                        start,
                        end,
                        status: node.status,
                    }),
                    _ => None,
                }
            })
            .collect();
        intervals.sort_by_key(|interval| interval.start);
        intervals
    }

    // =========================================================================
    // Position buffers
    // =========================================================================

    /// X positions slice (slot order).
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Y positions slice (slot order).
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    /// A node's position.
    pub fn position(&self, id: NodeId) -> Option<(f32, f32)> {
        let slot = id.slot();
        if slot < self.pos_x.len() {
            Some((self.pos_x[slot], self.pos_y[slot]))
        } else {
            None
        }
    }

    /// Hand a layout pass's positions back to the model. Slices must cover
    /// every slot; mismatched lengths are ignored with a warning rather
    /// than corrupting the buffers.
    pub fn apply_positions(&mut self, pos_x: &[f32], pos_y: &[f32]) {
        if pos_x.len() != self.pos_x.len() || pos_y.len() != self.pos_y.len() {
            log::warn!(
                "ignoring position write-back of {} slots into model of {}",
                pos_x.len(),
                self.pos_x.len()
            );
            return;
        }
        self.pos_x.copy_from_slice(pos_x);
        self.pos_y.copy_from_slice(pos_y);
    }

    /// Positions of currently pinned nodes keyed by job id, for carrying
    /// across a rebuild.
    pub fn pinned_positions(&self) -> HashMap<String, (f32, f32)> {
        self.node_ids()
            .filter(|&id| self.state(id).is_pinned())
            .map(|id| {
                let slot = id.slot();
                (
                    self.nodes[slot].id.clone(),
                    (self.pos_x[slot], self.pos_y[slot]),
                )
            })
            .collect()
    }
}
