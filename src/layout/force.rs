//! Iterative force-directed layout simulation.
//!
//! A velocity-Verlet style physical simulation placing nodes in 2D space,
//! advanced tick-by-tick so the host can interleave ticks with rendering
//! frames. Forces are composed additively per tick:
//!
//! - **Link force:** spring attraction pulling connected nodes toward a
//!   target distance, biased by endpoint degree.
//! - **Charge force:** pairwise inverse-square repulsion so unconnected
//!   nodes separate, with a minimum-distance floor guarding against NaN
//!   blowups from coincident nodes.
//! - **Center force:** weak pull toward the canvas center to stop drift.
//! - **Radial force (optional):** pull toward a target radius from center,
//!   used to fan out deep trees.
//!
//! The simulation cools via an alpha parameter decaying toward
//! `alpha_min`; once below the threshold (and with no raised alpha
//! target, as used during drags) ticks become no-ops. Ephemeral
//! detail-view instances additionally carry a hard tick budget so a
//! forgotten overlay can never tick forever.
//!
//! Each simulation owns its position/velocity buffers outright. Detail
//! overlays are built from an induced-subgraph *copy*; two simulations
//! never alias the same arrays, so a stale instance can tick (or be
//! dropped) without corrupting anyone else's positions.

use std::collections::HashMap;

use crate::graph::{GraphModel, NodeId};

/// Floor on pairwise distance in the repulsion term. Two coincident nodes
/// are treated as being this far apart in a deterministic direction.
const MIN_CHARGE_DISTANCE: f32 = 1.0;

/// Golden-angle increment for deterministic jiggle and re-seeding.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// An optional radial constraint force.
#[derive(Debug, Clone, Copy)]
pub struct RadialForce {
    /// Target radius from the configured center.
    pub radius: f32,
    /// Force strength in (0, 1].
    pub strength: f32,
}

/// Configuration for a force simulation.
#[derive(Debug, Clone)]
pub struct ForceConfig {
    /// Target link length (default: 100).
    pub link_distance: f32,
    /// Link spring strength; `None` uses `1 / min(degree)` per link.
    pub link_strength: Option<f32>,
    /// Many-body charge; negative repels (default: -300).
    pub charge_strength: f32,
    /// Canvas center the centering force pulls toward.
    pub center: (f32, f32),
    /// Centering force strength (default: 0.05).
    pub center_strength: f32,
    /// Optional radial force.
    pub radial: Option<RadialForce>,
    /// Alpha threshold below which the simulation is converged.
    pub alpha_min: f32,
    /// Per-tick interpolation rate of alpha toward its target.
    pub alpha_decay: f32,
    /// Per-tick velocity multiplier (friction).
    pub velocity_decay: f32,
    /// Hard tick budget; `None` runs until convergence.
    pub max_ticks: Option<u32>,
}

impl Default for ForceConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            link_distance: 100.0,
            link_strength: None,
            charge_strength: -300.0,
            center: (0.0, 0.0),
            center_strength: 0.05,
            radial: None,
            alpha_min,
            // Reaches alpha_min in ~300 ticks from alpha = 1.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.6,
            max_ticks: None,
        }
    }
}

impl ForceConfig {
    /// Configuration for an ephemeral detail-overlay simulation: stronger
    /// repulsion for the zoomed view and a hard tick budget so repeatedly
    /// opened overlays stay bounded.
    pub fn detail_view() -> Self {
        Self {
            charge_strength: -500.0,
            max_ticks: Some(2000),
            ..Self::default()
        }
    }
}

struct Link {
    source: usize,
    target: usize,
    strength: f32,
    bias: f32,
}

/// A stateful force simulation over a fixed node/link set.
pub struct ForceSimulation {
    /// Model slot per simulation index.
    slots: Vec<NodeId>,
    /// Reverse map from model slot to simulation index.
    slot_to_index: HashMap<NodeId, usize>,

    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
    vel_x: Vec<f32>,
    vel_y: Vec<f32>,

    /// Fixed (fx, fy) override per node; `None` when free.
    fixed: Vec<Option<(f32, f32)>>,

    links: Vec<Link>,

    alpha: f32,
    alpha_target: f32,
    ticks: u32,
    stopped: bool,

    config: ForceConfig,
}

impl ForceSimulation {
    /// Build a simulation over the whole model.
    ///
    /// Positions are copied from the model (which seeds distinct initial
    /// coordinates at build time); nodes the model marks pinned start
    /// fixed at their carried positions. Synthetic virtual-root edges are
    /// excluded from the link force.
    pub fn from_model(model: &GraphModel, config: ForceConfig) -> Self {
        let nodes: Vec<NodeId> = model.node_ids().collect();
        let mut sim = Self::with_nodes(model, &nodes, config);

        for (index, &slot) in sim.slots.iter().enumerate() {
            sim.pos_x[index] = model.positions_x()[slot.slot()];
            sim.pos_y[index] = model.positions_y()[slot.slot()];
            if model.state(slot).is_pinned() {
                sim.fixed[index] = Some((sim.pos_x[index], sim.pos_y[index]));
            }
        }
        sim
    }

    /// Build an isolated simulation over an induced subgraph, re-seeded
    /// around the configured center.
    ///
    /// Used for detail overlays: the node set is copied, never aliased,
    /// so the main simulation's arrays stay untouched.
    pub fn from_subgraph(model: &GraphModel, nodes: &[NodeId], config: ForceConfig) -> Self {
        let mut sim = Self::with_nodes(model, nodes, config);

        let (cx, cy) = sim.config.center;
        for index in 0..sim.slots.len() {
            let radius = 20.0 * (index as f32).sqrt();
            let angle = index as f32 * GOLDEN_ANGLE;
            sim.pos_x[index] = cx + radius * angle.cos();
            sim.pos_y[index] = cy + radius * angle.sin();
        }
        sim
    }

    fn with_nodes(model: &GraphModel, nodes: &[NodeId], config: ForceConfig) -> Self {
        let slots = nodes.to_vec();
        let slot_to_index: HashMap<NodeId, usize> = slots
            .iter()
            .enumerate()
            .map(|(index, &slot)| (slot, index))
            .collect();

        // Induced non-synthetic links, then per-endpoint degrees for the
        // default strength and bias.
        let pairs: Vec<(usize, usize)> = model
            .edges()
            .into_iter()
            .filter(|edge| !edge.synthetic)
            .filter_map(|edge| {
                let source = slot_to_index.get(&edge.source)?;
                let target = slot_to_index.get(&edge.target)?;
                Some((*source, *target))
            })
            .collect();

        let mut degree = vec![0u32; slots.len()];
        for &(source, target) in &pairs {
            degree[source] += 1;
            degree[target] += 1;
        }

        let links = pairs
            .into_iter()
            .map(|(source, target)| {
                let deg_s = degree[source] as f32;
                let deg_t = degree[target] as f32;
                Link {
                    source,
                    target,
                    strength: config
                        .link_strength
                        .unwrap_or_else(|| 1.0 / deg_s.min(deg_t).max(1.0)),
                    bias: deg_s / (deg_s + deg_t).max(1.0),
                }
            })
            .collect();

        let count = slots.len();
        Self {
            slots,
            slot_to_index,
            pos_x: vec![0.0; count],
            pos_y: vec![0.0; count],
            vel_x: vec![0.0; count],
            vel_y: vec![0.0; count],
            fixed: vec![None; count],
            links,
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            stopped: false,
            config,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Whether further ticks will advance the simulation.
    pub fn is_active(&self) -> bool {
        if self.stopped || self.slots.is_empty() {
            return false;
        }
        if let Some(budget) = self.config.max_ticks {
            if self.ticks >= budget {
                return false;
            }
        }
        self.alpha >= self.config.alpha_min || self.alpha_target >= self.config.alpha_min
    }

    /// Advance one tick. Returns false (and does nothing at all) once the
    /// simulation has converged, exhausted its budget, or been stopped.
    pub fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.ticks += 1;
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_center();
        self.apply_radial();
        self.integrate();
        true
    }

    /// Permanently stop the simulation. Subsequent ticks are no-ops; a
    /// rebuilt graph must never be touched by a stale instance.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Raise or clear the alpha floor the simulation cools toward. Raised
    /// to 0.3 while a drag gesture is active so the neighborhood keeps
    /// resettling, restored to 0 on release.
    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target;
    }

    /// Current alpha.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Ticks advanced so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    // =========================================================================
    // Pinning
    // =========================================================================

    /// Fix a node at the given position for the duration of a gesture.
    /// The node stops responding to forces but still exerts them.
    pub fn pin(&mut self, node: NodeId, x: f32, y: f32) {
        if let Some(&index) = self.slot_to_index.get(&node) {
            self.fixed[index] = Some((x, y));
            self.pos_x[index] = x;
            self.pos_y[index] = y;
            self.vel_x[index] = 0.0;
            self.vel_y[index] = 0.0;
        }
    }

    /// Release a pinned node. No fixed coordinate survives the release.
    pub fn unpin(&mut self, node: NodeId) {
        if let Some(&index) = self.slot_to_index.get(&node) {
            self.fixed[index] = None;
        }
    }

    /// Check whether a node is currently pinned.
    pub fn is_pinned(&self, node: NodeId) -> bool {
        self.slot_to_index
            .get(&node)
            .map(|&index| self.fixed[index].is_some())
            .unwrap_or(false)
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Model slot per simulation index.
    pub fn slots(&self) -> &[NodeId] {
        &self.slots
    }

    /// X positions slice (simulation index order).
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Y positions slice (simulation index order).
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    /// Position of a node by model slot.
    pub fn position_of(&self, node: NodeId) -> Option<(f32, f32)> {
        self.slot_to_index
            .get(&node)
            .map(|&index| (self.pos_x[index], self.pos_y[index]))
    }

    // =========================================================================
    // Forces
    // =========================================================================

    fn apply_links(&mut self) {
        let distance = self.config.link_distance;
        for link in &self.links {
            let (s, t) = (link.source, link.target);
            let mut dx = (self.pos_x[t] + self.vel_x[t]) - (self.pos_x[s] + self.vel_x[s]);
            let mut dy = (self.pos_y[t] + self.vel_y[t]) - (self.pos_y[s] + self.vel_y[s]);
            if dx == 0.0 && dy == 0.0 {
                let angle = (s as f32) * GOLDEN_ANGLE;
                dx = MIN_CHARGE_DISTANCE * angle.cos();
                dy = MIN_CHARGE_DISTANCE * angle.sin();
            }
            let len = (dx * dx + dy * dy).sqrt();
            let l = (len - distance) / len * self.alpha * link.strength;

            self.vel_x[t] -= dx * l * link.bias;
            self.vel_y[t] -= dy * l * link.bias;
            self.vel_x[s] += dx * l * (1.0 - link.bias);
            self.vel_y[s] += dy * l * (1.0 - link.bias);
        }
    }

    fn apply_charge(&mut self) {
        let count = self.slots.len();
        let min_dist_sq = MIN_CHARGE_DISTANCE * MIN_CHARGE_DISTANCE;
        for i in 0..count {
            for j in (i + 1)..count {
                let mut dx = self.pos_x[j] - self.pos_x[i];
                let mut dy = self.pos_y[j] - self.pos_y[i];
                let mut dist_sq = dx * dx + dy * dy;
                if dist_sq < min_dist_sq {
                    // Coincident or nearly so: deterministic jiggle keeps
                    // the direction defined and the magnitude bounded.
                    let angle = (i as f32) * GOLDEN_ANGLE + (j as f32);
                    dx = MIN_CHARGE_DISTANCE * angle.cos();
                    dy = MIN_CHARGE_DISTANCE * angle.sin();
                    dist_sq = min_dist_sq;
                }
                let w = self.config.charge_strength * self.alpha / dist_sq;
                self.vel_x[i] += dx * w;
                self.vel_y[i] += dy * w;
                self.vel_x[j] -= dx * w;
                self.vel_y[j] -= dy * w;
            }
        }
    }

    fn apply_center(&mut self) {
        let (cx, cy) = self.config.center;
        let k = self.config.center_strength * self.alpha;
        for index in 0..self.slots.len() {
            self.vel_x[index] += (cx - self.pos_x[index]) * k;
            self.vel_y[index] += (cy - self.pos_y[index]) * k;
        }
    }

    fn apply_radial(&mut self) {
        let Some(radial) = self.config.radial else {
            return;
        };
        let (cx, cy) = self.config.center;
        let k = radial.strength * self.alpha;
        for index in 0..self.slots.len() {
            let dx = self.pos_x[index] - cx;
            let dy = self.pos_y[index] - cy;
            let r = (dx * dx + dy * dy).sqrt().max(MIN_CHARGE_DISTANCE);
            let push = (radial.radius - r) * k / r;
            self.vel_x[index] += dx * push;
            self.vel_y[index] += dy * push;
        }
    }

    fn integrate(&mut self) {
        for index in 0..self.slots.len() {
            match self.fixed[index] {
                Some((fx, fy)) => {
                    self.pos_x[index] = fx;
                    self.pos_y[index] = fy;
                    self.vel_x[index] = 0.0;
                    self.vel_y[index] = 0.0;
                }
                None => {
                    self.vel_x[index] *= self.config.velocity_decay;
                    self.vel_y[index] *= self.config.velocity_decay;
                    self.pos_x[index] += self.vel_x[index];
                    self.pos_y[index] += self.vel_y[index];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::JobRecord;

    fn linked_pair() -> GraphModel {
        GraphModel::build(&[
            JobRecord::new("a", "A"),
            JobRecord::new("b", "B").with_parent("a"),
        ])
    }

    fn run_to_convergence(sim: &mut ForceSimulation) -> u32 {
        let mut ticks = 0;
        while sim.tick() {
            ticks += 1;
            assert!(ticks < 10_000, "simulation failed to converge");
        }
        ticks
    }

    #[test]
    fn test_empty_simulation_is_noop() {
        let model = GraphModel::build(&[]);
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        assert!(!sim.is_active());
        assert!(!sim.tick());
    }

    #[test]
    fn test_converges_in_about_300_ticks() {
        let model = linked_pair();
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        let ticks = run_to_convergence(&mut sim);
        assert!((250..=350).contains(&ticks), "converged in {ticks} ticks");
    }

    #[test]
    fn test_linked_nodes_settle_near_link_distance() {
        let model = linked_pair();
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        run_to_convergence(&mut sim);

        let a = model.node_by_job_id("a").unwrap();
        let b = model.node_by_job_id("b").unwrap();
        let (ax, ay) = sim.position_of(a).unwrap();
        let (bx, by) = sim.position_of(b).unwrap();
        let dist = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();

        // Charge pushes slightly past the spring's rest length; the pair
        // should still land in the link distance's neighborhood.
        assert!(
            (60.0..=240.0).contains(&dist),
            "settled distance {dist} too far from link distance"
        );
    }

    #[test]
    fn test_unconnected_nodes_repel() {
        let model = GraphModel::build(&[JobRecord::new("a", "A"), JobRecord::new("b", "B")]);
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());

        let a = model.node_by_job_id("a").unwrap();
        let b = model.node_by_job_id("b").unwrap();
        let initial = {
            let (ax, ay) = sim.position_of(a).unwrap();
            let (bx, by) = sim.position_of(b).unwrap();
            ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
        };

        for _ in 0..50 {
            sim.tick();
        }

        let (ax, ay) = sim.position_of(a).unwrap();
        let (bx, by) = sim.position_of(b).unwrap();
        let after = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
        assert!(after > initial, "repulsion did not separate nodes");
    }

    #[test]
    fn test_coincident_nodes_never_go_nan() {
        let model = GraphModel::build(&[JobRecord::new("a", "A"), JobRecord::new("b", "B")]);
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());

        // Force both nodes onto the same coordinate.
        let a = model.node_by_job_id("a").unwrap();
        let b = model.node_by_job_id("b").unwrap();
        sim.pin(a, 5.0, 5.0);
        sim.pin(b, 5.0, 5.0);
        sim.tick();
        sim.unpin(a);
        sim.unpin(b);

        for _ in 0..100 {
            sim.tick();
        }
        for index in 0..2 {
            assert!(sim.positions_x()[index].is_finite());
            assert!(sim.positions_y()[index].is_finite());
        }
    }

    #[test]
    fn test_pin_holds_node_while_neighbors_move() {
        let model = linked_pair();
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        let a = model.node_by_job_id("a").unwrap();
        let b = model.node_by_job_id("b").unwrap();

        sim.pin(a, 42.0, -17.0);
        let before_b = sim.position_of(b).unwrap();
        for _ in 0..20 {
            sim.tick();
        }

        assert_eq!(sim.position_of(a).unwrap(), (42.0, -17.0));
        assert_ne!(sim.position_of(b).unwrap(), before_b);
    }

    #[test]
    fn test_unpin_leaves_no_residual_fix() {
        let model = linked_pair();
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        let a = model.node_by_job_id("a").unwrap();

        sim.pin(a, 42.0, -17.0);
        for _ in 0..10 {
            sim.tick();
        }
        sim.unpin(a);
        assert!(!sim.is_pinned(a));

        sim.set_alpha_target(0.3);
        for _ in 0..20 {
            sim.tick();
        }
        sim.set_alpha_target(0.0);

        // Free again: forces have moved the node off the pinned spot.
        assert_ne!(sim.position_of(a).unwrap(), (42.0, -17.0));
    }

    #[test]
    fn test_tick_budget_exhausts() {
        let model = linked_pair();
        let config = ForceConfig {
            max_ticks: Some(5),
            ..ForceConfig::default()
        };
        let mut sim = ForceSimulation::from_model(&model, config);

        for _ in 0..5 {
            assert!(sim.tick());
        }
        assert!(!sim.tick());
        assert_eq!(sim.ticks(), 5);
    }

    #[test]
    fn test_detail_view_config() {
        let config = ForceConfig::detail_view();
        assert_eq!(config.charge_strength, -500.0);
        assert_eq!(config.max_ticks, Some(2000));
    }

    #[test]
    fn test_stop_is_terminal_and_freezes_positions() {
        let model = linked_pair();
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        for _ in 0..10 {
            sim.tick();
        }
        sim.stop();

        let frozen_x = sim.positions_x().to_vec();
        let frozen_y = sim.positions_y().to_vec();
        for _ in 0..50 {
            assert!(!sim.tick());
        }
        assert_eq!(sim.positions_x(), frozen_x.as_slice());
        assert_eq!(sim.positions_y(), frozen_y.as_slice());
    }

    #[test]
    fn test_alpha_target_reheats_converged_simulation() {
        let model = linked_pair();
        let mut sim = ForceSimulation::from_model(&model, ForceConfig::default());
        run_to_convergence(&mut sim);
        assert!(!sim.tick());

        sim.set_alpha_target(0.3);
        assert!(sim.tick(), "raised alpha target should reactivate");
        sim.set_alpha_target(0.0);
    }

    #[test]
    fn test_subgraph_simulation_copies_not_aliases() {
        let model = GraphModel::build(&[
            JobRecord::new("a", "A"),
            JobRecord::new("b", "B").with_parent("a"),
            JobRecord::new("c", "C").with_parent("a"),
        ]);
        let a = model.node_by_job_id("a").unwrap();
        let b = model.node_by_job_id("b").unwrap();

        let mut main = ForceSimulation::from_model(&model, ForceConfig::default());
        let mut detail =
            ForceSimulation::from_subgraph(&model, &[a, b], ForceConfig::detail_view());

        let main_before = main.positions_x().to_vec();
        for _ in 0..50 {
            detail.tick();
        }
        // Detail ticking never moves the main simulation's nodes.
        assert_eq!(main.positions_x(), main_before.as_slice());

        for _ in 0..50 {
            main.tick();
        }
        assert_eq!(detail.slots().len(), 2);
    }

    #[test]
    fn test_radial_force_pulls_toward_ring() {
        let model = GraphModel::build(&[JobRecord::new("a", "A")]);
        let config = ForceConfig {
            charge_strength: 0.0,
            center_strength: 0.0,
            radial: Some(RadialForce {
                radius: 200.0,
                strength: 0.8,
            }),
            ..ForceConfig::default()
        };
        let mut sim = ForceSimulation::from_model(&model, config);
        let a = model.node_by_job_id("a").unwrap();
        sim.pin(a, 10.0, 0.0);
        sim.tick();
        sim.unpin(a);

        for _ in 0..200 {
            sim.tick();
        }
        let (x, y) = sim.position_of(a).unwrap();
        let r = (x * x + y * y).sqrt();
        assert!(
            (r - 200.0).abs() < 40.0,
            "node should approach the target ring, got radius {r}"
        );
    }
}
