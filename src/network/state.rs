//! The network: graph, components, frequency registry and solved state.

use std::collections::BTreeMap;

use num_complex::Complex64;

use super::config::{EvalStats, NetworkConfig};
use super::editing::Grab;
use super::snapshot::{BranchSnapshot, NetworkSnapshot};
use crate::components::Component;
use crate::error::{NetworkError, Result};
use crate::frequency::{FrequencyRegistry, SlotChange};
use crate::graph::{validate_graph, ComponentId, Graph, Point, Terminal, VertexId};
use crate::solver::{gauss, projector, reconstruct_potentials, LinearSystem, Topology};

/// One terminal of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentNode {
    pub component: ComponentId,
    pub terminal: Terminal,
}

impl ComponentNode {
    pub fn new(component: ComponentId, terminal: Terminal) -> Self {
        Self {
            component,
            terminal,
        }
    }
}

/// A live-editable electrical network and its phasor solution.
///
/// Every structural edit marks the topology dirty, every parameter or
/// frequency change marks the parameters dirty; [`Network::evaluate`] does
/// nothing unless one of them is set or it is forced.
#[derive(Debug, Clone)]
pub struct Network {
    pub(super) graph: Graph,
    pub(super) components: BTreeMap<ComponentId, Component>,
    pub(super) registry: FrequencyRegistry,
    pub(super) config: NetworkConfig,
    pub(super) grab: Option<Grab>,
    pub(super) next_component: usize,
    pub(super) topology_dirty: bool,
    pub(super) params_dirty: bool,
    /// Spanning forest and structural system of the last rebuild
    solver: Option<(Topology, LinearSystem)>,
    valid: bool,
    stats: EvalStats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create an empty network with default configuration.
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    /// Create an empty network with custom configuration.
    pub fn with_config(config: NetworkConfig) -> Self {
        let registry = FrequencyRegistry::with_epsilon(config.frequency_epsilon);
        Self {
            graph: Graph::new(registry.len()),
            components: BTreeMap::new(),
            registry,
            config,
            grab: None,
            next_component: 0,
            topology_dirty: true,
            params_dirty: true,
            solver: None,
            valid: false,
            stats: EvalStats::default(),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The underlying graph, for inspection.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Whether the next `evaluate(false)` will do any work.
    pub fn is_dirty(&self) -> bool {
        self.topology_dirty || self.params_dirty
    }

    // ---------------------------------------------------------------------
    // Frequency registry
    // ---------------------------------------------------------------------

    /// Register one more holder of `omega` and return its current slot.
    ///
    /// Negative and non-finite frequencies are refused with
    /// [`NetworkError::InvalidFrequency`].
    pub fn request_angular_frequency(&mut self, omega: f64) -> Result<usize> {
        match self.registry.request(omega)? {
            SlotChange::Inserted(slot) => {
                self.graph.insert_slot(slot);
                self.params_dirty = true;
                tracing::debug!(omega, slot, "opened frequency slot");
                Ok(slot)
            }
            SlotChange::Unchanged(slot) | SlotChange::Removed(slot) => Ok(slot),
        }
    }

    /// Drop one holder of `omega`. The slot disappears with its last holder.
    pub fn release_angular_frequency(&mut self, omega: f64) -> Result<()> {
        if let SlotChange::Removed(slot) = self.registry.release(omega)? {
            self.graph.remove_slot(slot);
            self.params_dirty = true;
            tracing::debug!(omega, slot, "closed frequency slot");
        }
        Ok(())
    }

    /// Angular frequencies in slot order; slot 0 is DC.
    pub fn simulated_angular_frequencies(&self) -> &[f64] {
        self.registry.angular_frequencies()
    }

    /// Slot currently holding `omega`.
    pub fn frequency_slot(&self, omega: f64) -> Option<usize> {
        self.registry.index_of(omega)
    }

    /// Number of holders of the slot at `slot`.
    pub fn frequency_refcount(&self, slot: usize) -> Option<usize> {
        self.registry.refcount(slot)
    }

    // ---------------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------------

    /// Solve the network at every simulated frequency.
    ///
    /// Returns immediately unless something changed since the last call or
    /// `force` is set. A failed solve is not an error: the network is marked
    /// invalid and that slot's currents read as zero.
    pub fn evaluate(&mut self, force: bool) -> Result<()> {
        if !force && !self.is_dirty() {
            self.stats.skipped += 1;
            return Ok(());
        }
        let span = tracing::debug_span!(
            "evaluate",
            force,
            edges = self.graph.edge_count(),
            slots = self.registry.len()
        );
        let _guard = span.enter();
        self.stats.evaluations += 1;

        if force || self.topology_dirty || self.solver.is_none() {
            validate_graph(&self.graph)?;
            let topology = Topology::build(&self.graph)?;
            let system = LinearSystem::new(&topology);
            self.solver = Some((topology, system));
            self.stats.rebuilds += 1;
        }
        self.write_parameters()?;
        self.topology_dirty = false;
        self.params_dirty = false;
        self.valid = true;

        let Some((topology, system)) = self.solver.as_mut() else {
            return Ok(());
        };
        let omegas = self.registry.angular_frequencies();
        for (slot, &omega) in omegas.iter().enumerate() {
            system.load_slot(topology, &self.graph, slot)?;
            let mut matrix = system.augmented();
            self.stats.solves += 1;
            let currents = match gauss::solve(
                &mut matrix,
                system.equations(),
                system.branches,
                self.config.pivot_tolerance,
            ) {
                Ok(currents) => currents,
                Err(err) => {
                    tracing::warn!(slot, omega, %err, "solve failed, network marked invalid");
                    self.valid = false;
                    self.stats.failed_solves += 1;
                    vec![Complex64::default(); system.branches]
                }
            };
            for (&edge, current) in topology.edges.iter().zip(currents) {
                self.graph.edge_mut(edge)?.current[slot] = current;
            }
        }
        Ok(())
    }

    /// Copy every component's electrical parameters into the graph.
    ///
    /// Source phasors land in whichever slot the registry matched their
    /// frequency to, so sources sharing a slot add up.
    fn write_parameters(&mut self) -> Result<()> {
        let registry = &self.registry;
        let omegas = registry.angular_frequencies();
        for vertex in self.graph.vertices_mut() {
            vertex.input_current.fill(Complex64::default());
        }
        for component in self.components.values() {
            let source_voltage = registry.gather(&component.kind.source_spectrum())?;
            let edge = self.graph.edge_mut(component.edge)?;
            for (slot, &omega) in omegas.iter().enumerate() {
                edge.impedance[slot] = component.kind.impedance(omega);
            }
            edge.source_voltage = source_voltage;
            if !component.kind.is_current_source() {
                continue;
            }
            let (input, output) = (edge.input, edge.output);
            let injected = registry.gather(&component.kind.injected_spectrum())?;
            for (slot, current) in injected.into_iter().enumerate() {
                self.graph.vertex_mut(output)?.input_current[slot] += current;
                self.graph.vertex_mut(input)?.input_current[slot] -= current;
            }
        }
        Ok(())
    }

    /// Whether every slot of the last evaluation solved.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    /// Spanning forest of the last rebuild.
    pub fn topology(&self) -> Option<&Topology> {
        self.solver.as_ref().map(|(topology, _)| topology)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Components in creation order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn component(&self, id: ComponentId) -> Result<&Component> {
        self.components
            .get(&id)
            .ok_or(NetworkError::UnknownComponent { component: id })
    }

    /// Every grabbable terminal in the network.
    pub fn component_nodes(&self) -> Vec<ComponentNode> {
        self.components
            .values()
            .flat_map(|c| c.terminals().iter().map(move |&t| ComponentNode::new(c.id, t)))
            .collect()
    }

    /// Position of a terminal.
    pub fn node_position(&self, node: ComponentNode) -> Result<Point> {
        Ok(self.component(node.component)?.position(node.terminal))
    }

    /// Graph vertex a terminal is attached to.
    pub fn node_vertex(&self, node: ComponentNode) -> Result<VertexId> {
        let component = self.component(node.component)?;
        Ok(self.graph.edge(component.edge)?.endpoint(node.terminal))
    }

    /// Closest terminal within the merge radius of `pos`.
    pub fn node_at_pos(&self, pos: Point) -> Option<ComponentNode> {
        self.component_nodes()
            .into_iter()
            .filter_map(|node| {
                let distance = self.node_position(node).ok()?.distance(pos);
                (distance <= self.config.merge_radius).then_some((distance, node))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, node)| node)
    }

    /// Closest component body within the merge radius of `pos`.
    pub fn component_at_pos(&self, pos: Point) -> Option<ComponentId> {
        self.components
            .values()
            .map(|c| (pos.distance_to_segment(c.input, c.output), c.id))
            .filter(|&(distance, _)| distance <= self.config.merge_radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    /// Branch current phasors of a component, one per slot.
    ///
    /// For a current source this is the driven current, not the residual
    /// flowing through its open-circuit branch.
    pub fn branch_current_phasors(&self, id: ComponentId) -> Result<Vec<Complex64>> {
        let component = self.component(id)?;
        let edge = self.graph.edge(component.edge)?;
        let injected = self.registry.gather(&component.kind.injected_spectrum())?;
        Ok(edge
            .current
            .iter()
            .zip(injected)
            .map(|(&current, injected)| current + injected)
            .collect())
    }

    /// Instantaneous current through a component at time `t`.
    pub fn branch_current(&self, id: ComponentId, t: f64) -> Result<f64> {
        let phasors = self.branch_current_phasors(id)?;
        Ok(projector::project(&phasors, self.registry.angular_frequencies(), t))
    }

    /// Instantaneous voltage drop across a component at time `t`.
    pub fn branch_voltage_drop(&self, id: ComponentId, t: f64) -> Result<f64> {
        let component = self.component(id)?;
        let mut edge = self.graph.edge(component.edge)?.clone();
        edge.project(
            self.registry.angular_frequencies(),
            t,
            None,
            self.config.drop_convention,
        );
        Ok(edge.voltage_drop_t)
    }

    /// Refresh every time-domain scalar at time `t`, potentials included.
    pub fn project_at(&mut self, t: f64) -> Result<()> {
        self.project_slots(t, None)
    }

    /// Like [`Network::project_at`], summing only the listed slots.
    pub fn project_subset_at(&mut self, t: f64, slots: &[usize]) -> Result<()> {
        self.project_slots(t, Some(slots))
    }

    fn project_slots(&mut self, t: f64, slots: Option<&[usize]>) -> Result<()> {
        let omegas = self.registry.angular_frequencies();
        let convention = self.config.drop_convention;
        for edge in self.graph.edges_mut() {
            edge.project(omegas, t, slots, convention);
        }
        for vertex in self.graph.vertices_mut() {
            vertex.input_current_t = match slots {
                Some(slots) => projector::project_subset(&vertex.input_current, omegas, slots, t),
                None => projector::project(&vertex.input_current, omegas, t),
            };
        }
        reconstruct_potentials(&mut self.graph)?;
        Ok(())
    }

    /// Normalized potential of every vertex at time `t`.
    pub fn potentials(&mut self, t: f64) -> Result<BTreeMap<VertexId, f64>> {
        self.project_at(t)?;
        Ok(self.graph.vertices().map(|v| (v.id, v.potential)).collect())
    }

    /// Owned copy of the solved state, for readers that must not hold the
    /// network lock while they sample it.
    pub fn snapshot(&self) -> Result<NetworkSnapshot> {
        let branches = self
            .components
            .values()
            .map(|component| {
                let edge = self.graph.edge(component.edge)?;
                Ok(BranchSnapshot {
                    component: component.id,
                    class: component.kind.class_name(),
                    impedance: edge.impedance.clone(),
                    source_voltage: edge.source_voltage.clone(),
                    current: self.branch_current_phasors(component.id)?,
                    impedance_drop: edge.impedance_drop(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NetworkSnapshot {
            angular_frequencies: self.registry.angular_frequencies().to_vec(),
            valid: self.valid,
            drop_convention: self.config.drop_convention,
            branches,
        })
    }
}
