//! Topology editing: building and destroying components, parameter edits,
//! grab/drag/release and proximity merging.

use std::fmt;

use super::state::{ComponentNode, Network};
use crate::components::{Component, ComponentKind, ComponentSpec};
use crate::error::{NetworkError, Result};
use crate::frequency::check_angular_frequency;
use crate::graph::{ComponentId, Point, Terminal, VertexId};

/// What the pointer currently holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Grab {
    Node(ComponentNode),
    Component { id: ComponentId, anchor: Point },
}

impl fmt::Display for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = match self.terminal {
            Terminal::Input => "input",
            Terminal::Output => "output",
        };
        write!(f, "{}:{}", self.component, end)
    }
}

impl Network {
    /// Build a component's branch and attach it to the network.
    ///
    /// Terminals lying within the merge radius of existing terminals are
    /// merged into their vertices.
    pub fn add_component(&mut self, spec: ComponentSpec) -> Result<ComponentId> {
        if !spec.kind.is_grounded() && spec.input.distance(spec.output) <= self.config.merge_radius {
            return Err(NetworkError::DegenerateComponent {
                x: spec.input.x,
                y: spec.input.y,
            });
        }

        let frequencies = spec.kind.required_frequencies();
        for &omega in &frequencies {
            check_angular_frequency(omega)?;
        }

        let edge = if spec.kind.is_grounded() {
            self.graph.add_edge_with_grounded_output()
        } else {
            self.graph.add_edge()
        };
        for omega in frequencies {
            self.request_angular_frequency(omega)?;
        }

        let id = ComponentId(self.next_component);
        self.next_component += 1;
        let component = Component::new(id, spec, edge);
        let terminals = component.terminals();
        tracing::debug!(component = %id, class = component.kind.class_name(), %edge, "added component");
        self.components.insert(id, component);
        self.topology_dirty = true;

        for &terminal in terminals {
            if let Err(err) = self.try_to_merge(ComponentNode::new(id, terminal)) {
                self.remove_component(id)?;
                return Err(err);
            }
        }
        Ok(id)
    }

    /// Detach a component's branch and release its frequencies.
    ///
    /// On error the network is left untouched.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<Component> {
        let component = self.component(id)?;
        let edge = component.edge;
        let frequencies = component.kind.required_frequencies();
        self.graph.edge(edge)?;
        self.check_registered(&frequencies)?;

        self.graph.remove_edge(edge)?;
        for omega in frequencies {
            self.release_angular_frequency(omega)?;
        }
        if self.grabbed_component() == Some(id) {
            self.grab = None;
        }
        let component = self
            .components
            .remove(&id)
            .ok_or(NetworkError::UnknownComponent { component: id })?;
        self.topology_dirty = true;
        tracing::debug!(component = %id, "removed component");
        Ok(component)
    }

    /// Replace a component's parameters without touching the topology.
    ///
    /// The cached spanning forest stays valid; the next evaluation only
    /// rewrites impedances, source voltages and injected currents.
    pub fn update_component(&mut self, id: ComponentId, kind: ComponentKind) -> Result<()> {
        let old = self.component(id)?.kind;
        if old.is_grounded() != kind.is_grounded() {
            return Err(NetworkError::GroundingChange { component: id });
        }
        let requested = kind.required_frequencies();
        for &omega in &requested {
            check_angular_frequency(omega)?;
        }
        let released = old.required_frequencies();
        self.check_registered(&released)?;

        // Request first so a shared frequency keeps its slot
        for omega in requested {
            self.request_angular_frequency(omega)?;
        }
        for omega in released {
            self.release_angular_frequency(omega)?;
        }
        if let Some(component) = self.components.get_mut(&id) {
            component.kind = kind;
        }
        self.params_dirty = true;
        Ok(())
    }

    /// Every frequency in `frequencies` must currently hold a slot.
    fn check_registered(&self, frequencies: &[f64]) -> Result<()> {
        match frequencies.iter().find(|&&omega| self.frequency_slot(omega).is_none()) {
            Some(&omega) => Err(NetworkError::UnknownFrequency { omega }),
            None => Ok(()),
        }
    }

    /// Merge two graph vertices directly.
    pub fn merge_vertices(&mut self, persistent: VertexId, merge: VertexId) -> Result<VertexId> {
        let survivor = self.graph.merge_vertices(persistent, merge)?;
        if persistent != merge {
            self.topology_dirty = true;
        }
        Ok(survivor)
    }

    /// Merge a terminal with every other terminal within the merge radius.
    ///
    /// The terminal snaps onto the first match. Returns whether anything was
    /// merged. Joining both ends of one branch is refused with
    /// [`NetworkError::SelfLoopMerge`].
    pub fn try_to_merge(&mut self, node: ComponentNode) -> Result<bool> {
        let component = self.component(node.component)?;
        let pos = component.position(node.terminal);
        let own = self.graph.edge(component.edge)?;
        let here = own.endpoint(node.terminal);
        let far = own.endpoint(node.terminal.other());

        let mut targets: Vec<(VertexId, Point)> = Vec::new();
        for other in self.components.values() {
            for &terminal in other.terminals() {
                if other.id == node.component && terminal == node.terminal {
                    continue;
                }
                let at = other.position(terminal);
                if at.distance(pos) > self.config.merge_radius {
                    continue;
                }
                let vertex = self.graph.edge(other.edge)?.endpoint(terminal);
                if vertex == here || targets.iter().any(|&(v, _)| v == vertex) {
                    continue;
                }
                if vertex == far {
                    return Err(NetworkError::SelfLoopMerge {
                        component: node.component,
                    });
                }
                targets.push((vertex, at));
            }
        }
        let Some(&(first, snap)) = targets.first() else {
            return Ok(false);
        };

        // Check the whole group before touching the graph
        let group: Vec<VertexId> = std::iter::once(here)
            .chain(targets.iter().map(|&(v, _)| v))
            .collect();
        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                if self.graph.vertex(a)?.is_adjacent_to(b) {
                    return Err(NetworkError::NeighbouringMerge {
                        persistent: a,
                        merge: b,
                    });
                }
            }
        }

        let mut survivor = self.graph.merge_vertices(first, here)?;
        for &(vertex, _) in &targets[1..] {
            survivor = self.graph.merge_vertices(survivor, vertex)?;
        }
        if let Some(component) = self.components.get_mut(&node.component) {
            component.set_position(node.terminal, snap);
        }
        self.topology_dirty = true;
        tracing::trace!(%node, vertex = %survivor, merged = targets.len(), "merged terminal");
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Grab / drag / release
    // ---------------------------------------------------------------------

    fn grabbed_component(&self) -> Option<ComponentId> {
        match self.grab? {
            Grab::Node(node) => Some(node.component),
            Grab::Component { id, .. } => Some(id),
        }
    }

    /// Finish whatever grab is in progress.
    fn release_any(&mut self) -> Result<()> {
        match self.grab {
            Some(Grab::Node(node)) => self.release_component_node(node).map(|_| ()),
            Some(Grab::Component { id, .. }) => self.release_component(id).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Split a terminal off its shared vertex so it can move on its own.
    fn detach_terminal(&mut self, node: ComponentNode) -> Result<()> {
        let edge = self.component(node.component)?.edge;
        if let Some(fresh) = self.graph.disconnect_end_of_edge(edge, node.terminal)? {
            self.topology_dirty = true;
            tracing::trace!(%node, vertex = %fresh, "detached terminal");
        }
        Ok(())
    }

    /// Start dragging one terminal.
    pub fn grab_component_node(&mut self, node: ComponentNode) -> Result<()> {
        let component = self.component(node.component)?;
        if !component.terminals().contains(&node.terminal) {
            return Err(NetworkError::FixedTerminal {
                component: node.component,
            });
        }
        self.release_any()?;
        self.detach_terminal(node)?;
        self.grab = Some(Grab::Node(node));
        Ok(())
    }

    /// Move the grabbed terminal.
    pub fn drag_component_node(&mut self, node: ComponentNode, pos: Point) -> Result<()> {
        if self.grab != Some(Grab::Node(node)) {
            return Err(NetworkError::NotGrabbed {
                what: node.to_string(),
            });
        }
        let component = self
            .components
            .get_mut(&node.component)
            .ok_or(NetworkError::UnknownComponent {
                component: node.component,
            })?;
        component.set_position(node.terminal, pos);
        Ok(())
    }

    /// Drop the grabbed terminal, merging it with whatever lies under it.
    pub fn release_component_node(&mut self, node: ComponentNode) -> Result<bool> {
        if self.grab != Some(Grab::Node(node)) {
            return Err(NetworkError::NotGrabbed {
                what: node.to_string(),
            });
        }
        self.grab = None;
        self.try_to_merge(node)
    }

    /// Start dragging a whole component from `at`.
    pub fn grab_component(&mut self, id: ComponentId, at: Point) -> Result<()> {
        let terminals = self.component(id)?.terminals();
        self.release_any()?;
        for &terminal in terminals {
            self.detach_terminal(ComponentNode::new(id, terminal))?;
        }
        self.grab = Some(Grab::Component { id, anchor: at });
        Ok(())
    }

    /// Move the grabbed component so the grab point follows `to`.
    pub fn drag_component(&mut self, id: ComponentId, to: Point) -> Result<()> {
        let anchor = match self.grab {
            Some(Grab::Component { id: held, anchor }) if held == id => anchor,
            _ => return Err(NetworkError::NotGrabbed { what: id.to_string() }),
        };
        let offset = to - anchor;
        let component = self
            .components
            .get_mut(&id)
            .ok_or(NetworkError::UnknownComponent { component: id })?;
        component.input = component.input + offset;
        component.output = component.output + offset;
        self.grab = Some(Grab::Component { id, anchor: to });
        Ok(())
    }

    /// Drop the grabbed component, merging both terminals where they land.
    pub fn release_component(&mut self, id: ComponentId) -> Result<bool> {
        match self.grab {
            Some(Grab::Component { id: held, .. }) if held == id => {}
            _ => return Err(NetworkError::NotGrabbed { what: id.to_string() }),
        }
        self.grab = None;
        let terminals = self.component(id)?.terminals();
        let mut merged = false;
        for &terminal in terminals {
            merged |= self.try_to_merge(ComponentNode::new(id, terminal))?;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DcVoltageSource, Resistor, Sinusoid, Wire};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn resistor(a: Point, b: Point) -> ComponentSpec {
        ComponentSpec::new(ComponentKind::Resistor(Resistor::new(10.0)), a, b)
    }

    #[test]
    fn test_coincident_terminals_merge() {
        let mut net = Network::new();
        let a = net.add_component(resistor(p(0.0, 0.0), p(1.0, 0.0))).unwrap();
        let b = net.add_component(resistor(p(1.0, 0.0), p(2.0, 0.0))).unwrap();

        let a_out = net.node_vertex(ComponentNode::new(a, Terminal::Output)).unwrap();
        let b_in = net.node_vertex(ComponentNode::new(b, Terminal::Input)).unwrap();
        assert_eq!(a_out, b_in);
        // ground + 3 distinct vertices
        assert_eq!(net.graph().vertex_count(), 4);
    }

    #[test]
    fn test_near_terminal_snaps() {
        let mut net = Network::new();
        net.add_component(resistor(p(0.0, 0.0), p(1.0, 0.0))).unwrap();
        let b = net.add_component(resistor(p(1.1, 0.0), p(2.0, 0.0))).unwrap();
        assert_eq!(net.component(b).unwrap().input, p(1.0, 0.0));
    }

    #[test]
    fn test_degenerate_component_rejected() {
        let mut net = Network::new();
        let err = net.add_component(resistor(p(0.0, 0.0), p(0.1, 0.0)));
        assert!(matches!(err, Err(NetworkError::DegenerateComponent { .. })));
        assert_eq!(net.components().count(), 0);
    }

    #[test]
    fn test_self_loop_merge_refused() {
        let mut net = Network::new();
        let r = net.add_component(resistor(p(0.0, 0.0), p(1.0, 0.0))).unwrap();
        let output = ComponentNode::new(r, Terminal::Output);
        net.grab_component_node(output).unwrap();
        net.drag_component_node(output, p(0.05, 0.0)).unwrap();
        assert!(matches!(
            net.release_component_node(output),
            Err(NetworkError::SelfLoopMerge { .. })
        ));
    }

    #[test]
    fn test_grab_splits_shared_vertex() {
        let mut net = Network::new();
        let a = net.add_component(resistor(p(0.0, 0.0), p(1.0, 0.0))).unwrap();
        let b = net.add_component(resistor(p(1.0, 0.0), p(2.0, 0.0))).unwrap();
        net.evaluate(false).unwrap();

        let node = ComponentNode::new(b, Terminal::Input);
        net.grab_component_node(node).unwrap();
        assert!(net.is_dirty());
        let a_out = net.node_vertex(ComponentNode::new(a, Terminal::Output)).unwrap();
        let b_in = net.node_vertex(node).unwrap();
        assert_ne!(a_out, b_in);

        net.drag_component_node(node, p(1.0, 3.0)).unwrap();
        assert!(!net.release_component_node(node).unwrap());
        assert_eq!(net.component(b).unwrap().input, p(1.0, 3.0));
    }

    #[test]
    fn test_drag_requires_grab() {
        let mut net = Network::new();
        let r = net.add_component(resistor(p(0.0, 0.0), p(1.0, 0.0))).unwrap();
        assert!(matches!(
            net.drag_component(r, p(5.0, 5.0)),
            Err(NetworkError::NotGrabbed { .. })
        ));
        let node = ComponentNode::new(r, Terminal::Input);
        assert!(matches!(
            net.release_component_node(node),
            Err(NetworkError::NotGrabbed { .. })
        ));
    }

    #[test]
    fn test_drag_component_translates_both_ends() {
        let mut net = Network::new();
        let r = net.add_component(resistor(p(0.0, 0.0), p(1.0, 0.0))).unwrap();
        net.grab_component(r, p(0.5, 0.0)).unwrap();
        net.drag_component(r, p(0.5, 2.0)).unwrap();
        net.drag_component(r, p(1.5, 2.0)).unwrap();
        net.release_component(r).unwrap();
        let c = net.component(r).unwrap();
        assert_eq!(c.input, p(1.0, 2.0));
        assert_eq!(c.output, p(2.0, 2.0));
    }

    #[test]
    fn test_ground_output_is_fixed() {
        let mut net = Network::new();
        let g = net
            .add_component(ComponentSpec::new(ComponentKind::Ground, p(0.0, 0.0), p(0.0, 1.0)))
            .unwrap();
        assert_eq!(
            net.node_vertex(ComponentNode::new(g, Terminal::Output)).unwrap(),
            VertexId::GROUND
        );
        assert!(matches!(
            net.grab_component_node(ComponentNode::new(g, Terminal::Output)),
            Err(NetworkError::FixedTerminal { .. })
        ));
    }

    #[test]
    fn test_remove_component_releases_frequencies() {
        let mut net = Network::new();
        let ac = ComponentKind::AcVoltageSource(Sinusoid::new(1.0, 50.0, 0.0));
        let a = net.add_component(ComponentSpec::new(ac, p(0.0, 0.0), p(0.0, 1.0))).unwrap();
        let b = net.add_component(ComponentSpec::new(ac, p(5.0, 0.0), p(5.0, 1.0))).unwrap();
        assert_eq!(net.simulated_angular_frequencies(), &[0.0, 50.0]);
        assert_eq!(net.frequency_refcount(1), Some(2));

        net.remove_component(a).unwrap();
        assert_eq!(net.frequency_refcount(1), Some(1));
        net.remove_component(b).unwrap();
        assert_eq!(net.simulated_angular_frequencies(), &[0.0]);
        // Only ground is left
        assert_eq!(net.graph().vertex_count(), 1);
        assert!(matches!(
            net.remove_component(b),
            Err(NetworkError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn test_update_component_keeps_topology() {
        let mut net = Network::new();
        let src = net
            .add_component(ComponentSpec::new(
                ComponentKind::DcVoltageSource(DcVoltageSource::new(10.0)),
                p(0.0, 0.0),
                p(0.0, 1.0),
            ))
            .unwrap();
        let r = net.add_component(resistor(p(0.0, 1.0), p(1.0, 1.0))).unwrap();
        net.add_component(ComponentSpec::new(ComponentKind::Wire(Wire), p(1.0, 1.0), p(0.0, 0.0)))
            .unwrap();
        net.evaluate(false).unwrap();
        let rebuilds = net.stats().rebuilds;

        net.update_component(r, ComponentKind::Resistor(Resistor::new(5.0))).unwrap();
        assert!(net.is_dirty());
        net.evaluate(false).unwrap();
        assert_eq!(net.stats().rebuilds, rebuilds);
        assert!((net.branch_current(src, 0.0).unwrap() - 2.0).abs() < 1e-9);

        assert!(matches!(
            net.update_component(r, ComponentKind::Ground),
            Err(NetworkError::GroundingChange { .. })
        ));
    }

    #[test]
    fn test_invalid_frequency_leaves_network_untouched() {
        let mut net = Network::new();
        for omega in [-50.0, f64::NAN] {
            let ac = ComponentKind::AcVoltageSource(Sinusoid::new(1.0, omega, 0.0));
            assert!(matches!(
                net.add_component(ComponentSpec::new(ac, p(0.0, 0.0), p(0.0, 1.0))),
                Err(NetworkError::InvalidFrequency { .. })
            ));
        }
        assert!(matches!(
            net.request_angular_frequency(-50.0),
            Err(NetworkError::InvalidFrequency { .. })
        ));
        assert_eq!(net.components().count(), 0);
        assert_eq!(net.graph().edge_count(), 0);
        assert_eq!(net.simulated_angular_frequencies(), &[0.0]);

        let ac = ComponentKind::AcVoltageSource(Sinusoid::new(1.0, 50.0, 0.0));
        let a = net.add_component(ComponentSpec::new(ac, p(0.0, 0.0), p(0.0, 1.0))).unwrap();
        let negative = ComponentKind::AcVoltageSource(Sinusoid::new(1.0, -50.0, 0.0));
        assert!(net.update_component(a, negative).is_err());
        assert_eq!(net.component(a).unwrap().kind, ac);
        assert_eq!(net.simulated_angular_frequencies(), &[0.0, 50.0]);
        assert_eq!(net.frequency_refcount(1), Some(1));
    }

    #[test]
    fn test_failed_remove_keeps_component() {
        let mut net = Network::new();
        let ac = ComponentKind::AcVoltageSource(Sinusoid::new(1.0, 50.0, 0.0));
        let a = net.add_component(ComponentSpec::new(ac, p(0.0, 0.0), p(0.0, 1.0))).unwrap();

        // Steal the source's only hold on its slot
        net.release_angular_frequency(50.0).unwrap();
        assert!(matches!(
            net.remove_component(a),
            Err(NetworkError::UnknownFrequency { .. })
        ));
        assert!(net.component(a).is_ok());
        assert_eq!(net.graph().edge_count(), 1);

        net.request_angular_frequency(50.0).unwrap();
        net.remove_component(a).unwrap();
        assert_eq!(net.graph().edge_count(), 0);
        assert_eq!(net.simulated_angular_frequencies(), &[0.0]);
    }

    #[test]
    fn test_exact_frequency_matching_round_trips() {
        let mut net = Network::with_config(
            crate::network::NetworkConfig::new().with_frequency_epsilon(0.0),
        );
        let ac = ComponentKind::AcVoltageSource(Sinusoid::new(1.0, 50.0, 0.0));
        let a = net.add_component(ComponentSpec::new(ac, p(0.0, 0.0), p(0.0, 1.0))).unwrap();
        net.remove_component(a).unwrap();
        assert_eq!(net.components().count(), 0);
        assert_eq!(net.graph().edge_count(), 0);
    }
}
