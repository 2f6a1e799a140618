//! Core netlist data structures.
//!
//! Defines the mutable placement state plus topology: nodes (cells and
//! terminals with live positions), edges (nets), and pins (node/edge
//! connections with center-relative offsets). The [`Network`] owns all
//! three in pre-sized arenas and is the central data structure the
//! legalizer and optimizer mutate in place.

use crate::ids::{EdgeId, NodeId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_arch::RegionId;
use strata_common::{InternalError, Orientation, OrientationSet, RailPower, StrataResult};

/// The default edge-type tag; carries no extra spacing rule.
pub const DEFAULT_EDGE_TYPE: u16 = 0;

/// What a node represents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// A placeable standard cell.
    Cell,
    /// A fixed boundary terminal; occupies no row but anchors pins.
    Terminal,
}

/// A node in the network: a cell or terminal with live placement state.
///
/// The position `(x, y)` is the node's bottom-left corner in database
/// units; after legalization `y` equals a row bottom and `x` lies on that
/// row's site grid. `(orig_x, orig_y)` preserves the pre-optimization
/// position for displacement accounting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// The unique ID of this node (always equals its storage index).
    pub id: NodeId,
    /// Human-readable instance name.
    pub name: String,
    /// Whether this is a cell or terminal.
    pub kind: NodeKind,
    /// Fixed nodes are never moved but still occupy space.
    pub is_fixed: bool,
    /// X coordinate of the left edge.
    pub x: i64,
    /// Y coordinate of the bottom edge.
    pub y: i64,
    /// Cell width.
    pub width: i64,
    /// Cell height.
    pub height: i64,
    /// Current orientation.
    pub orient: Orientation,
    /// Orientations this node is legally allowed to take.
    pub avail_orients: OrientationSet,
    /// Edge-type tag on the left side (inter-cell spacing rules).
    pub edge_type_left: u16,
    /// Edge-type tag on the right side.
    pub edge_type_right: u16,
    /// Power rail requirement at the top edge, in the `N` orientation.
    pub power_top: RailPower,
    /// Power rail requirement at the bottom edge, in the `N` orientation.
    pub power_bot: RailPower,
    /// The region this node is restricted to (0 = whole die).
    pub region: RegionId,
    /// Extra mandatory spacing on the left, in length units.
    pub pad_left: i64,
    /// Extra mandatory spacing on the right.
    pub pad_right: i64,
    /// Original x position (pre-optimization).
    pub orig_x: i64,
    /// Original y position.
    pub orig_y: i64,
    /// Pins attached to this node.
    pub pins: Vec<PinId>,
}

impl Node {
    fn placeholder(id: NodeId) -> Self {
        Self {
            id,
            name: String::new(),
            kind: NodeKind::Cell,
            is_fixed: false,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            orient: Orientation::North,
            avail_orients: OrientationSet::only(Orientation::North),
            edge_type_left: DEFAULT_EDGE_TYPE,
            edge_type_right: DEFAULT_EDGE_TYPE,
            power_top: RailPower::Unknown,
            power_bot: RailPower::Unknown,
            region: RegionId::DEFAULT,
            pad_left: 0,
            pad_right: 0,
            orig_x: 0,
            orig_y: 0,
            pins: Vec::new(),
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// X coordinate of the cell center, as a float (widths may be odd).
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 * 0.5
    }

    /// Y coordinate of the cell center.
    pub fn center_y(&self) -> f64 {
        self.y as f64 + self.height as f64 * 0.5
    }

    /// The top/bottom rail requirements presented under `orient`.
    ///
    /// Orientations that flip the cell vertically exchange the two rails.
    pub fn rails_under(&self, orient: Orientation) -> (RailPower, RailPower) {
        if orient.flips_vertically() {
            (self.power_bot, self.power_top)
        } else {
            (self.power_top, self.power_bot)
        }
    }
}

/// An edge (net) connecting a collection of pins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    /// The unique ID of this edge (always equals its storage index).
    pub id: EdgeId,
    /// Human-readable net name.
    pub name: String,
    /// Pins on this edge, in insertion order.
    pub pins: Vec<PinId>,
}

impl Edge {
    fn placeholder(id: EdgeId) -> Self {
        Self {
            id,
            name: String::new(),
            pins: Vec::new(),
        }
    }
}

/// A pin linking a node to an edge.
///
/// The offset is measured from the node's center (not its corner) and may
/// be half-integral, so it is kept as `f64`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pin {
    /// The unique ID of this pin (always equals its storage index).
    pub id: PinId,
    /// The node this pin belongs to.
    pub node: NodeId,
    /// The edge this pin belongs to.
    pub edge: EdgeId,
    /// X offset from the node center.
    pub offset_x: f64,
    /// Y offset from the node center.
    pub offset_y: f64,
    /// Pin shape width.
    pub width: f64,
    /// Pin shape height.
    pub height: f64,
}

/// The netlist: all nodes, edges, and pins, with name lookup.
///
/// Containers are pre-sized via [`resize_nodes`](Self::resize_nodes) /
/// [`resize_edges`](Self::resize_edges) since counts are known before
/// population. The model performs no geometric validation; it is a passive
/// graph and attribute store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    /// All nodes.
    pub nodes: Vec<Node>,
    /// All edges.
    pub edges: Vec<Edge>,
    /// All pins.
    pub pins: Vec<Pin>,
    /// Auxiliary index: node name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub node_by_name: HashMap<String, NodeId>,
    /// Auxiliary index: edge name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub edge_by_name: HashMap<String, EdgeId>,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            pins: Vec::new(),
            node_by_name: HashMap::new(),
            edge_by_name: HashMap::new(),
        }
    }

    /// Pre-allocates `n` placeholder nodes with dense ids.
    pub fn resize_nodes(&mut self, n: usize) {
        self.nodes = (0..n)
            .map(|i| Node::placeholder(NodeId::from_raw(i as u32)))
            .collect();
    }

    /// Pre-allocates `n` placeholder edges with dense ids.
    pub fn resize_edges(&mut self, n: usize) {
        self.edges = (0..n)
            .map(|i| Edge::placeholder(EdgeId::from_raw(i as u32)))
            .collect();
    }

    /// Creates a new pin linking `node` and `edge`, appending it to both
    /// pin lists, and returns its ID.
    pub fn create_and_add_pin(&mut self, node: NodeId, edge: EdgeId) -> PinId {
        let id = PinId::from_raw(self.pins.len() as u32);
        self.pins.push(Pin {
            id,
            node,
            edge,
            offset_x: 0.0,
            offset_y: 0.0,
            width: 0.0,
            height: 0.0,
        });
        self.nodes[node.as_raw() as usize].pins.push(id);
        self.edges[edge.as_raw() as usize].pins.push(id);
        id
    }

    /// Names a node and records it in the name index.
    pub fn set_node_name(&mut self, id: NodeId, name: impl Into<String>) {
        let name = name.into();
        self.node_by_name.insert(name.clone(), id);
        self.nodes[id.as_raw() as usize].name = name;
    }

    /// Names an edge and records it in the name index.
    pub fn set_edge_name(&mut self, id: EdgeId, name: impl Into<String>) {
        let name = name.into();
        self.edge_by_name.insert(name.clone(), id);
        self.edges[id.as_raw() as usize].name = name;
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the node with the given ID.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.as_raw() as usize]
    }

    /// Returns the edge with the given ID.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.as_raw() as usize]
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the pin with the given ID.
    pub fn pin_mut(&mut self, id: PinId) -> &mut Pin {
        &mut self.pins[id.as_raw() as usize]
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of pins.
    pub fn num_pins(&self) -> usize {
        self.pins.len()
    }

    /// Returns the distinct edges incident to a node, in first-seen order.
    pub fn edges_of_node(&self, id: NodeId) -> Vec<EdgeId> {
        let node = self.node(id);
        let mut edges = Vec::with_capacity(node.pins.len());
        for &pin in &node.pins {
            let edge = self.pin(pin).edge;
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
        edges
    }

    /// Rebuilds the name indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.node_by_name.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            if !node.name.is_empty() {
                self.node_by_name
                    .insert(node.name.clone(), NodeId::from_raw(i as u32));
            }
        }
        self.edge_by_name.clear();
        for (i, edge) in self.edges.iter().enumerate() {
            if !edge.name.is_empty() {
                self.edge_by_name
                    .insert(edge.name.clone(), EdgeId::from_raw(i as u32));
            }
        }
    }

    /// Checks internal consistency: every id equals its storage index and
    /// every pin is back-linked by its node and edge.
    ///
    /// Any divergence is a bug in the import/build step and aborts the run.
    pub fn validate(&self) -> StrataResult<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            if node.id.as_raw() as usize != i {
                return Err(InternalError::new(format!(
                    "node at index {i} has id {}",
                    node.id
                )));
            }
        }
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.id.as_raw() as usize != i {
                return Err(InternalError::new(format!(
                    "edge at index {i} has id {}",
                    edge.id
                )));
            }
        }
        for (i, pin) in self.pins.iter().enumerate() {
            if pin.id.as_raw() as usize != i {
                return Err(InternalError::new(format!(
                    "pin at index {i} has id {}",
                    pin.id
                )));
            }
            if pin.node.as_raw() as usize >= self.nodes.len()
                || pin.edge.as_raw() as usize >= self.edges.len()
            {
                return Err(InternalError::new(format!(
                    "pin {} references node {} / edge {} out of range",
                    pin.id, pin.node, pin.edge
                )));
            }
            if !self.node(pin.node).pins.contains(&pin.id) {
                return Err(InternalError::new(format!(
                    "pin {} is not back-linked by node {}",
                    pin.id, pin.node
                )));
            }
            if !self.edge(pin.edge).pins.contains(&pin.id) {
                return Err(InternalError::new(format!(
                    "pin {} is not back-linked by edge {}",
                    pin.id, pin.edge
                )));
            }
        }
        Ok(())
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_network() -> Network {
        let mut net = Network::new();
        net.resize_nodes(2);
        net.resize_edges(1);
        net.set_node_name(NodeId::from_raw(0), "u1");
        net.set_node_name(NodeId::from_raw(1), "u2");
        net.set_edge_name(EdgeId::from_raw(0), "n1");
        net.create_and_add_pin(NodeId::from_raw(0), EdgeId::from_raw(0));
        net.create_and_add_pin(NodeId::from_raw(1), EdgeId::from_raw(0));
        net
    }

    #[test]
    fn empty_network() {
        let net = Network::new();
        assert_eq!(net.num_nodes(), 0);
        assert_eq!(net.num_edges(), 0);
        assert_eq!(net.num_pins(), 0);
        assert!(net.validate().is_ok());
    }

    #[test]
    fn resize_assigns_dense_ids() {
        let mut net = Network::new();
        net.resize_nodes(3);
        net.resize_edges(2);
        for (i, node) in net.nodes.iter().enumerate() {
            assert_eq!(node.id.as_raw() as usize, i);
        }
        for (i, edge) in net.edges.iter().enumerate() {
            assert_eq!(edge.id.as_raw() as usize, i);
        }
        assert!(net.validate().is_ok());
    }

    #[test]
    fn create_pin_links_both_directions() {
        let net = two_node_network();
        assert_eq!(net.num_pins(), 2);
        assert_eq!(net.node(NodeId::from_raw(0)).pins.len(), 1);
        assert_eq!(net.edge(EdgeId::from_raw(0)).pins.len(), 2);
        let pin = net.pin(PinId::from_raw(0));
        assert_eq!(pin.node, NodeId::from_raw(0));
        assert_eq!(pin.edge, EdgeId::from_raw(0));
        assert!(net.validate().is_ok());
    }

    #[test]
    fn name_lookup() {
        let net = two_node_network();
        assert_eq!(net.node_by_name.get("u2"), Some(&NodeId::from_raw(1)));
        assert_eq!(net.edge_by_name.get("n1"), Some(&EdgeId::from_raw(0)));
        assert!(net.node_by_name.get("u9").is_none());
    }

    #[test]
    fn edges_of_node_deduplicates() {
        let mut net = Network::new();
        net.resize_nodes(1);
        net.resize_edges(2);
        // Two pins on the same edge plus one on another.
        net.create_and_add_pin(NodeId::from_raw(0), EdgeId::from_raw(0));
        net.create_and_add_pin(NodeId::from_raw(0), EdgeId::from_raw(0));
        net.create_and_add_pin(NodeId::from_raw(0), EdgeId::from_raw(1));
        let edges = net.edges_of_node(NodeId::from_raw(0));
        assert_eq!(edges, vec![EdgeId::from_raw(0), EdgeId::from_raw(1)]);
    }

    #[test]
    fn validate_detects_id_divergence() {
        let mut net = two_node_network();
        net.nodes[1].id = NodeId::from_raw(7);
        assert!(net.validate().is_err());
    }

    #[test]
    fn validate_detects_broken_backlink() {
        let mut net = two_node_network();
        net.nodes[0].pins.clear();
        assert!(net.validate().is_err());
    }

    #[test]
    fn rails_under_orientation() {
        let mut net = Network::new();
        net.resize_nodes(1);
        let node = net.node_mut(NodeId::from_raw(0));
        node.power_top = RailPower::Vdd;
        node.power_bot = RailPower::Vss;
        assert_eq!(
            node.rails_under(Orientation::North),
            (RailPower::Vdd, RailPower::Vss)
        );
        assert_eq!(
            node.rails_under(Orientation::FlippedSouth),
            (RailPower::Vss, RailPower::Vdd)
        );
        assert_eq!(
            node.rails_under(Orientation::FlippedNorth),
            (RailPower::Vdd, RailPower::Vss)
        );
    }

    #[test]
    fn geometry_helpers() {
        let mut net = Network::new();
        net.resize_nodes(1);
        let node = net.node_mut(NodeId::from_raw(0));
        node.x = 10;
        node.y = 20;
        node.width = 5;
        node.height = 10;
        assert_eq!(node.right(), 15);
        assert_eq!(node.center_x(), 12.5);
        assert_eq!(node.center_y(), 25.0);
    }

    #[test]
    fn serde_roundtrip_rebuilds_names() {
        let net = two_node_network();
        let json = serde_json::to_string(&net).unwrap();
        let mut restored: Network = serde_json::from_str(&json).unwrap();
        assert!(restored.node_by_name.is_empty());
        restored.rebuild_indices();
        assert_eq!(restored.node_by_name.get("u1"), Some(&NodeId::from_raw(0)));
        assert_eq!(restored.num_pins(), 2);
        assert!(restored.validate().is_ok());
    }
}
