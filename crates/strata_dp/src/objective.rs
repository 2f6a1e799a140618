//! Placement objective functions.
//!
//! Half-perimeter wirelength (HPWL) is the objective every optimization
//! pass works against: the bounding-box half-perimeter of each edge's pin
//! positions, summed over all edges. Pin positions are the owning node's
//! center plus the pin's center-relative offset, so HPWL responds to both
//! relocation and orientation-free center shifts.

use strata_netlist::{EdgeId, Network};

/// Computes the HPWL of a single edge.
///
/// Edges with fewer than two pins contribute zero.
pub fn edge_hpwl(network: &Network, edge: EdgeId) -> f64 {
    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;

    let pins = &network.edge(edge).pins;
    if pins.len() < 2 {
        return 0.0;
    }
    for &pin_id in pins {
        let pin = network.pin(pin_id);
        let node = network.node(pin.node);
        let x = node.center_x() + pin.offset_x;
        let y = node.center_y() + pin.offset_y;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    (max_x - min_x) + (max_y - min_y)
}

/// Computes the total HPWL across all edges.
pub fn total_hpwl(network: &Network) -> f64 {
    let mut total = 0.0;
    for i in 0..network.num_edges() {
        total += edge_hpwl(network, EdgeId::from_raw(i as u32));
    }
    total
}

/// Computes the summed HPWL of the given edges.
///
/// Used for incremental objective maintenance: only the edges incident to
/// a moved node need re-evaluation.
pub fn hpwl_of_edges(network: &Network, edges: &[EdgeId]) -> f64 {
    edges.iter().map(|&e| edge_hpwl(network, e)).sum()
}

/// Computes the total displacement of all free cells from their original
/// (pre-optimization) positions, in database units.
pub fn total_displacement(network: &Network) -> i64 {
    network
        .nodes
        .iter()
        .filter(|n| !n.is_fixed)
        .map(|n| (n.x - n.orig_x).abs() + (n.y - n.orig_y).abs())
        .sum()
}
