//! The placement manager: authoritative live state during optimization.
//!
//! Maintains, per row, the ordered sequence of currently-assigned cells
//! (the row's *segment*), a per-node slot index for O(1) neighbor queries,
//! per-row obstacle intervals from fixed cells, and the running HPWL
//! objective maintained incrementally as moves are applied.
//!
//! All optimization passes go through the same discipline: check a
//! candidate with [`propose_move`](PlacementManager::propose_move) or
//! [`propose_swap`](PlacementManager::propose_swap), apply it only when
//! feasible, and revert it if the objective does not improve. A rejected
//! proposal is the normal mechanism for discarding candidates, not an
//! error.

use crate::objective;
use strata_arch::{Architecture, RowId};
use strata_common::Orientation;
use strata_netlist::{Network, NodeId, NodeKind};

/// Acceptance slack for floating-point objective comparisons.
pub(crate) const EPS: f64 = 1e-9;

/// A node's position within a row segment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SlotRef {
    /// The row the node sits in.
    pub row: RowId,
    /// The node's index within the row's segment.
    pub index: usize,
}

/// The outcome of a feasibility check.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveCheck {
    /// The candidate satisfies every placement invariant.
    Feasible,
    /// The candidate violates an invariant and must not be applied.
    Infeasible(InfeasibleReason),
}

impl MoveCheck {
    /// Returns `true` for [`MoveCheck::Feasible`].
    pub fn is_feasible(&self) -> bool {
        matches!(self, MoveCheck::Feasible)
    }
}

/// Why a candidate move was rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InfeasibleReason {
    /// The node is fixed and may never move.
    FixedNode,
    /// The node is not currently placed (swap partners must be).
    Unplaced,
    /// Both swap endpoints are the same node.
    SameNode,
    /// The node's height does not match the row height.
    HeightMismatch,
    /// The target x is not on the row's site grid.
    OffGrid,
    /// The footprint extends past the row's clipped extent.
    OutsideRow,
    /// The footprint leaves the node's assigned region.
    OutsideRegion,
    /// The requested orientation is not in the node's allowed set.
    OrientationNotAllowed,
    /// No allowed orientation matches the row's power rails.
    RailMismatch,
    /// The padded footprint overlaps a neighbor or fixed obstacle.
    Overlap,
}

/// An applied single-cell move, sufficient to revert it.
#[derive(Clone, Copy, Debug)]
pub struct AppliedMove {
    /// The moved node.
    pub node: NodeId,
    /// The row the node came from (`None` if it was unplaced).
    pub old_row: Option<RowId>,
    old_x: i64,
    old_y: i64,
    old_orient: Orientation,
    /// The change in total HPWL caused by this move.
    pub hpwl_delta: f64,
}

/// An applied pairwise swap, sufficient to revert it.
#[derive(Clone, Copy, Debug)]
pub struct AppliedSwap {
    first: AppliedMove,
    second: AppliedMove,
}

impl AppliedSwap {
    /// The change in total HPWL caused by the swap.
    pub fn hpwl_delta(&self) -> f64 {
        self.first.hpwl_delta + self.second.hpwl_delta
    }
}

/// A full checkpoint of the manager's mutable state.
///
/// Cloned eagerly; cheap at detailed-placement scale and trivially atomic
/// to restore.
pub struct Snapshot {
    xs: Vec<i64>,
    ys: Vec<i64>,
    orients: Vec<Orientation>,
    segments: Vec<Vec<NodeId>>,
    slots: Vec<Option<SlotRef>>,
    hpwl: f64,
}

/// The authoritative live placement state during optimization.
pub struct PlacementManager<'a> {
    arch: &'a Architecture,
    network: &'a mut Network,
    segments: Vec<Vec<NodeId>>,
    slots: Vec<Option<SlotRef>>,
    obstacles: Vec<Vec<(i64, i64)>>,
    hpwl: f64,
}

impl<'a> PlacementManager<'a> {
    /// Creates a manager over the given architecture and network.
    ///
    /// Segments start empty (the legalizer populates them); fixed cells
    /// are converted to per-row obstacle intervals; the HPWL objective is
    /// computed from the initial positions.
    pub fn new(arch: &'a Architecture, network: &'a mut Network) -> Self {
        let num_rows = arch.num_rows();
        let num_nodes = network.num_nodes();

        let mut obstacles: Vec<Vec<(i64, i64)>> = vec![Vec::new(); num_rows];
        for node in &network.nodes {
            if !node.is_fixed || node.width <= 0 {
                continue;
            }
            let interval = (node.x - node.pad_left, node.right() + node.pad_right);
            for (r, row) in arch.rows.iter().enumerate() {
                if node.y < row.top() && node.y + node.height > row.bottom {
                    obstacles[r].push(interval);
                }
            }
        }
        for list in &mut obstacles {
            list.sort_unstable();
        }

        let hpwl = objective::total_hpwl(network);
        Self {
            arch,
            network,
            segments: vec![Vec::new(); num_rows],
            slots: vec![None; num_nodes],
            obstacles,
            hpwl,
        }
    }

    /// The architecture this manager places against.
    pub fn arch(&self) -> &Architecture {
        self.arch
    }

    /// The network being placed.
    pub fn network(&self) -> &Network {
        self.network
    }

    /// The current total HPWL objective.
    pub fn hpwl(&self) -> f64 {
        self.hpwl
    }

    /// Recomputes the objective from scratch, clearing accumulated
    /// floating-point drift.
    pub fn recompute_hpwl(&mut self) {
        self.hpwl = objective::total_hpwl(self.network);
    }

    /// Returns the ordered segment of the given row.
    pub fn segment(&self, row: RowId) -> &[NodeId] {
        &self.segments[row.as_raw() as usize]
    }

    /// Returns the fixed-obstacle intervals of the given row (padded,
    /// sorted by start).
    pub fn obstacles(&self, row: RowId) -> &[(i64, i64)] {
        &self.obstacles[row.as_raw() as usize]
    }

    /// Returns the node's current slot, if it is placed in a segment.
    pub fn slot_of(&self, node: NodeId) -> Option<SlotRef> {
        self.slots[node.as_raw() as usize]
    }

    /// Returns the row the node currently sits in, if placed.
    pub fn row_of(&self, node: NodeId) -> Option<RowId> {
        self.slot_of(node).map(|s| s.row)
    }

    /// Returns the placed free cells, the population every pass works on.
    pub fn movable_nodes(&self) -> Vec<NodeId> {
        self.network
            .nodes
            .iter()
            .filter(|n| {
                !n.is_fixed
                    && n.kind == NodeKind::Cell
                    && self.slots[n.id.as_raw() as usize].is_some()
            })
            .map(|n| n.id)
            .collect()
    }

    /// Returns the left and right neighbors of a placed node in O(1).
    pub fn neighbors(&self, node: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        match self.slot_of(node) {
            None => (None, None),
            Some(slot) => {
                let seg = &self.segments[slot.row.as_raw() as usize];
                let left = if slot.index > 0 {
                    Some(seg[slot.index - 1])
                } else {
                    None
                };
                let right = seg.get(slot.index + 1).copied();
                (left, right)
            }
        }
    }

    /// Picks an orientation for `node` in `row`: the current orientation
    /// if it is allowed and rail-compatible, otherwise the first allowed
    /// orientation whose rails match. `None` if no allowed orientation
    /// satisfies the rails.
    pub fn choose_orientation(&self, node: NodeId, row: RowId) -> Option<Orientation> {
        let nd = self.network.node(node);
        let rw = self.arch.row(row);
        let current = nd.orient;
        if nd.avail_orients.allows(current) {
            let (top, bot) = nd.rails_under(current);
            if rw.rails_match(top, bot) {
                return Some(current);
            }
        }
        nd.avail_orients.iter().find(|&o| {
            let (top, bot) = nd.rails_under(o);
            rw.rails_match(top, bot)
        })
    }

    /// Checks whether moving `node` to `(row, x, orient)` preserves every
    /// placement invariant. Does not mutate state.
    pub fn propose_move(&self, node: NodeId, row: RowId, x: i64, orient: Orientation) -> MoveCheck {
        self.check_move(node, row, x, orient, &[])
    }

    pub(crate) fn check_move(
        &self,
        node: NodeId,
        row: RowId,
        x: i64,
        orient: Orientation,
        exclude: &[NodeId],
    ) -> MoveCheck {
        let nd = self.network.node(node);
        if nd.is_fixed {
            return MoveCheck::Infeasible(InfeasibleReason::FixedNode);
        }
        let rw = self.arch.row(row);
        if nd.height != rw.height {
            return MoveCheck::Infeasible(InfeasibleReason::HeightMismatch);
        }
        if !nd.avail_orients.allows(orient) {
            return MoveCheck::Infeasible(InfeasibleReason::OrientationNotAllowed);
        }
        let (top, bot) = nd.rails_under(orient);
        if !rw.rails_match(top, bot) {
            return MoveCheck::Infeasible(InfeasibleReason::RailMismatch);
        }
        if !rw.on_site_grid(x) {
            return MoveCheck::Infeasible(InfeasibleReason::OffGrid);
        }
        if x + nd.width > rw.right() {
            return MoveCheck::Infeasible(InfeasibleReason::OutsideRow);
        }
        let region = self.arch.region(nd.region);
        if !region.contains_footprint(x, rw.bottom, nd.width, nd.height) {
            return MoveCheck::Infeasible(InfeasibleReason::OutsideRegion);
        }

        let lo = x - nd.pad_left;
        let hi = x + nd.width + nd.pad_right;
        for &(olo, ohi) in &self.obstacles[row.as_raw() as usize] {
            if lo < ohi && olo < hi {
                return MoveCheck::Infeasible(InfeasibleReason::Overlap);
            }
        }

        // Neighbor overlap against the target row's segment, skipping the
        // node itself and any explicitly excluded nodes.
        let seg = &self.segments[row.as_raw() as usize];
        let pos = seg.partition_point(|&m| self.network.node(m).x < x);
        let skipped = |m: NodeId| m == node || exclude.contains(&m);
        for i in (0..pos).rev() {
            let m = seg[i];
            if skipped(m) {
                continue;
            }
            let other = self.network.node(m);
            if other.right() + other.pad_right > lo {
                return MoveCheck::Infeasible(InfeasibleReason::Overlap);
            }
            break;
        }
        for &m in &seg[pos..] {
            if skipped(m) {
                continue;
            }
            let other = self.network.node(m);
            if other.x - other.pad_left < hi {
                return MoveCheck::Infeasible(InfeasibleReason::Overlap);
            }
            break;
        }

        MoveCheck::Feasible
    }

    /// Checks whether `a` and `b` can exchange slots: each node must be
    /// legal in the other's position under some allowed orientation.
    pub fn propose_swap(&self, a: NodeId, b: NodeId) -> MoveCheck {
        if a == b {
            return MoveCheck::Infeasible(InfeasibleReason::SameNode);
        }
        if self.network.node(a).is_fixed || self.network.node(b).is_fixed {
            return MoveCheck::Infeasible(InfeasibleReason::FixedNode);
        }
        let (slot_a, slot_b) = match (self.slot_of(a), self.slot_of(b)) {
            (Some(sa), Some(sb)) => (sa, sb),
            _ => return MoveCheck::Infeasible(InfeasibleReason::Unplaced),
        };
        let xa = self.network.node(a).x;
        let xb = self.network.node(b).x;

        let orient_a = match self.choose_orientation(a, slot_b.row) {
            Some(o) => o,
            None => return MoveCheck::Infeasible(InfeasibleReason::RailMismatch),
        };
        let orient_b = match self.choose_orientation(b, slot_a.row) {
            Some(o) => o,
            None => return MoveCheck::Infeasible(InfeasibleReason::RailMismatch),
        };

        // The exclusion below hides `a` and `b` from each other's neighbor
        // scan, so their exchanged padded footprints must be checked against
        // one another here. Equal-width neighbors trade disjoint intervals
        // and pass; unequal widths can collide.
        if slot_a.row == slot_b.row {
            let na = self.network.node(a);
            let nb = self.network.node(b);
            if xb - na.pad_left < xa + nb.width + nb.pad_right
                && xa - nb.pad_left < xb + na.width + na.pad_right
            {
                return MoveCheck::Infeasible(InfeasibleReason::Overlap);
            }
        }

        let exclude = [a, b];
        let check = self.check_move(a, slot_b.row, xb, orient_a, &exclude);
        if !check.is_feasible() {
            return check;
        }
        self.check_move(b, slot_a.row, xa, orient_b, &exclude)
    }

    /// Applies a move that has already been checked feasible.
    ///
    /// Mutates the node, the row segments, and the incremental objective.
    /// Returns an [`AppliedMove`] that can be passed to
    /// [`revert_move`](Self::revert_move).
    pub fn apply_move(
        &mut self,
        node: NodeId,
        row: RowId,
        x: i64,
        orient: Orientation,
    ) -> AppliedMove {
        let edges = self.network.edges_of_node(node);
        let before = objective::hpwl_of_edges(self.network, &edges);

        let old_row = self.row_of(node);
        let (old_x, old_y, old_orient) = {
            let nd = self.network.node(node);
            (nd.x, nd.y, nd.orient)
        };
        if old_row.is_some() {
            self.remove_from_segment(node);
        }
        {
            let bottom = self.arch.row(row).bottom;
            let nd = self.network.node_mut(node);
            nd.x = x;
            nd.y = bottom;
            nd.orient = orient;
        }
        self.insert_into_segment(row, node);

        let after = objective::hpwl_of_edges(self.network, &edges);
        let delta = after - before;
        self.hpwl += delta;
        AppliedMove {
            node,
            old_row,
            old_x,
            old_y,
            old_orient,
            hpwl_delta: delta,
        }
    }

    /// Reverts an applied move, restoring position, orientation, segment
    /// membership, and the objective.
    pub fn revert_move(&mut self, mv: AppliedMove) {
        let edges = self.network.edges_of_node(mv.node);
        let before = objective::hpwl_of_edges(self.network, &edges);

        self.remove_from_segment(mv.node);
        {
            let nd = self.network.node_mut(mv.node);
            nd.x = mv.old_x;
            nd.y = mv.old_y;
            nd.orient = mv.old_orient;
        }
        if let Some(row) = mv.old_row {
            self.insert_into_segment(row, mv.node);
        }

        let after = objective::hpwl_of_edges(self.network, &edges);
        self.hpwl += after - before;
    }

    /// Applies a swap that has already been checked by
    /// [`propose_swap`](Self::propose_swap).
    pub fn apply_swap(&mut self, a: NodeId, b: NodeId) -> AppliedSwap {
        let slot_a = self.slot_of(a).expect("swap endpoint must be placed");
        let slot_b = self.slot_of(b).expect("swap endpoint must be placed");
        let xa = self.network.node(a).x;
        let xb = self.network.node(b).x;
        let orient_a = self
            .choose_orientation(a, slot_b.row)
            .unwrap_or(self.network.node(a).orient);
        let orient_b = self
            .choose_orientation(b, slot_a.row)
            .unwrap_or(self.network.node(b).orient);

        let first = self.apply_move(a, slot_b.row, xb, orient_a);
        let second = self.apply_move(b, slot_a.row, xa, orient_b);
        AppliedSwap { first, second }
    }

    /// Reverts an applied swap.
    pub fn revert_swap(&mut self, sw: AppliedSwap) {
        self.revert_move(sw.second);
        self.revert_move(sw.first);
    }

    /// Checks and, when feasible, applies a swap in one call.
    ///
    /// The returned [`MoveCheck`] tells the caller whether anything
    /// happened; an infeasible result leaves the state untouched and is
    /// not an error.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> MoveCheck {
        let check = self.propose_swap(a, b);
        if check.is_feasible() {
            self.apply_swap(a, b);
        }
        check
    }

    /// Removes a placed node from its segment, leaving its coordinates
    /// untouched. Used by passes that rebuild a window of a segment.
    pub(crate) fn detach(&mut self, node: NodeId) {
        self.remove_from_segment(node);
    }

    /// Takes a checkpoint of all mutable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            xs: self.network.nodes.iter().map(|n| n.x).collect(),
            ys: self.network.nodes.iter().map(|n| n.y).collect(),
            orients: self.network.nodes.iter().map(|n| n.orient).collect(),
            segments: self.segments.clone(),
            slots: self.slots.clone(),
            hpwl: self.hpwl,
        }
    }

    /// Restores a checkpoint atomically, discarding every move applied
    /// since it was taken.
    pub fn rollback(&mut self, snap: Snapshot) {
        for (i, node) in self.network.nodes.iter_mut().enumerate() {
            node.x = snap.xs[i];
            node.y = snap.ys[i];
            node.orient = snap.orients[i];
        }
        self.segments = snap.segments;
        self.slots = snap.slots;
        self.hpwl = snap.hpwl;
    }

    fn insert_into_segment(&mut self, row: RowId, node: NodeId) {
        let x = self.network.node(node).x;
        let pos = {
            let seg = &self.segments[row.as_raw() as usize];
            let network = &*self.network;
            seg.partition_point(|&m| network.node(m).x < x)
        };
        let seg = &mut self.segments[row.as_raw() as usize];
        seg.insert(pos, node);
        for i in pos..seg.len() {
            let m = seg[i];
            self.slots[m.as_raw() as usize] = Some(SlotRef { row, index: i });
        }
    }

    fn remove_from_segment(&mut self, node: NodeId) {
        let slot = self.slots[node.as_raw() as usize]
            .expect("node is not in any segment");
        let seg = &mut self.segments[slot.row.as_raw() as usize];
        seg.remove(slot.index);
        self.slots[node.as_raw() as usize] = None;
        for i in slot.index..seg.len() {
            let m = seg[i];
            self.slots[m.as_raw() as usize] = Some(SlotRef {
                row: slot.row,
                index: i,
            });
        }
    }

    /// Checks every placement invariant over the current state.
    ///
    /// Intended for tests and debugging; returns the first violation as a
    /// message. Expects every free cell to be placed in a segment.
    pub fn verify_invariants(&self) -> Result<(), String> {
        for node in &self.network.nodes {
            if node.kind == NodeKind::Cell
                && !node.is_fixed
                && self.slots[node.id.as_raw() as usize].is_none()
            {
                return Err(format!("free cell {} is not placed in any row", node.id));
            }
        }
        for (r, seg) in self.segments.iter().enumerate() {
            let row = &self.arch.rows[r];
            let mut prev_end = i64::MIN;
            for &id in seg {
                let nd = self.network.node(id);
                if nd.y != row.bottom {
                    return Err(format!("node {} y={} != row bottom {}", id, nd.y, row.bottom));
                }
                if nd.height != row.height {
                    return Err(format!("node {} height mismatch in row {r}", id));
                }
                if !row.on_site_grid(nd.x) {
                    return Err(format!("node {} x={} off the site grid", id, nd.x));
                }
                if nd.x + nd.width > row.right() {
                    return Err(format!("node {} extends past the row", id));
                }
                if !nd.avail_orients.allows(nd.orient) {
                    return Err(format!("node {} in disallowed orientation", id));
                }
                let region = self.arch.region(nd.region);
                if !region.contains_footprint(nd.x, nd.y, nd.width, nd.height) {
                    return Err(format!("node {} outside region {}", id, nd.region));
                }
                let lo = nd.x - nd.pad_left;
                let hi = nd.right() + nd.pad_right;
                if lo < prev_end {
                    return Err(format!("node {} overlaps its left neighbor", id));
                }
                for &(olo, ohi) in &self.obstacles[r] {
                    if lo < ohi && olo < hi {
                        return Err(format!("node {} overlaps a fixed obstacle", id));
                    }
                }
                prev_end = hi;
            }
        }
        Ok(())
    }
}
