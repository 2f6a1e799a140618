//! Shift-based legalization.
//!
//! Maps arbitrary incoming coordinates to a feasible row/site/region/
//! orientation assignment, minimizing total displacement from the initial
//! positions without optimizing wirelength. Cells are bucketed to their
//! nearest compatible row, sorted by initial x, and packed left to right;
//! a cell whose preferred site collides with the running occupancy cursor
//! or a fixed obstacle is shifted right to the first clear site, and cells
//! that no longer fit overflow to the next row up.

use crate::manager::PlacementManager;
use serde::Serialize;
use strata_arch::{RegionId, RowId};
use strata_common::{Orientation, StrataResult};
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use strata_netlist::{NodeId, NodeKind};

/// A region whose assigned cells could not all be placed inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RegionShortfall {
    /// The over-subscribed region.
    pub region: RegionId,
    /// How many of its cells remain unplaced.
    pub count: usize,
}

/// Summary of a legalization run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LegalizeOutcome {
    /// Number of cells assigned to a row slot.
    pub placed: usize,
    /// Total Manhattan displacement from the initial positions.
    pub displacement: f64,
    /// Cells placed with relaxed power-rail matching.
    pub relaxed: Vec<NodeId>,
    /// Regions that ran out of capacity, with their unplaced counts.
    pub shortfalls: Vec<RegionShortfall>,
}

impl LegalizeOutcome {
    /// Returns `true` when every free cell was placed legally.
    pub fn is_fully_placed(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

/// One-shot legalizer over a [`PlacementManager`].
pub struct ShiftLegalizer;

const RAIL_RELAXED: DiagnosticCode = DiagnosticCode::new(Category::Legalize, 301);
const REGION_SHORTFALL: DiagnosticCode = DiagnosticCode::new(Category::Legalize, 302);

impl ShiftLegalizer {
    /// Legalizes every free cell that is not already assigned to a row
    /// segment.
    ///
    /// On a well-formed instance every cell ends up placed and all
    /// placement invariants hold. Cells for which no capacity exists are
    /// left at their initial positions and reported through `shortfalls`
    /// and the sink; that indicates an over-subscribed instance, not a
    /// placer bug, and the caller decides whether to trust the result.
    pub fn legalize(
        mgr: &mut PlacementManager<'_>,
        sink: &DiagnosticSink,
    ) -> StrataResult<LegalizeOutcome> {
        let num_rows = mgr.arch().num_rows();
        let mut outcome = LegalizeOutcome::default();

        // Bucket unplaced free cells to the compatible row nearest their
        // initial y.
        let mut buckets: Vec<Vec<NodeId>> = vec![Vec::new(); num_rows];
        let mut leftovers: Vec<NodeId> = Vec::new();
        let starts: Vec<(i64, i64)> = mgr.network().nodes.iter().map(|n| (n.x, n.y)).collect();
        for node in &mgr.network().nodes {
            if node.is_fixed || node.kind != NodeKind::Cell || mgr.slot_of(node.id).is_some() {
                continue;
            }
            let mut best: Option<(i64, usize)> = None;
            for (r, row) in mgr.arch().rows.iter().enumerate() {
                if row.height != node.height {
                    continue;
                }
                let dist = (node.y - row.bottom).abs();
                if best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, r));
                }
            }
            match best {
                Some((_, r)) => buckets[r].push(node.id),
                None => leftovers.push(node.id),
            }
        }

        // One occupancy cursor per row, persisting across the sweep so
        // overflow and leftovers pack after the row's current tail.
        let mut cursors: Vec<i64> = mgr.arch().rows.iter().map(|r| r.left()).collect();

        // Sweep rows bottom to top; overflow propagates to the next row up.
        for r in 0..num_rows {
            let mut queue = std::mem::take(&mut buckets[r]);
            queue.sort_by_key(|&id| (mgr.network().node(id).x, id.as_raw()));
            for id in queue {
                match Self::try_place(mgr, sink, RowId::from_raw(r as u32), id, &mut cursors[r]) {
                    Placed::At => outcome.placed += 1,
                    Placed::Relaxed => {
                        outcome.placed += 1;
                        outcome.relaxed.push(id);
                    }
                    Placed::NoFit => {
                        if r + 1 < num_rows {
                            buckets[r + 1].push(id);
                        } else {
                            leftovers.push(id);
                        }
                    }
                }
            }
        }

        // Second chance: first-fit scan over all rows for anything that
        // fell off the top or matched no row by height.
        let mut unplaced: Vec<NodeId> = Vec::new();
        for id in leftovers {
            let height = mgr.network().node(id).height;
            let mut done = false;
            for r in 0..num_rows {
                if mgr.arch().rows[r].height != height {
                    continue;
                }
                match Self::try_place(mgr, sink, RowId::from_raw(r as u32), id, &mut cursors[r]) {
                    Placed::At => {
                        outcome.placed += 1;
                        done = true;
                    }
                    Placed::Relaxed => {
                        outcome.placed += 1;
                        outcome.relaxed.push(id);
                        done = true;
                    }
                    Placed::NoFit => continue,
                }
                break;
            }
            if !done {
                unplaced.push(id);
            }
        }

        // Group what remains by region and report the capacity shortfall.
        unplaced.sort_by_key(|&id| mgr.network().node(id).region.as_raw());
        for chunk in unplaced.chunk_by(|&a, &b| {
            mgr.network().node(a).region == mgr.network().node(b).region
        }) {
            let region = mgr.network().node(chunk[0]).region;
            outcome.shortfalls.push(RegionShortfall {
                region,
                count: chunk.len(),
            });
            sink.emit(
                Diagnostic::error(
                    REGION_SHORTFALL,
                    format!(
                        "region {region} lacks capacity for {} cell(s)",
                        chunk.len()
                    ),
                )
                .with_note("cells left at their incoming positions"),
            );
        }

        for node in &mgr.network().nodes {
            if node.is_fixed || node.kind != NodeKind::Cell {
                continue;
            }
            let (sx, sy) = starts[node.id.as_raw() as usize];
            outcome.displacement +=
                (node.x - sx).abs() as f64 + (node.y - sy).abs() as f64;
        }
        mgr.recompute_hpwl();
        Ok(outcome)
    }

    /// Tries to place `id` in `row` at the lowest-displacement site at or
    /// beyond the row's cursor, skipping fixed obstacles and honoring the
    /// node's region. Advances the cursor past the cell on success.
    fn try_place(
        mgr: &mut PlacementManager<'_>,
        sink: &DiagnosticSink,
        row_id: RowId,
        id: NodeId,
        cursor: &mut i64,
    ) -> Placed {
        let (width, pad_left, pad_right, region_id, start_x) = {
            let nd = mgr.network().node(id);
            (nd.width, nd.pad_left, nd.pad_right, nd.region, nd.x)
        };
        let row = mgr.arch().row(row_id).clone();
        let bottom = row.bottom;
        let height = row.height;
        let right = row.right();

        let (orient, relaxed) = match mgr.choose_orientation(id, row_id) {
            Some(o) => (o, false),
            None => {
                let nd = mgr.network().node(id);
                let o = if nd.avail_orients.allows(nd.orient) {
                    nd.orient
                } else {
                    nd.avail_orients.iter().next().unwrap_or(Orientation::North)
                };
                (o, true)
            }
        };

        let low = *cursor + pad_left;
        let mut x = row.snap_to_site(start_x);
        // Clamp to the last site where the cell still fits, so a cell
        // aimed past the row end slides back instead of overflowing.
        x = x.min(row.snap_down_to_site(right - width));
        if x < low {
            x = row.snap_up_to_site(low);
            // snap_up clamps at the last site; below the cursor means the
            // row is already full.
            if x < low {
                return Placed::NoFit;
            }
        }

        // Shift right past obstacles and out-of-region stretches until the
        // footprint is clear or the row ends.
        loop {
            if x + width > right {
                return Placed::NoFit;
            }
            let lo = x - pad_left;
            let hi = x + width + pad_right;
            let next = if let Some(&(_, ohi)) = mgr
                .obstacles(row_id)
                .iter()
                .find(|&&(olo, ohi)| lo < ohi && olo < hi)
            {
                row.snap_up_to_site(ohi + pad_left)
            } else if !mgr
                .arch()
                .region(region_id)
                .contains_footprint(x, bottom, width, height)
            {
                row.snap_up_to_site(x + row.site_spacing)
            } else {
                break;
            };
            if next <= x {
                return Placed::NoFit;
            }
            x = next;
        }

        if relaxed {
            let nd = mgr.network().node(id);
            sink.emit(Diagnostic::warning(
                RAIL_RELAXED,
                format!(
                    "cell {} has no rail-compatible orientation in row {row_id}; \
                     power matching relaxed",
                    nd.name
                ),
            ));
        }
        mgr.apply_move(id, row_id, x, orient);
        *cursor = x + width + pad_right;
        if relaxed {
            Placed::Relaxed
        } else {
            Placed::At
        }
    }
}

enum Placed {
    At,
    Relaxed,
    NoFit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_arch::{Architecture, Rect, RowDirection, RowParams};
    use strata_common::{OrientationSet, RailPower, SymmetrySet};
    use strata_netlist::Network;

    fn arch_with_rows(n: u32) -> Architecture {
        let sink = DiagnosticSink::new();
        let mut arch = Architecture::new(Rect::new(0, 0, 100, 10 * n as i64));
        for i in 0..n {
            arch.add_row(
                &RowParams {
                    direction: RowDirection::Horizontal,
                    bottom: 10 * i as i64,
                    height: 10,
                    site_width: 10,
                    site_spacing: 10,
                    subrow_origin: 0,
                    num_sites: 10,
                    site_orient: Orientation::North,
                    site_symmetry: SymmetrySet::default(),
                },
                &sink,
            );
        }
        arch.post_process(&sink).unwrap();
        arch
    }

    fn cells(positions: &[(i64, i64)], width: i64) -> Network {
        let mut net = Network::new();
        net.resize_nodes(positions.len());
        for (i, &(x, y)) in positions.iter().enumerate() {
            let node = net.node_mut(NodeId::from_raw(i as u32));
            node.width = width;
            node.height = 10;
            node.x = x;
            node.y = y;
            node.orig_x = x;
            node.orig_y = y;
            node.avail_orients =
                OrientationSet::from_symmetry(SymmetrySet::new(true, true, false));
        }
        net
    }

    #[test]
    fn overlapping_pair_is_shifted_apart() {
        let arch = arch_with_rows(1);
        let mut net = cells(&[(5, 0), (15, 0)], 20);
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert!(outcome.is_fully_placed());
        assert_eq!(outcome.placed, 2);
        assert!(mgr.verify_invariants().is_ok(), "{:?}", mgr.verify_invariants());

        let x0 = mgr.network().node(NodeId::from_raw(0)).x;
        let x1 = mgr.network().node(NodeId::from_raw(1)).x;
        assert!((x0, x1) == (0, 20) || (x0, x1) == (10, 30), "got ({x0}, {x1})");
    }

    #[test]
    fn legal_placement_is_unchanged() {
        let arch = arch_with_rows(2);
        let mut net = cells(&[(0, 0), (30, 0), (10, 10)], 20);
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert!(outcome.is_fully_placed());
        assert_eq!(outcome.displacement, 0.0);
        assert_eq!(mgr.network().node(NodeId::from_raw(1)).x, 30);
        assert_eq!(mgr.network().node(NodeId::from_raw(2)).y, 10);
    }

    #[test]
    fn rail_mismatch_flips_the_cell() {
        let mut arch = arch_with_rows(1);
        arch.rows[0].power_top = RailPower::Vss;
        arch.rows[0].power_bot = RailPower::Vdd;
        let mut net = cells(&[(0, 0)], 20);
        {
            let node = net.node_mut(NodeId::from_raw(0));
            node.power_top = RailPower::Vdd;
            node.power_bot = RailPower::Vss;
        }
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert!(outcome.relaxed.is_empty());
        let orient = mgr.network().node(NodeId::from_raw(0)).orient;
        assert!(orient.flips_vertically(), "expected a vertical flip, got {orient}");
        assert!(!sink.has_errors());
    }

    #[test]
    fn unmatchable_rails_are_relaxed_with_warning() {
        let mut arch = arch_with_rows(1);
        arch.rows[0].power_top = RailPower::Vss;
        arch.rows[0].power_bot = RailPower::Vdd;
        let mut net = cells(&[(0, 0)], 20);
        {
            let node = net.node_mut(NodeId::from_raw(0));
            node.power_top = RailPower::Vdd;
            node.power_bot = RailPower::Vss;
            // No flip available: only N allowed.
            node.avail_orients = OrientationSet::only(Orientation::North);
        }
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert_eq!(outcome.relaxed, vec![NodeId::from_raw(0)]);
        assert_eq!(outcome.placed, 1);
        assert!(!sink.has_errors());
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn overflow_propagates_to_next_row() {
        let arch = arch_with_rows(2);
        // Three width-40 cells all aimed at row 0: only two fit.
        let mut net = cells(&[(0, 0), (10, 0), (20, 0)], 40);
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert!(outcome.is_fully_placed());
        assert!(mgr.verify_invariants().is_ok());
        assert_eq!(mgr.segment(RowId::from_raw(0)).len(), 2);
        assert_eq!(mgr.segment(RowId::from_raw(1)).len(), 1);
    }

    #[test]
    fn fixed_obstacle_is_avoided() {
        let arch = arch_with_rows(1);
        let mut net = cells(&[(40, 0), (0, 0)], 20);
        {
            let blocker = net.node_mut(NodeId::from_raw(0));
            blocker.is_fixed = true;
        }
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert_eq!(outcome.placed, 1);
        assert!(mgr.verify_invariants().is_ok());
        assert_eq!(mgr.network().node(NodeId::from_raw(1)).x, 0);

        // A second free cell aimed at the blocker shifts past it.
        let mut net2 = cells(&[(40, 0), (35, 0)], 20);
        net2.node_mut(NodeId::from_raw(0)).is_fixed = true;
        let mut mgr2 = PlacementManager::new(&arch, &mut net2);
        let outcome2 = ShiftLegalizer::legalize(&mut mgr2, &sink).unwrap();
        assert_eq!(outcome2.placed, 1);
        assert_eq!(mgr2.network().node(NodeId::from_raw(1)).x, 60);
    }

    #[test]
    fn oversubscribed_instance_reports_shortfall() {
        let arch = arch_with_rows(1);
        // 120 units of cells into a 100-unit row.
        let mut net = cells(&[(0, 0), (0, 0), (0, 0)], 40);
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert_eq!(outcome.placed, 2);
        assert_eq!(outcome.shortfalls.len(), 1);
        assert_eq!(outcome.shortfalls[0].count, 1);
        assert_eq!(outcome.shortfalls[0].region, RegionId::DEFAULT);
        assert!(sink.has_errors());
    }

    #[test]
    fn region_constrained_cell_lands_inside_region() {
        let sink = DiagnosticSink::new();
        let mut arch = arch_with_rows(1);
        let region = arch.add_region();
        arch.region_mut(region).add_rect(Rect::new(60, 0, 100, 10));
        arch.post_process(&sink).unwrap();

        let mut net = cells(&[(0, 0)], 20);
        net.node_mut(NodeId::from_raw(0)).region = region;
        let mut mgr = PlacementManager::new(&arch, &mut net);

        let outcome = ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        assert!(outcome.is_fully_placed());
        assert!(mgr.network().node(NodeId::from_raw(0)).x >= 60);
        assert!(mgr.verify_invariants().is_ok());
    }

    #[test]
    fn capacity_is_conserved_per_row() {
        let arch = arch_with_rows(3);
        let mut net = cells(
            &[(5, 0), (15, 0), (25, 5), (35, 12), (0, 20), (90, 20)],
            20,
        );
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();

        ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        for r in 0..3 {
            let row = RowId::from_raw(r);
            let used: i64 = mgr
                .segment(row)
                .iter()
                .map(|&id| {
                    let n = mgr.network().node(id);
                    n.width + n.pad_left + n.pad_right
                })
                .sum();
            assert!(used <= 100, "row {r} packs {used} units");
        }
    }
}
