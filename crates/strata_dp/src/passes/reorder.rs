//! The reorder pass (`ro`).
//!
//! Slides a window of `W` consecutive slots along each row segment and
//! exhaustively tries every x-ordering of the window's occupants, packed
//! left to right from the window's original left edge. The best feasible
//! ordering replaces the window atomically; everything else is reverted.

use super::{run_budgeted, PassStats};
use crate::manager::{AppliedMove, PlacementManager, EPS};
use crate::script::PassBudget;
use strata_arch::RowId;
use strata_common::Orientation;
use strata_netlist::NodeId;

/// Window width. Windows are re-evaluated after every accepted reorder,
/// so a small width still composes into long-range changes.
const WINDOW: usize = 3;

const PERMS_2: &[&[usize]] = &[&[1, 0]];
const PERMS_3: &[&[usize]] = &[
    &[0, 2, 1],
    &[1, 0, 2],
    &[1, 2, 0],
    &[2, 0, 1],
    &[2, 1, 0],
];

/// Runs the pass under the given budget.
pub fn run(mgr: &mut PlacementManager<'_>, budget: PassBudget) -> PassStats {
    run_budgeted("ro", mgr, budget, |mgr| {
        let mut applied = 0;
        for r in 0..mgr.arch().num_rows() {
            let row = RowId::from_raw(r as u32);
            let mut start = 0;
            loop {
                let seg = mgr.segment(row);
                if start + 2 > seg.len() {
                    break;
                }
                let width = WINDOW.min(seg.len() - start);
                let window: Vec<NodeId> = seg[start..start + width].to_vec();
                if reorder_window(mgr, row, &window) {
                    applied += 1;
                }
                start += 1;
            }
        }
        applied
    })
}

/// Tries every non-identity ordering of `window` and keeps the best one
/// that improves HPWL. Returns `true` if an ordering was applied.
fn reorder_window(mgr: &mut PlacementManager<'_>, row: RowId, window: &[NodeId]) -> bool {
    let original: Vec<(NodeId, i64, Orientation)> = window
        .iter()
        .map(|&id| {
            let nd = mgr.network().node(id);
            (id, nd.x, nd.orient)
        })
        .collect();
    let base = original[0].1;

    let perms: &[&[usize]] = match window.len() {
        2 => PERMS_2,
        3 => PERMS_3,
        _ => return false,
    };

    let mut best: Option<(&[usize], f64)> = None;
    for &perm in perms {
        if let Some(delta) = try_order(mgr, row, &original, perm, base) {
            if delta < -EPS && best.map_or(true, |(_, b)| delta < b) {
                best = Some((perm, delta));
            }
        }
        restore(mgr, row, &original);
    }

    match best {
        Some((perm, _)) => {
            if try_order(mgr, row, &original, perm, base).is_none() {
                restore(mgr, row, &original);
                return false;
            }
            true
        }
        None => false,
    }
}

/// Detaches the window and packs it in `perm` order from `base`. Returns
/// the HPWL delta, or `None` if some slot was infeasible. Either way the
/// window may be left partially placed; the caller restores or keeps it.
fn try_order(
    mgr: &mut PlacementManager<'_>,
    row: RowId,
    original: &[(NodeId, i64, Orientation)],
    perm: &[usize],
    base: i64,
) -> Option<f64> {
    for &(id, _, _) in original {
        mgr.detach(id);
    }
    let row_data = mgr.arch().row(row).clone();
    let mut cursor = base;
    let mut total = 0.0;
    let mut placed: Vec<AppliedMove> = Vec::with_capacity(perm.len());
    for &i in perm {
        let (id, _, orient) = original[i];
        let (w, pad_left, pad_right) = {
            let nd = mgr.network().node(id);
            (nd.width, nd.pad_left, nd.pad_right)
        };
        let x = row_data.snap_up_to_site(cursor + pad_left);
        if x < cursor + pad_left || !mgr.propose_move(id, row, x, orient).is_feasible() {
            for mv in placed.into_iter().rev() {
                mgr.revert_move(mv);
            }
            return None;
        }
        let mv = mgr.apply_move(id, row, x, orient);
        total += mv.hpwl_delta;
        cursor = x + w + pad_right;
        placed.push(mv);
    }
    Some(total)
}

/// Puts every window member back at its original slot. Members already in
/// place (after a failed ordering was unwound) are detached first, so the
/// restore is unconditional.
fn restore(mgr: &mut PlacementManager<'_>, row: RowId, original: &[(NodeId, i64, Orientation)]) {
    for &(id, _, _) in original {
        if mgr.slot_of(id).is_some() {
            mgr.detach(id);
        }
    }
    for &(id, x, orient) in original {
        mgr.apply_move(id, row, x, orient);
    }
}
