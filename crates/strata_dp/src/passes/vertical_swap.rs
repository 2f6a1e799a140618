//! The vertical swap pass (`vs`).
//!
//! A restriction of global swap to partners in adjacent rows, relocating
//! cells vertically where the row-to-row power and orientation rules
//! allow it. Cheaper per iteration than `gs` and effective at fixing
//! cells stranded one row away from their nets.

use super::{run_budgeted, PassStats};
use crate::manager::{PlacementManager, EPS};
use crate::script::PassBudget;

/// Runs the pass under the given budget.
pub fn run(mgr: &mut PlacementManager<'_>, budget: PassBudget) -> PassStats {
    run_budgeted("vs", mgr, budget, |mgr| {
        let nodes = mgr.movable_nodes();
        let mut applied = 0;
        for &a in &nodes {
            let row_a = match mgr.row_of(a) {
                Some(r) => r.as_raw(),
                None => continue,
            };
            for &b in &nodes {
                let row_b = match mgr.row_of(b) {
                    Some(r) => r.as_raw(),
                    None => continue,
                };
                if row_a.abs_diff(row_b) != 1 || !mgr.propose_swap(a, b).is_feasible() {
                    continue;
                }
                let swap = mgr.apply_swap(a, b);
                if swap.hpwl_delta() < -EPS {
                    applied += 1;
                    break;
                }
                mgr.revert_swap(swap);
            }
        }
        applied
    })
}
