//! The global swap pass (`gs`).
//!
//! For each movable cell, searches the whole layout for a swap partner
//! that reduces total HPWL and applies the first improving feasible swap
//! found. Candidates that fail feasibility or worsen the objective are
//! reverted on the spot.

use super::{run_budgeted, PassStats};
use crate::manager::{PlacementManager, EPS};
use crate::script::PassBudget;

/// Runs the pass under the given budget.
pub fn run(mgr: &mut PlacementManager<'_>, budget: PassBudget) -> PassStats {
    run_budgeted("gs", mgr, budget, |mgr| {
        let nodes = mgr.movable_nodes();
        let mut applied = 0;
        for &a in &nodes {
            for &b in &nodes {
                if a == b || !mgr.propose_swap(a, b).is_feasible() {
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
