//! The random-move pass (`default`).
//!
//! A greedy hill climber: the `rng` generator proposes single-cell
//! relocations and pairwise swaps, each is scored against the configured
//! cost, and a proposal is accepted iff it does not worsen it. Legality
//! is checked before anything is scored, so the pass can never degrade a
//! legal placement.

use super::{run_budgeted, PassStats};
use crate::manager::{PlacementManager, EPS};
use crate::script::{PassBudget, RandomParams};
use rand::rngs::StdRng;
use rand::Rng;
use strata_arch::RowId;

/// Runs the pass under the given budget and options.
///
/// The caller owns the generator, so chained script clauses draw from one
/// deterministic seed.
pub fn run(
    mgr: &mut PlacementManager<'_>,
    budget: PassBudget,
    params: RandomParams,
    rng: &mut StdRng,
) -> PassStats {
    run_budgeted("default", mgr, budget, |mgr| {
        let nodes = mgr.movable_nodes();
        if nodes.is_empty() {
            return 0;
        }
        let attempts = nodes.len() * params.frequency as usize;
        let num_rows = mgr.arch().num_rows();
        let mut applied = 0;
        for _ in 0..attempts {
            let a = nodes[rng.gen_range(0..nodes.len())];
            let accepted = if rng.gen_bool(0.5) {
                // Single-cell relocation to a random site.
                let row = RowId::from_raw(rng.gen_range(0..num_rows) as u32);
                let sites = mgr.arch().row(row).num_sites;
                if sites == 0 {
                    continue;
                }
                let x = mgr.arch().row(row).site_x(rng.gen_range(0..sites));
                let orient = match mgr.choose_orientation(a, row) {
                    Some(o) => o,
                    None => continue,
                };
                if !mgr.propose_move(a, row, x, orient).is_feasible() {
                    continue;
                }
                let mv = mgr.apply_move(a, row, x, orient);
                if mv.hpwl_delta <= EPS {
                    true
                } else {
                    mgr.revert_move(mv);
                    false
                }
            } else {
                // Pairwise swap with a random partner.
                let b = nodes[rng.gen_range(0..nodes.len())];
                if !mgr.propose_swap(a, b).is_feasible() {
                    continue;
                }
                let swap = mgr.apply_swap(a, b);
                if swap.hpwl_delta() <= EPS {
                    true
                } else {
                    mgr.revert_swap(swap);
                    false
                }
            };
            if accepted {
                applied += 1;
            }
        }
        applied
    })
}
