//! Optimization passes over the placement manager.
//!
//! Every pass follows the same discipline: candidates are checked through
//! the manager's propose API, applied speculatively, and reverted when the
//! objective does not improve. Each runs under a [`PassBudget`]: up to
//! `-p` iterations, stopping early once an iteration improves the
//! objective by less than the `-t` fraction or applies nothing.

pub mod global_swap;
pub mod mis;
pub mod random;
pub mod reorder;
pub mod vertical_swap;

use crate::manager::{PlacementManager, EPS};
use crate::script::PassBudget;
use serde::Serialize;

/// Outcome of one pass run.
#[derive(Clone, Debug, Serialize)]
pub struct PassStats {
    /// The pass name as written in the script.
    pub name: &'static str,
    /// Iterations actually executed.
    pub iterations: u32,
    /// Moves, swaps, or batches applied across all iterations.
    pub applied: usize,
    /// Objective before the pass.
    pub initial_hpwl: f64,
    /// Objective after the pass.
    pub final_hpwl: f64,
}

impl PassStats {
    /// Absolute objective improvement (positive is better).
    pub fn improvement(&self) -> f64 {
        self.initial_hpwl - self.final_hpwl
    }
}

/// Runs `iteration` under the budget, stopping early when an iteration
/// applies nothing or the relative improvement drops under the tolerance.
pub(crate) fn run_budgeted(
    name: &'static str,
    mgr: &mut PlacementManager<'_>,
    budget: PassBudget,
    mut iteration: impl FnMut(&mut PlacementManager<'_>) -> usize,
) -> PassStats {
    let initial_hpwl = mgr.hpwl();
    let mut stats = PassStats {
        name,
        iterations: 0,
        applied: 0,
        initial_hpwl,
        final_hpwl: initial_hpwl,
    };
    for _ in 0..budget.passes {
        let before = mgr.hpwl();
        let applied = iteration(mgr);
        stats.iterations += 1;
        stats.applied += applied;
        let after = mgr.hpwl();
        let relative = if before.abs() > EPS {
            (before - after) / before
        } else {
            0.0
        };
        if applied == 0 || relative < budget.tolerance {
            break;
        }
    }
    stats.final_hpwl = mgr.hpwl();
    stats
}
