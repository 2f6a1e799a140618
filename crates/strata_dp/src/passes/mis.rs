//! The maximum-independent-set pass (`mis`).
//!
//! Gathers, for every movable cell, its best improving swap with a
//! partner inside a bounded spatial window, then selects
//! a maximum-weight independent set of those candidates under a conflict
//! relation (shared cell, shared net, or segment adjacency) and applies
//! the whole set as one batch. Resolving mutually-exclusive opportunities
//! jointly beats applying them greedily one at a time, because a weaker
//! swap can no longer lock out two stronger disjoint ones.
//!
//! Exact maximum-weight independent set is intractable in general; the
//! selection here is greedy by descending gain, which is exact whenever
//! the candidates are pairwise disjoint and a sound approximation
//! otherwise. Every selected swap is re-verified at apply time, so a
//! conflict the relation failed to capture degrades to a skipped swap,
//! never an illegal state.

use super::{run_budgeted, PassStats};
use crate::manager::{PlacementManager, EPS};
use crate::script::PassBudget;
use strata_netlist::{EdgeId, NodeId};

/// Partner-search window, in sites horizontally and rows vertically.
/// Distant exchanges are the global-swap pass's job.
const WINDOW_SITES: i64 = 10;
const WINDOW_ROWS: i64 = 3;

struct Candidate {
    a: NodeId,
    b: NodeId,
    gain: f64,
    edges: Vec<EdgeId>,
}

/// Runs the pass under the given budget.
pub fn run(mgr: &mut PlacementManager<'_>, budget: PassBudget) -> PassStats {
    run_budgeted("mis", mgr, budget, |mgr| {
        let candidates = gather(mgr);
        let selected = select(mgr, &candidates);

        let mut applied = 0;
        for idx in selected {
            let cand = &candidates[idx];
            // The conflict relation is conservative but not exhaustive;
            // re-verify before committing.
            if !mgr.propose_swap(cand.a, cand.b).is_feasible() {
                continue;
            }
            let swap = mgr.apply_swap(cand.a, cand.b);
            if swap.hpwl_delta() < -EPS {
                applied += 1;
            } else {
                mgr.revert_swap(swap);
            }
        }
        applied
    })
}

/// Scores, for each movable cell, its best improving feasible swap with a
/// partner inside the spatial window.
fn gather(mgr: &mut PlacementManager<'_>) -> Vec<Candidate> {
    let nodes = mgr.movable_nodes();
    let (max_dx, max_dy) = {
        let rows = &mgr.arch().rows;
        let spacing = rows.iter().map(|r| r.site_spacing).max().unwrap_or(1);
        let height = rows.iter().map(|r| r.height).max().unwrap_or(1);
        (spacing * WINDOW_SITES, height * WINDOW_ROWS)
    };
    let mut candidates = Vec::new();
    for &a in &nodes {
        let mut best: Option<(NodeId, f64)> = None;
        for &b in &nodes {
            // Unordered pairs once.
            if b.as_raw() <= a.as_raw() {
                continue;
            }
            let (dx, dy) = {
                let na = mgr.network().node(a);
                let nb = mgr.network().node(b);
                ((na.x - nb.x).abs(), (na.y - nb.y).abs())
            };
            if dx > max_dx || dy > max_dy || !mgr.propose_swap(a, b).is_feasible() {
                continue;
            }
            let swap = mgr.apply_swap(a, b);
            let delta = swap.hpwl_delta();
            mgr.revert_swap(swap);
            if delta < -EPS && best.map_or(true, |(_, d)| delta < d) {
                best = Some((b, delta));
            }
        }
        if let Some((b, delta)) = best {
            let mut edges = mgr.network().edges_of_node(a);
            edges.extend(mgr.network().edges_of_node(b));
            candidates.push(Candidate {
                a,
                b,
                gain: -delta,
                edges,
            });
        }
    }
    candidates
}

/// Greedy independent-set selection: descending gain, skipping anything
/// conflicting with an already-chosen candidate.
fn select(mgr: &PlacementManager<'_>, candidates: &[Candidate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&l, &r| {
        candidates[r]
            .gain
            .partial_cmp(&candidates[l].gain)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(candidates[l].a.as_raw().cmp(&candidates[r].a.as_raw()))
    });

    let mut selected: Vec<usize> = Vec::new();
    for idx in order {
        if selected
            .iter()
            .all(|&s| !conflicts(mgr, &candidates[idx], &candidates[s]))
        {
            selected.push(idx);
        }
    }
    selected
}

/// Two candidates conflict when they touch a common cell, a common net,
/// or segment-adjacent slots; applying one then invalidates the other's
/// scored gain or feasibility.
fn conflicts(mgr: &PlacementManager<'_>, x: &Candidate, y: &Candidate) -> bool {
    let x_nodes = [x.a, x.b];
    let y_nodes = [y.a, y.b];
    if x_nodes.iter().any(|n| y_nodes.contains(n)) {
        return true;
    }
    if x.edges.iter().any(|e| y.edges.contains(e)) {
        return true;
    }
    x_nodes.iter().any(|&n| {
        let (left, right) = mgr.neighbors(n);
        [left, right]
            .into_iter()
            .flatten()
            .any(|nb| y_nodes.contains(&nb))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legalize::ShiftLegalizer;
    use crate::testutil::{chain_on_rows, two_rows};
    use strata_diagnostics::DiagnosticSink;

    #[test]
    fn disjoint_improving_swaps_land_in_one_batch() {
        let arch = two_rows();
        // Two independent crossed pairs, one per row: in row 0 cells 0/1
        // should trade places, in row 1 cells 2/3 should. Nodes 4..8 are
        // zero-width fixed anchors pinning each cell toward the other end
        // of its row; the pairs share no nets and no adjacency.
        let mut net = chain_on_rows(
            &[
                (0, 0),
                (60, 0),
                (0, 10),
                (60, 10),
                (0, 0),
                (80, 0),
                (0, 10),
                (80, 10),
            ],
            &[(1, 4), (0, 5), (3, 6), (2, 7)],
        );
        for raw in 4..8u32 {
            let anchor = net.node_mut(strata_netlist::NodeId::from_raw(raw));
            anchor.is_fixed = true;
            anchor.width = 0;
            anchor.height = 0;
        }
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();
        ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        let before = mgr.hpwl();

        let stats = run(
            &mut mgr,
            PassBudget {
                passes: 1,
                tolerance: 0.0,
            },
        );
        // One iteration applies both swaps together; each saves 120.
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.applied, 2);
        let saved = before - mgr.hpwl();
        assert!((saved - 240.0).abs() < 1e-6, "saved {saved}");
        assert!(mgr.verify_invariants().is_ok());
    }

    #[test]
    fn partner_search_is_window_bounded() {
        use strata_arch::{Architecture, Rect, RowDirection, RowParams};
        use strata_common::{Orientation, SymmetrySet};

        // One 2000-wide row; a crossed pair 1500 sites of separation apart
        // lies outside the partner window, so this pass leaves it for the
        // global-swap pass.
        let sink = DiagnosticSink::new();
        let mut arch = Architecture::new(Rect::new(0, 0, 2000, 10));
        arch.add_row(
            &RowParams {
                direction: RowDirection::Horizontal,
                bottom: 0,
                height: 10,
                site_width: 10,
                site_spacing: 10,
                subrow_origin: 0,
                num_sites: 200,
                site_orient: Orientation::North,
                site_symmetry: SymmetrySet::default(),
            },
            &sink,
        );
        arch.post_process(&sink).unwrap();

        let mut net = chain_on_rows(&[(0, 0), (1500, 0), (0, 0), (1980, 0)], &[(1, 2), (0, 3)]);
        for raw in 2..4u32 {
            let anchor = net.node_mut(strata_netlist::NodeId::from_raw(raw));
            anchor.is_fixed = true;
            anchor.width = 0;
            anchor.height = 0;
        }
        let mut mgr = PlacementManager::new(&arch, &mut net);
        ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        let before = mgr.hpwl();

        let stats = run(&mut mgr, PassBudget::default());
        assert_eq!(stats.applied, 0);
        assert_eq!(mgr.hpwl(), before);
    }

    #[test]
    fn shared_cell_candidates_apply_only_once() {
        let arch = two_rows();
        let mut net = chain_on_rows(&[(0, 0), (30, 0), (60, 0)], &[(0, 2)]);
        let mut mgr = PlacementManager::new(&arch, &mut net);
        let sink = DiagnosticSink::new();
        ShiftLegalizer::legalize(&mut mgr, &sink).unwrap();
        let before = mgr.hpwl();

        run(&mut mgr, PassBudget::default());
        assert!(mgr.hpwl() <= before + 1e-6);
        assert!(mgr.verify_invariants().is_ok());
    }
}
