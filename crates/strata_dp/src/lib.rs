//! Detailed placement engine for the Strata EDA toolchain.
//!
//! This crate takes an [`Architecture`] (rows, regions, power rails) and a
//! [`Network`] (cells, nets, pins) carrying arbitrary incoming coordinates,
//! legalizes the placement onto the row/site grid, and then improves it
//! with a scripted sequence of local-search passes driven by incremental
//! half-perimeter wirelength.
//!
//! # Pipeline
//!
//! 1. **Legalize** — shift-based packing onto rows, sites, and regions
//! 2. **Optimize** — scripted passes (`mis`, `gs`, `vs`, `ro`, `default`)
//!    over the [`PlacementManager`]'s propose/apply/revert move API
//! 3. **Read back** — final coordinates and orientations stay on the
//!    network, ready for export
//!
//! # Usage
//!
//! ```ignore
//! use strata_dp::{improve_placement, DetailedParams};
//!
//! let stats = improve_placement(&arch, &mut network, &DetailedParams::default(), &sink)?;
//! assert!(stats.final_hpwl <= stats.initial_hpwl);
//! ```

#![warn(missing_docs)]

pub mod legalize;
pub mod manager;
pub mod objective;
pub mod passes;
pub mod script;

pub use legalize::{LegalizeOutcome, RegionShortfall, ShiftLegalizer};
pub use manager::{
    AppliedMove, AppliedSwap, InfeasibleReason, MoveCheck, PlacementManager, SlotRef, Snapshot,
};
pub use passes::PassStats;
pub use script::{
    parse_script, CostExpr, MoveGenerator, ObjectiveKind, PassBudget, PassCommand, RandomParams,
    ScriptError,
};

use rand::rngs::StdRng;
use rand::SeedableRng;
use strata_arch::Architecture;
use strata_common::InternalError;
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use strata_netlist::Network;
use thiserror::Error;

/// The standard pass sequence run when no script is given.
pub const DEFAULT_SCRIPT: &str = "mis -p 10 -t 0.005;gs -p 10 -t 0.005;vs -p 10 -t 0.005;\
                                  ro -p 10 -t 0.005;default -p 5 -f 20 -gen rng -obj hpwl \
                                  -cost (hpwl);";

/// Parameters of a detailed placement run.
#[derive(Clone, Debug)]
pub struct DetailedParams {
    /// The pass script (see [`script`] for the mini-language).
    pub script: String,
    /// Seed of the random pass's move generator.
    pub seed: u64,
}

impl Default for DetailedParams {
    fn default() -> Self {
        Self {
            script: DEFAULT_SCRIPT.to_string(),
            seed: 1,
        }
    }
}

/// A fatal error aborting the whole run.
#[derive(Debug, Error)]
pub enum ImproveError {
    /// Malformed script or unknown pass name; raised before any mutation.
    #[error(transparent)]
    Script(#[from] ScriptError),
    /// Internal consistency failure in the network or the engine.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Summary of a completed run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ImproveStats {
    /// HPWL after legalization, before any optimization pass.
    pub initial_hpwl: f64,
    /// HPWL at the end of the script.
    pub final_hpwl: f64,
    /// Total displacement of free cells from their original positions,
    /// accumulated over legalization and every pass.
    pub displacement: i64,
    /// The legalizer's summary.
    pub legalize: LegalizeOutcome,
    /// Per-pass statistics, in script order.
    pub passes: Vec<PassStats>,
}

impl ImproveStats {
    /// Relative HPWL improvement in percent (zero when the initial
    /// objective was zero).
    pub fn improvement_percent(&self) -> f64 {
        if self.initial_hpwl == 0.0 {
            0.0
        } else {
            100.0 * (self.initial_hpwl - self.final_hpwl) / self.initial_hpwl
        }
    }
}

const RUN_REPORT: DiagnosticCode = DiagnosticCode::new(Category::Optimize, 402);
const PASS_REPORT: DiagnosticCode = DiagnosticCode::new(Category::Optimize, 403);

/// Legalizes `network` onto `arch` and runs the scripted optimization
/// passes.
///
/// The script is parsed and validated before any state is touched, so a
/// configuration error leaves the network exactly as it was. Legalization
/// shortfalls and relaxations are reported through `sink` and in the
/// returned stats; they do not abort the run.
pub fn improve_placement(
    arch: &Architecture,
    network: &mut Network,
    params: &DetailedParams,
    sink: &DiagnosticSink,
) -> Result<ImproveStats, ImproveError> {
    network.validate()?;
    let commands = parse_script(&params.script, sink)?;

    sink.emit(Diagnostic::note(
        RUN_REPORT,
        format!(
            "detailed placement: {} nodes, {} edges, {} pins",
            network.num_nodes(),
            network.num_edges(),
            network.num_pins()
        ),
    ));

    let mut mgr = PlacementManager::new(arch, network);
    let legalize = ShiftLegalizer::legalize(&mut mgr, sink)?;
    let initial_hpwl = mgr.hpwl();

    // Nothing to improve on a wirelength-free instance; skip the passes
    // rather than spinning their budgets on a zero objective.
    if initial_hpwl == 0.0 {
        sink.emit(Diagnostic::note(
            RUN_REPORT,
            "initial hpwl is zero; skipping improvement passes",
        ));
        return Ok(ImproveStats {
            initial_hpwl,
            final_hpwl: initial_hpwl,
            displacement: objective::total_displacement(mgr.network()),
            legalize,
            passes: Vec::new(),
        });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut pass_stats = Vec::with_capacity(commands.len());
    for command in &commands {
        let stats = match *command {
            PassCommand::Mis(budget) => passes::mis::run(&mut mgr, budget),
            PassCommand::GlobalSwap(budget) => passes::global_swap::run(&mut mgr, budget),
            PassCommand::VerticalSwap(budget) => passes::vertical_swap::run(&mut mgr, budget),
            PassCommand::Reorder(budget) => passes::reorder::run(&mut mgr, budget),
            PassCommand::Random(budget, random) => {
                passes::random::run(&mut mgr, budget, random, &mut rng)
            }
        };
        sink.emit(Diagnostic::note(
            PASS_REPORT,
            format!(
                "pass {}: {} iteration(s), {} applied, hpwl {:.1} -> {:.1}",
                stats.name, stats.iterations, stats.applied, stats.initial_hpwl, stats.final_hpwl
            ),
        ));
        pass_stats.push(stats);
    }

    mgr.recompute_hpwl();
    let final_hpwl = mgr.hpwl();
    let displacement = objective::total_displacement(mgr.network());
    sink.emit(Diagnostic::note(
        RUN_REPORT,
        format!("hpwl {initial_hpwl:.1} -> {final_hpwl:.1}, displacement {displacement}"),
    ));

    Ok(ImproveStats {
        initial_hpwl,
        final_hpwl,
        displacement,
        legalize,
        passes: pass_stats,
    })
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fixtures for the pass and pipeline tests.

    use strata_arch::{Architecture, Rect, RowDirection, RowParams};
    use strata_common::{Orientation, OrientationSet, SymmetrySet};
    use strata_diagnostics::DiagnosticSink;
    use strata_netlist::{EdgeId, Network, NodeId};

    /// Two rows at y=0 and y=10, 100 units wide, sites every 10 units.
    pub fn two_rows() -> Architecture {
        let sink = DiagnosticSink::new();
        let mut arch = Architecture::new(Rect::new(0, 0, 100, 20));
        for bottom in [0, 10] {
            arch.add_row(
                &RowParams {
                    direction: RowDirection::Horizontal,
                    bottom,
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

    /// Width-20, height-10 cells at the given positions, wired by the
    /// given two-pin nets (pairs of node indices, pin offsets zero).
    pub fn chain_on_rows(positions: &[(i64, i64)], nets: &[(u32, u32)]) -> Network {
        let mut net = Network::new();
        net.resize_nodes(positions.len());
        net.resize_edges(nets.len());
        for (i, &(x, y)) in positions.iter().enumerate() {
            let node = net.node_mut(NodeId::from_raw(i as u32));
            node.width = 20;
            node.height = 10;
            node.x = x;
            node.y = y;
            node.orig_x = x;
            node.orig_y = y;
            node.avail_orients =
                OrientationSet::from_symmetry(SymmetrySet::new(true, true, false));
        }
        for (e, &(a, b)) in nets.iter().enumerate() {
            net.create_and_add_pin(NodeId::from_raw(a), EdgeId::from_raw(e as u32));
            net.create_and_add_pin(NodeId::from_raw(b), EdgeId::from_raw(e as u32));
        }
        net
    }
}
