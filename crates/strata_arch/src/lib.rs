//! Spatial model for the Strata placement engine.
//!
//! Describes the legal placement surface: horizontal [`Row`]s with discrete
//! site grids and power-rail labels, [`Region`]s restricting groups of cells
//! to sub-areas of the die, and the [`Architecture`] that owns both and is
//! clipped/validated against the die rectangle.
//!
//! Rows are created from an external snapshot, power rails are inferred
//! from routed power/ground stripes by geometric containment, and
//! [`Architecture::post_process`] finalizes the model: clipping, internal
//! consistency checks, and the deterministic row index used for O(1)
//! row lookup by y.

#![warn(missing_docs)]

pub mod ids;
pub mod region;
pub mod row;

pub use ids::{RegionId, RowId};
pub use region::Region;
pub use row::{Row, RowDirection, RowParams};
pub use strata_common::Rect;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_common::{InternalError, RailPower, StrataResult};
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// A routed power or ground stripe used to label row rails.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerStripe {
    /// Whether the stripe carries VDD or VSS.
    pub power: RailPower,
    /// The stripe's shape.
    pub rect: Rect,
}

/// The static description of the legal placement surface.
///
/// Built once per invocation, finalized by [`post_process`](Self::post_process),
/// then read-only for the rest of the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Architecture {
    /// All accepted rows, sorted by bottom-y after post-processing.
    pub rows: Vec<Row>,
    /// All regions; index 0 is the default region covering the die.
    pub regions: Vec<Region>,
    die: Rect,
    bounds: Rect,
    /// Row bottom-y to row index (rebuilt by post-processing).
    #[serde(skip)]
    row_by_bottom: HashMap<i64, RowId>,
}

impl Architecture {
    /// Creates an architecture for the given die rectangle.
    ///
    /// The default region (id 0) covering the full die is created here;
    /// nodes not explicitly grouped belong to it.
    pub fn new(die: Rect) -> Self {
        let mut default_region = Region::new(RegionId::DEFAULT);
        default_region.add_rect(die);
        Self {
            rows: Vec::new(),
            regions: vec![default_region],
            die,
            bounds: die,
            row_by_bottom: HashMap::new(),
        }
    }

    /// Adds a row to the architecture.
    ///
    /// Rows with a non-horizontal direction are rejected with a warning
    /// diagnostic and `None` is returned; the surface simply has fewer
    /// legal rows. The returned ID is provisional until
    /// [`post_process`](Self::post_process) sorts the rows.
    pub fn add_row(&mut self, params: &RowParams, sink: &DiagnosticSink) -> Option<RowId> {
        if params.direction != RowDirection::Horizontal {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 110),
                format!(
                    "skipping row at y={}: only horizontal rows are supported",
                    params.bottom
                ),
            ));
            return None;
        }
        let id = RowId::from_raw(self.rows.len() as u32);
        self.rows.push(Row::from_params(params));
        Some(id)
    }

    /// Creates a new (non-default) region and returns its ID.
    pub fn add_region(&mut self) -> RegionId {
        let id = RegionId::from_raw(self.regions.len() as u32);
        self.regions.push(Region::new(id));
        id
    }

    /// Returns the region with the given ID.
    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the region with the given ID.
    pub fn region_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id.as_raw() as usize]
    }

    /// Returns the row with the given ID.
    pub fn row(&self, id: RowId) -> &Row {
        &self.rows[id.as_raw() as usize]
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of regions (including the default region).
    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    /// Returns the overall placement bounds.
    ///
    /// The x extent is die-authoritative; the y extent is the union of the
    /// row extents. Valid after [`post_process`](Self::post_process).
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns the die rectangle.
    pub fn die(&self) -> Rect {
        self.die
    }

    /// Returns the row whose bottom edge is exactly `y`, if any.
    pub fn row_at_y(&self, y: i64) -> Option<RowId> {
        self.row_by_bottom.get(&y).copied()
    }

    /// Sets one row's rail labels directly, bypassing stripe inference.
    pub fn set_row_power(&mut self, id: RowId, top: RailPower, bot: RailPower) {
        let row = &mut self.rows[id.as_raw() as usize];
        row.power_top = top;
        row.power_bot = bot;
    }

    /// Labels the power rails of each row from routed power/ground stripes.
    ///
    /// A row's bottom (top) rail takes a stripe's label when the row's
    /// bottom (top) edge lies within the stripe's vertical span. Later
    /// stripes win when several cover the same edge.
    pub fn assign_rails_from_stripes(&mut self, stripes: &[PowerStripe]) {
        for stripe in stripes {
            for row in &mut self.rows {
                if row.bottom >= stripe.rect.ymin && row.bottom <= stripe.rect.ymax {
                    row.power_bot = stripe.power;
                }
                let top = row.top();
                if top >= stripe.rect.ymin && top <= stripe.rect.ymax {
                    row.power_top = stripe.power;
                }
            }
        }
    }

    /// Finalizes the architecture.
    ///
    /// Clips each row against the die rectangle (the die bound is
    /// authoritative: origins move right and site counts shrink to fit),
    /// drops rows left with no sites, sorts rows by bottom-y, validates
    /// internal consistency, and builds the bottom-y row index. An empty
    /// row set is tolerated and reported as a note.
    pub fn post_process(&mut self, sink: &DiagnosticSink) -> StrataResult<()> {
        if self.rows.is_empty() {
            sink.emit(Diagnostic::note(
                DiagnosticCode::new(Category::Warning, 111),
                "architecture has no rows; nothing to place",
            ));
            self.bounds = self.die;
            return Ok(());
        }

        for row in &self.rows {
            if row.site_spacing <= 0 || row.height <= 0 {
                return Err(InternalError::new(format!(
                    "row at y={} has non-positive site spacing or height",
                    row.bottom
                )));
            }
        }

        // Clip rows horizontally against the die.
        for row in &mut self.rows {
            let mut origin = row.subrow_origin;
            let mut num_sites = row.num_sites;
            if origin < self.die.xmin {
                // Advance the origin in whole sites so the grid phase is kept.
                let deficit = self.die.xmin - origin;
                let skip = (deficit + row.site_spacing - 1) / row.site_spacing;
                origin += skip * row.site_spacing;
                num_sites = num_sites.saturating_sub(skip as u32);
            }
            let right = origin + num_sites as i64 * row.site_spacing;
            if right > self.die.xmax {
                let fit = (self.die.xmax - origin) / row.site_spacing;
                num_sites = num_sites.min(fit.max(0) as u32);
            }
            row.subrow_origin = origin;
            row.num_sites = num_sites;
        }

        let before = self.rows.len();
        self.rows.retain(|row| row.num_sites > 0);
        let dropped = before - self.rows.len();
        if dropped > 0 {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 112),
                format!("{dropped} row(s) clipped to zero sites against the die"),
            ));
        }

        self.rows
            .sort_by_key(|row| (row.bottom, row.subrow_origin));

        // Consistency: the clipped grid must not extend past the die.
        for row in &self.rows {
            if row.left() < self.die.xmin || row.right() > self.die.xmax {
                return Err(InternalError::new(format!(
                    "row at y={} extends past the die after clipping",
                    row.bottom
                )));
            }
        }

        self.rebuild_row_index();

        // Die-authoritative x bounds; y bounds from the rows.
        let mut ymin = i64::MAX;
        let mut ymax = i64::MIN;
        for row in &self.rows {
            ymin = ymin.min(row.bottom);
            ymax = ymax.max(row.top());
        }
        if self.rows.is_empty() {
            self.bounds = self.die;
        } else {
            self.bounds = Rect::new(self.die.xmin, ymin, self.die.xmax, ymax);
        }
        Ok(())
    }

    /// Rebuilds the bottom-y row index (needed after deserialization).
    pub fn rebuild_row_index(&mut self) {
        self.row_by_bottom.clear();
        for (i, row) in self.rows.iter().enumerate() {
            self.row_by_bottom
                .insert(row.bottom, RowId::from_raw(i as u32));
        }
    }
}
