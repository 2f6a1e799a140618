//! Placement regions: constrained sub-areas of the die.

use crate::ids::RegionId;
use serde::{Deserialize, Serialize};
use strata_common::Rect;

/// A placement region: an ordered set of axis-aligned rectangles a group of
/// cells is restricted to. Regions may be disjoint. Region 0 is the default
/// region covering the full die; every node belongs to exactly one region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    /// The region's ID.
    pub id: RegionId,
    /// The rectangles making up the region.
    pub rects: Vec<Rect>,
    /// The bounding box of all rectangles.
    pub bbox: Rect,
}

impl Region {
    pub(crate) fn new(id: RegionId) -> Self {
        Self {
            id,
            rects: Vec::new(),
            bbox: Rect::EMPTY,
        }
    }

    /// Adds a rectangle and extends the bounding box.
    pub fn add_rect(&mut self, rect: Rect) {
        self.bbox = self.bbox.union(&rect);
        self.rects.push(rect);
    }

    /// Returns `true` if a cell footprint `[x, x + width] × [y, y + height]`
    /// lies entirely within a single rectangle of this region.
    pub fn contains_footprint(&self, x: i64, y: i64, width: i64, height: i64) -> bool {
        let footprint = Rect::new(x, y, x + width, y + height);
        self.rects.iter().any(|r| r.contains_rect(&footprint))
    }
}
