//! Placement rows and their site grids.

use serde::{Deserialize, Serialize};
use strata_common::{Orientation, RailPower, SymmetrySet};

/// The direction a row runs in. Only horizontal rows are supported; a
/// vertical row is rejected at build time with a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RowDirection {
    /// Sites advance in x.
    Horizontal,
    /// Sites advance in y. Not supported by the engine.
    Vertical,
}

/// Parameters for constructing a [`Row`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RowParams {
    /// Direction of the row.
    pub direction: RowDirection,
    /// Y coordinate of the row's bottom edge.
    pub bottom: i64,
    /// Row (site) height.
    pub height: i64,
    /// Width of a single site.
    pub site_width: i64,
    /// Pitch between consecutive site origins.
    pub site_spacing: i64,
    /// X coordinate of the first site (sub-row origin).
    pub subrow_origin: i64,
    /// Number of sites in the row.
    pub num_sites: u32,
    /// The orientation of the row's sites.
    pub site_orient: Orientation,
    /// The symmetry flags of the row's site definition.
    pub site_symmetry: SymmetrySet,
}

/// A horizontal placement row with a fixed site grid and power rails.
///
/// Immutable after [`Architecture::post_process`](crate::Architecture::post_process)
/// except for the bounds clipping performed there.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    /// Y coordinate of the bottom edge.
    pub bottom: i64,
    /// Row height.
    pub height: i64,
    /// Width of a single site.
    pub site_width: i64,
    /// Pitch between consecutive site origins.
    pub site_spacing: i64,
    /// X coordinate of the first site.
    pub subrow_origin: i64,
    /// Number of sites.
    pub num_sites: u32,
    /// Site orientation.
    pub site_orient: Orientation,
    /// Site symmetry flags.
    pub site_symmetry: SymmetrySet,
    /// Power rail running along the top edge.
    pub power_top: RailPower,
    /// Power rail running along the bottom edge.
    pub power_bot: RailPower,
}

impl Row {
    pub(crate) fn from_params(p: &RowParams) -> Self {
        Self {
            bottom: p.bottom,
            height: p.height,
            site_width: p.site_width,
            site_spacing: p.site_spacing,
            subrow_origin: p.subrow_origin,
            num_sites: p.num_sites,
            site_orient: p.site_orient,
            site_symmetry: p.site_symmetry,
            power_top: RailPower::Unknown,
            power_bot: RailPower::Unknown,
        }
    }

    /// X coordinate of the row's left edge.
    pub fn left(&self) -> i64 {
        self.subrow_origin
    }

    /// X coordinate of the row's right edge.
    pub fn right(&self) -> i64 {
        self.subrow_origin + self.num_sites as i64 * self.site_spacing
    }

    /// Y coordinate of the row's top edge.
    pub fn top(&self) -> i64 {
        self.bottom + self.height
    }

    /// X coordinate of the origin of site `k`.
    pub fn site_x(&self, k: u32) -> i64 {
        self.subrow_origin + k as i64 * self.site_spacing
    }

    /// Returns `true` if `x` lies exactly on the site grid within the row.
    pub fn on_site_grid(&self, x: i64) -> bool {
        let offset = x - self.subrow_origin;
        offset >= 0
            && offset % self.site_spacing == 0
            && (offset / self.site_spacing) < self.num_sites as i64
    }

    /// Snaps `x` to the nearest site origin, clamped to the row.
    pub fn snap_to_site(&self, x: i64) -> i64 {
        if self.num_sites == 0 {
            return self.subrow_origin;
        }
        let offset = x - self.subrow_origin;
        // Round to nearest pitch multiple.
        let k = if offset <= 0 {
            0
        } else {
            ((offset + self.site_spacing / 2) / self.site_spacing)
                .min(self.num_sites as i64 - 1) as u32
        };
        self.site_x(k)
    }

    /// Snaps `x` downward to the last site origin at or before it, clamped.
    pub fn snap_down_to_site(&self, x: i64) -> i64 {
        if self.num_sites == 0 {
            return self.subrow_origin;
        }
        let offset = x - self.subrow_origin;
        let k = if offset <= 0 {
            0
        } else {
            (offset / self.site_spacing).min(self.num_sites as i64 - 1) as u32
        };
        self.site_x(k)
    }

    /// Snaps `x` upward to the first site origin at or after it, clamped.
    pub fn snap_up_to_site(&self, x: i64) -> i64 {
        if self.num_sites == 0 {
            return self.subrow_origin;
        }
        let offset = x - self.subrow_origin;
        let k = if offset <= 0 {
            0
        } else {
            ((offset + self.site_spacing - 1) / self.site_spacing)
                .min(self.num_sites as i64 - 1) as u32
        };
        self.site_x(k)
    }

    /// Returns `true` if a cell presenting the given effective top/bottom
    /// rails may sit in this row. [`RailPower::Unknown`] on either side is
    /// always compatible.
    pub fn rails_match(&self, cell_top: RailPower, cell_bot: RailPower) -> bool {
        cell_top.matches(self.power_top) && cell_bot.matches(self.power_bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::Orientation;

    fn make_row() -> Row {
        Row::from_params(&RowParams {
            direction: RowDirection::Horizontal,
            bottom: 100,
            height: 10,
            site_width: 5,
            site_spacing: 5,
            subrow_origin: 20,
            num_sites: 8,
            site_orient: Orientation::North,
            site_symmetry: SymmetrySet::default(),
        })
    }

    #[test]
    fn edges() {
        let row = make_row();
        assert_eq!(row.left(), 20);
        assert_eq!(row.right(), 60);
        assert_eq!(row.top(), 110);
    }

    #[test]
    fn site_positions() {
        let row = make_row();
        assert_eq!(row.site_x(0), 20);
        assert_eq!(row.site_x(3), 35);
        assert!(row.on_site_grid(20));
        assert!(row.on_site_grid(55));
        assert!(!row.on_site_grid(22));
        // Right edge is past the last site origin.
        assert!(!row.on_site_grid(60));
        assert!(!row.on_site_grid(15));
    }

    #[test]
    fn snap_nearest() {
        let row = make_row();
        assert_eq!(row.snap_to_site(22), 20);
        assert_eq!(row.snap_to_site(23), 25);
        assert_eq!(row.snap_to_site(0), 20);
        assert_eq!(row.snap_to_site(999), row.site_x(7));
    }

    #[test]
    fn snap_up() {
        let row = make_row();
        assert_eq!(row.snap_up_to_site(20), 20);
        assert_eq!(row.snap_up_to_site(21), 25);
        assert_eq!(row.snap_up_to_site(-5), 20);
        assert_eq!(row.snap_up_to_site(999), row.site_x(7));
    }

    #[test]
    fn snap_down() {
        let row = make_row();
        assert_eq!(row.snap_down_to_site(20), 20);
        assert_eq!(row.snap_down_to_site(24), 20);
        assert_eq!(row.snap_down_to_site(25), 25);
        assert_eq!(row.snap_down_to_site(-5), 20);
        assert_eq!(row.snap_down_to_site(999), row.site_x(7));
    }

    #[test]
    fn rail_matching() {
        let mut row = make_row();
        row.power_top = RailPower::Vdd;
        row.power_bot = RailPower::Vss;
        assert!(row.rails_match(RailPower::Vdd, RailPower::Vss));
        assert!(!row.rails_match(RailPower::Vss, RailPower::Vdd));
        assert!(row.rails_match(RailPower::Unknown, RailPower::Unknown));
        assert!(row.rails_match(RailPower::Vdd, RailPower::Unknown));
    }
}
