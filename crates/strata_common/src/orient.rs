//! Cell orientations, symmetry flags, and power-rail labels.
//!
//! Orientations follow the LEF/DEF naming for horizontal rows: `N` (R0),
//! `FN` (mirror-Y), `FS` (mirror-X), `S` (R180). Flag-sets are small
//! newtypes with named predicates rather than raw bitmask arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell or site orientation on a horizontal row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Orientation {
    /// R0 — the canonical orientation.
    North,
    /// MY — mirrored about the Y axis (horizontal flip).
    FlippedNorth,
    /// MX — mirrored about the X axis (vertical flip).
    FlippedSouth,
    /// R180 — rotated 180 degrees (flips both axes).
    South,
}

impl Orientation {
    /// All four orientations, in canonical order.
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::FlippedNorth,
        Orientation::FlippedSouth,
        Orientation::South,
    ];

    /// Returns `true` if this orientation flips the cell vertically,
    /// exchanging its top and bottom power rails.
    pub fn flips_vertically(self) -> bool {
        matches!(self, Orientation::FlippedSouth | Orientation::South)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::North => write!(f, "N"),
            Orientation::FlippedNorth => write!(f, "FN"),
            Orientation::FlippedSouth => write!(f, "FS"),
            Orientation::South => write!(f, "S"),
        }
    }
}

/// The set of orientations a cell is allowed to take.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct OrientationSet(u8);

impl OrientationSet {
    fn bit(orient: Orientation) -> u8 {
        match orient {
            Orientation::North => 0b0001,
            Orientation::FlippedNorth => 0b0010,
            Orientation::FlippedSouth => 0b0100,
            Orientation::South => 0b1000,
        }
    }

    /// The empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// A set containing only the given orientation.
    pub fn only(orient: Orientation) -> Self {
        Self(Self::bit(orient))
    }

    /// Adds an orientation to the set.
    pub fn insert(&mut self, orient: Orientation) {
        self.0 |= Self::bit(orient);
    }

    /// Returns `true` if the orientation is a member of the set.
    pub fn allows(&self, orient: Orientation) -> bool {
        self.0 & Self::bit(orient) != 0
    }

    /// Returns the number of member orientations.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the member orientations in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Orientation> + '_ {
        Orientation::ALL.into_iter().filter(|&o| self.allows(o))
    }

    /// Derives the allowed orientations of a master from its symmetry.
    ///
    /// `N` is always allowed, since instances are canonicalized to `N`
    /// before import. X and Y symmetry together enable all four
    /// orientations; X symmetry alone enables `FS`; Y symmetry alone
    /// enables `FN`. Rotation-only (180°) masters are not representable
    /// under this rule; the upstream rule is reproduced as given.
    pub fn from_symmetry(symmetry: SymmetrySet) -> Self {
        let mut set = Self::only(Orientation::North);
        if symmetry.has_x() && symmetry.has_y() {
            set.insert(Orientation::FlippedNorth);
            set.insert(Orientation::FlippedSouth);
            set.insert(Orientation::South);
        } else if symmetry.has_x() {
            set.insert(Orientation::FlippedSouth);
        } else if symmetry.has_y() {
            set.insert(Orientation::FlippedNorth);
        }
        set
    }
}

/// The symmetry flags of a master shape or row site.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SymmetrySet {
    x: bool,
    y: bool,
    rot90: bool,
}

impl SymmetrySet {
    /// Creates a symmetry set from individual flags.
    pub fn new(x: bool, y: bool, rot90: bool) -> Self {
        Self { x, y, rot90 }
    }

    /// Returns `true` if the shape is symmetric about the X axis.
    pub fn has_x(&self) -> bool {
        self.x
    }

    /// Returns `true` if the shape is symmetric about the Y axis.
    pub fn has_y(&self) -> bool {
        self.y
    }

    /// Returns `true` if the shape is symmetric under 90° rotation.
    pub fn has_rot90(&self) -> bool {
        self.rot90
    }
}

/// The power rail label at the top or bottom edge of a row or cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum RailPower {
    /// Power (VDD).
    Vdd,
    /// Ground (VSS).
    Vss,
    /// Unlabeled; compatible with anything.
    #[default]
    Unknown,
}

impl RailPower {
    /// Returns `true` if a cell rail with this label may abut a row rail
    /// with the `other` label. [`Unknown`](RailPower::Unknown) on either
    /// side is always compatible.
    pub fn matches(self, other: RailPower) -> bool {
        self == RailPower::Unknown || other == RailPower::Unknown || self == other
    }
}

impl fmt::Display for RailPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RailPower::Vdd => write!(f, "VDD"),
            RailPower::Vss => write!(f, "VSS"),
            RailPower::Unknown => write!(f, "UNK"),
        }
    }
}
