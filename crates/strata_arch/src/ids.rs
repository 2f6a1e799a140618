//! Opaque ID newtypes for spatial-model entities.
//!
//! [`RowId`] and [`RegionId`] are thin `u32` wrappers used as indices into
//! the architecture's row and region tables. They are `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a placement row.
    RowId
);

define_id!(
    /// Opaque, copyable ID for a placement region. Region 0 is the default
    /// region covering the full die.
    RegionId
);

impl RegionId {
    /// The default region, covering the full die.
    pub const DEFAULT: RegionId = RegionId(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn row_id_roundtrip() {
        let id = RowId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn region_default_is_zero() {
        assert_eq!(RegionId::DEFAULT.as_raw(), 0);
        assert_eq!(RegionId::DEFAULT, RegionId::from_raw(0));
    }

    #[test]
    fn id_equality() {
        let a = RowId::from_raw(3);
        let b = RowId::from_raw(3);
        let c = RowId::from_raw(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(RegionId::from_raw(1));
        set.insert(RegionId::from_raw(2));
        set.insert(RegionId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", RowId::from_raw(7)), "7");
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = RowId::from_raw(55);
        let json = serde_json::to_string(&id).unwrap();
        let restored: RowId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
