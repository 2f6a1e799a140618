//! Shared foundational types used across the Strata placement engine.
//!
//! This crate provides core types including integer rectangle geometry,
//! cell/site orientations and symmetry flag-sets, power-rail labels, and
//! common result types.

#![warn(missing_docs)]

pub mod geom;
pub mod orient;
pub mod result;

pub use geom::Rect;
pub use orient::{Orientation, OrientationSet, RailPower, SymmetrySet};
pub use result::{InternalError, StrataResult};
