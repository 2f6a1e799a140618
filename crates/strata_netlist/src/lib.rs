//! Netlist model for the Strata placement engine.
//!
//! Owns the mutable placement state plus topology: [`Node`]s (cells and
//! terminals), [`Edge`]s (nets), and [`Pin`]s, stored in pre-sized arenas
//! with dense ids. The model is a passive graph and attribute store; all
//! geometric reasoning lives in the legalizer and placement manager.

#![warn(missing_docs)]

pub mod data;
pub mod ids;

pub use data::{Edge, Network, Node, NodeKind, Pin, DEFAULT_EDGE_TYPE};
pub use ids::{EdgeId, NodeId, PinId};
