//! Diagnostic creation, severity management, and accumulation.
//!
//! This crate provides structured [`Diagnostic`] messages with severity
//! levels and error codes. The thread-safe [`DiagnosticSink`] accumulates
//! diagnostics during a placement run; the engine reports recoverable
//! problems (skipped rows, missing connectivity, relaxed constraints)
//! through the sink and keeps going, so the caller can inspect the total
//! error count to decide whether to trust the result.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
