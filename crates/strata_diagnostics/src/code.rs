//! Diagnostic codes with category prefixes for structured identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
///
/// Each category maps to a single-character prefix used in diagnostic code
/// display (e.g., `E101` for an error, `L203` for a legalization notice).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Legalization diagnostics, prefixed with `L`.
    Legalize,
    /// Optimization-pass diagnostics, prefixed with `O`.
    Optimize,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Legalize => 'L',
            Category::Optimize => 'O',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric
/// identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit
/// number, e.g., `E101`, `W203`, `L305`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
        assert_eq!(Category::Legalize.prefix(), 'L');
        assert_eq!(Category::Optimize.prefix(), 'O');
    }

    #[test]
    fn display_format() {
        let code = DiagnosticCode::new(Category::Error, 101);
        assert_eq!(format!("{code}"), "E101");

        let code = DiagnosticCode::new(Category::Legalize, 3);
        assert_eq!(format!("{code}"), "L003");

        let code = DiagnosticCode::new(Category::Optimize, 42);
        assert_eq!(format!("{code}"), "O042");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
