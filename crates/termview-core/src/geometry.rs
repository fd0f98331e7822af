//! Geometry types for terminal dimensions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Size of a terminal in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TerminalSize {
    /// Number of columns
    pub columns: u16,
    /// Number of rows
    pub rows: u16,
}

impl TerminalSize {
    /// Create a new size.
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Total cell count (columns * rows).
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// Formats as `"{columns} x {rows}"`, the text shown by the resize overlay.
impl std::fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.columns, self.rows)
    }
}
