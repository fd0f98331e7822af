//! Terminal options and color themes applied to a display surface.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Cursor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    /// Filled block
    Block,
    /// Underline
    Underline,
    /// Vertical bar
    Bar,
}

/// Rendering options for a terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TerminalOptions {
    /// Font family name
    pub font_family: String,
    /// Font size in points
    pub font_size: f32,
    /// Cursor shape
    pub cursor_style: CursorStyle,
    /// Whether the cursor blinks
    pub cursor_blink: bool,
    /// Scrollback buffer lines
    pub scrollback_lines: usize,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 13.0,
            cursor_style: CursorStyle::Block,
            cursor_blink: true,
            scrollback_lines: 10000,
        }
    }
}

/// Colors of a theme, as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ThemeColors {
    /// Default foreground
    pub foreground: String,
    /// Default background
    pub background: String,
    /// Cursor color
    pub cursor: String,
    /// Selection highlight
    pub selection: String,
    /// The 16 ANSI colors, normal then bright
    pub palette: Vec<String>,
}

impl Default for ThemeColors {
    fn default() -> Self {
        let palette = [
            "#000000", "#cd3131", "#0dbc79", "#e5e510", "#2472c8", "#bc3fbc", "#11a8cd",
            "#e5e5e5", "#666666", "#f14c4c", "#23d18b", "#f5f543", "#3b8eea", "#d670d6",
            "#29b8db", "#ffffff",
        ];
        Self {
            foreground: "#cccccc".to_string(),
            background: "#1e1e1e".to_string(),
            cursor: "#ffffff".to_string(),
            selection: "#264f78".to_string(),
            palette: palette.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// A named color theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Theme {
    /// Theme name
    pub name: String,
    /// Theme colors
    pub colors: ThemeColors,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            colors: ThemeColors::default(),
        }
    }
}
