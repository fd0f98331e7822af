//! Guarded session title.

/// A title that is never blank.
///
/// Blank or whitespace-only values fall back to the default title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    current: String,
    default: String,
}

impl Title {
    /// Create a title showing `default`.
    pub fn new(default: impl Into<String>) -> Self {
        let default = default.into();
        Self {
            current: default.clone(),
            default,
        }
    }

    /// The current title.
    pub fn get(&self) -> &str {
        &self.current
    }

    /// The fallback title.
    pub fn default_title(&self) -> &str {
        &self.default
    }

    /// Normalize `value` and store it.
    ///
    /// Returns true if the stored title changed.
    pub fn set(&mut self, value: &str) -> bool {
        let normalized = if value.trim().is_empty() {
            self.default.as_str()
        } else {
            value
        };

        if self.current == normalized {
            return false;
        }
        self.current = normalized.to_string();
        true
    }
}
