//! # termview-core
//!
//! Core types for termview.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other termview crates. It provides:
//!
//! - Geometry types (TerminalSize)
//! - Session handshake types (SessionId, ShellConfiguration, CreateSessionResponse)
//! - Appearance types (TerminalOptions, Theme, ThemeColors)
//! - Controller configuration loaded from YAML
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other termview crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod appearance;
pub mod config;
pub mod error;
pub mod geometry;
pub mod session;

// Re-export commonly used types
pub use appearance::{CursorStyle, TerminalOptions, Theme, ThemeColors};
pub use config::{ControllerConfig, HostSettings, SessionSettings};
pub use error::{Error, Result};
pub use geometry::TerminalSize;
pub use session::{
    ControllerId, CreateSessionResponse, DialogButton, SessionId, ShellConfiguration,
};
